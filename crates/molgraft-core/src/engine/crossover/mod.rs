//! # Crossover Sites
//!
//! Discovery of the subgraphs two parent graphs can exchange. Sites are either whole
//! branches or subgraphs delimited by end points, found at the top level and inside
//! templates whose contract allows it.

mod combinatorics;
pub mod finder;
pub mod site;

pub use finder::CrossoverSiteFinder;
pub use site::{CrossoverType, SiteSide, XoverSite};
