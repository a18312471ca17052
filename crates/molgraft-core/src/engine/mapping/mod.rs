//! # AP Mapping
//!
//! Pairing of attachment points between two vertices or two AP lists, under the
//! compatibility rules of a [`FragmentSpace`](crate::core::fragspace::space::FragmentSpace).
//!
//! A search starts from two [`candidates::ApSide`]s, builds per-AP candidate lists, and
//! enumerates mappings lazily with [`iter::ApMappingIter`]. [`finder::ApMapFinder`] wraps
//! the whole procedure, including the search bounds and the random pick of one result.

pub mod apmap;
pub mod candidates;
pub mod finder;
pub mod iter;

pub use apmap::ApMapping;
pub use candidates::ApSide;
pub use finder::{ApMapFinder, ApMappingResult, MappingOptions};
