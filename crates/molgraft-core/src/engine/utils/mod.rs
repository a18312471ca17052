//! Helpers shared by the engine searches.

pub mod sampling;
