//! # Fragment Space Module
//!
//! The design space from which graphs are built: scaffold, fragment and capping-group
//! libraries, plus the AP-class rules that say which attachment points may be joined.
//!
//! ## Key Components
//!
//! - [`space`] - The [`space::FragmentSpace`] container and its queries
//! - [`classify`] - Lookup indices derived from the libraries
//! - [`io`] - Readers for the compatibility matrices and the TOML libraries

pub mod classify;
pub mod io;
pub mod space;
