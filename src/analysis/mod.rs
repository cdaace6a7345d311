//! Risk scenario analysis.
//!
//! A scenario is a named slice of the document set; each one is run
//! through every attribute model independently.

pub mod scenarios;

pub use scenarios::*;
