//! OpenGRC Common - Shared types for the GRC register platform
//!
//! This crate provides the primitives every register crate depends on:
//! - Validated value objects (ordinal ratings)
//! - Error handling

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod rating;

pub use error::*;
pub use rating::*;
