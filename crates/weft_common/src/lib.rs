//! Shared foundational types used across the Weft fabric builder.
//!
//! This crate provides interned identifiers, content hashing for snapshot
//! integrity, and the internal error type used when a pass finds the
//! architecture in a state that should be impossible.

#![warn(missing_docs)]

pub mod hash;
pub mod ident;
pub mod result;

pub use hash::ContentHash;
pub use ident::{Ident, Interner};
pub use result::{InternalError, WeftResult};
