//! Core types for the shortkey identifier scheme.
//!
//! This crate provides the base-36 codec and the [`Key`] type shared by the
//! allocator and the services that hand keys out.

pub mod codec;
pub mod error;
pub mod key;

pub use codec::{decode, encode, space_size, ALPHABET, BASE, MAX_LENGTH};
pub use error::{CoreError, Result};
pub use key::Key;
