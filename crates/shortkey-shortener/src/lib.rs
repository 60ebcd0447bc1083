//! URL shortener service built on the shortkey allocator.
//!
//! This crate wires a [`Generator`](shortkey_generator::Generator) to a
//! [`Repository`]: keys are generated before a record is stored and
//! recycled after it is deleted. Storage itself is pluggable; an in-memory
//! repository is provided.

pub mod error;
pub mod repository;
pub mod service;
pub mod shortener;
pub mod snapshot_file;

pub use error::{ShortenerError, SnapshotFileError, StorageError};
pub use repository::memory::InMemoryRepository;
pub use repository::{Repository, UrlRecord};
pub use service::ShortenerService;
pub use shortener::{ShortenParams, Shortener};
