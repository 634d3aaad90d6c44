//! This crate simply defines the base chunk generator trait for use by other crates.

use std::fmt;

use ec_core::{ChunkContent, ChunkKey, EmptyPrototypePool};

/// An error that might occur while generating a chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerateError {
    /// Generation was requested without any building prototype to pick from.
    EmptyPrototypePool,
}

impl fmt::Display for GenerateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::EmptyPrototypePool => {
                f.write_str("cannot generate a chunk without any building prototype")
            }
        }
    }
}

impl std::error::Error for GenerateError {}

impl From<EmptyPrototypePool> for GenerateError {
    #[inline]
    fn from(_: EmptyPrototypePool) -> Self {
        Self::EmptyPrototypePool
    }
}

/// Describes how to generate the content of new chunks.
///
/// Generators are shared between the controlling thread and background workers, hence the
/// `Send + Sync` bound.
pub trait ChunkGenerator: Send + Sync {
    /// Generates the content of the chunk with the provided key.
    ///
    /// # Purity
    ///
    /// Calling this function multiple times with the same `key` is expected to produce
    /// contents with the same elements (but distinct identities).
    ///
    /// # Errors
    ///
    /// When a precondition of the generator is not met, an error is returned and no content
    /// is produced.
    fn generate(&self, key: ChunkKey) -> Result<ChunkContent, GenerateError>;

    /// Prints debug information about the generator using the provided buffer.
    fn debug_info(&self, buf: &mut String) {
        let _ = buf;
    }
}
