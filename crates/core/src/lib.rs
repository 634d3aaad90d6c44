//! This crate defines the core content of Endless City, such as [`ChunkKey`], [`ChunkContent`]
//! and [`BuildingPrototype`], shared by the generator and the streaming engine.

mod chunk;
pub use chunk::*;

mod content;
pub use content::*;

mod prototype;
pub use prototype::*;
