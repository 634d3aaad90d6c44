use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use glam::Vec3;

/// The immutable data behind a [`BuildingPrototype`].
struct PrototypeData {
    name: Box<str>,
    size: Vec3,
    origin: Vec3,
}

/// A reusable building template, cloned to populate chunks.
///
/// Cloning a [`BuildingPrototype`] only clones a handle: every instance placed in the world
/// shares the same underlying data, which is never mutated after loading.
#[derive(Clone)]
pub struct BuildingPrototype(Arc<PrototypeData>);

impl BuildingPrototype {
    /// Creates a new [`BuildingPrototype`].
    ///
    /// # Arguments
    ///
    /// - `name`: a human-readable name, used in logs.
    ///
    /// - `size`: the authored size of the building's bounding box.
    ///
    /// - `origin`: the authored position of the building. Its `y` component is the vertical
    ///   offset that placed instances keep.
    pub fn new(name: impl Into<Box<str>>, size: Vec3, origin: Vec3) -> Self {
        Self(Arc::new(PrototypeData {
            name: name.into(),
            size,
            origin,
        }))
    }

    /// The name of the prototype.
    #[inline]
    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// The authored size of the prototype.
    #[inline]
    pub fn size(&self) -> Vec3 {
        self.0.size
    }

    /// The authored origin of the prototype.
    #[inline]
    pub fn origin(&self) -> Vec3 {
        self.0.origin
    }

    /// Returns whether both handles refer to the same prototype.
    #[inline]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for BuildingPrototype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuildingPrototype")
            .field("name", &self.name())
            .field("size", &self.size())
            .field("origin", &self.origin())
            .finish()
    }
}

/// The error returned when trying to build a [`PrototypePool`] without any prototype.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmptyPrototypePool;

impl fmt::Display for EmptyPrototypePool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("the building prototype pool is empty")
    }
}

impl std::error::Error for EmptyPrototypePool {}

/// The fixed, ordered collection of building prototypes the generator picks from.
///
/// A pool is never empty.
#[derive(Clone)]
pub struct PrototypePool(Arc<[BuildingPrototype]>);

impl PrototypePool {
    /// Creates a new [`PrototypePool`] from the provided prototypes.
    pub fn new(prototypes: Vec<BuildingPrototype>) -> Result<Self, EmptyPrototypePool> {
        if prototypes.is_empty() {
            return Err(EmptyPrototypePool);
        }

        Ok(Self(prototypes.into()))
    }
}

impl Deref for PrototypePool {
    type Target = [BuildingPrototype];

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl fmt::Debug for PrototypePool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.0.iter().map(|p| p.name())).finish()
    }
}
