use ec_core::ChunkContent;

/// The surface chunk content is attached to in order to be displayed.
///
/// The scene owns attached content until it is detached again. Content is tracked through the
/// handle returned by [`Scene::attach`] rather than through any kind of name lookup.
pub trait Scene {
    /// A direct handle to content attached to the scene.
    type Handle;

    /// Attaches the provided content to the scene.
    fn attach(&mut self, content: ChunkContent) -> Self::Handle;

    /// Detaches previously attached content from the scene and gives it back.
    fn detach(&mut self, handle: Self::Handle) -> ChunkContent;
}

/// A handle to content attached to an [`ArenaScene`].
///
/// Handles are not `Clone` so that a piece of content can only ever be detached once.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct SlotHandle(u32);

impl SlotHandle {
    /// The index of the slot the content lives in.
    #[inline]
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

/// A [`Scene`] that stores attached content in a slot arena.
#[derive(Default)]
pub struct ArenaScene {
    /// The slots of the arena. `None` means the slot is free.
    slots: Vec<Option<ChunkContent>>,
    /// The indices of the free slots.
    free: Vec<u32>,
    /// The total number of elements of the attached content.
    element_count: usize,
}

impl ArenaScene {
    /// Creates a new empty [`ArenaScene`].
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// The number of content nodes currently attached.
    #[inline]
    pub fn node_count(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    /// The number of elements (ground cells, streets, buildings and shadows) currently attached.
    #[inline]
    pub fn element_count(&self) -> usize {
        self.element_count
    }

    /// Returns the content referenced by the provided handle.
    #[cfg(test)]
    #[inline]
    pub fn get(&self, handle: &SlotHandle) -> Option<&ChunkContent> {
        self.slots.get(handle.index()).and_then(Option::as_ref)
    }

    /// Returns an iterator over the attached content.
    #[cfg(test)]
    pub fn iter(&self) -> impl Iterator<Item = &ChunkContent> {
        self.slots.iter().filter_map(Option::as_ref)
    }
}

impl Scene for ArenaScene {
    type Handle = SlotHandle;

    fn attach(&mut self, content: ChunkContent) -> SlotHandle {
        self.element_count += content.element_count();

        match self.free.pop() {
            Some(index) => {
                self.slots[index as usize] = Some(content);
                SlotHandle(index)
            }
            None => {
                let index = self.slots.len() as u32;
                self.slots.push(Some(content));
                SlotHandle(index)
            }
        }
    }

    fn detach(&mut self, handle: SlotHandle) -> ChunkContent {
        let content = self.slots[handle.index()]
            .take()
            .unwrap_or_else(|| panic!("slot {} is not attached", handle.0));
        self.free.push(handle.0);
        self.element_count -= content.element_count();
        content
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ec_core::{ChunkKey, GroundCell, GroundMaterial};
    use glam::Vec3;

    fn content_with_ground(cells: usize) -> ChunkContent {
        let mut content = ChunkContent::new(ChunkKey::ORIGIN);
        for _ in 0..cells {
            content.ground.push(GroundCell {
                center: Vec3::ZERO,
                side: 1.0,
                material: GroundMaterial::Grass,
            });
        }
        content
    }

    #[test]
    fn attach_and_detach_give_back_the_same_content() {
        let mut scene = ArenaScene::new();
        let content = content_with_ground(3);
        let id = content.id();

        let handle = scene.attach(content);
        assert_eq!(scene.node_count(), 1);
        assert_eq!(scene.element_count(), 3);
        assert_eq!(scene.get(&handle).map(ChunkContent::id), Some(id));

        let content = scene.detach(handle);
        assert_eq!(content.id(), id);
        assert_eq!(scene.node_count(), 0);
        assert_eq!(scene.element_count(), 0);
    }

    #[test]
    fn slots_are_reused() {
        let mut scene = ArenaScene::new();
        let a = scene.attach(content_with_ground(1));
        let b = scene.attach(content_with_ground(2));
        assert_eq!(b.index(), 1);

        scene.detach(a);
        let c = scene.attach(content_with_ground(4));
        assert_eq!(c.index(), 0);
        assert_eq!(scene.node_count(), 2);
        assert_eq!(scene.element_count(), 6);
        assert_eq!(scene.iter().count(), 2);
    }
}
