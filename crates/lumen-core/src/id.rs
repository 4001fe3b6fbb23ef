use std::fmt;

/// Identity of a scene object, unique within the allocator that issued it.
/// Ids are handed out in insertion order, so ordering by id is ordering by
/// when the object joined its graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(u32);

impl ObjectId {
    pub fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "object#{}", self.0)
    }
}

/// Sequential id source owned by one graph. Not shared across threads;
/// the render loop is the only writer.
#[derive(Debug, Default)]
pub struct IdAllocator {
    next: u32,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allocate(&mut self) -> ObjectId {
        let id = ObjectId(self.next);
        self.next += 1;
        id
    }

    /// How many ids have been handed out.
    pub fn issued(&self) -> u32 {
        self.next
    }
}
