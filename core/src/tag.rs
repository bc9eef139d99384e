use std::{
    fmt,
    sync::atomic::{AtomicU64, Ordering},
};

/// Execution tag.
/// Position of an operation in the linear replay order.
///
/// Tags are totally ordered, but a smaller tag does not imply
/// the operation happens before. Only ordering edges do.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde-1", derive(serde::Serialize, serde::Deserialize))]
pub struct Tag(pub u64);

impl Tag {
    /// First tag.
    pub const ZERO: Tag = Tag(0);

    /// Tag that follows every other tag.
    pub const MAX: Tag = Tag(u64::max_value());

    /// Tag immediately after this one.
    pub fn next(self) -> Tag {
        Tag(self.0.saturating_add(1))
    }

    /// Tag shifted by `offset`.
    pub fn offset(self, offset: u64) -> Tag {
        Tag(self.0.saturating_add(offset))
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.0)
    }
}

/// Monotonic source of tags shared by all queues of one device.
#[derive(Debug, Default)]
pub struct TagSource {
    next: AtomicU64,
}

impl TagSource {
    /// Create tag source starting at `Tag::ZERO`.
    pub fn new() -> Self {
        TagSource::default()
    }

    /// Take next tag.
    pub fn next(&self) -> Tag {
        Tag(self.next.fetch_add(1, Ordering::Relaxed))
    }

    /// Reserve `count` consecutive tags and return the first one.
    pub fn reserve(&self, count: u64) -> Tag {
        Tag(self.next.fetch_add(count, Ordering::Relaxed))
    }

    /// Tag that will be returned by the next call to `next`.
    pub fn peek(&self) -> Tag {
        Tag(self.next.load(Ordering::Relaxed))
    }

    /// Restart the sequence from `tag`.
    pub fn restart(&self, tag: Tag) {
        self.next.store(tag.0, Ordering::Relaxed);
    }
}
