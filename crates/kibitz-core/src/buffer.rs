//! Append-only log accumulators.
//!
//! A [`BufferPool`] is an ordered collection of slots, each either a growing
//! string or a growing list — the kind is fixed when the slot is created. A
//! [`Buffer`] is a cheap handle (pool reference + index) onto one slot;
//! several handles may point at the same slot.
//!
//! Clearing a buffer resets its slot in place to the empty value of the same
//! kind. The slot is never deleted, so every other handle's index stays
//! valid for the life of the pool.

use parking_lot::Mutex;
use std::sync::Arc;

/// Whether a slot accumulates text or discrete entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferKind {
    /// Values are concatenated into one growing string.
    Text,
    /// Values are appended as separate elements.
    List,
}

/// A snapshot of one slot's contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BufferContents {
    Text(String),
    List(Vec<String>),
}

impl BufferContents {
    #[must_use]
    pub fn kind(&self) -> BufferKind {
        match self {
            Self::Text(_) => BufferKind::Text,
            Self::List(_) => BufferKind::List,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Text(s) => s.is_empty(),
            Self::List(v) => v.is_empty(),
        }
    }

    /// The text form, when this is a text slot.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::List(_) => None,
        }
    }

    /// The list form, when this is a list slot.
    #[must_use]
    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Self::Text(_) => None,
            Self::List(v) => Some(v),
        }
    }

    fn empty_of_same_kind(&self) -> Self {
        match self.kind() {
            BufferKind::Text => Self::Text(String::new()),
            BufferKind::List => Self::List(Vec::new()),
        }
    }
}

/// The process-wide ordered collection of buffer slots.
///
/// One pool per overlay instance, injected wherever buffers are created.
#[derive(Debug, Default)]
pub struct BufferPool {
    slots: Mutex<Vec<BufferContents>>,
}

impl BufferPool {
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Snapshot of every slot, in creation order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<BufferContents> {
        self.slots.lock().clone()
    }

    /// Number of slots ever created.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.lock().is_empty()
    }

    fn push(self: &Arc<Self>, contents: BufferContents) -> Buffer {
        let mut slots = self.slots.lock();
        slots.push(contents);
        Buffer {
            pool: Arc::clone(self),
            index: slots.len() - 1,
        }
    }
}

/// Handle onto one slot of a [`BufferPool`].
#[derive(Clone)]
pub struct Buffer {
    pool: Arc<BufferPool>,
    index: usize,
}

impl Buffer {
    /// Create an empty text slot.
    #[must_use]
    pub fn text(pool: &Arc<BufferPool>) -> Self {
        pool.push(BufferContents::Text(String::new()))
    }

    /// Create a text slot with initial contents.
    #[must_use]
    pub fn text_with(pool: &Arc<BufferPool>, initial: impl Into<String>) -> Self {
        pool.push(BufferContents::Text(initial.into()))
    }

    /// Create an empty list slot.
    #[must_use]
    pub fn list(pool: &Arc<BufferPool>) -> Self {
        pool.push(BufferContents::List(Vec::new()))
    }

    #[must_use]
    pub fn kind(&self) -> BufferKind {
        self.with_slot(|slot| slot.kind())
    }

    /// This handle's stable index into the pool.
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Append `value`: concatenated for text slots, pushed for list slots.
    pub fn write(&self, value: &str) {
        self.with_slot_mut(|slot| match slot {
            BufferContents::Text(s) => s.push_str(value),
            BufferContents::List(v) => v.push(value.to_string()),
        });
    }

    /// Remove the first occurrence of `value`: the first textual occurrence
    /// for text slots, the first equal element for list slots. No-op when
    /// absent.
    pub fn remove(&self, value: &str) {
        if value.is_empty() {
            return;
        }
        self.with_slot_mut(|slot| match slot {
            BufferContents::Text(s) => {
                if let Some(pos) = s.find(value) {
                    s.replace_range(pos..pos + value.len(), "");
                }
            }
            BufferContents::List(v) => {
                if let Some(pos) = v.iter().position(|entry| entry == value) {
                    v.remove(pos);
                }
            }
        });
    }

    /// Snapshot of this slot's contents.
    #[must_use]
    pub fn contents(&self) -> BufferContents {
        self.with_slot(Clone::clone)
    }

    /// Reset the slot in place to the empty value of the same kind. Other
    /// slots — and other handles onto this one — are unaffected.
    pub fn clear(&self) {
        self.with_slot_mut(|slot| *slot = slot.empty_of_same_kind());
    }

    fn with_slot<R>(&self, f: impl FnOnce(&BufferContents) -> R) -> R {
        let slots = self.pool.slots.lock();
        f(&slots[self.index])
    }

    fn with_slot_mut<R>(&self, f: impl FnOnce(&mut BufferContents) -> R) -> R {
        let mut slots = self.pool.slots.lock();
        f(&mut slots[self.index])
    }
}

impl std::fmt::Debug for Buffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Buffer")
            .field("index", &self.index)
            .field("kind", &self.kind())
            .finish()
    }
}
