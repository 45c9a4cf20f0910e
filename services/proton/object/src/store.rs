//! Generational object store with intrusive reference counts.

use crate::{ObjectError, ObjectId};
use tracing::{debug, warn};

/// Live object plus its ownership bookkeeping
#[derive(Debug)]
struct Entry<T> {
    /// External references taken with `acquire`
    refs: usize,
    /// Whether the engine still holds the object
    held: bool,
    value: T,
}

#[derive(Debug)]
struct Slot<T> {
    generation: u32,
    entry: Option<Entry<T>>,
}

/// Store of reference-counted objects addressed by [`ObjectId`].
///
/// A freshly inserted object is held by the engine and has no external
/// references. It is reclaimed when the engine drops its hold
/// ([`disown`](Self::disown)) and the external count is zero.
#[derive(Debug)]
pub struct ObjectStore<T> {
    slots: Vec<Slot<T>>,
    /// Reclaimed slot indices ready for reuse
    free: Vec<u32>,
    live: usize,
}

impl<T> ObjectStore<T> {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            live: 0,
        }
    }

    /// Insert a new engine-held object
    pub fn insert(&mut self, value: T) -> ObjectId {
        let entry = Entry {
            refs: 0,
            held: true,
            value,
        };
        self.live += 1;

        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.entry = Some(entry);
            return ObjectId::new(index, slot.generation);
        }

        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            entry: Some(entry),
        });
        ObjectId::new(index, 0)
    }

    fn entry(&self, id: ObjectId) -> Result<&Entry<T>, ObjectError> {
        self.slots
            .get(id.index() as usize)
            .filter(|slot| slot.generation == id.generation())
            .and_then(|slot| slot.entry.as_ref())
            .ok_or(ObjectError::Reclaimed(id))
    }

    fn entry_mut(&mut self, id: ObjectId) -> Result<&mut Entry<T>, ObjectError> {
        self.slots
            .get_mut(id.index() as usize)
            .filter(|slot| slot.generation == id.generation())
            .and_then(|slot| slot.entry.as_mut())
            .ok_or(ObjectError::Reclaimed(id))
    }

    /// Whether the id still names a live object
    pub fn contains(&self, id: ObjectId) -> bool {
        self.entry(id).is_ok()
    }

    /// Borrow a live object
    pub fn get(&self, id: ObjectId) -> Result<&T, ObjectError> {
        self.entry(id).map(|entry| &entry.value)
    }

    /// Mutably borrow a live object
    pub fn get_mut(&mut self, id: ObjectId) -> Result<&mut T, ObjectError> {
        self.entry_mut(id).map(|entry| &mut entry.value)
    }

    /// Number of external references on a live object
    pub fn refcount(&self, id: ObjectId) -> Result<usize, ObjectError> {
        self.entry(id).map(|entry| entry.refs)
    }

    /// Whether the engine still holds a live object
    pub fn is_held(&self, id: ObjectId) -> Result<bool, ObjectError> {
        self.entry(id).map(|entry| entry.held)
    }

    /// Take an external reference. `None` is a no-op.
    pub fn acquire(&mut self, id: Option<ObjectId>) -> Result<(), ObjectError> {
        let Some(id) = id else {
            return Ok(());
        };
        let entry = self.entry_mut(id)?;
        entry.refs += 1;
        Ok(())
    }

    /// Drop an external reference. `None` is a no-op.
    ///
    /// Returns the object if this release reclaimed it. Releasing an object
    /// with no outstanding external references changes nothing and reports
    /// [`ObjectError::Underflow`].
    pub fn release(&mut self, id: Option<ObjectId>) -> Result<Option<T>, ObjectError> {
        let Some(id) = id else {
            return Ok(None);
        };
        let entry = self.entry_mut(id)?;
        if entry.refs == 0 {
            warn!(object = %id, "release without matching acquire");
            return Err(ObjectError::Underflow(id));
        }
        entry.refs -= 1;
        if entry.refs == 0 && !entry.held {
            return self.reclaim(id).map(Some);
        }
        Ok(None)
    }

    /// Drop the engine hold. Idempotent.
    ///
    /// Returns the object if it had no external references left.
    pub fn disown(&mut self, id: ObjectId) -> Result<Option<T>, ObjectError> {
        let entry = self.entry_mut(id)?;
        entry.held = false;
        if entry.refs == 0 {
            return self.reclaim(id).map(Some);
        }
        Ok(None)
    }

    fn reclaim(&mut self, id: ObjectId) -> Result<T, ObjectError> {
        let slot = self
            .slots
            .get_mut(id.index() as usize)
            .filter(|slot| slot.generation == id.generation())
            .ok_or(ObjectError::Reclaimed(id))?;
        let entry = slot.entry.take().ok_or(ObjectError::Reclaimed(id))?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index());
        self.live -= 1;
        debug!(object = %id, "reclaimed");
        Ok(entry.value)
    }

    /// Number of live objects
    pub fn len(&self) -> usize {
        self.live
    }

    /// Whether the store has no live objects
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Iterate over live objects in slot order
    pub fn iter(&self) -> impl Iterator<Item = (ObjectId, &T)> {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.entry
                .as_ref()
                .map(|entry| (ObjectId::new(index as u32, slot.generation), &entry.value))
        })
    }
}

impl<T> Default for ObjectStore<T> {
    fn default() -> Self {
        Self::new()
    }
}
