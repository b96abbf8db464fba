//! Handle Table Implementation
//!
//! The handle table maps opaque capability handles to policy objects.
//! This provides:
//! - Binding of a caller session to one object
//! - The access rights granted when the handle was opened
//! - Revocation by close, by object deletion, or by session teardown
//!
//! # Handle Format
//! A handle is a slot index plus the slot's generation. Closing a handle
//! bumps the generation, so a stale handle never aliases a handle later
//! issued from the same slot. On the wire a handle is a 20-byte context
//! handle: 4 zero attribute bytes, then index, generation and the table's
//! instance tag.
//!
//! # Locking
//! One mutex guards the table. Open, close and validate are atomic with
//! respect to each other; a close racing a validate resolves to either the
//! pre-close entry or `InvalidHandle`.

use core::fmt;
use core::sync::atomic::{AtomicU64, Ordering};

use log::{debug, trace};
use spin::Mutex;

use super::object_type::{ObjectKind, ObjectRef};
use crate::se::{Sid, SessionId};
use crate::status::{LsaResult, NtStatus};

/// Default maximum number of live handles
pub const MAX_HANDLES: usize = 4096;

/// Size of a context handle on the wire
pub const CONTEXT_HANDLE_SIZE: usize = 20;

/// Source of per-table instance tags
static NEXT_TABLE_TAG: AtomicU64 = AtomicU64::new(1);

/// Opaque capability handle
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle {
    index: u32,
    generation: u32,
    tag: u64,
}

impl Handle {
    /// Encode as a wire context handle
    pub fn to_bytes(self) -> [u8; CONTEXT_HANDLE_SIZE] {
        let mut bytes = [0u8; CONTEXT_HANDLE_SIZE];
        bytes[4..8].copy_from_slice(&self.index.to_le_bytes());
        bytes[8..12].copy_from_slice(&self.generation.to_le_bytes());
        bytes[12..20].copy_from_slice(&self.tag.to_le_bytes());
        bytes
    }

    /// Decode a wire context handle
    ///
    /// Any 20 bytes decode; unknown values simply fail validation.
    pub fn from_bytes(bytes: &[u8; CONTEXT_HANDLE_SIZE]) -> Self {
        let mut index = [0u8; 4];
        let mut generation = [0u8; 4];
        let mut tag = [0u8; 8];
        index.copy_from_slice(&bytes[4..8]);
        generation.copy_from_slice(&bytes[8..12]);
        tag.copy_from_slice(&bytes[12..20]);
        Self {
            index: u32::from_le_bytes(index),
            generation: u32::from_le_bytes(generation),
            tag: u64::from_le_bytes(tag),
        }
    }

    /// The all-zero context handle
    pub const fn null() -> Self {
        Self {
            index: 0,
            generation: 0,
            tag: 0,
        }
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle({}:{})", self.index, self.generation)
    }
}

/// Handle table entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandleEntry {
    /// Referenced object
    pub object: ObjectRef,
    /// Granted access mask
    pub granted_access: u32,
    /// Session that opened the handle
    pub session: SessionId,
    /// User that opened the handle
    pub opener: Sid,
}

impl HandleEntry {
    /// Check that every bit of `access` was granted at open time
    pub fn has_access(&self, access: u32) -> bool {
        (self.granted_access & access) == access
    }

    /// Fail with `AccessDenied` unless `access` was granted
    pub fn require(&self, access: u32) -> LsaResult<()> {
        if self.has_access(access) {
            Ok(())
        } else {
            Err(NtStatus::AccessDenied)
        }
    }
}

#[derive(Debug)]
struct Slot {
    generation: u32,
    entry: Option<HandleEntry>,
}

#[derive(Debug)]
struct TableInner {
    slots: Vec<Slot>,
    free: Vec<u32>,
    count: usize,
}

impl TableInner {
    fn slot(&self, handle: Handle) -> Option<&Slot> {
        self.slots
            .get(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation && slot.entry.is_some())
    }

    fn release(&mut self, index: usize) -> Option<HandleEntry> {
        let slot = &mut self.slots[index];
        let entry = slot.entry.take()?;
        slot.generation = slot.generation.wrapping_add(1).max(1);
        self.free.push(index as u32);
        self.count -= 1;
        Some(entry)
    }
}

/// Capability handle table
#[derive(Debug)]
pub struct HandleTable {
    inner: Mutex<TableInner>,
    max_handles: usize,
    tag: u64,
}

impl HandleTable {
    /// Create a new empty handle table
    pub fn new(max_handles: usize) -> Self {
        Self {
            inner: Mutex::new(TableInner {
                slots: Vec::new(),
                free: Vec::new(),
                count: 0,
            }),
            max_handles,
            tag: NEXT_TABLE_TAG.fetch_add(1, Ordering::Relaxed),
        }
    }

    /// Register a handle for an object
    ///
    /// # Returns
    /// The new handle, or `InsufficientResources` when the table is full
    pub fn insert(
        &self,
        object: ObjectRef,
        granted_access: u32,
        session: SessionId,
        opener: Sid,
    ) -> LsaResult<Handle> {
        let mut inner = self.inner.lock();

        if inner.count >= self.max_handles {
            debug!("[OB] handle table full ({} handles)", inner.count);
            return Err(NtStatus::InsufficientResources);
        }

        let entry = HandleEntry {
            object,
            granted_access,
            session,
            opener,
        };

        let index = match inner.free.pop() {
            Some(index) => index,
            None => {
                inner.slots.push(Slot {
                    generation: 1,
                    entry: None,
                });
                (inner.slots.len() - 1) as u32
            }
        };

        let slot = &mut inner.slots[index as usize];
        slot.entry = Some(entry);
        let handle = Handle {
            index,
            generation: slot.generation,
            tag: self.tag,
        };
        inner.count += 1;

        trace!("[OB] {:?} -> {:?} access={:#x}", handle, object, granted_access);
        Ok(handle)
    }

    /// Look up a handle presented by `session`
    pub fn lookup(&self, handle: Handle, session: SessionId) -> LsaResult<HandleEntry> {
        if handle.tag != self.tag {
            return Err(NtStatus::InvalidHandle);
        }
        let inner = self.inner.lock();
        match inner.slot(handle).and_then(|slot| slot.entry.as_ref()) {
            Some(entry) if entry.session == session => Ok(entry.clone()),
            _ => Err(NtStatus::InvalidHandle),
        }
    }

    /// Look up a handle and check that it names an object of `kind`
    pub fn validate(&self, handle: Handle, kind: ObjectKind, session: SessionId) -> LsaResult<HandleEntry> {
        let entry = self.lookup(handle, session)?;
        if entry.object.kind() != kind {
            debug!(
                "[OB] {:?} is a {} handle, expected {}",
                handle,
                entry.object.kind().name(),
                kind.name()
            );
            return Err(NtStatus::InvalidHandle);
        }
        Ok(entry)
    }

    /// Close a handle
    ///
    /// The referenced object is left untouched.
    pub fn close(&self, handle: Handle, session: SessionId) -> LsaResult<HandleEntry> {
        if handle.tag != self.tag {
            return Err(NtStatus::InvalidHandle);
        }
        let mut inner = self.inner.lock();
        match inner.slot(handle).and_then(|slot| slot.entry.as_ref()) {
            Some(entry) if entry.session == session => {}
            _ => return Err(NtStatus::InvalidHandle),
        }
        inner
            .release(handle.index as usize)
            .ok_or(NtStatus::InvalidHandle)
    }

    /// Revoke every handle bound to `object`
    ///
    /// # Returns
    /// The number of handles revoked
    pub fn invalidate_object(&self, object: ObjectRef) -> usize {
        self.release_where(|entry| entry.object == object)
    }

    /// Close every handle owned by `session`
    pub fn close_session(&self, session: SessionId) -> usize {
        self.release_where(|entry| entry.session == session)
    }

    fn release_where(&self, predicate: impl Fn(&HandleEntry) -> bool) -> usize {
        let mut inner = self.inner.lock();
        let doomed: Vec<usize> = inner
            .slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.entry.as_ref().map_or(false, &predicate))
            .map(|(index, _)| index)
            .collect();
        for &index in &doomed {
            inner.release(index);
        }
        doomed.len()
    }

    /// Get number of handles in table
    pub fn count(&self) -> usize {
        self.inner.lock().count
    }

    /// Number of live handles bound to `object`
    pub fn count_for(&self, object: ObjectRef) -> usize {
        self.inner
            .lock()
            .slots
            .iter()
            .filter(|slot| slot.entry.as_ref().map_or(false, |e| e.object == object))
            .count()
    }
}

impl Default for HandleTable {
    fn default() -> Self {
        Self::new(MAX_HANDLES)
    }
}
