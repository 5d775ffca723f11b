//! Session-keyed result slots shared with native callbacks.
//!
//! The bridge hands results back through plain `extern "C"` sinks that only
//! receive a session id. Before each native call a fresh id is allocated and a
//! slot registered under it; sinks append into that slot; after the call the
//! slot is taken out again. A sink that arrives for an unknown id is dropped.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, OnceLock, PoisonError};

use crate::marshal::TagMap;

/// Correlates one native call with its pending [`Slot`].
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SessionId(u64);

impl SessionId {
    #[inline]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl From<u64> for SessionId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Debug for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SessionId({})", self.0)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Pending result for one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Slot {
    /// Lower-cased field name to values, in delivery order.
    Tags(TagMap),
    /// Most recently delivered picture payload.
    Picture(Option<Vec<u8>>),
}

impl Slot {
    pub fn tags() -> Self {
        Slot::Tags(TagMap::new())
    }

    pub fn picture() -> Self {
        Slot::Picture(None)
    }
}

/// Concurrent map from [`SessionId`] to [`Slot`].
///
/// All methods take `&self`; the internal lock is never held across a native
/// call, so sinks running on the caller's stack can re-enter it.
pub struct Registry {
    next: AtomicU64,
    slots: Mutex<HashMap<SessionId, Slot>>,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            next: AtomicU64::new(0),
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Allocate an id that has never been handed out by this registry.
    pub fn allocate(&self) -> SessionId {
        SessionId(self.next.fetch_add(1, Ordering::Relaxed) + 1)
    }

    /// Store `slot` under `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` already has a live slot.
    pub fn register(&self, id: SessionId, slot: Slot) {
        let previous = self.lock().insert(id, slot);
        assert!(previous.is_none(), "session {id} registered twice");
    }

    /// Append `value` under `key` to the tag slot of `id`.
    ///
    /// Returns `false` (and drops the value) when `id` has no tag slot.
    pub fn append_tag(&self, id: SessionId, key: String, value: String) -> bool {
        match self.lock().get_mut(&id) {
            Some(Slot::Tags(map)) => {
                map.entry(key).or_default().push(value);
                true
            }
            Some(Slot::Picture(_)) => {
                log::debug!("session {id}: tag {key:?} delivered to a picture slot, dropped");
                false
            }
            None => {
                log::debug!("session {id}: no slot for tag {key:?}, dropped");
                false
            }
        }
    }

    /// Replace the picture payload of `id`.
    ///
    /// Returns `false` (and drops the bytes) when `id` has no picture slot.
    pub fn put_picture(&self, id: SessionId, bytes: Vec<u8>) -> bool {
        match self.lock().get_mut(&id) {
            Some(Slot::Picture(data)) => {
                *data = Some(bytes);
                true
            }
            Some(Slot::Tags(_)) => {
                log::debug!("session {id}: picture delivered to a tag slot, dropped");
                false
            }
            None => {
                log::debug!("session {id}: no slot for picture, dropped");
                false
            }
        }
    }

    /// Remove and return the slot of `id`.
    pub fn take(&self, id: SessionId) -> Option<Slot> {
        self.lock().remove(&id)
    }

    /// Number of live slots.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // A panic while holding the lock cannot leave a slot half-written, so a
    // poisoned lock is still usable. This also runs inside native callbacks,
    // where panicking is not an option.
    fn lock(&self) -> MutexGuard<'_, HashMap<SessionId, Slot>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

/// The registry used by the native callbacks.
pub fn global() -> &'static Registry {
    static REGISTRY: OnceLock<Registry> = OnceLock::new();
    REGISTRY.get_or_init(Registry::new)
}

/// A registered slot that is released when the session ends.
///
/// Dropping a `Session` without calling [`finish`](Self::finish) still
/// removes the slot, so early returns and unwinding do not leak entries.
pub struct Session<'r> {
    registry: &'r Registry,
    id: SessionId,
}

impl<'r> Session<'r> {
    pub fn open(registry: &'r Registry, slot: Slot) -> Self {
        let id = registry.allocate();
        registry.register(id, slot);
        log::trace!("session {id} opened");
        Self { registry, id }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Take the slot out of the registry.
    pub fn finish(self) -> Option<Slot> {
        let slot = self.registry.take(self.id);
        log::trace!("session {} finished", self.id);
        // Already taken; skip the release in Drop.
        std::mem::forget(self);
        slot
    }
}

impl Drop for Session<'_> {
    fn drop(&mut self) {
        self.registry.take(self.id);
    }
}
