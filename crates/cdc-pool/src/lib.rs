//! ---
//! cdc_section: "02-frame-pool"
//! cdc_subsection: "module"
//! cdc_type: "source"
//! cdc_scope: "code"
//! cdc_description: "Fixed-capacity frame buffer pool with ownership-enforced release."
//! cdc_version: "v0.1.0"
//! cdc_owner: "tbd"
//! ---
//! Fixed-capacity buffer pool for bus frames.
//!
//! The transport allocates every inbound and outbound frame out of a pool so
//! that a flooded bus degrades by shedding frames instead of growing without
//! bound. A [`PooledSlot`] hands the buffer back on drop; there is no manual
//! free call and therefore no double-free or use-after-release path.

use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

/// How long an exhausted blocking allocation waits before rescanning.
pub const ALLOC_RETRY_BACKOFF: Duration = Duration::from_millis(100);

struct Slot<T> {
    in_use: bool,
    generation: u64,
    value: Option<T>,
}

struct PoolInner<T> {
    slots: Mutex<Vec<Slot<T>>>,
}

/// A fixed set of reusable buffers.
///
/// `alloc` waits for a slot to come back when the pool is exhausted, which is
/// the right behaviour for task context. Interrupt-style producers that must
/// never wait use [`FramePool::try_alloc`] and drop their data when it fails.
pub struct FramePool<T> {
    inner: Arc<PoolInner<T>>,
}

impl<T> Clone for FramePool<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Default> FramePool<T> {
    /// Create a pool holding `capacity` default-initialised buffers.
    pub fn new(capacity: usize) -> Self {
        let slots = (0..capacity)
            .map(|_| Slot {
                in_use: false,
                generation: 0,
                value: Some(T::default()),
            })
            .collect();
        Self {
            inner: Arc::new(PoolInner {
                slots: Mutex::new(slots),
            }),
        }
    }

    /// Claim a buffer, waiting while the pool is exhausted.
    ///
    /// The wait is a periodic rescan rather than a wakeup queue; exhaustion
    /// is an overload condition where another 100 ms of latency is already
    /// lost, and the rescan keeps the release path free of bookkeeping.
    pub async fn alloc(&self) -> PooledSlot<T> {
        loop {
            if let Some(slot) = self.try_alloc() {
                return slot;
            }
            tracing::warn!("frame pool exhausted; retrying allocation");
            tokio::time::sleep(ALLOC_RETRY_BACKOFF).await;
        }
    }

    /// Claim a buffer without waiting. Returns `None` when every slot is in
    /// use, in which case the caller must shed its data.
    pub fn try_alloc(&self) -> Option<PooledSlot<T>> {
        let mut slots = self.inner.slots.lock();
        for (index, slot) in slots.iter_mut().enumerate() {
            if !slot.in_use {
                slot.in_use = true;
                slot.generation += 1;
                let value = slot
                    .value
                    .take()
                    .unwrap_or_default();
                return Some(PooledSlot {
                    pool: Arc::clone(&self.inner),
                    index,
                    generation: slot.generation,
                    value: Some(value),
                });
            }
        }
        None
    }

    /// Number of slots currently claimed.
    pub fn in_use(&self) -> usize {
        self.inner.slots.lock().iter().filter(|s| s.in_use).count()
    }

    /// Total slot count.
    pub fn capacity(&self) -> usize {
        self.inner.slots.lock().len()
    }
}

/// An owned claim on one pool buffer. Dropping the handle returns the buffer
/// to the pool.
pub struct PooledSlot<T> {
    pool: Arc<PoolInner<T>>,
    index: usize,
    generation: u64,
    value: Option<T>,
}

impl<T> Deref for PooledSlot<T> {
    type Target = T;

    fn deref(&self) -> &T {
        self.value.as_ref().expect("pooled slot already released")
    }
}

impl<T> DerefMut for PooledSlot<T> {
    fn deref_mut(&mut self) -> &mut T {
        self.value.as_mut().expect("pooled slot already released")
    }
}

impl<T> Drop for PooledSlot<T> {
    fn drop(&mut self) {
        let mut slots = self.pool.slots.lock();
        let slot = &mut slots[self.index];
        // A stale generation means the slot was already recycled; releasing
        // it again would corrupt whoever holds it now.
        if slot.generation == self.generation {
            slot.value = self.value.take();
            slot.in_use = false;
        }
    }
}
