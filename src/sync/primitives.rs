//! Synchronization primitives for ISR-safe access.
//!
//! Low-level cells shared between the worker task, frame submitters and
//! the interrupt handler.

use core::cell::RefCell;
#[cfg(feature = "async")]
use core::task::Waker;
use critical_section::Mutex;

/// Interior mutability guarded by a critical section.
///
/// Wraps `critical_section::Mutex<RefCell<T>>` so the same value can be
/// touched from thread and interrupt context.
pub struct IsrCell<T> {
    inner: Mutex<RefCell<T>>,
}

impl<T> IsrCell<T> {
    /// Create a new cell (const, suitable for static initialization).
    pub const fn new(value: T) -> Self {
        Self {
            inner: Mutex::new(RefCell::new(value)),
        }
    }

    /// Run a closure with exclusive mutable access.
    ///
    /// Interrupts are disabled for the duration of the closure.
    #[inline]
    pub fn with<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        critical_section::with(|cs| f(&mut self.inner.borrow_ref_mut(cs)))
    }
}

/// Waker storage for async waiting: registered from poll context, woken
/// from the interrupt handler or another task.
#[cfg(feature = "async")]
pub struct WakerCell {
    waker: IsrCell<Option<Waker>>,
}

#[cfg(feature = "async")]
impl WakerCell {
    /// Create an empty cell (const, suitable for static initialization).
    pub const fn new() -> Self {
        Self {
            waker: IsrCell::new(None),
        }
    }

    /// Store a waker, replacing any previous one.
    pub fn register(&self, waker: &Waker) {
        self.waker.with(|slot| match slot {
            Some(existing) if existing.will_wake(waker) => {}
            _ => *slot = Some(waker.clone()),
        });
    }

    /// Wake and clear the stored waker, if any.
    #[inline]
    pub fn wake(&self) {
        if let Some(waker) = self.waker.with(Option::take) {
            waker.wake();
        }
    }
}

#[cfg(feature = "async")]
impl Default for WakerCell {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
