//! Worker wake signal and the single-slot outbound frame queue.
//!
//! Two events wake the worker: the transceiver's interrupt line and a
//! frame submission. Both funnel through [`Tc6Shared`], which is the only
//! state the interrupt handler and submitting tasks ever touch; everything
//! else belongs to the worker.
//!
//! The outbound queue holds exactly one frame. [`FrameSender::send`]
//! blocks until the worker has captured the submitted frame, so at most
//! one frame ever waits for pickup and a second submission can never
//! overwrite the first. The worker's pickup doubles as the hand-off
//! signal, which is why no lock beyond the critical-section cell is
//! needed.

use core::sync::atomic::{AtomicBool, Ordering};

use super::primitives::IsrCell;
#[cfg(feature = "async")]
use super::primitives::WakerCell;

// =============================================================================
// Shared State
// =============================================================================

/// State shared between the worker, frame submitters and the ISR.
///
/// Const-constructible so it can live in a `static`:
///
/// ```ignore
/// static SHARED: Tc6Shared<&'static [u8]> = Tc6Shared::new();
///
/// // In the EXTI/GPIO interrupt handler:
/// SHARED.on_interrupt();
///
/// // Worker task:
/// loop {
///     SHARED.wait();
///     tc6.tick(&SHARED)?;
/// }
/// ```
pub struct Tc6Shared<F> {
    /// Set by the ISR, consumed by the worker at the start of a tick.
    irq_pending: AtomicBool,
    /// Set by either wake source, consumed by the worker's wait.
    work_pending: AtomicBool,
    /// The one-slot outbound frame queue.
    slot: IsrCell<Option<F>>,
    #[cfg(feature = "async")]
    work_waker: WakerCell,
    #[cfg(feature = "async")]
    space_waker: WakerCell,
}

impl<F> Tc6Shared<F> {
    /// Create the shared state (const, suitable for static initialization).
    pub const fn new() -> Self {
        Self {
            irq_pending: AtomicBool::new(false),
            work_pending: AtomicBool::new(false),
            slot: IsrCell::new(None),
            #[cfg(feature = "async")]
            work_waker: WakerCell::new(),
            #[cfg(feature = "async")]
            space_waker: WakerCell::new(),
        }
    }

    /// Call from the edge-triggered interrupt handler.
    ///
    /// Only the pending flag is touched here; no compound state is safe
    /// to reach from interrupt context.
    pub fn on_interrupt(&self) {
        self.irq_pending.store(true, Ordering::Release);
        self.notify_work();
    }

    /// Consume the interrupt-pending flag.
    pub fn take_interrupt(&self) -> bool {
        self.irq_pending.swap(false, Ordering::AcqRel)
    }

    /// True while an interrupt indication has not been consumed yet.
    pub fn interrupt_pending(&self) -> bool {
        self.irq_pending.load(Ordering::Acquire)
    }

    /// Consume the work flag; true when a wake source fired since the
    /// last call.
    pub fn take_work(&self) -> bool {
        self.work_pending.swap(false, Ordering::AcqRel)
    }

    /// Busy-wait until a wake source fires.
    pub fn wait(&self) {
        while !self.take_work() {
            core::hint::spin_loop();
        }
    }

    /// Wait asynchronously until a wake source fires.
    #[cfg(feature = "async")]
    pub async fn work(&self) {
        core::future::poll_fn(|cx| {
            if self.take_work() {
                return core::task::Poll::Ready(());
            }
            self.work_waker.register(cx.waker());
            if self.take_work() {
                core::task::Poll::Ready(())
            } else {
                core::task::Poll::Pending
            }
        })
        .await;
    }

    /// Handle used by producer tasks to submit outbound frames.
    pub fn sender(&self) -> FrameSender<'_, F> {
        FrameSender { shared: self }
    }

    /// Submit an outbound frame, blocking until the worker captures it.
    ///
    /// Shorthand for [`FrameSender::send`]; returns on hand-off, not on
    /// transmission completion.
    pub fn send_frame(&self, frame: F) {
        self.sender().send(frame);
    }

    /// True while a frame is queued awaiting worker pickup.
    pub fn frame_queued(&self) -> bool {
        self.slot.with(|slot| slot.is_some())
    }

    /// Worker-side pickup. Frees the slot and signals the submitter.
    pub(crate) fn take_frame(&self) -> Option<F> {
        let frame = self.slot.with(Option::take);
        if frame.is_some() {
            #[cfg(feature = "async")]
            self.space_waker.wake();
        }
        frame
    }

    fn notify_work(&self) {
        self.work_pending.store(true, Ordering::Release);
        #[cfg(feature = "async")]
        self.work_waker.wake();
    }
}

impl<F> Default for Tc6Shared<F> {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Frame Sender
// =============================================================================

/// Producer handle for the one-slot outbound queue.
pub struct FrameSender<'a, F> {
    shared: &'a Tc6Shared<F>,
}

impl<F> FrameSender<'_, F> {
    /// Queue a frame if the slot is free; the frame comes back otherwise.
    pub fn try_send(&self, frame: F) -> Result<(), F> {
        let result = self.shared.slot.with(|slot| {
            if slot.is_some() {
                Err(frame)
            } else {
                *slot = Some(frame);
                Ok(())
            }
        });
        if result.is_ok() {
            self.shared.notify_work();
        }
        result
    }

    /// Submit a frame, blocking until the worker has captured it.
    ///
    /// A previous submission still awaiting pickup blocks this one; the
    /// queued frame is never dropped or overwritten. Returns once the
    /// worker has taken the frame out of the slot, not once it has been
    /// transmitted.
    pub fn send(&self, frame: F) {
        let mut frame = frame;
        loop {
            match self.try_send(frame) {
                Ok(()) => break,
                Err(rejected) => {
                    frame = rejected;
                    core::hint::spin_loop();
                }
            }
        }
        while self.shared.frame_queued() {
            core::hint::spin_loop();
        }
    }

    /// Submit a frame, waiting asynchronously for the hand-off.
    ///
    /// Same contract as [`FrameSender::send`]: completes once the worker
    /// has captured the frame.
    #[cfg(feature = "async")]
    pub async fn send_async(&self, frame: F) {
        let mut frame = Some(frame);
        core::future::poll_fn(|cx| {
            if let Some(pending) = frame.take() {
                match self.try_send(pending) {
                    Ok(()) => {}
                    Err(rejected) => {
                        self.shared.space_waker.register(cx.waker());
                        match self.try_send(rejected) {
                            Ok(()) => {}
                            Err(rejected) => {
                                frame = Some(rejected);
                                return core::task::Poll::Pending;
                            }
                        }
                    }
                }
            }
            // Queued; now wait for worker pickup.
            if !self.shared.frame_queued() {
                return core::task::Poll::Ready(());
            }
            self.shared.space_waker.register(cx.waker());
            if self.shared.frame_queued() {
                core::task::Poll::Pending
            } else {
                core::task::Poll::Ready(())
            }
        })
        .await;
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
