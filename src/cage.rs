//! Operator-triggered recalibration ("caging" the attitude reference).
//!
//! A requester deposits a one-shot signal and waits until the fusion loop
//! takes it, which happens at the start of the loop's next cycle. The fusion
//! loop polls without blocking, so its own timing is unaffected.
//!
//! [`Cage::request`] waits forever if the fusion loop is not running (IMU
//! disabled or disconnected). Use [`Cage::request_within`] where that matters.

use core::sync::atomic::{AtomicBool, Ordering};

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_sync::signal::Signal;
use embassy_time::{with_timeout, Duration};

use crate::error::CageError;

pub struct Cage {
    requests: Channel<CriticalSectionRawMutex, (), 1>,
    taken: Signal<CriticalSectionRawMutex, ()>,
    calibrating: AtomicBool,
}

impl Cage {
    pub const fn new() -> Self {
        Self {
            requests: Channel::new(),
            taken: Signal::new(),
            calibrating: AtomicBool::new(false),
        }
    }

    /// Asks for a recalibration and waits until the fusion loop accepts it.
    ///
    /// Cancel-safe: dropping the future before the request is taken withdraws
    /// it, so the fusion loop never calibrates for a requester that gave up.
    /// Intended for one requester at a time.
    pub async fn request(&self) {
        self.taken.reset();
        self.requests.send(()).await;
        let pending = Withdraw(self);
        self.taken.wait().await;
        core::mem::forget(pending);
    }

    /// Like [`Cage::request`], but gives up after `timeout`.
    pub async fn request_within(&self, timeout: Duration) -> Result<(), CageError> {
        with_timeout(timeout, self.request())
            .await
            .map_err(|_| CageError::Timeout)
    }

    /// Non-blocking check from the fusion loop; acknowledges a pending request.
    pub(crate) fn take_request(&self) -> bool {
        if self.requests.try_receive().is_ok() {
            self.taken.signal(());
            true
        } else {
            false
        }
    }

    /// A recalibration request is waiting for the fusion loop.
    pub fn is_pending(&self) -> bool {
        !self.requests.is_empty()
    }

    /// Calibration (initial or requested) in progress.
    pub fn is_calibrating(&self) -> bool {
        self.calibrating.load(Ordering::Relaxed)
    }

    pub(crate) fn set_calibrating(&self, calibrating: bool) {
        self.calibrating.store(calibrating, Ordering::Relaxed);
    }
}

/// Pulls a deposited request back out if its requester stops waiting.
struct Withdraw<'a>(&'a Cage);

impl Drop for Withdraw<'_> {
    fn drop(&mut self) {
        let _ = self.0.requests.try_receive();
    }
}

impl Default for Cage {
    fn default() -> Self {
        Self::new()
    }
}
