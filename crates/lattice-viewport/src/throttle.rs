use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;

type Callback = Box<dyn FnOnce() + Send>;

#[derive(Default)]
struct Inner {
    pending: Option<Callback>,
    armed: bool,
}

/// Coalesces a flurry of scroll/resize recomputations into at most one
/// callback per frame interval.
///
/// Scheduling replaces any pending callback: when the frame fires, only
/// the latest one runs. [`FrameThrottle::cancel`] (or dropping the
/// throttle) drops the pending callback without running it.
///
/// The stand-in for `requestAnimationFrame` in a headless runtime: a
/// timer at the display's frame cadence.
pub struct FrameThrottle {
    frame_interval: Duration,
    inner: Arc<Mutex<Inner>>,
    timer: Option<JoinHandle<()>>,
}

impl FrameThrottle {
    /// Roughly one 60Hz display frame.
    pub const DEFAULT_FRAME_INTERVAL: Duration = Duration::from_millis(16);

    pub fn new() -> Self {
        Self::with_interval(Self::DEFAULT_FRAME_INTERVAL)
    }

    pub fn with_interval(frame_interval: Duration) -> Self {
        Self {
            frame_interval,
            inner: Arc::new(Mutex::new(Inner::default())),
            timer: None,
        }
    }

    /// Run `callback` on the next frame, replacing any callback already
    /// scheduled and not yet run.
    ///
    /// Must be called from within a tokio runtime.
    pub fn schedule(&mut self, callback: impl FnOnce() + Send + 'static) {
        {
            let mut inner = self.inner.lock().expect("frame throttle mutex poisoned");
            inner.pending = Some(Box::new(callback));
            if inner.armed {
                // The armed frame picks up the replacement.
                return;
            }
            inner.armed = true;
        }

        tracing::trace!(interval_ms = self.frame_interval.as_millis() as u64, "arming frame timer");
        let interval = self.frame_interval;
        let shared = Arc::clone(&self.inner);
        self.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(interval).await;
            let callback = {
                let mut inner = shared.lock().expect("frame throttle mutex poisoned");
                inner.armed = false;
                inner.pending.take()
            };
            if let Some(callback) = callback {
                callback();
            }
        }));
    }

    /// Drop the pending callback (if any) and disarm the frame timer.
    pub fn cancel(&mut self) {
        {
            let mut inner = self.inner.lock().expect("frame throttle mutex poisoned");
            inner.pending = None;
            inner.armed = false;
        }
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }

    /// True while a callback is scheduled and has not run yet.
    pub fn has_pending(&self) -> bool {
        self.inner
            .lock()
            .expect("frame throttle mutex poisoned")
            .pending
            .is_some()
    }
}

impl Default for FrameThrottle {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for FrameThrottle {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    async fn one_frame() {
        tokio::time::sleep(FrameThrottle::DEFAULT_FRAME_INTERVAL * 2).await;
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn a_flurry_coalesces_into_the_latest_callback() {
        let ran = Arc::new(Mutex::new(Vec::new()));
        let mut throttle = FrameThrottle::new();

        for i in 0..3 {
            let ran = Arc::clone(&ran);
            throttle.schedule(move || ran.lock().expect("ran").push(i));
        }
        assert!(throttle.has_pending());

        one_frame().await;
        assert_eq!(*ran.lock().expect("ran"), vec![2], "only the latest runs");
        assert!(!throttle.has_pending());
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn each_frame_runs_at_most_one_callback() {
        let runs = Arc::new(AtomicU64::new(0));
        let mut throttle = FrameThrottle::new();

        for _ in 0..2 {
            let runs = Arc::clone(&runs);
            throttle.schedule(move || {
                runs.fetch_add(1, Ordering::SeqCst);
            });
            one_frame().await;
        }
        assert_eq!(runs.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn cancel_drops_the_pending_callback() {
        let runs = Arc::new(AtomicU64::new(0));
        let mut throttle = FrameThrottle::new();

        {
            let runs = Arc::clone(&runs);
            throttle.schedule(move || {
                runs.fetch_add(1, Ordering::SeqCst);
            });
        }
        throttle.cancel();
        assert!(!throttle.has_pending());

        one_frame().await;
        assert_eq!(runs.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn dropping_the_throttle_cancels_it() {
        let runs = Arc::new(AtomicU64::new(0));
        {
            let mut throttle = FrameThrottle::new();
            let runs = Arc::clone(&runs);
            throttle.schedule(move || {
                runs.fetch_add(1, Ordering::SeqCst);
            });
        }

        one_frame().await;
        assert_eq!(runs.load(Ordering::SeqCst), 0);
    }
}
