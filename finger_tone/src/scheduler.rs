//! Repeating frame task with a single owner and an explicit stop signal.

use std::ops::ControlFlow;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Cancels a running [`FrameScheduler`] from anywhere.
#[derive(Clone, Debug, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Calls a frame closure at a fixed rate until it breaks or is stopped.
///
/// Each frame runs to completion before the next is scheduled; a frame that
/// overruns its slot simply delays the next one.
pub struct FrameScheduler {
    period: Duration,
    stop:   StopHandle,
}

impl FrameScheduler {
    pub fn new(frames_per_second: u32) -> Self {
        FrameScheduler {
            period: Duration::from_secs(1) / frames_per_second.max(1),
            stop:   StopHandle::default(),
        }
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Run frames; returns how many completed.
    pub fn run<F>(&self, mut frame: F) -> u64
    where
        F: FnMut(u64) -> ControlFlow<()>,
    {
        let mut n = 0u64;
        while !self.stop.is_stopped() {
            let started = Instant::now();
            if frame(n).is_break() {
                break;
            }
            n += 1;
            if let Some(rest) = self.period.checked_sub(started.elapsed()) {
                thread::sleep(rest);
            }
        }
        n
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runs_until_break() {
        let s = FrameScheduler::new(1000);
        let n = s.run(|i| if i == 4 { ControlFlow::Break(()) } else { ControlFlow::Continue(()) });
        assert_eq!(n, 4);
    }

    #[test]
    fn stopped_before_start_runs_nothing() {
        let s = FrameScheduler::new(60);
        s.stop_handle().stop();
        assert_eq!(s.run(|_| ControlFlow::Continue(())), 0);
    }

    #[test]
    fn stop_from_inside_frame() {
        let s = FrameScheduler::new(1000);
        let h = s.stop_handle();
        let n = s.run(|i| {
            if i == 2 { h.stop(); }
            ControlFlow::Continue(())
        });
        assert_eq!(n, 3);
    }

    #[test]
    fn stop_from_other_thread() {
        let s = FrameScheduler::new(500);
        let h = s.stop_handle();
        let t = thread::spawn(move || {
            thread::sleep(Duration::from_millis(30));
            h.stop();
        });
        let n = s.run(|_| ControlFlow::Continue(()));
        t.join().unwrap();
        assert!(n > 0);
    }

    #[test]
    fn period_from_rate() {
        assert_eq!(FrameScheduler::new(50).period(), Duration::from_millis(20));
        assert_eq!(FrameScheduler::new(0).period(), Duration::from_secs(1));
    }
}
