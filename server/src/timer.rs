use std::ops::ControlFlow;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

/// A repeating background tick that stops when `on_tick` breaks, when
/// [`Countdown::cancel`] is called, or when the handle is dropped.
#[derive(Debug)]
pub struct Countdown {
    handle: JoinHandle<()>,
}

impl Countdown {
    /// Calls `on_tick` every `period`, first after one full period.
    pub fn spawn<F>(period: Duration, mut on_tick: F) -> Self
    where
        F: FnMut() -> ControlFlow<()> + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            let mut interval = interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if on_tick().is_break() {
                    break;
                }
            }
        });
        Self { handle }
    }

    pub fn cancel(&self) {
        self.handle.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for Countdown {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn counter(limit: u32) -> (Arc<AtomicU32>, impl FnMut() -> ControlFlow<()> + Send) {
        let ticks = Arc::new(AtomicU32::new(0));
        let seen = ticks.clone();
        let on_tick = move || {
            if seen.fetch_add(1, Ordering::SeqCst) + 1 >= limit {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        };
        (ticks, on_tick)
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_once_per_period() {
        let (ticks, on_tick) = counter(u32::MAX);
        let _countdown = Countdown::spawn(Duration::from_secs(1), on_tick);

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_millis(3_000)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn stops_when_callback_breaks() {
        let (ticks, on_tick) = counter(2);
        let countdown = Countdown::spawn(Duration::from_secs(1), on_tick);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 2);
        assert!(countdown.is_finished());
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_stops_ticking() {
        let (ticks, on_tick) = counter(u32::MAX);
        let countdown = Countdown::spawn(Duration::from_secs(1), on_tick);

        tokio::time::sleep(Duration::from_millis(2_500)).await;
        countdown.cancel();
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn drop_stops_ticking() {
        let (ticks, on_tick) = counter(u32::MAX);
        let countdown = Countdown::spawn(Duration::from_secs(1), on_tick);

        tokio::time::sleep(Duration::from_millis(1_500)).await;
        drop(countdown);
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 1);
    }
}
