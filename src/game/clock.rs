//! Countdown clock for a running game.
//!
//! The ticker decrements the remaining time once per second (fixed delay, the
//! first tick one full second after start) and reports each decrement through
//! the `on_tick` callback so the world can publish a fresh snapshot. At zero
//! the ticker keeps running without decrementing; the game stays in `Running`
//! until something stops it explicitly.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use log::warn;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};

use crate::config::game::CLOCK_TICK_MS;
use crate::game::types::{GameMode, Grade};
use crate::game::utils::lock;

struct ClockTime {
    remaining: u32,
    max: u32,
}

struct TickerHandle {
    cancelled: Arc<AtomicBool>,
    wake: Arc<Notify>,
    _handle: JoinHandle<()>,
}

pub struct GameClock {
    time: Arc<Mutex<ClockTime>>,
    mode: Mutex<GameMode>,
    ticker: Mutex<Option<TickerHandle>>,
}

impl GameClock {
    pub fn new() -> Self {
        Self {
            time: Arc::new(Mutex::new(ClockTime {
                remaining: 0,
                max: 0,
            })),
            mode: Mutex::new(GameMode::Paused),
            ticker: Mutex::new(None),
        }
    }

    /// Sets both the remaining and the maximum time, in seconds.
    pub fn set_time(&self, seconds: u32) {
        let mut time = lock(&self.time);
        time.remaining = seconds;
        time.max = seconds;
    }

    /// Switches to `Running` and spawns the ticker. `on_tick` fires after
    /// every actual decrement, not on idle ticks at zero.
    pub fn start<F>(&self, on_tick: F)
    where
        F: Fn() + Send + 'static,
    {
        {
            let mut mode = lock(&self.mode);
            if *mode != GameMode::Paused {
                warn!("[Clock] start ignored, mode is {:?}", *mode);
                return;
            }
            *mode = GameMode::Running;
        }

        let cancelled = Arc::new(AtomicBool::new(false));
        let wake = Arc::new(Notify::new());
        let time = Arc::clone(&self.time);

        let handle = tokio::spawn({
            let cancelled = Arc::clone(&cancelled);
            let wake = Arc::clone(&wake);
            async move {
                let tick = Duration::from_millis(CLOCK_TICK_MS);
                let mut ticker = interval_at(Instant::now() + tick, tick);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                loop {
                    tokio::select! {
                        _ = ticker.tick() => {}
                        _ = wake.notified() => {}
                    }
                    if cancelled.load(Ordering::Acquire) {
                        break;
                    }
                    let ticked = {
                        let mut time = lock(&time);
                        if time.remaining > 0 {
                            time.remaining -= 1;
                            true
                        } else {
                            false
                        }
                    };
                    if ticked {
                        on_tick();
                    }
                }
            }
        });

        *lock(&self.ticker) = Some(TickerHandle {
            cancelled,
            wake,
            _handle: handle,
        });
    }

    /// Switches to `Stopped` and cancels the ticker. Idempotent; the remaining
    /// time freezes wherever it stands.
    pub fn stop(&self) {
        {
            let mut mode = lock(&self.mode);
            if *mode == GameMode::Stopped {
                return;
            }
            *mode = GameMode::Stopped;
        }
        if let Some(ticker) = lock(&self.ticker).take() {
            ticker.cancelled.store(true, Ordering::Release);
            ticker.wake.notify_one();
        }
    }

    /// Manual one-second decrement, floored at zero. Returns the new value.
    pub fn decrement_time(&self) -> u32 {
        let mut time = lock(&self.time);
        time.remaining = time.remaining.saturating_sub(1);
        time.remaining
    }

    pub fn time_remaining(&self) -> u32 {
        lock(&self.time).remaining
    }

    pub fn max_time(&self) -> u32 {
        lock(&self.time).max
    }

    pub fn mode(&self) -> GameMode {
        *lock(&self.mode)
    }

    pub fn score(&self) -> Grade {
        let time = lock(&self.time);
        grade_for(time.remaining, time.max)
    }
}

/// Letter grade for `remaining` out of `max` seconds.
fn grade_for(remaining: u32, max: u32) -> Grade {
    let remaining = remaining as f64;
    let max = max as f64;
    if remaining > 0.79 * max {
        Grade::A
    } else if remaining > 0.59 * max {
        Grade::B
    } else if remaining > 0.39 * max {
        Grade::C
    } else if remaining > 0.19 * max {
        Grade::D
    } else {
        Grade::F
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::sleep;

    #[tokio::test(start_paused = true)]
    async fn test_first_tick_lands_after_one_full_second() {
        let clock = GameClock::new();
        clock.set_time(5);
        clock.start(|| {});

        sleep(Duration::from_millis(999)).await;
        assert_eq!(clock.time_remaining(), 5);

        sleep(Duration::from_millis(2)).await;
        assert_eq!(clock.time_remaining(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_once_per_second() {
        let clock = GameClock::new();
        clock.set_time(5);
        clock.start(|| {});

        sleep(Duration::from_millis(3_100)).await;
        assert_eq!(clock.time_remaining(), 2);
        assert_eq!(clock.mode(), GameMode::Running);
    }

    #[tokio::test(start_paused = true)]
    async fn test_floors_at_zero_and_stays_running() {
        let clock = GameClock::new();
        clock.set_time(2);
        clock.start(|| {});

        sleep(Duration::from_millis(6_100)).await;
        assert_eq!(clock.time_remaining(), 0);
        assert_eq!(clock.mode(), GameMode::Running);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_freezes_the_clock_and_is_idempotent() {
        let clock = GameClock::new();
        clock.set_time(10);
        clock.start(|| {});

        sleep(Duration::from_millis(2_100)).await;
        clock.stop();
        assert_eq!(clock.mode(), GameMode::Stopped);

        let frozen = clock.time_remaining();
        assert_eq!(frozen, 8);
        sleep(Duration::from_millis(3_000)).await;
        assert_eq!(clock.time_remaining(), frozen);

        clock.stop();
        assert_eq!(clock.mode(), GameMode::Stopped);
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_requires_a_paused_clock() {
        let clock = GameClock::new();
        clock.set_time(5);
        clock.start(|| {});
        clock.stop();

        clock.start(|| {});
        assert_eq!(clock.mode(), GameMode::Stopped);
    }

    #[test]
    fn test_grades_follow_the_remaining_time() {
        assert_eq!(grade_for(5, 5), Grade::A);
        assert_eq!(grade_for(4, 5), Grade::A);
        assert_eq!(grade_for(3, 5), Grade::B);
        assert_eq!(grade_for(2, 5), Grade::C);
        assert_eq!(grade_for(1, 5), Grade::D);
        assert_eq!(grade_for(0, 5), Grade::F);
        assert_eq!(grade_for(0, 0), Grade::F);
    }

    #[test]
    fn test_manual_decrement_floors_at_zero() {
        let clock = GameClock::new();
        clock.set_time(1);
        assert_eq!(clock.decrement_time(), 0);
        assert_eq!(clock.decrement_time(), 0);
        assert_eq!(clock.score(), Grade::F);
    }
}
