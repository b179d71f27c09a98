//! Tokio-backed tick and key sources.

use std::time::Duration;

use async_trait::async_trait;
use tokio::{
    sync::mpsc,
    time::{Instant, Interval, MissedTickBehavior, interval_at},
};

use crate::driver::{Keypad, Ticker};

/// Fixed-cadence [`Ticker`] on the tokio clock.
///
/// The first tick fires one period after creation. Ticks missed while the
/// runtime was busy are delivered late, never in a burst.
#[derive(Debug)]
pub struct IntervalTicker {
    interval: Interval,
}

impl IntervalTicker {
    /// Tick every `period`.
    pub fn new(period: Duration) -> Self {
        let mut interval = interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self { interval }
    }
}

#[async_trait]
impl Ticker for IntervalTicker {
    async fn tick(&mut self) {
        self.interval.tick().await;
    }
}

/// [`Keypad`] fed through a channel.
///
/// Input ends when every sender is dropped.
#[derive(Debug)]
pub struct ChannelKeypad {
    keys: mpsc::Receiver<u8>,
}

impl ChannelKeypad {
    /// Keypad and the sender that feeds it.
    pub fn channel(buffer: usize) -> (mpsc::Sender<u8>, Self) {
        let (tx, rx) = mpsc::channel(buffer);
        (tx, Self { keys: rx })
    }

    /// Keypad that yields `codes` in order, then ends.
    pub fn scripted(codes: impl IntoIterator<Item = u8>) -> Self {
        let codes: Vec<u8> = codes.into_iter().collect();
        let (tx, keypad) = Self::channel(codes.len().max(1));
        for code in codes {
            // Capacity covers every code.
            let _ = tx.try_send(code);
        }
        keypad
    }
}

#[async_trait]
impl Keypad for ChannelKeypad {
    async fn next_key(&mut self) -> Option<u8> {
        self.keys.recv().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn ticks_on_period() {
        let start = Instant::now();
        let mut ticker = IntervalTicker::new(Duration::from_secs(1));
        ticker.tick().await;
        ticker.tick().await;
        assert_eq!(start.elapsed(), Duration::from_secs(2));
    }

    #[tokio::test]
    async fn scripted_keypad_ends() {
        let mut keypad = ChannelKeypad::scripted([1, 2, 13]);
        assert_eq!(keypad.next_key().await, Some(1));
        assert_eq!(keypad.next_key().await, Some(2));
        assert_eq!(keypad.next_key().await, Some(13));
        assert_eq!(keypad.next_key().await, None);
    }
}
