use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::config::DispatchConfig;
use crate::models::Channel;

/// Enforces a minimum interval between consecutive provider calls per channel.
///
/// Each caller reserves the next free slot under the lock, then sleeps until
/// that slot outside of it. Channels are paced independently; one pacer is
/// shared by every batch in the process.
#[derive(Debug)]
pub struct Pacer {
    intervals: HashMap<Channel, Duration>,
    next_slot: Mutex<HashMap<Channel, Instant>>,
}

impl Pacer {
    pub fn new(config: &DispatchConfig) -> Self {
        let intervals = Channel::ALL
            .into_iter()
            .map(|channel| (channel, config.min_interval(channel)))
            .collect();

        Self {
            intervals,
            next_slot: Mutex::new(HashMap::new()),
        }
    }

    /// A pacer that never waits
    pub fn unpaced() -> Self {
        Self {
            intervals: HashMap::new(),
            next_slot: Mutex::new(HashMap::new()),
        }
    }

    pub fn interval(&self, channel: Channel) -> Duration {
        self.intervals
            .get(&channel)
            .copied()
            .unwrap_or(Duration::ZERO)
    }

    /// Waits until this caller may call the channel's provider
    pub async fn wait_turn(&self, channel: Channel) {
        let interval = self.interval(channel);
        if interval.is_zero() {
            return;
        }

        let slot = {
            let mut next_slot = self.next_slot.lock().await;
            let now = Instant::now();
            let slot = next_slot
                .get(&channel)
                .copied()
                .filter(|t| *t > now)
                .unwrap_or(now);
            next_slot.insert(channel, slot + interval);
            slot
        };

        tokio::time::sleep_until(slot).await;
    }
}
