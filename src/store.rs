/// Latest reading and rolling history per sensor kind
use std::collections::{HashMap, VecDeque};
use time::OffsetDateTime;

use crate::models::{SensorKind, SensorReading};
use crate::utils::{calculate_stats, HistoryStats};

/// Number of readings kept per kind
pub const HISTORY_WINDOW: usize = 30;

#[derive(Debug, Clone, Default)]
struct Channel {
    latest: Option<SensorReading>,
    history: VecDeque<SensorReading>,
}

#[derive(Debug, Clone, Default)]
pub struct SensorChannelStore {
    channels: HashMap<SensorKind, Channel>,
    last_update: Option<OffsetDateTime>,
}

impl SensorChannelStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the current reading for its kind and append it to history
    pub fn record(&mut self, reading: SensorReading) {
        let channel = self.channels.entry(reading.kind).or_default();

        // Maintain fixed-size history buffer (FIFO)
        if channel.history.len() >= HISTORY_WINDOW {
            channel.history.pop_front();
        }
        channel.history.push_back(reading.clone());
        channel.latest = Some(reading);

        self.last_update = Some(OffsetDateTime::now_utc());
    }

    /// None until the first reading of this kind arrives
    pub fn latest(&self, kind: SensorKind) -> Option<&SensorReading> {
        self.channels
            .get(&kind)
            .and_then(|channel| channel.latest.as_ref())
    }

    /// Oldest first, most recent last
    pub fn history(&self, kind: SensorKind) -> Vec<SensorReading> {
        self.channels
            .get(&kind)
            .map(|channel| channel.history.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn history_len(&self, kind: SensorKind) -> usize {
        self.channels
            .get(&kind)
            .map_or(0, |channel| channel.history.len())
    }

    pub fn stats(&self, kind: SensorKind) -> Option<HistoryStats> {
        self.channels
            .get(&kind)
            .and_then(|channel| calculate_stats(&channel.history))
    }

    /// UTC time at which the last reading of any kind was recorded
    pub fn last_update(&self) -> Option<OffsetDateTime> {
        self.last_update
    }
}
