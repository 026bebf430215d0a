// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! An in-memory span store with bounded retention.

use super::{SpanRecord, SpanStats, SpanStore};
use std::collections::BTreeMap;
use std::collections::VecDeque;
use std::sync::Mutex;

const DEFAULT_RETENTION: usize = 4096;

#[derive(Debug, Default)]
struct Aggregate {
    count: u64,
    total_us: u128,
    max_us: u128,
}

#[derive(Debug)]
struct StoreState {
    records: VecDeque<SpanRecord>,
    aggregates: BTreeMap<String, Aggregate>,
    retention: usize,
}

/// Keeps the most recent spans plus running aggregates per span name.
///
/// Retention bounds only the raw record list; aggregates keep counting
/// across the whole run.
#[derive(Debug)]
pub struct InMemorySpanStore {
    state: Mutex<StoreState>,
}

impl InMemorySpanStore {
    /// A store retaining the default number of raw records.
    pub fn new() -> Self {
        Self::with_retention(DEFAULT_RETENTION)
    }

    /// A store retaining at most `retention` raw records.
    pub fn with_retention(retention: usize) -> Self {
        Self {
            state: Mutex::new(StoreState {
                records: VecDeque::new(),
                aggregates: BTreeMap::new(),
                retention: retention.max(1),
            }),
        }
    }

    /// Renders the aggregated statistics as a pretty JSON report.
    pub fn report_json(&self) -> String {
        match serde_json::to_string_pretty(&self.stats()) {
            Ok(report) => report,
            Err(err) => {
                log::error!("Failed to serialize span report: {err}");
                String::from("[]")
            }
        }
    }
}

impl Default for InMemorySpanStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SpanStore for InMemorySpanStore {
    fn record(&self, record: SpanRecord) {
        let mut state = match self.state.lock() {
            Ok(state) => state,
            Err(_) => {
                log::error!("Span store mutex poisoned; dropping span record.");
                return;
            }
        };

        let micros = record.duration.as_micros();
        let aggregate = state.aggregates.entry(record.name.clone()).or_default();
        aggregate.count += 1;
        aggregate.total_us += micros;
        aggregate.max_us = aggregate.max_us.max(micros);

        if state.records.len() == state.retention {
            state.records.pop_front();
        }
        state.records.push_back(record);
    }

    fn records(&self) -> Vec<SpanRecord> {
        match self.state.lock() {
            Ok(state) => state.records.iter().cloned().collect(),
            Err(_) => Vec::new(),
        }
    }

    fn stats(&self) -> Vec<SpanStats> {
        match self.state.lock() {
            Ok(state) => state
                .aggregates
                .iter()
                .map(|(name, aggregate)| SpanStats {
                    name: name.clone(),
                    count: aggregate.count,
                    total_us: aggregate.total_us,
                    max_us: aggregate.max_us,
                })
                .collect(),
            Err(_) => Vec::new(),
        }
    }

    fn len(&self) -> usize {
        match self.state.lock() {
            Ok(state) => state.records.len(),
            Err(_) => 0,
        }
    }

    fn clear(&self) {
        if let Ok(mut state) = self.state.lock() {
            state.records.clear();
            state.aggregates.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadence_core::handle::SlotIndex;
    use std::time::Duration;

    fn record(name: &str, micros: u64) -> SpanRecord {
        SpanRecord {
            name: name.to_string(),
            slot: SlotIndex(0),
            duration: Duration::from_micros(micros),
        }
    }

    #[test]
    fn aggregates_per_name() {
        let store = InMemorySpanStore::new();
        store.record(record("shadow", 100));
        store.record(record("shadow", 300));
        store.record(record("lighting", 50));

        let stats = store.stats();
        assert_eq!(stats.len(), 2);
        // BTreeMap keeps stats sorted by name.
        assert_eq!(stats[0].name, "lighting");
        assert_eq!(stats[1].name, "shadow");
        assert_eq!(stats[1].count, 2);
        assert_eq!(stats[1].total_us, 400);
        assert_eq!(stats[1].max_us, 300);
    }

    #[test]
    fn retention_bounds_records_but_not_aggregates() {
        let store = InMemorySpanStore::with_retention(2);
        for index in 0..5 {
            store.record(record("pass", index * 10));
        }
        assert_eq!(store.len(), 2);
        assert_eq!(store.stats()[0].count, 5);
    }

    #[test]
    fn clear_resets_everything() {
        let store = InMemorySpanStore::new();
        store.record(record("pass", 10));
        store.clear();
        assert!(store.is_empty());
        assert!(store.stats().is_empty());
    }

    #[test]
    fn report_is_valid_json() {
        let store = InMemorySpanStore::new();
        store.record(record("present", 42));
        let report = store.report_json();
        assert!(report.contains("\"present\""));
        assert!(report.contains("\"count\": 1"));
    }
}
