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

//! Sinks implementing the core's telemetry seam.

use crate::storage::{SpanRecord, SpanStore};
use cadence_core::handle::SlotIndex;
use cadence_core::telemetry::{SpanId, TelemetrySink};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;

#[derive(Debug)]
struct OpenSpan {
    name: String,
    slot: SlotIndex,
    started: Instant,
}

/// Records span durations into a [`SpanStore`].
///
/// Begin/end never block beyond a short mutex hold and absorb their own
/// failure modes: a sink must not disturb submission.
#[derive(Debug)]
pub struct RecordingSink {
    store: Arc<dyn SpanStore>,
    open: Mutex<HashMap<u64, OpenSpan>>,
    next_id: AtomicU64,
}

impl RecordingSink {
    /// Creates a sink writing completed spans to the given store.
    pub fn new(store: Arc<dyn SpanStore>) -> Self {
        Self {
            store,
            open: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }
}

impl TelemetrySink for RecordingSink {
    fn span_begin(&self, name: &str, slot: SlotIndex) -> SpanId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        match self.open.lock() {
            Ok(mut open) => {
                open.insert(
                    id,
                    OpenSpan {
                        name: name.to_string(),
                        slot,
                        started: Instant::now(),
                    },
                );
            }
            Err(_) => {
                log::error!("RecordingSink mutex poisoned; span '{name}' dropped.");
            }
        }
        SpanId(id)
    }

    fn span_end(&self, span: SpanId) {
        let open = match self.open.lock() {
            Ok(mut open) => open.remove(&span.0),
            Err(_) => None,
        };
        // Unknown ids are ignored by contract.
        if let Some(open) = open {
            self.store.record(SpanRecord {
                name: open.name,
                slot: open.slot,
                duration: open.started.elapsed(),
            });
        }
    }
}

/// Forwards span boundaries to the `log` facade at trace level.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl TelemetrySink for LogSink {
    fn span_begin(&self, name: &str, slot: SlotIndex) -> SpanId {
        log::trace!("span begin '{name}' on {slot}");
        SpanId(0)
    }

    fn span_end(&self, _span: SpanId) {
        log::trace!("span end");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemorySpanStore;

    #[test]
    fn begin_end_records_one_span() {
        let store = Arc::new(InMemorySpanStore::new());
        let sink = RecordingSink::new(store.clone());

        let span = sink.span_begin("lighting", SlotIndex(1));
        sink.span_end(span);

        let records = store.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "lighting");
        assert_eq!(records[0].slot, SlotIndex(1));
    }

    #[test]
    fn unknown_span_end_is_ignored() {
        let store = Arc::new(InMemorySpanStore::new());
        let sink = RecordingSink::new(store.clone());

        sink.span_end(SpanId(999));
        assert!(store.is_empty());
    }

    #[test]
    fn interleaved_spans_resolve_independently() {
        let store = Arc::new(InMemorySpanStore::new());
        let sink = RecordingSink::new(store.clone());

        let outer = sink.span_begin("submit", SlotIndex(0));
        let inner = sink.span_begin("shadow", SlotIndex(0));
        sink.span_end(inner);
        sink.span_end(outer);

        let names: Vec<String> = store.records().into_iter().map(|r| r.name).collect();
        assert_eq!(names, vec!["shadow".to_string(), "submit".to_string()]);
    }
}
