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

//! Provides an RAII-based guard for spanning a scope. (RAII = Resource Acquisition Is Initialization)

use cadence_core::handle::SlotIndex;
use cadence_core::telemetry::{SpanId, TelemetrySink};

/// Opens a span on construction and closes it when dropped.
///
/// This leverages the RAII pattern to ensure the span is always closed,
/// even in the case of early returns.
pub struct ScopedSpan<'a> {
    sink: &'a dyn TelemetrySink,
    span: SpanId,
}

impl<'a> ScopedSpan<'a> {
    /// Opens a span on the given sink and starts it immediately.
    pub fn new(sink: &'a dyn TelemetrySink, name: &str, slot: SlotIndex) -> Self {
        let span = sink.span_begin(name, slot);
        Self { sink, span }
    }
}

impl Drop for ScopedSpan<'_> {
    fn drop(&mut self) {
        self.sink.span_end(self.span);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::RecordingSink;
    use crate::storage::{InMemorySpanStore, SpanStore};
    use std::sync::Arc;

    #[test]
    fn guard_closes_span_on_drop() {
        let store = Arc::new(InMemorySpanStore::new());
        let sink = RecordingSink::new(store.clone());

        {
            let _span = ScopedSpan::new(&sink, "frame", SlotIndex(0));
            assert!(store.is_empty(), "span still open inside the scope");
        }

        assert_eq!(store.len(), 1);
        assert_eq!(store.records()[0].name, "frame");
    }
}
