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

use cadence_core::handle::SlotIndex;
use serde::Serialize;
use std::fmt::Debug;
use std::time::Duration;

/// A completed span: what ran, where, and for how long.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpanRecord {
    /// The span name (pass name, "submit", "present").
    pub name: String,
    /// The slot the span was tagged with.
    pub slot: SlotIndex,
    /// Wall-clock duration between begin and end.
    pub duration: Duration,
}

/// Aggregate statistics for one span name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpanStats {
    /// The span name the statistics aggregate.
    pub name: String,
    /// How many spans completed under this name.
    pub count: u64,
    /// Total time across all completed spans, in microseconds.
    pub total_us: u128,
    /// The longest single span, in microseconds.
    pub max_us: u128,
}

/// Trait defining the interface for span storage backends.
pub trait SpanStore: Send + Sync + Debug + 'static {
    /// Stores a completed span.
    fn record(&self, record: SpanRecord);

    /// All completed spans, in completion order.
    fn records(&self) -> Vec<SpanRecord>;

    /// Aggregated statistics, sorted by name for stable output.
    fn stats(&self) -> Vec<SpanStats>;

    /// Number of completed spans stored.
    fn len(&self) -> usize;

    /// Whether no spans have been stored.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Discards all stored spans.
    fn clear(&self);
}
