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

//! # Cadence Telemetry
//!
//! Implementations of the [`cadence_core::telemetry::TelemetrySink`] seam:
//! an in-memory recording sink with per-span aggregation, a log-forwarding
//! sink, and an RAII guard for spanning a scope.

pub mod sink;
pub mod storage;
pub mod utils;

pub use sink::{LogSink, RecordingSink};
pub use storage::{InMemorySpanStore, SpanRecord, SpanStats, SpanStore};
pub use utils::ScopedSpan;
