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

//! The telemetry seam: timing spans around passes and submissions.
//!
//! The core only emits span boundaries; buffering and export are the sink
//! implementation's business. Emission is fire-and-forget and must never
//! block submission.

use crate::handle::SlotIndex;
use std::fmt;

/// Identifies an open span returned by [`TelemetrySink::span_begin`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SpanId(pub u64);

/// A read-only consumer of timing spans.
pub trait TelemetrySink: Send + Sync + fmt::Debug {
    /// Opens a span tagged with the slot it belongs to.
    fn span_begin(&self, name: &str, slot: SlotIndex) -> SpanId;

    /// Closes a previously opened span. Unknown ids must be ignored, not
    /// reported: the sink is never allowed to disturb the producer.
    fn span_end(&self, span: SpanId);
}

/// A sink that discards every span. Used by tests and headless setups that
/// do not care about timing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl TelemetrySink for NullSink {
    fn span_begin(&self, _name: &str, _slot: SlotIndex) -> SpanId {
        SpanId(0)
    }

    fn span_end(&self, _span: SpanId) {}
}
