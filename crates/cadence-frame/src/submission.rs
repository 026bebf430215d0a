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

//! The command submission engine.
//!
//! Translates the ordered pass list plus synchronization points into one
//! batched device submission, validating every handle against the registry
//! on the way. Telemetry spans are emitted around each pass and around
//! submission/presentation; emission is fire-and-forget.

use crate::graph::FramePlan;
use crate::registry::ResourceRegistry;
use cadence_core::backend::{
    SubmissionBackend, SubmissionBatch, SubmissionHandle, SubmissionItem,
};
use cadence_core::error::{FrameError, PresentError};
use cadence_core::handle::SlotIndex;
use cadence_core::pass::AccessKind;
use cadence_core::resource::UsageState;
use cadence_core::telemetry::TelemetrySink;
use std::sync::Arc;

/// Issues ordered frame plans to the device backend.
#[derive(Debug)]
pub struct SubmissionEngine {
    backend: Arc<dyn SubmissionBackend>,
    sink: Arc<dyn TelemetrySink>,
}

impl SubmissionEngine {
    /// Creates an engine over a backend and a telemetry sink.
    pub fn new(backend: Arc<dyn SubmissionBackend>, sink: Arc<dyn TelemetrySink>) -> Self {
        Self { backend, sink }
    }

    /// Issues the plan's work in the exact order produced by the graph
    /// build, inserting each barrier before the pass that requires it.
    ///
    /// Every access is resolved against the registry first: a stale handle
    /// is fatal for this frame and nothing is handed to the device. Usage
    /// states and write confinement are recorded as the batch is built.
    ///
    /// ## Errors
    /// * `FrameError::Registry` - a pass referenced a stale handle.
    /// * `FrameError::Submit` - the device rejected the batch; fatal for
    ///   the frame and never retried here.
    pub fn submit(
        &self,
        plan: &FramePlan,
        slot: SlotIndex,
        frame_index: u64,
        registry: &mut ResourceRegistry,
    ) -> Result<SubmissionHandle, FrameError> {
        let mut batch = SubmissionBatch {
            frame_index,
            items: Vec::with_capacity(plan.passes.len()),
        };

        for pass in &plan.passes {
            let span = self.sink.span_begin(&pass.name, slot);
            let translated = self.translate_pass(pass, slot, registry);
            self.sink.span_end(span);
            batch.items.push(translated?);
        }

        let span = self.sink.span_begin("submit", slot);
        let submitted = self.backend.submit(&batch, slot);
        self.sink.span_end(span);

        let token = submitted.map_err(FrameError::from)?;
        log::debug!(
            "Frame {frame_index} submitted on {slot}: {} passes, {} barriers",
            plan.passes.len(),
            plan.barrier_count()
        );
        Ok(SubmissionHandle { token, frame_index })
    }

    fn translate_pass(
        &self,
        pass: &crate::graph::ScheduledPass,
        slot: SlotIndex,
        registry: &mut ResourceRegistry,
    ) -> Result<SubmissionItem, FrameError> {
        // Barriers first: the covered resources are in transition until the
        // pass's own access state lands below.
        for barrier in &pass.barriers {
            registry.mark_usage(barrier.resource, UsageState::Transitioning)?;
        }
        for access in &pass.accesses {
            match access.kind {
                AccessKind::Read => {
                    registry.mark_usage(access.handle, UsageState::Read)?;
                }
                AccessKind::Write => {
                    registry.mark_usage(access.handle, UsageState::Write)?;
                    registry.confine_write(access.handle, slot)?;
                }
            }
        }
        Ok(SubmissionItem {
            pass_name: pass.name.clone(),
            work: pass.work,
            barriers: pass.barriers.clone(),
        })
    }

    /// Requests display of the slot's output.
    ///
    /// ## Errors
    /// * `PresentError::Stale` - non-fatal; the caller recreates the
    ///   presentation target and resumes.
    /// * `PresentError::Rejected` - fatal for the frame.
    pub fn present(&self, slot: SlotIndex) -> Result<(), PresentError> {
        let span = self.sink.span_begin("present", slot);
        let result = self.backend.present(slot);
        self.sink.span_end(span);
        if let Err(err) = &result {
            log::warn!("Present failed: {err}");
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{FrameGraphBuilder, FramePlan};
    use crate::null_backend::NullBackend;
    use cadence_core::pass::{ResourceAccess, WorkToken};
    use cadence_core::resource::ResourceKind;
    use cadence_core::telemetry::NullSink;

    fn engine(backend: Arc<NullBackend>) -> SubmissionEngine {
        SubmissionEngine::new(backend, Arc::new(NullSink))
    }

    fn plan_with_one_pass(registry: &mut ResourceRegistry) -> FramePlan {
        let target = registry.create(ResourceKind::Image {
            width: 4,
            height: 4,
        });
        let target = target.unwrap();
        let mut builder = FrameGraphBuilder::new();
        builder.declare_pass("clear", vec![ResourceAccess::write(target)], WorkToken(7));
        builder.build().unwrap()
    }

    #[test]
    fn submit_hands_ordered_items_to_backend() {
        let backend = Arc::new(NullBackend::new());
        let engine = engine(backend.clone());
        let mut registry = ResourceRegistry::new(8, 2);
        let plan = plan_with_one_pass(&mut registry);

        let handle = engine
            .submit(&plan, SlotIndex(0), 1, &mut registry)
            .unwrap();
        assert_eq!(handle.frame_index, 1);

        let submitted = backend.submitted();
        assert_eq!(submitted.len(), 1);
        assert_eq!(submitted[0].1.items[0].pass_name, "clear");
        assert_eq!(submitted[0].1.items[0].work, WorkToken(7));
    }

    #[test]
    fn stale_handle_aborts_before_device_sees_work() {
        let backend = Arc::new(NullBackend::new());
        let engine = engine(backend.clone());
        let mut registry = ResourceRegistry::new(8, 1);

        let target = registry.create(ResourceKind::Buffer { size: 8 }).unwrap();
        let mut builder = FrameGraphBuilder::new();
        builder.declare_pass("copy", vec![ResourceAccess::write(target)], WorkToken(0));
        let plan = builder.build().unwrap();

        // Retire and drain so the handle goes stale.
        registry.retire(target).unwrap();
        registry.sweep(SlotIndex(0));

        let err = engine
            .submit(&plan, SlotIndex(0), 1, &mut registry)
            .unwrap_err();
        assert!(matches!(err, FrameError::Registry(_)));
        assert!(backend.submitted().is_empty());
    }

    #[test]
    fn write_marks_usage_and_confines_ownership() {
        let backend = Arc::new(NullBackend::new());
        let engine = engine(backend);
        let mut registry = ResourceRegistry::new(8, 2);
        let plan = plan_with_one_pass(&mut registry);

        engine
            .submit(&plan, SlotIndex(1), 3, &mut registry)
            .unwrap();

        let handle = plan.passes[0].accesses[0].handle;
        let resource = registry.resolve(handle).unwrap();
        assert_eq!(resource.usage, UsageState::Write);
        assert_eq!(resource.owning_slot, Some(SlotIndex(1)));
    }

    #[test]
    fn rejected_submission_surfaces_as_submit_error() {
        let backend = Arc::new(NullBackend::new());
        backend.reject_next_submit("out of device memory");
        let engine = engine(backend);
        let mut registry = ResourceRegistry::new(8, 2);
        let plan = plan_with_one_pass(&mut registry);

        let err = engine
            .submit(&plan, SlotIndex(0), 1, &mut registry)
            .unwrap_err();
        assert!(matches!(err, FrameError::Submit(_)));
        assert!(!err.is_recoverable());
    }
}
