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

//! The frame core facade: one frame at a time through
//! acquire -> declare -> build -> submit -> present.
//!
//! Failures local to a frame's data (stale handle, cycle) abort only that
//! frame; other slots' state is untouched.

use crate::graph::{FrameGraphBuilder, PassId};
use crate::registry::ResourceRegistry;
use crate::scheduler::FrameScheduler;
use crate::submission::SubmissionEngine;
use cadence_core::backend::{SubmissionBackend, SubmissionHandle};
use cadence_core::error::{FrameError, SchedulerError};
use cadence_core::handle::SlotIndex;
use cadence_core::pass::{ResourceAccess, WorkToken};
use cadence_core::settings::CoreSettings;
use cadence_core::telemetry::{NullSink, TelemetrySink};
use std::sync::Arc;

#[derive(Debug, Clone, Copy)]
struct ActiveFrame {
    slot: SlotIndex,
    frame_index: u64,
}

/// Owns the frame pipeline's components and drives them in order.
#[derive(Debug)]
pub struct FrameCore {
    registry: ResourceRegistry,
    builder: FrameGraphBuilder,
    scheduler: FrameScheduler,
    engine: SubmissionEngine,
    backend: Arc<dyn SubmissionBackend>,
    active: Option<ActiveFrame>,
}

impl FrameCore {
    /// Builds a core over a device backend and telemetry sink. When
    /// telemetry is disabled in the settings, spans go to a null sink.
    pub fn new(
        settings: CoreSettings,
        backend: Arc<dyn SubmissionBackend>,
        sink: Arc<dyn TelemetrySink>,
    ) -> Self {
        let settings = settings.sanitized();
        let sink: Arc<dyn TelemetrySink> = if settings.enable_telemetry {
            sink
        } else {
            Arc::new(NullSink)
        };
        let info = backend.adapter_info();
        log::info!(
            "Frame core: K={}, registry capacity {}, adapter \"{}\" ({:?}/{:?})",
            settings.frames_in_flight,
            settings.resource_capacity,
            info.name,
            info.backend,
            info.device
        );
        Self {
            registry: ResourceRegistry::new(settings.resource_capacity, settings.frames_in_flight),
            builder: FrameGraphBuilder::new(),
            scheduler: FrameScheduler::new(settings.frames_in_flight, backend.clone()),
            engine: SubmissionEngine::new(backend.clone(), sink),
            backend,
            active: None,
        }
    }

    /// The resource registry, for creating and retiring resources.
    pub fn registry(&mut self) -> &mut ResourceRegistry {
        &mut self.registry
    }

    /// The scheduler, for state inspection.
    pub fn scheduler(&self) -> &FrameScheduler {
        &self.scheduler
    }

    /// Begins a frame: opportunistically reclaims finished slots, acquires
    /// the next slot (blocking if the pipeline is full), and clears the
    /// pass list. Returns the slot recording this frame.
    ///
    /// ## Errors
    /// * `FrameError::Scheduler` - a frame is already being recorded.
    pub fn begin_frame(&mut self) -> Result<SlotIndex, FrameError> {
        if let Some(active) = self.active {
            return Err(SchedulerError::InvalidTransition {
                slot: active.slot,
                from: "recording",
                requested: "begin_frame",
            }
            .into());
        }

        self.scheduler.reclaim_signaled();
        self.drain_reclaimed();

        let (slot, frame_index) = self.scheduler.acquire_slot()?;
        self.drain_reclaimed();
        self.builder.begin_frame();
        self.active = Some(ActiveFrame { slot, frame_index });
        Ok(slot)
    }

    /// Declares a pass for the frame being recorded.
    ///
    /// ## Errors
    /// * `FrameError::Scheduler` - no frame is being recorded.
    pub fn declare_pass(
        &mut self,
        name: impl Into<String>,
        accesses: Vec<ResourceAccess>,
        work: WorkToken,
    ) -> Result<PassId, FrameError> {
        if self.active.is_none() {
            return Err(SchedulerError::InvalidTransition {
                slot: SlotIndex(0),
                from: "idle",
                requested: "declare_pass",
            }
            .into());
        }
        Ok(self.builder.declare_pass(name, accesses, work))
    }

    /// Ends the frame: builds the dependency order, submits it, and
    /// presents.
    ///
    /// On a cycle or a stale handle the frame is abandoned, its passes are
    /// discarded, and the slot returns to idle; other slots are unaffected.
    /// A stale presentation surface is reported as a recoverable error
    /// while the submission itself stands.
    ///
    /// ## Errors
    /// * `FrameError::Scheduler` - no frame is being recorded.
    /// * `FrameError::Graph` - the declared passes form a cycle.
    /// * `FrameError::Registry` / `FrameError::Submit` - see
    ///   [`SubmissionEngine::submit`].
    /// * `FrameError::Present` - presentation failed; recoverable if stale.
    pub fn end_frame(&mut self) -> Result<SubmissionHandle, FrameError> {
        let active = self.active.take().ok_or(SchedulerError::InvalidTransition {
            slot: SlotIndex(0),
            from: "idle",
            requested: "end_frame",
        })?;

        let plan = match self.builder.build() {
            Ok(plan) => plan,
            Err(err) => {
                self.abandon(active.slot);
                return Err(err.into());
            }
        };

        let handle = match self.engine.submit(
            &plan,
            active.slot,
            active.frame_index,
            &mut self.registry,
        ) {
            Ok(handle) => handle,
            Err(err) => {
                self.abandon(active.slot);
                return Err(err);
            }
        };

        self.scheduler.advance(active.slot, handle.token)?;
        self.engine.present(active.slot)?;
        Ok(handle)
    }

    /// Aborts the frame being recorded, discarding its declared passes.
    /// Frames already submitted cannot be canceled.
    ///
    /// ## Errors
    /// * `FrameError::Scheduler` - no frame is being recorded.
    pub fn abort_frame(&mut self) -> Result<(), FrameError> {
        let active = self.active.take().ok_or(SchedulerError::InvalidTransition {
            slot: SlotIndex(0),
            from: "idle",
            requested: "abort_frame",
        })?;
        self.abandon(active.slot);
        Ok(())
    }

    /// Rebuilds the presentation surface after a stale-present report.
    pub fn reconfigure_surface(&self, width: u32, height: u32) {
        self.backend.reconfigure_surface(width, height);
    }

    /// Blocks until all submitted frames complete, then releases retired
    /// resources. Call before teardown.
    pub fn wait_idle(&mut self) {
        self.scheduler.wait_idle();
        self.drain_reclaimed();
    }

    fn abandon(&mut self, slot: SlotIndex) {
        self.builder.begin_frame();
        if let Err(err) = self.scheduler.abort(slot) {
            log::error!("Failed to abandon {slot}: {err}");
        }
    }

    fn drain_reclaimed(&mut self) {
        for slot in self.scheduler.take_reclaimed() {
            self.registry.sweep(slot);
        }
    }
}
