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

//! # Cadence Frame
//!
//! The frame core's hot path: the resource registry, the per-frame
//! dependency graph builder, the frames-in-flight scheduler, and the
//! command submission engine. Everything here runs against the
//! [`cadence_core::backend::SubmissionBackend`] seam and is exercisable
//! without a live GPU through [`null_backend::NullBackend`].

pub mod core;
pub mod graph;
pub mod null_backend;
pub mod registry;
pub mod scheduler;
pub mod submission;

pub use crate::core::FrameCore;
pub use graph::{FrameGraphBuilder, FramePlan, PassId, ScheduledPass};
pub use null_backend::NullBackend;
pub use registry::ResourceRegistry;
pub use scheduler::{FrameScheduler, SlotState};
pub use submission::SubmissionEngine;
