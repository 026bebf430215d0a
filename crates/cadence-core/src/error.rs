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

//! Defines the hierarchy of error types for the frame core.
//!
//! Every variant carries enough context (slot index, pass name, resource
//! handle) to reconstruct the failure without re-running the frame.

use crate::handle::{Generation, ResourceHandle, SlotIndex};
use crate::resource::ResourceKind;
use std::fmt;

/// An error produced by the resource registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// The registry's fixed capacity is exhausted. Recoverable: the caller
    /// can reduce concurrent resource demand. Never retried automatically.
    AllocationExhausted {
        /// The kind of resource whose allocation failed.
        kind: ResourceKind,
        /// The registry capacity that was exceeded.
        capacity: usize,
    },
    /// A handle's generation no longer matches the live occupant of its
    /// arena index. This signals a programming error and is always fatal to
    /// the frame that triggered it.
    StaleHandle {
        /// The stale handle that failed to resolve.
        handle: ResourceHandle,
        /// The generation currently stored at the handle's index, if the
        /// index is occupied at all.
        live_generation: Option<Generation>,
    },
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::AllocationExhausted { kind, capacity } => {
                write!(
                    f,
                    "Allocation of {kind} failed: registry capacity of {capacity} exhausted"
                )
            }
            RegistryError::StaleHandle {
                handle,
                live_generation,
            } => match live_generation {
                Some(live) => write!(
                    f,
                    "Stale handle {handle}: index is now occupied by generation {live}"
                ),
                None => write!(f, "Stale handle {handle}: index is vacant"),
            },
        }
    }
}

impl std::error::Error for RegistryError {}

/// An error produced while building the per-frame dependency graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// The declared passes and their access hazards form a cycle. The frame
    /// is abandoned and the declared passes are discarded.
    CyclicDependency {
        /// Names of the passes that could not be ordered.
        passes: Vec<String>,
    },
}

impl fmt::Display for GraphError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphError::CyclicDependency { passes } => {
                write!(f, "Cyclic dependency between passes: {}", passes.join(", "))
            }
        }
    }
}

impl std::error::Error for GraphError {}

/// An error produced by the frame scheduler's slot state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchedulerError {
    /// A slot transition was requested that its state machine does not
    /// permit (e.g. advancing a slot that is not recording).
    InvalidTransition {
        /// The slot whose transition was rejected.
        slot: SlotIndex,
        /// The state the slot was actually in.
        from: &'static str,
        /// The transition that was requested.
        requested: &'static str,
    },
    /// An abort was requested for a frame that has already been submitted.
    /// Submitted frames cannot be canceled.
    AbortAfterSubmit {
        /// The slot whose frame was already submitted.
        slot: SlotIndex,
    },
}

impl fmt::Display for SchedulerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchedulerError::InvalidTransition {
                slot,
                from,
                requested,
            } => {
                write!(
                    f,
                    "Invalid transition for {slot}: cannot {requested} while {from}"
                )
            }
            SchedulerError::AbortAfterSubmit { slot } => {
                write!(f, "Cannot abort {slot}: frame already submitted")
            }
        }
    }
}

impl std::error::Error for SchedulerError {}

/// An error produced during command submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitError {
    /// The underlying device reported an unrecoverable error. Fatal for the
    /// current frame; never retried. The caller decides whether to tear down
    /// and reinitialize the device context.
    SubmissionRejected {
        /// The slot whose submission was rejected.
        slot: SlotIndex,
        /// The pass being issued when the device rejected the submission, if
        /// the failure is attributable to one.
        pass: Option<String>,
        /// Device-reported detail.
        details: String,
    },
}

impl fmt::Display for SubmitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubmitError::SubmissionRejected {
                slot,
                pass,
                details,
            } => match pass {
                Some(pass) => {
                    write!(
                        f,
                        "Submission rejected for {slot} at pass '{pass}': {details}"
                    )
                }
                None => write!(f, "Submission rejected for {slot}: {details}"),
            },
        }
    }
}

impl std::error::Error for SubmitError {}

/// An error produced while presenting a frame's output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PresentError {
    /// The presentation surface is stale (resized, reconfigured, or lost by
    /// the windowing system). Recoverable: the caller recreates the
    /// presentation target and resumes.
    Stale {
        /// The slot whose presentation was skipped.
        slot: SlotIndex,
    },
    /// The device rejected presentation for a reason other than a stale
    /// surface. Fatal for the current frame.
    Rejected {
        /// The slot whose presentation failed.
        slot: SlotIndex,
        /// Device-reported detail.
        details: String,
    },
}

impl fmt::Display for PresentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PresentError::Stale { slot } => {
                write!(f, "Presentation surface stale for {slot}")
            }
            PresentError::Rejected { slot, details } => {
                write!(f, "Presentation rejected for {slot}: {details}")
            }
        }
    }
}

impl std::error::Error for PresentError {}

/// A high-level error covering every failure the frame core can surface.
///
/// Failures local to a single frame's data (stale handle, cycle) never
/// corrupt other slots' state; device-level failures are surfaced upward
/// because no in-process recovery is possible.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameError {
    /// A resource registry operation failed.
    Registry(RegistryError),
    /// Dependency graph construction failed.
    Graph(GraphError),
    /// A scheduler transition was rejected.
    Scheduler(SchedulerError),
    /// Command submission failed.
    Submit(SubmitError),
    /// Presentation failed.
    Present(PresentError),
}

impl FrameError {
    /// Whether the caller can recover within the current session.
    ///
    /// `AllocationExhausted` is recoverable by reducing resource demand and
    /// `PresentStale` by recreating the presentation target. Everything else
    /// is fatal at least to the frame that triggered it.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            FrameError::Registry(RegistryError::AllocationExhausted { .. })
                | FrameError::Present(PresentError::Stale { .. })
        )
    }
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameError::Registry(err) => write!(f, "Registry error: {err}"),
            FrameError::Graph(err) => write!(f, "Graph error: {err}"),
            FrameError::Scheduler(err) => write!(f, "Scheduler error: {err}"),
            FrameError::Submit(err) => write!(f, "Submit error: {err}"),
            FrameError::Present(err) => write!(f, "Present error: {err}"),
        }
    }
}

impl std::error::Error for FrameError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FrameError::Registry(err) => Some(err),
            FrameError::Graph(err) => Some(err),
            FrameError::Scheduler(err) => Some(err),
            FrameError::Submit(err) => Some(err),
            FrameError::Present(err) => Some(err),
        }
    }
}

impl From<RegistryError> for FrameError {
    fn from(err: RegistryError) -> Self {
        FrameError::Registry(err)
    }
}

impl From<GraphError> for FrameError {
    fn from(err: GraphError) -> Self {
        FrameError::Graph(err)
    }
}

impl From<SchedulerError> for FrameError {
    fn from(err: SchedulerError) -> Self {
        FrameError::Scheduler(err)
    }
}

impl From<SubmitError> for FrameError {
    fn from(err: SubmitError) -> Self {
        FrameError::Submit(err)
    }
}

impl From<PresentError> for FrameError {
    fn from(err: PresentError) -> Self {
        FrameError::Present(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn registry_error_display() {
        let err = RegistryError::AllocationExhausted {
            kind: ResourceKind::Buffer { size: 128 },
            capacity: 4,
        };
        assert_eq!(
            format!("{err}"),
            "Allocation of buffer(128 bytes) failed: registry capacity of 4 exhausted"
        );

        let stale = RegistryError::StaleHandle {
            handle: ResourceHandle {
                index: 2,
                generation: 1,
            },
            live_generation: Some(2),
        };
        assert_eq!(
            format!("{stale}"),
            "Stale handle 2@g1: index is now occupied by generation 2"
        );
    }

    #[test]
    fn cyclic_dependency_names_passes() {
        let err = GraphError::CyclicDependency {
            passes: vec!["shadow".to_string(), "lighting".to_string()],
        };
        assert_eq!(
            format!("{err}"),
            "Cyclic dependency between passes: shadow, lighting"
        );
    }

    #[test]
    fn frame_error_wraps_with_source() {
        let err: FrameError = SubmitError::SubmissionRejected {
            slot: SlotIndex(1),
            pass: Some("lighting".to_string()),
            details: "device lost".to_string(),
        }
        .into();
        assert_eq!(
            format!("{err}"),
            "Submit error: Submission rejected for slot1 at pass 'lighting': device lost"
        );
        assert!(err.source().is_some());
    }

    #[test]
    fn recoverability_matches_taxonomy() {
        let exhausted: FrameError = RegistryError::AllocationExhausted {
            kind: ResourceKind::SyncPrimitive,
            capacity: 8,
        }
        .into();
        let stale_surface: FrameError = PresentError::Stale {
            slot: SlotIndex(0),
        }
        .into();
        let stale_handle: FrameError = RegistryError::StaleHandle {
            handle: ResourceHandle {
                index: 0,
                generation: 1,
            },
            live_generation: None,
        }
        .into();
        let cycle: FrameError = GraphError::CyclicDependency { passes: vec![] }.into();

        assert!(exhausted.is_recoverable());
        assert!(stale_surface.is_recoverable());
        assert!(!stale_handle.is_recoverable());
        assert!(!cycle.is_recoverable());
    }
}
