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

//! Per-frame dependency graph construction.
//!
//! Passes are declared as data and the graph is built once, fully, before
//! any execution. Within a frame a resource's content is defined by its
//! writer, so a reader depends on the resource's writer wherever it was
//! declared; read-after-write, write-after-read, and write-after-write
//! hazards each produce an edge. Ties among independent passes break by
//! declaration order, so identical declaration sequences always produce
//! identical plans.

use cadence_core::error::GraphError;
use cadence_core::graph::topological_sort_stable;
use cadence_core::handle::ResourceHandle;
use cadence_core::pass::{AccessKind, Barrier, BarrierKind, ResourceAccess, WorkToken};
use std::collections::HashMap;
use std::fmt;

/// Identifies a pass within the frame it was declared in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PassId(pub usize);

impl fmt::Display for PassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pass{}", self.0)
    }
}

#[derive(Debug, Clone)]
struct DeclaredPass {
    name: String,
    accesses: Vec<ResourceAccess>,
    work: WorkToken,
}

/// A pass in its execution position, carrying the barriers that must take
/// effect before it runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledPass {
    /// The declaration-time id of the pass.
    pub id: PassId,
    /// The pass name, used for telemetry tags and error context.
    pub name: String,
    /// The opaque work payload.
    pub work: WorkToken,
    /// The declared accesses, unchanged.
    pub accesses: Vec<ResourceAccess>,
    /// Barriers required before this pass, computed once at build time.
    pub barriers: Vec<Barrier>,
}

/// The ordered output of a graph build for one frame.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FramePlan {
    /// Passes in execution order.
    pub passes: Vec<ScheduledPass>,
}

impl FramePlan {
    /// Total number of barriers across all passes.
    pub fn barrier_count(&self) -> usize {
        self.passes.iter().map(|p| p.barriers.len()).sum()
    }
}

/// Accumulates per-frame pass declarations and derives an execution order
/// with required synchronization points.
///
/// Single-threaded by design: declaration happens from the one producer
/// thread through `&mut self`.
#[derive(Debug, Default)]
pub struct FrameGraphBuilder {
    passes: Vec<DeclaredPass>,
}

impl FrameGraphBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears the prior frame's pass list.
    pub fn begin_frame(&mut self) {
        self.passes.clear();
    }

    /// Declares a pass: a name, its ordered resource accesses, and the
    /// opaque work it will submit. Passes are transient; they are consumed
    /// by [`FrameGraphBuilder::build`] and discarded after submission.
    pub fn declare_pass(
        &mut self,
        name: impl Into<String>,
        accesses: Vec<ResourceAccess>,
        work: WorkToken,
    ) -> PassId {
        let id = PassId(self.passes.len());
        self.passes.push(DeclaredPass {
            name: name.into(),
            accesses,
            work,
        });
        id
    }

    /// Number of passes declared so far this frame.
    pub fn pass_count(&self) -> usize {
        self.passes.len()
    }

    /// Derives the execution order and barrier set for the declared passes.
    ///
    /// ## Errors
    /// * `GraphError::CyclicDependency` - the declarations cannot be
    ///   ordered; the error names the offending passes and no ordering is
    ///   returned.
    pub fn build(&self) -> Result<FramePlan, GraphError> {
        let pass_count = self.passes.len();

        // 1. Collect writers and readers per resource, at pass granularity
        //    and in declaration order.
        let mut writers: HashMap<ResourceHandle, Vec<usize>> = HashMap::new();
        let mut readers: HashMap<ResourceHandle, Vec<usize>> = HashMap::new();
        for (index, pass) in self.passes.iter().enumerate() {
            for access in &pass.accesses {
                let bucket = match access.kind {
                    AccessKind::Write => writers.entry(access.handle).or_default(),
                    AccessKind::Read => readers.entry(access.handle).or_default(),
                };
                if bucket.last() != Some(&index) {
                    bucket.push(index);
                }
            }
        }

        // 2. Derive hazard edges and the barrier each edge demands of its
        //    target pass.
        let mut edges: Vec<(usize, usize)> = Vec::new();
        let mut barriers: HashMap<(usize, ResourceHandle), BarrierKind> = HashMap::new();
        let require = |edges: &mut Vec<(usize, usize)>,
                       barriers: &mut HashMap<(usize, ResourceHandle), BarrierKind>,
                       from: usize,
                       to: usize,
                       resource: ResourceHandle,
                       kind: BarrierKind| {
            if from == to {
                return;
            }
            edges.push((from, to));
            barriers
                .entry((to, resource))
                .and_modify(|existing| {
                    // An execution barrier subsumes a memory barrier.
                    if kind == BarrierKind::Execution {
                        *existing = BarrierKind::Execution;
                    }
                })
                .or_insert(kind);
        };

        for (&resource, resource_writers) in &writers {
            // Write-after-write: successive writers are serialized with a
            // full execution barrier.
            for pair in resource_writers.windows(2) {
                require(
                    &mut edges,
                    &mut barriers,
                    pair[0],
                    pair[1],
                    resource,
                    BarrierKind::Execution,
                );
            }

            let resource_readers = readers.get(&resource).map(Vec::as_slice).unwrap_or(&[]);
            for &reader in resource_readers {
                // Read-after-write: the reader consumes the content produced
                // this frame, so it depends on the last writer declared
                // before it, or on the first writer if every write was
                // declared after the read.
                let producing_write = resource_writers
                    .iter()
                    .copied()
                    .filter(|&w| w < reader)
                    .next_back()
                    .or_else(|| resource_writers.first().copied());
                if let Some(writer) = producing_write {
                    require(
                        &mut edges,
                        &mut barriers,
                        writer,
                        reader,
                        resource,
                        BarrierKind::Memory,
                    );

                    // Write-after-read: a later writer must wait for reads of
                    // the previous content to finish.
                    if writer < reader {
                        if let Some(&overwriter) =
                            resource_writers.iter().find(|&&w| w > reader)
                        {
                            require(
                                &mut edges,
                                &mut barriers,
                                reader,
                                overwriter,
                                resource,
                                BarrierKind::Memory,
                            );
                        }
                    }
                }
            }
        }

        // 3. Order the passes; ties resolve by declaration index.
        let order = topological_sort_stable(pass_count, &edges).map_err(|cycle| {
            GraphError::CyclicDependency {
                passes: cycle
                    .nodes
                    .iter()
                    .map(|&node| self.passes[node].name.clone())
                    .collect(),
            }
        })?;

        // 4. Emit the plan, attaching each barrier to the pass requiring it.
        let mut plan = FramePlan {
            passes: Vec::with_capacity(pass_count),
        };
        for &index in &order {
            let declared = &self.passes[index];
            let mut pass_barriers: Vec<Barrier> = barriers
                .iter()
                .filter(|(key, _)| key.0 == index)
                .map(|(key, &kind)| Barrier {
                    resource: key.1,
                    kind,
                })
                .collect();
            // HashMap iteration order is arbitrary; keep plans reproducible.
            pass_barriers
                .sort_by_key(|barrier| (barrier.resource.index, barrier.resource.generation));
            plan.passes.push(ScheduledPass {
                id: PassId(index),
                name: declared.name.clone(),
                work: declared.work,
                accesses: declared.accesses.clone(),
                barriers: pass_barriers,
            });
        }

        log::debug!(
            "Built frame plan: {} passes, {} barriers",
            plan.passes.len(),
            plan.barrier_count()
        );
        Ok(plan)
    }
}
