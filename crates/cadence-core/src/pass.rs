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

//! Pass declarations: resource accesses, opaque work payloads, and the
//! barriers derived from access hazards.
//!
//! Passes are declared as data. The dependency graph is built once, fully,
//! from these declarations before any execution, so ordering never depends
//! on call sequence.

use crate::handle::ResourceHandle;

/// Whether a pass reads or writes a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessKind {
    /// The pass reads the resource.
    Read,
    /// The pass writes the resource.
    Write,
}

/// A single declared access of a resource by a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceAccess {
    /// The resource being accessed.
    pub handle: ResourceHandle,
    /// Read or write intent.
    pub kind: AccessKind,
}

impl ResourceAccess {
    /// Declares a read access.
    pub fn read(handle: ResourceHandle) -> Self {
        Self {
            handle,
            kind: AccessKind::Read,
        }
    }

    /// Declares a write access.
    pub fn write(handle: ResourceHandle) -> Self {
        Self {
            handle,
            kind: AccessKind::Write,
        }
    }
}

/// An opaque description of the work a pass submits.
///
/// The scheduler and graph builder never interpret the token; only the
/// submission backend gives it meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WorkToken(pub u64);

/// The minimal synchronization scope an edge requires, computed once per
/// graph build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BarrierKind {
    /// A memory/visibility barrier: a write must become visible to a
    /// subsequent read, or a read must finish before a subsequent write.
    Memory,
    /// A full execution barrier: two writes to the same resource must not
    /// overlap, and no finer primitive applies.
    Execution,
}

/// A synchronization directive inserted before the pass that requires it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Barrier {
    /// The resource whose hazard this barrier covers.
    pub resource: ResourceHandle,
    /// The minimal scope needed for the hazard.
    pub kind: BarrierKind,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handle(index: u32) -> ResourceHandle {
        ResourceHandle {
            index,
            generation: 1,
        }
    }

    #[test]
    fn access_constructors_set_kind() {
        assert_eq!(ResourceAccess::read(handle(0)).kind, AccessKind::Read);
        assert_eq!(ResourceAccess::write(handle(0)).kind, AccessKind::Write);
    }
}
