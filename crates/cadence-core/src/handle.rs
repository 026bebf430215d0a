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

//! Generation-tagged handles used to reference registry-owned resources.

use std::fmt;

/// A monotonically increasing tag distinguishing successive occupants of the
/// same arena index.
pub type Generation = u32;

/// A non-owning reference to a resource owned by the registry.
///
/// A handle is an arena index paired with the generation the index carried
/// when the resource was created. Resolving a handle whose generation no
/// longer matches the live occupant fails instead of aliasing the new
/// occupant, which is the sole defense against use-after-retire bugs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResourceHandle {
    /// Index into the registry's arena.
    pub index: u32,
    /// Generation of the arena entry at creation time.
    pub generation: Generation,
}

impl fmt::Display for ResourceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@g{}", self.index, self.generation)
    }
}

/// Identifies one of the K rotating frame slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotIndex(pub usize);

impl fmt::Display for SlotIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "slot{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handle_display_includes_generation() {
        let handle = ResourceHandle {
            index: 7,
            generation: 3,
        };
        assert_eq!(format!("{handle}"), "7@g3");
    }

    #[test]
    fn handles_differing_only_in_generation_are_distinct() {
        let old = ResourceHandle {
            index: 1,
            generation: 1,
        };
        let reused = ResourceHandle {
            index: 1,
            generation: 2,
        };
        assert_ne!(old, reused);
    }
}
