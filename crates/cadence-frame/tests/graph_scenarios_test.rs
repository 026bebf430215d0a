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

//! Integration tests for dependency graph ordering and barrier placement.
//!
//! These exercise the declare -> build contract against registry-issued
//! handles, the way the frame core uses it.

use cadence_core::error::GraphError;
use cadence_core::pass::{Barrier, BarrierKind, ResourceAccess, WorkToken};
use cadence_core::resource::ResourceKind;
use cadence_frame::{FrameGraphBuilder, ResourceRegistry};

fn image(registry: &mut ResourceRegistry) -> cadence_core::ResourceHandle {
    registry
        .create(ResourceKind::Image {
            width: 256,
            height: 256,
        })
        .expect("registry has capacity")
}

// ─────────────────────────────────────────────────────────────────────────────
// Ordering scenarios
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_shadow_lighting_present_scenario() {
    let mut registry = ResourceRegistry::new(8, 2);
    let depth = image(&mut registry);
    let color = image(&mut registry);

    let mut builder = FrameGraphBuilder::new();
    builder.declare_pass("Shadow", vec![ResourceAccess::write(depth)], WorkToken(0));
    builder.declare_pass(
        "Lighting",
        vec![ResourceAccess::read(depth), ResourceAccess::write(color)],
        WorkToken(1),
    );
    builder.declare_pass("Present", vec![ResourceAccess::read(color)], WorkToken(2));

    let plan = builder.build().expect("acyclic declarations");

    let names: Vec<&str> = plan.passes.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["Shadow", "Lighting", "Present"]);

    // Depth write -> read demands a barrier before Lighting.
    assert_eq!(
        plan.passes[1].barriers,
        vec![Barrier {
            resource: depth,
            kind: BarrierKind::Memory,
        }]
    );
    // Color write -> read demands a barrier before Present.
    assert_eq!(
        plan.passes[2].barriers,
        vec![Barrier {
            resource: color,
            kind: BarrierKind::Memory,
        }]
    );
    // Shadow has no dependencies and needs no barrier.
    assert!(plan.passes[0].barriers.is_empty());
}

#[test]
fn test_rebuilding_identical_declarations_is_deterministic() {
    let mut registry = ResourceRegistry::new(8, 2);
    let depth = image(&mut registry);
    let color = image(&mut registry);

    let declare = |builder: &mut FrameGraphBuilder| {
        builder.declare_pass("Shadow", vec![ResourceAccess::write(depth)], WorkToken(0));
        builder.declare_pass(
            "Lighting",
            vec![ResourceAccess::read(depth), ResourceAccess::write(color)],
            WorkToken(1),
        );
        builder.declare_pass("Present", vec![ResourceAccess::read(color)], WorkToken(2));
        builder.declare_pass("Debug", vec![ResourceAccess::read(depth)], WorkToken(3));
    };

    let mut first = FrameGraphBuilder::new();
    declare(&mut first);
    let mut second = FrameGraphBuilder::new();
    declare(&mut second);

    for _ in 0..8 {
        assert_eq!(
            first.build().expect("acyclic"),
            second.build().expect("acyclic"),
            "identical declaration sequences must yield identical orders"
        );
    }
}

#[test]
fn test_independent_passes_resolve_ties_by_declaration_order() {
    let mut registry = ResourceRegistry::new(8, 2);
    let a = image(&mut registry);
    let b = image(&mut registry);

    let mut builder = FrameGraphBuilder::new();
    builder.declare_pass("ui", vec![ResourceAccess::write(a)], WorkToken(0));
    builder.declare_pass("particles", vec![ResourceAccess::write(b)], WorkToken(1));

    let plan = builder.build().expect("acyclic");
    let names: Vec<&str> = plan.passes.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["ui", "particles"]);
}

// ─────────────────────────────────────────────────────────────────────────────
// Cycle detection
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_mutual_producers_fail_with_named_cycle() {
    // Pass A writes R then reads S; pass B writes S then reads R. Each
    // consumes the other's output, which cannot be ordered.
    let mut registry = ResourceRegistry::new(8, 2);
    let r = image(&mut registry);
    let s = image(&mut registry);

    let mut builder = FrameGraphBuilder::new();
    builder.declare_pass(
        "A",
        vec![ResourceAccess::write(r), ResourceAccess::read(s)],
        WorkToken(0),
    );
    builder.declare_pass(
        "B",
        vec![ResourceAccess::write(s), ResourceAccess::read(r)],
        WorkToken(1),
    );

    let GraphError::CyclicDependency { passes } = builder.build().unwrap_err();
    assert_eq!(passes, vec!["A".to_string(), "B".to_string()]);
}

#[test]
fn test_cycle_leaves_no_plan_and_builder_recovers_next_frame() {
    let mut registry = ResourceRegistry::new(8, 2);
    let r = image(&mut registry);
    let s = image(&mut registry);

    let mut builder = FrameGraphBuilder::new();
    builder.declare_pass(
        "A",
        vec![ResourceAccess::write(r), ResourceAccess::read(s)],
        WorkToken(0),
    );
    builder.declare_pass(
        "B",
        vec![ResourceAccess::write(s), ResourceAccess::read(r)],
        WorkToken(1),
    );
    assert!(builder.build().is_err());

    // The next frame starts clean and orders fine.
    builder.begin_frame();
    builder.declare_pass("A", vec![ResourceAccess::write(r)], WorkToken(0));
    builder.declare_pass("B", vec![ResourceAccess::read(r)], WorkToken(1));
    let plan = builder.build().expect("acyclic after reset");
    assert_eq!(plan.passes.len(), 2);
}
