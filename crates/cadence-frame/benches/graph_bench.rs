use cadence_core::pass::{ResourceAccess, WorkToken};
use cadence_core::resource::ResourceKind;
use cadence_frame::{FrameGraphBuilder, ResourceRegistry};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

/// Declares a layered frame: `layers` chains of passes, each pass reading
/// the previous layer's target and writing its own.
fn declare_layers(builder: &mut FrameGraphBuilder, registry: &mut ResourceRegistry, layers: usize) {
    let mut previous = None;
    for layer in 0..layers {
        let target = registry
            .create(ResourceKind::Image {
                width: 64,
                height: 64,
            })
            .expect("bench registry capacity");
        let mut accesses = vec![ResourceAccess::write(target)];
        if let Some(previous) = previous {
            accesses.push(ResourceAccess::read(previous));
        }
        builder.declare_pass(format!("layer-{layer}"), accesses, WorkToken(layer as u64));
        previous = Some(target);
    }
}

fn bench_graph_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("Frame graph build");

    for &layers in &[8usize, 64, 256] {
        let mut registry = ResourceRegistry::new(layers + 1, 2);
        let mut builder = FrameGraphBuilder::new();
        declare_layers(&mut builder, &mut registry, layers);

        group.bench_function(format!("{layers} chained passes"), |b| {
            b.iter(|| {
                let plan = builder.build().expect("acyclic");
                black_box(plan.passes.len());
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_graph_build);
criterion_main!(benches);
