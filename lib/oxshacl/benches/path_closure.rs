//! Benchmarks of property path resolution on chains and cycles.

use codspeed_criterion_compat::{
    BenchmarkId, Criterion, Throughput, criterion_group, criterion_main,
};
use oxrdf::{Graph, NamedNode, Triple};
use oxshacl::PropertyPath;
use std::hint::black_box;

fn node(i: usize) -> NamedNode {
    NamedNode::new(format!("http://example.org/n{i}")).unwrap()
}

fn next() -> NamedNode {
    NamedNode::new("http://example.org/next").unwrap()
}

/// A chain n0 -> n1 -> ... -> n{len}, closed back to n0 if `cyclic`.
fn chain(len: usize, cyclic: bool) -> Graph {
    let mut graph = Graph::new();
    for i in 0..len {
        graph.insert(&Triple::new(node(i), next(), node(i + 1)));
    }
    if cyclic {
        graph.insert(&Triple::new(node(len), next(), node(0)));
    }
    graph
}

fn bench_closure(c: &mut Criterion) {
    let mut group = c.benchmark_group("closure");
    let one_or_more = PropertyPath::one_or_more(PropertyPath::predicate(next()));
    for len in [100, 1_000, 10_000] {
        group.throughput(Throughput::Elements(u64::try_from(len).unwrap()));
        for cyclic in [false, true] {
            let graph = chain(len, cyclic);
            let start = node(0);
            let name = if cyclic { "cycle" } else { "chain" };
            group.bench_with_input(BenchmarkId::new(name, len), &graph, |b, graph| {
                b.iter(|| black_box(one_or_more.resolve(graph, start.as_ref().into())))
            });
        }
    }
    group.finish();
}

fn bench_sequence(c: &mut Criterion) {
    let graph = chain(1_000, true);
    let start = node(0);
    let path = PropertyPath::sequence(vec![
        PropertyPath::zero_or_more(PropertyPath::predicate(next())),
        PropertyPath::inverse(PropertyPath::predicate(next())),
    ]);
    c.bench_function("sequence of closure and inverse", |b| {
        b.iter(|| black_box(path.resolve(&graph, start.as_ref().into())))
    });
}

criterion_group!(paths, bench_closure, bench_sequence);
criterion_main!(paths);
