use criterion::{black_box, criterion_group, criterion_main, Criterion};

use annodiff::*;

fn interval_lists(size: usize) -> (Vec<Offset>, Vec<Offset>) {
    //two interleaved lists with plenty of overlap, the worst case for the sweep
    let a: Vec<Offset> = (0..size).map(|i| Offset::new(i * 3, i * 3 + 5)).collect();
    let b: Vec<Offset> = (0..size).map(|i| Offset::new(i * 4 + 1, i * 4 + 7)).collect();
    (a, b)
}

fn example_graph(entities: usize) -> (FeatureGraph, Vec<NodeHandle>) {
    let schema = TypeSchema::new(Config::default())
        .with_type(TypeDef::new("Token"))
        .unwrap()
        .with_type(TypeDef::new("Morph").with_feature("lemma", FeatureRange::Str))
        .unwrap()
        .with_type(
            TypeDef::new("NamedEntity")
                .with_feature("value", FeatureRange::Str)
                .with_feature("morph", FeatureRange::Reference("Morph".to_string())),
        )
        .unwrap();
    let mut graph = FeatureGraph::new(schema, Config::default());
    let mut handles = Vec::with_capacity(entities);
    for i in 0..entities {
        let morph = graph
            .annotate(
                FeatureNodeBuilder::new("Morph")
                    .with_span(Offset::new(i * 10, i * 10 + 4))
                    .with_value("lemma", format!("lemma{}", i)),
            )
            .unwrap();
        let entity = graph
            .annotate(
                FeatureNodeBuilder::new("NamedEntity")
                    .with_span(Offset::new(i * 10, i * 10 + 4))
                    .with_value("value", "PER")
                    .with_value("morph", morph),
            )
            .unwrap();
        handles.push(entity);
    }
    (graph, handles)
}

pub fn bench_overlap(c: &mut Criterion) {
    let (a, b) = interval_lists(1000);

    c.bench_function("overlap_sweep_1000", |bencher| {
        bencher.iter(|| {
            let mut iter = OverlapIterator::new(black_box(&a), black_box(&b));
            let mut overlapping = 0;
            while iter.has_next() {
                if iter.a().overlaps(iter.b()) {
                    overlapping += 1;
                }
                iter.step();
            }
            assert!(overlapping > 0);
        })
    });
}

pub fn bench_signatures(c: &mut Criterion) {
    let (graph, handles) = example_graph(500);

    c.bench_function("position_signatures_500", |bencher| {
        bencher.iter(|| {
            let mut total_len = 0;
            for handle in black_box(&handles) {
                let signature = graph.position_signature(*handle, None).unwrap();
                total_len += signature.as_str().len();
            }
            assert!(total_len > 0);
        })
    });
}

pub fn bench_pairwise(c: &mut Criterion) {
    let mut study = AgreementStudy::default();
    for annotator in ["alice", "bob", "carol", "dave"] {
        for i in 0..500usize {
            //vary the labels a little so the tables are not trivial
            let label = if (i + annotator.len()) % 7 == 0 {
                "ORG"
            } else {
                "PER"
            };
            study.record(
                annotator,
                PositionKey::new("doc1", format!("NamedEntity {}-{}", i * 10, i * 10 + 4)),
                label,
            );
        }
    }

    c.bench_function("pairwise_kappa_4x500", |bencher| {
        bencher.iter(|| {
            let matrix = black_box(&study).pairwise();
            assert_eq!(matrix.len(), 4);
        })
    });
}

criterion_group!(benches, bench_overlap, bench_signatures, bench_pairwise);
criterion_main!(benches);
