use criterion::{black_box, criterion_group, criterion_main, Criterion};
use fukurow_el::{
    Axiom, CancellationToken, ClassExpression as C, IndexedOntology, IntervalChecker, Ontology, OwlIri, Reasoner,
    ReasonerConfig, Saturation, SaturationConfig,
};
use std::sync::Arc;

fn create_test_ontology(size: usize) -> Ontology {
    let mut axioms = Vec::new();

    // Class hierarchy with existential edges: Class{i} ⊑ Class{i-1} ⊓ ∃partOf.Part{i}
    for i in 0..size {
        let class = format!("http://example.org/Class{}", i);
        let part = format!("http://example.org/Part{}", i);
        if i > 0 {
            axioms.push(Axiom::sub_class_of(
                C::named(class.clone()),
                C::named(format!("http://example.org/Class{}", i - 1)),
            ));
        }
        axioms.push(Axiom::sub_class_of(
            C::named(class.clone()),
            C::some("http://example.org/partOf", C::named(part.clone())),
        ));
        if i % 3 == 0 {
            axioms.push(Axiom::sub_class_of(
                C::some("http://example.org/partOf", C::named(part)),
                C::named(format!("http://example.org/Whole{}", i)),
            ));
        }
    }
    axioms.push(Axiom::TransitiveObjectProperty(OwlIri::new("http://example.org/partOf")));

    Ontology::from_axioms(axioms)
}

fn benchmark_saturation(c: &mut Criterion) {
    let sizes = vec![10, 100, 500];

    for size in sizes {
        let index = Arc::new(IndexedOntology::build(&create_test_ontology(size)).unwrap());
        let mut roots = vec![index.top(), index.bottom()];
        roots.extend(index.named_classes().iter().copied());

        for workers in [1, 4] {
            let saturation = Saturation::new(
                Arc::clone(&index),
                Arc::new(IntervalChecker),
                SaturationConfig::default().with_workers(workers),
            );
            c.bench_function(&format!("el_saturation_{}_classes_{}_workers", size, workers), |b| {
                b.iter(|| {
                    let _result = saturation
                        .saturate(black_box(&roots), &CancellationToken::new())
                        .unwrap();
                });
            });
        }
    }
}

fn benchmark_classification(c: &mut Criterion) {
    let sizes = vec![10, 100, 500];

    for size in sizes {
        let ontology = create_test_ontology(size);
        c.bench_function(&format!("el_classification_{}_classes", size), |b| {
            b.iter(|| {
                let mut reasoner = Reasoner::new(black_box(ontology.clone()), ReasonerConfig::default()).unwrap();
                let _taxonomy = reasoner.classify().unwrap();
            });
        });
    }
}

criterion_group!(benches, benchmark_saturation, benchmark_classification);
criterion_main!(benches);
