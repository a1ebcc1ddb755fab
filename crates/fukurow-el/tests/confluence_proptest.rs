//! Saturation must reach the same closure regardless of worker count.

use fukurow_el::*;
use fukurow_owl::model::ClassExpression as C;
use proptest::prelude::*;
use std::collections::BTreeSet;
use std::sync::Arc;

const CLASSES: usize = 6;
const PROPERTIES: [&str; 2] = ["r", "s"];

fn class(i: usize) -> C {
    C::named(format!("C{}", i % CLASSES))
}

fn axiom() -> impl Strategy<Value = Axiom> {
    let class_index = 0..CLASSES;
    let property = prop::sample::select(PROPERTIES.to_vec());
    prop_oneof![
        4 => (class_index.clone(), class_index.clone())
            .prop_map(|(a, b)| Axiom::sub_class_of(class(a), class(b))),
        3 => (class_index.clone(), property.clone(), class_index.clone())
            .prop_map(|(a, r, b)| Axiom::sub_class_of(class(a), C::some(r, class(b)))),
        3 => (property.clone(), class_index.clone(), class_index.clone())
            .prop_map(|(r, a, b)| Axiom::sub_class_of(C::some(r, class(a)), class(b))),
        2 => (class_index.clone(), class_index.clone(), class_index.clone())
            .prop_map(|(a, b, c)| Axiom::sub_class_of(C::and(vec![class(a), class(b)]), class(c))),
        1 => (class_index.clone(), 1..CLASSES)
            .prop_map(|(a, offset)| Axiom::DisjointClasses(vec![class(a), class(a + offset)])),
        1 => (property.clone(), property.clone())
            .prop_map(|(r, s)| Axiom::sub_property_of(r, s)),
        1 => property.clone().prop_map(|r| Axiom::TransitiveObjectProperty(OwlIri::new(r))),
        1 => (property.clone(), property.clone(), property)
            .prop_map(|(r, s, t)| Axiom::SubObjectPropertyOf {
                chain: vec![OwlIri::new(r), OwlIri::new(s)],
                sup: OwlIri::new(t),
            }),
    ]
}

fn closure(index: &Arc<IndexedOntology>, workers: usize) -> Vec<(ConceptId, bool, BTreeSet<ConceptId>)> {
    let mut roots = vec![index.top(), index.bottom()];
    roots.extend(index.named_classes().iter().copied());
    let result = Saturation::new(
        Arc::clone(index),
        Arc::new(IntervalChecker),
        SaturationConfig::default().with_workers(workers),
    )
    .saturate(&roots, &CancellationToken::new())
    .unwrap();
    assert_eq!(result.outcome, SaturationOutcome::Completed);

    let state = &result.state;
    index
        .named_classes()
        .iter()
        .map(|&class| {
            let consistent = state.is_consistent(class).unwrap();
            let subsumers = if consistent {
                state.subsumers(class).unwrap().clone()
            } else {
                BTreeSet::new()
            };
            (class, consistent, subsumers)
        })
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn prop_worker_count_does_not_change_closure(axioms in prop::collection::vec(axiom(), 1..24)) {
        let index = Arc::new(IndexedOntology::build(&Ontology::from_axioms(axioms)).unwrap());
        let sequential = closure(&index, 1);
        let parallel = closure(&index, 4);
        prop_assert_eq!(sequential, parallel);
    }

    #[test]
    fn prop_every_class_subsumes_itself(axioms in prop::collection::vec(axiom(), 1..16)) {
        let index = Arc::new(IndexedOntology::build(&Ontology::from_axioms(axioms)).unwrap());
        for (class, consistent, subsumers) in closure(&index, 2) {
            if consistent {
                prop_assert!(subsumers.contains(&class));
            }
        }
    }
}
