use fukurow_el::*;
use fukurow_owl::model::{vocabulary, ClassExpression as C};
use std::collections::BTreeSet;
use std::sync::Arc;

fn iri(name: &str) -> OwlIri {
    OwlIri::new(name)
}

fn iris(names: &[&str]) -> BTreeSet<OwlIri> {
    names.iter().map(|name| iri(name)).collect()
}

fn diamond() -> Reasoner {
    let ontology = Ontology::from_axioms(vec![
        Axiom::sub_class_of(C::named("A"), C::named("B")),
        Axiom::sub_class_of(C::named("A"), C::named("C")),
        Axiom::sub_class_of(C::named("B"), C::named("D")),
        Axiom::sub_class_of(C::named("C"), C::named("D")),
        // redundant edge, must not survive the reduction
        Axiom::sub_class_of(C::named("A"), C::named("D")),
        Axiom::EquivalentClasses(vec![C::named("D"), C::named("E")]),
    ]);
    Reasoner::new(ontology, ReasonerConfig::default()).unwrap()
}

#[test]
fn test_direct_super_classes_are_reduced() {
    let mut reasoner = diamond();
    assert_eq!(reasoner.super_classes(&iri("A"), true).unwrap(), iris(&["B", "C"]));
    assert_eq!(
        reasoner.super_classes(&iri("A"), false).unwrap(),
        iris(&["B", "C", "D", "E", vocabulary::OWL_THING])
    );
    assert_eq!(reasoner.super_classes(&iri("D"), true).unwrap(), iris(&[vocabulary::OWL_THING]));
}

#[test]
fn test_direct_sub_classes() {
    let mut reasoner = diamond();
    assert_eq!(reasoner.sub_classes(&iri("D"), true).unwrap(), iris(&["B", "C"]));

    let all = reasoner.sub_classes(&iri("E"), false).unwrap();
    assert!(all.is_superset(&iris(&["A", "B", "C"])));
    assert!(all.contains(&iri(vocabulary::OWL_NOTHING)));
    assert!(!all.contains(&iri("D")));

    // A is a leaf: only the bottom node lies below it
    assert_eq!(reasoner.sub_classes(&iri("A"), true).unwrap(), iris(&[vocabulary::OWL_NOTHING]));
}

#[test]
fn test_equivalent_named_classes_share_a_node() {
    let mut reasoner = diamond();
    let taxonomy = reasoner.classify().unwrap();
    let d = taxonomy.node_for_iri(&iri("D")).unwrap();
    let e = taxonomy.node_for_iri(&iri("E")).unwrap();
    assert_eq!(d.id(), e.id());
    assert_eq!(d.named_members(), &[iri("D"), iri("E")]);
    assert!(taxonomy.nodes().iter().all(|node| !node.is_anonymous()));

    assert!(reasoner.is_subsumed_by(&iri("A"), &iri("E")).unwrap());
    assert!(!reasoner.is_subsumed_by(&iri("B"), &iri("C")).unwrap());
}

#[test]
fn test_unknown_class_is_reported() {
    let mut reasoner = diamond();
    assert!(matches!(
        reasoner.super_classes(&iri("Missing"), true),
        Err(ElError::UnknownEntity(_))
    ));
}

#[test]
fn test_query_nodes_are_anonymous() {
    let ontology = Ontology::from_axioms(vec![
        Axiom::sub_class_of(C::named("A"), C::named("B")),
        Axiom::sub_class_of(C::named("A"), C::named("C")),
    ]);
    let query = C::and(vec![C::named("B"), C::named("C")]);
    let index = Arc::new(IndexedOntology::build_with_queries(&ontology, std::slice::from_ref(&query)).unwrap());

    let mut roots = vec![index.top(), index.bottom()];
    roots.extend(index.named_classes().iter().copied());
    roots.extend(index.queries().iter().copied());
    let result = Saturation::new(Arc::clone(&index), Arc::new(IntervalChecker), SaturationConfig::default())
        .saturate(&roots, &CancellationToken::new())
        .unwrap();
    let taxonomy = Taxonomy::build(&result.state).unwrap();

    let query_id = index.find_expression(&query).unwrap();
    let node = taxonomy.node_of(query_id).unwrap();
    assert_eq!(node.kind(), NodeKind::Anonymous);
    assert!(node.named_members().is_empty());

    // B ⊓ C sits between A and its conjuncts
    let a = taxonomy.node_for_iri(&iri("A")).unwrap();
    assert_eq!(a.direct_super_nodes(), &BTreeSet::from([node.id()]));
    let b = taxonomy.node_for_iri(&iri("B")).unwrap();
    let c = taxonomy.node_for_iri(&iri("C")).unwrap();
    assert_eq!(node.direct_super_nodes(), &BTreeSet::from([b.id(), c.id()]));
}

#[test]
fn test_equivalent_classes_of_expression() {
    let ontology = Ontology::from_axioms(vec![
        Axiom::EquivalentClasses(vec![C::named("Q"), C::some("R", C::named("C"))]),
        Axiom::sub_class_of(C::named("B"), C::named("C")),
    ]);
    let mut reasoner = Reasoner::new(ontology, ReasonerConfig::default()).unwrap();

    let equivalents = reasoner.equivalent_classes(&C::some("R", C::named("C"))).unwrap();
    assert_eq!(equivalents, vec![iri("Q")]);

    // an expression with no named equivalent has no IRIs to report
    let equivalents = reasoner.equivalent_classes(&C::some("R", C::named("B"))).unwrap();
    assert!(equivalents.is_empty());

    // the cached classification has no query nodes
    let taxonomy = reasoner.classify().unwrap();
    assert!(taxonomy.nodes().iter().all(|node| !node.is_anonymous()));
}

#[test]
fn test_unsatisfiable_classes_join_bottom() {
    let ontology = Ontology::from_axioms(vec![
        Axiom::DisjointClasses(vec![C::named("Cat"), C::named("Dog")]),
        Axiom::sub_class_of(C::named("CatDog"), C::named("Cat")),
        Axiom::sub_class_of(C::named("CatDog"), C::named("Dog")),
    ]);
    let mut reasoner = Reasoner::new(ontology, ReasonerConfig::default()).unwrap();

    assert!(reasoner.is_consistent().unwrap());
    assert!(!reasoner.is_satisfiable(&iri("CatDog")).unwrap());
    assert!(reasoner.is_satisfiable(&iri("Cat")).unwrap());
    // an unsatisfiable class is below everything
    assert!(reasoner.is_subsumed_by(&iri("CatDog"), &iri("Dog")).unwrap());

    let taxonomy = reasoner.classify().unwrap();
    let bottom = taxonomy.bottom_node();
    assert_eq!(bottom.named_members(), &[iri("CatDog"), iri(vocabulary::OWL_NOTHING)]);
    assert!(bottom.direct_super_nodes().contains(&taxonomy.node_for_iri(&iri("Cat")).unwrap().id()));
}

#[test]
fn test_inconsistent_ontology_collapses() {
    let ontology = Ontology::from_axioms(vec![
        Axiom::sub_class_of(C::Thing, C::named("Person")),
        Axiom::sub_class_of(C::named("Person"), C::Nothing),
        Axiom::sub_class_of(C::named("Robot"), C::named("Machine")),
    ]);
    let mut reasoner = Reasoner::new(ontology, ReasonerConfig::default()).unwrap();

    assert!(!reasoner.is_consistent().unwrap());
    assert!(!reasoner.is_satisfiable(&iri("Robot")).unwrap());
    assert!(reasoner.is_subsumed_by(&iri("Machine"), &iri("Robot")).unwrap());
    assert_eq!(reasoner.classify().unwrap().len(), 1);
}
