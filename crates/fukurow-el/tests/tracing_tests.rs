use fukurow_el::*;
use fukurow_owl::model::ClassExpression as C;
use std::collections::BTreeMap;

/// Counts how often each conclusion and inference is reported
#[derive(Default)]
struct CountingVisitor {
    conclusions: BTreeMap<Conclusion, usize>,
    inferences: BTreeMap<Inference, usize>,
}

impl ConclusionVisitor for CountingVisitor {
    fn visit_conclusion(&mut self, conclusion: &Conclusion) {
        *self.conclusions.entry(*conclusion).or_default() += 1;
    }

    fn visit_inference(&mut self, inference: &Inference) {
        *self.inferences.entry(*inference).or_default() += 1;
    }
}

impl CountingVisitor {
    fn assert_exactly_once(&self) {
        assert!(self.conclusions.values().all(|&n| n == 1));
        assert!(self.inferences.values().all(|&n| n == 1));
    }
}

fn reasoner(axioms: Vec<Axiom>) -> Reasoner {
    let config = ReasonerConfig {
        saturation: SaturationConfig::default().with_workers(2),
        ..ReasonerConfig::default()
    };
    Reasoner::new(Ontology::from_axioms(axioms), config).unwrap()
}

fn id(reasoner: &mut Reasoner, name: &str) -> ConceptId {
    let state = reasoner.saturation_state().unwrap();
    state.index().class_id(&OwlIri::new(name)).unwrap()
}

fn iri(name: &str) -> OwlIri {
    OwlIri::new(name)
}

#[test]
fn test_conjunction_derived_twice_is_reported_once() {
    let mut reasoner = reasoner(vec![
        Axiom::sub_class_of(C::named("A"), C::named("X")),
        Axiom::sub_class_of(C::named("A"), C::named("Y")),
        Axiom::sub_class_of(C::named("X"), C::and(vec![C::named("B"), C::named("C")])),
        Axiom::sub_class_of(C::named("Y"), C::and(vec![C::named("B"), C::named("C")])),
    ]);

    let mut visitor = CountingVisitor::default();
    reasoner
        .explain_subsumption(&iri("A"), &iri("B"), TracingMode::Recursive, &mut visitor)
        .unwrap();
    visitor.assert_exactly_once();

    let state = reasoner.saturation_state().unwrap();
    let conjunction = state
        .index()
        .find_expression(&C::and(vec![C::named("B"), C::named("C")]))
        .unwrap();
    let a = state.index().class_id(&iri("A")).unwrap();

    // the conjunction is reached through two axioms but decomposed once
    let expansions = visitor
        .inferences
        .keys()
        .filter(|i| {
            i.name() == "ExpandedSubClassOf"
                && i.conclusion()
                    == Conclusion::SubsumerDecomposed {
                        root: a,
                        subsumer: conjunction,
                    }
        })
        .count();
    assert_eq!(expansions, 2);
    let first_conjunct = visitor
        .inferences
        .keys()
        .filter(|i| i.name() == "DecomposedFirstConjunct")
        .count();
    assert_eq!(first_conjunct, 1);
}

#[test]
fn test_existential_derived_twice_is_reported_once() {
    let mut reasoner = reasoner(vec![
        Axiom::sub_class_of(C::named("A"), C::named("X")),
        Axiom::sub_class_of(C::named("A"), C::named("Y")),
        Axiom::sub_class_of(C::named("X"), C::some("r", C::named("B"))),
        Axiom::sub_class_of(C::named("Y"), C::some("r", C::named("B"))),
        Axiom::sub_class_of(C::some("r", C::named("B")), C::named("Q")),
    ]);
    let mut visitor = CountingVisitor::default();
    reasoner
        .explain_subsumption(&iri("A"), &iri("Q"), TracingMode::Recursive, &mut visitor)
        .unwrap();
    visitor.assert_exactly_once();
    assert!(visitor.conclusions.keys().any(|c| matches!(c, Conclusion::BackwardLink { .. })));
}

#[test]
fn test_reflexive_existential_terminates() {
    let mut reasoner = reasoner(vec![
        Axiom::sub_class_of(C::named("A"), C::some("r", C::named("A"))),
        Axiom::sub_class_of(C::some("r", C::named("A")), C::named("Loop")),
    ]);
    let mut visitor = CountingVisitor::default();
    let summary = reasoner
        .explain_subsumption(&iri("A"), &iri("Loop"), TracingMode::Recursive, &mut visitor)
        .unwrap();
    visitor.assert_exactly_once();
    assert_eq!(summary.conclusions, visitor.conclusions.len());
    assert_eq!(summary.inferences, visitor.inferences.len());
}

#[test]
fn test_non_recursive_stays_in_root_context() {
    let axioms = vec![
        Axiom::sub_class_of(C::named("A"), C::some("R", C::named("B"))),
        Axiom::sub_class_of(C::named("B"), C::named("C")),
        Axiom::sub_class_of(C::some("R", C::named("C")), C::named("Q")),
    ];
    let mut reasoner = reasoner(axioms);
    let (a, b, c) = (id(&mut reasoner, "A"), id(&mut reasoner, "B"), id(&mut reasoner, "C"));
    let existential = reasoner
        .saturation_state()
        .unwrap()
        .index()
        .find_expression(&C::some("R", C::named("C")))
        .unwrap();
    let root = Conclusion::SubsumerComposed {
        root: a,
        subsumer: existential,
    };

    let mut shallow = CountingVisitor::default();
    reasoner.trace(root, TracingMode::NonRecursive, &mut shallow).unwrap();
    assert!(shallow.conclusions.contains_key(&root));
    assert!(shallow
        .conclusions
        .keys()
        .all(|c| c.destination() == ContextRef::Concept(a)));
    assert!(shallow.inferences.keys().any(|i| i.name() == "ComposedExistential"));
    // every premise of the existential composition lives in context B
    assert_eq!(shallow.conclusions.len(), 1);

    let mut deep = CountingVisitor::default();
    reasoner.trace(root, TracingMode::Recursive, &mut deep).unwrap();
    deep.assert_exactly_once();
    let b_subsumes_c = Conclusion::SubsumerComposed { root: b, subsumer: c };
    assert_eq!(deep.conclusions.get(&b_subsumes_c), Some(&1));
    assert!(deep.conclusions.len() > shallow.conclusions.len());
}

#[test]
fn test_non_recursive_visits_one_level() {
    let mut reasoner = reasoner(vec![
        Axiom::sub_class_of(C::named("A"), C::named("B")),
        Axiom::sub_class_of(C::named("B"), C::named("C")),
        Axiom::sub_class_of(C::named("C"), C::named("D")),
    ]);
    let (a, d) = (id(&mut reasoner, "A"), id(&mut reasoner, "D"));

    let mut shallow = CountingVisitor::default();
    let summary = reasoner
        .explain_subsumption(&iri("A"), &iri("D"), TracingMode::NonRecursive, &mut shallow)
        .unwrap();
    shallow.assert_exactly_once();

    let composed = Conclusion::SubsumerComposed { root: a, subsumer: d };
    let decomposed = Conclusion::SubsumerDecomposed { root: a, subsumer: d };
    assert_eq!(shallow.conclusions.len(), 2);
    assert!(shallow.conclusions.contains_key(&composed));
    assert!(shallow.conclusions.contains_key(&decomposed));
    let names: Vec<&str> = shallow.inferences.keys().map(|i| i.name()).collect();
    assert_eq!(names, vec!["ComposedOfDecomposed"]);
    assert_eq!(summary.conclusions, 2);
    assert_eq!(summary.inferences, 1);

    let mut deep = CountingVisitor::default();
    reasoner
        .explain_subsumption(&iri("A"), &iri("D"), TracingMode::Recursive, &mut deep)
        .unwrap();
    assert!(deep.inferences.keys().any(|i| i.name() == "Initialization"));
}

#[test]
fn test_no_tracing_and_unsatisfiable_subsumption() {
    let mut reasoner = reasoner(vec![
        Axiom::DisjointClasses(vec![C::named("B"), C::named("C")]),
        Axiom::sub_class_of(C::named("A"), C::named("B")),
        Axiom::sub_class_of(C::named("A"), C::named("C")),
    ]);

    let mut none = CountingVisitor::default();
    reasoner
        .explain_subsumption(&iri("A"), &iri("B"), TracingMode::NoTracing, &mut none)
        .unwrap();
    assert!(none.conclusions.is_empty());

    // A is unsatisfiable, so any subsumption is explained by its contradiction
    let graph = reasoner.subsumption_proof_with(&iri("A"), &iri("Z"), TracingMode::Recursive);
    assert!(matches!(graph, Err(ElError::UnknownEntity(_))));

    let graph = reasoner
        .subsumption_proof_with(&iri("A"), &iri("B"), TracingMode::Recursive)
        .unwrap();
    assert!(matches!(graph.root(), Conclusion::Contradiction { .. }));
    assert!(graph
        .conclusions()
        .iter()
        .any(|c| matches!(c, Conclusion::DisjointSubsumer { .. })));
}

#[test]
fn test_proof_tree_and_cited_axioms() {
    let mut reasoner = reasoner(vec![
        Axiom::sub_class_of(C::named("A"), C::named("B")),
        Axiom::sub_class_of(C::named("B"), C::named("C")),
        Axiom::sub_class_of(C::named("Unrelated"), C::named("C")),
    ]);
    let graph = reasoner.subsumption_proof(&iri("A"), &iri("C")).unwrap();
    let state = reasoner.saturation_state().unwrap();

    let axioms = graph.axioms(state.index()).unwrap();
    assert_eq!(axioms.len(), 2);
    assert!(!axioms.contains(&AxiomId(2)));

    let tree = print_proof_tree(&graph, state.index()).unwrap();
    assert!(tree.starts_with("A ⊑ C"));
    assert!(tree.contains("ExpandedSubClassOf"));
    assert!(tree.contains("Initialization"));
    assert!(!tree.contains("Unrelated"));
}

#[test]
fn test_tracing_is_read_only() {
    let mut reasoner = reasoner(vec![
        Axiom::sub_class_of(C::named("A"), C::some("r", C::named("B"))),
        Axiom::sub_class_of(C::some("r", C::named("B")), C::named("Q")),
    ]);
    let state = reasoner.saturation_state().unwrap();
    let before: Vec<usize> = state.contexts().map(Context::conclusion_count).collect();

    let mut visitor = CountingVisitor::default();
    reasoner
        .explain_subsumption(&iri("A"), &iri("Q"), TracingMode::Recursive, &mut visitor)
        .unwrap();

    let after: Vec<usize> = state.contexts().map(Context::conclusion_count).collect();
    assert_eq!(before, after);
}
