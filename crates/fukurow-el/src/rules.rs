//! 推論規則
//!
//! Every rule reads one origin context plus the read-only index and the
//! saturated property hierarchy, and hands its inferences to a producer.

use crate::conclusion::Conclusion;
use crate::context::Context;
use crate::datatype::{DatatypeChecker, DatatypeRestriction};
use crate::error::ElError;
use crate::index::{ChainId, ConceptId, ConceptKind, IndexedOntology};
use crate::inference::{conjuncts, existential_parts, Inference};
use crate::saturation::PropertyHierarchy;

/// Receiver of rule applications
pub trait ConclusionProducer {
    fn produce(&mut self, inference: Inference);
}

impl ConclusionProducer for Vec<Inference> {
    fn produce(&mut self, inference: Inference) {
        self.push(inference);
    }
}

/// Read-only inputs shared by all rule applications
#[derive(Clone, Copy)]
pub struct RuleEnv<'a> {
    pub index: &'a IndexedOntology,
    pub properties: &'a PropertyHierarchy,
    pub checker: &'a dyn DatatypeChecker,
}

/// Conclusions every concept context starts with
pub fn initialize(env: &RuleEnv<'_>, root: ConceptId, producer: &mut impl ConclusionProducer) -> Result<(), ElError> {
    producer.produce(Inference::Initialization { root });
    let top = env.index.top();
    if env.index.concept(top)?.occurs_negatively() {
        producer.produce(Inference::OwlThing { root, top });
    }
    Ok(())
}

/// Apply all rules for a conclusion that was just added to `context`
pub fn apply(
    env: &RuleEnv<'_>,
    context: &Context,
    conclusion: Conclusion,
    producer: &mut impl ConclusionProducer,
) -> Result<(), ElError> {
    let fail = |rule: &'static str| {
        move |source: ElError| ElError::RuleFailure {
            rule,
            context: context.root(),
            conclusion: conclusion.labelled(env.index).to_string(),
            source: Box::new(source),
        }
    };

    match conclusion {
        Conclusion::SubsumerDecomposed { root, subsumer } => {
            decompose(env, context, root, subsumer, producer).map_err(fail("Decomposition"))
        }
        Conclusion::SubsumerComposed { root, subsumer } => {
            compose(env, context, root, subsumer, producer).map_err(fail("Composition"))
        }
        Conclusion::BackwardLink { root, source, property } => {
            if !context.is_consistent() {
                propagate_contradiction(root, source, property, producer);
            }
            backward_link(env, context, root, source, property, producer).map_err(fail("BackwardLink"))
        }
        Conclusion::ForwardLink { root, property, target } => {
            for (source, link) in context.backward_links() {
                compose_links(env, root, source, link, property, target, producer)
                    .map_err(fail("ComposedBackwardLink"))?;
            }
            Ok(())
        }
        Conclusion::DisjointSubsumer { root, axiom, position } => {
            for other in context.disjoint_positions(axiom) {
                if other != position {
                    producer.produce(Inference::ContradictionOfDisjointSubsumers {
                        root,
                        axiom,
                        first: position.min(other),
                        second: position.max(other),
                    });
                }
            }
            Ok(())
        }
        Conclusion::Contradiction { root } => {
            for (source, property) in context.backward_links() {
                propagate_contradiction(root, source, property, producer);
            }
            Ok(())
        }
        Conclusion::SubPropertyChain { sub, sup } => {
            apply_property_rule(env.index, sub, sup, producer).map_err(fail("PropertyExpandedSubPropertyOf"))
        }
    }
}

/// Contradiction in the filler context reaches the source of a backward link
pub fn propagate_contradiction(
    origin: ConceptId,
    source: ConceptId,
    property: ChainId,
    producer: &mut impl ConclusionProducer,
) {
    producer.produce(Inference::ContradictionPropagated {
        origin,
        source,
        property,
    });
}

pub fn initialize_chain(chain: ChainId, producer: &mut impl ConclusionProducer) {
    producer.produce(Inference::PropertyInitialization { chain });
}

/// `sub ⊑ middle` and told `middle ⊑ sup` give `sub ⊑ sup`
pub fn apply_property_rule(
    index: &IndexedOntology,
    sub: ChainId,
    middle: ChainId,
    producer: &mut impl ConclusionProducer,
) -> Result<(), ElError> {
    for &(sup, axiom) in index.chain(middle)?.told_supers() {
        producer.produce(Inference::PropertyExpandedSubPropertyOf {
            sub,
            middle,
            sup,
            axiom,
        });
    }
    Ok(())
}

fn decompose(
    env: &RuleEnv<'_>,
    context: &Context,
    root: ConceptId,
    subsumer: ConceptId,
    producer: &mut impl ConclusionProducer,
) -> Result<(), ElError> {
    producer.produce(Inference::ComposedOfDecomposed { root, subsumer });

    match env.index.concept(subsumer)?.kind() {
        ConceptKind::Conjunction(first, second) => {
            producer.produce(Inference::DecomposedFirstConjunct {
                root,
                conjunction: subsumer,
                conjunct: *first,
            });
            producer.produce(Inference::DecomposedSecondConjunct {
                root,
                conjunction: subsumer,
                conjunct: *second,
            });
        }
        ConceptKind::Existential { property, filler } => {
            producer.produce(Inference::DecomposedExistential {
                root,
                existential: subsumer,
                property: *property,
                filler: *filler,
            });
        }
        ConceptKind::Bottom => {
            producer.produce(Inference::ContradictionOfOwlNothing { root, bottom: subsumer });
        }
        ConceptKind::DataRestriction {
            property, restrictions, ..
        } => {
            datatype(env, context, root, subsumer, *property, restrictions, producer)?;
        }
        ConceptKind::Named(_) | ConceptKind::Top => {}
    }
    Ok(())
}

fn datatype(
    env: &RuleEnv<'_>,
    context: &Context,
    root: ConceptId,
    restriction: ConceptId,
    property: crate::index::DataPropertyId,
    restrictions: &[DatatypeRestriction],
    producer: &mut impl ConclusionProducer,
) -> Result<(), ElError> {
    if !env.checker.is_satisfiable(restrictions) {
        producer.produce(Inference::ContradictionOfDatatype { root, restriction });
        return Ok(());
    }

    let data = env
        .index
        .data_property(property)
        .ok_or_else(|| ElError::malformed(restriction, format!("unknown data property {}", property)))?;

    if let Some(axiom) = data.functional() {
        // a functional property has one value, so decomposed restrictions must be jointly satisfiable
        for &other in data.restrictions() {
            if other == restriction || !context.has_decomposed(other) {
                continue;
            }
            let combined = [restrictions, data_restrictions(env.index, other)?].concat();
            if !env.checker.is_satisfiable(&combined) {
                producer.produce(Inference::ContradictionOfFunctionalDatatype {
                    root,
                    first: restriction.min(other),
                    second: restriction.max(other),
                    axiom,
                });
            }
        }
    }

    for &sup in data.negative_restrictions() {
        if sup != restriction && env.checker.is_subsumed(restrictions, data_restrictions(env.index, sup)?) {
            producer.produce(Inference::ComposedDatatype {
                root,
                sub: restriction,
                sup,
            });
        }
    }
    Ok(())
}

fn data_restrictions(index: &IndexedOntology, id: ConceptId) -> Result<&[DatatypeRestriction], ElError> {
    match index.concept(id)?.kind() {
        ConceptKind::DataRestriction { restrictions, .. } => Ok(restrictions),
        _ => Err(ElError::malformed(id, "not a data restriction")),
    }
}

fn compose(
    env: &RuleEnv<'_>,
    context: &Context,
    root: ConceptId,
    subsumer: ConceptId,
    producer: &mut impl ConclusionProducer,
) -> Result<(), ElError> {
    let concept = env.index.concept(subsumer)?;

    for &(sup, axiom) in concept.told_supers() {
        producer.produce(Inference::ExpandedSubClassOf {
            root,
            sub: subsumer,
            sup,
            axiom,
        });
    }

    for &conjunction in concept.negative_conjunctions() {
        let (first, second) = conjuncts(env.index, conjunction)?;
        let other = if first == subsumer { second } else { first };
        if context.has_composed(other) {
            producer.produce(Inference::ComposedConjunction { root, conjunction });
        }
    }

    for &(axiom, position) in concept.disjoint_positions() {
        producer.produce(Inference::DisjointSubsumerOfComposed { root, axiom, position });
    }

    for &existential in concept.negative_existentials() {
        let (property, _) = existential_parts(env.index, existential)?;
        for (source, link) in context.backward_links() {
            if env.properties.is_sub_chain(link, property) {
                producer.produce(Inference::ComposedExistential {
                    origin: root,
                    source,
                    link,
                    existential,
                });
            }
        }
    }
    Ok(())
}

fn backward_link(
    env: &RuleEnv<'_>,
    context: &Context,
    root: ConceptId,
    source: ConceptId,
    property: ChainId,
    producer: &mut impl ConclusionProducer,
) -> Result<(), ElError> {
    for &sup in env.properties.super_chains(property) {
        for &existential in env.index.chain(sup)?.negative_existentials() {
            let (_, filler) = existential_parts(env.index, existential)?;
            if context.has_composed(filler) {
                producer.produce(Inference::ComposedExistential {
                    origin: root,
                    source,
                    link: property,
                    existential,
                });
            }
        }
    }

    if env.properties.is_below_right_component(property) {
        producer.produce(Inference::ForwardLinkOfBackwardLink {
            origin: root,
            source,
            property,
        });
    }

    for (right, target) in context.forward_links() {
        compose_links(env, root, source, property, right, target, producer)?;
    }
    Ok(())
}

/// `source -left-> origin -right-> target` with `left ⊑* L`, `right ⊑* R`, `L ∘ R ⊑* sup`
fn compose_links(
    env: &RuleEnv<'_>,
    origin: ConceptId,
    source: ConceptId,
    left: ChainId,
    right: ChainId,
    target: ConceptId,
    producer: &mut impl ConclusionProducer,
) -> Result<(), ElError> {
    for &left_super in env.properties.super_chains(left) {
        for &composition in env.index.chain(left_super)?.left_compositions() {
            let (_, right_component) = env.index.composition(composition)?;
            if !env.properties.is_sub_chain(right, right_component) {
                continue;
            }
            for &sup in env.properties.super_chains(composition) {
                if env.index.chain(sup)?.is_composition() {
                    continue;
                }
                producer.produce(Inference::ComposedBackwardLink {
                    origin,
                    source,
                    left,
                    right,
                    target,
                    composition,
                    sup,
                });
            }
        }
    }
    Ok(())
}
