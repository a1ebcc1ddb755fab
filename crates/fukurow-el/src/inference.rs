//! 推論モデル
//!
//! An inference keeps just the ids needed to recompute its conclusion and
//! premises. Premises are rebuilt on demand from the payload and the index.

use crate::conclusion::{Conclusion, ContextRef, Labelled};
use crate::error::ElError;
use crate::index::{AxiomId, ChainId, ConceptId, ConceptKind, IndexedOntology};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A premise of an inference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Premise {
    Conclusion(Conclusion),
    Axiom(AxiomId),
}

/// One rule application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Inference {
    Initialization {
        root: ConceptId,
    },
    OwlThing {
        root: ConceptId,
        top: ConceptId,
    },
    ComposedOfDecomposed {
        root: ConceptId,
        subsumer: ConceptId,
    },
    DecomposedFirstConjunct {
        root: ConceptId,
        conjunction: ConceptId,
        conjunct: ConceptId,
    },
    DecomposedSecondConjunct {
        root: ConceptId,
        conjunction: ConceptId,
        conjunct: ConceptId,
    },
    DecomposedExistential {
        root: ConceptId,
        existential: ConceptId,
        property: ChainId,
        filler: ConceptId,
    },
    ContradictionOfOwlNothing {
        root: ConceptId,
        bottom: ConceptId,
    },
    ExpandedSubClassOf {
        root: ConceptId,
        sub: ConceptId,
        sup: ConceptId,
        axiom: AxiomId,
    },
    ComposedConjunction {
        root: ConceptId,
        conjunction: ConceptId,
    },
    /// `origin` is the filler context holding the backward link from `source`
    ComposedExistential {
        origin: ConceptId,
        source: ConceptId,
        link: ChainId,
        existential: ConceptId,
    },
    PropertyInitialization {
        chain: ChainId,
    },
    PropertyExpandedSubPropertyOf {
        sub: ChainId,
        middle: ChainId,
        sup: ChainId,
        axiom: AxiomId,
    },
    ForwardLinkOfBackwardLink {
        origin: ConceptId,
        source: ConceptId,
        property: ChainId,
    },
    /// `source -left-> origin -right-> target` composed along `composition ⊑ sup`
    ComposedBackwardLink {
        origin: ConceptId,
        source: ConceptId,
        left: ChainId,
        right: ChainId,
        target: ConceptId,
        composition: ChainId,
        sup: ChainId,
    },
    DisjointSubsumerOfComposed {
        root: ConceptId,
        axiom: AxiomId,
        position: u32,
    },
    ContradictionOfDisjointSubsumers {
        root: ConceptId,
        axiom: AxiomId,
        first: u32,
        second: u32,
    },
    ContradictionPropagated {
        origin: ConceptId,
        source: ConceptId,
        property: ChainId,
    },
    ContradictionOfDatatype {
        root: ConceptId,
        restriction: ConceptId,
    },
    ContradictionOfFunctionalDatatype {
        root: ConceptId,
        first: ConceptId,
        second: ConceptId,
        axiom: AxiomId,
    },
    ComposedDatatype {
        root: ConceptId,
        sub: ConceptId,
        sup: ConceptId,
    },
}

impl Inference {
    /// Stable rule name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Initialization { .. } => "Initialization",
            Self::OwlThing { .. } => "OwlThing",
            Self::ComposedOfDecomposed { .. } => "ComposedOfDecomposed",
            Self::DecomposedFirstConjunct { .. } => "DecomposedFirstConjunct",
            Self::DecomposedSecondConjunct { .. } => "DecomposedSecondConjunct",
            Self::DecomposedExistential { .. } => "DecomposedExistential",
            Self::ContradictionOfOwlNothing { .. } => "ContradictionOfOwlNothing",
            Self::ExpandedSubClassOf { .. } => "ExpandedSubClassOf",
            Self::ComposedConjunction { .. } => "ComposedConjunction",
            Self::ComposedExistential { .. } => "ComposedExistential",
            Self::PropertyInitialization { .. } => "PropertyInitialization",
            Self::PropertyExpandedSubPropertyOf { .. } => "PropertyExpandedSubPropertyOf",
            Self::ForwardLinkOfBackwardLink { .. } => "ForwardLinkOfBackwardLink",
            Self::ComposedBackwardLink { .. } => "ComposedBackwardLink",
            Self::DisjointSubsumerOfComposed { .. } => "DisjointSubsumerOfComposed",
            Self::ContradictionOfDisjointSubsumers { .. } => "ContradictionOfDisjointSubsumers",
            Self::ContradictionPropagated { .. } => "ContradictionPropagated",
            Self::ContradictionOfDatatype { .. } => "ContradictionOfDatatype",
            Self::ContradictionOfFunctionalDatatype { .. } => "ContradictionOfFunctionalDatatype",
            Self::ComposedDatatype { .. } => "ComposedDatatype",
        }
    }

    pub fn conclusion(&self) -> Conclusion {
        match *self {
            Self::Initialization { root } => Conclusion::SubsumerDecomposed { root, subsumer: root },
            Self::OwlThing { root, top } => Conclusion::SubsumerComposed { root, subsumer: top },
            Self::ComposedOfDecomposed { root, subsumer } => Conclusion::SubsumerComposed { root, subsumer },
            Self::DecomposedFirstConjunct { root, conjunct, .. }
            | Self::DecomposedSecondConjunct { root, conjunct, .. } => {
                Conclusion::SubsumerDecomposed { root, subsumer: conjunct }
            }
            Self::DecomposedExistential {
                root, property, filler, ..
            } => Conclusion::BackwardLink {
                root: filler,
                source: root,
                property,
            },
            Self::ContradictionOfOwlNothing { root, .. } => Conclusion::Contradiction { root },
            Self::ExpandedSubClassOf { root, sup, .. } => Conclusion::SubsumerDecomposed { root, subsumer: sup },
            Self::ComposedConjunction { root, conjunction } => Conclusion::SubsumerComposed {
                root,
                subsumer: conjunction,
            },
            Self::ComposedExistential {
                source, existential, ..
            } => Conclusion::SubsumerComposed {
                root: source,
                subsumer: existential,
            },
            Self::PropertyInitialization { chain } => Conclusion::SubPropertyChain { sub: chain, sup: chain },
            Self::PropertyExpandedSubPropertyOf { sub, sup, .. } => Conclusion::SubPropertyChain { sub, sup },
            Self::ForwardLinkOfBackwardLink {
                origin,
                source,
                property,
            } => Conclusion::ForwardLink {
                root: source,
                property,
                target: origin,
            },
            Self::ComposedBackwardLink {
                source, target, sup, ..
            } => Conclusion::BackwardLink {
                root: target,
                source,
                property: sup,
            },
            Self::DisjointSubsumerOfComposed { root, axiom, position } => {
                Conclusion::DisjointSubsumer { root, axiom, position }
            }
            Self::ContradictionOfDisjointSubsumers { root, .. }
            | Self::ContradictionOfDatatype { root, .. }
            | Self::ContradictionOfFunctionalDatatype { root, .. } => Conclusion::Contradiction { root },
            Self::ContradictionPropagated { source, .. } => Conclusion::Contradiction { root: source },
            Self::ComposedDatatype { root, sup, .. } => Conclusion::SubsumerComposed { root, subsumer: sup },
        }
    }

    /// The context whose conclusions are the non-axiom premises
    ///
    /// Sub-property premises of concept inferences come from the property
    /// contexts, which are saturated before any concept context.
    pub fn origin(&self) -> ContextRef {
        match *self {
            Self::PropertyInitialization { chain } => ContextRef::Chain(chain),
            Self::PropertyExpandedSubPropertyOf { sub, .. } => ContextRef::Chain(sub),
            Self::ComposedExistential { origin, .. }
            | Self::ForwardLinkOfBackwardLink { origin, .. }
            | Self::ComposedBackwardLink { origin, .. }
            | Self::ContradictionPropagated { origin, .. } => ContextRef::Concept(origin),
            Self::Initialization { root }
            | Self::OwlThing { root, .. }
            | Self::ComposedOfDecomposed { root, .. }
            | Self::DecomposedFirstConjunct { root, .. }
            | Self::DecomposedSecondConjunct { root, .. }
            | Self::DecomposedExistential { root, .. }
            | Self::ContradictionOfOwlNothing { root, .. }
            | Self::ExpandedSubClassOf { root, .. }
            | Self::ComposedConjunction { root, .. }
            | Self::DisjointSubsumerOfComposed { root, .. }
            | Self::ContradictionOfDisjointSubsumers { root, .. }
            | Self::ContradictionOfDatatype { root, .. }
            | Self::ContradictionOfFunctionalDatatype { root, .. }
            | Self::ComposedDatatype { root, .. } => ContextRef::Concept(root),
        }
    }

    /// Recompute the premises from the payload
    pub fn premises(&self, index: &IndexedOntology) -> Result<Vec<Premise>, ElError> {
        use Conclusion::*;

        let decomposed = |root, subsumer| Premise::Conclusion(SubsumerDecomposed { root, subsumer });
        let composed = |root, subsumer| Premise::Conclusion(SubsumerComposed { root, subsumer });
        let sub_chain = |sub, sup| Premise::Conclusion(SubPropertyChain { sub, sup });

        let premises = match *self {
            Self::Initialization { .. } | Self::OwlThing { .. } | Self::PropertyInitialization { .. } => Vec::new(),
            Self::ComposedOfDecomposed { root, subsumer } => vec![decomposed(root, subsumer)],
            Self::DecomposedFirstConjunct {
                root,
                conjunction,
                conjunct,
            } => {
                let (first, _) = conjuncts(index, conjunction)?;
                check(first == conjunct, conjunction, "first conjunct does not match")?;
                vec![decomposed(root, conjunction)]
            }
            Self::DecomposedSecondConjunct {
                root,
                conjunction,
                conjunct,
            } => {
                let (_, second) = conjuncts(index, conjunction)?;
                check(second == conjunct, conjunction, "second conjunct does not match")?;
                vec![decomposed(root, conjunction)]
            }
            Self::DecomposedExistential {
                root,
                existential,
                property,
                filler,
            } => {
                check(
                    existential_parts(index, existential)? == (property, filler),
                    existential,
                    "existential does not match its link",
                )?;
                vec![decomposed(root, existential)]
            }
            Self::ContradictionOfOwlNothing { root, bottom } => {
                check(bottom == index.bottom(), bottom, "not owl:Nothing")?;
                vec![decomposed(root, bottom)]
            }
            Self::ExpandedSubClassOf { root, sub, sup, axiom } => {
                check(
                    index.concept(sub)?.told_supers().contains(&(sup, axiom)),
                    sub,
                    "no such told subsumption",
                )?;
                vec![composed(root, sub), Premise::Axiom(axiom)]
            }
            Self::ComposedConjunction { root, conjunction } => {
                let (first, second) = conjuncts(index, conjunction)?;
                vec![composed(root, first), composed(root, second)]
            }
            Self::ComposedExistential {
                origin,
                source,
                link,
                existential,
            } => {
                let (property, filler) = existential_parts(index, existential)?;
                vec![
                    Premise::Conclusion(BackwardLink {
                        root: origin,
                        source,
                        property: link,
                    }),
                    composed(origin, filler),
                    sub_chain(link, property),
                ]
            }
            Self::PropertyExpandedSubPropertyOf { sub, middle, axiom, .. } => {
                vec![sub_chain(sub, middle), Premise::Axiom(axiom)]
            }
            Self::ForwardLinkOfBackwardLink {
                origin,
                source,
                property,
            } => vec![Premise::Conclusion(BackwardLink {
                root: origin,
                source,
                property,
            })],
            Self::ComposedBackwardLink {
                origin,
                source,
                left,
                right,
                target,
                composition,
                sup,
            } => {
                let (left_component, right_component) = index.composition(composition)?;
                vec![
                    Premise::Conclusion(BackwardLink {
                        root: origin,
                        source,
                        property: left,
                    }),
                    Premise::Conclusion(ForwardLink {
                        root: origin,
                        property: right,
                        target,
                    }),
                    sub_chain(left, left_component),
                    sub_chain(right, right_component),
                    sub_chain(composition, sup),
                ]
            }
            Self::DisjointSubsumerOfComposed { root, axiom, position } => {
                let member = index
                    .disjoint_members(axiom)
                    .and_then(|members| members.get(position as usize))
                    .copied()
                    .ok_or_else(|| ElError::malformed(root, format!("no disjointness member {}#{}", axiom, position)))?;
                vec![composed(root, member), Premise::Axiom(axiom)]
            }
            Self::ContradictionOfDisjointSubsumers {
                root,
                axiom,
                first,
                second,
            } => vec![
                Premise::Conclusion(DisjointSubsumer {
                    root,
                    axiom,
                    position: first,
                }),
                Premise::Conclusion(DisjointSubsumer {
                    root,
                    axiom,
                    position: second,
                }),
            ],
            Self::ContradictionPropagated {
                origin,
                source,
                property,
            } => vec![
                Premise::Conclusion(Contradiction { root: origin }),
                Premise::Conclusion(BackwardLink {
                    root: origin,
                    source,
                    property,
                }),
            ],
            Self::ContradictionOfDatatype { root, restriction } => {
                data_restriction(index, restriction)?;
                vec![decomposed(root, restriction)]
            }
            Self::ContradictionOfFunctionalDatatype {
                root,
                first,
                second,
                axiom,
            } => {
                let property = data_restriction(index, first)?;
                check(
                    data_restriction(index, second)? == property,
                    second,
                    "restrictions are on different properties",
                )?;
                vec![decomposed(root, first), decomposed(root, second), Premise::Axiom(axiom)]
            }
            Self::ComposedDatatype { root, sub, sup } => {
                let property = data_restriction(index, sub)?;
                check(
                    data_restriction(index, sup)? == property,
                    sup,
                    "restrictions are on different properties",
                )?;
                vec![decomposed(root, sub)]
            }
        };
        Ok(premises)
    }

    pub fn labelled<'a>(&'a self, index: &'a IndexedOntology) -> Labelled<'a, Inference> {
        Labelled { value: self, index }
    }
}

fn check(condition: bool, concept: ConceptId, detail: &str) -> Result<(), ElError> {
    if condition {
        Ok(())
    } else {
        Err(ElError::malformed(concept, detail))
    }
}

pub(crate) fn conjuncts(index: &IndexedOntology, id: ConceptId) -> Result<(ConceptId, ConceptId), ElError> {
    match index.concept(id)?.kind() {
        ConceptKind::Conjunction(first, second) => Ok((*first, *second)),
        _ => Err(ElError::malformed(id, "not a conjunction")),
    }
}

pub(crate) fn existential_parts(index: &IndexedOntology, id: ConceptId) -> Result<(ChainId, ConceptId), ElError> {
    match index.concept(id)?.kind() {
        ConceptKind::Existential { property, filler } => Ok((*property, *filler)),
        _ => Err(ElError::malformed(id, "not an existential restriction")),
    }
}

fn data_restriction(index: &IndexedOntology, id: ConceptId) -> Result<crate::index::DataPropertyId, ElError> {
    match index.concept(id)?.kind() {
        ConceptKind::DataRestriction { property, .. } => Ok(*property),
        _ => Err(ElError::malformed(id, "not a data restriction")),
    }
}

impl fmt::Display for Labelled<'_, Inference> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let conclusion = self.value.conclusion();
        write!(f, "{} ← {}", conclusion.labelled(self.index), self.value.name())?;
        if let Ok(premises) = self.value.premises(self.index) {
            if !premises.is_empty() {
                write!(f, "(")?;
                for (i, premise) in premises.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    match premise {
                        Premise::Conclusion(c) => write!(f, "{}", c.labelled(self.index))?,
                        Premise::Axiom(id) => match self.index.axiom(*id) {
                            Some(axiom) => write!(f, "{}", axiom)?,
                            None => write!(f, "{}", id)?,
                        },
                    }
                }
                write!(f, ")")?;
            }
        }
        Ok(())
    }
}
