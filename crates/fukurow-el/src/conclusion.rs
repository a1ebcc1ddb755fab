//! 結論モデル

use crate::index::{AxiomId, ChainId, ConceptId, IndexedOntology};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A context: the saturation state of one concept or one property chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ContextRef {
    Concept(ConceptId),
    Chain(ChainId),
}

impl fmt::Display for ContextRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Concept(id) => write!(f, "{}", id),
            Self::Chain(id) => write!(f, "{}", id),
        }
    }
}

/// A derived fact. Equality is structural over tag and payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Conclusion {
    /// `root ⊑ subsumer`, still to be decomposed
    SubsumerDecomposed { root: ConceptId, subsumer: ConceptId },

    /// `root ⊑ subsumer`, available for composition
    SubsumerComposed { root: ConceptId, subsumer: ConceptId },

    /// `source ⊑ ∃property.root`, stored in the filler context `root`
    BackwardLink {
        root: ConceptId,
        source: ConceptId,
        property: ChainId,
    },

    /// `root ⊑ ∃property.target`, stored in `root` for chain composition
    ForwardLink {
        root: ConceptId,
        property: ChainId,
        target: ConceptId,
    },

    /// `root` is subsumed by the member at `position` of a disjointness axiom
    DisjointSubsumer {
        root: ConceptId,
        axiom: AxiomId,
        position: u32,
    },

    /// `root ⊑ ⊥`
    Contradiction { root: ConceptId },

    /// `sub ⊑ sup` between property chains
    SubPropertyChain { sub: ChainId, sup: ChainId },
}

impl Conclusion {
    /// The context this conclusion is stored in
    pub fn destination(&self) -> ContextRef {
        match *self {
            Self::SubsumerDecomposed { root, .. }
            | Self::SubsumerComposed { root, .. }
            | Self::BackwardLink { root, .. }
            | Self::ForwardLink { root, .. }
            | Self::DisjointSubsumer { root, .. }
            | Self::Contradiction { root } => ContextRef::Concept(root),
            Self::SubPropertyChain { sub, .. } => ContextRef::Chain(sub),
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::SubsumerDecomposed { .. } => "SubsumerDecomposed",
            Self::SubsumerComposed { .. } => "SubsumerComposed",
            Self::BackwardLink { .. } => "BackwardLink",
            Self::ForwardLink { .. } => "ForwardLink",
            Self::DisjointSubsumer { .. } => "DisjointSubsumer",
            Self::Contradiction { .. } => "Contradiction",
            Self::SubPropertyChain { .. } => "SubPropertyChain",
        }
    }

    /// Attach the index for display
    pub fn labelled<'a>(&'a self, index: &'a IndexedOntology) -> Labelled<'a, Conclusion> {
        Labelled { value: self, index }
    }
}

/// A value rendered with labels from the index
pub struct Labelled<'a, T> {
    pub(crate) value: &'a T,
    pub(crate) index: &'a IndexedOntology,
}

impl fmt::Display for Labelled<'_, Conclusion> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let index = self.index;
        match *self.value {
            Conclusion::SubsumerDecomposed { root, subsumer } => write!(
                f,
                "{} ⊑ {} [decomposed]",
                index.concept_label(root),
                index.concept_label(subsumer)
            ),
            Conclusion::SubsumerComposed { root, subsumer } => {
                write!(f, "{} ⊑ {}", index.concept_label(root), index.concept_label(subsumer))
            }
            Conclusion::BackwardLink { root, source, property } => write!(
                f,
                "{} ⊑ ∃{}.{} [backward]",
                index.concept_label(source),
                index.chain_label(property),
                index.concept_label(root)
            ),
            Conclusion::ForwardLink { root, property, target } => write!(
                f,
                "{} ⊑ ∃{}.{} [forward]",
                index.concept_label(root),
                index.chain_label(property),
                index.concept_label(target)
            ),
            Conclusion::DisjointSubsumer { root, axiom, position } => {
                let member = index
                    .disjoint_members(axiom)
                    .and_then(|members| members.get(position as usize))
                    .map(|&m| index.concept_label(m))
                    .unwrap_or_else(|| "?".to_string());
                write!(
                    f,
                    "{} ⊑ {} [disjoint {}#{}]",
                    index.concept_label(root),
                    member,
                    axiom,
                    position
                )
            }
            Conclusion::Contradiction { root } => write!(f, "{} ⊑ ⊥", index.concept_label(root)),
            Conclusion::SubPropertyChain { sub, sup } => {
                write!(f, "{} ⊑ {}", index.chain_label(sub), index.chain_label(sup))
            }
        }
    }
}
