//! コンテキスト: 概念ごとの導出状態

use crate::conclusion::{Conclusion, ContextRef};
use crate::index::{AxiomId, ChainId, ConceptId};
use std::collections::{BTreeMap, BTreeSet, HashSet, VecDeque};

/// Conclusions derived for one concept or one property chain, plus pending work
///
/// A context is only mutated by the worker that currently owns it.
#[derive(Debug, Clone)]
pub struct Context {
    root: ContextRef,
    decomposed: BTreeSet<ConceptId>,
    composed: BTreeSet<ConceptId>,
    /// property → sources of `source ⊑ ∃property.root`
    backward_links: BTreeMap<ChainId, BTreeSet<ConceptId>>,
    /// property → targets of `root ⊑ ∃property.target`
    forward_links: BTreeMap<ChainId, BTreeSet<ConceptId>>,
    disjoint_subsumers: BTreeMap<AxiomId, BTreeSet<u32>>,
    super_chains: BTreeSet<ChainId>,
    consistent: bool,
    saturated: bool,
    queue: VecDeque<Conclusion>,
    queued: HashSet<Conclusion>,
}

impl Context {
    pub fn new(root: ContextRef) -> Self {
        Self {
            root,
            decomposed: BTreeSet::new(),
            composed: BTreeSet::new(),
            backward_links: BTreeMap::new(),
            forward_links: BTreeMap::new(),
            disjoint_subsumers: BTreeMap::new(),
            super_chains: BTreeSet::new(),
            consistent: true,
            saturated: false,
            queue: VecDeque::new(),
            queued: HashSet::new(),
        }
    }

    pub fn root(&self) -> ContextRef {
        self.root
    }

    /// Insert into the matching conclusion set; false if already present
    ///
    /// The first contradiction makes the context inconsistent.
    pub fn add_conclusion(&mut self, conclusion: Conclusion) -> bool {
        debug_assert_eq!(conclusion.destination(), self.root);
        match conclusion {
            Conclusion::SubsumerDecomposed { subsumer, .. } => self.decomposed.insert(subsumer),
            Conclusion::SubsumerComposed { subsumer, .. } => self.composed.insert(subsumer),
            Conclusion::BackwardLink { source, property, .. } => {
                self.backward_links.entry(property).or_default().insert(source)
            }
            Conclusion::ForwardLink { property, target, .. } => {
                self.forward_links.entry(property).or_default().insert(target)
            }
            Conclusion::DisjointSubsumer { axiom, position, .. } => {
                self.disjoint_subsumers.entry(axiom).or_default().insert(position)
            }
            Conclusion::Contradiction { .. } => self.mark_inconsistent(),
            Conclusion::SubPropertyChain { sup, .. } => self.super_chains.insert(sup),
        }
    }

    pub fn contains(&self, conclusion: &Conclusion) -> bool {
        match *conclusion {
            Conclusion::SubsumerDecomposed { subsumer, .. } => self.decomposed.contains(&subsumer),
            Conclusion::SubsumerComposed { subsumer, .. } => self.composed.contains(&subsumer),
            Conclusion::BackwardLink { source, property, .. } => self
                .backward_links
                .get(&property)
                .map_or(false, |sources| sources.contains(&source)),
            Conclusion::ForwardLink { property, target, .. } => self
                .forward_links
                .get(&property)
                .map_or(false, |targets| targets.contains(&target)),
            Conclusion::DisjointSubsumer { axiom, position, .. } => self
                .disjoint_subsumers
                .get(&axiom)
                .map_or(false, |positions| positions.contains(&position)),
            Conclusion::Contradiction { .. } => !self.consistent,
            Conclusion::SubPropertyChain { sup, .. } => self.super_chains.contains(&sup),
        }
    }

    /// Queue unless an equal conclusion is queued or already stored
    pub fn enqueue(&mut self, conclusion: Conclusion) -> bool {
        if self.contains(&conclusion) || !self.queued.insert(conclusion) {
            return false;
        }
        self.queue.push_back(conclusion);
        true
    }

    /// Non-blocking pop of the next queued conclusion
    pub fn take_next(&mut self) -> Option<Conclusion> {
        let conclusion = self.queue.pop_front()?;
        self.queued.remove(&conclusion);
        Some(conclusion)
    }

    pub fn has_pending(&self) -> bool {
        !self.queue.is_empty()
    }

    /// Transition to inconsistent; true only on the first call
    ///
    /// Queued subsumers are dropped. Queued backward links stay so that the
    /// contradiction still reaches every predecessor.
    pub fn mark_inconsistent(&mut self) -> bool {
        if !self.consistent {
            return false;
        }
        self.consistent = false;
        let queued = &mut self.queued;
        self.queue.retain(|c| {
            let keep = matches!(c, Conclusion::BackwardLink { .. } | Conclusion::Contradiction { .. });
            if !keep {
                queued.remove(c);
            }
            keep
        });
        true
    }

    pub fn is_consistent(&self) -> bool {
        self.consistent
    }

    pub fn is_saturated(&self) -> bool {
        self.saturated
    }

    pub(crate) fn set_saturated(&mut self) {
        self.saturated = true;
    }

    /// Composed subsumers: the entailed super-concepts of the root
    pub fn subsumers(&self) -> &BTreeSet<ConceptId> {
        &self.composed
    }

    pub fn decomposed_subsumers(&self) -> &BTreeSet<ConceptId> {
        &self.decomposed
    }

    pub fn has_composed(&self, concept: ConceptId) -> bool {
        self.composed.contains(&concept)
    }

    pub fn has_decomposed(&self, concept: ConceptId) -> bool {
        self.decomposed.contains(&concept)
    }

    /// `(source, property)` pairs of the stored backward links
    pub fn backward_links(&self) -> impl Iterator<Item = (ConceptId, ChainId)> + '_ {
        self.backward_links
            .iter()
            .flat_map(|(&property, sources)| sources.iter().map(move |&source| (source, property)))
    }

    pub fn backward_link_sources(&self, property: ChainId) -> impl Iterator<Item = ConceptId> + '_ {
        self.backward_links.get(&property).into_iter().flatten().copied()
    }

    /// `(property, target)` pairs of the stored forward links
    pub fn forward_links(&self) -> impl Iterator<Item = (ChainId, ConceptId)> + '_ {
        self.forward_links
            .iter()
            .flat_map(|(&property, targets)| targets.iter().map(move |&target| (property, target)))
    }

    pub fn disjoint_positions(&self, axiom: AxiomId) -> impl Iterator<Item = u32> + '_ {
        self.disjoint_subsumers.get(&axiom).into_iter().flatten().copied()
    }

    /// Super-chains of a property context
    pub fn super_chains(&self) -> &BTreeSet<ChainId> {
        &self.super_chains
    }

    /// Every stored conclusion, in a deterministic order
    pub fn conclusions(&self) -> Vec<Conclusion> {
        let mut conclusions = Vec::new();
        match self.root {
            ContextRef::Concept(root) => {
                conclusions.extend(
                    self.decomposed
                        .iter()
                        .map(|&subsumer| Conclusion::SubsumerDecomposed { root, subsumer }),
                );
                conclusions.extend(
                    self.composed
                        .iter()
                        .map(|&subsumer| Conclusion::SubsumerComposed { root, subsumer }),
                );
                conclusions.extend(
                    self.backward_links()
                        .map(|(source, property)| Conclusion::BackwardLink { root, source, property }),
                );
                conclusions.extend(
                    self.forward_links()
                        .map(|(property, target)| Conclusion::ForwardLink { root, property, target }),
                );
                for (&axiom, positions) in &self.disjoint_subsumers {
                    conclusions.extend(
                        positions
                            .iter()
                            .map(|&position| Conclusion::DisjointSubsumer { root, axiom, position }),
                    );
                }
                if !self.consistent {
                    conclusions.push(Conclusion::Contradiction { root });
                }
            }
            ContextRef::Chain(sub) => {
                conclusions.extend(
                    self.super_chains
                        .iter()
                        .map(|&sup| Conclusion::SubPropertyChain { sub, sup }),
                );
            }
        }
        conclusions
    }

    pub fn conclusion_count(&self) -> usize {
        self.decomposed.len()
            + self.composed.len()
            + self.backward_links.values().map(BTreeSet::len).sum::<usize>()
            + self.forward_links.values().map(BTreeSet::len).sum::<usize>()
            + self.disjoint_subsumers.values().map(BTreeSet::len).sum::<usize>()
            + usize::from(!self.consistent)
            + self.super_chains.len()
    }
}
