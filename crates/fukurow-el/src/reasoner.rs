//! EL リーナー
//!
//! Facade over index → saturation → taxonomy, with explanation queries on
//! top of the frozen saturation state.

use crate::config::ReasonerConfig;
use crate::conclusion::Conclusion;
use crate::datatype::{DatatypeChecker, IntervalChecker};
use crate::error::ElError;
use crate::index::{ConceptId, IndexStatistics, IndexedOntology};
use crate::saturation::{CancellationToken, Saturation, SaturationOutcome, SaturationState, SaturationStatistics};
use crate::taxonomy::{Taxonomy, TaxonomyNode};
use crate::trace::{ConclusionVisitor, InferenceGraph, TraceSummary, Tracer, TracingMode};
use fukurow_owl::model::{ClassExpression, Ontology, OwlIri};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::info;

struct Classification {
    state: Arc<SaturationState>,
    taxonomy: Taxonomy,
    stats: SaturationStatistics,
    tracer: Tracer,
}

/// OWL 2 EL reasoner
pub struct Reasoner {
    ontology: Ontology,
    config: ReasonerConfig,
    checker: Arc<dyn DatatypeChecker>,
    cancel: CancellationToken,
    classified: Option<Classification>,
}

impl Reasoner {
    pub fn new(ontology: Ontology, config: ReasonerConfig) -> Result<Self, ElError> {
        config.validate()?;
        Ok(Self {
            ontology,
            config,
            checker: Arc::new(IntervalChecker),
            cancel: CancellationToken::new(),
            classified: None,
        })
    }

    /// Replace the datatype checker; drops any previous classification
    pub fn with_checker(mut self, checker: Arc<dyn DatatypeChecker>) -> Self {
        self.checker = checker;
        self.classified = None;
        self
    }

    /// Share a cancellation token with the caller, e.g. a signal handler
    pub fn with_cancellation_token(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn ontology(&self) -> &Ontology {
        &self.ontology
    }

    pub fn config(&self) -> &ReasonerConfig {
        &self.config
    }

    /// Token that interrupts running and future saturations until reset
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Saturate everything and build the taxonomy; later calls reuse the result
    pub fn classify(&mut self) -> Result<&Taxonomy, ElError> {
        Ok(&self.classification()?.taxonomy)
    }

    pub fn taxonomy(&mut self) -> Result<&Taxonomy, ElError> {
        self.classify()
    }

    /// Statistics of the last classification run
    pub fn statistics(&self) -> Option<&SaturationStatistics> {
        self.classified.as_ref().map(|c| &c.stats)
    }

    pub fn index_statistics(&self) -> Option<IndexStatistics> {
        self.classified.as_ref().map(|c| c.state.index().statistics())
    }

    pub fn saturation_state(&mut self) -> Result<Arc<SaturationState>, ElError> {
        Ok(Arc::clone(&self.classification()?.state))
    }

    /// Whether owl:Thing is satisfiable
    pub fn is_consistent(&mut self) -> Result<bool, ElError> {
        let classification = self.classification()?;
        let top = classification.state.index().top();
        classification.state.is_consistent(top)
    }

    pub fn is_satisfiable(&mut self, class: &OwlIri) -> Result<bool, ElError> {
        let classification = self.classification()?;
        let state = &classification.state;
        let id = resolve(state.index(), class)?;
        Ok(state.is_consistent(state.index().top())? && state.is_consistent(id)?)
    }

    pub fn is_subsumed_by(&mut self, sub: &OwlIri, sup: &OwlIri) -> Result<bool, ElError> {
        let classification = self.classification()?;
        let state = &classification.state;
        let index = state.index();
        let (sub, sup) = (resolve(index, sub)?, resolve(index, sup)?);
        if sup == index.top() || !state.is_consistent(index.top())? || !state.is_consistent(sub)? {
            return Ok(true);
        }
        Ok(state.subsumers(sub)?.contains(&sup))
    }

    /// Named super-classes of `class`, direct or all
    pub fn super_classes(&mut self, class: &OwlIri, direct: bool) -> Result<BTreeSet<OwlIri>, ElError> {
        let taxonomy = &self.classification()?.taxonomy;
        let node = node_for(taxonomy, class)?;
        let nodes = if direct {
            node.direct_super_nodes().clone()
        } else {
            taxonomy.all_super_nodes(node.id())
        };
        Ok(named_members(taxonomy, &nodes))
    }

    /// Named sub-classes of `class`, direct or all
    pub fn sub_classes(&mut self, class: &OwlIri, direct: bool) -> Result<BTreeSet<OwlIri>, ElError> {
        let taxonomy = &self.classification()?.taxonomy;
        let node = node_for(taxonomy, class)?;
        let nodes = if direct {
            node.direct_sub_nodes().clone()
        } else {
            taxonomy.all_sub_nodes(node.id())
        };
        Ok(named_members(taxonomy, &nodes))
    }

    /// Named classes equivalent to an arbitrary EL class expression
    ///
    /// The expression is indexed as a query and the ontology is saturated
    /// again from scratch; the cached classification is left untouched.
    pub fn equivalent_classes(&mut self, expression: &ClassExpression) -> Result<Vec<OwlIri>, ElError> {
        info!(query = %expression, "classifying query expression");
        let index = Arc::new(IndexedOntology::build_with_queries(
            &self.ontology,
            std::slice::from_ref(expression),
        )?);
        let query = index
            .find_expression(expression)
            .ok_or_else(|| ElError::UnknownEntity(expression.to_string()))?;
        let (state, _) = self.saturate(index)?;
        let taxonomy = Taxonomy::build(&state)?;
        let node = taxonomy
            .node_of(query)
            .ok_or_else(|| ElError::UnknownEntity(expression.to_string()))?;
        Ok(node.named_members().to_vec())
    }

    /// Trace `sub ⊑ sup`, or the contradiction of `sub` when it is unsatisfiable
    pub fn explain_subsumption(
        &mut self,
        sub: &OwlIri,
        sup: &OwlIri,
        mode: TracingMode,
        visitor: &mut impl ConclusionVisitor,
    ) -> Result<TraceSummary, ElError> {
        let root = self.subsumption_conclusion(sub, sup)?;
        self.trace(root, mode, visitor)
    }

    /// Proof graph of `sub ⊑ sup` in the configured default tracing mode
    pub fn subsumption_proof(&mut self, sub: &OwlIri, sup: &OwlIri) -> Result<InferenceGraph, ElError> {
        let mode = self.config.tracing.default_mode;
        self.subsumption_proof_with(sub, sup, mode)
    }

    pub fn subsumption_proof_with(
        &mut self,
        sub: &OwlIri,
        sup: &OwlIri,
        mode: TracingMode,
    ) -> Result<InferenceGraph, ElError> {
        let root = self.subsumption_conclusion(sub, sup)?;
        let mut graph = InferenceGraph::new(root);
        self.trace(root, mode, &mut graph)?;
        Ok(graph)
    }

    pub fn trace(
        &mut self,
        root: Conclusion,
        mode: TracingMode,
        visitor: &mut impl ConclusionVisitor,
    ) -> Result<TraceSummary, ElError> {
        self.classification()?.tracer.trace(root, mode, visitor)
    }

    fn subsumption_conclusion(&mut self, sub: &OwlIri, sup: &OwlIri) -> Result<Conclusion, ElError> {
        let state = &self.classification()?.state;
        let index = state.index();
        let (sub, sup) = (resolve(index, sub)?, resolve(index, sup)?);
        if !state.is_consistent(sub)? {
            return Ok(Conclusion::Contradiction { root: sub });
        }
        Ok(Conclusion::SubsumerComposed {
            root: sub,
            subsumer: sup,
        })
    }

    fn classification(&mut self) -> Result<&mut Classification, ElError> {
        let classification = match self.classified.take() {
            Some(classification) => classification,
            None => self.compute()?,
        };
        Ok(self.classified.insert(classification))
    }

    fn compute(&self) -> Result<Classification, ElError> {
        let index = Arc::new(IndexedOntology::build(&self.ontology)?);
        info!(
            classes = index.named_classes().len(),
            axioms = self.ontology.axioms.len(),
            "classifying ontology"
        );
        let (state, stats) = self.saturate(index)?;
        let taxonomy = Taxonomy::build(&state)?;
        let state = Arc::new(state);
        let tracer = Tracer::new(
            Arc::clone(&state),
            Arc::clone(&self.checker),
            self.config.tracing.cache_capacity,
        );
        info!(nodes = taxonomy.len(), "classification finished");
        Ok(Classification {
            state,
            taxonomy,
            stats,
            tracer,
        })
    }

    fn saturate(&self, index: Arc<IndexedOntology>) -> Result<(SaturationState, SaturationStatistics), ElError> {
        let mut roots: Vec<ConceptId> = vec![index.top(), index.bottom()];
        roots.extend(index.named_classes().iter().copied());
        roots.extend(index.queries().iter().copied());
        roots.sort();
        roots.dedup();

        let saturation = Saturation::new(index, Arc::clone(&self.checker), self.config.saturation.clone());
        let result = saturation.saturate(&roots, &self.cancel)?;
        match result.outcome {
            SaturationOutcome::Completed => Ok((result.state, result.stats)),
            SaturationOutcome::Cancelled => Err(ElError::Cancelled),
        }
    }
}

fn resolve(index: &IndexedOntology, class: &OwlIri) -> Result<ConceptId, ElError> {
    index
        .class_id(class)
        .ok_or_else(|| ElError::UnknownEntity(class.to_string()))
}

fn node_for<'a>(taxonomy: &'a Taxonomy, class: &OwlIri) -> Result<&'a TaxonomyNode, ElError> {
    taxonomy
        .node_for_iri(class)
        .ok_or_else(|| ElError::UnknownEntity(class.to_string()))
}

fn named_members(taxonomy: &Taxonomy, nodes: &BTreeSet<usize>) -> BTreeSet<OwlIri> {
    nodes
        .iter()
        .filter_map(|&id| taxonomy.node(id))
        .flat_map(|node| node.named_members().iter().cloned())
        .collect()
}
