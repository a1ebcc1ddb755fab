//! 推論トレース
//!
//! Inferences are not stored during saturation. To explain a conclusion the
//! tracer replays the rules over the saturated contexts the conclusion can
//! originate from, then walks the premises.

pub mod evictor;
pub mod proof;
pub mod replay;

pub use evictor::{Evictor, LruEvictor, TraceCache};
pub use proof::{print_proof_tree, InferenceGraph};
pub use replay::ContextTrace;

use crate::conclusion::{Conclusion, ContextRef};
use crate::datatype::DatatypeChecker;
use crate::error::ElError;
use crate::index::ConceptId;
use crate::inference::{Inference, Premise};
use crate::saturation::SaturationState;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet, VecDeque};
use std::sync::Arc;
use tracing::{debug, trace};

/// How far a trace follows premises
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TracingMode {
    /// No traversal at all
    NoTracing,
    /// The root's inferences and their premises in the root's context, one level deep
    NonRecursive,
    /// Every premise is followed, across contexts
    #[default]
    Recursive,
}

/// Receives each distinct conclusion and inference of a trace exactly once
pub trait ConclusionVisitor {
    fn visit_conclusion(&mut self, conclusion: &Conclusion);

    fn visit_inference(&mut self, inference: &Inference);
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceSummary {
    pub conclusions: usize,
    pub inferences: usize,
    pub contexts_replayed: usize,
}

/// Read-only explanation engine over a frozen saturation state
pub struct Tracer {
    state: Arc<SaturationState>,
    checker: Arc<dyn DatatypeChecker>,
    cache: TraceCache<ContextTrace>,
}

impl Tracer {
    pub fn new(state: Arc<SaturationState>, checker: Arc<dyn DatatypeChecker>, cache_capacity: usize) -> Self {
        Self {
            state,
            checker,
            cache: TraceCache::new(cache_capacity),
        }
    }

    pub fn state(&self) -> &SaturationState {
        &self.state
    }

    pub fn cache(&self) -> &TraceCache<ContextTrace> {
        &self.cache
    }

    /// Visit the derivation of `root`
    ///
    /// Fails if the context of `root` is unknown or unsaturated. A conclusion
    /// that was never derived has no derivation and visits nothing.
    pub fn trace(
        &mut self,
        root: Conclusion,
        mode: TracingMode,
        visitor: &mut impl ConclusionVisitor,
    ) -> Result<TraceSummary, ElError> {
        let home = root.destination();
        self.state.saturated(home)?;

        let mut summary = TraceSummary::default();
        if mode == TracingMode::NoTracing || !self.state.contains(&root) {
            return Ok(summary);
        }

        let mut seen_conclusions = HashSet::from([root]);
        let mut seen_inferences = HashSet::new();
        // (conclusion, whether its own inferences are expanded)
        let mut todo = VecDeque::from([(root, true)]);

        while let Some((conclusion, expand)) = todo.pop_front() {
            visitor.visit_conclusion(&conclusion);
            summary.conclusions += 1;
            if !expand {
                continue;
            }

            let (inferences, replayed) = self.inferences_of(conclusion, home)?;
            summary.contexts_replayed += replayed;
            for inference in inferences {
                if !seen_inferences.insert(inference) {
                    continue;
                }
                trace!(inference = %inference.labelled(self.state.index()), "traced");
                visitor.visit_inference(&inference);
                summary.inferences += 1;

                for premise in inference.premises(self.state.index())? {
                    let Premise::Conclusion(premise) = premise else {
                        continue;
                    };
                    let (follow, expand) = match mode {
                        TracingMode::Recursive => (true, true),
                        TracingMode::NonRecursive => (premise.destination() == home, false),
                        TracingMode::NoTracing => (false, false),
                    };
                    if follow && seen_conclusions.insert(premise) {
                        todo.push_back((premise, expand));
                    }
                }
            }
        }

        debug!(
            root = %root.labelled(self.state.index()),
            ?mode,
            conclusions = summary.conclusions,
            inferences = summary.inferences,
            "trace finished"
        );
        Ok(summary)
    }

    /// All inferences producing `conclusion`, over every candidate origin context
    pub fn inferences(&mut self, conclusion: Conclusion) -> Result<BTreeSet<Inference>, ElError> {
        let home = conclusion.destination();
        Ok(self.inferences_of(conclusion, home)?.0)
    }

    fn inferences_of(
        &mut self,
        conclusion: Conclusion,
        home: ContextRef,
    ) -> Result<(BTreeSet<Inference>, usize), ElError> {
        let mut found = BTreeSet::new();
        let mut replayed = 0;
        for origin in self.candidate_origins(&conclusion) {
            let trace = match self.cache.get(origin) {
                Some(trace) => trace,
                None => {
                    let trace = Arc::new(replay::replay(&self.state, self.checker.as_ref(), origin)?);
                    self.cache.insert(origin, Arc::clone(&trace), &[home]);
                    replayed += 1;
                    trace
                }
            };
            found.extend(trace.inferences(&conclusion).copied());
        }
        Ok((found, replayed))
    }

    /// Contexts whose rules can produce `conclusion`
    fn candidate_origins(&self, conclusion: &Conclusion) -> Vec<ContextRef> {
        let with_successors = |root: ConceptId| -> Vec<ContextRef> {
            let mut origins: BTreeSet<ConceptId> = self.state.successors(root).collect();
            origins.insert(root);
            origins.into_iter().map(ContextRef::Concept).collect()
        };
        match *conclusion {
            Conclusion::SubsumerDecomposed { root, .. } | Conclusion::DisjointSubsumer { root, .. } => {
                vec![ContextRef::Concept(root)]
            }
            Conclusion::SubsumerComposed { root, .. } | Conclusion::Contradiction { root } => with_successors(root),
            Conclusion::BackwardLink { source, .. } => with_successors(source),
            Conclusion::ForwardLink { target, .. } => vec![ContextRef::Concept(target)],
            Conclusion::SubPropertyChain { sub, .. } => vec![ContextRef::Chain(sub)],
        }
    }
}
