//! 飽和スケジューラ
//!
//! Property chains are saturated first, on the calling thread. Concept
//! contexts are then driven to a fixpoint by a pool of workers:
//!
//! * a context is owned by the worker that won the compare-and-swap on its
//!   `scheduled` flag; only that worker touches its conclusion sets and queue
//! * conclusions for other contexts go through the target's inbox, followed
//!   by an activation attempt
//! * `pending` counts activations not yet fully processed; the run is over
//!   when it drops to zero

use crate::config::SaturationConfig;
use crate::conclusion::{Conclusion, ContextRef};
use crate::context::Context;
use crate::datatype::DatatypeChecker;
use crate::error::ElError;
use crate::index::{ChainId, ConceptId, IndexedOntology};
use crate::inference::Inference;
use crate::rules::{self, RuleEnv};
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tracing::{debug, info, trace};

/// Cooperative cancellation flag, checked between work items
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SaturationOutcome {
    Completed,
    /// Interrupted; every context holds a subset of its complete result
    Cancelled,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SaturationStatistics {
    pub workers: usize,
    pub property_contexts: usize,
    pub contexts: usize,
    pub activations: usize,
    pub conclusions_processed: usize,
    pub inferences: usize,
    pub elapsed: Duration,
}

/// Saturated property contexts: reflexive-transitive super-chains of every chain
#[derive(Debug, Clone)]
pub struct PropertyHierarchy {
    contexts: Vec<Context>,
    below_right_component: Vec<bool>,
}

impl PropertyHierarchy {
    pub(crate) fn saturate(index: &IndexedOntology) -> Result<(Self, usize), ElError> {
        let mut contexts = Vec::with_capacity(index.chain_count());
        let mut inferences = 0;

        for chain in index.chain_ids() {
            let mut context = Context::new(ContextRef::Chain(chain));
            let mut produced = Vec::new();
            rules::initialize_chain(chain, &mut produced);

            loop {
                for inference in produced.drain(..) {
                    inferences += 1;
                    context.enqueue(inference.conclusion());
                }
                let Some(conclusion) = context.take_next() else {
                    break;
                };
                if let Conclusion::SubPropertyChain { sub, sup } = conclusion {
                    if context.add_conclusion(conclusion) {
                        rules::apply_property_rule(index, sub, sup, &mut produced)?;
                    }
                }
            }
            context.set_saturated();
            contexts.push(context);
        }

        let below_right_component = contexts
            .iter()
            .map(|context: &Context| {
                context.super_chains().iter().any(|&sup| {
                    index
                        .chain(sup)
                        .map_or(false, |chain| !chain.right_compositions().is_empty())
                })
            })
            .collect();

        Ok((
            Self {
                contexts,
                below_right_component,
            },
            inferences,
        ))
    }

    /// Reflexive-transitive super-chains of `chain`
    pub fn super_chains(&self, chain: ChainId) -> &BTreeSet<ChainId> {
        static EMPTY: BTreeSet<ChainId> = BTreeSet::new();
        self.contexts
            .get(chain.index())
            .map_or(&EMPTY, Context::super_chains)
    }

    pub fn is_sub_chain(&self, sub: ChainId, sup: ChainId) -> bool {
        self.super_chains(sub).contains(&sup)
    }

    /// Whether some super-property of `chain` is the right component of a composition
    pub fn is_below_right_component(&self, chain: ChainId) -> bool {
        self.below_right_component.get(chain.index()).copied().unwrap_or(false)
    }

    pub fn context(&self, chain: ChainId) -> Option<&Context> {
        self.contexts.get(chain.index())
    }

    pub fn len(&self) -> usize {
        self.contexts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }
}

/// Frozen result of a saturation run, shared read-only by taxonomy and tracing
#[derive(Debug)]
pub struct SaturationState {
    index: Arc<IndexedOntology>,
    properties: PropertyHierarchy,
    contexts: Vec<Option<Context>>,
    successors: BTreeMap<ConceptId, BTreeSet<ConceptId>>,
    complete: bool,
}

impl SaturationState {
    pub fn index(&self) -> &IndexedOntology {
        &self.index
    }

    pub fn shared_index(&self) -> Arc<IndexedOntology> {
        Arc::clone(&self.index)
    }

    pub fn properties(&self) -> &PropertyHierarchy {
        &self.properties
    }

    /// Whether the run reached quiescence
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    pub fn context(&self, root: ConceptId) -> Option<&Context> {
        self.contexts.get(root.index()).and_then(Option::as_ref)
    }

    /// Look up any context, failing for unknown ones
    pub fn lookup(&self, context: ContextRef) -> Result<&Context, ElError> {
        match context {
            ContextRef::Concept(root) => self.context(root),
            ContextRef::Chain(chain) => self.properties.context(chain),
        }
        .ok_or(ElError::UnknownContext(context))
    }

    /// Like [`lookup`](Self::lookup), but also requires the context to be saturated
    pub fn saturated(&self, context: ContextRef) -> Result<&Context, ElError> {
        let found = self.lookup(context)?;
        if found.is_saturated() {
            Ok(found)
        } else {
            Err(ElError::NotSaturated(context))
        }
    }

    pub fn subsumers(&self, root: ConceptId) -> Result<&BTreeSet<ConceptId>, ElError> {
        Ok(self.lookup(ContextRef::Concept(root))?.subsumers())
    }

    pub fn is_consistent(&self, root: ConceptId) -> Result<bool, ElError> {
        Ok(self.lookup(ContextRef::Concept(root))?.is_consistent())
    }

    /// Whether `conclusion` is stored in its destination context
    pub fn contains(&self, conclusion: &Conclusion) -> bool {
        self.lookup(conclusion.destination())
            .map_or(false, |context| context.contains(conclusion))
    }

    /// Contexts holding a backward link whose source is `root`
    pub fn successors(&self, root: ConceptId) -> impl Iterator<Item = ConceptId> + '_ {
        self.successors.get(&root).into_iter().flatten().copied()
    }

    /// All created concept contexts
    pub fn contexts(&self) -> impl Iterator<Item = &Context> {
        self.contexts.iter().flatten()
    }
}

pub struct SaturationResult {
    pub outcome: SaturationOutcome,
    pub state: SaturationState,
    pub stats: SaturationStatistics,
}

#[derive(Default)]
struct ContextSlot {
    context: Mutex<Option<Context>>,
    inbox: Mutex<Vec<Conclusion>>,
    scheduled: AtomicBool,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Saturation driver over one indexed ontology
pub struct Saturation {
    index: Arc<IndexedOntology>,
    checker: Arc<dyn DatatypeChecker>,
    config: SaturationConfig,
}

impl Saturation {
    pub fn new(index: Arc<IndexedOntology>, checker: Arc<dyn DatatypeChecker>, config: SaturationConfig) -> Self {
        Self { index, checker, config }
    }

    /// Saturate the contexts of `roots` and everything they reach
    ///
    /// Blocks until quiescence or cancellation. A rule failure aborts the run.
    pub fn saturate(&self, roots: &[ConceptId], cancel: &CancellationToken) -> Result<SaturationResult, ElError> {
        let start = Instant::now();
        let workers = self.config.num_workers.max(1);
        info!(roots = roots.len(), workers, "starting saturation");

        let (properties, property_inferences) = PropertyHierarchy::saturate(&self.index)?;
        debug!(chains = properties.len(), "property saturation finished");

        let slots: Vec<ContextSlot> = (0..self.index.concept_count()).map(|_| ContextSlot::default()).collect();
        let (sender, receiver) = crossbeam_channel::unbounded();

        let scheduler = Scheduler {
            env: RuleEnv {
                index: &self.index,
                properties: &properties,
                checker: self.checker.as_ref(),
            },
            slots: &slots,
            sender,
            cancel,
            poll_interval: self.config.poll_interval(),
            pending: AtomicUsize::new(0),
            aborted: AtomicBool::new(false),
            error: Mutex::new(None),
            activations: AtomicUsize::new(0),
            processed: AtomicUsize::new(0),
            inferences: AtomicUsize::new(property_inferences),
        };

        for &root in roots {
            if root.index() >= slots.len() {
                return Err(ElError::UnknownContext(ContextRef::Concept(root)));
            }
            scheduler.activate(root);
        }

        if workers == 1 {
            scheduler.run_worker(&receiver);
        } else {
            std::thread::scope(|scope| {
                for _ in 0..workers {
                    let receiver = receiver.clone();
                    let scheduler = &scheduler;
                    scope.spawn(move || scheduler.run_worker(&receiver));
                }
            });
        }

        let Scheduler {
            sender,
            pending,
            error,
            activations,
            processed,
            inferences,
            ..
        } = scheduler;
        drop(sender);
        if let Some(error) = error.into_inner().unwrap_or_else(PoisonError::into_inner) {
            return Err(error);
        }

        let mut complete = pending.load(Ordering::SeqCst) == 0;
        let mut contexts = Vec::with_capacity(slots.len());
        for slot in slots {
            let context = slot.context.into_inner().unwrap_or_else(PoisonError::into_inner);
            let inbox = slot.inbox.into_inner().unwrap_or_else(PoisonError::into_inner);
            if !inbox.is_empty() || context.as_ref().map_or(false, Context::has_pending) {
                complete = false;
            }
            contexts.push(context);
        }

        let mut successors: BTreeMap<ConceptId, BTreeSet<ConceptId>> = BTreeMap::new();
        for context in contexts.iter_mut().flatten() {
            if complete {
                context.set_saturated();
            }
            if let ContextRef::Concept(root) = context.root() {
                for (source, _) in context.backward_links() {
                    successors.entry(source).or_default().insert(root);
                }
            }
        }

        let outcome = if complete {
            SaturationOutcome::Completed
        } else {
            SaturationOutcome::Cancelled
        };
        let stats = SaturationStatistics {
            workers,
            property_contexts: properties.len(),
            contexts: contexts.iter().flatten().count(),
            activations: activations.into_inner(),
            conclusions_processed: processed.into_inner(),
            inferences: inferences.into_inner(),
            elapsed: start.elapsed(),
        };
        info!(
            ?outcome,
            contexts = stats.contexts,
            inferences = stats.inferences,
            elapsed_ms = stats.elapsed.as_millis() as u64,
            "saturation finished"
        );

        Ok(SaturationResult {
            outcome,
            state: SaturationState {
                index: Arc::clone(&self.index),
                properties,
                contexts,
                successors,
                complete,
            },
            stats,
        })
    }
}

struct Scheduler<'a> {
    env: RuleEnv<'a>,
    slots: &'a [ContextSlot],
    sender: Sender<ConceptId>,
    cancel: &'a CancellationToken,
    poll_interval: Duration,
    pending: AtomicUsize,
    aborted: AtomicBool,
    error: Mutex<Option<ElError>>,
    activations: AtomicUsize,
    processed: AtomicUsize,
    inferences: AtomicUsize,
}

impl Scheduler<'_> {
    fn should_stop(&self) -> bool {
        self.cancel.is_cancelled() || self.aborted.load(Ordering::SeqCst)
    }

    /// Schedule `root` unless it is already scheduled
    fn activate(&self, root: ConceptId) {
        let slot = &self.slots[root.index()];
        if slot
            .scheduled
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            self.pending.fetch_add(1, Ordering::SeqCst);
            self.activations.fetch_add(1, Ordering::Relaxed);
            if self.sender.send(root).is_err() {
                self.pending.fetch_sub(1, Ordering::SeqCst);
            }
        }
    }

    fn run_worker(&self, receiver: &Receiver<ConceptId>) {
        loop {
            if self.should_stop() || self.pending.load(Ordering::SeqCst) == 0 {
                break;
            }
            match receiver.recv_timeout(self.poll_interval) {
                Ok(root) => {
                    let result = self.process(root);
                    self.release(root);
                    if let Err(e) = result {
                        self.abort(e);
                    }
                    self.pending.fetch_sub(1, Ordering::SeqCst);
                }
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
    }

    /// Give up ownership; re-activate if conclusions arrived meanwhile
    fn release(&self, root: ConceptId) {
        let slot = &self.slots[root.index()];
        slot.scheduled.store(false, Ordering::SeqCst);
        if !lock(&slot.inbox).is_empty() && !self.should_stop() {
            self.activate(root);
        }
    }

    fn abort(&self, error: ElError) {
        self.aborted.store(true, Ordering::SeqCst);
        lock(&self.error).get_or_insert(error);
    }

    fn process(&self, root: ConceptId) -> Result<(), ElError> {
        let slot = &self.slots[root.index()];
        let mut guard = lock(&slot.context);
        let mut produced = Vec::new();

        if guard.is_none() {
            rules::initialize(&self.env, root, &mut produced)?;
        }
        let context = guard.get_or_insert_with(|| Context::new(ContextRef::Concept(root)));
        self.dispatch(root, context, &mut produced)?;

        let mut processed = 0;
        loop {
            if self.should_stop() {
                break;
            }
            let Some(conclusion) = context.take_next() else {
                let inbox = std::mem::take(&mut *lock(&slot.inbox));
                if inbox.is_empty() {
                    break;
                }
                for conclusion in inbox {
                    context.enqueue(conclusion);
                }
                continue;
            };

            processed += 1;
            if !context.add_conclusion(conclusion) {
                continue;
            }
            if context.is_consistent() || matches!(conclusion, Conclusion::Contradiction { .. }) {
                rules::apply(&self.env, context, conclusion, &mut produced)?;
            } else if let Conclusion::BackwardLink { root, source, property } = conclusion {
                rules::propagate_contradiction(root, source, property, &mut produced);
            }
            self.dispatch(root, context, &mut produced)?;
        }

        self.processed.fetch_add(processed, Ordering::Relaxed);
        debug!(context = %root, processed, consistent = context.is_consistent(), "context round finished");
        Ok(())
    }

    /// Route produced conclusions: local ones to the queue, others to inboxes
    fn dispatch(&self, root: ConceptId, context: &mut Context, produced: &mut Vec<Inference>) -> Result<(), ElError> {
        self.inferences.fetch_add(produced.len(), Ordering::Relaxed);
        for inference in produced.drain(..) {
            trace!(inference = %inference.labelled(self.env.index), "produced");
            let conclusion = inference.conclusion();
            match conclusion.destination() {
                ContextRef::Concept(target) if target == root => {
                    context.enqueue(conclusion);
                }
                ContextRef::Concept(target) => {
                    let slot = self
                        .slots
                        .get(target.index())
                        .ok_or(ElError::UnknownContext(ContextRef::Concept(target)))?;
                    lock(&slot.inbox).push(conclusion);
                    self.activate(target);
                }
                other => return Err(ElError::UnknownContext(other)),
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datatype::IntervalChecker;
    use fukurow_owl::model::{Axiom, ClassExpression as C, Ontology, OwlIri};

    fn saturate(ontology: &Ontology, workers: usize) -> SaturationResult {
        let index = Arc::new(IndexedOntology::build(ontology).unwrap());
        let roots: Vec<ConceptId> = index.named_classes().to_vec();
        let saturation = Saturation::new(
            index,
            Arc::new(IntervalChecker),
            SaturationConfig::default().with_workers(workers),
        );
        saturation.saturate(&roots, &CancellationToken::new()).unwrap()
    }

    fn class(state: &SaturationState, name: &str) -> ConceptId {
        state.index().class_id(&OwlIri::new(name)).unwrap()
    }

    #[test]
    fn test_told_subsumption_chain() {
        let ontology = Ontology::from_axioms(vec![
            Axiom::sub_class_of(C::named("A"), C::named("B")),
            Axiom::sub_class_of(C::named("B"), C::named("C")),
        ]);
        let result = saturate(&ontology, 1);
        assert_eq!(result.outcome, SaturationOutcome::Completed);

        let state = &result.state;
        let (a, b, c) = (class(state, "A"), class(state, "B"), class(state, "C"));
        let subsumers = state.subsumers(a).unwrap();
        assert!(subsumers.contains(&a) && subsumers.contains(&b) && subsumers.contains(&c));
        assert!(!state.subsumers(c).unwrap().contains(&a));
        assert!(state.context(a).unwrap().is_saturated());
    }

    #[test]
    fn test_existential_composition() {
        // A ⊑ ∃r.B, B ⊑ C, ∃r.C ⊑ D  ⟹  A ⊑ D
        let ontology = Ontology::from_axioms(vec![
            Axiom::sub_class_of(C::named("A"), C::some("r", C::named("B"))),
            Axiom::sub_class_of(C::named("B"), C::named("C")),
            Axiom::sub_class_of(C::some("r", C::named("C")), C::named("D")),
        ]);
        let result = saturate(&ontology, 2);
        let state = &result.state;
        assert!(state.subsumers(class(state, "A")).unwrap().contains(&class(state, "D")));
        assert_eq!(state.successors(class(state, "A")).collect::<Vec<_>>(), vec![class(state, "B")]);
    }

    #[test]
    fn test_sub_property_and_chain() {
        // hasPart ⊑ hasComponent, transitive hasComponent
        let ontology = Ontology::from_axioms(vec![
            Axiom::sub_property_of("hasPart", "hasComponent"),
            Axiom::TransitiveObjectProperty(OwlIri::new("hasComponent")),
            Axiom::sub_class_of(C::named("Car"), C::some("hasPart", C::named("Engine"))),
            Axiom::sub_class_of(C::named("Engine"), C::some("hasPart", C::named("Piston"))),
            Axiom::sub_class_of(C::some("hasComponent", C::named("Piston")), C::named("PistonMachine")),
        ]);
        let result = saturate(&ontology, 4);
        let state = &result.state;
        let machine = class(state, "PistonMachine");
        assert!(state.subsumers(class(state, "Engine")).unwrap().contains(&machine));
        assert!(state.subsumers(class(state, "Car")).unwrap().contains(&machine));
    }

    #[test]
    fn test_property_hierarchy_is_reflexive_transitive() {
        let ontology = Ontology::from_axioms(vec![
            Axiom::sub_property_of("r", "s"),
            Axiom::sub_property_of("s", "t"),
        ]);
        let index = IndexedOntology::build(&ontology).unwrap();
        let (hierarchy, _) = PropertyHierarchy::saturate(&index).unwrap();

        let id = |name: &str| index.chain_ids().find(|&c| index.chain_label(c) == name).unwrap();
        let (r, s, t) = (id("r"), id("s"), id("t"));
        assert!(hierarchy.is_sub_chain(r, r));
        assert!(hierarchy.is_sub_chain(r, t));
        assert!(!hierarchy.is_sub_chain(t, r));
        assert_eq!(hierarchy.super_chains(s).len(), 2);
    }

    #[test]
    fn test_pre_cancelled_run() {
        let ontology = Ontology::from_axioms(vec![Axiom::sub_class_of(C::named("A"), C::named("B"))]);
        let index = Arc::new(IndexedOntology::build(&ontology).unwrap());
        let roots = index.named_classes().to_vec();
        let saturation = Saturation::new(index, Arc::new(IntervalChecker), SaturationConfig::default());

        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = saturation.saturate(&roots, &cancel).unwrap();
        assert_eq!(result.outcome, SaturationOutcome::Cancelled);
        assert!(!result.state.is_complete());
        assert!(result.state.contexts().all(|c| !c.is_saturated()));
    }

    #[test]
    fn test_unknown_root() {
        let index = Arc::new(IndexedOntology::build(&Ontology::new()).unwrap());
        let saturation = Saturation::new(index, Arc::new(IntervalChecker), SaturationConfig::default());
        let result = saturation.saturate(&[ConceptId(99)], &CancellationToken::new());
        assert!(matches!(result, Err(ElError::UnknownContext(_))));
    }
}
