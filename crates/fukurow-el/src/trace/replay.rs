//! 飽和済みコンテキストの再生

use crate::conclusion::{Conclusion, ContextRef};
use crate::datatype::DatatypeChecker;
use crate::error::ElError;
use crate::inference::Inference;
use crate::rules::{self, RuleEnv};
use crate::saturation::SaturationState;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Inferences of one origin context, grouped by their conclusion
#[derive(Debug, Clone, Default)]
pub struct ContextTrace {
    origin: Option<ContextRef>,
    inferences: BTreeMap<Conclusion, BTreeSet<Inference>>,
}

impl ContextTrace {
    pub fn origin(&self) -> Option<ContextRef> {
        self.origin
    }

    pub fn inferences(&self, conclusion: &Conclusion) -> impl Iterator<Item = &Inference> {
        self.inferences.get(conclusion).into_iter().flatten()
    }

    pub fn len(&self) -> usize {
        self.inferences.values().map(BTreeSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.inferences.is_empty()
    }
}

/// Re-run the rules over the stored conclusions of a saturated context
///
/// Nothing is written back; inferences whose conclusion was never stored
/// (work dropped after a contradiction) are discarded.
pub fn replay(
    state: &SaturationState,
    checker: &dyn DatatypeChecker,
    origin: ContextRef,
) -> Result<ContextTrace, ElError> {
    let context = state.saturated(origin)?;
    let index = state.index();
    let mut produced: Vec<Inference> = Vec::new();

    match origin {
        ContextRef::Concept(root) => {
            let env = RuleEnv {
                index,
                properties: state.properties(),
                checker,
            };
            rules::initialize(&env, root, &mut produced)?;
            for conclusion in context.conclusions() {
                rules::apply(&env, context, conclusion, &mut produced)?;
            }
        }
        ContextRef::Chain(chain) => {
            rules::initialize_chain(chain, &mut produced);
            for conclusion in context.conclusions() {
                if let Conclusion::SubPropertyChain { sub, sup } = conclusion {
                    rules::apply_property_rule(index, sub, sup, &mut produced)?;
                }
            }
        }
    }

    let mut trace = ContextTrace {
        origin: Some(origin),
        inferences: BTreeMap::new(),
    };
    for inference in produced {
        let conclusion = inference.conclusion();
        if state.contains(&conclusion) {
            trace.inferences.entry(conclusion).or_default().insert(inference);
        }
    }
    debug!(context = %origin, inferences = trace.len(), "replayed context");
    Ok(trace)
}
