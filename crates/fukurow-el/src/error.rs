//! エラー型

use crate::conclusion::ContextRef;
use crate::index::{ChainId, ConceptId};
use fukurow_owl::OwlError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ElError {
    /// An indexed expression lacks the structure a rule or inference expects
    #[error("Malformed index at concept {concept}: {detail}")]
    MalformedIndex { concept: ConceptId, detail: String },

    #[error("Malformed index at property chain {chain}: {detail}")]
    MalformedChain { chain: ChainId, detail: String },

    /// A fatal error raised while applying a rule, with the rule application attached
    #[error("Rule {rule} failed in context {context} on {conclusion}: {source}")]
    RuleFailure {
        rule: &'static str,
        context: ContextRef,
        conclusion: String,
        #[source]
        source: Box<ElError>,
    },

    #[error("Unknown entity: {0}")]
    UnknownEntity(String),

    #[error("Unknown context: {0}")]
    UnknownContext(ContextRef),

    #[error("Context {0} is not saturated")]
    NotSaturated(ContextRef),

    #[error("Saturation was cancelled")]
    Cancelled,

    #[error("Ontology error: {0}")]
    Owl(#[from] OwlError),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ElError {
    pub(crate) fn malformed(concept: ConceptId, detail: impl Into<String>) -> Self {
        Self::MalformedIndex {
            concept,
            detail: detail.into(),
        }
    }

    /// Whether the error indicates a defect in the indexed input rather than a usage error
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::MalformedIndex { .. } | Self::MalformedChain { .. } => true,
            Self::RuleFailure { source, .. } => source.is_fatal(),
            _ => false,
        }
    }
}
