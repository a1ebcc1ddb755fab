//! OWL 2 EL 飽和推論エンジン
//!
//! このクレートは結果ベースの EL 推論を提供します:
//! - 公理のインデックス化と正規化
//! - コンテキスト単位の並列飽和
//! - 矛盾検出と分類階層の構築
//! - 推論の再生による説明 (トレース)

pub mod conclusion;
pub mod config;
pub mod context;
pub mod datatype;
pub mod error;
pub mod index;
pub mod inference;
pub mod reasoner;
pub mod rules;
pub mod saturation;
pub mod taxonomy;
pub mod trace;

pub use conclusion::{Conclusion, ContextRef};
pub use config::{ReasonerConfig, SaturationConfig, TracingConfig};
pub use context::Context;
pub use datatype::{DatatypeChecker, DatatypeRestriction, IntervalChecker};
pub use error::ElError;
pub use index::{AxiomId, ChainId, ConceptId, DataPropertyId, IndexedOntology};
pub use inference::{Inference, Premise};
pub use reasoner::Reasoner;
pub use saturation::{
    CancellationToken, Saturation, SaturationOutcome, SaturationResult, SaturationState, SaturationStatistics,
};
pub use taxonomy::{NodeId, NodeKind, Taxonomy, TaxonomyNode};
pub use trace::{print_proof_tree, ConclusionVisitor, InferenceGraph, TraceSummary, Tracer, TracingMode};

pub use fukurow_owl::{Axiom, ClassExpression, Ontology, OwlError, OwlIri};
