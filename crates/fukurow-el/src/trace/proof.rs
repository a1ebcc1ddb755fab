//! 証明グラフ

use super::{ConclusionVisitor, Tracer, TracingMode};
use crate::conclusion::Conclusion;
use crate::error::ElError;
use crate::index::{AxiomId, IndexedOntology};
use crate::inference::{Inference, Premise};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt::Write;

/// Conclusions reachable from a root together with the inferences deriving them
#[derive(Debug, Clone)]
pub struct InferenceGraph {
    root: Conclusion,
    conclusions: BTreeSet<Conclusion>,
    inferences: BTreeMap<Conclusion, BTreeSet<Inference>>,
}

impl InferenceGraph {
    pub fn new(root: Conclusion) -> Self {
        Self {
            root,
            conclusions: BTreeSet::new(),
            inferences: BTreeMap::new(),
        }
    }

    /// Recursive trace of `root`
    pub fn compute(tracer: &mut Tracer, root: Conclusion) -> Result<Self, ElError> {
        let mut graph = Self::new(root);
        tracer.trace(root, TracingMode::Recursive, &mut graph)?;
        Ok(graph)
    }

    pub fn root(&self) -> Conclusion {
        self.root
    }

    pub fn conclusions(&self) -> &BTreeSet<Conclusion> {
        &self.conclusions
    }

    pub fn inferences(&self, conclusion: &Conclusion) -> impl Iterator<Item = &Inference> {
        self.inferences.get(conclusion).into_iter().flatten()
    }

    pub fn inference_count(&self) -> usize {
        self.inferences.values().map(BTreeSet::len).sum()
    }

    pub fn contains(&self, conclusion: &Conclusion) -> bool {
        self.conclusions.contains(conclusion)
    }

    pub fn is_empty(&self) -> bool {
        self.conclusions.is_empty()
    }

    /// Axioms cited anywhere in the graph
    pub fn axioms(&self, index: &IndexedOntology) -> Result<BTreeSet<AxiomId>, ElError> {
        let mut axioms = BTreeSet::new();
        for inference in self.inferences.values().flatten() {
            for premise in inference.premises(index)? {
                if let Premise::Axiom(axiom) = premise {
                    axioms.insert(axiom);
                }
            }
        }
        Ok(axioms)
    }
}

impl ConclusionVisitor for InferenceGraph {
    fn visit_conclusion(&mut self, conclusion: &Conclusion) {
        self.conclusions.insert(*conclusion);
    }

    fn visit_inference(&mut self, inference: &Inference) {
        self.inferences
            .entry(inference.conclusion())
            .or_default()
            .insert(*inference);
    }
}

/// Render the graph as an indented tree; a repeated sub-proof is printed once
pub fn print_proof_tree(graph: &InferenceGraph, index: &IndexedOntology) -> Result<String, ElError> {
    let mut out = String::new();
    let mut printed = HashSet::new();
    write_conclusion(&mut out, graph, index, graph.root(), 0, &mut printed)?;
    Ok(out)
}

fn write_conclusion(
    out: &mut String,
    graph: &InferenceGraph,
    index: &IndexedOntology,
    conclusion: Conclusion,
    depth: usize,
    printed: &mut HashSet<Conclusion>,
) -> Result<(), ElError> {
    let indent = "  ".repeat(depth);
    if !printed.insert(conclusion) {
        let _ = writeln!(out, "{}{} (see above)", indent, conclusion.labelled(index));
        return Ok(());
    }
    let _ = writeln!(out, "{}{}", indent, conclusion.labelled(index));

    for inference in graph.inferences(&conclusion) {
        let _ = writeln!(out, "{}  ← {}", indent, inference.name());
        for premise in inference.premises(index)? {
            match premise {
                Premise::Conclusion(premise) if graph.contains(&premise) => {
                    write_conclusion(out, graph, index, premise, depth + 2, printed)?;
                }
                Premise::Conclusion(premise) => {
                    let _ = writeln!(out, "{}    {}", indent, premise.labelled(index));
                }
                Premise::Axiom(id) => {
                    let label = index.axiom(id).map_or_else(|| id.to_string(), ToString::to_string);
                    let _ = writeln!(out, "{}    {}", indent, label);
                }
            }
        }
    }
    Ok(())
}
