//! OWLオントロジーローダー

use crate::model::{Axiom, ClassExpression, Ontology};
use crate::OwlError;
use std::path::Path;
use tracing::debug;

/// Ontology loader trait
pub trait OntologyLoader {
    fn load_from_str(&self, input: &str) -> Result<Ontology, OwlError>;

    fn load_from_path(&self, path: &Path) -> Result<Ontology, OwlError> {
        let input = std::fs::read_to_string(path)
            .map_err(|e| OwlError::LoaderError(format!("{}: {}", path.display(), e)))?;
        self.load_from_str(&input)
    }
}

/// JSON ontology loader (serde representation of [`Ontology`])
///
/// The signature sets may be omitted in the input; they are recomputed from
/// the axioms after loading.
pub struct JsonOntologyLoader;

impl OntologyLoader for JsonOntologyLoader {
    fn load_from_str(&self, input: &str) -> Result<Ontology, OwlError> {
        let mut ontology: Ontology = serde_json::from_str(input)?;
        for axiom in &ontology.axioms {
            validate_axiom(axiom)?;
        }
        ontology.rebuild_signature();

        debug!(
            axioms = ontology.axioms.len(),
            classes = ontology.classes.len(),
            "loaded ontology"
        );
        Ok(ontology)
    }
}

/// Reject structurally empty constructs that have no EL reading
pub fn validate_axiom(axiom: &Axiom) -> Result<(), OwlError> {
    match axiom {
        Axiom::SubClassOf(sub, sup) => {
            validate_expression(sub)?;
            validate_expression(sup)
        }
        Axiom::EquivalentClasses(classes) | Axiom::DisjointClasses(classes) => {
            if classes.len() < 2 {
                return Err(OwlError::InvalidAxiom(format!(
                    "{} needs at least two operands",
                    axiom
                )));
            }
            classes.iter().try_for_each(validate_expression)
        }
        Axiom::SubObjectPropertyOf { chain, .. } if chain.is_empty() => Err(
            OwlError::InvalidAxiom("empty object property chain".to_string()),
        ),
        Axiom::EquivalentObjectProperties(properties) if properties.len() < 2 => Err(
            OwlError::InvalidAxiom(format!("{} needs at least two operands", axiom)),
        ),
        Axiom::ObjectPropertyDomain(_, class) => validate_expression(class),
        _ => Ok(()),
    }
}

pub fn validate_expression(expression: &ClassExpression) -> Result<(), OwlError> {
    match expression {
        ClassExpression::IntersectionOf(conjuncts) => {
            if conjuncts.is_empty() {
                return Err(OwlError::InvalidAxiom("empty intersection".to_string()));
            }
            conjuncts.iter().try_for_each(validate_expression)
        }
        ClassExpression::SomeValuesFrom { class, .. } => validate_expression(class),
        _ => Ok(()),
    }
}
