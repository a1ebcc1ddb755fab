//! OWL 2 EL オントロジーモデル
//!
//! このクレートは EL 推論エンジンの入力を提供します:
//! - IRI・クラス式・公理のデータモデル
//! - JSON オントロジーローダー
//! - 公理の構造検証

pub mod model;
pub mod loader;

pub use model::{Axiom, ClassExpression, DataRange, FacetRestriction, Ontology, OwlIri};
pub use loader::{JsonOntologyLoader, OntologyLoader};

// Error types
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OwlError {
    #[error("Loader error: {0}")]
    LoaderError(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid axiom: {0}")]
    InvalidAxiom(String),

    #[error("Unsupported feature: {0}")]
    UnsupportedFeature(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    mod model_tests {
        use super::*;
        use crate::model::vocabulary;

        #[test]
        fn test_short_form() {
            assert_eq!(OwlIri::new("http://example.org/onto#Person").short_form(), "Person");
            assert_eq!(OwlIri::new("http://example.org/Person").short_form(), "Person");
            assert_eq!(OwlIri::new("Person").short_form(), "Person");
            assert_eq!(OwlIri::new("http://example.org/").short_form(), "http://example.org/");
            assert_eq!(OwlIri::new(vocabulary::OWL_THING).short_form(), "Thing");
        }

        #[test]
        fn test_signature_collection() {
            let ontology = Ontology::from_axioms(vec![
                Axiom::sub_class_of(
                    ClassExpression::named("A"),
                    ClassExpression::some("r", ClassExpression::named("B")),
                ),
                Axiom::sub_property_of("r", "s"),
                Axiom::FunctionalDataProperty(OwlIri::new("age")),
            ]);

            assert_eq!(ontology.axioms.len(), 3);
            assert!(ontology.classes.contains(&OwlIri::new("A")));
            assert!(ontology.classes.contains(&OwlIri::new("B")));
            assert!(ontology.object_properties.contains(&OwlIri::new("r")));
            assert!(ontology.object_properties.contains(&OwlIri::new("s")));
            assert!(ontology.data_properties.contains(&OwlIri::new("age")));
        }

        #[test]
        fn test_display() {
            let expr = ClassExpression::and(vec![
                ClassExpression::named("http://ex.org#A"),
                ClassExpression::some("http://ex.org#r", ClassExpression::Thing),
            ]);
            assert_eq!(expr.to_string(), "(A ⊓ ∃r.⊤)");

            let axiom = Axiom::SubObjectPropertyOf {
                chain: vec![OwlIri::new("r"), OwlIri::new("s")],
                sup: OwlIri::new("t"),
            };
            assert_eq!(axiom.to_string(), "SubObjectPropertyOf(ObjectPropertyChain(r s) t)");
        }

        #[test]
        fn test_is_el() {
            assert!(Axiom::TransitiveObjectProperty(OwlIri::new("r")).is_el());
            assert!(!Axiom::AsymmetricObjectProperty(OwlIri::new("r")).is_el());
        }
    }

    mod loader_tests {
        use super::*;
        use std::io::Write;

        #[test]
        fn test_load_empty_ontology() {
            let ontology = JsonOntologyLoader.load_from_str(r#"{"iri": null, "axioms": []}"#).unwrap();

            assert!(ontology.classes.is_empty());
            assert!(ontology.axioms.is_empty());
        }

        #[test]
        fn test_load_rebuilds_signature() {
            let input = r#"{
                "iri": "http://example.org/onto",
                "axioms": [
                    {"SubClassOf": [{"Named": "Student"}, {"Named": "Person"}]},
                    {"DisjointClasses": [{"Named": "Person"}, "Nothing"]},
                    {"TransitiveObjectProperty": "partOf"}
                ]
            }"#;
            let ontology = JsonOntologyLoader.load_from_str(input).unwrap();

            assert_eq!(ontology.iri, Some(OwlIri::new("http://example.org/onto")));
            assert_eq!(ontology.axioms.len(), 3);
            assert!(ontology.classes.contains(&OwlIri::new("Student")));
            assert!(ontology.classes.contains(&OwlIri::new("Person")));
            assert!(ontology.object_properties.contains(&OwlIri::new("partOf")));
        }

        #[test]
        fn test_load_rejects_empty_intersection() {
            let input = r#"{"iri": null, "axioms": [{"SubClassOf": [{"IntersectionOf": []}, "Thing"]}]}"#;
            let result = JsonOntologyLoader.load_from_str(input);
            assert!(matches!(result, Err(OwlError::InvalidAxiom(_))));
        }

        #[test]
        fn test_load_rejects_empty_chain() {
            let input = r#"{"iri": null, "axioms": [{"SubObjectPropertyOf": {"chain": [], "sup": "r"}}]}"#;
            let result = JsonOntologyLoader.load_from_str(input);
            assert!(matches!(result, Err(OwlError::InvalidAxiom(_))));
        }

        #[test]
        fn test_load_invalid_json() {
            let result = JsonOntologyLoader.load_from_str("{not json");
            assert!(matches!(result, Err(OwlError::Json(_))));
        }

        #[test]
        fn test_load_from_path() {
            let ontology = Ontology::from_axioms(vec![Axiom::sub_class_of(
                ClassExpression::named("A"),
                ClassExpression::named("B"),
            )]);
            let mut file = tempfile::NamedTempFile::new().unwrap();
            write!(file, "{}", serde_json::to_string(&ontology).unwrap()).unwrap();

            let loaded = JsonOntologyLoader.load_from_path(file.path()).unwrap();
            assert_eq!(loaded.axioms, ontology.axioms);
            assert_eq!(loaded.classes, ontology.classes);
        }

        #[test]
        fn test_load_missing_file() {
            let result = JsonOntologyLoader.load_from_path(std::path::Path::new("/nonexistent/onto.json"));
            assert!(matches!(result, Err(OwlError::LoaderError(_))));
        }
    }
}
