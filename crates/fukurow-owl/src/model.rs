//! OWL 2 EL データモデル

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Well-known vocabulary IRIs
pub mod vocabulary {
    pub const OWL_THING: &str = "http://www.w3.org/2002/07/owl#Thing";
    pub const OWL_NOTHING: &str = "http://www.w3.org/2002/07/owl#Nothing";
    pub const OWL: &str = "http://www.w3.org/2002/07/owl#";
    /// Facet pinning a data range to a single value (DataHasValue)
    pub const OWL_HAS_VALUE: &str = "http://www.w3.org/2002/07/owl#hasValue";
    pub const XSD: &str = "http://www.w3.org/2001/XMLSchema#";
    pub const XSD_INTEGER: &str = "http://www.w3.org/2001/XMLSchema#integer";
    pub const XSD_DECIMAL: &str = "http://www.w3.org/2001/XMLSchema#decimal";
    pub const XSD_NON_NEGATIVE_INTEGER: &str = "http://www.w3.org/2001/XMLSchema#nonNegativeInteger";
    pub const XSD_MIN_INCLUSIVE: &str = "http://www.w3.org/2001/XMLSchema#minInclusive";
    pub const XSD_MIN_EXCLUSIVE: &str = "http://www.w3.org/2001/XMLSchema#minExclusive";
    pub const XSD_MAX_INCLUSIVE: &str = "http://www.w3.org/2001/XMLSchema#maxInclusive";
    pub const XSD_MAX_EXCLUSIVE: &str = "http://www.w3.org/2001/XMLSchema#maxExclusive";
}

/// OWL IRI wrapper for type safety
#[derive(Debug, Clone, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwlIri(pub String);

impl OwlIri {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Local name after the last `#` or `/`
    pub fn short_form(&self) -> &str {
        self.0
            .rsplit(|c: char| c == '#' || c == '/')
            .next()
            .filter(|s| !s.is_empty())
            .unwrap_or(self.0.as_str())
    }
}

impl std::fmt::Display for OwlIri {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for OwlIri {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Facet restriction on a literal value, e.g. `xsd:minInclusive "5"`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FacetRestriction {
    pub facet: OwlIri,
    /// Lexical form of the restricting literal
    pub value: String,
}

/// Datatype restriction: datatype plus zero or more facets
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DataRange {
    pub datatype: OwlIri,
    #[serde(default)]
    pub facets: Vec<FacetRestriction>,
}

impl DataRange {
    pub fn new(datatype: impl Into<String>) -> Self {
        Self {
            datatype: OwlIri::new(datatype),
            facets: Vec::new(),
        }
    }

    pub fn with_facet(mut self, facet: impl Into<String>, value: impl ToString) -> Self {
        self.facets.push(FacetRestriction {
            facet: OwlIri::new(facet),
            value: value.to_string(),
        });
        self
    }
}

/// EL class expression
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClassExpression {
    /// Named class
    Named(OwlIri),

    /// owl:Thing (⊤)
    Thing,

    /// owl:Nothing (⊥)
    Nothing,

    /// Intersection of classes: C1 ⊓ C2 ⊓ ... ⊓ Cn
    IntersectionOf(Vec<ClassExpression>),

    /// Existential restriction: ∃R.C
    SomeValuesFrom {
        property: OwlIri,
        class: Box<ClassExpression>,
    },

    /// Data existential restriction: ∃P.D
    DataSomeValuesFrom {
        property: OwlIri,
        range: DataRange,
    },
}

impl ClassExpression {
    pub fn named(iri: impl Into<String>) -> Self {
        Self::Named(OwlIri::new(iri))
    }

    pub fn and(conjuncts: Vec<ClassExpression>) -> Self {
        Self::IntersectionOf(conjuncts)
    }

    pub fn some(property: impl Into<String>, class: ClassExpression) -> Self {
        Self::SomeValuesFrom {
            property: OwlIri::new(property),
            class: Box::new(class),
        }
    }

    pub fn data_some(property: impl Into<String>, range: DataRange) -> Self {
        Self::DataSomeValuesFrom {
            property: OwlIri::new(property),
            range,
        }
    }

    /// Whether this expression is a single named entity (incl. ⊤ / ⊥)
    pub fn is_atomic(&self) -> bool {
        matches!(self, Self::Named(_) | Self::Thing | Self::Nothing)
    }

    fn collect_signature(&self, signature: &mut Signature) {
        match self {
            Self::Named(iri) => {
                signature.classes.insert(iri.clone());
            }
            Self::Thing | Self::Nothing => {}
            Self::IntersectionOf(conjuncts) => {
                for conjunct in conjuncts {
                    conjunct.collect_signature(signature);
                }
            }
            Self::SomeValuesFrom { property, class } => {
                signature.object_properties.insert(property.clone());
                class.collect_signature(signature);
            }
            Self::DataSomeValuesFrom { property, .. } => {
                signature.data_properties.insert(property.clone());
            }
        }
    }
}

impl std::fmt::Display for ClassExpression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Named(iri) => write!(f, "{}", iri.short_form()),
            Self::Thing => write!(f, "⊤"),
            Self::Nothing => write!(f, "⊥"),
            Self::IntersectionOf(conjuncts) => {
                write!(f, "(")?;
                for (i, conjunct) in conjuncts.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ⊓ ")?;
                    }
                    write!(f, "{}", conjunct)?;
                }
                write!(f, ")")
            }
            Self::SomeValuesFrom { property, class } => {
                write!(f, "∃{}.{}", property.short_form(), class)
            }
            Self::DataSomeValuesFrom { property, range } => {
                write!(f, "∃{}.{}", property.short_form(), range.datatype.short_form())?;
                if !range.facets.is_empty() {
                    write!(f, "[")?;
                    for (i, facet) in range.facets.iter().enumerate() {
                        if i > 0 {
                            write!(f, ", ")?;
                        }
                        write!(f, "{} {}", facet.facet.short_form(), facet.value)?;
                    }
                    write!(f, "]")?;
                }
                Ok(())
            }
        }
    }
}

/// OWL 2 EL axiom
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Axiom {
    /// Declaration(Class(C))
    DeclareClass(OwlIri),

    /// SubClassOf(C1 C2)
    SubClassOf(ClassExpression, ClassExpression),

    /// EquivalentClasses(C1 ... Cn)
    EquivalentClasses(Vec<ClassExpression>),

    /// DisjointClasses(C1 ... Cn)
    DisjointClasses(Vec<ClassExpression>),

    /// SubObjectPropertyOf(ObjectPropertyChain(R1 ... Rn) S); a chain of length one is a plain sub-property axiom
    SubObjectPropertyOf { chain: Vec<OwlIri>, sup: OwlIri },

    /// EquivalentObjectProperties(R1 ... Rn)
    EquivalentObjectProperties(Vec<OwlIri>),

    /// TransitiveObjectProperty(R)
    TransitiveObjectProperty(OwlIri),

    /// ObjectPropertyDomain(R C)
    ObjectPropertyDomain(OwlIri, ClassExpression),

    /// FunctionalDataProperty(P)
    FunctionalDataProperty(OwlIri),

    /// AsymmetricObjectProperty(R); outside EL, skipped by the indexer
    AsymmetricObjectProperty(OwlIri),
}

impl Axiom {
    pub fn sub_class_of(sub: ClassExpression, sup: ClassExpression) -> Self {
        Self::SubClassOf(sub, sup)
    }

    pub fn sub_property_of(sub: impl Into<String>, sup: impl Into<String>) -> Self {
        Self::SubObjectPropertyOf {
            chain: vec![OwlIri::new(sub)],
            sup: OwlIri::new(sup),
        }
    }

    /// Whether the axiom belongs to the fragment handled by the EL reasoner
    pub fn is_el(&self) -> bool {
        !matches!(self, Self::AsymmetricObjectProperty(_))
    }
}

impl std::fmt::Display for Axiom {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        fn join<T: std::fmt::Display>(items: &[T], sep: &str) -> String {
            items.iter().map(|i| i.to_string()).collect::<Vec<_>>().join(sep)
        }

        match self {
            Self::DeclareClass(iri) => write!(f, "Declaration(Class({}))", iri.short_form()),
            Self::SubClassOf(sub, sup) => write!(f, "SubClassOf({} {})", sub, sup),
            Self::EquivalentClasses(classes) => write!(f, "EquivalentClasses({})", join(classes, " ")),
            Self::DisjointClasses(classes) => write!(f, "DisjointClasses({})", join(classes, " ")),
            Self::SubObjectPropertyOf { chain, sup } => {
                let chain: Vec<&str> = chain.iter().map(|p| p.short_form()).collect();
                if chain.len() == 1 {
                    write!(f, "SubObjectPropertyOf({} {})", chain[0], sup.short_form())
                } else {
                    write!(f, "SubObjectPropertyOf(ObjectPropertyChain({}) {})", chain.join(" "), sup.short_form())
                }
            }
            Self::EquivalentObjectProperties(properties) => {
                let names: Vec<&str> = properties.iter().map(|p| p.short_form()).collect();
                write!(f, "EquivalentObjectProperties({})", names.join(" "))
            }
            Self::TransitiveObjectProperty(p) => write!(f, "TransitiveObjectProperty({})", p.short_form()),
            Self::ObjectPropertyDomain(p, c) => write!(f, "ObjectPropertyDomain({} {})", p.short_form(), c),
            Self::FunctionalDataProperty(p) => write!(f, "FunctionalDataProperty({})", p.short_form()),
            Self::AsymmetricObjectProperty(p) => write!(f, "AsymmetricObjectProperty({})", p.short_form()),
        }
    }
}

#[derive(Default)]
struct Signature {
    classes: HashSet<OwlIri>,
    object_properties: HashSet<OwlIri>,
    data_properties: HashSet<OwlIri>,
}

/// OWL 2 EL Ontology
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Ontology {
    /// Ontology IRI
    pub iri: Option<OwlIri>,

    /// All axioms in the ontology
    pub axioms: Vec<Axiom>,

    /// All classes mentioned in the ontology
    #[serde(default)]
    pub classes: HashSet<OwlIri>,

    /// All object properties mentioned in the ontology
    #[serde(default)]
    pub object_properties: HashSet<OwlIri>,

    /// All data properties mentioned in the ontology
    #[serde(default)]
    pub data_properties: HashSet<OwlIri>,
}

impl Ontology {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_iri(iri: OwlIri) -> Self {
        Self {
            iri: Some(iri),
            ..Self::default()
        }
    }

    pub fn from_axioms(axioms: impl IntoIterator<Item = Axiom>) -> Self {
        let mut ontology = Self::new();
        for axiom in axioms {
            ontology.add_axiom(axiom);
        }
        ontology
    }

    pub fn add_axiom(&mut self, axiom: Axiom) {
        let mut signature = Signature::default();

        // Extract classes and properties from the axiom
        match &axiom {
            Axiom::DeclareClass(iri) => {
                signature.classes.insert(iri.clone());
            }
            Axiom::SubClassOf(c1, c2) => {
                c1.collect_signature(&mut signature);
                c2.collect_signature(&mut signature);
            }
            Axiom::EquivalentClasses(classes) | Axiom::DisjointClasses(classes) => {
                for class in classes {
                    class.collect_signature(&mut signature);
                }
            }
            Axiom::SubObjectPropertyOf { chain, sup } => {
                signature.object_properties.extend(chain.iter().cloned());
                signature.object_properties.insert(sup.clone());
            }
            Axiom::EquivalentObjectProperties(properties) => {
                signature.object_properties.extend(properties.iter().cloned());
            }
            Axiom::TransitiveObjectProperty(p) | Axiom::AsymmetricObjectProperty(p) => {
                signature.object_properties.insert(p.clone());
            }
            Axiom::ObjectPropertyDomain(p, c) => {
                signature.object_properties.insert(p.clone());
                c.collect_signature(&mut signature);
            }
            Axiom::FunctionalDataProperty(p) => {
                signature.data_properties.insert(p.clone());
            }
        }

        self.classes.extend(signature.classes);
        self.object_properties.extend(signature.object_properties);
        self.data_properties.extend(signature.data_properties);
        self.axioms.push(axiom);
    }

    /// Recompute the signature sets from the axioms
    pub fn rebuild_signature(&mut self) {
        let axioms = std::mem::take(&mut self.axioms);
        self.classes.clear();
        self.object_properties.clear();
        self.data_properties.clear();
        for axiom in axioms {
            self.add_axiom(axiom);
        }
    }
}
