//! 公理の索引化
//!
//! Axioms are normalised once into an immutable arena of concepts and
//! property chains. Structurally equal expressions share one id.

use crate::datatype::{parse_range, DatatypeRestriction};
use crate::error::ElError;
use fukurow_owl::model::{vocabulary, Axiom, ClassExpression, DataRange, Ontology, OwlIri};
use fukurow_owl::OwlError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, warn};

macro_rules! arena_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub u32);

        impl $name {
            pub fn index(self) -> usize {
                self.0 as usize
            }

            fn from_index(index: usize) -> Self {
                Self(index as u32)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "{}"), self.0)
            }
        }
    };
}

arena_id!(
    /// Indexed class expression
    ConceptId,
    "c"
);
arena_id!(
    /// Indexed object property or binary property composition
    ChainId,
    "p"
);
arena_id!(
    /// Indexed data property
    DataPropertyId,
    "d"
);
arena_id!(
    /// Position of an axiom in the source ontology
    AxiomId,
    "ax"
);

/// Structure of an indexed concept
#[derive(Debug, Clone, PartialEq)]
pub enum ConceptKind {
    Named(OwlIri),
    Top,
    Bottom,
    Conjunction(ConceptId, ConceptId),
    Existential {
        property: ChainId,
        filler: ConceptId,
    },
    DataRestriction {
        property: DataPropertyId,
        range: DataRange,
        restrictions: Vec<DatatypeRestriction>,
    },
}

#[derive(Debug, Clone)]
pub struct IndexedConcept {
    kind: ConceptKind,
    negative: bool,
    told_supers: Vec<(ConceptId, AxiomId)>,
    negative_conjunctions: Vec<ConceptId>,
    negative_existentials: Vec<ConceptId>,
    disjoint_positions: Vec<(AxiomId, u32)>,
}

impl IndexedConcept {
    fn new(kind: ConceptKind) -> Self {
        Self {
            kind,
            negative: false,
            told_supers: Vec::new(),
            negative_conjunctions: Vec::new(),
            negative_existentials: Vec::new(),
            disjoint_positions: Vec::new(),
        }
    }

    pub fn kind(&self) -> &ConceptKind {
        &self.kind
    }

    /// Whether the concept occurs on the left-hand side of some axiom
    pub fn occurs_negatively(&self) -> bool {
        self.negative
    }

    /// Told super-concepts with the axiom they come from
    pub fn told_supers(&self) -> &[(ConceptId, AxiomId)] {
        &self.told_supers
    }

    /// Negatively occurring conjunctions that have this concept as a conjunct
    pub fn negative_conjunctions(&self) -> &[ConceptId] {
        &self.negative_conjunctions
    }

    /// Negatively occurring existentials with this concept as filler
    pub fn negative_existentials(&self) -> &[ConceptId] {
        &self.negative_existentials
    }

    /// Disjointness axioms this concept is a member of, with its position
    pub fn disjoint_positions(&self) -> &[(AxiomId, u32)] {
        &self.disjoint_positions
    }
}

/// Structure of an indexed property chain
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ChainKind {
    Property(OwlIri),
    /// Fresh property introduced when splitting a long chain
    Auxiliary(u32),
    Composition {
        left: ChainId,
        right: ChainId,
    },
}

#[derive(Debug, Clone)]
pub struct IndexedPropertyChain {
    kind: ChainKind,
    told_supers: Vec<(ChainId, AxiomId)>,
    left_compositions: Vec<ChainId>,
    right_compositions: Vec<ChainId>,
    negative_existentials: Vec<ConceptId>,
}

impl IndexedPropertyChain {
    fn new(kind: ChainKind) -> Self {
        Self {
            kind,
            told_supers: Vec::new(),
            left_compositions: Vec::new(),
            right_compositions: Vec::new(),
            negative_existentials: Vec::new(),
        }
    }

    pub fn kind(&self) -> &ChainKind {
        &self.kind
    }

    pub fn is_composition(&self) -> bool {
        matches!(self.kind, ChainKind::Composition { .. })
    }

    pub fn told_supers(&self) -> &[(ChainId, AxiomId)] {
        &self.told_supers
    }

    /// Compositions with this property as left component
    pub fn left_compositions(&self) -> &[ChainId] {
        &self.left_compositions
    }

    /// Compositions with this property as right component
    pub fn right_compositions(&self) -> &[ChainId] {
        &self.right_compositions
    }

    /// Negatively occurring existentials over this property
    pub fn negative_existentials(&self) -> &[ConceptId] {
        &self.negative_existentials
    }
}

#[derive(Debug, Clone)]
pub struct IndexedDataProperty {
    iri: OwlIri,
    functional: Option<AxiomId>,
    restrictions: Vec<ConceptId>,
    negative_restrictions: Vec<ConceptId>,
}

impl IndexedDataProperty {
    pub fn iri(&self) -> &OwlIri {
        &self.iri
    }

    /// The axiom declaring the property functional, if any
    pub fn functional(&self) -> Option<AxiomId> {
        self.functional
    }

    pub fn restrictions(&self) -> &[ConceptId] {
        &self.restrictions
    }

    pub fn negative_restrictions(&self) -> &[ConceptId] {
        &self.negative_restrictions
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexStatistics {
    pub concepts: usize,
    pub chains: usize,
    pub data_properties: usize,
    pub axioms: usize,
    pub skipped_axioms: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum ConceptKey {
    Named(OwlIri),
    Top,
    Bottom,
    Conjunction(ConceptId, ConceptId),
    Existential(ChainId, ConceptId),
    DataRestriction(DataPropertyId, DataRange),
}

/// Read-only normalised ontology shared by all workers
#[derive(Debug, Clone)]
pub struct IndexedOntology {
    concepts: Vec<IndexedConcept>,
    concept_ids: HashMap<ConceptKey, ConceptId>,
    chains: Vec<IndexedPropertyChain>,
    chain_ids: HashMap<ChainKind, ChainId>,
    data_properties: Vec<IndexedDataProperty>,
    data_property_ids: HashMap<OwlIri, DataPropertyId>,
    axioms: Vec<Axiom>,
    disjointness: HashMap<AxiomId, Vec<ConceptId>>,
    named: Vec<ConceptId>,
    queries: Vec<ConceptId>,
    auxiliaries: u32,
    skipped: usize,
}

impl IndexedOntology {
    /// Index all axioms of `ontology`
    pub fn build(ontology: &Ontology) -> Result<Self, ElError> {
        Self::build_with_queries(ontology, &[])
    }

    /// Index `ontology` together with anonymous query expressions
    ///
    /// Query expressions are indexed with both polarities so that they can be
    /// classified like named classes.
    pub fn build_with_queries(ontology: &Ontology, queries: &[ClassExpression]) -> Result<Self, ElError> {
        let mut index = Self {
            concepts: Vec::new(),
            concept_ids: HashMap::new(),
            chains: Vec::new(),
            chain_ids: HashMap::new(),
            data_properties: Vec::new(),
            data_property_ids: HashMap::new(),
            axioms: ontology.axioms.clone(),
            disjointness: HashMap::new(),
            named: Vec::new(),
            queries: Vec::new(),
            auxiliaries: 0,
            skipped: 0,
        };

        // ⊤ and ⊥ always exist, in this order
        index.intern(ConceptKey::Top, ConceptKind::Top);
        index.intern(ConceptKey::Bottom, ConceptKind::Bottom);

        let mut classes: Vec<&OwlIri> = ontology.classes.iter().collect();
        classes.sort();
        for iri in classes {
            index.index_expression(&ClassExpression::Named(iri.clone()), false)?;
        }

        for (position, axiom) in ontology.axioms.iter().enumerate() {
            let id = AxiomId::from_index(position);
            if !axiom.is_el() {
                warn!(axiom = %axiom, "skipping axiom outside the EL fragment");
                index.skipped += 1;
                continue;
            }
            match index.index_axiom(id, axiom) {
                Ok(()) => {}
                Err(ElError::Owl(OwlError::UnsupportedFeature(feature))) => {
                    warn!(axiom = %axiom, %feature, "skipping axiom with unsupported feature");
                    index.skipped += 1;
                }
                Err(e) => return Err(e),
            }
        }

        for query in queries {
            let id = index.index_expression(query, true)?;
            if !index.queries.contains(&id) {
                index.queries.push(id);
            }
        }

        debug!(
            concepts = index.concepts.len(),
            chains = index.chains.len(),
            skipped = index.skipped,
            "indexed ontology"
        );
        Ok(index)
    }

    fn index_axiom(&mut self, id: AxiomId, axiom: &Axiom) -> Result<(), ElError> {
        match axiom {
            Axiom::DeclareClass(iri) => {
                self.index_expression(&ClassExpression::Named(iri.clone()), false)?;
            }
            Axiom::SubClassOf(sub, sup) => {
                let sub = self.index_expression(sub, true)?;
                let sup = self.index_expression(sup, false)?;
                self.concepts[sub.index()].told_supers.push((sup, id));
            }
            Axiom::EquivalentClasses(classes) => {
                let members = classes
                    .iter()
                    .map(|c| self.index_expression(c, true))
                    .collect::<Result<Vec<_>, _>>()?;
                for (i, &first) in members.iter().enumerate() {
                    for &second in &members[i + 1..] {
                        self.concepts[first.index()].told_supers.push((second, id));
                        self.concepts[second.index()].told_supers.push((first, id));
                    }
                }
            }
            Axiom::DisjointClasses(classes) => {
                let members = classes
                    .iter()
                    .map(|c| self.index_expression(c, true))
                    .collect::<Result<Vec<_>, _>>()?;
                for (position, member) in members.iter().enumerate() {
                    self.concepts[member.index()]
                        .disjoint_positions
                        .push((id, position as u32));
                }
                self.disjointness.insert(id, members);
            }
            Axiom::SubObjectPropertyOf { chain, sup } => {
                let sup = self.intern_chain(ChainKind::Property(sup.clone()));
                self.index_property_chain(id, chain, sup)?;
            }
            Axiom::EquivalentObjectProperties(properties) => {
                let members: Vec<ChainId> = properties
                    .iter()
                    .map(|p| self.intern_chain(ChainKind::Property(p.clone())))
                    .collect();
                for (i, &first) in members.iter().enumerate() {
                    for &second in &members[i + 1..] {
                        self.chains[first.index()].told_supers.push((second, id));
                        self.chains[second.index()].told_supers.push((first, id));
                    }
                }
            }
            Axiom::TransitiveObjectProperty(property) => {
                let property = self.intern_chain(ChainKind::Property(property.clone()));
                let composition = self.intern_composition(property, property);
                self.chains[composition.index()].told_supers.push((property, id));
            }
            Axiom::ObjectPropertyDomain(property, class) => {
                let domain = ClassExpression::SomeValuesFrom {
                    property: property.clone(),
                    class: Box::new(ClassExpression::Thing),
                };
                let sub = self.index_expression(&domain, true)?;
                let sup = self.index_expression(class, false)?;
                self.concepts[sub.index()].told_supers.push((sup, id));
            }
            Axiom::FunctionalDataProperty(property) => {
                let property = self.intern_data_property(property);
                self.data_properties[property.index()].functional.get_or_insert(id);
            }
            Axiom::AsymmetricObjectProperty(_) => {}
        }
        Ok(())
    }

    /// R1 ∘ ... ∘ Rn ⊑ S, split right-nested into binary compositions
    fn index_property_chain(&mut self, id: AxiomId, chain: &[OwlIri], sup: ChainId) -> Result<(), ElError> {
        let properties: Vec<ChainId> = chain
            .iter()
            .map(|p| self.intern_chain(ChainKind::Property(p.clone())))
            .collect();

        match properties.as_slice() {
            [] => Err(ElError::Owl(OwlError::InvalidAxiom("empty object property chain".to_string()))),
            [single] => {
                self.chains[single.index()].told_supers.push((sup, id));
                Ok(())
            }
            [init @ .., second_last, last] => {
                let mut right = self.intern_composition(*second_last, *last);
                for &left in init.iter().rev() {
                    self.auxiliaries += 1;
                    let auxiliary = self.intern_chain(ChainKind::Auxiliary(self.auxiliaries));
                    self.chains[right.index()].told_supers.push((auxiliary, id));
                    right = self.intern_composition(left, auxiliary);
                }
                self.chains[right.index()].told_supers.push((sup, id));
                Ok(())
            }
        }
    }

    /// Intern an expression; negative occurrences are propagated to sub-expressions
    fn index_expression(&mut self, expression: &ClassExpression, negative: bool) -> Result<ConceptId, ElError> {
        let id = match expression {
            ClassExpression::Thing => self.intern(ConceptKey::Top, ConceptKind::Top),
            ClassExpression::Nothing => self.intern(ConceptKey::Bottom, ConceptKind::Bottom),
            ClassExpression::Named(iri) if iri.as_str() == vocabulary::OWL_THING => {
                self.intern(ConceptKey::Top, ConceptKind::Top)
            }
            ClassExpression::Named(iri) if iri.as_str() == vocabulary::OWL_NOTHING => {
                self.intern(ConceptKey::Bottom, ConceptKind::Bottom)
            }
            ClassExpression::Named(iri) => {
                let known = self.concept_ids.contains_key(&ConceptKey::Named(iri.clone()));
                let id = self.intern(ConceptKey::Named(iri.clone()), ConceptKind::Named(iri.clone()));
                if !known {
                    self.named.push(id);
                }
                id
            }
            ClassExpression::IntersectionOf(conjuncts) => {
                let (last, init) = conjuncts
                    .split_last()
                    .ok_or_else(|| OwlError::InvalidAxiom("empty intersection".to_string()))?;
                let mut right = self.index_expression(last, false)?;
                for conjunct in init.iter().rev() {
                    let left = self.index_expression(conjunct, false)?;
                    right = self.intern(ConceptKey::Conjunction(left, right), ConceptKind::Conjunction(left, right));
                }
                right
            }
            ClassExpression::SomeValuesFrom { property, class } => {
                let property = self.intern_chain(ChainKind::Property(property.clone()));
                let filler = self.index_expression(class, false)?;
                self.intern(
                    ConceptKey::Existential(property, filler),
                    ConceptKind::Existential { property, filler },
                )
            }
            ClassExpression::DataSomeValuesFrom { property, range } => {
                let restrictions = parse_range(range)?;
                let property = self.intern_data_property(property);
                let key = ConceptKey::DataRestriction(property, range.clone());
                let known = self.concept_ids.contains_key(&key);
                let id = self.intern(
                    key,
                    ConceptKind::DataRestriction {
                        property,
                        range: range.clone(),
                        restrictions,
                    },
                );
                if !known {
                    self.data_properties[property.index()].restrictions.push(id);
                }
                id
            }
        };

        if negative {
            self.mark_negative(id);
        }
        Ok(id)
    }

    fn mark_negative(&mut self, id: ConceptId) {
        if self.concepts[id.index()].negative {
            return;
        }
        self.concepts[id.index()].negative = true;

        match self.concepts[id.index()].kind.clone() {
            ConceptKind::Conjunction(first, second) => {
                self.concepts[first.index()].negative_conjunctions.push(id);
                if second != first {
                    self.concepts[second.index()].negative_conjunctions.push(id);
                }
                self.mark_negative(first);
                self.mark_negative(second);
            }
            ConceptKind::Existential { property, filler } => {
                self.concepts[filler.index()].negative_existentials.push(id);
                self.chains[property.index()].negative_existentials.push(id);
                self.mark_negative(filler);
            }
            ConceptKind::DataRestriction { property, .. } => {
                self.data_properties[property.index()].negative_restrictions.push(id);
            }
            ConceptKind::Named(_) | ConceptKind::Top | ConceptKind::Bottom => {}
        }
    }

    fn intern(&mut self, key: ConceptKey, kind: ConceptKind) -> ConceptId {
        if let Some(&id) = self.concept_ids.get(&key) {
            return id;
        }
        let id = ConceptId::from_index(self.concepts.len());
        self.concepts.push(IndexedConcept::new(kind));
        self.concept_ids.insert(key, id);
        id
    }

    fn intern_chain(&mut self, kind: ChainKind) -> ChainId {
        if let Some(&id) = self.chain_ids.get(&kind) {
            return id;
        }
        let id = ChainId::from_index(self.chains.len());
        self.chains.push(IndexedPropertyChain::new(kind.clone()));
        self.chain_ids.insert(kind, id);
        id
    }

    fn intern_composition(&mut self, left: ChainId, right: ChainId) -> ChainId {
        let kind = ChainKind::Composition { left, right };
        let known = self.chain_ids.contains_key(&kind);
        let id = self.intern_chain(kind);
        if !known {
            self.chains[left.index()].left_compositions.push(id);
            self.chains[right.index()].right_compositions.push(id);
        }
        id
    }

    fn intern_data_property(&mut self, iri: &OwlIri) -> DataPropertyId {
        if let Some(&id) = self.data_property_ids.get(iri) {
            return id;
        }
        let id = DataPropertyId::from_index(self.data_properties.len());
        self.data_properties.push(IndexedDataProperty {
            iri: iri.clone(),
            functional: None,
            restrictions: Vec::new(),
            negative_restrictions: Vec::new(),
        });
        self.data_property_ids.insert(iri.clone(), id);
        id
    }

    pub fn concept(&self, id: ConceptId) -> Result<&IndexedConcept, ElError> {
        self.concepts
            .get(id.index())
            .ok_or_else(|| ElError::malformed(id, "no such concept"))
    }

    pub fn chain(&self, id: ChainId) -> Result<&IndexedPropertyChain, ElError> {
        self.chains.get(id.index()).ok_or_else(|| ElError::MalformedChain {
            chain: id,
            detail: "no such property chain".to_string(),
        })
    }

    pub fn data_property(&self, id: DataPropertyId) -> Option<&IndexedDataProperty> {
        self.data_properties.get(id.index())
    }

    pub fn concept_count(&self) -> usize {
        self.concepts.len()
    }

    pub fn chain_count(&self) -> usize {
        self.chains.len()
    }

    pub fn concept_ids(&self) -> impl Iterator<Item = ConceptId> {
        (0..self.concepts.len()).map(ConceptId::from_index)
    }

    pub fn chain_ids(&self) -> impl Iterator<Item = ChainId> {
        (0..self.chains.len()).map(ChainId::from_index)
    }

    pub fn top(&self) -> ConceptId {
        ConceptId(0)
    }

    pub fn bottom(&self) -> ConceptId {
        ConceptId(1)
    }

    /// Named classes in indexing order (⊤ and ⊥ excluded)
    pub fn named_classes(&self) -> &[ConceptId] {
        &self.named
    }

    /// Anonymous query expressions registered at build time
    pub fn queries(&self) -> &[ConceptId] {
        &self.queries
    }

    pub fn is_query(&self, id: ConceptId) -> bool {
        self.queries.contains(&id)
    }

    /// Resolve a class IRI, including owl:Thing and owl:Nothing
    pub fn class_id(&self, iri: &OwlIri) -> Option<ConceptId> {
        match iri.as_str() {
            vocabulary::OWL_THING => Some(self.top()),
            vocabulary::OWL_NOTHING => Some(self.bottom()),
            _ => self.concept_ids.get(&ConceptKey::Named(iri.clone())).copied(),
        }
    }

    /// IRI of a named concept; ⊤ and ⊥ map to their OWL vocabulary IRIs
    pub fn class_iri(&self, id: ConceptId) -> Option<OwlIri> {
        match self.concepts.get(id.index())?.kind() {
            ConceptKind::Named(iri) => Some(iri.clone()),
            ConceptKind::Top => Some(OwlIri::new(vocabulary::OWL_THING)),
            ConceptKind::Bottom => Some(OwlIri::new(vocabulary::OWL_NOTHING)),
            _ => None,
        }
    }

    /// Look up an already indexed expression without modifying the index
    pub fn find_expression(&self, expression: &ClassExpression) -> Option<ConceptId> {
        match expression {
            ClassExpression::Thing => Some(self.top()),
            ClassExpression::Nothing => Some(self.bottom()),
            ClassExpression::Named(iri) => self.class_id(iri),
            ClassExpression::IntersectionOf(conjuncts) => {
                let (last, init) = conjuncts.split_last()?;
                let mut right = self.find_expression(last)?;
                for conjunct in init.iter().rev() {
                    let left = self.find_expression(conjunct)?;
                    right = *self.concept_ids.get(&ConceptKey::Conjunction(left, right))?;
                }
                Some(right)
            }
            ClassExpression::SomeValuesFrom { property, class } => {
                let property = *self.chain_ids.get(&ChainKind::Property(property.clone()))?;
                let filler = self.find_expression(class)?;
                self.concept_ids.get(&ConceptKey::Existential(property, filler)).copied()
            }
            ClassExpression::DataSomeValuesFrom { property, range } => {
                let property = *self.data_property_ids.get(property)?;
                self.concept_ids
                    .get(&ConceptKey::DataRestriction(property, range.clone()))
                    .copied()
            }
        }
    }

    pub fn axiom(&self, id: AxiomId) -> Option<&Axiom> {
        self.axioms.get(id.index())
    }

    /// Members of an indexed disjointness axiom, by position
    pub fn disjoint_members(&self, axiom: AxiomId) -> Option<&[ConceptId]> {
        self.disjointness.get(&axiom).map(Vec::as_slice)
    }

    /// Left and right components of a binary composition
    pub fn composition(&self, id: ChainId) -> Result<(ChainId, ChainId), ElError> {
        match self.chain(id)?.kind() {
            ChainKind::Composition { left, right } => Ok((*left, *right)),
            _ => Err(ElError::MalformedChain {
                chain: id,
                detail: "not a property composition".to_string(),
            }),
        }
    }

    pub fn statistics(&self) -> IndexStatistics {
        IndexStatistics {
            concepts: self.concepts.len(),
            chains: self.chains.len(),
            data_properties: self.data_properties.len(),
            axioms: self.axioms.len(),
            skipped_axioms: self.skipped,
        }
    }

    /// Human-readable rendering of a concept
    pub fn concept_label(&self, id: ConceptId) -> String {
        let Some(concept) = self.concepts.get(id.index()) else {
            return id.to_string();
        };
        match concept.kind() {
            ConceptKind::Named(iri) => iri.short_form().to_string(),
            ConceptKind::Top => "⊤".to_string(),
            ConceptKind::Bottom => "⊥".to_string(),
            ConceptKind::Conjunction(first, second) => {
                format!("({} ⊓ {})", self.concept_label(*first), self.concept_label(*second))
            }
            ConceptKind::Existential { property, filler } => {
                format!("∃{}.{}", self.chain_label(*property), self.concept_label(*filler))
            }
            ConceptKind::DataRestriction { property, range, .. } => {
                let expression = ClassExpression::DataSomeValuesFrom {
                    property: self
                        .data_property(*property)
                        .map(|p| p.iri().clone())
                        .unwrap_or_else(|| OwlIri::new(property.to_string())),
                    range: range.clone(),
                };
                expression.to_string()
            }
        }
    }

    pub fn chain_label(&self, id: ChainId) -> String {
        match self.chains.get(id.index()).map(IndexedPropertyChain::kind) {
            Some(ChainKind::Property(iri)) => iri.short_form().to_string(),
            Some(ChainKind::Auxiliary(n)) => format!("aux{}", n),
            Some(ChainKind::Composition { left, right }) => {
                format!("{} ∘ {}", self.chain_label(*left), self.chain_label(*right))
            }
            None => id.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fukurow_owl::model::{Axiom, ClassExpression as C};

    fn iri(s: &str) -> OwlIri {
        OwlIri::new(s)
    }

    #[test]
    fn test_top_and_bottom_are_fixed() {
        let index = IndexedOntology::build(&Ontology::new()).unwrap();
        assert_eq!(index.concept(index.top()).unwrap().kind(), &ConceptKind::Top);
        assert_eq!(index.concept(index.bottom()).unwrap().kind(), &ConceptKind::Bottom);
        assert_eq!(index.class_id(&iri(vocabulary::OWL_THING)), Some(index.top()));
        assert!(index.named_classes().is_empty());
    }

    #[test]
    fn test_hash_consing() {
        let ontology = Ontology::from_axioms(vec![
            Axiom::sub_class_of(C::named("A"), C::some("r", C::named("B"))),
            Axiom::sub_class_of(C::some("r", C::named("B")), C::named("C")),
        ]);
        let index = IndexedOntology::build(&ontology).unwrap();

        let existential = index.find_expression(&C::some("r", C::named("B"))).unwrap();
        let concept = index.concept(existential).unwrap();
        assert!(concept.occurs_negatively());
        assert_eq!(concept.told_supers().len(), 1);

        // the filler inherits the negative occurrence and knows its existential
        let b = index.class_id(&iri("B")).unwrap();
        assert!(index.concept(b).unwrap().occurs_negatively());
        assert_eq!(index.concept(b).unwrap().negative_existentials(), &[existential]);
    }

    #[test]
    fn test_conjunction_is_right_nested() {
        let ontology = Ontology::from_axioms(vec![Axiom::sub_class_of(
            C::and(vec![C::named("A"), C::named("B"), C::named("C")]),
            C::named("D"),
        )]);
        let index = IndexedOntology::build(&ontology).unwrap();

        let top = index
            .find_expression(&C::and(vec![C::named("A"), C::named("B"), C::named("C")]))
            .unwrap();
        let inner = index.find_expression(&C::and(vec![C::named("B"), C::named("C")])).unwrap();
        let a = index.class_id(&iri("A")).unwrap();
        assert_eq!(index.concept(top).unwrap().kind(), &ConceptKind::Conjunction(a, inner));
        assert_eq!(index.concept(a).unwrap().negative_conjunctions(), &[top]);
        assert_eq!(index.concept_label(top), "(A ⊓ (B ⊓ C))");
    }

    #[test]
    fn test_long_chain_uses_auxiliary_properties() {
        let ontology = Ontology::from_axioms(vec![Axiom::SubObjectPropertyOf {
            chain: vec![iri("r"), iri("s"), iri("t")],
            sup: iri("u"),
        }]);
        let index = IndexedOntology::build(&ontology).unwrap();

        let compositions: Vec<ChainId> = index
            .chain_ids()
            .filter(|&c| index.chain(c).unwrap().is_composition())
            .collect();
        assert_eq!(compositions.len(), 2);

        let labels: Vec<String> = compositions.iter().map(|&c| index.chain_label(c)).collect();
        assert!(labels.contains(&"s ∘ t".to_string()));
        assert!(labels.contains(&"r ∘ aux1".to_string()));
    }

    #[test]
    fn test_transitivity_and_domain_normalisation() {
        let ontology = Ontology::from_axioms(vec![
            Axiom::TransitiveObjectProperty(iri("partOf")),
            Axiom::ObjectPropertyDomain(iri("partOf"), C::named("Part")),
        ]);
        let index = IndexedOntology::build(&ontology).unwrap();

        let part_of = index.chain_ids().find(|&c| index.chain_label(c) == "partOf").unwrap();
        let chain = index.chain(part_of).unwrap();
        assert_eq!(chain.left_compositions(), chain.right_compositions());
        let composition = chain.left_compositions()[0];
        assert_eq!(index.chain(composition).unwrap().told_supers()[0].0, part_of);

        // domain becomes ∃partOf.⊤ ⊑ Part, which makes ⊤ occur negatively
        let domain = index.find_expression(&C::some("partOf", C::Thing)).unwrap();
        assert!(index.concept(domain).unwrap().occurs_negatively());
        assert!(index.concept(index.top()).unwrap().occurs_negatively());
    }

    #[test]
    fn test_skips_non_el_axioms() {
        let ontology = Ontology::from_axioms(vec![
            Axiom::AsymmetricObjectProperty(iri("r")),
            Axiom::sub_class_of(
                C::data_some("p", DataRange::new("http://www.w3.org/2001/XMLSchema#string")),
                C::named("A"),
            ),
            Axiom::sub_class_of(C::named("A"), C::named("B")),
        ]);
        let index = IndexedOntology::build(&ontology).unwrap();

        assert_eq!(index.statistics().skipped_axioms, 2);
        let a = index.class_id(&iri("A")).unwrap();
        assert_eq!(index.concept(a).unwrap().told_supers().len(), 1);
    }

    #[test]
    fn test_disjointness_positions() {
        let ontology = Ontology::from_axioms(vec![Axiom::DisjointClasses(vec![
            C::named("A"),
            C::named("B"),
            C::named("A"),
        ])]);
        let index = IndexedOntology::build(&ontology).unwrap();

        let a = index.class_id(&iri("A")).unwrap();
        assert_eq!(
            index.concept(a).unwrap().disjoint_positions(),
            &[(AxiomId(0), 0), (AxiomId(0), 2)]
        );
        assert_eq!(index.disjoint_members(AxiomId(0)).map(<[_]>::len), Some(3));
    }

    #[test]
    fn test_queries_are_indexed_negatively() {
        let query = C::and(vec![C::named("A"), C::some("r", C::named("B"))]);
        let index = IndexedOntology::build_with_queries(&Ontology::new(), &[query.clone()]).unwrap();

        let id = index.find_expression(&query).unwrap();
        assert_eq!(index.queries(), &[id]);
        assert!(index.concept(id).unwrap().occurs_negatively());
        assert!(index.is_query(id));
    }

    #[test]
    fn test_empty_intersection_is_rejected() {
        let ontology = Ontology::from_axioms(vec![Axiom::sub_class_of(C::and(vec![]), C::named("A"))]);
        let result = IndexedOntology::build(&ontology);
        assert!(matches!(result, Err(ElError::Owl(OwlError::InvalidAxiom(_)))));
    }
}
