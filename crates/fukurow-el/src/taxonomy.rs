//! 分類階層の構築
//!
//! Concepts with equal subsumer sets share a node. Direct super-nodes are the
//! transitive reduction of the subsumption order, computed node by node from
//! the most general to the most specific.

use crate::conclusion::ContextRef;
use crate::error::ElError;
use crate::index::ConceptId;
use crate::saturation::SaturationState;
use fukurow_owl::model::OwlIri;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use tracing::{debug, info};

pub type NodeId = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    Named,
    /// Every member is a query expression
    Anonymous,
}

/// An equivalence class of concepts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaxonomyNode {
    id: NodeId,
    kind: NodeKind,
    members: Vec<ConceptId>,
    named_members: Vec<OwlIri>,
    direct_supers: BTreeSet<NodeId>,
    direct_subs: BTreeSet<NodeId>,
}

impl TaxonomyNode {
    fn new(id: NodeId, members: Vec<ConceptId>, named_members: Vec<OwlIri>) -> Self {
        let kind = if named_members.is_empty() {
            NodeKind::Anonymous
        } else {
            NodeKind::Named
        };
        Self {
            id,
            kind,
            members,
            named_members,
            direct_supers: BTreeSet::new(),
            direct_subs: BTreeSet::new(),
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn is_anonymous(&self) -> bool {
        self.kind == NodeKind::Anonymous
    }

    /// All member concepts, including query expressions
    pub fn members(&self) -> &[ConceptId] {
        &self.members
    }

    /// IRIs of the named members, sorted
    pub fn named_members(&self) -> &[OwlIri] {
        &self.named_members
    }

    pub fn direct_super_nodes(&self) -> &BTreeSet<NodeId> {
        &self.direct_supers
    }

    pub fn direct_sub_nodes(&self) -> &BTreeSet<NodeId> {
        &self.direct_subs
    }
}

/// Classification result over named classes and registered queries
#[derive(Debug, Clone)]
pub struct Taxonomy {
    nodes: Vec<TaxonomyNode>,
    node_of: HashMap<ConceptId, NodeId>,
    by_iri: HashMap<OwlIri, NodeId>,
    top: NodeId,
    bottom: NodeId,
}

impl Taxonomy {
    /// Assemble the taxonomy from a completely saturated state
    pub fn build(state: &SaturationState) -> Result<Self, ElError> {
        let index = state.index();
        let top = index.top();
        let bottom = index.bottom();

        let mut members: Vec<ConceptId> = index.named_classes().to_vec();
        members.extend(index.queries().iter().copied());
        members.sort();
        members.dedup();

        let top_context = state.context(top);
        if top_context.map_or(false, |context| !context.is_consistent()) {
            info!("owl:Thing is unsatisfiable, collapsing taxonomy");
            let mut all = vec![top, bottom];
            all.extend(members);
            return Ok(Self::collapsed(state, all));
        }

        // subsumer sets restricted to the members, ⊤ always included
        let member_set: BTreeSet<ConceptId> = members.iter().copied().collect();
        let restrict = |subsumers: &BTreeSet<ConceptId>| -> BTreeSet<ConceptId> {
            let mut key: BTreeSet<ConceptId> = subsumers.intersection(&member_set).copied().collect();
            key.insert(top);
            key
        };

        let top_key = match top_context {
            Some(context) => restrict(context.subsumers()),
            None => BTreeSet::from([top]),
        };

        let mut unsatisfiable = vec![bottom];
        let mut groups: BTreeMap<BTreeSet<ConceptId>, Vec<ConceptId>> = BTreeMap::new();
        groups.entry(top_key.clone()).or_default().push(top);
        for &member in &members {
            let context = state.saturated(ContextRef::Concept(member))?;
            if !context.is_consistent() {
                unsatisfiable.push(member);
                continue;
            }
            groups.entry(restrict(context.subsumers())).or_default().push(member);
        }

        // most general first: a strict super-set of members has a strictly smaller key
        let mut ordered: Vec<(BTreeSet<ConceptId>, Vec<ConceptId>)> = groups.into_iter().collect();
        ordered.sort_by_key(|(key, _)| key.len());

        let mut taxonomy = Self {
            nodes: Vec::with_capacity(ordered.len() + 1),
            node_of: HashMap::new(),
            by_iri: HashMap::new(),
            top: 0,
            bottom: 0,
        };

        for (key, group) in ordered {
            let id = taxonomy.add_node(state, group);
            if key == top_key {
                taxonomy.top = id;
                continue;
            }

            let mut candidates: Vec<NodeId> = key
                .iter()
                .filter_map(|concept| taxonomy.node_of.get(concept).copied())
                .filter(|&node| node != id)
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect();
            // most specific first
            candidates.sort_by_key(|&node| std::cmp::Reverse(taxonomy.depth_key(node)));

            let mut covered = BTreeSet::new();
            let mut direct = BTreeSet::new();
            for candidate in candidates {
                if covered.contains(&candidate) {
                    continue;
                }
                direct.insert(candidate);
                taxonomy.mark_ancestors(candidate, &mut covered);
            }
            if direct.is_empty() {
                direct.insert(taxonomy.top);
            }
            for &sup in &direct {
                taxonomy.nodes[sup].direct_subs.insert(id);
            }
            taxonomy.nodes[id].direct_supers = direct;
        }

        unsatisfiable.sort();
        let bottom_id = taxonomy.add_node(state, unsatisfiable);
        taxonomy.bottom = bottom_id;
        let leaves: Vec<NodeId> = taxonomy
            .nodes
            .iter()
            .filter(|node| node.id != bottom_id && node.direct_subs.is_empty())
            .map(|node| node.id)
            .collect();
        for leaf in leaves {
            taxonomy.nodes[leaf].direct_subs.insert(bottom_id);
            taxonomy.nodes[bottom_id].direct_supers.insert(leaf);
        }

        debug!(
            nodes = taxonomy.nodes.len(),
            unsatisfiable = taxonomy.nodes[bottom_id].members.len() - 1,
            "taxonomy built"
        );
        Ok(taxonomy)
    }

    fn collapsed(state: &SaturationState, mut members: Vec<ConceptId>) -> Self {
        members.sort();
        members.dedup();
        let mut taxonomy = Self {
            nodes: Vec::new(),
            node_of: HashMap::new(),
            by_iri: HashMap::new(),
            top: 0,
            bottom: 0,
        };
        taxonomy.add_node(state, members);
        taxonomy
    }

    fn add_node(&mut self, state: &SaturationState, mut members: Vec<ConceptId>) -> NodeId {
        members.sort();
        let id = self.nodes.len();
        let mut named: Vec<OwlIri> = members
            .iter()
            .filter_map(|&member| state.index().class_iri(member))
            .collect();
        named.sort();
        for &member in &members {
            self.node_of.insert(member, id);
        }
        for iri in &named {
            self.by_iri.insert(iri.clone(), id);
        }
        self.nodes.push(TaxonomyNode::new(id, members, named));
        id
    }

    /// Number of strict ancestors already linked, used to order candidates
    fn depth_key(&self, node: NodeId) -> usize {
        let mut ancestors = BTreeSet::new();
        self.mark_ancestors(node, &mut ancestors);
        ancestors.len()
    }

    /// BFS over built direct supers, adding every strict ancestor of `node`
    fn mark_ancestors(&self, node: NodeId, visited: &mut BTreeSet<NodeId>) {
        let mut queue: VecDeque<NodeId> = self.nodes[node].direct_supers.iter().copied().collect();
        while let Some(next) = queue.pop_front() {
            if visited.insert(next) {
                queue.extend(self.nodes[next].direct_supers.iter().copied());
            }
        }
    }

    pub fn top_node(&self) -> &TaxonomyNode {
        &self.nodes[self.top]
    }

    pub fn bottom_node(&self) -> &TaxonomyNode {
        &self.nodes[self.bottom]
    }

    pub fn node(&self, id: NodeId) -> Option<&TaxonomyNode> {
        self.nodes.get(id)
    }

    pub fn nodes(&self) -> &[TaxonomyNode] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node_of(&self, concept: ConceptId) -> Option<&TaxonomyNode> {
        self.node_of.get(&concept).map(|&id| &self.nodes[id])
    }

    pub fn node_for_iri(&self, iri: &OwlIri) -> Option<&TaxonomyNode> {
        self.by_iri.get(iri).map(|&id| &self.nodes[id])
    }

    /// Strict ancestors of `node`
    pub fn all_super_nodes(&self, node: NodeId) -> BTreeSet<NodeId> {
        self.reachable(node, |n| &n.direct_supers)
    }

    /// Strict descendants of `node`
    pub fn all_sub_nodes(&self, node: NodeId) -> BTreeSet<NodeId> {
        self.reachable(node, |n| &n.direct_subs)
    }

    fn reachable(&self, node: NodeId, next: impl Fn(&TaxonomyNode) -> &BTreeSet<NodeId>) -> BTreeSet<NodeId> {
        let mut visited = BTreeSet::new();
        let Some(start) = self.nodes.get(node) else {
            return visited;
        };
        let mut queue: VecDeque<NodeId> = next(start).iter().copied().collect();
        while let Some(id) = queue.pop_front() {
            if visited.insert(id) {
                queue.extend(next(&self.nodes[id]).iter().copied());
            }
        }
        visited
    }
}
