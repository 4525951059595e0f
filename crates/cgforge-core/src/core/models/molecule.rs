use super::ids::NodeId;
use super::node::Node;
use super::topology::Edge;
use slotmap::{SecondaryMap, SlotMap};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use thiserror::Error;

/// Metadata key holding the molecule type name used for topology output.
pub const MOLTYPE_KEY: &str = "moltype";
/// Metadata key holding the per-residue secondary-structure string.
pub const SECSTRUCT_KEY: &str = "cgsecstruct";
/// Metadata key holding the chain identifier(s) of the molecule.
pub const CHAIN_KEY: &str = "chain";

/// A value in a molecule's metadata mapping.
#[derive(Debug, Clone, PartialEq)]
pub enum MetaValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Flag(bool),
}

impl MetaValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            MetaValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for MetaValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetaValue::Text(s) => write!(f, "{}", s),
            MetaValue::Integer(i) => write!(f, "{}", i),
            MetaValue::Float(x) => write!(f, "{}", x),
            MetaValue::Flag(b) => write!(f, "{}", b),
        }
    }
}

impl From<&str> for MetaValue {
    fn from(s: &str) -> Self {
        MetaValue::Text(s.to_string())
    }
}

impl From<String> for MetaValue {
    fn from(s: String) -> Self {
        MetaValue::Text(s)
    }
}

impl From<i64> for MetaValue {
    fn from(i: i64) -> Self {
        MetaValue::Integer(i)
    }
}

impl From<f64> for MetaValue {
    fn from(x: f64) -> Self {
        MetaValue::Float(x)
    }
}

impl From<bool> for MetaValue {
    fn from(b: bool) -> Self {
        MetaValue::Flag(b)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MoleculeError {
    #[error("Node not found in molecule")]
    NodeNotFound,
    #[error("An edge cannot connect a node to itself")]
    SelfLoop,
}

/// A residue view over a molecule: its identity and its nodes in graph order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResidueRef {
    pub chain: char,
    pub resid: isize,
    pub resname: String,
    pub nodes: Vec<NodeId>,
}

/// A molecule graph: particles as nodes, bonds and other interactions as edges.
///
/// Node storage uses a slot map so that IDs stay valid across removals, while
/// a separate order vector keeps the insertion order that every output format
/// relies on.
#[derive(Debug, Clone, Default)]
pub struct Molecule {
    /// Primary storage for nodes.
    nodes: SlotMap<NodeId, Node>,
    /// Node IDs in insertion order.
    order: Vec<NodeId>,
    /// All edges of the graph, without duplicates.
    edges: Vec<Edge>,
    /// Cached adjacency list, indexed by node ID.
    adjacency: SecondaryMap<NodeId, Vec<NodeId>>,
    /// Free-form metadata (moltype, secondary structure, chain, ...).
    meta: BTreeMap<String, MetaValue>,
    /// Restrained nodes and their force constants.
    position_restraints: Vec<(NodeId, f64)>,
}

impl Molecule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a node and returns its stable ID.
    pub fn add_node(&mut self, node: Node) -> NodeId {
        let id = self.nodes.insert(node);
        self.order.push(id);
        self.adjacency.insert(id, Vec::new());
        id
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id)
    }

    /// Returns an iterator over the nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.order.iter().map(move |&id| (id, &self.nodes[id]))
    }

    /// Returns mutable references to all nodes, in no particular order.
    pub fn nodes_mut(&mut self) -> impl Iterator<Item = (NodeId, &mut Node)> {
        self.nodes.iter_mut()
    }

    pub fn node_ids(&self) -> &[NodeId] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Removes a node together with every edge and restraint that references it.
    pub fn remove_node(&mut self, id: NodeId) -> Option<Node> {
        let node = self.nodes.remove(id)?;
        self.order.retain(|&n| n != id);
        self.edges.retain(|e| !e.contains(id));
        self.position_restraints.retain(|&(n, _)| n != id);
        if let Some(neighbors) = self.adjacency.remove(id) {
            for neighbor in neighbors {
                if let Some(list) = self.adjacency.get_mut(neighbor) {
                    list.retain(|&n| n != id);
                }
            }
        }
        Some(node)
    }

    /// Removes every node for which `keep` returns `false` and returns how many were removed.
    pub fn retain_nodes(&mut self, mut keep: impl FnMut(&Node) -> bool) -> usize {
        let doomed: Vec<NodeId> = self
            .order
            .iter()
            .copied()
            .filter(|&id| !keep(&self.nodes[id]))
            .collect();
        for &id in &doomed {
            self.remove_node(id);
        }
        doomed.len()
    }

    /// Adds an edge. Adding an edge between an already connected pair is a no-op.
    pub fn add_edge(&mut self, edge: Edge) -> Result<(), MoleculeError> {
        if edge.a == edge.b {
            return Err(MoleculeError::SelfLoop);
        }
        if !self.nodes.contains_key(edge.a) || !self.nodes.contains_key(edge.b) {
            return Err(MoleculeError::NodeNotFound);
        }
        if self.has_edge(edge.a, edge.b) {
            return Ok(());
        }
        self.adjacency[edge.a].push(edge.b);
        self.adjacency[edge.b].push(edge.a);
        self.edges.push(edge);
        Ok(())
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn has_edge(&self, a: NodeId, b: NodeId) -> bool {
        self.adjacency
            .get(a)
            .is_some_and(|neighbors| neighbors.contains(&b))
    }

    pub fn neighbors(&self, id: NodeId) -> Option<&[NodeId]> {
        self.adjacency.get(id).map(|v| v.as_slice())
    }

    pub fn meta(&self, key: &str) -> Option<&MetaValue> {
        self.meta.get(key)
    }

    pub fn meta_str(&self, key: &str) -> Option<&str> {
        self.meta.get(key).and_then(MetaValue::as_str)
    }

    pub fn set_meta(&mut self, key: &str, value: impl Into<MetaValue>) {
        self.meta.insert(key.to_string(), value.into());
    }

    pub fn metadata(&self) -> &BTreeMap<String, MetaValue> {
        &self.meta
    }

    /// The molecule type name, once the molecule has been named.
    pub fn moltype(&self) -> Option<&str> {
        self.meta_str(MOLTYPE_KEY)
    }

    /// The chain of the molecule: the `chain` metadata if set, otherwise the
    /// chain of its first node.
    pub fn chain(&self) -> Option<char> {
        if let Some(chain) = self.meta_str(CHAIN_KEY).and_then(|s| s.chars().next()) {
            return Some(chain);
        }
        self.order.first().map(|&id| self.nodes[id].chain)
    }

    pub fn add_position_restraint(
        &mut self,
        id: NodeId,
        force_constant: f64,
    ) -> Result<(), MoleculeError> {
        if !self.nodes.contains_key(id) {
            return Err(MoleculeError::NodeNotFound);
        }
        match self.position_restraints.iter_mut().find(|(n, _)| *n == id) {
            Some(existing) => existing.1 = force_constant,
            None => self.position_restraints.push((id, force_constant)),
        }
        Ok(())
    }

    pub fn position_restraints(&self) -> &[(NodeId, f64)] {
        &self.position_restraints
    }

    /// Maps every node ID to its 1-based position in insertion order.
    pub fn serial_numbers(&self) -> SecondaryMap<NodeId, usize> {
        let mut serials = SecondaryMap::new();
        for (i, &id) in self.order.iter().enumerate() {
            serials.insert(id, i + 1);
        }
        serials
    }

    /// Groups nodes into residues, in order of first appearance.
    pub fn residues(&self) -> Vec<ResidueRef> {
        let mut residues: Vec<ResidueRef> = Vec::new();
        let mut index: HashMap<(char, isize, &str), usize> = HashMap::new();
        for &id in &self.order {
            let node = &self.nodes[id];
            let key = (node.chain, node.resid, node.resname.as_str());
            match index.get(&key) {
                Some(&i) => residues[i].nodes.push(id),
                None => {
                    index.insert(key, residues.len());
                    residues.push(ResidueRef {
                        chain: node.chain,
                        resid: node.resid,
                        resname: node.resname.clone(),
                        nodes: vec![id],
                    });
                }
            }
        }
        residues
    }

    /// Moves every node, edge and restraint of `other` into this molecule,
    /// appending them after the existing nodes. Metadata of `self` is kept.
    pub fn absorb(&mut self, other: Molecule) {
        let Molecule {
            mut nodes,
            order,
            edges,
            position_restraints,
            ..
        } = other;

        let mut remap: HashMap<NodeId, NodeId> = HashMap::with_capacity(order.len());
        let mut moved = Vec::with_capacity(order.len());
        for old_id in order {
            if let Some(node) = nodes.remove(old_id) {
                let new_id = self.add_node(node);
                remap.insert(old_id, new_id);
                moved.push(new_id);
            }
        }
        for new_id in moved {
            if let Some(site_of) = self.nodes[new_id].site_of {
                self.nodes[new_id].site_of = remap.get(&site_of).copied();
            }
        }
        for edge in edges {
            if let (Some(&a), Some(&b)) = (remap.get(&edge.a), remap.get(&edge.b)) {
                let _ = self.add_edge(Edge { a, b, ..edge });
            }
        }
        for (id, fc) in position_restraints {
            if let Some(&new_id) = remap.get(&id) {
                self.position_restraints.push((new_id, fc));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::topology::EdgeKind;

    fn three_residue_molecule() -> (Molecule, Vec<NodeId>) {
        let mut mol = Molecule::new();
        let ids = vec![
            mol.add_node(Node::new("N", "GLY", 1, 'A')),
            mol.add_node(Node::new("CA", "GLY", 1, 'A')),
            mol.add_node(Node::new("N", "ALA", 2, 'A')),
            mol.add_node(Node::new("CA", "ALA", 2, 'A')),
            mol.add_node(Node::new("N", "SER", 3, 'A')),
        ];
        mol.add_edge(Edge::new(ids[0], ids[1], EdgeKind::Bond)).unwrap();
        mol.add_edge(Edge::new(ids[1], ids[2], EdgeKind::Bond)).unwrap();
        mol.add_edge(Edge::new(ids[2], ids[3], EdgeKind::Bond)).unwrap();
        (mol, ids)
    }

    #[test]
    fn nodes_iterate_in_insertion_order() {
        let (mol, ids) = three_residue_molecule();
        let seen: Vec<NodeId> = mol.nodes().map(|(id, _)| id).collect();
        assert_eq!(seen, ids);
        assert_eq!(mol.len(), 5);
    }

    #[test]
    fn add_edge_is_idempotent_and_rejects_self_loops() {
        let (mut mol, ids) = three_residue_molecule();
        mol.add_edge(Edge::new(ids[1], ids[0], EdgeKind::Bond)).unwrap();
        assert_eq!(mol.edges().len(), 3);
        assert_eq!(mol.neighbors(ids[0]).unwrap(), &[ids[1]]);
        assert_eq!(
            mol.add_edge(Edge::new(ids[0], ids[0], EdgeKind::Bond)),
            Err(MoleculeError::SelfLoop)
        );
    }

    #[test]
    fn remove_node_drops_edges_restraints_and_adjacency() {
        let (mut mol, ids) = three_residue_molecule();
        mol.add_position_restraint(ids[1], 1000.0).unwrap();

        let removed = mol.remove_node(ids[1]).unwrap();

        assert_eq!(removed.name, "CA");
        assert_eq!(mol.len(), 4);
        assert_eq!(mol.edges().len(), 1);
        assert!(mol.position_restraints().is_empty());
        assert!(mol.neighbors(ids[0]).unwrap().is_empty());
        assert_eq!(mol.neighbors(ids[2]).unwrap(), &[ids[3]]);
    }

    #[test]
    fn residues_are_grouped_in_first_appearance_order() {
        let (mol, ids) = three_residue_molecule();
        let residues = mol.residues();
        assert_eq!(residues.len(), 3);
        assert_eq!(residues[0].resname, "GLY");
        assert_eq!(residues[0].nodes, vec![ids[0], ids[1]]);
        assert_eq!(residues[2].resid, 3);
        assert_eq!(residues[2].nodes, vec![ids[4]]);
    }

    #[test]
    fn retain_nodes_reports_removed_count() {
        let (mut mol, _) = three_residue_molecule();
        let removed = mol.retain_nodes(|n| n.name != "CA");
        assert_eq!(removed, 2);
        assert!(mol.nodes().all(|(_, n)| n.name == "N"));
    }

    #[test]
    fn absorb_appends_nodes_and_remaps_edges() {
        let (mut first, _) = three_residue_molecule();
        let (mut second, second_ids) = three_residue_molecule();
        second.add_position_restraint(second_ids[0], 500.0).unwrap();
        first.set_meta(CHAIN_KEY, "A");

        first.absorb(second);

        assert_eq!(first.len(), 10);
        assert_eq!(first.edges().len(), 6);
        assert_eq!(first.position_restraints().len(), 1);
        assert_eq!(first.meta_str(CHAIN_KEY), Some("A"));
        let serials = first.serial_numbers();
        let (restrained, fc) = first.position_restraints()[0];
        assert_eq!(serials[restrained], 6);
        assert_eq!(fc, 500.0);
    }

    #[test]
    fn chain_prefers_metadata_over_first_node() {
        let (mut mol, _) = three_residue_molecule();
        assert_eq!(mol.chain(), Some('A'));
        mol.set_meta(CHAIN_KEY, "B");
        assert_eq!(mol.chain(), Some('B'));
    }

    #[test]
    fn meta_values_convert_and_display() {
        let mut mol = Molecule::new();
        mol.set_meta(MOLTYPE_KEY, "molecule_0");
        mol.set_meta("count", 3i64);
        assert_eq!(mol.moltype(), Some("molecule_0"));
        assert_eq!(mol.meta("count").unwrap().to_string(), "3");
        assert_eq!(mol.meta_str("count"), None);
    }
}
