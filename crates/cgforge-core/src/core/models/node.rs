use super::ids::NodeId;
use nalgebra::Point3;
use std::str::FromStr;

/// Classifies what a node in a molecule graph stands for.
///
/// Structures read from disk contain only [`NodeRole::Atom`] nodes; the
/// resolution mapping replaces them with [`NodeRole::Bead`] nodes, and the
/// virtual-site network adds [`NodeRole::VirtualSite`] nodes on top of beads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum NodeRole {
    /// An atom of the atomistic input structure.
    #[default]
    Atom,
    /// A coarse-grained bead produced by the resolution mapping.
    Bead,
    /// A massless site constructed from another node.
    VirtualSite,
}

/// A particle in a molecule graph.
///
/// Nodes carry the residue identity they came from so that residue-level
/// operations (mutations, secondary structure, mapping) can work on a flat
/// graph without a separate residue hierarchy.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// Atom or bead name (e.g., "CA", "BB").
    pub name: String,
    /// Name of the residue the node belongs to.
    pub resname: String,
    /// Residue sequence number from the source file.
    pub resid: isize,
    /// Chain identifier, `' '` when the format has none.
    pub chain: char,
    /// Chemical element symbol, when known.
    pub element: Option<String>,
    /// Coordinates in nanometers; `None` when undefined.
    pub position: Option<Point3<f64>>,
    /// Force-field particle type (e.g., "P2").
    pub bead_type: Option<String>,
    /// Charge in elementary charge units.
    pub charge: f64,
    /// One-letter secondary-structure code of the residue.
    pub secstruct: Option<char>,
    pub role: NodeRole,
    /// For virtual sites: the node the site is constructed from.
    pub site_of: Option<NodeId>,
    /// Names of the modifications applied to this node's residue.
    pub modifications: Vec<String>,
    /// For beads: positions of the atoms the bead was mapped from.
    pub constituents: Vec<Point3<f64>>,
}

impl Node {
    /// Creates a new atom node with the given identity and no coordinates.
    ///
    /// Every other field starts from its empty value and is expected to be
    /// filled in by readers or processors.
    pub fn new(name: &str, resname: &str, resid: isize, chain: char) -> Self {
        Self {
            name: name.to_string(),
            resname: resname.to_string(),
            resid,
            chain,
            element: None,
            position: None,
            bead_type: None,
            charge: 0.0,
            secstruct: None,
            role: NodeRole::default(),
            site_of: None,
            modifications: Vec::new(),
            constituents: Vec::new(),
        }
    }

    pub fn with_position(mut self, position: Point3<f64>) -> Self {
        self.position = Some(position);
        self
    }

    pub fn with_element(mut self, element: &str) -> Self {
        self.element = Some(element.to_string());
        self
    }

    /// Returns the element symbol, guessing it from the atom name when the
    /// input did not provide one.
    ///
    /// The guess follows the PDB convention: the first alphabetic character
    /// of the name, ignoring leading digits (e.g., "1HB" -> "H").
    pub fn element_or_guess(&self) -> String {
        if let Some(element) = self.element.as_deref().filter(|e| !e.is_empty()) {
            return element.to_ascii_uppercase();
        }
        self.name
            .chars()
            .find(|c| c.is_ascii_alphabetic())
            .map(|c| c.to_ascii_uppercase().to_string())
            .unwrap_or_default()
    }

    pub fn is_hydrogen(&self) -> bool {
        self.element_or_guess() == "H"
    }

    /// Returns `true` if both nodes belong to the same residue.
    pub fn same_residue(&self, other: &Node) -> bool {
        self.chain == other.chain && self.resid == other.resid && self.resname == other.resname
    }
}

impl FromStr for NodeRole {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace(['-', '_'], "").as_str() {
            "atom" => Ok(NodeRole::Atom),
            "bead" => Ok(NodeRole::Bead),
            "virtualsite" | "vsite" => Ok(NodeRole::VirtualSite),
            _ => Err(()),
        }
    }
}
