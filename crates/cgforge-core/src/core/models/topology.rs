use super::ids::NodeId;
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// The origin of an edge, which decides where it is rendered in a topology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum EdgeKind {
    /// A covalent bond, inferred or taken from a residue template.
    #[default]
    Bond,
    /// A bond between residues added by link application.
    Link,
    /// A harmonic spring of the elastic network.
    Elastic,
    /// A native contact of the virtual-site (Go) network.
    GoContact,
}

#[derive(Debug, Error)]
#[error("Invalid edge kind string")]
pub struct ParseEdgeKindError;

impl FromStr for EdgeKind {
    type Err = ParseEdgeKindError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "bond" => Ok(Self::Bond),
            "link" => Ok(Self::Link),
            "elastic" | "rubber" => Ok(Self::Elastic),
            "go" | "go-contact" => Ok(Self::GoContact),
            _ => Err(ParseEdgeKindError),
        }
    }
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::Bond => "Bond",
                Self::Link => "Link",
                Self::Elastic => "Elastic",
                Self::GoContact => "GoContact",
            }
        )
    }
}

/// Harmonic bond parameters in GROMACS units (nm, kJ/mol/nm^2).
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BondParams {
    #[serde(default = "default_function")]
    pub function: u8,
    pub length: f64,
    pub force: f64,
}

fn default_function() -> u8 {
    1
}

impl BondParams {
    pub fn harmonic(length: f64, force: f64) -> Self {
        Self {
            function: 1,
            length,
            force,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    pub a: NodeId,
    pub b: NodeId,
    pub kind: EdgeKind,
    pub params: Option<BondParams>,
}

impl Edge {
    pub fn new(a: NodeId, b: NodeId, kind: EdgeKind) -> Self {
        Self {
            a,
            b,
            kind,
            params: None,
        }
    }

    pub fn with_params(mut self, params: BondParams) -> Self {
        self.params = Some(params);
        self
    }

    pub fn contains(&self, node_id: NodeId) -> bool {
        self.a == node_id || self.b == node_id
    }

    /// Returns `true` if the edge joins the same pair of nodes, in either order.
    pub fn connects(&self, a: NodeId, b: NodeId) -> bool {
        (self.a == a && self.b == b) || (self.a == b && self.b == a)
    }
}
