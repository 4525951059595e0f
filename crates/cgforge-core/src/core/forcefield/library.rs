use crate::core::models::topology::BondParams;
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

pub const FEATURE_ELASTIC_NETWORK: &str = "elastic-network";
pub const FEATURE_GO_MODEL: &str = "go-model";
pub const FEATURE_POSITION_RESTRAINTS: &str = "position-restraints";
pub const FEATURE_COLLAGEN: &str = "collagen";

/// The resolution a force-field library describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ForceFieldKind {
    Atomistic,
    CoarseGrained,
}

impl fmt::Display for ForceFieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Atomistic => write!(f, "atomistic"),
            Self::CoarseGrained => write!(f, "coarse-grained"),
        }
    }
}

/// A coarse-grained bead and the atoms it is built from.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BeadTemplate {
    pub name: String,
    #[serde(rename = "type")]
    pub bead_type: String,
    #[serde(default)]
    pub charge: f64,
    pub atoms: Vec<String>,
}

/// A bond between two named beads of the same residue.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BondTemplate {
    pub from: String,
    pub to: String,
    #[serde(default = "harmonic")]
    pub function: u8,
    pub length: f64,
    pub force: f64,
}

fn harmonic() -> u8 {
    1
}

impl BondTemplate {
    pub fn params(&self) -> BondParams {
        BondParams {
            function: self.function,
            length: self.length,
            force: self.force,
        }
    }
}

/// Residue definition: the atoms of an atomistic residue, or the beads and
/// bonds of a coarse-grained one.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResidueTemplate {
    #[serde(default)]
    pub atoms: Vec<String>,
    #[serde(default)]
    pub beads: Vec<BeadTemplate>,
    #[serde(default)]
    pub bonds: Vec<BondTemplate>,
}

impl ResidueTemplate {
    pub fn has_atom(&self, name: &str) -> bool {
        self.atoms.iter().any(|a| a == name)
    }

    pub fn bead(&self, name: &str) -> Option<&BeadTemplate> {
        self.beads.iter().find(|b| b.name == name)
    }
}

/// How a modification changes one bead of the mapped residue.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BeadOverride {
    pub bead: String,
    #[serde(default, rename = "type")]
    pub bead_type: Option<String>,
    #[serde(default)]
    pub charge: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct LinkTable {
    /// Parameters for the bond between consecutive backbone beads.
    #[serde(default)]
    pub backbone: Option<BondParams>,
    /// Overrides of `backbone`, keyed by one-letter secondary-structure code.
    #[serde(default)]
    pub backbone_by_secstruct: BTreeMap<String, BondParams>,
}

/// A force-field library as stored in a TOML document.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct ForceField {
    pub name: String,
    pub kind: ForceFieldKind,
    /// The force-field parameter file included by generated topologies.
    #[serde(default)]
    pub include: Option<String>,
    #[serde(default)]
    pub features: BTreeSet<String>,
    #[serde(default)]
    pub modifications: Vec<String>,
    /// Atom names accepted in any residue (termini).
    #[serde(default)]
    pub terminal_atoms: Vec<String>,
    #[serde(default)]
    pub links: LinkTable,
    /// Bead changes applied when a residue carries a modification.
    #[serde(default)]
    pub modification_beads: BTreeMap<String, Vec<BeadOverride>>,
    #[serde(default)]
    pub residues: BTreeMap<String, ResidueTemplate>,
}

impl ForceField {
    pub fn residue(&self, name: &str) -> Option<&ResidueTemplate> {
        self.residues.get(name)
    }

    pub fn has_feature(&self, feature: &str) -> bool {
        self.features.contains(feature)
    }

    pub fn has_modification(&self, name: &str) -> bool {
        self.modifications.iter().any(|m| m == name)
    }

    pub fn bead_overrides(&self, modification: &str) -> &[BeadOverride] {
        self.modification_beads
            .get(modification)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn is_coarse_grained(&self) -> bool {
        self.kind == ForceFieldKind::CoarseGrained
    }

    /// Returns `true` if `atom` is part of the residue template or a terminal atom.
    pub fn accepts_atom(&self, residue: &str, atom: &str) -> bool {
        self.terminal_atoms.iter().any(|a| a == atom)
            || self.residue(residue).is_some_and(|r| r.has_atom(atom))
    }

    /// Backbone link parameters for a residue with the given secondary structure.
    pub fn backbone_params(&self, secstruct: Option<char>) -> Option<BondParams> {
        secstruct
            .and_then(|ss| self.links.backbone_by_secstruct.get(&ss.to_string()))
            .copied()
            .or(self.links.backbone)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIBRARY: &str = r#"
        name = "toy"
        kind = "coarse-grained"
        include = "toy.itp"
        features = ["elastic-network"]
        modifications = ["N-ter"]
        terminal-atoms = ["OXT"]

        [links.backbone]
        length = 0.35
        force = 1250.0

        [links.backbone-by-secstruct]
        H = { length = 0.31, force = 7500.0 }

        [modification-beads]
        N-ter = [{ bead = "BB", type = "Q5", charge = 1.0 }]

        [residues.ALA]
        atoms = ["N", "CA"]
        beads = [{ name = "BB", type = "P2", atoms = ["N", "CA"] }]
        bonds = [{ from = "BB", to = "SC1", length = 0.27, force = 100000.0 }]
    "#;

    #[test]
    fn library_deserializes_all_sections() {
        let ff: ForceField = toml::from_str(LIBRARY).unwrap();
        assert_eq!(ff.name, "toy");
        assert!(ff.is_coarse_grained());
        assert_eq!(ff.include.as_deref(), Some("toy.itp"));
        assert!(ff.has_feature(FEATURE_ELASTIC_NETWORK));
        assert!(!ff.has_feature(FEATURE_GO_MODEL));
        assert!(ff.has_modification("N-ter"));

        let ala = ff.residue("ALA").unwrap();
        assert_eq!(ala.bead("BB").unwrap().bead_type, "P2");
        assert_eq!(ala.bonds[0].params(), BondParams::harmonic(0.27, 100000.0));
    }

    #[test]
    fn backbone_params_fall_back_to_default() {
        let ff: ForceField = toml::from_str(LIBRARY).unwrap();
        assert_eq!(
            ff.backbone_params(Some('H')),
            Some(BondParams::harmonic(0.31, 7500.0))
        );
        assert_eq!(
            ff.backbone_params(Some('C')),
            Some(BondParams::harmonic(0.35, 1250.0))
        );
        assert_eq!(ff.backbone_params(None), Some(BondParams::harmonic(0.35, 1250.0)));
    }

    #[test]
    fn terminal_atoms_are_accepted_in_any_residue() {
        let ff: ForceField = toml::from_str(LIBRARY).unwrap();
        assert!(ff.accepts_atom("ALA", "CA"));
        assert!(ff.accepts_atom("ALA", "OXT"));
        assert!(!ff.accepts_atom("ALA", "CB"));
        assert!(!ff.accepts_atom("XYZ", "CA"));
    }

    #[test]
    fn modification_overrides_are_looked_up_by_name() {
        let ff: ForceField = toml::from_str(LIBRARY).unwrap();
        let nter = ff.bead_overrides("N-ter");
        assert_eq!(nter.len(), 1);
        assert_eq!(nter[0].bead, "BB");
        assert_eq!(nter[0].bead_type.as_deref(), Some("Q5"));
        assert_eq!(nter[0].charge, Some(1.0));
        assert!(ff.bead_overrides("C-ter").is_empty());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let result: Result<ForceField, _> =
            toml::from_str("name = \"x\"\nkind = \"atomistic\"\ncolour = \"red\"");
        assert!(result.is_err());
    }
}
