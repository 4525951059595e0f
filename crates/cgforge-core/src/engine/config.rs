use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

pub const DEFAULT_SOURCE_FORCE_FIELD: &str = "universal";
pub const DEFAULT_TARGET_FORCE_FIELD: &str = "martini3001";

#[derive(Debug, Error, PartialEq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    #[error("Options '{first}' and '{second}' cannot be used together")]
    ConflictingOptions {
        first: &'static str,
        second: &'static str,
    },

    #[error("Option '{option}' is not supported for {format} files")]
    UnsupportedForFormat {
        option: &'static str,
        format: &'static str,
    },

    #[error("Unknown force field '{name}' given for '{option}'")]
    UnknownForceField { option: &'static str, name: String },

    #[error("Unknown secondary-structure code '{code}' at position {position}")]
    UnknownSecondaryStructure { code: char, position: usize },

    #[error("Residue '{name}' is not defined by force field '{force_field}'")]
    UnknownResidue { name: String, force_field: String },

    #[error("Modification '{name}' is not defined by force field '{force_field}'")]
    UnknownModification { name: String, force_field: String },

    #[error("Invalid value for '{option}': {reason}")]
    InvalidValue { option: &'static str, reason: String },
}

/// A flat residue selector plus a target name, e.g. `A-PHE45:ALA`.
///
/// Every unset selector field matches anything. Used for both mutations
/// (target is a residue name) and modifications (target is a modification).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResidueEdit {
    pub chain: Option<char>,
    pub resname: Option<String>,
    pub resid: Option<isize>,
    pub target: String,
}

impl ResidueEdit {
    pub fn matches(&self, chain: char, resname: &str, resid: isize) -> bool {
        self.chain.is_none_or(|c| c == chain)
            && self.resname.as_deref().is_none_or(|r| r == resname)
            && self.resid.is_none_or(|i| i == resid)
    }
}

impl fmt::Display for ResidueEdit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(chain) = self.chain {
            write!(f, "{}-", chain)?;
        }
        if let Some(resname) = &self.resname {
            write!(f, "{}", resname)?;
        }
        if let Some(resid) = self.resid {
            write!(f, "{}", resid)?;
        }
        write!(f, ":{}", self.target)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BondingStrategy {
    /// Infer bonds from interatomic distances.
    #[default]
    Distance,
    /// Leave the graph without bonds.
    None,
}

impl fmt::Display for BondingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Distance => write!(f, "distance"),
            Self::None => write!(f, "none"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InputConfig {
    pub path: PathBuf,
    pub exclude_residues: BTreeSet<String>,
    pub ignore_hydrogens: bool,
    pub model: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BondingConfig {
    pub strategy: BondingStrategy,
    /// Multiplier applied to the sum of covalent radii.
    pub tolerance: f64,
}

impl Default for BondingConfig {
    fn default() -> Self {
        Self {
            strategy: BondingStrategy::Distance,
            tolerance: 1.2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct RepairConfig {
    /// Delete residues the source library does not know instead of failing.
    pub delete_unknown: bool,
    pub mutations: Vec<ResidueEdit>,
    pub modifications: Vec<ResidueEdit>,
}

/// Where per-residue secondary structure comes from. At most one per run.
#[derive(Debug, Clone, PartialEq)]
pub enum SecondaryStructureSource {
    /// Run the DSSP executable on the structure.
    Dssp { executable: PathBuf },
    /// A literal code string, one code per residue (or one code for all).
    Literal(String),
    /// Assign the collagen code to every residue.
    Collagen,
}

impl fmt::Display for SecondaryStructureSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dssp { executable } => write!(f, "dssp({})", executable.display()),
            Self::Literal(ss) => write!(f, "literal({})", ss),
            Self::Collagen => write!(f, "collagen"),
        }
    }
}

/// Harmonic springs between backbone beads. Distances in nm.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElasticNetworkConfig {
    pub force_constant: f64,
    pub lower_cutoff: f64,
    pub upper_cutoff: f64,
    /// Minimum residue separation along the chain for a spring.
    pub min_sequence_separation: usize,
}

impl Default for ElasticNetworkConfig {
    fn default() -> Self {
        Self {
            force_constant: 700.0,
            lower_cutoff: 0.0,
            upper_cutoff: 0.9,
            min_sequence_separation: 3,
        }
    }
}

/// Virtual sites on backbone beads connected by Go contacts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VirtualSiteNetworkConfig {
    pub epsilon: f64,
    pub lower_cutoff: f64,
    pub upper_cutoff: f64,
    pub min_sequence_separation: usize,
}

impl Default for VirtualSiteNetworkConfig {
    fn default() -> Self {
        Self {
            epsilon: 9.414,
            lower_cutoff: 0.3,
            upper_cutoff: 1.1,
            min_sequence_separation: 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RestraintSelector {
    #[default]
    Backbone,
    All,
}

impl fmt::Display for RestraintSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Backbone => write!(f, "backbone"),
            Self::All => write!(f, "all"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionRestraintConfig {
    pub selector: RestraintSelector,
    pub force_constant: f64,
}

impl Default for PositionRestraintConfig {
    fn default() -> Self {
        Self {
            selector: RestraintSelector::Backbone,
            force_constant: 1000.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainMergeSpec {
    /// Merge every molecule into one.
    All,
    /// Each group lists the chains to merge together.
    Groups(Vec<Vec<char>>),
}

impl fmt::Display for ChainMergeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => write!(f, "all"),
            Self::Groups(groups) => {
                let groups: Vec<String> = groups.iter().map(|g| g.iter().collect()).collect();
                write!(f, "{}", groups.join(","))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NamingConfig {
    pub prefix: String,
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            prefix: "molecule".to_string(),
        }
    }
}

/// Optional snapshots of the atomistic graph during repair.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DebugConfig {
    /// After bond inference.
    pub write_graph: Option<PathBuf>,
    /// After graph repair.
    pub write_repair: Option<PathBuf>,
    /// After modifications have been canonicalized.
    pub write_canon: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OutputConfig {
    pub structure: PathBuf,
    pub topology: PathBuf,
    pub allow_undefined_positions: bool,
    /// Extra `#define` symbols for the topology document.
    pub defines: Vec<String>,
    pub title: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub input: InputConfig,
    pub source_force_field: String,
    pub target_force_field: String,
    pub bonding: BondingConfig,
    pub repair: RepairConfig,
    pub secondary_structure: Option<SecondaryStructureSource>,
    pub elastic_network: Option<ElasticNetworkConfig>,
    pub virtual_site_network: Option<VirtualSiteNetworkConfig>,
    pub position_restraints: Option<PositionRestraintConfig>,
    pub merge_chains: Option<ChainMergeSpec>,
    pub naming: NamingConfig,
    pub debug: DebugConfig,
    pub output: OutputConfig,
}

#[derive(Default)]
pub struct RunConfigBuilder {
    input_path: Option<PathBuf>,
    exclude_residues: BTreeSet<String>,
    ignore_hydrogens: bool,
    model: Option<usize>,
    source_force_field: Option<String>,
    target_force_field: Option<String>,
    bonding: Option<BondingConfig>,
    repair: RepairConfig,
    secondary_structure: Option<SecondaryStructureSource>,
    elastic_network: Option<ElasticNetworkConfig>,
    virtual_site_network: Option<VirtualSiteNetworkConfig>,
    position_restraints: Option<PositionRestraintConfig>,
    merge_chains: Option<ChainMergeSpec>,
    naming: Option<NamingConfig>,
    debug: DebugConfig,
    output_structure: Option<PathBuf>,
    output_topology: Option<PathBuf>,
    allow_undefined_positions: bool,
    defines: Vec<String>,
    title: Option<String>,
}

impl RunConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn input_path(mut self, path: PathBuf) -> Self {
        self.input_path = Some(path);
        self
    }
    pub fn exclude_residues(mut self, names: impl IntoIterator<Item = String>) -> Self {
        self.exclude_residues.extend(names);
        self
    }
    pub fn ignore_hydrogens(mut self, ignore: bool) -> Self {
        self.ignore_hydrogens = ignore;
        self
    }
    pub fn model(mut self, model: Option<usize>) -> Self {
        self.model = model;
        self
    }
    pub fn source_force_field(mut self, name: String) -> Self {
        self.source_force_field = Some(name);
        self
    }
    pub fn target_force_field(mut self, name: String) -> Self {
        self.target_force_field = Some(name);
        self
    }
    pub fn bonding(mut self, bonding: BondingConfig) -> Self {
        self.bonding = Some(bonding);
        self
    }
    pub fn delete_unknown(mut self, delete: bool) -> Self {
        self.repair.delete_unknown = delete;
        self
    }
    pub fn mutations(mut self, edits: Vec<ResidueEdit>) -> Self {
        self.repair.mutations = edits;
        self
    }
    pub fn modifications(mut self, edits: Vec<ResidueEdit>) -> Self {
        self.repair.modifications = edits;
        self
    }
    pub fn secondary_structure(mut self, source: Option<SecondaryStructureSource>) -> Self {
        self.secondary_structure = source;
        self
    }
    pub fn elastic_network(mut self, params: Option<ElasticNetworkConfig>) -> Self {
        self.elastic_network = params;
        self
    }
    pub fn virtual_site_network(mut self, params: Option<VirtualSiteNetworkConfig>) -> Self {
        self.virtual_site_network = params;
        self
    }
    pub fn position_restraints(mut self, params: Option<PositionRestraintConfig>) -> Self {
        self.position_restraints = params;
        self
    }
    pub fn merge_chains(mut self, spec: Option<ChainMergeSpec>) -> Self {
        self.merge_chains = spec;
        self
    }
    pub fn naming(mut self, naming: NamingConfig) -> Self {
        self.naming = Some(naming);
        self
    }
    pub fn debug(mut self, debug: DebugConfig) -> Self {
        self.debug = debug;
        self
    }
    pub fn output_structure(mut self, path: PathBuf) -> Self {
        self.output_structure = Some(path);
        self
    }
    pub fn output_topology(mut self, path: PathBuf) -> Self {
        self.output_topology = Some(path);
        self
    }
    pub fn allow_undefined_positions(mut self, allow: bool) -> Self {
        self.allow_undefined_positions = allow;
        self
    }
    pub fn defines(mut self, defines: Vec<String>) -> Self {
        self.defines = defines;
        self
    }
    pub fn title(mut self, title: Option<String>) -> Self {
        self.title = title;
        self
    }

    pub fn build(self) -> Result<RunConfig, ConfigError> {
        let input = InputConfig {
            path: self
                .input_path
                .ok_or(ConfigError::MissingParameter("input_path"))?,
            exclude_residues: self.exclude_residues,
            ignore_hydrogens: self.ignore_hydrogens,
            model: self.model,
        };
        let output = OutputConfig {
            structure: self
                .output_structure
                .ok_or(ConfigError::MissingParameter("output_structure"))?,
            topology: self
                .output_topology
                .ok_or(ConfigError::MissingParameter("output_topology"))?,
            allow_undefined_positions: self.allow_undefined_positions,
            defines: self.defines,
            title: self.title,
        };
        Ok(RunConfig {
            input,
            source_force_field: self
                .source_force_field
                .unwrap_or_else(|| DEFAULT_SOURCE_FORCE_FIELD.to_string()),
            target_force_field: self
                .target_force_field
                .unwrap_or_else(|| DEFAULT_TARGET_FORCE_FIELD.to_string()),
            bonding: self.bonding.unwrap_or_default(),
            repair: self.repair,
            secondary_structure: self.secondary_structure,
            elastic_network: self.elastic_network,
            virtual_site_network: self.virtual_site_network,
            position_restraints: self.position_restraints,
            merge_chains: self.merge_chains,
            naming: self.naming.unwrap_or_default(),
            debug: self.debug,
            output,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal() -> RunConfigBuilder {
        RunConfigBuilder::new()
            .input_path(PathBuf::from("in.pdb"))
            .output_structure(PathBuf::from("cg.pdb"))
            .output_topology(PathBuf::from("topol.top"))
    }

    #[test]
    fn builder_applies_defaults() {
        let config = minimal().build().unwrap();
        assert_eq!(config.source_force_field, DEFAULT_SOURCE_FORCE_FIELD);
        assert_eq!(config.target_force_field, DEFAULT_TARGET_FORCE_FIELD);
        assert_eq!(config.bonding, BondingConfig::default());
        assert_eq!(config.naming.prefix, "molecule");
        assert!(config.secondary_structure.is_none());
        assert!(config.elastic_network.is_none());
    }

    #[test]
    fn builder_reports_missing_paths() {
        let err = RunConfigBuilder::new()
            .output_structure(PathBuf::from("cg.pdb"))
            .output_topology(PathBuf::from("topol.top"))
            .build()
            .unwrap_err();
        assert_eq!(err, ConfigError::MissingParameter("input_path"));

        let err = RunConfigBuilder::new()
            .input_path(PathBuf::from("in.pdb"))
            .output_topology(PathBuf::from("topol.top"))
            .build()
            .unwrap_err();
        assert_eq!(err, ConfigError::MissingParameter("output_structure"));
    }

    #[test]
    fn residue_edit_matching_treats_unset_fields_as_wildcards() {
        let edit = ResidueEdit {
            chain: Some('A'),
            resname: None,
            resid: Some(45),
            target: "ALA".to_string(),
        };
        assert!(edit.matches('A', "PHE", 45));
        assert!(edit.matches('A', "TYR", 45));
        assert!(!edit.matches('B', "PHE", 45));
        assert!(!edit.matches('A', "PHE", 46));
    }

    #[test]
    fn residue_edit_display_round_trips_the_cli_form() {
        let edit = ResidueEdit {
            chain: Some('A'),
            resname: Some("PHE".to_string()),
            resid: Some(45),
            target: "ALA".to_string(),
        };
        assert_eq!(edit.to_string(), "A-PHE45:ALA");

        let any_lys = ResidueEdit {
            chain: None,
            resname: Some("LYS".to_string()),
            resid: None,
            target: "LYS0".to_string(),
        };
        assert_eq!(any_lys.to_string(), "LYS:LYS0");
    }

    #[test]
    fn chain_merge_spec_display_joins_groups() {
        let spec = ChainMergeSpec::Groups(vec![vec!['A', 'B'], vec!['C', 'D']]);
        assert_eq!(spec.to_string(), "AB,CD");
        assert_eq!(ChainMergeSpec::All.to_string(), "all");
    }
}
