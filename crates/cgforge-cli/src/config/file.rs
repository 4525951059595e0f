use crate::error::{CliError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileInputConfig {
    pub exclude: Option<Vec<String>>,
    pub ignore_hydrogens: Option<bool>,
    pub model: Option<usize>,
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum FileBondingStrategy {
    Distance,
    None,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileBondsConfig {
    pub strategy: Option<FileBondingStrategy>,
    pub fudge: Option<f64>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileRepairConfig {
    pub delete_unknown: Option<bool>,
    /// Residue edits in `[CHAIN-]RESNAME[RESID]:TARGET` form.
    pub mutations: Option<Vec<String>>,
    pub modifications: Option<Vec<String>>,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "kebab-case", tag = "source")]
pub enum FileSecondaryStructure {
    Dssp { executable: Option<PathBuf> },
    Literal { sequence: String },
    Collagen,
}

/// Presence of the table enables the network.
#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileElasticNetworkConfig {
    pub force_constant: Option<f64>,
    pub lower_cutoff: Option<f64>,
    pub upper_cutoff: Option<f64>,
    pub min_sequence_separation: Option<usize>,
}

/// Presence of the table enables the network.
#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileVirtualSiteNetworkConfig {
    pub epsilon: Option<f64>,
    pub lower_cutoff: Option<f64>,
    pub upper_cutoff: Option<f64>,
    pub min_sequence_separation: Option<usize>,
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum FileRestraintSelector {
    None,
    Backbone,
    All,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FilePositionRestraintConfig {
    pub selector: Option<FileRestraintSelector>,
    pub force_constant: Option<f64>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileDebugConfig {
    pub write_graph: Option<PathBuf>,
    pub write_repair: Option<PathBuf>,
    pub write_canon: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileOutputConfig {
    pub topology: Option<PathBuf>,
    pub defines: Option<Vec<String>>,
    pub title: Option<String>,
    pub allow_undefined_positions: Option<bool>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileConfig {
    pub from: Option<String>,
    pub to: Option<String>,
    pub name_prefix: Option<String>,
    /// Merge groups, each `"A,B"` or `"all"`.
    pub merge: Option<Vec<String>>,
    pub input: Option<FileInputConfig>,
    pub bonds: Option<FileBondsConfig>,
    pub repair: Option<FileRepairConfig>,
    pub secondary_structure: Option<FileSecondaryStructure>,
    pub elastic_network: Option<FileElasticNetworkConfig>,
    pub virtual_site_network: Option<FileVirtualSiteNetworkConfig>,
    pub position_restraints: Option<FilePositionRestraintConfig>,
    pub debug: Option<FileDebugConfig>,
    pub output: Option<FileOutputConfig>,
}

impl FileConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }
}
