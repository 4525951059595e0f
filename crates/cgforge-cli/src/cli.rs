use crate::utils::parser;
use cgforge::engine::config::{BondingStrategy, ResidueEdit, RestraintSelector};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author = "Tony Kan, Ted Yu",
    version,
    about = "cgforge - Converts atomistic protein structures into coarse-grained models with GROMACS topologies.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Directory holding additional force-field libraries (*.toml).
    /// Overrides CGFORGE_DATA_DIR and the default data directory.
    #[arg(long, global = true, value_name = "DIR")]
    pub ff_dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Map an atomistic structure to a coarse-grained model and write its topology.
    Map(MapArgs),
    /// List the known force-field libraries and their features.
    Forcefields(ForcefieldsArgs),
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BondsFrom {
    /// Infer bonds from interatomic distances.
    Distance,
    /// Do not infer bonds.
    None,
}

impl From<BondsFrom> for BondingStrategy {
    fn from(b: BondsFrom) -> Self {
        match b {
            BondsFrom::Distance => BondingStrategy::Distance,
            BondsFrom::None => BondingStrategy::None,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PosresMode {
    None,
    Backbone,
    All,
}

impl PosresMode {
    pub fn selector(self) -> Option<RestraintSelector> {
        match self {
            Self::None => None,
            Self::Backbone => Some(RestraintSelector::Backbone),
            Self::All => Some(RestraintSelector::All),
        }
    }
}

/// Arguments for the `map` subcommand.
#[derive(Args, Debug)]
pub struct MapArgs {
    // --- Input / Output ---
    /// Input atomistic structure (PDB or GRO).
    #[arg(short = 'f', long, required = true, value_name = "PATH")]
    pub input: PathBuf,

    /// Output coarse-grained structure (PDB or GRO).
    #[arg(short = 'x', long, required = true, value_name = "PATH")]
    pub output: PathBuf,

    /// Output topology document. Per-moltype .itp files are written next to it.
    #[arg(short = 'o', long = "top", value_name = "PATH")]
    pub topology: Option<PathBuf>,

    /// Optional configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    // --- Input Filtering ---
    /// Model number to read from multi-model PDB files.
    #[arg(long, value_name = "INT")]
    pub model: Option<usize>,

    /// Residue names to drop while reading (comma-separated or repeated).
    #[arg(long = "ignore", value_name = "RESNAME", value_delimiter = ',')]
    pub ignore: Vec<String>,

    /// Drop all hydrogen atoms from the input.
    #[arg(long)]
    pub ignh: bool,

    // --- Force Fields ---
    /// Atomistic force field the input follows.
    #[arg(long, value_name = "NAME")]
    pub from: Option<String>,

    /// Coarse-grained force field to map to.
    #[arg(long, visible_alias = "ff", value_name = "NAME")]
    pub to: Option<String>,

    // --- Graph Repair ---
    /// How bonds are inferred in the input.
    #[arg(long, value_enum, value_name = "STRATEGY")]
    pub bonds_from: Option<BondsFrom>,

    /// Tolerance factor applied to covalent radii when inferring bonds.
    #[arg(long, value_name = "FLOAT")]
    pub bonds_fudge: Option<f64>,

    /// Delete residues unknown to the source force field instead of failing.
    #[arg(long)]
    pub delete_unknown: bool,

    /// Mutate residues before repair. Example: --mutate A-PHE45:ALA
    #[arg(long = "mutate", value_name = "SPEC", value_parser = parse_edit)]
    pub mutations: Vec<ResidueEdit>,

    /// Apply a named modification. Example: --modify A-LYS12:LYS0
    #[arg(long = "modify", value_name = "SPEC", value_parser = parse_edit)]
    pub modifications: Vec<ResidueEdit>,

    // --- Secondary Structure ---
    #[command(flatten)]
    pub secondary_structure: SecondaryStructureArgs,

    // --- Networks ---
    /// Add an elastic network between backbone beads.
    #[arg(long, conflicts_with = "go")]
    pub elastic: bool,

    /// Elastic network force constant (kJ/mol/nm^2).
    #[arg(long, value_name = "FLOAT")]
    pub ef: Option<f64>,

    /// Elastic network lower cutoff (nm).
    #[arg(long, value_name = "FLOAT")]
    pub el: Option<f64>,

    /// Elastic network upper cutoff (nm).
    #[arg(long, value_name = "FLOAT")]
    pub eu: Option<f64>,

    /// Add virtual sites and a Go contact network.
    #[arg(long)]
    pub go: bool,

    /// Go contact well depth (kJ/mol).
    #[arg(long, value_name = "FLOAT")]
    pub go_eps: Option<f64>,

    /// Go contact lower cutoff (nm).
    #[arg(long, value_name = "FLOAT")]
    pub go_low: Option<f64>,

    /// Go contact upper cutoff (nm).
    #[arg(long, value_name = "FLOAT")]
    pub go_up: Option<f64>,

    // --- Restraints, Merging, Naming ---
    /// Which beads receive position restraints.
    #[arg(short = 'p', long, value_enum, value_name = "MODE")]
    pub posres: Option<PosresMode>,

    /// Position restraint force constant (kJ/mol/nm^2).
    #[arg(long, value_name = "FLOAT")]
    pub posres_fc: Option<f64>,

    /// Chains to merge into one molecule, e.g. 'A,B'. Repeat for more groups, or pass 'all'.
    #[arg(long = "merge", value_name = "CHAINS")]
    pub merge: Vec<String>,

    /// Prefix for generated moltype names.
    #[arg(long = "name", value_name = "PREFIX")]
    pub name_prefix: Option<String>,

    // --- Output ---
    /// Extra preprocessor symbol for the topology. Can be used multiple times.
    #[arg(short = 'D', long = "define", value_name = "SYMBOL")]
    pub defines: Vec<String>,

    /// Title of the [ system ] section.
    #[arg(long, value_name = "TEXT")]
    pub title: Option<String>,

    /// Write beads without coordinates at the origin instead of failing.
    #[arg(long)]
    pub allow_undefined: bool,

    // --- Debug Snapshots ---
    /// Write the atomistic structure after bond inference.
    #[arg(long, value_name = "PATH")]
    pub write_graph: Option<PathBuf>,

    /// Write the atomistic structure after graph repair.
    #[arg(long, value_name = "PATH")]
    pub write_repair: Option<PathBuf>,

    /// Write the atomistic structure after modifications are applied.
    #[arg(long, value_name = "PATH")]
    pub write_canon: Option<PathBuf>,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S elastic-network.force-constant=500
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}

/// Secondary-structure sources. At most one may be given.
#[derive(Args, Debug, Clone, Default)]
#[group(required = false, multiple = false)]
pub struct SecondaryStructureArgs {
    /// Run DSSP to assign secondary structure, optionally naming the executable.
    #[arg(long, value_name = "PATH", num_args(0..=1), default_missing_value = "mkdssp")]
    pub dssp: Option<PathBuf>,

    /// Literal secondary-structure codes, one per residue or one for all.
    #[arg(long, value_name = "CODES")]
    pub ss: Option<String>,

    /// Treat every residue as collagen.
    #[arg(long)]
    pub collagen: bool,
}

/// Arguments for the `forcefields` subcommand.
#[derive(Args, Debug)]
pub struct ForcefieldsArgs {
    /// Show details for a single library.
    #[arg(value_name = "NAME")]
    pub name: Option<String>,
}

fn parse_edit(s: &str) -> Result<ResidueEdit, String> {
    parser::parse_residue_edit(s).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        let mut full = vec!["cgforge", "map", "-f", "in.pdb", "-x", "cg.gro"];
        full.extend_from_slice(args);
        Cli::try_parse_from(full)
    }

    fn map_args(cli: Cli) -> MapArgs {
        match cli.command {
            Commands::Map(args) => args,
            other => panic!("expected map, got {:?}", other),
        }
    }

    #[test]
    fn minimal_map_invocation_parses() {
        let args = map_args(parse(&[]).unwrap());
        assert_eq!(args.input, PathBuf::from("in.pdb"));
        assert_eq!(args.output, PathBuf::from("cg.gro"));
        assert!(args.topology.is_none());
        assert!(!args.elastic && !args.go);
    }

    #[test]
    fn residue_edits_are_parsed_at_the_command_line() {
        let args = map_args(parse(&["--mutate", "A-PHE45:ALA", "--modify", "LYS:LYS0"]).unwrap());
        assert_eq!(args.mutations.len(), 1);
        assert_eq!(args.mutations[0].resid, Some(45));
        assert_eq!(args.modifications[0].target, "LYS0");
        assert!(parse(&["--mutate", "PHE45"]).is_err());
    }

    #[test]
    fn secondary_structure_sources_are_mutually_exclusive() {
        assert!(parse(&["--ss", "HHH", "--collagen"]).is_err());
        assert!(parse(&["--dssp", "--ss", "H"]).is_err());

        let args = map_args(parse(&["--dssp"]).unwrap());
        assert_eq!(args.secondary_structure.dssp, Some(PathBuf::from("mkdssp")));
    }

    #[test]
    fn elastic_and_go_conflict() {
        assert!(parse(&["--elastic", "--go"]).is_err());
        assert!(parse(&["--go", "--go-eps", "10"]).is_ok());
    }

    #[test]
    fn ff_is_an_alias_for_to() {
        let args = map_args(parse(&["--ff", "martini3001", "-p", "all"]).unwrap());
        assert_eq!(args.to.as_deref(), Some("martini3001"));
        assert_eq!(args.posres, Some(PosresMode::All));
    }
}
