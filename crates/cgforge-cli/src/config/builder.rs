use super::defaults::DefaultsConfig;
use super::file::{
    FileBondingStrategy, FileConfig, FileRestraintSelector, FileSecondaryStructure,
};
use crate::cli::MapArgs;
use crate::error::{CliError, Result};
use crate::utils::parser;
use cgforge::engine::config::{
    self as core_config, BondingConfig, BondingStrategy, DebugConfig, ElasticNetworkConfig,
    NamingConfig, PositionRestraintConfig, ResidueEdit, RestraintSelector, RunConfig,
    SecondaryStructureSource, VirtualSiteNetworkConfig,
};
use std::str::FromStr;
use tracing::debug;

/// Merges command-line arguments, the optional config file, and defaults into a [`RunConfig`].
///
/// Precedence is command line, then `-S` overrides, then the file, then
/// [`DefaultsConfig`]. List options (exclusions, edits, defines) accumulate:
/// file entries come first, command-line entries are appended.
pub fn build_config(args: &MapArgs) -> Result<RunConfig> {
    let defaults = DefaultsConfig::default();

    let file_config = match &args.config {
        Some(path) => FileConfig::from_file(path)?,
        None => FileConfig::default(),
    };
    let mut file = apply_set_values(file_config, &args.set_values)?;

    let input = file.input.take().unwrap_or_default();
    let mut exclude = input.exclude.unwrap_or_default();
    exclude.extend(args.ignore.iter().cloned());

    let bonds = file.bonds.take().unwrap_or_default();
    let bonding = BondingConfig {
        strategy: args
            .bonds_from
            .map(Into::into)
            .or(bonds.strategy.map(|s| match s {
                FileBondingStrategy::Distance => BondingStrategy::Distance,
                FileBondingStrategy::None => BondingStrategy::None,
            }))
            .unwrap_or_default(),
        tolerance: args
            .bonds_fudge
            .or(bonds.fudge)
            .unwrap_or(defaults.bonds_fudge),
    };

    let repair = file.repair.take().unwrap_or_default();
    let mut mutations = parse_edits(repair.mutations.as_deref())?;
    mutations.extend(args.mutations.iter().cloned());
    let mut modifications = parse_edits(repair.modifications.as_deref())?;
    modifications.extend(args.modifications.iter().cloned());

    let (elastic_network, virtual_site_network) = merge_networks(args, &mut file, &defaults);
    let position_restraints = merge_position_restraints(args, &mut file, &defaults);

    let merge_values = if args.merge.is_empty() {
        file.merge.take().unwrap_or_default()
    } else {
        args.merge.clone()
    };
    let merge_chains = parser::parse_merge_groups(&merge_values)
        .map_err(|e| CliError::Argument(e.to_string()))?;

    let debug_file = file.debug.take().unwrap_or_default();
    let debug_config = DebugConfig {
        write_graph: args.write_graph.clone().or(debug_file.write_graph),
        write_repair: args.write_repair.clone().or(debug_file.write_repair),
        write_canon: args.write_canon.clone().or(debug_file.write_canon),
    };

    let output = file.output.take().unwrap_or_default();
    let mut defines = output.defines.unwrap_or_default();
    defines.extend(args.defines.iter().cloned());

    let secondary_structure = merge_secondary_structure(args, file.secondary_structure.take(), &defaults);

    let config = core_config::RunConfigBuilder::new()
        .input_path(args.input.clone())
        .exclude_residues(exclude)
        .ignore_hydrogens(args.ignh || input.ignore_hydrogens.unwrap_or(false))
        .model(args.model.or(input.model))
        .source_force_field(
            args.from
                .clone()
                .or(file.from.take())
                .unwrap_or(defaults.source_force_field),
        )
        .target_force_field(
            args.to
                .clone()
                .or(file.to.take())
                .unwrap_or(defaults.target_force_field),
        )
        .bonding(bonding)
        .delete_unknown(args.delete_unknown || repair.delete_unknown.unwrap_or(false))
        .mutations(mutations)
        .modifications(modifications)
        .secondary_structure(secondary_structure)
        .elastic_network(elastic_network)
        .virtual_site_network(virtual_site_network)
        .position_restraints(position_restraints)
        .merge_chains(merge_chains)
        .naming(NamingConfig {
            prefix: args
                .name_prefix
                .clone()
                .or(file.name_prefix.take())
                .unwrap_or(defaults.name_prefix),
        })
        .debug(debug_config)
        .output_structure(args.output.clone())
        .output_topology(
            args.topology
                .clone()
                .or(output.topology)
                .unwrap_or(defaults.topology),
        )
        .allow_undefined_positions(
            args.allow_undefined || output.allow_undefined_positions.unwrap_or(false),
        )
        .defines(defines)
        .title(args.title.clone().or(output.title))
        .build()
        .map_err(|e| CliError::Config(e.to_string()))?;

    debug!("Merged run configuration: {:?}", config);
    Ok(config)
}

fn parse_edits(specs: Option<&[String]>) -> Result<Vec<ResidueEdit>> {
    specs
        .unwrap_or_default()
        .iter()
        .map(|s| parser::parse_residue_edit(s).map_err(|e| CliError::Config(e.to_string())))
        .collect()
}

fn merge_secondary_structure(
    args: &MapArgs,
    file_val: Option<FileSecondaryStructure>,
    defaults: &DefaultsConfig,
) -> Option<SecondaryStructureSource> {
    let ss = &args.secondary_structure;
    if let Some(executable) = &ss.dssp {
        return Some(SecondaryStructureSource::Dssp {
            executable: executable.clone(),
        });
    }
    if let Some(sequence) = &ss.ss {
        return Some(SecondaryStructureSource::Literal(sequence.clone()));
    }
    if ss.collagen {
        return Some(SecondaryStructureSource::Collagen);
    }
    file_val.map(|f| match f {
        FileSecondaryStructure::Dssp { executable } => SecondaryStructureSource::Dssp {
            executable: executable.unwrap_or_else(|| defaults.dssp_executable.clone()),
        },
        FileSecondaryStructure::Literal { sequence } => SecondaryStructureSource::Literal(sequence),
        FileSecondaryStructure::Collagen => SecondaryStructureSource::Collagen,
    })
}

/// A network flag on the command line replaces whatever the file enables.
fn merge_networks(
    args: &MapArgs,
    file: &mut FileConfig,
    defaults: &DefaultsConfig,
) -> (Option<ElasticNetworkConfig>, Option<VirtualSiteNetworkConfig>) {
    let elastic_file = file.elastic_network.take();
    let go_file = file.virtual_site_network.take();
    let (want_elastic, want_go) = if args.elastic || args.go {
        (args.elastic, args.go)
    } else {
        (elastic_file.is_some(), go_file.is_some())
    };

    let elastic = want_elastic.then(|| {
        let f = elastic_file.unwrap_or_default();
        let d = defaults.elastic_network;
        ElasticNetworkConfig {
            force_constant: args.ef.or(f.force_constant).unwrap_or(d.force_constant),
            lower_cutoff: args.el.or(f.lower_cutoff).unwrap_or(d.lower_cutoff),
            upper_cutoff: args.eu.or(f.upper_cutoff).unwrap_or(d.upper_cutoff),
            min_sequence_separation: f
                .min_sequence_separation
                .unwrap_or(d.min_sequence_separation),
        }
    });
    let go = want_go.then(|| {
        let f = go_file.unwrap_or_default();
        let d = defaults.virtual_site_network;
        VirtualSiteNetworkConfig {
            epsilon: args.go_eps.or(f.epsilon).unwrap_or(d.epsilon),
            lower_cutoff: args.go_low.or(f.lower_cutoff).unwrap_or(d.lower_cutoff),
            upper_cutoff: args.go_up.or(f.upper_cutoff).unwrap_or(d.upper_cutoff),
            min_sequence_separation: f
                .min_sequence_separation
                .unwrap_or(d.min_sequence_separation),
        }
    });
    (elastic, go)
}

fn merge_position_restraints(
    args: &MapArgs,
    file: &mut FileConfig,
    defaults: &DefaultsConfig,
) -> Option<PositionRestraintConfig> {
    let file_val = file.position_restraints.take();
    let selector = match args.posres {
        Some(mode) => mode.selector(),
        None => file_val.as_ref().and_then(|f| match f.selector {
            Some(FileRestraintSelector::None) => None,
            Some(FileRestraintSelector::All) => Some(RestraintSelector::All),
            Some(FileRestraintSelector::Backbone) | None => Some(RestraintSelector::Backbone),
        }),
    }?;
    Some(PositionRestraintConfig {
        selector,
        force_constant: args
            .posres_fc
            .or(file_val.and_then(|f| f.force_constant))
            .unwrap_or(defaults.position_restraints.force_constant),
    })
}

fn parse_value<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value.parse().map_err(|_| {
        CliError::Config(format!(
            "Invalid {} value for {}: {}",
            std::any::type_name::<T>(),
            key,
            value
        ))
    })
}

/// Applies `-S key=value` overrides on top of the file. Setting a key inside
/// an optional table creates that table, which enables the feature.
fn apply_set_values(mut config: FileConfig, set_values: &[String]) -> Result<FileConfig> {
    for kv_pair in set_values {
        let (key, value) =
            parser::split_key_value(kv_pair).map_err(|e| CliError::Config(e.to_string()))?;

        match key {
            "bonds.fudge" => {
                config.bonds.get_or_insert_with(Default::default).fudge =
                    Some(parse_value(key, value)?);
            }
            "input.model" => {
                config.input.get_or_insert_with(Default::default).model =
                    Some(parse_value(key, value)?);
            }
            "elastic-network.force-constant" => {
                config
                    .elastic_network
                    .get_or_insert_with(Default::default)
                    .force_constant = Some(parse_value(key, value)?);
            }
            "elastic-network.lower-cutoff" => {
                config
                    .elastic_network
                    .get_or_insert_with(Default::default)
                    .lower_cutoff = Some(parse_value(key, value)?);
            }
            "elastic-network.upper-cutoff" => {
                config
                    .elastic_network
                    .get_or_insert_with(Default::default)
                    .upper_cutoff = Some(parse_value(key, value)?);
            }
            "elastic-network.min-sequence-separation" => {
                config
                    .elastic_network
                    .get_or_insert_with(Default::default)
                    .min_sequence_separation = Some(parse_value(key, value)?);
            }
            "virtual-site-network.epsilon" => {
                config
                    .virtual_site_network
                    .get_or_insert_with(Default::default)
                    .epsilon = Some(parse_value(key, value)?);
            }
            "virtual-site-network.lower-cutoff" => {
                config
                    .virtual_site_network
                    .get_or_insert_with(Default::default)
                    .lower_cutoff = Some(parse_value(key, value)?);
            }
            "virtual-site-network.upper-cutoff" => {
                config
                    .virtual_site_network
                    .get_or_insert_with(Default::default)
                    .upper_cutoff = Some(parse_value(key, value)?);
            }
            "virtual-site-network.min-sequence-separation" => {
                config
                    .virtual_site_network
                    .get_or_insert_with(Default::default)
                    .min_sequence_separation = Some(parse_value(key, value)?);
            }
            "position-restraints.force-constant" => {
                config
                    .position_restraints
                    .get_or_insert_with(Default::default)
                    .force_constant = Some(parse_value(key, value)?);
            }
            _ => {
                return Err(CliError::Config(format!(
                    "Unsupported configuration key for --set: '{}'",
                    key
                )));
            }
        }
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use clap::Parser;
    use cgforge::engine::config::ChainMergeSpec;
    use std::fs;
    use std::path::{Path, PathBuf};
    use tempfile::tempdir;

    fn map_args(extra: &[&str]) -> MapArgs {
        let mut argv = vec!["cgforge", "map", "-f", "in.pdb", "-x", "cg.gro"];
        argv.extend_from_slice(extra);
        match Cli::parse_from(argv).command {
            Commands::Map(args) => args,
            other => panic!("expected map, got {:?}", other),
        }
    }

    fn write_config(dir: &Path, content: &str) -> PathBuf {
        let path = dir.join("cgforge.toml");
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn defaults_fill_everything_not_given() {
        let cfg = build_config(&map_args(&[])).unwrap();
        let defaults = DefaultsConfig::default();

        assert_eq!(cfg.source_force_field, defaults.source_force_field);
        assert_eq!(cfg.target_force_field, defaults.target_force_field);
        assert_eq!(cfg.bonding.tolerance, defaults.bonds_fudge);
        assert_eq!(cfg.output.topology, defaults.topology);
        assert_eq!(cfg.naming.prefix, defaults.name_prefix);
        assert!(cfg.secondary_structure.is_none());
        assert!(cfg.elastic_network.is_none());
        assert!(cfg.virtual_site_network.is_none());
        assert!(cfg.position_restraints.is_none());
        assert!(cfg.merge_chains.is_none());
    }

    #[test]
    fn file_values_are_used_and_cli_flags_win() {
        let dir = tempdir().unwrap();
        let path = write_config(
            dir.path(),
            r#"
            to = "martini3001"
            name-prefix = "protein"
            merge = ["A,B"]

            [input]
            exclude = ["HOH"]

            [bonds]
            fudge = 1.1

            [repair]
            mutations = ["A-PHE45:ALA"]

            [elastic-network]
            force-constant = 500.0
            upper-cutoff = 1.0

            [position-restraints]
            selector = "all"
            force-constant = 250.0
            "#,
        );
        let cfg = build_config(&map_args(&[
            "-c",
            path.to_str().unwrap(),
            "--bonds-fudge",
            "1.4",
            "--ef",
            "800",
            "--ignore",
            "SOL",
            "--mutate",
            "B-GLY2:ALA",
        ]))
        .unwrap();

        assert_eq!(cfg.naming.prefix, "protein");
        assert_eq!(cfg.bonding.tolerance, 1.4);
        let elastic = cfg.elastic_network.unwrap();
        assert_eq!(elastic.force_constant, 800.0);
        assert_eq!(elastic.upper_cutoff, 1.0);
        assert_eq!(elastic.lower_cutoff, ElasticNetworkConfig::default().lower_cutoff);
        assert_eq!(
            cfg.input.exclude_residues.iter().collect::<Vec<_>>(),
            vec!["HOH", "SOL"]
        );
        let targets: Vec<&str> = cfg.repair.mutations.iter().map(|m| m.target.as_str()).collect();
        assert_eq!(targets, vec!["ALA", "ALA"]);
        assert_eq!(cfg.repair.mutations[1].chain, Some('B'));
        assert_eq!(
            cfg.position_restraints,
            Some(PositionRestraintConfig {
                selector: RestraintSelector::All,
                force_constant: 250.0,
            })
        );
        assert_eq!(
            cfg.merge_chains,
            Some(ChainMergeSpec::Groups(vec![vec!['A', 'B']]))
        );
    }

    #[test]
    fn go_flag_replaces_the_file_elastic_network() {
        let dir = tempdir().unwrap();
        let path = write_config(dir.path(), "[elastic-network]\n");
        let cfg = build_config(&map_args(&["-c", path.to_str().unwrap(), "--go"])).unwrap();
        assert!(cfg.elastic_network.is_none());
        assert_eq!(
            cfg.virtual_site_network,
            Some(VirtualSiteNetworkConfig::default())
        );
    }

    #[test]
    fn file_enabling_both_networks_is_left_for_validation() {
        let dir = tempdir().unwrap();
        let path = write_config(dir.path(), "[elastic-network]\n[virtual-site-network]\n");
        let cfg = build_config(&map_args(&["-c", path.to_str().unwrap()])).unwrap();
        assert!(cfg.elastic_network.is_some());
        assert!(cfg.virtual_site_network.is_some());
    }

    #[test]
    fn set_values_override_file_and_enable_tables() {
        let dir = tempdir().unwrap();
        let path = write_config(dir.path(), "[bonds]\nfudge = 1.1\n");
        let cfg = build_config(&map_args(&[
            "-c",
            path.to_str().unwrap(),
            "-S",
            "bonds.fudge=1.3",
            "-S",
            "virtual-site-network.epsilon=12.5",
        ]))
        .unwrap();

        assert_eq!(cfg.bonding.tolerance, 1.3);
        assert_eq!(cfg.virtual_site_network.unwrap().epsilon, 12.5);
    }

    #[test]
    fn bad_set_values_are_rejected() {
        for set in ["bonds.fudge=abc", "bonds.tolerance=1.2", "bonds.fudge"] {
            let err = build_config(&map_args(&["-S", set])).unwrap_err();
            assert!(matches!(err, CliError::Config(_)), "{}", set);
        }
    }

    #[test]
    fn posres_none_disables_file_restraints() {
        let dir = tempdir().unwrap();
        let path = write_config(dir.path(), "[position-restraints]\n");
        let from_file = build_config(&map_args(&["-c", path.to_str().unwrap()])).unwrap();
        assert_eq!(
            from_file.position_restraints,
            Some(PositionRestraintConfig::default())
        );

        let disabled =
            build_config(&map_args(&["-c", path.to_str().unwrap(), "-p", "none"])).unwrap();
        assert!(disabled.position_restraints.is_none());
    }

    #[test]
    fn secondary_structure_from_file_uses_default_dssp() {
        let dir = tempdir().unwrap();
        let path = write_config(dir.path(), "[secondary-structure]\nsource = \"dssp\"\n");
        let cfg = build_config(&map_args(&["-c", path.to_str().unwrap()])).unwrap();
        assert_eq!(
            cfg.secondary_structure,
            Some(SecondaryStructureSource::Dssp {
                executable: PathBuf::from("mkdssp")
            })
        );

        let cli = build_config(&map_args(&["-c", path.to_str().unwrap(), "--collagen"])).unwrap();
        assert_eq!(cli.secondary_structure, Some(SecondaryStructureSource::Collagen));
    }

    #[test]
    fn malformed_file_edits_are_config_errors() {
        let dir = tempdir().unwrap();
        let path = write_config(dir.path(), "[repair]\nmodifications = [\"LYS12\"]\n");
        let err = build_config(&map_args(&["-c", path.to_str().unwrap()])).unwrap_err();
        assert!(matches!(err, CliError::Config(_)));
    }
}
