use super::config::{
    ChainMergeSpec, ConfigError, ElasticNetworkConfig, RunConfig, SecondaryStructureSource,
    VirtualSiteNetworkConfig,
};
use crate::core::forcefield::library::ForceField;
use crate::core::forcefield::registry::ForceFieldRegistry;
use crate::core::io::format::StructureFormat;
use phf::{Set, phf_set};
use tracing::debug;

/// DSSP codes plus `F` (collagen) and `-` / space for coil.
pub static SECONDARY_STRUCTURE_CODES: Set<char> = phf_set! {
    'H', 'G', 'I', 'P', 'E', 'B', 'T', 'S', 'C', 'F', '-', ' ',
};

/// Rejects a configuration before any stage runs.
///
/// Checks run in a fixed order and stop at the first violation.
pub fn validate(config: &RunConfig, registry: &ForceFieldRegistry) -> Result<(), ConfigError> {
    check_exclusive_options(config)?;
    check_input_format(config)?;
    let (source, target) = check_force_fields(config, registry)?;
    if let Some(ss) = &config.secondary_structure {
        check_secondary_structure(ss)?;
    }
    check_residue_edits(config, source)?;
    check_numeric_values(config)?;
    check_output(config)?;

    debug!(
        source = %source.name,
        target = %target.name,
        "Configuration validated"
    );
    Ok(())
}

fn check_exclusive_options(config: &RunConfig) -> Result<(), ConfigError> {
    if config.elastic_network.is_some() && config.virtual_site_network.is_some() {
        return Err(ConfigError::ConflictingOptions {
            first: "elastic",
            second: "go",
        });
    }
    Ok(())
}

fn check_input_format(config: &RunConfig) -> Result<(), ConfigError> {
    let format =
        StructureFormat::from_path(&config.input.path).map_err(|e| ConfigError::InvalidValue {
            option: "input",
            reason: e.to_string(),
        })?;
    if config.input.model.is_some() && !format.supports_models() {
        return Err(ConfigError::UnsupportedForFormat {
            option: "model",
            format: format.name(),
        });
    }
    if config.input.model == Some(0) {
        return Err(ConfigError::InvalidValue {
            option: "model",
            reason: "model numbers start at 1".to_string(),
        });
    }
    Ok(())
}

fn check_force_fields<'r>(
    config: &RunConfig,
    registry: &'r ForceFieldRegistry,
) -> Result<(&'r ForceField, &'r ForceField), ConfigError> {
    let source = registry
        .get(&config.source_force_field)
        .map_err(|_| ConfigError::UnknownForceField {
            option: "from",
            name: config.source_force_field.clone(),
        })?;
    let target = registry
        .get(&config.target_force_field)
        .map_err(|_| ConfigError::UnknownForceField {
            option: "to",
            name: config.target_force_field.clone(),
        })?;

    if source.is_coarse_grained() {
        return Err(ConfigError::InvalidValue {
            option: "from",
            reason: format!("'{}' is not an atomistic library", source.name),
        });
    }
    if !target.is_coarse_grained() {
        return Err(ConfigError::InvalidValue {
            option: "to",
            reason: format!("'{}' is not a coarse-grained library", target.name),
        });
    }
    Ok((source, target))
}

fn check_secondary_structure(source: &SecondaryStructureSource) -> Result<(), ConfigError> {
    match source {
        SecondaryStructureSource::Literal(ss) => {
            if ss.is_empty() {
                return Err(ConfigError::InvalidValue {
                    option: "ss",
                    reason: "the secondary-structure string is empty".to_string(),
                });
            }
            if let Some((position, code)) = ss
                .chars()
                .enumerate()
                .find(|(_, c)| !SECONDARY_STRUCTURE_CODES.contains(c))
            {
                return Err(ConfigError::UnknownSecondaryStructure { code, position });
            }
            Ok(())
        }
        SecondaryStructureSource::Dssp { executable } => {
            if executable.as_os_str().is_empty() {
                return Err(ConfigError::InvalidValue {
                    option: "dssp",
                    reason: "no executable given".to_string(),
                });
            }
            Ok(())
        }
        SecondaryStructureSource::Collagen => Ok(()),
    }
}

fn check_residue_edits(config: &RunConfig, source: &ForceField) -> Result<(), ConfigError> {
    for edit in &config.repair.mutations {
        if source.residue(&edit.target).is_none() {
            return Err(ConfigError::UnknownResidue {
                name: edit.target.clone(),
                force_field: source.name.clone(),
            });
        }
    }
    for edit in &config.repair.modifications {
        if !source.has_modification(&edit.target) {
            return Err(ConfigError::UnknownModification {
                name: edit.target.clone(),
                force_field: source.name.clone(),
            });
        }
    }
    Ok(())
}

fn positive(option: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidValue {
            option,
            reason: format!("expected a positive number, got {}", value),
        })
    }
}

fn cutoff_range(option: &'static str, lower: f64, upper: f64) -> Result<(), ConfigError> {
    if lower.is_finite() && upper.is_finite() && 0.0 <= lower && lower < upper {
        Ok(())
    } else {
        Err(ConfigError::InvalidValue {
            option,
            reason: format!("expected 0 <= lower < upper, got [{}, {}]", lower, upper),
        })
    }
}

fn check_numeric_values(config: &RunConfig) -> Result<(), ConfigError> {
    positive("bonds-fudge", config.bonding.tolerance)?;

    if let Some(ElasticNetworkConfig {
        force_constant,
        lower_cutoff,
        upper_cutoff,
        ..
    }) = config.elastic_network
    {
        positive("ef", force_constant)?;
        cutoff_range("el/eu", lower_cutoff, upper_cutoff)?;
    }

    if let Some(VirtualSiteNetworkConfig {
        epsilon,
        lower_cutoff,
        upper_cutoff,
        ..
    }) = config.virtual_site_network
    {
        positive("go-eps", epsilon)?;
        cutoff_range("go-low/go-up", lower_cutoff, upper_cutoff)?;
    }

    if let Some(posres) = config.position_restraints {
        positive("posres-fc", posres.force_constant)?;
    }

    if let Some(ChainMergeSpec::Groups(groups)) = &config.merge_chains {
        if groups.is_empty() || groups.iter().any(|g| g.is_empty()) {
            return Err(ConfigError::InvalidValue {
                option: "merge",
                reason: "every merge group must name at least one chain".to_string(),
            });
        }
    }
    Ok(())
}

fn check_output(config: &RunConfig) -> Result<(), ConfigError> {
    StructureFormat::from_path(&config.output.structure).map_err(|e| {
        ConfigError::InvalidValue {
            option: "output",
            reason: e.to_string(),
        }
    })?;
    let snapshots = [
        ("write-graph", &config.debug.write_graph),
        ("write-repair", &config.debug.write_repair),
        ("write-canon", &config.debug.write_canon),
    ];
    for (option, path) in snapshots {
        if let Some(path) = path {
            StructureFormat::from_path(path).map_err(|e| ConfigError::InvalidValue {
                option,
                reason: e.to_string(),
            })?;
        }
    }
    let prefix = &config.naming.prefix;
    if prefix.is_empty() {
        return Err(ConfigError::InvalidValue {
            option: "name",
            reason: "the moltype prefix is empty".to_string(),
        });
    }
    // The prefix becomes a topology token and an .itp file name.
    if prefix.contains(|c: char| c.is_whitespace() || c == '/' || c == '\\') {
        return Err(ConfigError::InvalidValue {
            option: "name",
            reason: format!("'{}' must not contain whitespace or path separators", prefix),
        });
    }
    if let Some(define) = config
        .output
        .defines
        .iter()
        .find(|d| d.is_empty() || d.contains(char::is_whitespace))
    {
        return Err(ConfigError::InvalidValue {
            option: "define",
            reason: format!("'{}' is not a valid preprocessor symbol", define),
        });
    }
    Ok(())
}
