use crate::core::forcefield::registry::ForceFieldRegistry;
use crate::core::io::format::{read_structure, write_structure};
use crate::core::io::traits::{ReadOptions, WriteOptions};
use crate::core::topology::itp::{GO_VIRT_DEFINE, RUBBER_BANDS_DEFINE};
use crate::core::topology::{MoltypeGroup, TopologyOptions, write_topology};
use crate::engine::config::RunConfig;
use crate::engine::diagnostics::{Diagnostics, Severity};
use crate::engine::error::EngineError;
use crate::engine::pipeline::PipelineBuilder;
use crate::engine::processor::ProcessContext;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::validate::validate;
use std::path::PathBuf;
use tracing::{info, instrument, warn};

/// What a completed run produced.
#[derive(Debug)]
pub struct RunSummary {
    /// The executed stages, one description per invocation.
    pub stages: Vec<String>,
    pub groups: Vec<MoltypeGroup>,
    pub itp_paths: Vec<PathBuf>,
    pub topology_path: PathBuf,
    pub structure_path: PathBuf,
    pub diagnostics: Diagnostics,
}

/// Converts the configured atomistic structure into a coarse-grained structure and topology.
///
/// The configuration is validated before the input is read. Any error aborts
/// the run; files already written at that point are not guaranteed to be
/// consistent with each other.
#[instrument(skip_all, name = "coarsen_workflow")]
pub fn run(
    config: &RunConfig,
    registry: &ForceFieldRegistry,
    reporter: &ProgressReporter,
) -> Result<RunSummary, EngineError> {
    validate(config, registry)?;

    let mut system = reporter.phase("Reading input", || {
        let options = ReadOptions {
            exclude_residues: config.input.exclude_residues.clone(),
            ignore_hydrogens: config.input.ignore_hydrogens,
            model: config.input.model,
        };
        read_structure(&config.input.path, &options)
    })?;
    info!(
        molecules = system.molecule_count(),
        atoms = system.node_count(),
        "Read {}",
        config.input.path.display()
    );

    let pipeline = PipelineBuilder::new(config).build();
    let stages = pipeline.describe();
    for (i, stage) in stages.iter().enumerate() {
        reporter.report(Progress::Message(format!("{:>2}. {}", i + 1, stage)));
    }

    let mut ctx = ProcessContext::new(registry);
    pipeline.run(&mut system, &mut ctx, reporter)?;
    let diagnostics = ctx.into_diagnostics();

    let report = reporter.phase("Writing output", || -> Result<_, EngineError> {
        let options = topology_options(config, registry)?;
        let report = write_topology(&system, &config.output.topology, &options)?;

        let write_options = WriteOptions {
            allow_undefined_positions: config.output.allow_undefined_positions,
        };
        write_structure(&system, &config.output.structure, &write_options).map_err(
            |source| EngineError::Write {
                path: config.output.structure.clone(),
                source,
            },
        )?;
        Ok(report)
    })?;

    let warnings = diagnostics.count(Severity::Warning);
    if warnings > 0 {
        warn!("Run finished with {} warning(s)", warnings);
    }
    info!(
        moltypes = report.itp_paths.len(),
        groups = report.groups.len(),
        "Coarse-graining complete"
    );

    Ok(RunSummary {
        stages,
        groups: report.groups,
        itp_paths: report.itp_paths,
        topology_path: report.top_path,
        structure_path: config.output.structure.clone(),
        diagnostics,
    })
}

fn topology_options(
    config: &RunConfig,
    registry: &ForceFieldRegistry,
) -> Result<TopologyOptions, EngineError> {
    let target = registry.get(&config.target_force_field)?;

    let mut defines = config.output.defines.clone();
    let network = if config.elastic_network.is_some() {
        Some(RUBBER_BANDS_DEFINE)
    } else if config.virtual_site_network.is_some() {
        Some(GO_VIRT_DEFINE)
    } else {
        None
    };
    if let Some(define) = network {
        if !defines.iter().any(|d| d == define) {
            defines.push(define.to_string());
        }
    }

    Ok(TopologyOptions {
        defines,
        library_include: target.include.clone(),
        title: config.output.title.clone(),
        header: vec![format!(
            "Generated by cgforge {} ({} -> {})",
            env!("CARGO_PKG_VERSION"),
            config.source_force_field,
            config.target_force_field
        )],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::io::pdb::PdbFile;
    use crate::core::io::traits::MolecularFile;
    use crate::core::models::molecule::Molecule;
    use crate::core::models::node::Node;
    use crate::core::models::system::System;
    use crate::engine::config::{
        ConfigError, ElasticNetworkConfig, RunConfigBuilder, VirtualSiteNetworkConfig,
    };
    use nalgebra::Point3;
    use std::fs;
    use std::path::Path;
    use std::sync::Mutex;
    use tempfile::tempdir;

    /// Writes an ALA-GLY dipeptide per chain, with chains offset along z.
    fn write_dipeptides(path: &Path, chains: &[char]) {
        let residue_atoms: [(&str, isize, &[(&str, [f64; 3])]); 2] = [
            (
                "ALA",
                1,
                &[
                    ("N", [0.000, 0.000, 0.0]),
                    ("CA", [0.146, 0.000, 0.0]),
                    ("C", [0.200, 0.140, 0.0]),
                    ("O", [0.130, 0.240, 0.0]),
                    ("CB", [0.200, -0.090, 0.1]),
                ],
            ),
            (
                "GLY",
                2,
                &[
                    ("N", [0.330, 0.150, 0.0]),
                    ("CA", [0.400, 0.280, 0.0]),
                    ("C", [0.550, 0.260, 0.0]),
                    ("O", [0.610, 0.160, 0.0]),
                ],
            ),
        ];

        let mut system = System::new();
        system.title = "dipeptides".to_string();
        for (offset, &chain) in chains.iter().enumerate() {
            let mut molecule = Molecule::new();
            for (resname, resid, atoms) in &residue_atoms {
                for (name, [x, y, z]) in atoms.iter() {
                    let position = Point3::new(*x, *y, *z + 2.0 * offset as f64);
                    molecule.add_node(
                        Node::new(name, resname, *resid, chain).with_position(position),
                    );
                }
            }
            system.add_molecule(molecule);
        }
        PdbFile::write_to_path(&system, path, &WriteOptions::default()).unwrap();
    }

    fn config_in(dir: &Path) -> RunConfigBuilder {
        RunConfigBuilder::new()
            .input_path(dir.join("in.pdb"))
            .output_structure(dir.join("cg.gro"))
            .output_topology(dir.join("topol.top"))
    }

    #[test]
    fn identical_chains_share_one_moltype_and_description() {
        let dir = tempdir().unwrap();
        write_dipeptides(&dir.path().join("in.pdb"), &['A', 'B']);
        let config = config_in(dir.path())
            .elastic_network(Some(ElasticNetworkConfig::default()))
            .build()
            .unwrap();
        let registry = ForceFieldRegistry::builtin().unwrap();

        let summary = run(&config, &registry, &ProgressReporter::new()).unwrap();

        assert_eq!(summary.groups.len(), 1);
        assert_eq!(summary.groups[0].moltype, "molecule_0");
        assert_eq!(summary.groups[0].count, 2);
        assert_eq!(summary.itp_paths, vec![dir.path().join("molecule_0.itp")]);

        let top = fs::read_to_string(dir.path().join("topol.top")).unwrap();
        assert!(top.contains("#define RUBBER_BANDS\n"));
        assert!(top.contains("#include \"martini_v3.0.0.itp\"\n"));
        assert!(top.contains("#include \"molecule_0.itp\"\n"));
        assert!(top.ends_with("[ molecules ]\nmolecule_0    2\n"));
        assert!(top.contains("[ system ]\ndipeptides\n"));

        let itp = fs::read_to_string(&summary.itp_paths[0]).unwrap();
        assert!(itp.contains("[ moleculetype ]"));
        assert!(itp.contains("Q5"));

        let gro = fs::read_to_string(dir.path().join("cg.gro")).unwrap();
        assert_eq!(gro.lines().nth(1).map(str::trim), Some("6"));
    }

    #[test]
    fn differing_chains_are_listed_in_input_order() {
        let dir = tempdir().unwrap();
        write_dipeptides(&dir.path().join("in.pdb"), &['A', 'B', 'C']);
        let config = config_in(dir.path())
            .mutations(vec![crate::engine::config::ResidueEdit {
                chain: Some('B'),
                resname: Some("GLY".into()),
                resid: Some(2),
                target: "ALA".into(),
            }])
            .allow_undefined_positions(true)
            .build()
            .unwrap();
        let registry = ForceFieldRegistry::builtin().unwrap();

        // GLY -> ALA leaves the side-chain bead without atoms, which only warns.
        let summary = run(&config, &registry, &ProgressReporter::new()).unwrap();
        let groups: Vec<(&str, usize)> = summary
            .groups
            .iter()
            .map(|g| (g.moltype.as_str(), g.count))
            .collect();
        assert_eq!(
            groups,
            vec![("molecule_0", 1), ("molecule_1", 1), ("molecule_0", 1)]
        );
        assert_eq!(summary.itp_paths.len(), 2);
        assert!(summary.diagnostics.count(Severity::Warning) > 0);

        let top = fs::read_to_string(dir.path().join("topol.top")).unwrap();
        assert!(top.ends_with("molecule_0    1\nmolecule_1    1\nmolecule_0    1\n"));
    }

    #[test]
    fn conflicting_networks_fail_before_reading_the_input() {
        let dir = tempdir().unwrap();
        let config = config_in(dir.path())
            .elastic_network(Some(ElasticNetworkConfig::default()))
            .virtual_site_network(Some(VirtualSiteNetworkConfig::default()))
            .build()
            .unwrap();
        let registry = ForceFieldRegistry::builtin().unwrap();

        let err = run(&config, &registry, &ProgressReporter::new()).unwrap_err();

        assert!(matches!(
            err,
            EngineError::Config(ConfigError::ConflictingOptions { .. })
        ));
        assert!(!dir.path().join("topol.top").exists());
    }

    #[test]
    fn progress_covers_every_phase_in_order() {
        let dir = tempdir().unwrap();
        write_dipeptides(&dir.path().join("in.pdb"), &['A']);
        let config = config_in(dir.path())
            .secondary_structure(Some(
                crate::engine::config::SecondaryStructureSource::Literal("C".into()),
            ))
            .build()
            .unwrap();
        let registry = ForceFieldRegistry::builtin().unwrap();
        let phases = Mutex::new(Vec::new());
        let reporter = ProgressReporter::with_callback(Box::new(|e| {
            if let Progress::PhaseStart { name } = e {
                phases.lock().unwrap().push(name);
            }
        }));

        run(&config, &registry, &reporter).unwrap();

        assert_eq!(
            *phases.lock().unwrap(),
            vec![
                "Reading input",
                "Repair",
                "Secondary structure",
                "Mapping",
                "Decoration",
                "Writing output"
            ]
        );
    }

    #[test]
    fn missing_input_is_an_io_error() {
        let dir = tempdir().unwrap();
        let config = config_in(dir.path()).build().unwrap();
        let registry = ForceFieldRegistry::builtin().unwrap();

        let err = run(&config, &registry, &ProgressReporter::new()).unwrap_err();

        assert!(matches!(err, EngineError::Io(_)));
    }
}
