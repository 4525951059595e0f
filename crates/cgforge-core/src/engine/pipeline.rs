use super::config::{
    BondingConfig, ChainMergeSpec, ElasticNetworkConfig, PositionRestraintConfig, ResidueEdit,
    RunConfig, SecondaryStructureSource, VirtualSiteNetworkConfig,
};
use super::error::EngineError;
use super::processor::{ProcessContext, Processor};
use super::progress::{Progress, ProgressReporter};
use super::stages::{self, *};
use crate::core::models::system::System;
use std::fmt;
use std::path::PathBuf;
use tracing::{debug, info};

/// The fixed macro-phases of a run, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Phase {
    Repair,
    SecondaryStructure,
    Mapping,
    Decoration,
}

impl Phase {
    pub fn name(self) -> &'static str {
        match self {
            Self::Repair => "Repair",
            Self::SecondaryStructure => "Secondary structure",
            Self::Mapping => "Mapping",
            Self::Decoration => "Decoration",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One processor invocation with its parameters fully resolved.
#[derive(Debug, Clone, PartialEq)]
pub enum Stage {
    MakeBonds(BondingConfig),
    Checkpoint {
        label: &'static str,
        path: PathBuf,
    },
    MutateResidues(Vec<ResidueEdit>),
    RepairGraph {
        force_field: String,
        delete_unknown: bool,
    },
    CanonicalizeModifications {
        force_field: String,
        edits: Vec<ResidueEdit>,
    },
    AnnotateDssp {
        executable: PathBuf,
    },
    AnnotateSequence(String),
    AnnotateCollagen {
        force_field: String,
    },
    DoMapping {
        source: String,
        target: String,
    },
    AverageBeads,
    ApplyLinks {
        force_field: String,
    },
    ElasticNetwork {
        force_field: String,
        params: ElasticNetworkConfig,
    },
    VirtualSiteNetwork {
        force_field: String,
        params: VirtualSiteNetworkConfig,
    },
    PositionRestraints {
        force_field: String,
        params: PositionRestraintConfig,
    },
    MergeChains(ChainMergeSpec),
    NameMoltypes {
        prefix: String,
    },
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Self::MakeBonds(_) => stages::bonds::NAME,
            Self::Checkpoint { .. } => stages::checkpoint::NAME,
            Self::MutateResidues(_) => stages::mutate::NAME,
            Self::RepairGraph { .. } => stages::repair::NAME,
            Self::CanonicalizeModifications { .. } => stages::modifications::NAME,
            Self::AnnotateDssp { .. } => stages::secstruct::DSSP_NAME,
            Self::AnnotateSequence(_) => stages::secstruct::SEQUENCE_NAME,
            Self::AnnotateCollagen { .. } => stages::secstruct::COLLAGEN_NAME,
            Self::DoMapping { .. } => stages::mapping::MAPPING_NAME,
            Self::AverageBeads => stages::mapping::AVERAGE_NAME,
            Self::ApplyLinks { .. } => stages::links::NAME,
            Self::ElasticNetwork { .. } => stages::elastic::NAME,
            Self::VirtualSiteNetwork { .. } => stages::go::NAME,
            Self::PositionRestraints { .. } => stages::restraints::NAME,
            Self::MergeChains(_) => stages::merge::NAME,
            Self::NameMoltypes { .. } => stages::naming::NAME,
        }
    }

    pub fn phase(&self) -> Phase {
        match self {
            Self::MakeBonds(_)
            | Self::Checkpoint { .. }
            | Self::MutateResidues(_)
            | Self::RepairGraph { .. }
            | Self::CanonicalizeModifications { .. } => Phase::Repair,
            Self::AnnotateDssp { .. } | Self::AnnotateSequence(_) | Self::AnnotateCollagen { .. } => {
                Phase::SecondaryStructure
            }
            Self::DoMapping { .. } | Self::AverageBeads | Self::ApplyLinks { .. } => Phase::Mapping,
            Self::ElasticNetwork { .. }
            | Self::VirtualSiteNetwork { .. }
            | Self::PositionRestraints { .. }
            | Self::MergeChains(_)
            | Self::NameMoltypes { .. } => Phase::Decoration,
        }
    }

    /// Constructs the processor that carries out this invocation.
    pub fn processor(&self) -> Box<dyn Processor> {
        match self.clone() {
            Self::MakeBonds(BondingConfig {
                strategy,
                tolerance,
            }) => Box::new(MakeBonds {
                strategy,
                tolerance,
            }),
            Self::Checkpoint { label, path } => Box::new(Checkpoint { label, path }),
            Self::MutateResidues(edits) => Box::new(MutateResidues { edits }),
            Self::RepairGraph {
                force_field,
                delete_unknown,
            } => Box::new(RepairGraph {
                force_field,
                delete_unknown,
            }),
            Self::CanonicalizeModifications { force_field, edits } => {
                Box::new(CanonicalizeModifications { force_field, edits })
            }
            Self::AnnotateDssp { executable } => Box::new(AnnotateDssp { executable }),
            Self::AnnotateSequence(sequence) => Box::new(AnnotateSequence { sequence }),
            Self::AnnotateCollagen { force_field } => Box::new(AnnotateCollagen { force_field }),
            Self::DoMapping { source, target } => Box::new(DoMapping { source, target }),
            Self::AverageBeads => Box::new(AverageBeads),
            Self::ApplyLinks { force_field } => Box::new(ApplyLinks { force_field }),
            Self::ElasticNetwork {
                force_field,
                params,
            } => Box::new(ElasticNetwork {
                force_field,
                params,
            }),
            Self::VirtualSiteNetwork {
                force_field,
                params,
            } => Box::new(VirtualSiteNetwork {
                force_field,
                params,
            }),
            Self::PositionRestraints {
                force_field,
                params,
            } => Box::new(PositionRestraints {
                force_field,
                params,
            }),
            Self::MergeChains(spec) => Box::new(MergeChains { spec }),
            Self::NameMoltypes { prefix } => Box::new(NameMoltypes { prefix }),
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())?;
        match self {
            Self::MakeBonds(b) => write!(f, "(strategy={}, tolerance={})", b.strategy, b.tolerance),
            Self::Checkpoint { label, path } => write!(f, "({}: {})", label, path.display()),
            Self::MutateResidues(edits) | Self::CanonicalizeModifications { edits, .. } => {
                let edits: Vec<String> = edits.iter().map(ToString::to_string).collect();
                write!(f, "({})", edits.join(", "))
            }
            Self::RepairGraph {
                force_field,
                delete_unknown,
            } => write!(f, "({}, delete_unknown={})", force_field, delete_unknown),
            Self::AnnotateDssp { executable } => write!(f, "({})", executable.display()),
            Self::AnnotateSequence(sequence) => write!(f, "({})", sequence),
            Self::AnnotateCollagen { force_field }
            | Self::ApplyLinks { force_field } => write!(f, "({})", force_field),
            Self::DoMapping { source, target } => write!(f, "({} -> {})", source, target),
            Self::AverageBeads => Ok(()),
            Self::ElasticNetwork { params: p, .. } => write!(
                f,
                "(fc={}, lower={}, upper={}, min_sep={})",
                p.force_constant, p.lower_cutoff, p.upper_cutoff, p.min_sequence_separation
            ),
            Self::VirtualSiteNetwork { params: p, .. } => write!(
                f,
                "(epsilon={}, lower={}, upper={}, min_sep={})",
                p.epsilon, p.lower_cutoff, p.upper_cutoff, p.min_sequence_separation
            ),
            Self::PositionRestraints { params: p, .. } => {
                write!(f, "({}, fc={})", p.selector, p.force_constant)
            }
            Self::MergeChains(spec) => write!(f, "({})", spec),
            Self::NameMoltypes { prefix } => write!(f, "({})", prefix),
        }
    }
}

/// Turns a validated [`RunConfig`] into an ordered list of stages.
pub struct PipelineBuilder<'a> {
    config: &'a RunConfig,
}

impl<'a> PipelineBuilder<'a> {
    pub fn new(config: &'a RunConfig) -> Self {
        Self { config }
    }

    /// Builds the pipeline. The same configuration always yields the same stages.
    pub fn build(&self) -> Pipeline {
        let c = self.config;
        let source = c.source_force_field.clone();
        let target = c.target_force_field.clone();
        let mut stages = Vec::new();

        stages.push(Stage::MakeBonds(c.bonding));
        if let Some(path) = &c.debug.write_graph {
            stages.push(Stage::Checkpoint {
                label: "graph",
                path: path.clone(),
            });
        }
        if !c.repair.mutations.is_empty() {
            stages.push(Stage::MutateResidues(c.repair.mutations.clone()));
        }
        stages.push(Stage::RepairGraph {
            force_field: source.clone(),
            delete_unknown: c.repair.delete_unknown,
        });
        if let Some(path) = &c.debug.write_repair {
            stages.push(Stage::Checkpoint {
                label: "repair",
                path: path.clone(),
            });
        }
        stages.push(Stage::CanonicalizeModifications {
            force_field: source.clone(),
            edits: c.repair.modifications.clone(),
        });
        if let Some(path) = &c.debug.write_canon {
            stages.push(Stage::Checkpoint {
                label: "canon",
                path: path.clone(),
            });
        }

        match &c.secondary_structure {
            Some(SecondaryStructureSource::Dssp { executable }) => {
                stages.push(Stage::AnnotateDssp {
                    executable: executable.clone(),
                })
            }
            Some(SecondaryStructureSource::Literal(sequence)) => {
                stages.push(Stage::AnnotateSequence(sequence.clone()))
            }
            Some(SecondaryStructureSource::Collagen) => stages.push(Stage::AnnotateCollagen {
                force_field: target.clone(),
            }),
            None => {}
        }

        stages.push(Stage::DoMapping {
            source,
            target: target.clone(),
        });
        stages.push(Stage::AverageBeads);
        stages.push(Stage::ApplyLinks {
            force_field: target.clone(),
        });

        // The validator rejects configurations asking for both networks.
        if let Some(params) = c.elastic_network {
            stages.push(Stage::ElasticNetwork {
                force_field: target.clone(),
                params,
            });
        } else if let Some(params) = c.virtual_site_network {
            stages.push(Stage::VirtualSiteNetwork {
                force_field: target.clone(),
                params,
            });
        }
        if let Some(params) = c.position_restraints {
            stages.push(Stage::PositionRestraints {
                force_field: target,
                params,
            });
        }
        if let Some(spec) = &c.merge_chains {
            stages.push(Stage::MergeChains(spec.clone()));
        }
        stages.push(Stage::NameMoltypes {
            prefix: c.naming.prefix.clone(),
        });

        debug!("Built pipeline with {} stage(s)", stages.len());
        Pipeline { stages }
    }
}

/// An ordered, immutable list of stages.
#[derive(Debug, Clone, PartialEq)]
pub struct Pipeline {
    stages: Vec<Stage>,
}

impl Pipeline {
    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// One line per stage, in execution order.
    pub fn describe(&self) -> Vec<String> {
        self.stages.iter().map(ToString::to_string).collect()
    }

    /// Runs every stage against `system`, stopping at the first error.
    ///
    /// Consecutive stages of the same [`Phase`] are reported as one phase.
    pub fn run(
        &self,
        system: &mut System,
        ctx: &mut ProcessContext<'_>,
        reporter: &ProgressReporter,
    ) -> Result<(), EngineError> {
        for chunk in self.stages.chunk_by(|a, b| a.phase() == b.phase()) {
            let phase = chunk[0].phase();
            reporter.phase(phase.name(), || {
                reporter.report(Progress::TaskStart {
                    total_steps: chunk.len() as u64,
                });
                for stage in chunk {
                    info!("Running {}", stage);
                    stage.processor().apply(system, ctx)?;
                    reporter.report(Progress::TaskIncrement);
                }
                reporter.report(Progress::TaskFinish);
                Ok::<(), EngineError>(())
            })?;
        }
        Ok(())
    }
}
