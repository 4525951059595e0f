use super::backbone_beads;
use crate::core::forcefield::library::FEATURE_ELASTIC_NETWORK;
use crate::core::models::system::System;
use crate::core::models::topology::{BondParams, Edge, EdgeKind};
use crate::engine::config::ElasticNetworkConfig;
use crate::engine::error::EngineError;
use crate::engine::processor::{ProcessContext, Processor, require_molecules};
use itertools::Itertools;

pub const NAME: &str = "elastic-network";

/// GROMACS harmonic bond type that adds no exclusions.
const RUBBER_BAND_FUNCTION: u8 = 6;

/// Connects backbone beads within a distance window by harmonic springs.
pub struct ElasticNetwork {
    pub force_field: String,
    pub params: ElasticNetworkConfig,
}

impl Processor for ElasticNetwork {
    fn name(&self) -> &'static str {
        NAME
    }

    fn apply(&self, system: &mut System, ctx: &mut ProcessContext<'_>) -> Result<(), EngineError> {
        if !ctx
            .registry
            .has_feature(&self.force_field, FEATURE_ELASTIC_NETWORK)
        {
            ctx.diagnostics.warn(
                NAME,
                format!(
                    "'{}' does not support an elastic network; none was added",
                    self.force_field
                ),
            );
            return Ok(());
        }
        require_molecules(NAME, system)?;

        let p = &self.params;
        let mut total = 0;
        for molecule in system.molecules_mut() {
            let springs: Vec<Edge> = backbone_beads(molecule)
                .iter()
                .filter(|b| b.position.is_some())
                .tuple_combinations()
                .filter(|(a, b)| {
                    a.chain != b.chain
                        || (b.resid - a.resid).unsigned_abs() >= p.min_sequence_separation
                })
                .filter(|(a, b)| !molecule.has_edge(a.id, b.id))
                .filter_map(|(a, b)| {
                    let distance = nalgebra::distance(&a.position?, &b.position?);
                    (p.lower_cutoff..=p.upper_cutoff)
                        .contains(&distance)
                        .then(|| {
                            Edge::new(a.id, b.id, EdgeKind::Elastic).with_params(BondParams {
                                function: RUBBER_BAND_FUNCTION,
                                length: distance,
                                force: p.force_constant,
                            })
                        })
                })
                .collect();

            total += springs.len();
            for spring in springs {
                molecule
                    .add_edge(spring)
                    .map_err(|e| EngineError::structural(NAME, e.to_string()))?;
            }
        }

        ctx.diagnostics
            .info(NAME, format!("added {} elastic bond(s)", total));
        Ok(())
    }
}
