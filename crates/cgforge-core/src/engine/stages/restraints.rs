use super::BACKBONE_BEAD;
use crate::core::forcefield::library::FEATURE_POSITION_RESTRAINTS;
use crate::core::models::ids::NodeId;
use crate::core::models::node::NodeRole;
use crate::core::models::system::System;
use crate::engine::config::{PositionRestraintConfig, RestraintSelector};
use crate::engine::error::EngineError;
use crate::engine::processor::{ProcessContext, Processor, require_molecules};

pub const NAME: &str = "position-restraints";

/// Restrains the selected beads to their reference positions.
pub struct PositionRestraints {
    pub force_field: String,
    pub params: PositionRestraintConfig,
}

impl Processor for PositionRestraints {
    fn name(&self) -> &'static str {
        NAME
    }

    fn apply(&self, system: &mut System, ctx: &mut ProcessContext<'_>) -> Result<(), EngineError> {
        require_molecules(NAME, system)?;
        if !ctx
            .registry
            .has_feature(&self.force_field, FEATURE_POSITION_RESTRAINTS)
        {
            ctx.diagnostics.warn(
                NAME,
                format!(
                    "'{}' does not declare position restraints; writing them anyway",
                    self.force_field
                ),
            );
        }

        let mut total = 0;
        for molecule in system.molecules_mut() {
            let selected: Vec<NodeId> = molecule
                .nodes()
                .filter(|(_, n)| n.role == NodeRole::Bead)
                .filter(|(_, n)| match self.params.selector {
                    RestraintSelector::All => true,
                    RestraintSelector::Backbone => n.name == BACKBONE_BEAD,
                })
                .map(|(id, _)| id)
                .collect();
            total += selected.len();
            for id in selected {
                molecule
                    .add_position_restraint(id, self.params.force_constant)
                    .map_err(|e| EngineError::structural(NAME, e.to_string()))?;
            }
        }

        if total == 0 {
            ctx.diagnostics.warn(
                NAME,
                format!("no {} beads to restrain", self.params.selector),
            );
        } else {
            ctx.diagnostics.info(
                NAME,
                format!(
                    "restrained {} bead(s) with {} kJ/mol/nm^2",
                    total, self.params.force_constant
                ),
            );
        }
        Ok(())
    }
}
