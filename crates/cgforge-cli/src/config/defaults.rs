use cgforge::engine::config::{
    DEFAULT_SOURCE_FORCE_FIELD, DEFAULT_TARGET_FORCE_FIELD, ElasticNetworkConfig,
    NamingConfig, PositionRestraintConfig, VirtualSiteNetworkConfig,
};
use std::path::PathBuf;

/// Values used when neither the command line nor the config file sets an option.
pub struct DefaultsConfig {
    pub source_force_field: String,
    pub target_force_field: String,
    pub bonds_fudge: f64,
    pub topology: PathBuf,
    pub dssp_executable: PathBuf,
    pub elastic_network: ElasticNetworkConfig,
    pub virtual_site_network: VirtualSiteNetworkConfig,
    pub position_restraints: PositionRestraintConfig,
    pub name_prefix: String,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            source_force_field: DEFAULT_SOURCE_FORCE_FIELD.to_string(),
            target_force_field: DEFAULT_TARGET_FORCE_FIELD.to_string(),
            bonds_fudge: 1.2,
            topology: PathBuf::from("topol.top"),
            dssp_executable: PathBuf::from("mkdssp"),
            elastic_network: ElasticNetworkConfig::default(),
            virtual_site_network: VirtualSiteNetworkConfig::default(),
            position_restraints: PositionRestraintConfig::default(),
            name_prefix: NamingConfig::default().prefix,
        }
    }
}
