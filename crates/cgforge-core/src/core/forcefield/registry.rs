use super::library::ForceField;
use phf::phf_map;
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

static BUILTIN_LIBRARIES: phf::Map<&'static str, &'static str> = phf_map! {
    "universal" => include_str!("../../../data/forcefields/universal.toml"),
    "martini3001" => include_str!("../../../data/forcefields/martini3001.toml"),
};

/// Known force-field libraries, looked up by name.
#[derive(Debug, Clone, Default)]
pub struct ForceFieldRegistry {
    libraries: BTreeMap<String, ForceField>,
}

impl ForceFieldRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding the libraries shipped with the crate.
    pub fn builtin() -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        for (name, content) in BUILTIN_LIBRARIES.entries() {
            let ff: ForceField = toml::from_str(content).map_err(|e| RegistryError::Toml {
                path: format!("<builtin:{}>", name),
                source: e,
            })?;
            registry.insert(ff);
        }
        Ok(registry)
    }

    /// Loads one library file. A library with the same name replaces the existing one.
    pub fn load_file(&mut self, path: &Path) -> Result<&ForceField, RegistryError> {
        let content = std::fs::read_to_string(path).map_err(|e| RegistryError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        let ff: ForceField = toml::from_str(&content).map_err(|e| RegistryError::Toml {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        debug!("Loaded force field '{}' from {:?}", ff.name, path);
        let name = ff.name.clone();
        self.insert(ff);
        Ok(&self.libraries[&name])
    }

    /// Loads every `*.toml` file of a directory, in file-name order.
    ///
    /// Returns the number of libraries loaded.
    pub fn load_dir(&mut self, dir: &Path) -> Result<usize, RegistryError> {
        let io_err = |e| RegistryError::Io {
            path: dir.to_string_lossy().to_string(),
            source: e,
        };
        let mut paths = Vec::new();
        for entry in std::fs::read_dir(dir).map_err(io_err)? {
            let path = entry.map_err(io_err)?.path();
            if path.is_file() && path.extension().is_some_and(|ext| ext == "toml") {
                paths.push(path);
            }
        }
        paths.sort();
        for path in &paths {
            self.load_file(path)?;
        }
        info!("Loaded {} force field(s) from {:?}", paths.len(), dir);
        Ok(paths.len())
    }

    pub fn insert(&mut self, ff: ForceField) {
        self.libraries.insert(ff.name.clone(), ff);
    }

    pub fn get(&self, name: &str) -> Result<&ForceField, RegistryError> {
        self.libraries
            .get(name)
            .ok_or_else(|| RegistryError::NotFound {
                name: name.to_string(),
            })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.libraries.contains_key(name)
    }

    /// Whether force field `name` defines `feature`. Unknown force fields define nothing.
    pub fn has_feature(&self, name: &str, feature: &str) -> bool {
        self.libraries
            .get(name)
            .is_some_and(|ff| ff.has_feature(feature))
    }

    /// Library names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.libraries.keys().map(String::as_str)
    }

    pub fn libraries(&self) -> impl Iterator<Item = &ForceField> {
        self.libraries.values()
    }
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Unknown force field: '{name}'")]
    NotFound { name: String },
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("TOML parsing error for '{path}': {source}")]
    Toml {
        path: String,
        source: toml::de::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::forcefield::library::{FEATURE_ELASTIC_NETWORK, ForceFieldKind};
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn builtin_libraries_parse_and_are_registered() {
        let registry = ForceFieldRegistry::builtin().unwrap();
        let names: Vec<&str> = registry.names().collect();
        assert_eq!(names, vec!["martini3001", "universal"]);

        let universal = registry.get("universal").unwrap();
        assert_eq!(universal.kind, ForceFieldKind::Atomistic);
        assert!(universal.residue("TRP").is_some());

        let martini = registry.get("martini3001").unwrap();
        assert!(martini.is_coarse_grained());
        assert!(martini.residue("ALA").unwrap().bead("BB").is_some());
    }

    #[test]
    fn every_builtin_bead_atom_exists_in_the_atomistic_library() {
        let registry = ForceFieldRegistry::builtin().unwrap();
        let universal = registry.get("universal").unwrap();
        let martini = registry.get("martini3001").unwrap();
        for (resname, template) in &martini.residues {
            for bead in &template.beads {
                for atom in &bead.atoms {
                    assert!(
                        universal.accepts_atom(resname, atom),
                        "{} {} maps unknown atom {}",
                        resname,
                        bead.name,
                        atom
                    );
                }
            }
            for bond in &template.bonds {
                assert!(template.bead(&bond.from).is_some(), "{} {}", resname, bond.from);
                assert!(template.bead(&bond.to).is_some(), "{} {}", resname, bond.to);
            }
        }
    }

    #[test]
    fn builtin_modification_overrides_are_known_to_the_source_library() {
        let registry = ForceFieldRegistry::builtin().unwrap();
        let universal = registry.get("universal").unwrap();
        let martini = registry.get("martini3001").unwrap();
        for (modification, overrides) in &martini.modification_beads {
            assert!(universal.has_modification(modification), "{}", modification);
            for o in overrides {
                assert!(
                    martini.residues.values().any(|r| r.bead(&o.bead).is_some()),
                    "{} targets unknown bead {}",
                    modification,
                    o.bead
                );
            }
        }
    }

    #[test]
    fn feature_queries_handle_unknown_names() {
        let registry = ForceFieldRegistry::builtin().unwrap();
        assert!(registry.has_feature("martini3001", FEATURE_ELASTIC_NETWORK));
        assert!(!registry.has_feature("universal", FEATURE_ELASTIC_NETWORK));
        assert!(!registry.has_feature("nonexistent", FEATURE_ELASTIC_NETWORK));
        assert!(matches!(
            registry.get("nonexistent"),
            Err(RegistryError::NotFound { name }) if name == "nonexistent"
        ));
    }

    #[test]
    fn load_dir_adds_and_overrides_libraries() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("a.toml"),
            "name = \"custom\"\nkind = \"coarse-grained\"\nfeatures = [\"collagen\"]\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("b.toml"),
            "name = \"universal\"\nkind = \"atomistic\"\n",
        )
        .unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let mut registry = ForceFieldRegistry::builtin().unwrap();
        let loaded = registry.load_dir(dir.path()).unwrap();

        assert_eq!(loaded, 2);
        assert!(registry.has_feature("custom", "collagen"));
        assert!(registry.get("universal").unwrap().residues.is_empty());
    }

    #[test]
    fn malformed_library_reports_its_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        fs::write(&path, "name = ").unwrap();

        let mut registry = ForceFieldRegistry::new();
        let err = registry.load_file(&path).unwrap_err();
        assert!(matches!(err, RegistryError::Toml { .. }));
        assert!(err.to_string().contains("broken.toml"));
    }
}
