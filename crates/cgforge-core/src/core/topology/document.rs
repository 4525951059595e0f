use super::error::TopologyError;
use super::grouping::{MoltypeGroup, group_by_moltype};
use super::itp::render_itp;
use crate::core::models::system::System;
use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const DEFAULT_TITLE: &str = "Coarse-grained system";
const COUNT_SEPARATOR: &str = "    ";

/// Settings for rendering the topology files.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TopologyOptions {
    /// Preprocessor symbols emitted as `#define` lines, in order.
    pub defines: Vec<String>,
    /// Force-field library file included before the molecule descriptions.
    pub library_include: Option<String>,
    /// Overrides the system title for the `[ system ]` section.
    pub title: Option<String>,
    /// Comment lines written at the top of every generated file.
    pub header: Vec<String>,
}

/// The aggregate `.top` document.
#[derive(Debug, Clone, PartialEq)]
pub struct TopologyDocument {
    pub defines: Vec<String>,
    pub library_include: Option<String>,
    /// Distinct moltypes, in order of first appearance.
    pub includes: Vec<String>,
    pub title: String,
    /// One entry per moltype group, recurrences included.
    pub molecules: Vec<(String, usize)>,
    /// Width of the longest moltype name, in characters.
    pub name_width: usize,
    pub header: Vec<String>,
}

impl TopologyDocument {
    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for TopologyDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in &self.header {
            writeln!(f, "; {}", line)?;
        }
        if !self.header.is_empty() {
            writeln!(f)?;
        }

        for define in &self.defines {
            writeln!(f, "#define {}", define)?;
        }
        if !self.defines.is_empty() {
            writeln!(f)?;
        }

        if let Some(include) = &self.library_include {
            writeln!(f, "#include \"{}\"", include)?;
        }
        for moltype in &self.includes {
            writeln!(f, "#include \"{}.itp\"", moltype)?;
        }

        writeln!(f, "\n[ system ]")?;
        writeln!(f, "{}", self.title)?;

        writeln!(f, "\n[ molecules ]")?;
        for (moltype, count) in &self.molecules {
            writeln!(
                f,
                "{:<width$}{}{}",
                moltype,
                COUNT_SEPARATOR,
                count,
                width = self.name_width
            )?;
        }
        Ok(())
    }
}

/// The rendered topology: one description per distinct moltype plus the
/// aggregate document.
#[derive(Debug, Clone, PartialEq)]
pub struct Topology {
    pub groups: Vec<MoltypeGroup>,
    /// `(moltype, .itp contents)` in order of first appearance.
    pub descriptions: Vec<(String, String)>,
    pub document: TopologyDocument,
}

/// Files written by [`write_topology`].
#[derive(Debug, Clone, PartialEq)]
pub struct TopologyReport {
    pub groups: Vec<MoltypeGroup>,
    pub itp_paths: Vec<PathBuf>,
    pub top_path: PathBuf,
}

/// Groups the system's molecules and renders every topology artifact in memory.
///
/// Each moltype is rendered once, from the first molecule of its first group.
/// Later groups of the same moltype only add a line to the molecules section.
pub fn build_topology(
    system: &System,
    options: &TopologyOptions,
) -> Result<Topology, TopologyError> {
    let groups = group_by_moltype(system)?;

    let mut seen: HashSet<&str> = HashSet::new();
    let mut descriptions = Vec::new();
    let mut includes = Vec::new();
    let mut molecules = Vec::with_capacity(groups.len());
    let mut name_width = 0;

    for group in &groups {
        if seen.insert(group.moltype.as_str()) {
            let representative = &system.molecules()[group.first_index];
            descriptions.push((
                group.moltype.clone(),
                render_itp(representative, &group.moltype, &options.header),
            ));
            includes.push(group.moltype.clone());
            name_width = name_width.max(group.moltype.chars().count());
        }
        molecules.push((group.moltype.clone(), group.count));
    }

    let title = options
        .title
        .clone()
        .or_else(|| Some(system.title.trim().to_string()).filter(|t| !t.is_empty()))
        .unwrap_or_else(|| DEFAULT_TITLE.to_string());

    let document = TopologyDocument {
        defines: options.defines.clone(),
        library_include: options.library_include.clone(),
        includes,
        title,
        molecules,
        name_width,
        header: options.header.clone(),
    };

    Ok(Topology {
        groups,
        descriptions,
        document,
    })
}

/// Writes `<moltype>.itp` files next to `top_path` and the `.top` document itself.
///
/// Everything is rendered before the first file is created, so a topology
/// error leaves the filesystem untouched.
pub fn write_topology(
    system: &System,
    top_path: &Path,
    options: &TopologyOptions,
) -> Result<TopologyReport, TopologyError> {
    let topology = build_topology(system, options)?;
    let dir = top_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    let mut itp_paths = Vec::with_capacity(topology.descriptions.len());
    for (moltype, contents) in &topology.descriptions {
        let path = dir.join(format!("{}.itp", moltype));
        write_file(&path, contents)?;
        debug!(moltype = %moltype, path = %path.display(), "Wrote molecule description");
        itp_paths.push(path);
    }

    write_file(top_path, &topology.document.render())?;
    info!(
        path = %top_path.display(),
        groups = topology.groups.len(),
        moltypes = itp_paths.len(),
        "Wrote topology"
    );

    Ok(TopologyReport {
        groups: topology.groups,
        itp_paths,
        top_path: top_path.to_path_buf(),
    })
}

fn write_file(path: &Path, contents: &str) -> Result<(), TopologyError> {
    fs::write(path, contents).map_err(|source| TopologyError::Write {
        path: path.to_path_buf(),
        source,
    })
}
