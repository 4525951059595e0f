use crate::cli::ForcefieldsArgs;
use crate::data::DataManager;
use crate::error::Result;
use cgforge::core::forcefield::library::ForceField;
use cgforge::core::forcefield::registry::ForceFieldRegistry;

pub fn run(args: ForcefieldsArgs, data_manager: &DataManager) -> Result<()> {
    let registry = data_manager.load_registry()?;
    for line in render(&registry, args.name.as_deref())? {
        println!("{}", line);
    }
    Ok(())
}

fn render(registry: &ForceFieldRegistry, name: Option<&str>) -> Result<Vec<String>> {
    match name {
        Some(name) => Ok(describe(registry.get(name)?)),
        None => Ok(registry
            .libraries()
            .map(|ff| format!("{:<16} {:<15} {}", ff.name, ff.kind.to_string(), features(ff)))
            .collect()),
    }
}

fn describe(ff: &ForceField) -> Vec<String> {
    let mut lines = vec![
        format!("name:          {}", ff.name),
        format!("kind:          {}", ff.kind),
    ];
    if let Some(include) = &ff.include {
        lines.push(format!("include:       {}", include));
    }
    lines.push(format!("features:      {}", features(ff)));
    lines.push(format!("residues:      {}", ff.residues.len()));
    if !ff.modifications.is_empty() {
        lines.push(format!("modifications: {}", ff.modifications.join(", ")));
    }
    lines
}

fn features(ff: &ForceField) -> String {
    if ff.features.is_empty() {
        "-".to_string()
    } else {
        ff.features.iter().map(String::as_str).collect::<Vec<_>>().join(", ")
    }
}
