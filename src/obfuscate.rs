use crate::options::ObfuscateOptions;
use crate::{recode, rename};
use anyhow::{anyhow, Result};
use serde_json::Value;

#[derive(Debug, Clone)]
pub struct ObfuscateWarning {
    pub message: String,
}

#[derive(Debug, Clone, Default)]
pub struct ObfuscateReport {
    pub warnings: Vec<ObfuscateWarning>,
}

/// Applies the requested passes to the project tree in a fixed order:
/// variables, lists, sprites, costumes, sounds, backdrops, procedures,
/// integer recoding. Options were fully validated before this point, so a
/// failure here (a dangling procedure call) aborts with the tree unusable;
/// the caller must not persist it.
pub fn obfuscate_project(project: &mut Value, options: &ObfuscateOptions) -> Result<ObfuscateReport> {
    let targets = project
        .get_mut("targets")
        .and_then(Value::as_array_mut)
        .ok_or_else(|| anyhow!("Invalid project.json: missing 'targets' array."))?;

    if let Some(variables) = &options.variables {
        rename::rename_variables(targets, variables);
    }
    if let Some(lists) = &options.lists {
        rename::rename_lists(targets, lists);
    }
    if let Some(sprites) = &options.sprites {
        rename::rename_sprites(targets, sprites);
    }
    if let Some(costumes) = &options.costumes {
        rename::rename_costumes(targets, costumes);
    }
    if let Some(sounds) = &options.sounds {
        rename::rename_sounds(targets, sounds);
    }
    if let Some(backdrops) = &options.backdrops {
        rename::rename_backdrops(targets, backdrops);
    }
    if let Some(procedures) = &options.procedures {
        rename::rename_procedures(targets, procedures)?;
    }
    if options.hex_integer_literals {
        recode::hex_integer_literals(targets)?;
    }

    let warnings = options
        .unknown_keys
        .iter()
        .map(|key| ObfuscateWarning {
            message: format!("Unknown option '{}'.", key),
        })
        .collect();
    Ok(ObfuscateReport { warnings })
}

/// Convenience entry taking the raw external options record.
pub fn obfuscate_project_with_record(project: &mut Value, options: &Value) -> Result<ObfuscateReport> {
    let parsed = ObfuscateOptions::from_value(options)?;
    obfuscate_project(project, &parsed)
}
