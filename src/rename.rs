use crate::namegen::NameGenerator;
use crate::options::{RenameOptions, ScopedRenameOptions};
use anyhow::Result;
use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// A procedures_call block whose proccode matches no renamed prototype. The
/// proccode string is the only link between a call and its definition, so an
/// unmatched call means the document is already corrupt; rewriting must stop.
#[derive(Debug, Clone)]
pub struct UnresolvedCallError {
    pub proccode: String,
}

impl Display for UnresolvedCallError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Procedure call references undefined proccode '{}'.",
            self.proccode
        )
    }
}

impl Error for UnresolvedCallError {}

// Menu opcodes whose single field holds a sprite name. Values outside the
// rename map (pseudo-targets like "_mouse_" or "_random_") pass through
// untouched.
const SPRITE_MENU_FIELDS: &[(&str, &str)] = &[
    ("motion_goto_menu", "TO"),
    ("motion_glideto_menu", "TO"),
    ("motion_pointtowards_menu", "TOWARDS"),
    ("control_create_clone_of_menu", "CLONE_OPTION"),
    ("sensing_touchingobjectmenu", "TOUCHINGOBJECTMENU"),
    ("sensing_of_object_menu", "OBJECT"),
];

pub fn rename_variables(targets: &mut [Value], options: &ScopedRenameOptions) {
    rename_declarations(targets, "variables", options);
}

pub fn rename_lists(targets: &mut [Value], options: &ScopedRenameOptions) {
    rename_declarations(targets, "lists", options);
}

// Variables and lists share one shape: a name-keyed map whose values are
// [display_name, ...] tuples. The opaque keys are never touched.
fn rename_declarations(targets: &mut [Value], collection: &str, options: &ScopedRenameOptions) {
    if options.rename_public {
        if let Some(stage) = targets.first_mut() {
            rename_declaration_map(stage, collection, &options.generator);
        }
    }
    if options.rename_private {
        for sprite in targets.iter_mut().skip(1) {
            rename_declaration_map(sprite, collection, &options.generator);
        }
    }
}

fn rename_declaration_map(target: &mut Value, collection: &str, generator: &NameGenerator) {
    let Some(decls) = target.get_mut(collection).and_then(Value::as_object_mut) else {
        return;
    };
    for entry in decls.values_mut() {
        if let Some(display_name) = entry.get_mut(0) {
            *display_name = Value::String(generator.next_name());
        }
    }
}

/// Renames every sprite (the stage keeps its name), then rewrites every
/// sprite-menu block field that referenced an old name. Both halves run over
/// the full rename map so a partially-updated lookup can never be observed.
pub fn rename_sprites(targets: &mut [Value], options: &RenameOptions) {
    let mut names: HashMap<String, String> = HashMap::new();
    for sprite in targets.iter_mut().skip(1) {
        let Some(old_name) = sprite.get("name").and_then(Value::as_str) else {
            continue;
        };
        let old_name = old_name.to_string();
        let new_name = options.generator.next_name();
        sprite["name"] = Value::String(new_name.clone());
        names.insert(old_name, new_name);
    }

    for target in targets.iter_mut() {
        for_each_block(target, |block| rewrite_sprite_menu(block, &names));
    }
}

fn rewrite_sprite_menu(block: &mut Value, names: &HashMap<String, String>) {
    let Some(field_name) = sprite_menu_field(block) else {
        return;
    };
    let Some(slot) = block
        .get_mut("fields")
        .and_then(|fields| fields.get_mut(field_name))
        .and_then(|field| field.get_mut(0))
    else {
        return;
    };
    if let Some(new_name) = slot.as_str().and_then(|old| names.get(old)) {
        *slot = Value::String(new_name.clone());
    }
}

fn sprite_menu_field(block: &Value) -> Option<&'static str> {
    let opcode = block.get("opcode")?.as_str()?;
    SPRITE_MENU_FIELDS
        .iter()
        .find(|(menu_opcode, _)| *menu_opcode == opcode)
        .map(|(_, field_name)| *field_name)
}

pub fn rename_costumes(targets: &mut [Value], options: &RenameOptions) {
    for sprite in targets.iter_mut().skip(1) {
        rename_asset_names(sprite, "costumes", &options.generator);
    }
}

/// Sounds are renamed on every target, stage included.
pub fn rename_sounds(targets: &mut [Value], options: &RenameOptions) {
    for target in targets.iter_mut() {
        rename_asset_names(target, "sounds", &options.generator);
    }
}

/// Backdrops live in the stage's costume collection.
pub fn rename_backdrops(targets: &mut [Value], options: &RenameOptions) {
    if let Some(stage) = targets.first_mut() {
        rename_asset_names(stage, "costumes", &options.generator);
    }
}

fn rename_asset_names(target: &mut Value, collection: &str, generator: &NameGenerator) {
    let Some(assets) = target.get_mut(collection).and_then(Value::as_array_mut) else {
        return;
    };
    for asset in assets {
        if let Some(record) = asset.as_object_mut() {
            record.insert("name".to_string(), Value::String(generator.next_name()));
        }
    }
}

/// Two-pass proccode rewrite. Pass one renames every prototype, preserving
/// the %n/%s/%b placeholder sequence exactly; pass two maps every call site
/// through the completed old-to-new table. Call sites cannot be rewritten
/// alongside definitions: a call may precede its prototype in block order.
pub fn rename_procedures(targets: &mut [Value], options: &RenameOptions) -> Result<()> {
    let placeholder_re = Regex::new(r"%[nsb]")?;
    let mut proccodes: HashMap<String, String> = HashMap::new();

    for target in targets.iter_mut() {
        for_each_block(target, |block| {
            if block.get("opcode").and_then(Value::as_str) != Some("procedures_prototype") {
                return;
            }
            let Some(old) = block_proccode(block) else {
                return;
            };
            let new = rebuild_proccode(&placeholder_re, &old, &options.generator.next_name());
            proccodes.insert(old, new.clone());
            set_block_proccode(block, new);
        });
    }

    let mut dangling: Option<UnresolvedCallError> = None;
    for target in targets.iter_mut() {
        for_each_block(target, |block| {
            if dangling.is_some() {
                return;
            }
            if block.get("opcode").and_then(Value::as_str) != Some("procedures_call") {
                return;
            }
            let Some(old) = block_proccode(block) else {
                return;
            };
            match proccodes.get(&old) {
                Some(new) => set_block_proccode(block, new.clone()),
                None => dangling = Some(UnresolvedCallError { proccode: old }),
            }
        });
    }
    match dangling {
        Some(err) => Err(err.into()),
        None => Ok(()),
    }
}

fn rebuild_proccode(placeholder_re: &Regex, old: &str, new_name: &str) -> String {
    let mut out = String::from(new_name);
    for token in placeholder_re.find_iter(old) {
        out.push(' ');
        out.push_str(token.as_str());
    }
    out
}

fn block_proccode(block: &Value) -> Option<String> {
    block
        .get("mutation")
        .and_then(|mutation| mutation.get("proccode"))
        .and_then(Value::as_str)
        .map(ToString::to_string)
}

fn set_block_proccode(block: &mut Value, proccode: String) {
    if let Some(slot) = block
        .get_mut("mutation")
        .and_then(|mutation| mutation.get_mut("proccode"))
    {
        *slot = Value::String(proccode);
    }
}

// Free-floating reporters are stored as bare arrays in the blocks map; only
// object entries are real blocks.
pub(crate) fn for_each_block(target: &mut Value, mut visit: impl FnMut(&mut Value)) {
    let Some(blocks) = target.get_mut("blocks").and_then(Value::as_object_mut) else {
        return;
    };
    for block in blocks.values_mut() {
        if block.is_object() {
            visit(block);
        }
    }
}
