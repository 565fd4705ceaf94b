use crate::namegen::{range_contains_scalar, NameGenerator};
use serde_json::{Map, Value};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub const DEFAULT_NAME_LENGTH: usize = 10;

/// Invalid value inside a recognized option record. Raised during resolution,
/// before any target is mutated.
#[derive(Debug, Clone)]
pub struct OptionError {
    pub message: String,
}

impl Display for OptionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Error for OptionError {}

/// The top-level options value is not a JSON object at all.
#[derive(Debug, Clone)]
pub struct OptionsTypeError {
    pub message: String,
}

impl Display for OptionsTypeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Error for OptionsTypeError {}

#[derive(Debug, Clone)]
pub struct RenameOptions {
    pub generator: NameGenerator,
}

/// Variables and lists additionally split into stage-owned ("public") and
/// sprite-owned ("private") scopes, each renamed independently.
#[derive(Debug, Clone)]
pub struct ScopedRenameOptions {
    pub generator: NameGenerator,
    pub rename_public: bool,
    pub rename_private: bool,
}

#[derive(Debug, Clone, Default)]
pub struct ObfuscateOptions {
    pub variables: Option<ScopedRenameOptions>,
    pub lists: Option<ScopedRenameOptions>,
    pub sprites: Option<RenameOptions>,
    pub costumes: Option<RenameOptions>,
    pub sounds: Option<RenameOptions>,
    pub backdrops: Option<RenameOptions>,
    pub procedures: Option<RenameOptions>,
    pub hex_integer_literals: bool,
    /// Top-level keys that were unrecognized or carried a wrong-typed value.
    /// Reported as warnings by the caller, never an error.
    pub unknown_keys: Vec<String>,
}

impl ObfuscateOptions {
    /// Parses the open-ended external options record. Recognized keys are
    /// consumed; whatever is left over lands in `unknown_keys`.
    pub fn from_value(options: &Value) -> anyhow::Result<Self> {
        let Some(record) = options.as_object() else {
            return Err(OptionsTypeError {
                message: format!(
                    "Options must be a JSON object, got {}.",
                    json_type_name(options)
                ),
            }
            .into());
        };
        let mut record = record.clone();
        let mut out = ObfuscateOptions::default();

        if let Some(mut sub) = take_record(&mut record, "rename_variables", &mut out.unknown_keys) {
            out.variables = Some(resolve_scoped(&mut sub, "variables")?);
        }
        if let Some(mut sub) = take_record(&mut record, "rename_lists", &mut out.unknown_keys) {
            out.lists = Some(resolve_scoped(&mut sub, "lists")?);
        }
        if let Some(mut sub) = take_record(&mut record, "rename_sprites", &mut out.unknown_keys) {
            out.sprites = Some(resolve_plain(&mut sub, "sprites")?);
        }
        if let Some(mut sub) = take_record(&mut record, "rename_costumes", &mut out.unknown_keys) {
            out.costumes = Some(resolve_plain(&mut sub, "costumes")?);
        }
        if let Some(mut sub) = take_record(&mut record, "rename_sounds", &mut out.unknown_keys) {
            out.sounds = Some(resolve_plain(&mut sub, "sounds")?);
        }
        if let Some(mut sub) = take_record(&mut record, "rename_backdrops", &mut out.unknown_keys) {
            out.backdrops = Some(resolve_plain(&mut sub, "backdrops")?);
        }
        if let Some(mut sub) = take_record(&mut record, "rename_my_blocks", &mut out.unknown_keys) {
            out.procedures = Some(resolve_plain(&mut sub, "my_blocks")?);
        }
        match record.remove("convert_integers_to_hexadecimal") {
            Some(Value::Bool(convert)) => out.hex_integer_literals = convert,
            Some(_) => out
                .unknown_keys
                .push("convert_integers_to_hexadecimal".to_string()),
            None => {}
        }

        out.unknown_keys.extend(record.keys().cloned());
        Ok(out)
    }

    /// Built-in record used by the CLI when no options file is given: every
    /// category renamed with 10-character random hex, integer recoding on.
    pub fn default_full() -> Self {
        let hex = || RenameOptions {
            generator: NameGenerator::RandomHex {
                length: DEFAULT_NAME_LENGTH,
            },
        };
        let scoped = || ScopedRenameOptions {
            generator: NameGenerator::RandomHex {
                length: DEFAULT_NAME_LENGTH,
            },
            rename_public: true,
            rename_private: true,
        };
        ObfuscateOptions {
            variables: Some(scoped()),
            lists: Some(scoped()),
            sprites: Some(hex()),
            costumes: Some(hex()),
            sounds: Some(hex()),
            backdrops: Some(hex()),
            procedures: Some(hex()),
            hex_integer_literals: true,
            unknown_keys: Vec::new(),
        }
    }
}

fn resolve_plain(record: &mut Map<String, Value>, category: &str) -> Result<RenameOptions, OptionError> {
    Ok(RenameOptions {
        generator: resolve_generator(record, category)?,
    })
}

fn resolve_scoped(
    record: &mut Map<String, Value>,
    category: &str,
) -> Result<ScopedRenameOptions, OptionError> {
    let generator = resolve_generator(record, category)?;
    let rename_public = take_bool(record, &format!("rename_public_{}", category), true)?;
    let rename_private = take_bool(record, &format!("rename_private_{}", category), true)?;
    Ok(ScopedRenameOptions {
        generator,
        rename_public,
        rename_private,
    })
}

fn resolve_generator(
    record: &mut Map<String, Value>,
    category: &str,
) -> Result<NameGenerator, OptionError> {
    let strategy_key = format!("rename_{}_to", category);
    let strategy = match record.remove(&strategy_key) {
        None | Some(Value::Null) => {
            return Err(OptionError {
                message: format!("{} cannot be null.", strategy_key),
            })
        }
        Some(value) => value,
    };

    // The singular key is canonical; the plural spelling also appears in the
    // wild and is accepted as a fallback.
    let singular = category.strip_suffix('s').unwrap_or(category);
    let length_key = format!("{}_name_length", singular);
    let length_value = record
        .remove(&length_key)
        .or_else(|| record.remove(&format!("{}_name_length", category)));
    let length = match length_value {
        None => DEFAULT_NAME_LENGTH,
        Some(value) => value.as_u64().ok_or_else(|| OptionError {
            message: format!("{} must be an integer.", length_key),
        })? as usize,
    };

    match strategy.as_str() {
        Some("random_hex") => Ok(NameGenerator::RandomHex { length }),
        Some("random_unicode_char_range") => {
            let start = take_codepoint(record, "range_start")?;
            let end = take_codepoint(record, "range_end")?;
            if start > end {
                return Err(OptionError {
                    message: "range_start must be less than range_end.".to_string(),
                });
            }
            if !range_contains_scalar(start, end) {
                return Err(OptionError {
                    message: "range_start..range_end contains no valid Unicode characters."
                        .to_string(),
                });
            }
            Ok(NameGenerator::UnicodeRange { length, start, end })
        }
        _ => Err(OptionError {
            message: format!(
                "{} must be 'random_hex' or 'random_unicode_char_range'.",
                strategy_key
            ),
        }),
    }
}

fn take_codepoint(record: &mut Map<String, Value>, key: &str) -> Result<u32, OptionError> {
    record
        .remove(key)
        .as_ref()
        .and_then(Value::as_u64)
        .and_then(|v| u32::try_from(v).ok())
        .ok_or_else(|| OptionError {
            message: "range_start and range_end must be integers.".to_string(),
        })
}

fn take_bool(
    record: &mut Map<String, Value>,
    key: &str,
    default: bool,
) -> Result<bool, OptionError> {
    match record.remove(key) {
        None => Ok(default),
        Some(Value::Bool(value)) => Ok(value),
        Some(_) => Err(OptionError {
            message: format!("{} must be a boolean.", key),
        }),
    }
}

fn take_record(
    record: &mut Map<String, Value>,
    key: &str,
    unknown: &mut Vec<String>,
) -> Option<Map<String, Value>> {
    match record.remove(key) {
        None => None,
        Some(Value::Object(sub)) => Some(sub),
        Some(_) => {
            unknown.push(key.to_string());
            None
        }
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn resolves_random_hex_with_explicit_length() {
        let options = ObfuscateOptions::from_value(&json!({
            "rename_variables": {
                "rename_variables_to": "random_hex",
                "variable_name_length": 4
            }
        }))
        .unwrap();
        let variables = options.variables.unwrap();
        assert_eq!(variables.generator, NameGenerator::RandomHex { length: 4 });
        assert!(variables.rename_public);
        assert!(variables.rename_private);
        assert!(options.unknown_keys.is_empty());
    }

    #[test]
    fn plural_length_key_is_accepted() {
        let options = ObfuscateOptions::from_value(&json!({
            "rename_variables": {
                "rename_variables_to": "random_hex",
                "variables_name_length": 4
            }
        }))
        .unwrap();
        assert_eq!(
            options.variables.unwrap().generator,
            NameGenerator::RandomHex { length: 4 }
        );
    }

    #[test]
    fn name_length_defaults_to_ten() {
        let options = ObfuscateOptions::from_value(&json!({
            "rename_sprites": { "rename_sprites_to": "random_hex" }
        }))
        .unwrap();
        assert_eq!(
            options.sprites.unwrap().generator,
            NameGenerator::RandomHex {
                length: DEFAULT_NAME_LENGTH
            }
        );
    }

    #[test]
    fn missing_strategy_is_an_option_error() {
        let err = ObfuscateOptions::from_value(&json!({
            "rename_lists": { "list_name_length": 6 }
        }))
        .unwrap_err();
        let option_err = err.downcast_ref::<OptionError>().unwrap();
        assert!(option_err.message.contains("rename_lists_to"));
    }

    #[test]
    fn null_strategy_is_an_option_error() {
        let err = ObfuscateOptions::from_value(&json!({
            "rename_lists": { "rename_lists_to": null }
        }))
        .unwrap_err();
        assert!(err.downcast_ref::<OptionError>().is_some());
    }

    #[test]
    fn non_integer_length_is_an_option_error() {
        let err = ObfuscateOptions::from_value(&json!({
            "rename_variables": {
                "rename_variables_to": "random_hex",
                "variable_name_length": "long"
            }
        }))
        .unwrap_err();
        let option_err = err.downcast_ref::<OptionError>().unwrap();
        assert!(option_err.message.contains("variable_name_length"));
    }

    #[test]
    fn unicode_range_resolves_bounds() {
        let options = ObfuscateOptions::from_value(&json!({
            "rename_lists": {
                "rename_lists_to": "random_unicode_char_range",
                "list_name_length": 5,
                "range_start": 0x4E00,
                "range_end": 0x9FFF
            }
        }))
        .unwrap();
        assert_eq!(
            options.lists.unwrap().generator,
            NameGenerator::UnicodeRange {
                length: 5,
                start: 0x4E00,
                end: 0x9FFF
            }
        );
    }

    #[test]
    fn inverted_range_is_an_option_error() {
        let err = ObfuscateOptions::from_value(&json!({
            "rename_lists": {
                "rename_lists_to": "random_unicode_char_range",
                "range_start": 0x9FFF,
                "range_end": 0x4E00
            }
        }))
        .unwrap_err();
        let option_err = err.downcast_ref::<OptionError>().unwrap();
        assert!(option_err.message.contains("range_start"));
    }

    #[test]
    fn missing_range_bounds_are_an_option_error() {
        let err = ObfuscateOptions::from_value(&json!({
            "rename_lists": { "rename_lists_to": "random_unicode_char_range" }
        }))
        .unwrap_err();
        assert!(err.downcast_ref::<OptionError>().is_some());
    }

    #[test]
    fn surrogate_only_range_is_an_option_error() {
        let err = ObfuscateOptions::from_value(&json!({
            "rename_lists": {
                "rename_lists_to": "random_unicode_char_range",
                "range_start": 0xD800,
                "range_end": 0xDFFF
            }
        }))
        .unwrap_err();
        assert!(err.downcast_ref::<OptionError>().is_some());
    }

    #[test]
    fn unknown_strategy_is_an_option_error() {
        let err = ObfuscateOptions::from_value(&json!({
            "rename_sprites": { "rename_sprites_to": "rot13" }
        }))
        .unwrap_err();
        assert!(err.downcast_ref::<OptionError>().is_some());
    }

    #[test]
    fn scope_booleans_are_honored() {
        let options = ObfuscateOptions::from_value(&json!({
            "rename_variables": {
                "rename_variables_to": "random_hex",
                "rename_public_variables": false
            }
        }))
        .unwrap();
        let variables = options.variables.unwrap();
        assert!(!variables.rename_public);
        assert!(variables.rename_private);
    }

    #[test]
    fn unknown_top_level_keys_are_collected_not_fatal() {
        let options = ObfuscateOptions::from_value(&json!({
            "rename_sprites": { "rename_sprites_to": "random_hex" },
            "foo": 1
        }))
        .unwrap();
        assert!(options.sprites.is_some());
        assert_eq!(options.unknown_keys, vec!["foo".to_string()]);
    }

    #[test]
    fn mistyped_known_key_is_collected_not_fatal() {
        let options = ObfuscateOptions::from_value(&json!({
            "rename_sprites": "random_hex",
            "convert_integers_to_hexadecimal": "yes"
        }))
        .unwrap();
        assert!(options.sprites.is_none());
        assert!(!options.hex_integer_literals);
        assert_eq!(
            options.unknown_keys,
            vec![
                "rename_sprites".to_string(),
                "convert_integers_to_hexadecimal".to_string()
            ]
        );
    }

    #[test]
    fn non_object_options_are_a_type_error() {
        let err = ObfuscateOptions::from_value(&json!([1, 2, 3])).unwrap_err();
        assert!(err.downcast_ref::<OptionsTypeError>().is_some());
    }
}
