use crate::rename::for_each_block;
use anyhow::Result;
use regex::Regex;
use serde_json::Value;

// Input-slot primitive kind for a plain number literal in project.json.
const NUMBER_PRIMITIVE: u64 = 4;

/// Rewrites every all-decimal number literal in block input slots to its
/// 0x-prefixed hexadecimal form. Anything already symbolic (signs, decimal
/// points, exponents, an earlier 0x prefix) fails the digit pattern and is
/// left untouched, so the pass never converts twice.
pub fn hex_integer_literals(targets: &mut [Value]) -> Result<()> {
    let decimal_re = Regex::new(r"^\d+$")?;
    for target in targets.iter_mut() {
        for_each_block(target, |block| {
            let Some(inputs) = block.get_mut("inputs").and_then(Value::as_object_mut) else {
                return;
            };
            for input in inputs.values_mut() {
                recode_input(&decimal_re, input);
            }
        });
    }
    Ok(())
}

fn recode_input(decimal_re: &Regex, input: &mut Value) {
    // Input slots look like [shadow_code, [kind, "literal"], ...]; only the
    // wrapped literal at index 1 can hold a number primitive.
    let Some(wrapped) = input.get_mut(1).and_then(Value::as_array_mut) else {
        return;
    };
    if wrapped.first().and_then(Value::as_u64) != Some(NUMBER_PRIMITIVE) {
        return;
    }
    let Some(text) = wrapped.get(1).and_then(Value::as_str) else {
        return;
    };
    if !decimal_re.is_match(text) {
        return;
    }
    // Digits beyond u128 stay as they are.
    let Ok(number) = text.parse::<u128>() else {
        return;
    };
    wrapped[1] = Value::String(format!("{:#x}", number));
}
