use wasm_bindgen::prelude::*;

#[wasm_bindgen]
pub fn obfuscate_sb3(bytes: &[u8], options_json: &str) -> Result<Vec<u8>, JsValue> {
    let options: serde_json::Value =
        serde_json::from_str(options_json).map_err(|e| JsValue::from_str(&e.to_string()))?;
    crate::obfuscate_sb3_bytes(bytes, &options).map_err(|e| JsValue::from_str(&e.to_string()))
}
