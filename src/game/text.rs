//! Chat component flattening and formatting-code removal.

use std::sync::LazyLock;

use fancy_regex::Regex;
use serde_json::Value;

/// `§` followed by one formatting character.
static FORMAT_CODE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"§[a-zA-Z0-9]").unwrap());

/// Concatenate the text of a chat component tree.
///
/// Strings are taken as-is and arrays are joined. Objects contribute their
/// nested `json`, then `text`, then `extra`, then the empty-key field.
pub fn flatten(component: &Value) -> String {
    let mut out = String::new();
    flatten_into(component, &mut out);
    out
}

fn flatten_into(component: &Value, out: &mut String) {
    match component {
        Value::String(text) => out.push_str(text),
        Value::Array(items) => {
            for item in items {
                flatten_into(item, out);
            }
        }
        Value::Object(map) => {
            if let Some(json) = map.get("json") {
                flatten_into(json, out);
            }
            if let Some(Value::String(text)) = map.get("text") {
                out.push_str(text);
            }
            if let Some(extra) = map.get("extra") {
                flatten_into(extra, out);
            }
            if let Some(Value::String(text)) = map.get("") {
                out.push_str(text);
            }
        }
        _ => {}
    }
}

/// Remove `§x` formatting codes.
pub fn strip_format_codes(text: &str) -> String {
    FORMAT_CODE.replace_all(text, "").into_owned()
}

/// Flatten a component and strip its formatting codes.
pub fn clean_component(component: &Value) -> String {
    strip_format_codes(&flatten(component))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_flatten_nested_component() {
        let component = json!({
            "text": "",
            "extra": [
                {"text": "Steve"},
                ": ",
                {"text": "hi", "extra": [{"text": " there"}]}
            ]
        });
        assert_eq!(flatten(&component), "Steve: hi there");
    }

    #[test]
    fn test_flatten_json_and_empty_key() {
        let component = json!({"json": {"text": "a"}, "text": "b", "": "c"});
        assert_eq!(flatten(&component), "abc");
    }

    #[test]
    fn test_flatten_ignores_non_text() {
        let component = json!({"text": "x", "bold": true, "extra": [1, null, "y"]});
        assert_eq!(flatten(&component), "xy");
    }

    #[test]
    fn test_strip_format_codes() {
        assert_eq!(strip_format_codes("§aGreen §lBold§r text"), "Green Bold text");
        assert_eq!(strip_format_codes("no codes"), "no codes");
    }

    #[test]
    fn test_clean_component() {
        let component = json!({"extra": ["§6Welcome ", {"text": "§bSteve!"}]});
        assert_eq!(clean_component(&component), "Welcome Steve!");
    }
}
