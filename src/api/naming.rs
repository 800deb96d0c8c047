//! Template naming conventions.
//!
//! Templates follow an em-dash-separated "Verb — Target [Subtype]" pattern,
//! and the leading verb determines which view the template belongs in.
//! Violations are warnings only; they never block an operation.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use serde_json::Value;

/// Separator between the verb and the target.
pub const VERB_SEPARATOR: &str = " \u{2014} ";

/// Static verb to view-id lookup.
pub static VIEW_MAP: Lazy<HashMap<&'static str, i64>> = Lazy::new(|| {
    HashMap::from([
        ("Backup", 2),
        ("Update", 3),
        ("Maintain", 4),
        ("Download", 5),
        ("Verify", 6),
        ("Restore", 7),
        ("Rollback", 7),
        ("Test", 7),
        ("Deploy", 8),
        ("Build", 8),
        ("Apply", 8),
        ("DR", 8),
        ("Setup", 9),
        ("Manage", 9),
    ])
});

/// Checks a template name against the naming convention.
///
/// Returns warnings; an empty vec means the name conforms.
pub fn validate_template_name(name: &str, view_id: i64) -> Vec<String> {
    let mut warnings = Vec::new();
    match name.split_once(VERB_SEPARATOR) {
        None => warnings.push(
            "Name should follow 'Verb \u{2014} Target [Subtype]' (missing em-dash)".to_string(),
        ),
        Some((verb, _)) => {
            let verb = verb.trim();
            if let Some(&expected) = VIEW_MAP.get(verb) {
                if expected != view_id {
                    warnings.push(format!(
                        "Verb '{verb}' maps to view {expected}, got {view_id}"
                    ));
                }
            }
        }
    }
    warnings
}

/// Checks a template JSON object, e.g. the merged result of an update.
///
/// Uses the object's own `name` and `view_id` so a view-only change is still
/// checked against the existing name. A missing view id counts as 0, which
/// mismatches every known verb.
pub fn validate_template_object(template: &Value) -> Vec<String> {
    match template.get("name").and_then(Value::as_str) {
        Some(name) => {
            let view_id = template
                .get("view_id")
                .and_then(Value::as_i64)
                .unwrap_or(0);
            validate_template_name(name, view_id)
        }
        None => Vec::new(),
    }
}
