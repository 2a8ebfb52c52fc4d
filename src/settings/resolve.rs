//! Default-merge, single-field update and section-order repair.
//!
//! All three are pure functions. There is no shared default instance:
//! every caller passes what it has and gets a complete value back.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{SectionId, SettingsError, TemplateSettings};

/// A stored settings record that may be missing keys, carry stale keys, or
/// hold values of the wrong type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PartialSettings(pub Map<String, Value>);

impl PartialSettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style key insertion.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Parse a stored JSON record. Anything other than an object is treated
    /// as an empty record.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let value: Value = serde_json::from_str(json)?;
        Ok(match value {
            Value::Object(map) => Self(map),
            _ => Self::default(),
        })
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&TemplateSettings> for PartialSettings {
    fn from(settings: &TemplateSettings) -> Self {
        Self(to_map(settings))
    }
}

fn to_map(settings: &TemplateSettings) -> Map<String, Value> {
    match serde_json::to_value(settings) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    }
}

fn from_map(map: &Map<String, Value>) -> Result<TemplateSettings, serde_json::Error> {
    TemplateSettings::deserialize(Value::Object(map.clone()))
}

/// Overlay a stored record onto the hardcoded defaults.
///
/// Merging is by top-level key replacement only. `null` values, unknown keys
/// and values that fail to deserialize keep the default for that key and are
/// logged; the result is always fully populated.
///
/// ```
/// use proforma::settings::{PartialSettings, resolve};
///
/// let stored = PartialSettings::new().with("primary_color", "teal");
/// let settings = resolve(Some(&stored));
/// assert_eq!(settings.palette.primary_color, "teal");
/// assert!(settings.visibility.show_logo);
/// ```
pub fn resolve(partial: Option<&PartialSettings>) -> TemplateSettings {
    let defaults = TemplateSettings::default();
    let Some(partial) = partial else {
        return defaults;
    };

    let mut merged = to_map(&defaults);
    for (key, value) in &partial.0 {
        if value.is_null() {
            continue;
        }
        if !merged.contains_key(key) {
            tracing::warn!(field = %key, "ignoring unknown settings field");
            continue;
        }
        let previous = merged.insert(key.clone(), value.clone());
        if let Err(e) = from_map(&merged) {
            tracing::warn!(field = %key, error = %e, "invalid settings value, using default");
            if let Some(previous) = previous {
                merged.insert(key.clone(), previous);
            }
        }
    }

    from_map(&merged).unwrap_or(defaults)
}

/// Replace one field by its persisted key.
///
/// Only the value's type is checked; colors and labels are accepted as-is.
pub fn update_field(
    current: &TemplateSettings,
    key: &str,
    value: Value,
) -> Result<TemplateSettings, SettingsError> {
    let mut map = to_map(current);
    if !map.contains_key(key) {
        return Err(SettingsError::UnknownField(key.to_string()));
    }
    map.insert(key.to_string(), value);
    from_map(&map).map_err(|e| SettingsError::InvalidValue {
        field: key.to_string(),
        reason: e.to_string(),
    })
}

/// Turn a stored section order into a permutation of the canonical set.
///
/// Unknown ids and repeats are dropped (first occurrence wins); missing ids
/// are appended in canonical order.
///
/// ```
/// use proforma::settings::{SectionId, repair_section_order};
///
/// let order = repair_section_order(&["totals", "bogus", "header", "totals"]);
/// assert_eq!(order[0], SectionId::Totals);
/// assert_eq!(order[1], SectionId::Header);
/// assert_eq!(order.len(), 7);
/// ```
pub fn repair_section_order<S: AsRef<str>>(order: &[S]) -> Vec<SectionId> {
    let mut repaired: Vec<SectionId> = Vec::with_capacity(SectionId::CANONICAL.len());
    for id in order.iter().filter_map(|s| SectionId::parse(s.as_ref())) {
        if !repaired.contains(&id) {
            repaired.push(id);
        }
    }
    for id in SectionId::CANONICAL {
        if !repaired.contains(&id) {
            repaired.push(id);
        }
    }
    repaired
}

/// Move `id` to `to_index` (clamped to the end).
pub fn move_section(order: &[SectionId], id: SectionId, to_index: usize) -> Vec<SectionId> {
    let ids: Vec<&str> = order.iter().map(|s| s.as_str()).collect();
    let mut repaired = repair_section_order(&ids);
    repaired.retain(|s| *s != id);
    let index = to_index.min(repaired.len());
    repaired.insert(index, id);
    repaired
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{BorderStyle, SizeScale};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn is_canonical_permutation(order: &[SectionId]) -> bool {
        order.len() == SectionId::CANONICAL.len()
            && SectionId::CANONICAL.iter().all(|id| order.iter().filter(|o| *o == id).count() == 1)
    }

    // ── resolve ─────────────────────────────────────────────────────────

    #[test]
    fn resolve_none_gives_defaults() {
        assert_eq!(resolve(None), TemplateSettings::default());
    }

    #[test]
    fn resolve_empty_gives_defaults() {
        assert_eq!(resolve(Some(&PartialSettings::new())), TemplateSettings::default());
    }

    #[test]
    fn resolve_replaces_top_level_keys() {
        let stored = PartialSettings::new()
            .with("primary_color", "rebeccapurple")
            .with("font_size", "large")
            .with("border_style", "bold")
            .with("show_terms", false)
            .with("terms", json!(["only line"]));
        let settings = resolve(Some(&stored));
        assert_eq!(settings.palette.primary_color, "rebeccapurple");
        assert_eq!(settings.typography.font_size, SizeScale::Large);
        assert_eq!(settings.layout.border_style, BorderStyle::Bold);
        assert!(!settings.visibility.show_terms);
        assert_eq!(settings.labels.terms, vec!["only line".to_string()]);
        // untouched keys keep defaults
        assert_eq!(settings.palette.accent_color, "#2563eb");
    }

    #[test]
    fn resolve_ignores_nulls_unknown_keys_and_bad_types() {
        let stored = PartialSettings::new()
            .with("primary_color", Value::Null)
            .with("legacy_theme", "dark")
            .with("show_logo", "yes")
            .with("font_size", "gigantic");
        let settings = resolve(Some(&stored));
        assert_eq!(settings, TemplateSettings::default());
    }

    #[test]
    fn resolve_accepts_any_color_string() {
        let stored = PartialSettings::new().with("grand_total_bg", "not-a-color");
        assert_eq!(resolve(Some(&stored)).palette.grand_total_bg, "not-a-color");
    }

    #[test]
    fn resolve_is_idempotent() {
        let inputs = vec![
            PartialSettings::new(),
            PartialSettings::new()
                .with("accent_color", "#ff0000")
                .with("section_order", json!(["signature", "junk", "header", "header"]))
                .with("freeform_canvas", json!({"objects": [{"type": "rect"}]})),
            PartialSettings::new().with("show_brand_column", false).with("row_padding", "relaxed"),
        ];
        for input in inputs {
            let once = resolve(Some(&input));
            let twice = resolve(Some(&PartialSettings::from(&once)));
            assert_eq!(twice, once);
        }
    }

    #[test]
    fn resolve_repairs_stored_section_order() {
        let stored = PartialSettings::new().with("section_order", json!(["terms", "nope"]));
        let settings = resolve(Some(&stored));
        assert_eq!(settings.section_order[0], SectionId::Terms);
        assert!(is_canonical_permutation(&settings.section_order));
    }

    // ── update_field ────────────────────────────────────────────────────

    #[test]
    fn update_field_replaces_one_key() {
        let current = TemplateSettings::default();
        let updated = update_field(&current, "document_title", json!("QUOTATION")).unwrap();
        assert_eq!(updated.labels.document_title, "QUOTATION");
        assert_eq!(updated.palette, current.palette);
    }

    #[test]
    fn update_field_rejects_unknown_key() {
        let err = update_field(&TemplateSettings::default(), "shadow", json!(true)).unwrap_err();
        assert_eq!(err, SettingsError::UnknownField("shadow".to_string()));
    }

    #[test]
    fn update_field_rejects_wrong_type() {
        let err = update_field(&TemplateSettings::default(), "show_logo", json!(3)).unwrap_err();
        assert!(matches!(err, SettingsError::InvalidValue { ref field, .. } if field == "show_logo"));
    }

    #[test]
    fn update_field_clears_canvas_with_null() {
        let mut current = TemplateSettings::default();
        current.freeform_canvas = Some("{}".to_string());
        let updated = update_field(&current, "freeform_canvas", Value::Null).unwrap();
        assert_eq!(updated.freeform_canvas, None);
    }

    // ── section order ───────────────────────────────────────────────────

    #[test]
    fn repair_empty_order() {
        let empty: [&str; 0] = [];
        assert_eq!(repair_section_order(&empty), SectionId::CANONICAL.to_vec());
    }

    #[test]
    fn repair_handles_unknown_and_duplicates() {
        let cases: Vec<Vec<&str>> = vec![
            vec!["bogus"],
            vec!["totals", "totals", "totals"],
            vec!["signature", "terms", "bank_details", "totals", "items_table", "customer_details", "header"],
            vec!["header", "", "HEADER", "items_table", "x", "signature"],
        ];
        for case in cases {
            let repaired = repair_section_order(&case);
            assert!(is_canonical_permutation(&repaired), "{:?} -> {:?}", case, repaired);
        }
    }

    #[test]
    fn repair_keeps_valid_prefix_order() {
        let repaired = repair_section_order(&["signature", "header"]);
        assert_eq!(
            repaired,
            vec![
                SectionId::Signature,
                SectionId::Header,
                SectionId::CustomerDetails,
                SectionId::ItemsTable,
                SectionId::Totals,
                SectionId::BankDetails,
                SectionId::Terms,
            ]
        );
    }

    #[test]
    fn move_section_to_front_and_past_end() {
        let order = SectionId::CANONICAL.to_vec();
        let moved = move_section(&order, SectionId::Totals, 0);
        assert_eq!(moved[0], SectionId::Totals);
        assert!(is_canonical_permutation(&moved));

        let moved = move_section(&order, SectionId::Header, 99);
        assert_eq!(moved.last(), Some(&SectionId::Header));
        assert!(is_canonical_permutation(&moved));
    }
}
