//! Dynamic search filter builder
//!
//! Turns a `{label, searchValue}` pair into a [`Predicate`] for one of the
//! schemas in [`registry`]. The reserved label `all` searches every field
//! marked for it at once.

pub mod predicate;
pub mod registry;

use serde::Deserialize;
use thiserror::Error;

pub use predicate::Predicate;
pub use registry::{FieldDef, FieldKind, FilterSchema};

use crate::core::pagination::Pagination;

/// Label that fans out across every searchable field
pub const ALL_LABEL: &str = "all";

/// Per-request search and paging options
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchOptions {
    pub label: Option<String>,
    pub search_value: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl SearchOptions {
    pub fn search(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: Some(label.into()),
            search_value: Some(value.into()),
            ..Default::default()
        }
    }

    pub fn with_page(mut self, page: i64, limit: i64) -> Self {
        self.page = Some(page);
        self.limit = Some(limit);
        self
    }

    pub fn pagination(&self) -> Pagination {
        Pagination::normalize(self.limit, self.page)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FilterError {
    #[error("Unsupported filter label '{label}' for {entity}")]
    UnsupportedLabel { label: String, entity: &'static str },

    #[error("Filter '{label}' expects a whole number, got '{value}'")]
    InvalidNumber { label: &'static str, value: String },

    #[error("Filter '{label}' must be one of {allowed}, got '{value}'")]
    InvalidEnumValue {
        label: &'static str,
        value: String,
        allowed: String,
    },
}

/// Build the dynamic predicate for `options`.
///
/// Returns `Ok(None)` unless both a label and a non-blank search value are
/// present.
pub fn build(schema: &FilterSchema, options: &SearchOptions) -> Result<Option<Predicate>, FilterError> {
    let label = options.label.as_deref().map(str::trim).unwrap_or_default();
    let value = options
        .search_value
        .as_deref()
        .map(str::trim)
        .unwrap_or_default();

    if label.is_empty() || value.is_empty() {
        return Ok(None);
    }

    if label.eq_ignore_ascii_case(ALL_LABEL) {
        return Ok(Some(build_all(schema, value)));
    }

    let field = schema
        .field(label)
        .ok_or_else(|| FilterError::UnsupportedLabel {
            label: label.to_string(),
            entity: schema.entity,
        })?;

    build_field(field, value).map(Some)
}

fn build_field(field: &FieldDef, value: &str) -> Result<Predicate, FilterError> {
    match field.kind {
        FieldKind::Id => value
            .parse::<i64>()
            .map(|id| Predicate::eq_int(field.column, id))
            .map_err(|_| FilterError::InvalidNumber {
                label: field.label,
                value: value.to_string(),
            }),
        FieldKind::Text => Ok(Predicate::contains(field.column, value)),
        FieldKind::Enum(allowed) => match_enum(allowed, value)
            .map(|canonical| Predicate::eq_text(field.column, canonical))
            .ok_or_else(|| FilterError::InvalidEnumValue {
                label: field.label,
                value: value.to_string(),
                allowed: allowed.join(", "),
            }),
    }
}

/// An enum hit wins outright; otherwise OR every text field, plus the id
/// fields when the value is an integer.
fn build_all(schema: &FilterSchema, value: &str) -> Predicate {
    let participating = schema.fields.iter().filter(|f| f.in_all);

    for field in participating.clone() {
        if let FieldKind::Enum(allowed) = field.kind {
            if let Some(canonical) = match_enum(allowed, value) {
                return Predicate::eq_text(field.column, canonical);
            }
        }
    }

    let numeric = value.parse::<i64>().ok();
    let branches = participating
        .filter_map(|field| match field.kind {
            FieldKind::Text => Some(Predicate::contains(field.column, value)),
            FieldKind::Id => numeric.map(|id| Predicate::eq_int(field.column, id)),
            FieldKind::Enum(_) => None,
        })
        .collect();

    Predicate::Any(branches)
}

/// Canonical member of `allowed` for `value`, ignoring case and separators
pub fn match_enum(allowed: &'static [&'static str], value: &str) -> Option<&'static str> {
    let normalized = value.trim().replace([' ', '-'], "_");
    allowed
        .iter()
        .find(|candidate| candidate.eq_ignore_ascii_case(&normalized))
        .copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use registry::{EQUIPMENT, STATES, WORKERS};
    use rusqlite::types::Value;

    fn branches(pred: &Predicate) -> &[Predicate] {
        match pred {
            Predicate::Any(parts) => parts,
            other => panic!("expected OR fan-out, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_label_or_value_means_no_filter() {
        let opts = SearchOptions {
            label: Some("email".into()),
            search_value: Some("   ".into()),
            ..Default::default()
        };
        assert_eq!(build(&WORKERS, &opts), Ok(None));

        let opts = SearchOptions {
            label: None,
            search_value: Some("ann".into()),
            ..Default::default()
        };
        assert_eq!(build(&WORKERS, &opts), Ok(None));
    }

    #[test]
    fn test_all_with_integer_adds_id_branch() {
        let pred = build(&WORKERS, &SearchOptions::search("all", "42"))
            .unwrap()
            .unwrap();
        assert!(branches(&pred).contains(&Predicate::eq_int("a.id", 42)));
    }

    #[test]
    fn test_all_with_text_has_no_id_branch() {
        let pred = build(&WORKERS, &SearchOptions::search("all", "applicator"))
            .unwrap()
            .unwrap();
        let parts = branches(&pred);
        assert!(parts
            .iter()
            .all(|p| matches!(p, Predicate::Contains { .. })));
        assert!(parts.contains(&Predicate::contains("a.email", "applicator")));
        assert!(!parts
            .iter()
            .any(|p| matches!(p, Predicate::Eq { column: "l.invite_status", .. })));
    }

    #[test]
    fn test_all_enum_match_short_circuits() {
        let pred = build(&WORKERS, &SearchOptions::search("all", "pending"))
            .unwrap()
            .unwrap();
        assert_eq!(pred, Predicate::eq_text("l.invite_status", "PENDING"));

        let pred = build(&EQUIPMENT, &SearchOptions::search("all", "ground rig"))
            .unwrap()
            .unwrap();
        assert_eq!(pred, Predicate::eq_text("e.equipment_type", "GROUND_RIG"));
    }

    #[test]
    fn test_specific_text_label() {
        let pred = build(&WORKERS, &SearchOptions::search("email", "Ann@"))
            .unwrap()
            .unwrap();
        let (sql, params) = pred.to_sql();
        assert_eq!(sql, "LOWER(a.email) LIKE ? ESCAPE '\\'");
        assert_eq!(params, vec![Value::Text("%ann@%".to_string())]);
    }

    #[test]
    fn test_specific_id_label_requires_integer() {
        assert_eq!(
            build(&STATES, &SearchOptions::search("id", "7")),
            Ok(Some(Predicate::eq_int("s.id", 7)))
        );
        assert!(matches!(
            build(&STATES, &SearchOptions::search("id", "seven")),
            Err(FilterError::InvalidNumber { .. })
        ));
    }

    #[test]
    fn test_specific_enum_label_rejects_unknown_value() {
        assert_eq!(
            build(&WORKERS, &SearchOptions::search("inviteStatus", "accepted")),
            Ok(Some(Predicate::eq_text("l.invite_status", "ACCEPTED")))
        );
        assert!(matches!(
            build(&WORKERS, &SearchOptions::search("inviteStatus", "maybe")),
            Err(FilterError::InvalidEnumValue { .. })
        ));
    }

    #[test]
    fn test_unknown_label_is_typed_error() {
        assert_eq!(
            build(&WORKERS, &SearchOptions::search("shoeSize", "9")),
            Err(FilterError::UnsupportedLabel {
                label: "shoeSize".to_string(),
                entity: "workers",
            })
        );
    }
}
