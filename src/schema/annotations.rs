//! `@marker` annotations attached to fields.
//!
//! A field's documentation block may contain markers such as:
//!
//! ```text
//! /**
//!  * @required
//!  * @requestVar user_id
//!  * @afterInitCallBack normalizeId
//!  */
//! ```
//!
//! Each marker is searched for on its own, so several may share a line. A
//! payload is the rest of the line after the marker, trimmed. Only the first
//! occurrence of a marker counts. Missing or empty payloads fall back to
//! defaults; parsing never fails.

use regex::Regex;
use std::sync::OnceLock;

use crate::schema::types::{FieldDef, ItemType};

const MARKERS: [&str; 7] = [
    "required",
    "notEmpty",
    "requestVar",
    "itemType",
    "beforeInitCallBack",
    "afterInitCallBack",
    "afterObjInitCallback",
];

fn marker_patterns() -> &'static [(&'static str, Regex)] {
    static PATTERNS: OnceLock<Vec<(&'static str, Regex)>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        MARKERS
            .iter()
            .map(|marker| {
                let pattern = format!(r"@{}\b([^\r\n]*)", marker);
                (*marker, Regex::new(&pattern).expect("marker pattern is valid"))
            })
            .collect()
    })
}

/// Rest of the line after the first occurrence of `@marker`, if any.
fn find_marker<'d>(doc: &'d str, marker: &str) -> Option<&'d str> {
    marker_patterns()
        .iter()
        .find(|(name, _)| *name == marker)
        .and_then(|(_, regex)| regex.captures(doc))
        .map(|caps| caps.get(1).map_or("", |m| m.as_str()))
}

/// Parsed annotations for one field
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Annotations {
    pub required: bool,
    pub not_empty: bool,
    /// Explicit source key, overriding name resolution
    pub request_var: Option<String>,
    /// Element type for `array` fields, `string` unless declared
    pub item_type: ItemType,
    pub before_init_callback: Option<String>,
    pub after_init_callback: Option<String>,
    pub after_obj_init_callback: Option<String>,
}

impl Annotations {
    /// Extract annotations from a documentation block.
    pub fn parse(doc: &str) -> Self {
        let payload = |marker: &str| find_marker(doc, marker).and_then(clean_payload);

        Annotations {
            required: find_marker(doc, "required").is_some(),
            not_empty: find_marker(doc, "notEmpty").is_some(),
            request_var: payload("requestVar"),
            item_type: payload("itemType")
                .map(|name| ItemType::parse(&name))
                .unwrap_or_default(),
            before_init_callback: payload("beforeInitCallBack"),
            after_init_callback: payload("afterInitCallBack"),
            after_obj_init_callback: payload("afterObjInitCallback"),
        }
    }

    /// Merge doc markers with the structured keys of a declaration.
    ///
    /// Structured values replace doc payloads; flags are combined.
    pub fn from_field(field: &FieldDef) -> Self {
        let mut annotations = field
            .doc
            .as_deref()
            .map(Annotations::parse)
            .unwrap_or_default();

        annotations.required |= field.required;
        annotations.not_empty |= field.not_empty;
        override_with(&mut annotations.request_var, &field.request_var);
        override_with(&mut annotations.before_init_callback, &field.before_init);
        override_with(&mut annotations.after_init_callback, &field.after_init);
        override_with(&mut annotations.after_obj_init_callback, &field.after_obj_init);
        if let Some(item_type) = non_blank(&field.item_type) {
            annotations.item_type = ItemType::parse(item_type);
        }

        annotations
    }
}

fn clean_payload(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let trimmed = trimmed.strip_suffix("*/").unwrap_or(trimmed).trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn override_with(slot: &mut Option<String>, value: &Option<String>) {
    if let Some(value) = non_blank(value) {
        *slot = Some(value.to_string());
    }
}
