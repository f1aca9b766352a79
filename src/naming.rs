//! Resolution of the parameter key a field reads from.

use convert_case::{Boundary, Case, Converter};

use crate::schema::annotations::Annotations;
use crate::value::ParameterMap;

/// Convert a camelCase field name to snake_case.
///
/// An uppercase letter after a lowercase letter or a digit starts a new word
/// (`line2Id` becomes `line2_id`). Trailing digits and existing underscores
/// are left alone (`line2` stays `line2`, `user_id` stays `user_id`), and a
/// run of capitals stays one word (`userID` becomes `user_id`).
pub fn to_snake_case(s: &str) -> String {
    Converter::new()
        .set_boundaries(&[Boundary::LowerUpper, Boundary::DigitUpper])
        .to_case(Case::Snake)
        .convert(s)
}

/// Compute the effective key for a field.
///
/// 1. The field name itself, if present in `params`.
/// 2. Otherwise the snake_case form of the field name.
/// 3. An explicit `request_var` replaces either of the above, whether or not
///    it is present in `params`.
pub fn resolve_key(field_name: &str, annotations: &Annotations, params: &ParameterMap) -> String {
    if let Some(request_var) = &annotations.request_var {
        return request_var.clone();
    }
    if params.contains_key(field_name) {
        field_name.to_string()
    } else {
        to_snake_case(field_name)
    }
}
