//! Checking user supplied parameters against an agent's declared ones.

use super::metadata::ParameterDescriptor;
use crate::report::{ForceCode, ReportItem, Severity};
use indexmap::IndexMap;
use std::collections::HashSet;

/// Parameter name to value, in the order the user gave them.
pub type ParameterValues = IndexMap<String, String>;

/// Split the problems with `actual` into unknown names and missing required names.
///
/// Unknown names keep the order of `actual`, missing ones the declaration order.
pub fn invalid_and_missing(
    declared: &[ParameterDescriptor],
    actual: &ParameterValues,
) -> (Vec<String>, Vec<String>) {
    let known: HashSet<&str> = declared.iter().map(|p| p.name.as_str()).collect();

    let invalid = actual
        .keys()
        .filter(|name| !known.contains(name.as_str()))
        .cloned()
        .collect();
    let missing = declared
        .iter()
        .filter(|p| p.required && !actual.contains_key(&p.name))
        .map(|p| p.name.clone())
        .collect();

    (invalid, missing)
}

/// Reports for the outcome of [`invalid_and_missing`].
///
/// Problems are forceable errors, or plain warnings when the caller already
/// allows invalid parameters.
pub fn reports(
    invalid: &[String],
    missing: &[String],
    mut allowed: Vec<String>,
    option_type: &str,
    allow_invalid: bool,
) -> Vec<ReportItem> {
    let (severity, forceable) = if allow_invalid {
        (Severity::Warning, None)
    } else {
        (Severity::Error, Some(ForceCode::ForceOptions))
    };
    allowed.sort();

    let mut reports = Vec::new();
    if !invalid.is_empty() {
        reports.push(ReportItem::invalid_option(
            invalid,
            &allowed,
            option_type,
            severity,
            forceable,
        ));
    }
    if !missing.is_empty() {
        reports.push(ReportItem::required_option_is_missing(
            missing,
            option_type,
            severity,
            forceable,
        ));
    }
    reports
}
