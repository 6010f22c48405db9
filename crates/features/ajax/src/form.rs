//! Reading forms the way a browser submits them.

use crate::request::FormPayload;
use http::Method;
use ln_dom::{Document, DomError, Element};
use url::Url;

const SKIPPED_INPUT_TYPES: &[&str] = &["submit", "button", "image", "reset", "file"];

/// The form's method, case-insensitively; anything unrecognized is `GET`.
#[must_use]
pub fn form_method(form: &Element) -> Method {
    match form.attr("method").map(|m| m.trim().to_ascii_uppercase()).as_deref() {
        Some("POST") => Method::POST,
        Some("PUT") => Method::PUT,
        Some("PATCH") => Method::PATCH,
        Some("DELETE") => Method::DELETE,
        _ => Method::GET,
    }
}

/// The resolved `action`, or the current location when the form has none.
///
/// # Errors
/// Returns [`DomError::InvalidUrl`] when the action cannot be resolved.
pub fn form_action(document: &Document, form: &Element) -> Result<Url, DomError> {
    match form.attr("action").filter(|a| !a.trim().is_empty()) {
        Some(action) => document.resolve_url(action.trim()),
        None => Ok(document.location()),
    }
}

/// Successful controls in document order.
#[must_use]
pub fn collect_payload(form: &Element) -> FormPayload {
    let mut payload = FormPayload::new();
    for control in form.descendants() {
        let Some(name) = control.attr("name").filter(|n| !n.is_empty()) else { continue };
        if control.is_disabled() {
            continue;
        }
        match control.tag() {
            "input" => {
                let kind = control.attr("type").unwrap_or_default().to_ascii_lowercase();
                if SKIPPED_INPUT_TYPES.contains(&kind.as_str()) {
                    continue;
                }
                if matches!(kind.as_str(), "checkbox" | "radio") {
                    if control.has_attr("checked") {
                        payload.push(name, control.attr("value").unwrap_or_else(|| "on".to_owned()));
                    }
                    continue;
                }
                payload.push(name, control.attr("value").unwrap_or_default());
            },
            "select" => {
                let options = control.find_all(|e| e.tag() == "option");
                let chosen: Vec<Element> = if control.has_attr("multiple") {
                    options.into_iter().filter(|o| o.has_attr("selected")).collect()
                } else {
                    options
                        .iter()
                        .find(|o| o.has_attr("selected"))
                        .or_else(|| options.first())
                        .cloned()
                        .into_iter()
                        .collect()
                };
                for option in chosen {
                    let value = option.attr("value").unwrap_or_else(|| option.text_content().trim().to_owned());
                    payload.push(name.clone(), value);
                }
            },
            "textarea" => payload.push(name, control.text_content()),
            _ => {},
        }
    }
    payload
}

/// Controls that can submit the form: `button` elements that are not `type=button` or
/// `type=reset`, and `input[type=submit]`.
#[must_use]
pub fn submit_controls(form: &Element) -> Vec<Element> {
    form.find_all(|e| match e.tag() {
        "button" => !e
            .attr("type")
            .is_some_and(|t| t.eq_ignore_ascii_case("button") || t.eq_ignore_ascii_case("reset")),
        "input" => e.attr("type").is_some_and(|t| t.eq_ignore_ascii_case("submit")),
        _ => false,
    })
}
