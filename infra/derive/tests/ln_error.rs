use ln_derive::ln_error;
use std::borrow::Cow;

#[ln_error]
pub enum DemoError {
    #[error("Decode error{}: {source}", format_context(.context))]
    Decode { source: std::num::ParseIntError, context: Option<Cow<'static, str>> },

    #[error("Rejected{}: {message}", format_context(.context))]
    Rejected { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Internal error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

fn parse(raw: &str) -> Result<u32, DemoError> {
    Ok(raw.parse::<u32>()?)
}

#[test]
fn source_errors_convert_through_question_mark() {
    let err = parse("not-a-number").unwrap_err();
    assert!(matches!(err, DemoError::Decode { context: None, .. }));
    assert!(err.to_string().starts_with("Decode error: "));
}

#[test]
fn context_is_attached_to_source_results() {
    let err = "x".parse::<u32>().context("reading port").unwrap_err();
    assert!(matches!(err, DemoError::Decode { .. }));
    assert!(err.to_string().starts_with("Decode error (reading port): "));
}

#[test]
fn context_overrides_on_own_results() {
    let rejected: Result<(), DemoError> =
        Err(DemoError::Rejected { message: "status 422".into(), context: None });
    let err = rejected.context("submitting form").unwrap_err();
    assert_eq!(err.to_string(), "Rejected (submitting form): status 422");
}

#[test]
fn internal_variant_accepts_plain_strings() {
    let from_static: DemoError = "boom".into();
    let from_owned: DemoError = String::from("bang").into();
    assert_eq!(from_static.to_string(), "Internal error: boom");
    assert_eq!(from_owned.to_string(), "Internal error: bang");
}
