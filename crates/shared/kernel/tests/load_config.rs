#![cfg(not(target_arch = "wasm32"))]

use ln_kernel::config::{ConfigError, load_config};
use ln_kernel::domain::config::{DedupePolicy, EnhancerConfig, FormHistoryPolicy};
use serial_test::serial;
use std::io::Write;

fn write_toml(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().expect("tempfile");
    file.write_all(contents.as_bytes()).expect("write config");
    file
}

#[test]
#[serial]
fn loads_file_and_keeps_defaults() {
    let file = write_toml(
        r#"
        [ajax]
        form_history = "never"

        [toast]
        timeout_ms = 1500
        "#,
    );

    let cfg: EnhancerConfig = load_config(Some(file.path())).expect("config should load");
    assert_eq!(cfg.ajax.form_history, FormHistoryPolicy::Never);
    assert_eq!(cfg.ajax.dedupe, DedupePolicy::IgnoreWhileLoading);
    assert_eq!(cfg.toast.timeout_ms, 1500);
    assert_eq!(cfg.toast.max_items, 5);
}

#[test]
#[serial]
fn missing_file_is_an_error() {
    let err = load_config::<EnhancerConfig>(Some("/definitely/not/here/enhancers.toml"))
        .expect_err("missing file must fail");
    assert!(matches!(err, ConfigError::Config { .. }));
}
