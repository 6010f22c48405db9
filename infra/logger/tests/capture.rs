use ln_logger::{LevelFilter, Logger};

#[test]
fn capture_creates_directory_and_flushes_on_drop() {
    let dir = tempfile::tempdir().expect("tempdir");
    let target = dir.path().join("capture");

    let logger = Logger::builder()
        .name("integration-capture")
        .console(false)
        .capture(&target, 2)
        .level(LevelFilter::DEBUG)
        .init()
        .expect("logger should initialize");

    assert!(logger.is_capturing());
    tracing::info!(path = "/docs", "Captured event");
    drop(logger);

    let files: Vec<_> = std::fs::read_dir(&target).expect("capture dir").collect();
    assert!(!files.is_empty(), "expected at least one capture file");
}
