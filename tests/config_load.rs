use std::io::Write;
use std::sync::Mutex;

use tempfile::NamedTempFile;

use pedscan::config::PipelineConfig;

static ENV_LOCK: Mutex<()> = Mutex::new(());

fn clear_env() {
    for key in [
        "PEDSCAN_CONFIG",
        "PEDSCAN_CONFIDENCE_THRESHOLD",
        "PEDSCAN_OVERLAP_THRESHOLD",
        "PEDSCAN_TARGET_WIDTH",
        "PEDSCAN_THROUGHPUT_WINDOW",
        "PEDSCAN_OUTPUT_DIR",
    ] {
        std::env::remove_var(key);
    }
}

#[test]
fn loads_config_from_file_and_env_overrides() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let mut file = NamedTempFile::new().expect("temp config");
    let toml = r#"
        [detection]
        backend = "hog"
        confidence_threshold = 0.6
        overlap_threshold = 0.3
        multi_pass = true

        [preprocess]
        target_width = 800

        [output]
        output_dir = "runs/night"
        sample_interval = 5

        [throughput]
        window = 60
    "#;
    file.write_all(toml.as_bytes()).expect("write config");

    std::env::set_var("PEDSCAN_CONFIG", file.path());
    std::env::set_var("PEDSCAN_CONFIDENCE_THRESHOLD", "0.75");
    std::env::set_var("PEDSCAN_TARGET_WIDTH", "1024");

    let cfg = PipelineConfig::load(None).expect("load config");

    // Env wins over file, file wins over defaults.
    assert_eq!(cfg.detection.confidence_threshold, 0.75);
    assert_eq!(cfg.detection.overlap_threshold, 0.3);
    assert!(cfg.detection.multi_pass);
    assert_eq!(cfg.target_width, 1024);
    assert_eq!(cfg.output.output_dir.to_str().unwrap(), "runs/night");
    assert_eq!(cfg.output.sample_interval, 5);
    assert_eq!(cfg.throughput_window, 60);
    // Untouched fields keep their defaults.
    assert_eq!(cfg.output.high_confidence_threshold, 0.85);

    clear_env();
}

#[test]
fn defaults_apply_without_file_or_env() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let cfg = PipelineConfig::load(None).expect("load config");
    assert_eq!(cfg.detection.confidence_threshold, 0.5);
    assert_eq!(cfg.detection.overlap_threshold, 0.4);
    assert_eq!(cfg.target_width, 640);
    assert_eq!(cfg.throughput_window, 30);
}

#[test]
fn out_of_range_file_threshold_is_rejected() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let mut file = NamedTempFile::new().expect("temp config");
    file.write_all(b"[detection]\nconfidence_threshold = 1.4\n")
        .expect("write config");

    let err = PipelineConfig::load(Some(file.path()));
    assert!(err.is_err());

    clear_env();
}

#[test]
fn malformed_env_value_is_an_error_not_a_silent_default() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    std::env::set_var("PEDSCAN_OVERLAP_THRESHOLD", "not-a-number");
    assert!(PipelineConfig::load(None).is_err());

    clear_env();
}

#[test]
fn invalid_toml_is_a_load_error() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let mut file = NamedTempFile::new().expect("temp config");
    file.write_all(b"this is not toml {{{{").expect("write config");

    assert!(PipelineConfig::load(Some(file.path())).is_err());

    clear_env();
}
