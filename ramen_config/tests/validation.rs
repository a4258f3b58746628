use ramen_config::Config;
use rstest::rstest;
use std::io::Write;

fn load_str(toml_text: &str) -> eyre::Result<Config> {
    let mut f = tempfile::NamedTempFile::new().unwrap();
    f.write_all(toml_text.as_bytes()).unwrap();
    Config::load(f.path())
}

#[test]
fn partial_override_keeps_other_defaults() {
    let cfg = load_str(
        r#"
[engine]
publish_interval_ms = 200

[pins]
encoder_a = 18
encoder_b = 19
"#,
    )
    .unwrap();
    assert_eq!(cfg.engine.publish_interval_ms, 200);
    assert_eq!(cfg.engine.cup_release_ms, 500);
    assert_eq!(cfg.pins.encoder_a, 18);
    assert_eq!(cfg.pins.door_sensor1, 14);
}

#[rstest]
#[case("[engine]\ntick_ms = 0\n")]
#[case("[engine]\ndebounce_ms = 0\n")]
#[case("[engine]\npublish_interval_ms = 5\ntick_ms = 10\n")]
#[case("[engine]\nencoder_cpr = 0\n")]
#[case("[pins]\nencoder_a = 2\nencoder_b = 2\n")]
fn bad_tunables_rejected(#[case] toml_text: &str) {
    assert!(load_str(toml_text).is_err());
}

#[test]
fn missing_file_errors() {
    assert!(Config::load(std::path::Path::new("/nonexistent/machine.toml")).is_err());
}

#[test]
fn malformed_toml_errors() {
    assert!(load_str("pins = 3").is_err());
}
