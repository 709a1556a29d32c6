use commandline_relay::{RelayConfig, RelayError};
use std::fs;

#[test]
fn empty_document_gives_defaults() {
    let config = RelayConfig::from_toml_str("").unwrap();

    assert_eq!(config, RelayConfig::default());
    assert_eq!(config.native.browser, "firefox");
    assert_eq!(config.native.min_version, "0.1.0");
    assert_eq!(config.selection.sync_primary_command, "xsel -p -o | xsel -b -i");
    assert_eq!(config.selection.mirror_primary_command, "xsel -b -o | xsel -p -i");
    assert_eq!(config.history.max_results, 50);
    assert_eq!(config.history.start_time, 0);
}

#[test]
fn partial_sections_keep_other_defaults() {
    let config = RelayConfig::from_toml_str(
        r#"
        [native]
        host_name = "com.example.relay"

        [selection]
        sync_primary_command = "wl-paste -p | wl-copy"
        "#,
    )
    .unwrap();

    assert_eq!(config.native.host_name, "com.example.relay");
    assert_eq!(config.native.browser, "firefox");
    assert_eq!(config.selection.sync_primary_command, "wl-paste -p | wl-copy");
    assert_eq!(config.selection.mirror_primary_command, "xsel -b -o | xsel -p -i");
}

#[test]
fn load_reads_file() {
    let td = tempfile::tempdir().unwrap();
    let path = td.path().join("relay.toml");
    fs::write(&path, "[history]\nmax_results = 10\nstart_time = 1700000000000\n").unwrap();

    let config = RelayConfig::load(&path).unwrap();

    assert_eq!(config.history.max_results, 10);
    assert_eq!(config.history.start_time, 1_700_000_000_000);
}

#[test]
fn bad_documents_are_config_errors() {
    let err = RelayConfig::from_toml_str("[history]\nmax_results = \"lots\"\n").unwrap_err();
    assert!(matches!(err, RelayError::Config(_)), "{err}");

    let err = RelayConfig::load("/definitely/not/here/relay.toml").unwrap_err();
    assert!(matches!(err, RelayError::Io(_)), "{err}");
}
