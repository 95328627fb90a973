use std::io::Write;

use groovy_config::{ConfigError, GroovyConfig};

#[test]
fn loads_config_from_disk() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[parser]\nlenient_mode = false\ntab_size = 8").unwrap();

    let config = GroovyConfig::load_from_path(file.path()).unwrap();
    assert!(!config.parser.lenient_mode);
    assert_eq!(config.parser.tab_size, 8);
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = GroovyConfig::load_from_path(dir.path().join("missing.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }));
}

#[test]
fn unknown_keys_are_rejected() {
    let err = GroovyConfig::load_from_str("[parser]\nbogus = 1\n").unwrap_err();
    assert!(matches!(err, ConfigError::Toml(_)));
}
