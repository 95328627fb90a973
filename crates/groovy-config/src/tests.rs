use pretty_assertions::assert_eq;

use crate::{init_tracing, GroovyConfig, LanguageLevel, LoggingConfig, ParserConfig};

#[test]
fn defaults_are_lenient_with_comments() {
    let config = ParserConfig::default();
    assert!(config.lenient_mode);
    assert!(config.attribute_comments);
    assert!(!config.collect_warnings);
    assert_eq!(config.language_level, LanguageLevel::Groovy3);
    assert_eq!(config.tab_size, 4);
    assert!(!ParserConfig::strict().lenient_mode);
}

#[test]
fn level_directives_are_normalized() {
    assert_eq!(LoggingConfig::normalize_level_directives(" WARNING "), "warn");
    assert_eq!(LoggingConfig::normalize_level_directives(""), "info");
    assert_eq!(
        LoggingConfig::normalize_level_directives("groovy.parse=trace"),
        "groovy.parse=trace"
    );
}

#[test]
fn partial_toml_keeps_defaults() {
    let config = GroovyConfig::load_from_str(
        r#"
[parser]
language_level = "2.5"
collect_warnings = true

[logging]
level = "debug"
"#,
    )
    .unwrap();

    assert_eq!(config.parser.language_level, LanguageLevel::Groovy2_5);
    assert!(config.parser.collect_warnings);
    assert_eq!(config.parser.tolerance, 10);
    assert_eq!(config.logging.level, "debug");
    assert!(!config.logging.json);
}

#[test]
fn parrot_syntax_is_gated_on_language_level() {
    assert!(!LanguageLevel::Groovy2_5.supports_parrot_syntax());
    assert!(LanguageLevel::Groovy3.supports_parrot_syntax());
    assert!(LanguageLevel::Groovy4.supports_parrot_syntax());
}

#[test]
fn init_tracing_installs_once() {
    let config = LoggingConfig::default();
    init_tracing(&config);
    init_tracing(&LoggingConfig {
        json: true,
        ..config
    });
    tracing::debug!(target: "groovy.config", "still logging after a second init");
}
