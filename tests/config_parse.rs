use chunk_dispatch::{Error, config::Config};

#[test]
fn parse_example_config() {
    let raw = include_str!("../chunk-dispatch.example.toml");
    let cfg: Config = toml::from_str(raw).expect("parse TOML");
    assert_eq!(cfg.dispatch.max_chunk_size, 100);
    assert_eq!(cfg.analysis.feature_types, vec!["TABLES", "FORMS"]);
    assert!(!cfg.dispatch.queue_target.is_empty());
    cfg.validate().unwrap();
}

#[test]
fn missing_sections_fall_back_to_defaults() {
    let cfg: Config = toml::from_str("").expect("parse TOML");
    assert_eq!(cfg.dispatch.max_chunk_size, 100);
    assert_eq!(cfg.logging.level, "info");
    cfg.validate().unwrap();
}

#[test]
fn zero_chunk_size_fails_validation() {
    let mut cfg = Config::default();
    cfg.dispatch.max_chunk_size = 0;
    assert!(matches!(cfg.validate(), Err(Error::InvalidArgument(_))));
}

#[test]
fn empty_notification_topic_fails_validation() {
    let mut cfg = Config::default();
    cfg.dispatch.notification_target.topic = " ".into();
    assert!(matches!(cfg.validate(), Err(Error::InvalidArgument(_))));
}
