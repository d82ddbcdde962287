use hotwire::config::{
    config_from_json, config_from_yaml, config_to_json, config_to_yaml, load_config_from_path,
    save_config_to_path,
};
use hotwire::{ConfigError, FitWindow, HotWireConfig};

fn customized() -> HotWireConfig {
    let mut cfg = HotWireConfig::default();
    cfg.physical.current = 0.75;
    cfg.physical.wire_length = 0.12;
    cfg.fit_window = FitWindow::new(0.5, 8.0);
    cfg.acquisition.port = "/dev/ttyUSB1".into();
    cfg.acquisition.baud_rate = 9600;
    cfg.simulation.seed = Some(11);
    cfg
}

#[test]
fn defaults_match_the_bench_setup() {
    let cfg = HotWireConfig::default();
    assert_eq!(cfg.physical.current, 0.5);
    assert_eq!(cfg.physical.wire_resistance, 10.0);
    assert_eq!(cfg.physical.wire_length, 0.1);
    assert_eq!(cfg.fit_window, FitWindow::new(0.2, 4.0));
    assert_eq!(cfg.acquisition.baud_rate, 115_200);
    assert_eq!(cfg.acquisition.redraw_every, 10);
    assert_eq!(cfg.acquisition.stop_timeout_ms, 2_000);
}

#[test]
fn json_and_yaml_text_round_trip() {
    let cfg = customized();
    assert_eq!(config_from_json(&config_to_json(&cfg).unwrap()).unwrap(), cfg);
    assert_eq!(config_from_yaml(&config_to_yaml(&cfg).unwrap()).unwrap(), cfg);
}

#[test]
fn partial_file_keeps_other_defaults() {
    let cfg = config_from_json(r#"{ "physical": { "current": 1.0 }, "fit_window": { "end": 6.0 } }"#)
        .unwrap();
    assert_eq!(cfg.physical.current, 1.0);
    assert_eq!(cfg.physical.wire_resistance, 10.0);
    assert_eq!(cfg.fit_window, FitWindow::new(0.2, 6.0));
    assert_eq!(cfg.acquisition, Default::default());
}

#[test]
fn path_helpers_pick_format_from_extension() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = customized();
    for name in ["settings.json", "settings.yaml", "settings.YML"] {
        let path = dir.path().join(name);
        save_config_to_path(&cfg, &path).unwrap();
        assert_eq!(load_config_from_path(&path).unwrap(), cfg, "{name}");
    }
    let yaml = std::fs::read_to_string(dir.path().join("settings.yaml")).unwrap();
    assert!(yaml.contains("wire_length"));
    assert!(!yaml.trim_start().starts_with('{'));
}

#[test]
fn unknown_extension_and_missing_file_are_errors() {
    let dir = tempfile::tempdir().unwrap();
    let err = save_config_to_path(&HotWireConfig::default(), &dir.path().join("settings.toml"))
        .unwrap_err();
    assert!(matches!(err, ConfigError::UnsupportedFormat(_)));

    let err = load_config_from_path(&dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }));

    let err = config_from_json("{ not json").unwrap_err();
    assert!(matches!(err, ConfigError::Json(_)));
}
