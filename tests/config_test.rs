use sensorscope::config::{StoreSection, ENV_BUCKET, ENV_ORG, ENV_TIMEOUT, ENV_TOKEN, ENV_URL};
use sensorscope::{
    AppConfig, DashboardConfig, Error, InfluxStore, ResampleInterval, SensorKind, StoreConfig,
};
use std::fs;

const FILE: &str = r#"
[store]
url = "https://influx.example.com:8086"
token = "file-token"
org = "EXTREME MFG"
bucket = "studio"

[dashboard]
sensor = "MPU6050"
lookback_days = 7
interval = "30 s"
ma_window = 12
z_threshold = 3.5
horizon_minutes = 45
auto_refresh = true
refresh_secs = 120
display_timezone = "Europe/Madrid"
selected_variables = ["accel_mag", "gyro_z"]
"#;

#[test]
fn test_load_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, FILE).unwrap();

    let config = AppConfig::load(Some(path.as_path())).unwrap();
    let dashboard = &config.dashboard;
    assert_eq!(dashboard.sensor, SensorKind::Mpu6050);
    assert_eq!(dashboard.lookback_days, 7);
    assert_eq!(dashboard.interval, ResampleInterval::ThirtySeconds);
    assert_eq!(dashboard.ma_window, 12);
    assert_eq!(dashboard.z_threshold, 3.5);
    assert_eq!(dashboard.horizon_minutes, 45);
    assert!(dashboard.auto_refresh);
    assert_eq!(dashboard.refresh_secs, 120);
    assert_eq!(dashboard.cache_ttl_secs, 60);
    assert_eq!(dashboard.display_timezone, "Europe/Madrid");
    assert!(dashboard.validate().is_ok());
}

#[test]
fn test_missing_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = AppConfig::load(Some(dir.path().join("absent.toml").as_path()));
    assert!(matches!(result, Err(Error::Config(_))));
}

#[test]
fn test_empty_file_gives_defaults() {
    let config = AppConfig::from_toml_str("").unwrap();
    assert_eq!(config.dashboard, DashboardConfig::default());
    assert_eq!(config.store, StoreSection::default());
}

#[test]
fn test_store_settings_from_file_and_environment() {
    let config = AppConfig::from_toml_str(FILE).unwrap();

    let from_file = StoreConfig::resolve(&config.store, |_| None).unwrap();
    assert_eq!(from_file.org, "EXTREME MFG");
    assert_eq!(from_file.timeout_secs, 30);

    let overridden = StoreConfig::resolve(&config.store, |key| match key {
        k if k == ENV_BUCKET => Some("night-shift".to_string()),
        k if k == ENV_TIMEOUT => Some("5".to_string()),
        k if k == ENV_URL || k == ENV_TOKEN || k == ENV_ORG => Some(String::new()),
        _ => None,
    })
    .unwrap();
    assert_eq!(overridden.bucket, "night-shift");
    assert_eq!(overridden.timeout_secs, 5);
    assert_eq!(overridden.url, "https://influx.example.com:8086");

    let store = InfluxStore::new(overridden).unwrap();
    assert_eq!(
        store.query_url().as_str(),
        "https://influx.example.com:8086/api/v2/query?org=EXTREME+MFG"
    );
    assert!(!format!("{:?}", store).contains("file-token"));
}

#[test]
fn test_out_of_range_option_names_itself() {
    let config = AppConfig::from_toml_str("[dashboard]\nhorizon_minutes = 125\n").unwrap();
    match config.dashboard.validate() {
        Err(Error::Config(msg)) => assert!(msg.contains("horizon_minutes")),
        other => panic!("unexpected result {:?}", other),
    }
}
