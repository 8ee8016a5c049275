use std::sync::Mutex;
use std::time::Duration;

use tempfile::NamedTempFile;

use chainwatch::config::ChainwatchConfig;

static ENV_LOCK: Mutex<()> = Mutex::new(());

fn clear_env() {
    for key in [
        "CHAINWATCH_CONFIG",
        "CHAINWATCH_TICK_MS",
        "CHAINWATCH_SAVE_DIR",
        "CHAINWATCH_CAMERAS",
        "CHAINWATCH_CONF_THRESHOLD",
        "CHAINWATCH_GPIO",
        "CHAINWATCH_VIDEO",
    ] {
        std::env::remove_var(key);
    }
}

#[test]
fn defaults_without_file_or_env() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let cfg = ChainwatchConfig::load().expect("load config");

    assert_eq!(cfg.tick, Duration::from_millis(30));
    assert_eq!(cfg.save_dir.to_string_lossy(), "defects");
    assert_eq!(cfg.cameras, [0, 1, 2, 3]);
    assert_eq!(cfg.capture.width, 1280);
    assert_eq!(cfg.capture.height, 1024);
    assert!(cfg.model_path.is_none());
    assert!((cfg.conf_threshold - 0.25).abs() < f32::EPSILON);
    assert!(cfg.gpio_pin.is_none());
    assert!(cfg.video.is_none());

    clear_env();
}

#[test]
fn loads_config_from_file_and_env_overrides() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let mut file = NamedTempFile::new().expect("temp config");
    let json = r#"{
        "tick_ms": 50,
        "save_dir": "/var/lib/chainwatch/defects",
        "cameras": [2, 3, 4, 5],
        "capture": {
            "width": 800,
            "height": 600
        },
        "detector": {
            "model_path": "models/chain.onnx",
            "conf_threshold": 0.4
        },
        "signal": {
            "gpio_pin": 17
        }
    }"#;
    std::io::Write::write_all(&mut file, json.as_bytes()).expect("write config");

    std::env::set_var("CHAINWATCH_CONFIG", file.path());
    std::env::set_var("CHAINWATCH_TICK_MS", "100");
    std::env::set_var("CHAINWATCH_CAMERAS", "0, 1, 2, 3");
    std::env::set_var("CHAINWATCH_VIDEO", "demo/chain.mp4");

    let cfg = ChainwatchConfig::load().expect("load config");

    // Env wins over the file; untouched keys keep the file's values.
    assert_eq!(cfg.tick, Duration::from_millis(100));
    assert_eq!(cfg.save_dir.to_string_lossy(), "/var/lib/chainwatch/defects");
    assert_eq!(cfg.cameras, [0, 1, 2, 3]);
    assert_eq!(cfg.capture.width, 800);
    assert_eq!(cfg.capture.height, 600);
    assert_eq!(cfg.model_path.unwrap().to_string_lossy(), "models/chain.onnx");
    assert!((cfg.conf_threshold - 0.4).abs() < f32::EPSILON);
    assert_eq!(cfg.gpio_pin, Some(17));
    assert_eq!(cfg.video.unwrap().to_string_lossy(), "demo/chain.mp4");

    clear_env();
}

#[test]
fn rejects_wrong_camera_count() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    std::env::set_var("CHAINWATCH_CAMERAS", "0,1,2");
    let err = ChainwatchConfig::load().expect_err("three cameras must fail");
    assert!(err.to_string().contains("camera indices"));

    clear_env();
}

#[test]
fn rejects_out_of_range_threshold() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    std::env::set_var("CHAINWATCH_CONF_THRESHOLD", "1.5");
    assert!(ChainwatchConfig::load().is_err());

    std::env::set_var("CHAINWATCH_CONF_THRESHOLD", "0");
    assert!(ChainwatchConfig::load().is_err());

    clear_env();
}

#[test]
fn rejects_zero_tick() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    std::env::set_var("CHAINWATCH_TICK_MS", "0");
    assert!(ChainwatchConfig::load().is_err());

    clear_env();
}
