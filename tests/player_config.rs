use std::sync::Mutex;
use std::time::Duration;

use tempfile::NamedTempFile;

use pitch_detector::config::PlayerSettings;
use pitch_detector::Strategy;

static ENV_LOCK: Mutex<()> = Mutex::new(());

fn clear_env() {
    for key in [
        "PITCH_CONFIG",
        "PITCH_STRATEGY",
        "PITCH_TICK_DELAY_MS",
        "PITCH_IDLE_INTERVAL_MS",
        "PITCH_AUTOPLAY",
        "PITCH_TARGET_CLASS",
        "PITCH_SNAPSHOT_DIR",
        "PITCH_MODEL_WEIGHTS",
        "PITCH_MODEL_CONFIG",
        "PITCH_CLASS_NAMES",
    ] {
        std::env::remove_var(key);
    }
}

fn write_config(json: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("temp config");
    std::io::Write::write_all(&mut file, json.as_bytes()).expect("write config");
    file
}

#[test]
fn defaults_without_file_or_env() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let cfg = PlayerSettings::load().expect("load defaults");

    assert_eq!(cfg.strategy, Strategy::Motion);
    assert_eq!(cfg.playback.tick_delay, Duration::from_millis(1));
    assert_eq!(cfg.playback.idle_interval, Duration::from_millis(100));
    assert!(cfg.playback.autoplay);
    assert_eq!(cfg.model.target_class, "sports ball");
    assert_eq!(cfg.model.confidence_threshold, 0.5);
    assert_eq!(cfg.model.nms_threshold, 0.4);
    assert!(cfg.snapshot_dir.is_none());
}

#[test]
fn loads_config_from_file_and_env_overrides() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let file = write_config(
        r#"{
            "strategy": "model",
            "snapshot_dir": "/tmp/pitch_frames",
            "playback": {
                "tick_delay_ms": 33,
                "idle_interval_ms": 250,
                "autoplay": false
            },
            "model": {
                "weights": "/models/yolov3.onnx",
                "config": "/models/yolov3.toml",
                "class_names": "/models/coco.names",
                "target_class": "baseball",
                "confidence_threshold": 0.6
            }
        }"#,
    );

    std::env::set_var("PITCH_CONFIG", file.path());
    std::env::set_var("PITCH_TICK_DELAY_MS", "5");
    std::env::set_var("PITCH_AUTOPLAY", "yes");
    std::env::set_var("PITCH_TARGET_CLASS", "  sports ball ");

    let cfg = PlayerSettings::load().expect("load config");

    assert_eq!(cfg.strategy, Strategy::Model);
    assert_eq!(cfg.snapshot_dir.as_deref(), Some(std::path::Path::new("/tmp/pitch_frames")));
    assert_eq!(cfg.playback.tick_delay, Duration::from_millis(5));
    assert_eq!(cfg.playback.idle_interval, Duration::from_millis(250));
    assert!(cfg.playback.autoplay);
    assert_eq!(cfg.model.weights, std::path::PathBuf::from("/models/yolov3.onnx"));
    assert_eq!(cfg.model.class_names, std::path::PathBuf::from("/models/coco.names"));
    assert_eq!(cfg.model.target_class, "sports ball");
    assert_eq!(cfg.model.confidence_threshold, 0.6);
    assert_eq!(cfg.model.nms_threshold, 0.4);

    let assets = cfg.model.assets();
    assert_eq!(assets.config, std::path::PathBuf::from("/models/yolov3.toml"));
    assert_eq!(cfg.model.filter_config().target_class, "sports ball");

    clear_env();
}

#[test]
fn rejects_invalid_overrides() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    std::env::set_var("PITCH_STRATEGY", "radar");
    assert!(PlayerSettings::load().is_err());
    clear_env();

    std::env::set_var("PITCH_TICK_DELAY_MS", "fast");
    assert!(PlayerSettings::load().is_err());
    clear_env();

    std::env::set_var("PITCH_AUTOPLAY", "maybe");
    assert!(PlayerSettings::load().is_err());
    clear_env();

    std::env::set_var("PITCH_IDLE_INTERVAL_MS", "0");
    assert!(PlayerSettings::load().is_err());
    clear_env();
}

#[test]
fn rejects_malformed_file() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let file = write_config("{ not json");
    std::env::set_var("PITCH_CONFIG", file.path());
    assert!(PlayerSettings::load().is_err());

    let file = write_config(r#"{ "model": { "nms_threshold": 1.5 } }"#);
    std::env::set_var("PITCH_CONFIG", file.path());
    assert!(PlayerSettings::load().is_err());

    clear_env();
}
