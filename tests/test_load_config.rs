use serial_test::serial;
use std::env;
use std::fs::{create_dir_all, write};
use std::path::{Path, PathBuf};
use tempfile::{tempdir, NamedTempFile};

use grid_sweep::load_config::{load_config, API_KEY_ENV, DEFAULT_TIMEOUT_SECS};

fn scaffold(root: &Path) -> (PathBuf, PathBuf) {
    let model = root.join("dreamshaper_8.safetensors");
    write(&model, b"weights").unwrap();
    let training = root.join("training");
    create_dir_all(training.join("train")).unwrap();
    write(training.join("train").join("a-1.txt"), "cat").unwrap();
    (model, training)
}

fn config_file(body: &str) -> NamedTempFile {
    let file = NamedTempFile::new().expect("temp file");
    write(file.path(), body).unwrap();
    file
}

/// A complete config loads, applies defaults and derives the model name from the path.
#[test]
#[serial]
fn test_load_config_success_with_defaults() {
    env::remove_var(API_KEY_ENV);
    let tmp = tempdir().unwrap();
    let (model, training) = scaffold(tmp.path());
    let file = config_file(&format!(
        r#"
url: "http://127.0.0.1:7860"
model_path: "{}"
training_set_dir: "{}"
resolution: 768
seeds: [42, 7]
clip_skips: [2, 1]
"#,
        model.display(),
        training.display()
    ));

    let config = load_config(file.path()).expect("Config should load");

    assert_eq!(config.url, "http://127.0.0.1:7860");
    assert_eq!(config.resolution, 768);
    assert_eq!(config.seeds, vec![42, 7]);
    assert_eq!(config.clip_skips, vec![2, 1]);
    assert_eq!(config.output_dir, PathBuf::from("Results"));
    assert_eq!(config.timeout_secs, DEFAULT_TIMEOUT_SECS);
    assert!(!config.fail_fast);
    assert!(config.api_key.is_none());

    let sweep = config.sweep_config().unwrap();
    assert_eq!(sweep.model, "dreamshaper_8.safetensors");
    assert_eq!(sweep.clip_skips, vec![2, 1]);
}

/// The bearer token comes from the environment, never from the file.
#[test]
#[serial]
fn test_load_config_injects_api_key_from_env() {
    let tmp = tempdir().unwrap();
    let (model, training) = scaffold(tmp.path());
    let file = config_file(&format!(
        "url: http://host:7860\nmodel_path: {}\ntraining_set_dir: {}\nresolution: 512\nseeds: [1]\nclip_skips: [0]\nfail_fast: true\n",
        model.display(),
        training.display()
    ));

    env::set_var(API_KEY_ENV, "  top-secret-test-key ");
    let config = load_config(file.path());
    env::remove_var(API_KEY_ENV);

    let config = config.expect("Config should load");
    assert_eq!(config.api_key.as_deref(), Some("top-secret-test-key"));
    assert!(config.fail_fast);
}

#[test]
#[serial]
fn test_load_config_rejects_out_of_range_clip_skip() {
    let tmp = tempdir().unwrap();
    let (model, training) = scaffold(tmp.path());
    let file = config_file(&format!(
        "url: http://host\nmodel_path: {}\ntraining_set_dir: {}\nresolution: 512\nseeds: [1]\nclip_skips: [1, 13]\n",
        model.display(),
        training.display()
    ));

    let msg = load_config(file.path()).unwrap_err().to_string();
    assert!(msg.contains("clip_skips"), "got: {msg}");
}

#[test]
#[serial]
fn test_load_config_rejects_zero_resolution_and_empty_seeds() {
    let tmp = tempdir().unwrap();
    let (model, training) = scaffold(tmp.path());

    let zero_res = config_file(&format!(
        "url: http://host\nmodel_path: {}\ntraining_set_dir: {}\nresolution: 0\nseeds: [1]\nclip_skips: [1]\n",
        model.display(),
        training.display()
    ));
    let msg = load_config(zero_res.path()).unwrap_err().to_string();
    assert!(msg.contains("resolution"), "got: {msg}");

    let no_seeds = config_file(&format!(
        "url: http://host\nmodel_path: {}\ntraining_set_dir: {}\nresolution: 512\nseeds: []\nclip_skips: [1]\n",
        model.display(),
        training.display()
    ));
    let msg = load_config(no_seeds.path()).unwrap_err().to_string();
    assert!(msg.contains("seeds"), "got: {msg}");
}

#[test]
#[serial]
fn test_load_config_rejects_missing_model_and_training_dir() {
    let tmp = tempdir().unwrap();
    let (model, training) = scaffold(tmp.path());

    let missing_model = config_file(&format!(
        "url: http://host\nmodel_path: {}\ntraining_set_dir: {}\nresolution: 512\nseeds: [1]\nclip_skips: [1]\n",
        tmp.path().join("nope.ckpt").display(),
        training.display()
    ));
    let msg = load_config(missing_model.path()).unwrap_err().to_string();
    assert!(msg.contains("model_path"), "got: {msg}");

    let missing_training = config_file(&format!(
        "url: http://host\nmodel_path: {}\ntraining_set_dir: {}\nresolution: 512\nseeds: [1]\nclip_skips: [1]\n",
        model.display(),
        tmp.path().join("missing").display()
    ));
    let msg = load_config(missing_training.path()).unwrap_err().to_string();
    assert!(msg.contains("training_set_dir"), "got: {msg}");
}

/// Invalid YAML is reported as a parse failure.
#[test]
#[serial]
fn test_load_config_errors_for_invalid_file() {
    let file = config_file("not-yaml: [:::");
    let msg = load_config(file.path()).unwrap_err().to_string();
    assert!(msg.contains("parse") || msg.contains("YAML"), "Parse error expected, got: {msg}");
}
