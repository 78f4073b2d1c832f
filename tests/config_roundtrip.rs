use std::path::PathBuf;

use cadenza::CompilerConfig;
use tempfile::TempDir;

#[test]
fn save_and_load_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("config.yaml");

    let config = CompilerConfig {
        languages: vec!["SUSL".into()],
        log_level: Some("debug".into()),
        output_dir: Some(PathBuf::from("/tmp/cadenza-out")),
    };
    config.save_to(&path).unwrap();
    assert!(path.exists());

    let loaded = CompilerConfig::load_from(&path).unwrap();
    assert_eq!(loaded, config);
}

#[test]
fn missing_file_gives_defaults() {
    let dir = TempDir::new().unwrap();
    let loaded = CompilerConfig::load_from(&dir.path().join("absent.yaml")).unwrap();
    assert_eq!(loaded, CompilerConfig::default());
}

#[test]
fn configured_languages_drive_dispatch() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.yaml");
    std::fs::write(&path, "languages:\n  - susl\n").unwrap();

    let config = CompilerConfig::load_from(&path).unwrap();
    let orchestrator = config.build_orchestrator();
    assert_eq!(orchestrator.languages().collect::<Vec<_>>(), vec!["SUSL"]);

    let result = orchestrator.compile("#!EMEL\nTrack(1) { tie() }");
    assert!(!result.is_success());
    assert!(result.language.is_none());

    assert!(orchestrator.compile("#!SUSL\nSequence { }").is_success());
}
