//! Config file resolution and graceful degradation
//!
//! Note: Uses serial_test crate to prevent ENV variable race conditions.
//! Tests that manipulate CASTQ_CONFIG are marked with #[serial].

use castq_common::config::{resolve_config_path, PlayerConfig, CONFIG_ENV_VAR};
use castq_common::playlist::load_playlist;
use castq_common::Error;
use serial_test::serial;
use std::env;
use std::fs;
use std::time::Duration;
use tempfile::TempDir;

#[test]
#[serial]
fn test_cli_argument_wins_over_environment() {
    let dir = TempDir::new().unwrap();
    let cli_path = dir.path().join("cli.toml");
    let env_path = dir.path().join("env.toml");

    env::set_var(CONFIG_ENV_VAR, &env_path);
    let resolved = resolve_config_path(Some(&cli_path));
    env::remove_var(CONFIG_ENV_VAR);

    assert_eq!(resolved, Some(cli_path));
}

#[test]
#[serial]
fn test_environment_variable_is_used_without_cli_argument() {
    let dir = TempDir::new().unwrap();
    let env_path = dir.path().join("env.toml");

    env::set_var(CONFIG_ENV_VAR, &env_path);
    let resolved = resolve_config_path(None);
    env::remove_var(CONFIG_ENV_VAR);

    assert_eq!(resolved, Some(env_path));
}

#[test]
#[serial]
fn test_missing_file_falls_back_to_defaults() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("does-not-exist.toml");

    let config = PlayerConfig::load(Some(&missing)).unwrap();
    assert_eq!(config, PlayerConfig::default());
}

#[test]
#[serial]
fn test_load_reads_all_sections() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(
        &path,
        r#"
        [player]
        tick_interval_ms = 250
        speed_step_ms = 250
        event_capacity = 16

        [logging]
        level = "debug"
        "#,
    )
    .unwrap();

    let config = PlayerConfig::load(Some(&path)).unwrap();
    assert_eq!(config.player.tick_interval(), Duration::from_millis(250));
    assert_eq!(config.player.speed_step(), Duration::from_millis(250));
    assert_eq!(config.player.event_capacity(), 16);
    assert_eq!(config.logging.level, "debug");
}

#[test]
#[serial]
fn test_malformed_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "[player\n").unwrap();

    let err = PlayerConfig::load(Some(&path)).unwrap_err();
    assert!(matches!(err, Error::Config(_)), "got: {:?}", err);
}

#[test]
fn test_load_playlist_from_disk() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("playlist.toml");
    fs::write(
        &path,
        r#"
        [[episode]]
        uri = "uri1"
        duration_ms = 1000

        [[episode]]
        uri = "uri2"
        duration_ms = 2000
        "#,
    )
    .unwrap();

    let episodes = load_playlist(&path).unwrap();
    assert_eq!(episodes.len(), 2);
    assert_eq!(episodes[1].duration(), Some(Duration::from_secs(2)));
}

#[test]
fn test_load_missing_playlist_is_not_found() {
    let dir = TempDir::new().unwrap();
    let err = load_playlist(&dir.path().join("missing.toml")).unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}
