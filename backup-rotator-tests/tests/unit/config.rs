//! Unit tests for configuration loading and validation
//!
//! These tests verify YAML/TOML parsing, `extends` inheritance and validation.

use backup_rotator::config::{load_config, ConfigError, ErrorPolicy, StoreKind};
use serial_test::serial;
use std::fs;
use test_utils::{
    minimal_config_toml, minimal_config_yaml, render_template, ConfigBuilder, ResultAssertions,
    TestContext,
};

fn write_minimal(ctx: &TestContext, name: &str, template: &str) -> std::path::PathBuf {
    let data = ctx.create_subdir("data");
    let backups = ctx.create_subdir("backups");
    ctx.create_file(name, &render_template(template, &data, &backups))
}

#[test]
fn test_config_loading_valid_yaml() {
    let ctx = TestContext::new();
    let path = write_minimal(&ctx, "config.yaml", minimal_config_yaml());

    let config = load_config(&path).assert_ok();
    assert_eq!(config.source.len(), 1);
    assert_eq!(config.source[0].onerror, ErrorPolicy::Fail);
    assert_eq!(config.destination[0].store, StoreKind::Filesystem);
    assert_eq!(config.log_level, "info");
}

#[test]
fn test_config_loading_valid_toml() {
    let ctx = TestContext::new();
    let path = write_minimal(&ctx, "config.toml", minimal_config_toml());

    let config = load_config(&path).assert_ok();
    assert_eq!(config.source[0].name, "data");
    assert_eq!(config.destination[0].name.as_deref(), Some("local"));
}

#[test]
fn test_builder_config_round_trips_through_yaml() {
    let (path, _temp_dir) = ConfigBuilder::minimal()
        .add_s3_destination("offsite", "backups")
        .with_log_level("debug")
        .write();

    let config = load_config(&path).assert_ok();
    assert_eq!(config.destination.len(), 2);
    assert_eq!(config.log_level, "debug");
}

#[test]
fn test_missing_file_is_read_error() {
    let ctx = TestContext::new();
    let result = load_config(ctx.temp_dir().join("absent.yaml"));
    assert!(matches!(result, Err(ConfigError::ReadError { .. })));
}

#[test]
fn test_invalid_yaml_rejected() {
    let ctx = TestContext::new();
    let path = ctx.create_file("config.yaml", "source: [unclosed");
    assert!(matches!(load_config(&path), Err(ConfigError::ParseError(_))));
}

#[test]
fn test_invalid_toml_rejected() {
    let ctx = TestContext::new();
    let path = ctx.create_file("config.toml", "invalid { toml content");
    assert!(matches!(load_config(&path), Err(ConfigError::TomlError(_))));
}

#[test]
fn test_unknown_error_policy_rejected() {
    let ctx = TestContext::new();
    let path = ctx.create_file(
        "config.yaml",
        "source:\n  - name: db\n    include: [/data]\n    onerror: explode\ndestination:\n  - store: filesystem\n",
    );
    load_config(&path).assert_err();
}

#[test]
fn test_exception_is_an_alias_for_fail() {
    let ctx = TestContext::new();
    let path = ctx.create_file(
        "config.yaml",
        "source:\n  - name: db\n    include: [/data]\n    onerror: exception\ndestination:\n  - store: filesystem\n",
    );
    let config = load_config(&path).assert_ok();
    assert_eq!(config.source[0].onerror, ErrorPolicy::Fail);
}

#[test]
fn test_duplicate_source_names_rejected() {
    let ctx = TestContext::new();
    let path = ctx.create_file(
        "config.yaml",
        "source:\n  - name: db\n    include: [/a]\n  - name: db\n    include: [/b]\ndestination:\n  - store: filesystem\n",
    );
    load_config(&path).assert_err_contains("Duplicate source name 'db'");
}

#[test]
fn test_no_destinations_rejected() {
    let ctx = TestContext::new();
    let path = ctx.create_file("config.yaml", "source:\n  - name: db\n    include: [/a]\n");
    load_config(&path).assert_err_contains("No destinations defined");
}

#[test]
fn test_extends_replaces_top_level_keys() {
    let ctx = TestContext::new();
    ctx.create_file(
        "base.yaml",
        "log_level: debug\nsource:\n  - name: base\n    include: [/base]\ndestination:\n  - store: filesystem\n    options:\n      path: /srv/backups\n",
    );
    let child = ctx.create_file(
        "nested/child.yaml",
        "extends: ../base.yaml\nsource:\n  - name: child\n    include: [/child]\n",
    );

    let config = load_config(&child).assert_ok();
    assert_eq!(config.log_level, "debug");
    assert_eq!(config.source.len(), 1);
    assert_eq!(config.source[0].name, "child");
    assert_eq!(config.destination.len(), 1);
}

#[test]
fn test_toml_document_can_extend_yaml() {
    let ctx = TestContext::new();
    ctx.create_file(
        "base.yaml",
        "source:\n  - name: base\n    include: [/base]\ndestination:\n  - store: filesystem\n",
    );
    let child = ctx.create_file("child.toml", "extends = \"base.yaml\"\nlog_level = \"warn\"\n");

    let config = load_config(&child).assert_ok();
    assert_eq!(config.log_level, "warn");
    assert_eq!(config.source[0].name, "base");
}

#[test]
fn test_extends_cycle_detected() {
    let ctx = TestContext::new();
    ctx.create_file("a.yaml", "extends: b.yaml\n");
    let b = ctx.create_file("b.yaml", "extends: a.yaml\n");

    let result = load_config(&b);
    assert!(matches!(result, Err(ConfigError::InheritanceCycle(_))));
}

#[test]
#[serial]
fn test_lock_path_expands_home() {
    let ctx = TestContext::new();
    let original_home = std::env::var_os("HOME");
    std::env::set_var("HOME", ctx.temp_dir());

    let path = ctx.create_file(
        "config.yaml",
        "lock_file: ~/run.lock\nsource:\n  - name: db\n    include: [/a]\ndestination:\n  - store: filesystem\n",
    );
    let config = load_config(&path).assert_ok();
    let lock_path = config.lock_path();

    match original_home {
        Some(home) => std::env::set_var("HOME", home),
        None => std::env::remove_var("HOME"),
    }

    assert_eq!(lock_path, ctx.temp_dir().join("run.lock"));
}

#[test]
fn test_config_files_are_not_modified() {
    let ctx = TestContext::new();
    let path = write_minimal(&ctx, "config.yaml", minimal_config_yaml());
    let before = fs::read_to_string(&path).unwrap();

    load_config(&path).assert_ok();
    assert_eq!(fs::read_to_string(&path).unwrap(), before);
}
