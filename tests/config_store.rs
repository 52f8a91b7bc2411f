//! Integration tests for layered configuration loading.

use service_glue::config::{ConfigError, ConfigStore, InfoDump, LoadMode, ReadOutcome};

mod common;

fn store_in(dir: &std::path::Path, name: &str) -> ConfigStore {
    let mut store = ConfigStore::new().with_load_mode(LoadMode::Lenient);
    store.set_config_name(name);
    store.add_search_paths([dir]);
    store
}

#[test]
fn test_port_precedence_example() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = store_in(dir.path(), "precedence");
    store.register("port", 8080, "server port");

    // No file, no flags
    let result = store.read_config();
    assert!(matches!(result, Err(ConfigError::NotFound { .. })));
    assert_eq!(store.get_int("port"), 8080);

    // File layer
    common::write_file(dir.path(), "precedence.yaml", "port: 9090\n");
    assert_eq!(store.read_config().unwrap(), ReadOutcome::Loaded);
    assert_eq!(store.get_int("port"), 9090);

    // Flag layer
    store.try_bind_flags_from(["prog", "--port=7070"]).unwrap();
    assert_eq!(store.get_int("port"), 7070);
}

#[test]
fn test_each_layer_wins_where_it_is_highest() {
    let dir = tempfile::tempdir().unwrap();
    common::write_file(
        dir.path(),
        "layers.toml",
        "port = 9090\nhost = \"file-host\"\n",
    );

    let mut store = store_in(dir.path(), "layers");
    store.register("port", 8080, "set in all three layers");
    store.register("host", "default-host", "set in default and file");
    store.register("name", "default-name", "set in default only");

    store.try_bind_flags_from(["prog", "--port", "7070"]).unwrap();
    store.read_config().unwrap();

    assert_eq!(store.get_int("port"), 7070);
    assert_eq!(store.get_string("host"), "file-host");
    assert_eq!(store.get_string("name"), "default-name");
}

#[test]
fn test_unset_flags_do_not_shadow_file() {
    let dir = tempfile::tempdir().unwrap();
    common::write_file(dir.path(), "shadow.json", r#"{"verbose": true, "workers": 16}"#);

    let mut store = store_in(dir.path(), "shadow");
    store.register("verbose", false, "verbose output");
    store.register("workers", 4, "worker count");

    store.try_bind_flags_from(["prog"]).unwrap();
    store.read_config().unwrap();

    assert!(store.get_bool("verbose"));
    assert_eq!(store.get_int("workers"), 16);
}

#[test]
fn test_config_file_flag_bypasses_search() {
    let dir = tempfile::tempdir().unwrap();
    let elsewhere = tempfile::tempdir().unwrap();
    let path = common::write_file(elsewhere.path(), "deep/custom.toml", "port = 6060\n");

    let mut store = store_in(dir.path(), "not-present");
    store.register("port", 8080, "server port");
    store
        .try_bind_flags_from(["prog", "--config-file", path.to_str().unwrap()])
        .unwrap();

    assert_eq!(store.read_config().unwrap(), ReadOutcome::Loaded);
    assert_eq!(store.get_int("port"), 6060);
    assert_eq!(store.config_file(), Some(path.as_path()));
}

#[test]
fn test_config_file_flag_ignored_when_not_bound() {
    let dir = tempfile::tempdir().unwrap();
    common::write_file(dir.path(), "searched.toml", "port = 1111\n");

    let mut store = store_in(dir.path(), "searched");
    store.register("port", 8080, "server port");

    store.read_config().unwrap();
    assert_eq!(store.get_int("port"), 1111);
}

#[test]
fn test_search_order() {
    let first = tempfile::tempdir().unwrap();
    let second = tempfile::tempdir().unwrap();
    common::write_file(first.path(), "order.json", r#"{"port": 1}"#);
    common::write_file(first.path(), "order.toml", "port = 2\n");
    common::write_file(second.path(), "order.toml", "port = 3\n");

    let mut store = ConfigStore::new().with_load_mode(LoadMode::Lenient);
    store.set_config_name("order");
    store.add_search_paths([first.path(), second.path()]);
    store.register("port", 0, "server port");
    store.read_config().unwrap();

    // First directory wins; within it, toml is tried before json.
    assert_eq!(store.get_int("port"), 2);
}

#[test]
fn test_not_found_lists_searched_locations() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = store_in(dir.path(), "absent");

    match store.read_config() {
        Err(ConfigError::NotFound { name, searched }) => {
            assert_eq!(name, "absent");
            assert!(searched.iter().any(|p| p.ends_with("absent.yaml")));
            assert!(searched.iter().any(|p| p.starts_with(dir.path())));
        }
        other => panic!("Expected NotFound, got {:?}", other),
    }
}

#[test]
fn test_parse_error_keeps_previous_values() {
    let dir = tempfile::tempdir().unwrap();
    common::write_file(dir.path(), "broken.toml", "port = = 1\n");

    let mut store = store_in(dir.path(), "broken");
    store.register("port", 8080, "server port");

    let result = store.read_config();
    assert!(matches!(result, Err(ConfigError::Parse { .. })));
    assert_eq!(store.get_int("port"), 8080);
}

#[test]
fn test_unsupported_explicit_format() {
    let dir = tempfile::tempdir().unwrap();
    let path = common::write_file(dir.path(), "settings.ini", "port=1\n");

    let mut store = store_in(dir.path(), "unused");
    store
        .try_bind_flags_from(["prog", "--config-file", path.to_str().unwrap()])
        .unwrap();

    assert!(matches!(
        store.read_config(),
        Err(ConfigError::UnsupportedFormat { .. })
    ));
}

#[test]
#[should_panic(expected = "failed to read configuration")]
fn test_strict_mode_panics_on_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = ConfigStore::new().with_load_mode(LoadMode::Strict);
    store.set_config_name("missing-strict");
    store.add_search_paths([dir.path()]);
    let _ = store.read_config();
}

#[test]
fn test_lenient_coercion_from_file() {
    let dir = tempfile::tempdir().unwrap();
    common::write_file(
        dir.path(),
        "coerce.yaml",
        "port: \"9091\"\nratio: \"0.5\"\nenabled: \"true\"\ncount: lots\n",
    );

    let mut store = store_in(dir.path(), "coerce");
    store.register("port", 8080, "server port");
    store.register("ratio", 1.0, "ratio");
    store.register("enabled", false, "flag");
    store.register("count", 3_i64, "count");
    store.read_config().unwrap();

    assert_eq!(store.get_int("port"), 9091);
    assert_eq!(store.get_float64("ratio"), 0.5);
    assert!(store.get_bool("enabled"));
    assert_eq!(store.get_int64("count"), 0);
}

#[test]
fn test_nested_keys() {
    let dir = tempfile::tempdir().unwrap();
    common::write_file(dir.path(), "nested.toml", "[server]\nport = 2000\n");

    let mut store = store_in(dir.path(), "nested");
    store.register("server.port", 1000, "server port");
    store.register("server.host", "localhost", "server host");

    store.read_config().unwrap();
    assert_eq!(store.get_int("server.port"), 2000);
    assert_eq!(store.get_string("server.host"), "localhost");

    store.try_bind_flags_from(["prog", "--server.port=3000"]).unwrap();
    assert_eq!(store.get_int("server.port"), 3000);
}

#[test]
fn test_file_keys_match_regardless_of_case() {
    let dir = tempfile::tempdir().unwrap();
    common::write_file(dir.path(), "mixed.yaml", "Port: 9090\nServer:\n  Host: file-host\n");

    let mut store = store_in(dir.path(), "mixed");
    store.register("port", 8080, "server port");
    store.register("server.host", "localhost", "server host");
    store.read_config().unwrap();

    assert_eq!(store.get_int("port"), 9090);
    assert_eq!(store.get_string("server.host"), "file-host");

    let mut out = Vec::new();
    store.write_debug_config(&mut out).unwrap();
    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("file    = 9090"));
}

#[test]
fn test_show_config_returns_when_configured() {
    let dir = tempfile::tempdir().unwrap();
    common::write_file(dir.path(), "dump.toml", "port = 9090\n");

    let mut store = store_in(dir.path(), "dump").with_info_dump(InfoDump::Return);
    store.register("port", 8080, "server port");
    store.try_bind_flags_from(["prog", "--show-config"]).unwrap();

    assert_eq!(store.read_config().unwrap(), ReadOutcome::Dumped);
}

#[test]
fn test_debug_dump_names_winning_layer() {
    let dir = tempfile::tempdir().unwrap();
    common::write_file(dir.path(), "trail.toml", "port = 9090\nhost = \"file-host\"\n");

    let mut store = store_in(dir.path(), "trail");
    store.register("port", 8080, "server port");
    store.register("host", "localhost", "server host");
    store.register("name", "svc", "service name");
    store.try_bind_flags_from(["prog", "--port=7070"]).unwrap();
    store.read_config().unwrap();

    let mut out = Vec::new();
    store.write_debug_config(&mut out).unwrap();
    let text = String::from_utf8(out).unwrap();

    let section = |key: &str| -> String {
        let start = text.find(&format!("  {}:\n", key)).unwrap();
        let rest = &text[start..];
        let end = rest.find("resolved from").unwrap();
        rest[..end + rest[end..].find('\n').unwrap()].to_string()
    };

    let port = section("port");
    assert!(port.contains("default = 8080"));
    assert!(port.contains("file    = 9090"));
    assert!(port.contains("flag    = 7070"));
    assert!(port.ends_with("resolved from flag"));

    assert!(section("host").ends_with("resolved from file"));
    assert!(section("name").ends_with("resolved from default"));

    let merged = &text[text.find("Merged configuration:").unwrap()..];
    assert!(merged.contains("\"port\": 7070"));
}

#[test]
fn test_stores_are_independent() {
    let mut a = ConfigStore::new();
    let mut b = ConfigStore::new();
    a.register("port", 1, "a");
    b.register("port", 2, "b");

    assert_eq!(a.get_int("port"), 1);
    assert_eq!(b.get_int("port"), 2);
    assert!(!a.is_registered("other"));
}
