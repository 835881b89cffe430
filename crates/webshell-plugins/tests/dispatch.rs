//! Page events and resource injection.

mod common;

use std::path::Path;

use common::{
    Behaviour, Log, RecordingChannel, RecordingPage, entries, new_log, recording_loader,
    write_plugin,
};
use webshell_config::Settings;
use webshell_plugins::{DescriptorStore, HookKind, PluginError, PluginManager};

fn loaded_manager(
    dir: &Path,
    ext: &str,
    log: &Log,
    overrides: &[(&str, Behaviour)],
) -> PluginManager {
    let store = DescriptorStore::new([dir], ext);
    let mut manager = PluginManager::new(store, recording_loader(log, overrides));
    manager.scan_and_load(&mut Settings::in_memory());
    log.borrow_mut().clear();
    manager
}

#[test]
fn test_plugin_injects_stylesheet_on_bridge_initialize() {
    let root = tempfile::tempdir().unwrap();
    let dir = root.path().join("test");
    write_plugin(&dir, "test", "py", &["style.css"]);
    std::fs::write(dir.join("style.css"), "body { color: red; }").unwrap();
    let log = new_log();
    let mut settings = Settings::in_memory();
    let store = DescriptorStore::new([root.path()], "py");
    let mut manager = PluginManager::new(store, recording_loader(&log, &[]));

    manager.scan_and_load(&mut settings);
    assert!(manager.is_active("test"));
    assert_eq!(settings.get_bool("plugins.test.enabled"), Some(true));

    let mut page = RecordingPage::default();
    assert_eq!(manager.bridge_initialize(&mut page), 1);
    assert_eq!(
        page.stylesheets,
        vec![("test_style.css".to_string(), dir.join("style.css"))]
    );
    assert!(page.scripts.is_empty());
}

#[test]
fn before_load_runs_hooks_then_injects() {
    let root = tempfile::tempdir().unwrap();
    write_plugin(root.path(), "test", "py", &["style.css"]);
    let log = new_log();
    let mut manager = loaded_manager(root.path(), "py", &log, &[]);

    let mut channel = RecordingChannel::default();
    let mut page = RecordingPage::default();
    manager.before_load(&mut channel, &mut page).unwrap();

    assert_eq!(page.stylesheets.len(), 1);
    assert_eq!(page.stylesheets[0].0, "test_style.css");
    assert_eq!(channel.objects.len(), 1);
    assert_eq!(channel.objects[0].0, "test");
    assert_eq!(entries(&log), vec!["test:before_load"]);
}

#[test]
fn resources_are_split_by_kind_in_declaration_order() {
    let root = tempfile::tempdir().unwrap();
    write_plugin(
        root.path(),
        "ui",
        "wasm",
        &["b.js", "theme.css", "a.js", "icon.png"],
    );
    let log = new_log();
    let manager = loaded_manager(root.path(), "wasm", &log, &[]);

    let mut page = RecordingPage::default();
    let injected = manager.bridge_initialize(&mut page);

    assert_eq!(injected, 3);
    let scripts: Vec<_> = page.scripts.iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(scripts, vec!["ui_b.js", "ui_a.js"]);
    assert_eq!(page.stylesheets[0].0, "ui_theme.css");
    assert!(entries(&log).is_empty());
}

#[test]
fn inactive_plugins_receive_nothing() {
    let root = tempfile::tempdir().unwrap();
    write_plugin(root.path(), "a", "wasm", &["a.js"]);
    write_plugin(root.path(), "b", "wasm", &["b.js"]);
    let log = new_log();
    let mut manager = loaded_manager(root.path(), "wasm", &log, &[]);
    manager.disable("a").unwrap();
    log.borrow_mut().clear();

    let mut page = RecordingPage::default();
    manager.load_started(&mut page).unwrap();
    manager.bridge_initialize(&mut page);

    assert_eq!(entries(&log), vec!["b:load_started"]);
    assert_eq!(page.scripts.len(), 1);
    assert_eq!(page.scripts[0].0, "b_b.js");
}

#[test]
fn hooks_run_in_activation_order() {
    let root = tempfile::tempdir().unwrap();
    for name in ["a", "b", "c"] {
        write_plugin(root.path(), name, "wasm", &[]);
    }
    let log = new_log();
    let mut manager = loaded_manager(root.path(), "wasm", &log, &[]);
    manager.disable("a").unwrap();
    manager.enable("a").unwrap();
    log.borrow_mut().clear();

    let mut page = RecordingPage::default();
    manager.load_finished(&mut page).unwrap();

    assert_eq!(
        entries(&log),
        vec!["b:load_finished", "c:load_finished", "a:load_finished"]
    );
}

#[test]
fn load_started_and_load_finished_are_distinct() {
    let root = tempfile::tempdir().unwrap();
    write_plugin(root.path(), "a", "wasm", &[]);
    let log = new_log();
    let mut manager = loaded_manager(root.path(), "wasm", &log, &[]);
    let mut page = RecordingPage::default();

    manager.load_started(&mut page).unwrap();
    assert_eq!(entries(&log), vec!["a:load_started"]);

    manager.load_finished(&mut page).unwrap();
    assert_eq!(entries(&log), vec!["a:load_started", "a:load_finished"]);
}

#[test]
fn first_failing_hook_stops_delivery() {
    let root = tempfile::tempdir().unwrap();
    for name in ["a", "b", "c"] {
        write_plugin(root.path(), name, "wasm", &["page.js"]);
    }
    let log = new_log();
    let mut manager = loaded_manager(
        root.path(),
        "wasm",
        &log,
        &[("b", Behaviour::Fail(HookKind::BeforeLoad))],
    );

    let mut channel = RecordingChannel::default();
    let mut page = RecordingPage::default();
    let err = manager.before_load(&mut channel, &mut page).unwrap_err();

    assert!(matches!(
        err,
        PluginError::Hook { ref plugin, hook: HookKind::BeforeLoad, .. } if plugin == "b"
    ));
    assert_eq!(entries(&log), vec!["a:before_load", "b:before_load"]);
    assert!(page.scripts.is_empty());
    assert!(manager.is_active("c"));
}

#[test]
fn hookless_plugin_only_contributes_resources() {
    let root = tempfile::tempdir().unwrap();
    write_plugin(root.path(), "plain", "wasm", &["plain.css"]);
    let log = new_log();
    let mut manager = loaded_manager(root.path(), "wasm", &log, &[("plain", Behaviour::Bare)]);

    let mut channel = RecordingChannel::default();
    let mut page = RecordingPage::default();
    manager.before_load(&mut channel, &mut page).unwrap();
    manager.load_started(&mut page).unwrap();
    manager.load_finished(&mut page).unwrap();

    assert!(channel.objects.is_empty());
    assert!(entries(&log).is_empty());
    assert_eq!(page.stylesheets[0].0, "plain_plain.css");
}
