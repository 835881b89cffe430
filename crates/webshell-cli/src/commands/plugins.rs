//! `webshell plugins ...`

use std::cell::RefCell;
use std::rc::Rc;

use anyhow::{Context, Result, bail};
use webshell_config::ConfigError;
use webshell_plugins::{DescriptorStore, PluginManager, WasmLoader, enabled_key};

use super::{Host, shutdown};
use crate::theme::Theme;

/// Print every discovered descriptor with its enabled flag.
pub(crate) fn list_plugins(host: &Host) -> Result<()> {
    let store = host.store();
    let scan = store.scan();

    for (path, error) in &scan.rejected {
        eprintln!(
            "{}",
            Theme::warning(&format!("{}: {error}", path.display()))
        );
    }

    if scan.descriptors.is_empty() {
        println!("{}", Theme::info("No plugins found"));
        print_dirs(&store);
        return Ok(());
    }

    println!("{}", Theme::header("Plugins"));
    println!("  {:<20} {:<8} {:<10} MODULE", "NAME", "ENABLED", "VERSION");
    println!("{}", Theme::separator());
    for descriptor in &scan.descriptors {
        let enabled = host.settings.get_bool(&enabled_key(&descriptor.name));
        println!(
            "  {:<20} {} {:<10} {}",
            descriptor.name,
            Theme::flag(enabled, 8),
            descriptor.version.as_deref().unwrap_or("-"),
            Theme::dimmed(&descriptor.module_path.display().to_string())
        );
        if let Some(description) = &descriptor.description {
            println!("  {:<20} {}", "", Theme::dimmed(description));
        }
    }
    println!(
        "\n{}",
        Theme::dimmed(&format!("{} plugin(s)", scan.descriptors.len()))
    );
    Ok(())
}

/// Set `plugins.<name>.enabled = true` and check that the plugin activates.
pub(crate) fn enable_plugin(host: &mut Host, name: &str) -> Result<()> {
    let store = host.store();
    ensure_known(&store, name)?;

    let manager = Rc::new(RefCell::new(PluginManager::new(store, WasmLoader::new())));
    PluginManager::watch_settings(&manager, &host.settings);

    let changed = host
        .settings
        .set(&enabled_key(name), true)
        .map_err(|e| enable_error(name, e))?;
    if !changed {
        println!("{}", Theme::info(&format!("Plugin '{name}' is already enabled")));
        return Ok(());
    }

    if manager.borrow().is_active(name) {
        println!("{}", Theme::success(&format!("Enabled plugin '{name}'")));
    } else {
        println!(
            "{}",
            Theme::warning(&format!(
                "Enabled plugin '{name}', but its module could not be loaded"
            ))
        );
    }
    shutdown(&manager);
    Ok(())
}

/// Only a subscriber failure means the flag was stored.
fn enable_error(name: &str, err: ConfigError) -> anyhow::Error {
    let context = match err {
        ConfigError::Notification(_) => {
            format!("plugin '{name}' was enabled but failed to activate")
        },
        _ => format!("failed to store the enabled flag of '{name}'"),
    };
    anyhow::Error::new(err).context(context)
}

/// Set `plugins.<name>.enabled = false`.
pub(crate) fn disable_plugin(host: &mut Host, name: &str) -> Result<()> {
    ensure_known(&host.store(), name)?;

    let changed = host
        .settings
        .set(&enabled_key(name), false)
        .with_context(|| format!("failed to store the enabled flag of '{name}'"))?;
    if changed {
        println!("{}", Theme::success(&format!("Disabled plugin '{name}'")));
    } else {
        println!("{}", Theme::info(&format!("Plugin '{name}' is already disabled")));
    }
    Ok(())
}

/// Load every plugin as the shell would at startup and report the outcome.
pub(crate) fn scan_plugins(host: &mut Host) -> Result<()> {
    let (manager, report) = host.boot()?;

    for (name, error) in &report.load_failures {
        println!("{}", Theme::error(&format!("{name}: {error}")));
    }
    for error in &report.activation_failures {
        println!("{}", Theme::error(&error.to_string()));
    }
    if report.rejected > 0 {
        println!(
            "{}",
            Theme::warning(&format!("{} invalid descriptor(s) skipped", report.rejected))
        );
    }

    let plugins = manager.borrow().plugins();
    if plugins.is_empty() {
        println!("{}", Theme::info("No plugins loaded"));
    } else {
        println!("{}", Theme::header("Loaded Plugins"));
        println!("  {:<20} {:<10} {:>9}", "NAME", "STATE", "RESOURCES");
        println!("{}", Theme::separator());
        for plugin in &plugins {
            println!(
                "  {:<20} {} {:>9}",
                plugin.name,
                Theme::state(plugin.state, 10),
                plugin.resources.len()
            );
        }
        println!(
            "\n{}",
            Theme::dimmed(&format!(
                "{} loaded, {} active",
                plugins.len(),
                report.activated.len()
            ))
        );
    }

    shutdown(&manager);
    Ok(())
}

fn ensure_known(store: &DescriptorStore, name: &str) -> Result<()> {
    if store.scan().find(name).is_none() {
        print_dirs(store);
        bail!("no valid plugin named '{name}'");
    }
    Ok(())
}

fn print_dirs(store: &DescriptorStore) {
    for dir in store.dirs() {
        eprintln!("{}", Theme::dimmed(&format!("  searched {}", dir.display())));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn host_with_plugin(root: &Path) -> Host {
        let dir = root.join("plugins");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join("demo.plugin"),
            "[plugin]\nName = \"demo\"\nModule = \"demo\"\n",
        )
        .unwrap();
        std::fs::write(dir.join("demo.wasm"), b"").unwrap();
        Host::open(Some(root.join("webshell.toml").as_path()), &[]).unwrap()
    }

    #[test]
    fn test_disable_persists_flag() {
        let root = tempfile::tempdir().unwrap();
        let mut host = host_with_plugin(root.path());

        disable_plugin(&mut host, "demo").unwrap();

        let reopened = Host::open(Some(root.path().join("webshell.toml").as_path()), &[]).unwrap();
        assert_eq!(reopened.settings.get_bool("plugins.demo.enabled"), Some(false));
    }

    #[test]
    fn test_unknown_plugin_is_rejected() {
        let root = tempfile::tempdir().unwrap();
        let mut host = host_with_plugin(root.path());

        assert!(disable_plugin(&mut host, "ghost").is_err());
        assert!(enable_plugin(&mut host, "ghost").is_err());
        assert_eq!(host.settings.get("plugins.ghost.enabled"), None);
    }

    #[test]
    fn test_enable_reports_unsaved_flag() {
        let root = tempfile::tempdir().unwrap();
        let plugins = root.path().join("plugins");
        std::fs::create_dir_all(&plugins).unwrap();
        std::fs::write(
            plugins.join("demo.plugin"),
            "[plugin]\nName = \"demo\"\nModule = \"demo\"\n",
        )
        .unwrap();
        std::fs::write(plugins.join("demo.wasm"), b"").unwrap();
        let cfg = root.path().join("cfg");
        let mut host = Host::open(Some(cfg.join("webshell.toml").as_path()), &[plugins]).unwrap();
        std::fs::write(&cfg, "not a directory").unwrap();

        let err = enable_plugin(&mut host, "demo").unwrap_err();

        let message = err.to_string();
        assert!(message.contains("failed to store the enabled flag of 'demo'"));
        assert!(!message.contains("failed to activate"));
        assert_eq!(host.settings.get("plugins.demo.enabled"), None);
    }

    #[test]
    fn test_enable_with_unloadable_module_keeps_flag() {
        let root = tempfile::tempdir().unwrap();
        let mut host = host_with_plugin(root.path());
        host.settings.set("plugins.demo.enabled", false).unwrap();

        enable_plugin(&mut host, "demo").unwrap();
        assert_eq!(host.settings.get_bool("plugins.demo.enabled"), Some(true));
    }
}
