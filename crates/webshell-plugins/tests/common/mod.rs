//! Shared fixtures for plugin manager integration tests.

#![allow(dead_code, unreachable_pub)]

use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use webshell_plugins::{
    Channel, HookError, HookKind, HookResult, InjectionPoint, OnActivate, OnBeforeLoad,
    OnDeactivate, OnLoadFinished, OnLoadStarted, Page, Plugin, PluginDescriptor, PluginError,
    PluginResult,
};

/// Ordered record of everything plugins and subscribers observed.
pub type Log = Rc<RefCell<Vec<String>>>;

pub fn new_log() -> Log {
    Rc::new(RefCell::new(Vec::new()))
}

pub fn entries(log: &Log) -> Vec<String> {
    log.borrow().clone()
}

pub fn count(log: &Log, entry: &str) -> usize {
    log.borrow().iter().filter(|e| *e == entry).count()
}

/// Write `<dir>/<name>.plugin` plus an empty module `<dir>/<name>.<ext>`.
pub fn write_plugin(dir: &Path, name: &str, ext: &str, resources: &[&str]) -> PathBuf {
    fs::create_dir_all(dir).unwrap();
    let resources = resources
        .iter()
        .map(|r| format!("\"{r}\""))
        .collect::<Vec<_>>()
        .join(", ");
    let descriptor = dir.join(format!("{name}.plugin"));
    fs::write(
        &descriptor,
        format!("[plugin]\nName = \"{name}\"\nModule = \"{name}\"\nResources = [{resources}]\n"),
    )
    .unwrap();
    fs::write(dir.join(format!("{name}.{ext}")), b"").unwrap();
    descriptor
}

/// A plugin that implements every hook and records each call.
pub struct Recorder {
    name: String,
    log: Log,
    fail: Option<HookKind>,
}

impl Recorder {
    pub fn new(name: &str, log: &Log) -> Self {
        Self {
            name: name.to_string(),
            log: Rc::clone(log),
            fail: None,
        }
    }

    pub fn failing(mut self, hook: HookKind) -> Self {
        self.fail = Some(hook);
        self
    }

    fn record(&self, hook: HookKind) -> HookResult {
        self.log.borrow_mut().push(format!("{}:{hook}", self.name));
        if self.fail == Some(hook) {
            return Err(HookError::msg(format!("{} refused {hook}", self.name)));
        }
        Ok(())
    }
}

impl OnActivate for Recorder {
    fn activate(&mut self) -> HookResult {
        self.record(HookKind::Activate)
    }
}

impl OnDeactivate for Recorder {
    fn deactivate(&mut self) -> HookResult {
        self.record(HookKind::Deactivate)
    }
}

impl OnBeforeLoad for Recorder {
    fn before_load(&mut self, channel: &mut dyn Channel, _page: &mut dyn Page) -> HookResult {
        self.record(HookKind::BeforeLoad)?;
        channel.register_object(&self.name, serde_json::json!({ "plugin": self.name }));
        Ok(())
    }
}

impl OnLoadStarted for Recorder {
    fn load_started(&mut self, _page: &mut dyn Page) -> HookResult {
        self.record(HookKind::LoadStarted)
    }
}

impl OnLoadFinished for Recorder {
    fn load_finished(&mut self, _page: &mut dyn Page) -> HookResult {
        self.record(HookKind::LoadFinished)
    }
}

impl Plugin for Recorder {
    fn as_on_activate(&mut self) -> Option<&mut dyn OnActivate> {
        Some(self)
    }

    fn as_on_deactivate(&mut self) -> Option<&mut dyn OnDeactivate> {
        Some(self)
    }

    fn as_on_before_load(&mut self) -> Option<&mut dyn OnBeforeLoad> {
        Some(self)
    }

    fn as_on_load_started(&mut self) -> Option<&mut dyn OnLoadStarted> {
        Some(self)
    }

    fn as_on_load_finished(&mut self) -> Option<&mut dyn OnLoadFinished> {
        Some(self)
    }
}

/// A plugin with no hooks at all.
pub struct Bare;

impl Plugin for Bare {}

/// How the test loader treats a plugin name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behaviour {
    Record,
    Fail(HookKind),
    Bare,
    Unloadable,
}

/// Loader producing [`Recorder`]s; `overrides` changes the behaviour per name.
pub fn recording_loader(
    log: &Log,
    overrides: &[(&str, Behaviour)],
) -> impl FnMut(&PluginDescriptor) -> PluginResult<Box<dyn Plugin>> + use<> {
    let log = Rc::clone(log);
    let overrides: Vec<(String, Behaviour)> = overrides
        .iter()
        .map(|(name, b)| ((*name).to_string(), *b))
        .collect();
    move |descriptor: &PluginDescriptor| -> PluginResult<Box<dyn Plugin>> {
        let behaviour = overrides
            .iter()
            .find(|(name, _)| *name == descriptor.name)
            .map_or(Behaviour::Record, |(_, b)| *b);
        log.borrow_mut().push(format!("{}:load", descriptor.name));
        match behaviour {
            Behaviour::Record => Ok(Box::new(Recorder::new(&descriptor.name, &log))),
            Behaviour::Fail(hook) => {
                Ok(Box::new(Recorder::new(&descriptor.name, &log).failing(hook)))
            },
            Behaviour::Bare => Ok(Box::new(Bare)),
            Behaviour::Unloadable => Err(PluginError::LoadFailed {
                plugin: descriptor.name.clone(),
                message: "corrupt module".to_string(),
            }),
        }
    }
}

/// A page that remembers what was injected into it.
#[derive(Debug, Default)]
pub struct RecordingPage {
    pub url: Option<String>,
    pub scripts: Vec<(String, PathBuf)>,
    pub stylesheets: Vec<(String, PathBuf)>,
}

impl Page for RecordingPage {
    fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    fn inject_script(&mut self, path: &Path, name: &str, point: InjectionPoint) {
        assert_eq!(point, InjectionPoint::DocumentReady);
        self.scripts.push((name.to_string(), path.to_path_buf()));
    }

    fn inject_stylesheet(&mut self, path: &Path, name: &str, point: InjectionPoint) {
        assert_eq!(point, InjectionPoint::DocumentReady);
        self.stylesheets.push((name.to_string(), path.to_path_buf()));
    }
}

/// A channel that remembers registered objects.
#[derive(Debug, Default)]
pub struct RecordingChannel {
    pub objects: Vec<(String, serde_json::Value)>,
}

impl Channel for RecordingChannel {
    fn register_object(&mut self, name: &str, object: serde_json::Value) {
        self.objects.push((name.to_string(), object));
    }
}
