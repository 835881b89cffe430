//! A page and channel with no renderer behind them.
//!
//! `webshell run` uses these to drive plugins without a webview: every
//! injection and registered object is logged and kept for the summary.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::{info, warn};
use webshell_plugins::{Channel, InjectionPoint, Page, ResourceKind};

/// A resource handed to a [`HeadlessPage`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Injection {
    pub(crate) name: String,
    pub(crate) path: PathBuf,
    pub(crate) kind: ResourceKind,
}

#[derive(Debug)]
pub(crate) struct HeadlessPage {
    url: String,
    injections: Vec<Injection>,
}

impl HeadlessPage {
    pub(crate) fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            injections: Vec::new(),
        }
    }

    pub(crate) fn injections(&self) -> &[Injection] {
        &self.injections
    }

    fn inject(&mut self, path: &Path, name: &str, kind: ResourceKind, point: InjectionPoint) {
        if !path.is_file() {
            warn!(url = %self.url, resource = name, path = %path.display(), "Injected resource does not exist");
        }
        info!(url = %self.url, resource = name, kind = ?kind, point = ?point, "Injecting resource");

        let injection = Injection {
            name: name.to_string(),
            path: path.to_path_buf(),
            kind,
        };
        match self.injections.iter_mut().find(|i| i.name == name) {
            Some(existing) => *existing = injection,
            None => self.injections.push(injection),
        }
    }
}

impl Page for HeadlessPage {
    fn url(&self) -> Option<&str> {
        Some(&self.url)
    }

    fn inject_script(&mut self, path: &Path, name: &str, point: InjectionPoint) {
        self.inject(path, name, ResourceKind::Script, point);
    }

    fn inject_stylesheet(&mut self, path: &Path, name: &str, point: InjectionPoint) {
        self.inject(path, name, ResourceKind::Stylesheet, point);
    }
}

#[derive(Debug, Default)]
pub(crate) struct HeadlessChannel {
    objects: BTreeMap<String, serde_json::Value>,
}

impl HeadlessChannel {
    pub(crate) fn objects(&self) -> &BTreeMap<String, serde_json::Value> {
        &self.objects
    }
}

impl Channel for HeadlessChannel {
    fn register_object(&mut self, name: &str, object: serde_json::Value) {
        info!(object = name, "Registered channel object");
        self.objects.insert(name.to_string(), object);
    }
}
