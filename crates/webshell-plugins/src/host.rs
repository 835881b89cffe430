//! Host collaborators handed to plugins during page events.

use std::ffi::OsStr;
use std::path::Path;

/// When an injected resource runs relative to page loading.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum InjectionPoint {
    /// Before any page content is parsed.
    DocumentCreation,
    /// Once the DOM is ready.
    #[default]
    DocumentReady,
    /// After the page has finished loading.
    Deferred,
}

/// A page rendered by the host.
///
/// Injection calls are fire-and-forget: the host is expected to report its
/// own failures. Injecting twice under the same `name` should replace the
/// earlier injection.
pub trait Page {
    /// Current page URL, if known.
    fn url(&self) -> Option<&str> {
        None
    }

    /// Inject a script file into the page.
    fn inject_script(&mut self, path: &Path, name: &str, point: InjectionPoint);

    /// Inject a stylesheet file into the page.
    fn inject_stylesheet(&mut self, path: &Path, name: &str, point: InjectionPoint);
}

/// Messaging bridge between host code and page scripts.
pub trait Channel {
    /// Publish `object` to page scripts under `name`.
    fn register_object(&mut self, name: &str, object: serde_json::Value);
}

/// How a resource file is injected, decided by its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    /// `.js`
    Script,
    /// `.css`
    Stylesheet,
}

impl ResourceKind {
    /// Classify `path`. Unknown extensions yield `None`.
    #[must_use]
    pub fn of(path: &Path) -> Option<Self> {
        match path.extension().and_then(OsStr::to_str) {
            Some(ext) if ext.eq_ignore_ascii_case("js") => Some(Self::Script),
            Some(ext) if ext.eq_ignore_ascii_case("css") => Some(Self::Stylesheet),
            _ => None,
        }
    }
}
