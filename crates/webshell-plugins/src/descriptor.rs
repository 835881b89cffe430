//! Plugin descriptor files.
//!
//! A descriptor is a small TOML file ending in `.plugin` that names a plugin
//! and points at its module:
//!
//! ```toml
//! [plugin]
//! Name = "test"
//! Module = "test"                # resolved to test.wasm next to this file
//! Resources = ["test_style.css"] # relative to the module's directory
//! ```

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{DescriptorError, DescriptorResult};

/// File suffix identifying descriptor files.
pub const DESCRIPTOR_SUFFIX: &str = ".plugin";

/// Identity of a plugin, read from a descriptor file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginDescriptor {
    /// Unique plugin name.
    pub name: String,
    /// Absolute path to the module file. Guaranteed to exist at scan time.
    pub module_path: PathBuf,
    /// Resources to inject into pages, in declaration order.
    pub resources: Vec<PathBuf>,
    /// The descriptor file this was read from.
    pub source_file: PathBuf,
    /// Optional version string.
    pub version: Option<String>,
    /// Optional human-readable description.
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DescriptorFile {
    plugin: Option<RawPlugin>,
}

#[derive(Debug, Deserialize)]
struct RawPlugin {
    #[serde(rename = "Name", alias = "name")]
    name: Option<String>,
    #[serde(rename = "Module", alias = "module")]
    module: Option<String>,
    #[serde(rename = "Resources", alias = "resources", default)]
    resources: Vec<String>,
    #[serde(rename = "Version", alias = "version")]
    version: Option<String>,
    #[serde(rename = "Description", alias = "description")]
    description: Option<String>,
}

impl PluginDescriptor {
    /// Read and validate the descriptor at `path`.
    ///
    /// # Errors
    ///
    /// Returns a [`DescriptorError`] if the file cannot be read, is malformed,
    /// lacks `Name` or `Module`, or names a module that does not exist.
    pub fn from_file(path: &Path, module_extension: &str) -> DescriptorResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| DescriptorError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(path, &content, module_extension)
    }

    /// Validate descriptor `content` as if read from `source_file`.
    ///
    /// # Errors
    ///
    /// Same as [`from_file`](Self::from_file), minus the read.
    pub fn parse(
        source_file: &Path,
        content: &str,
        module_extension: &str,
    ) -> DescriptorResult<Self> {
        let file: DescriptorFile =
            toml::from_str(content).map_err(|source| DescriptorError::Parse {
                path: source_file.to_path_buf(),
                source,
            })?;

        let missing = |key| DescriptorError::MissingKey {
            path: source_file.to_path_buf(),
            key,
        };
        let raw = file.plugin.ok_or_else(|| missing("plugin"))?;
        let name = non_empty(raw.name).ok_or_else(|| missing("Name"))?;
        let module = non_empty(raw.module).ok_or_else(|| missing("Module"))?;

        let descriptor_dir = absolute_parent(source_file);
        let module_path = with_extension(descriptor_dir.join(module), module_extension);
        if !module_path.is_file() {
            return Err(DescriptorError::ModuleNotFound {
                path: source_file.to_path_buf(),
                module: module_path,
            });
        }

        let module_dir = module_path
            .parent()
            .map_or_else(|| descriptor_dir.clone(), Path::to_path_buf);
        let resources = raw
            .resources
            .into_iter()
            .map(|r| module_dir.join(r))
            .collect();

        Ok(Self {
            name,
            module_path,
            resources,
            source_file: source_file.to_path_buf(),
            version: raw.version,
            description: raw.description,
        })
    }

    /// Module file name without its extension.
    #[must_use]
    pub fn module_stem(&self) -> Option<&str> {
        self.module_path.file_stem().and_then(OsStr::to_str)
    }
}

/// Whether `path` names a descriptor file.
#[must_use]
pub fn is_descriptor_file(path: &Path) -> bool {
    path.file_name()
        .and_then(OsStr::to_str)
        .is_some_and(|n| n.len() > DESCRIPTOR_SUFFIX.len() && n.ends_with(DESCRIPTOR_SUFFIX))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn absolute_parent(source_file: &Path) -> PathBuf {
    let parent = source_file.parent().unwrap_or_else(|| Path::new("."));
    std::path::absolute(parent).unwrap_or_else(|_| parent.to_path_buf())
}

/// Append `.{extension}` unless the path already ends with it.
fn with_extension(path: PathBuf, extension: &str) -> PathBuf {
    if extension.is_empty() || path.extension() == Some(OsStr::new(extension)) {
        return path;
    }
    let mut raw = path.into_os_string();
    raw.push(".");
    raw.push(extension);
    PathBuf::from(raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn fixture(descriptor: &str, module: Option<&str>) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.plugin");
        fs::write(&path, descriptor).unwrap();
        if let Some(module) = module {
            fs::write(dir.path().join(module), b"").unwrap();
        }
        (dir, path)
    }

    #[test]
    fn test_parse_appends_extension_and_resolves_resources() {
        let (dir, path) = fixture(
            "[plugin]\nName = \"test\"\nModule = \"test\"\nResources = [\"style.css\", \"/abs/app.js\"]\n",
            Some("test.wasm"),
        );

        let descriptor = PluginDescriptor::from_file(&path, "wasm").unwrap();
        assert_eq!(descriptor.name, "test");
        assert_eq!(descriptor.module_path, dir.path().join("test.wasm"));
        assert_eq!(
            descriptor.resources,
            vec![dir.path().join("style.css"), PathBuf::from("/abs/app.js")]
        );
        assert_eq!(descriptor.source_file, path);
        assert_eq!(descriptor.module_stem(), Some("test"));
    }

    #[test]
    fn test_parse_keeps_existing_extension() {
        let (dir, path) = fixture(
            "[plugin]\nName = \"test\"\nModule = \"test.py\"\n",
            Some("test.py"),
        );
        let descriptor = PluginDescriptor::from_file(&path, "py").unwrap();
        assert_eq!(descriptor.module_path, dir.path().join("test.py"));
        assert!(descriptor.resources.is_empty());
    }

    #[test]
    fn test_parse_accepts_lowercase_keys_and_metadata() {
        let (_dir, path) = fixture(
            "[plugin]\nname = \"lower\"\nmodule = \"m\"\nversion = \"1.2.0\"\ndescription = \"demo\"\n",
            Some("m.wasm"),
        );
        let descriptor = PluginDescriptor::from_file(&path, "wasm").unwrap();
        assert_eq!(descriptor.name, "lower");
        assert_eq!(descriptor.version.as_deref(), Some("1.2.0"));
        assert_eq!(descriptor.description.as_deref(), Some("demo"));
    }

    #[test]
    fn test_missing_module_file_rejected() {
        let (dir, path) = fixture("[plugin]\nName = \"ghost\"\nModule = \"ghost\"\n", None);
        let err = PluginDescriptor::from_file(&path, "wasm").unwrap_err();
        match err {
            DescriptorError::ModuleNotFound { module, .. } => {
                assert_eq!(module, dir.path().join("ghost.wasm"));
            },
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_required_keys() {
        let cases = [
            ("[other]\nName = \"x\"\n", "plugin"),
            ("[plugin]\nModule = \"m\"\n", "Name"),
            ("[plugin]\nName = \"  \"\nModule = \"m\"\n", "Name"),
            ("[plugin]\nName = \"x\"\n", "Module"),
        ];
        for (content, expected) in cases {
            let err = PluginDescriptor::parse(Path::new("/tmp/x.plugin"), content, "wasm")
                .unwrap_err();
            assert!(
                matches!(err, DescriptorError::MissingKey { key, .. } if key == expected),
                "{content:?}: {err}"
            );
        }
    }

    #[test]
    fn test_malformed_descriptor() {
        let err = PluginDescriptor::parse(Path::new("/tmp/x.plugin"), "[plugin", "wasm")
            .unwrap_err();
        assert!(matches!(err, DescriptorError::Parse { .. }));
    }

    #[test]
    fn test_is_descriptor_file() {
        assert!(is_descriptor_file(Path::new("/a/test.plugin")));
        assert!(!is_descriptor_file(Path::new("/a/.plugin")));
        assert!(!is_descriptor_file(Path::new("/a/test.plugin.bak")));
        assert!(!is_descriptor_file(Path::new("/a/test.wasm")));
    }

    #[test]
    fn test_with_extension() {
        assert_eq!(
            with_extension(PathBuf::from("a/b"), "wasm"),
            PathBuf::from("a/b.wasm")
        );
        assert_eq!(
            with_extension(PathBuf::from("a/b.v1"), "wasm"),
            PathBuf::from("a/b.v1.wasm")
        );
        assert_eq!(with_extension(PathBuf::from("a/b"), ""), PathBuf::from("a/b"));
    }
}
