//! Descriptor discovery across plugin directories.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::descriptor::{PluginDescriptor, is_descriptor_file};
use crate::error::DescriptorError;

/// Outcome of scanning the plugin directories.
#[derive(Debug, Default)]
pub struct ScanResult {
    /// Valid descriptors, first occurrence of each name only, in scan order.
    pub descriptors: Vec<PluginDescriptor>,
    /// Descriptor files that were rejected, with the reason.
    pub rejected: Vec<(PathBuf, DescriptorError)>,
}

impl ScanResult {
    /// Find a descriptor by plugin name.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&PluginDescriptor> {
        self.descriptors.iter().find(|d| d.name == name)
    }
}

/// Ordered set of directories searched for `*.plugin` descriptors.
#[derive(Debug, Clone)]
pub struct DescriptorStore {
    dirs: Vec<PathBuf>,
    module_extension: String,
}

impl DescriptorStore {
    /// Create a store over `dirs`. Relative directories are made absolute
    /// against the current working directory; duplicates are dropped.
    #[must_use]
    pub fn new<I, P>(dirs: I, module_extension: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let mut store = Self {
            dirs: Vec::new(),
            module_extension: module_extension.into(),
        };
        for dir in dirs {
            store.add_dir(dir);
        }
        store
    }

    /// The directories, in search order.
    #[must_use]
    pub fn dirs(&self) -> &[PathBuf] {
        &self.dirs
    }

    /// Extension appended to module names lacking one.
    #[must_use]
    pub fn module_extension(&self) -> &str {
        &self.module_extension
    }

    /// Append a directory. Returns `false` if it was already searched.
    pub fn add_dir(&mut self, dir: impl Into<PathBuf>) -> bool {
        let dir = dir.into();
        let dir = std::path::absolute(&dir).unwrap_or(dir);
        if self.dirs.contains(&dir) {
            return false;
        }
        self.dirs.push(dir);
        true
    }

    /// Scan every directory.
    #[must_use]
    pub fn scan(&self) -> ScanResult {
        scan(&self.dirs, &self.module_extension)
    }
}

/// Recursively collect descriptors from `dirs`, in order.
///
/// Files are visited sorted by name within each directory so results are
/// deterministic. Invalid descriptors are logged and reported in
/// [`ScanResult::rejected`]; they never abort the scan. When two descriptors
/// share a name only the first one is kept.
#[must_use]
pub fn scan(dirs: &[PathBuf], module_extension: &str) -> ScanResult {
    let mut result = ScanResult::default();
    let mut seen = HashSet::new();

    for dir in dirs {
        for path in descriptor_files(dir) {
            match PluginDescriptor::from_file(&path, module_extension) {
                Ok(descriptor) => {
                    if seen.insert(descriptor.name.clone()) {
                        debug!(
                            plugin = %descriptor.name,
                            path = %path.display(),
                            "Found plugin descriptor"
                        );
                        result.descriptors.push(descriptor);
                    } else {
                        debug!(
                            plugin = %descriptor.name,
                            path = %path.display(),
                            "Ignoring descriptor with duplicate name"
                        );
                    }
                },
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Skipping invalid plugin descriptor");
                    result.rejected.push((path, e));
                },
            }
        }
    }

    debug!(
        found = result.descriptors.len(),
        rejected = result.rejected.len(),
        "Plugin scan complete"
    );
    result
}

fn descriptor_files(dir: &Path) -> Vec<PathBuf> {
    if !dir.is_dir() {
        debug!(path = %dir.display(), "Plugin directory does not exist, skipping");
        return Vec::new();
    }

    WalkDir::new(dir)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!(path = %dir.display(), error = %e, "Error while walking plugin directory");
                None
            },
        })
        .filter(|entry| entry.file_type().is_file() && is_descriptor_file(entry.path()))
        .map(walkdir::DirEntry::into_path)
        .collect()
}
