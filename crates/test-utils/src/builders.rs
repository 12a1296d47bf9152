#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use dirwatcher::config::{ConfigFile, RawConfigFile};
use dirwatcher::fs::mock::MockFileSystem;
use tempfile::TempDir;

/// Files of the reference tree, in creation (and therefore inode) order.
pub const TREE1_FILES: [&str; 6] = [
    "file1",
    "file2",
    "dir1/file4.foo",
    "dir1/file5.bar",
    "dir2/file6.foo",
    "dir2/file6.bar",
];

/// The reference tree under `/tree1` in a mock filesystem.
pub fn mock_tree1() -> MockFileSystem {
    let fs = MockFileSystem::new();
    for rel in TREE1_FILES {
        fs.add_file(Path::new("/tree1").join(rel));
    }
    fs
}

/// A directory tree on the real filesystem, removed on drop.
pub struct TempTree {
    dir: TempDir,
}

impl TempTree {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("create temp dir"),
        }
    }

    /// The reference tree, rooted at [`TempTree::path`].
    pub fn tree1() -> Self {
        let tree = Self::new();
        for rel in TREE1_FILES {
            tree.file(rel);
        }
        tree
    }

    /// Create an empty file (and its parents).
    pub fn file(&self, rel: &str) -> PathBuf {
        let path = self.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent dirs");
        }
        fs::write(&path, b"").expect("write file");
        path
    }

    pub fn dir(&self, rel: &str) -> PathBuf {
        let path = self.join(rel);
        fs::create_dir_all(&path).expect("create dir");
        path
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn join(&self, rel: &str) -> PathBuf {
        self.dir.path().join(rel)
    }
}

impl Default for TempTree {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile::default(),
        }
    }

    pub fn root(mut self, root: impl Into<PathBuf>) -> Self {
        self.config.roots.push(root.into());
        self
    }

    pub fn matches(mut self, pattern: &str) -> Self {
        self.config.matches.push(pattern.to_string());
        self
    }

    pub fn ignores(mut self, pattern: &str) -> Self {
        self.config.ignores.push(pattern.to_string());
        self
    }

    pub fn monitor(mut self, val: bool) -> Self {
        self.config.monitor = val;
        self
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}
