//! Model file sources.
//!
//! A [`SourceProvider`] lists the files of a model and supplies their text.
//! The resolver never touches the file system directly.

use crate::error::Error;
use crate::model::FileId;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// File extension of model files.
pub const MODEL_FILE_EXTENSION: &str = "tmd";

/// Supplier of model files.
pub trait SourceProvider: Send + Sync {
    /// All file identities of the model, in any order.
    fn list(&self) -> Result<Vec<FileId>, Error>;

    /// Text of one file.
    fn read(&self, file: &FileId) -> Result<Arc<str>, Error>;
}

impl<T: SourceProvider + ?Sized> SourceProvider for Arc<T> {
    fn list(&self) -> Result<Vec<FileId>, Error> {
        (**self).list()
    }

    fn read(&self, file: &FileId) -> Result<Arc<str>, Error> {
        (**self).read(file)
    }
}

/// Content fingerprint of a file's text.
pub fn fingerprint(source: &str) -> String {
    hex::encode(blake3::hash(source.as_bytes()).as_bytes())
}

/// In-memory sources, editable while a store is serving snapshots.
#[derive(Debug, Default)]
pub struct MemorySources {
    files: RwLock<BTreeMap<FileId, Arc<str>>>,
}

impl MemorySources {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file (builder form).
    pub fn with_file(self, file: FileId, source: impl Into<String>) -> Self {
        self.insert(file, source);
        self
    }

    /// Add or replace a file.
    pub fn insert(&self, file: FileId, source: impl Into<String>) {
        self.files.write().insert(file, Arc::from(source.into()));
    }

    /// Remove a file. Returns whether it existed.
    pub fn remove(&self, file: &FileId) -> bool {
        self.files.write().remove(file).is_some()
    }

    pub fn len(&self) -> usize {
        self.files.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.read().is_empty()
    }
}

impl SourceProvider for MemorySources {
    fn list(&self) -> Result<Vec<FileId>, Error> {
        Ok(self.files.read().keys().cloned().collect())
    }

    fn read(&self, file: &FileId) -> Result<Arc<str>, Error> {
        self.files
            .read()
            .get(file)
            .cloned()
            .ok_or_else(|| Error::Source(format!("no such file: {}", file)))
    }
}

/// Sources laid out on disk as `<root>/<module>/<kind>/<name>.tmd`.
#[derive(Debug, Clone)]
pub struct DirectorySources {
    root: PathBuf,
}

impl DirectorySources {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of a file on disk.
    pub fn path_of(&self, file: &FileId) -> PathBuf {
        self.root
            .join(&file.module)
            .join(&file.kind)
            .join(format!("{}.{}", file.name, MODEL_FILE_EXTENSION))
    }

    fn subdirectories(dir: &Path) -> Result<Vec<(String, PathBuf)>, Error> {
        let mut dirs = Vec::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                dirs.push((name.to_string(), path));
            }
        }
        Ok(dirs)
    }
}

impl SourceProvider for DirectorySources {
    fn list(&self) -> Result<Vec<FileId>, Error> {
        if !self.root.is_dir() {
            return Err(Error::Source(format!(
                "model directory not found: {}",
                self.root.display()
            )));
        }

        let mut files = Vec::new();
        for (module, module_dir) in Self::subdirectories(&self.root)? {
            for (kind, kind_dir) in Self::subdirectories(&module_dir)? {
                for entry in fs::read_dir(&kind_dir)? {
                    let path = entry?.path();
                    if path.extension().map(|e| e != MODEL_FILE_EXTENSION).unwrap_or(true) {
                        continue;
                    }
                    if let Some(name) = path.file_stem().and_then(|n| n.to_str()) {
                        files.push(FileId::new(&module, &kind, name));
                    }
                }
            }
        }
        files.sort();
        Ok(files)
    }

    fn read(&self, file: &FileId) -> Result<Arc<str>, Error> {
        let text = fs::read_to_string(self.path_of(file))?;
        Ok(Arc::from(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_sources() {
        let sources = MemorySources::new()
            .with_file(FileId::new("App", "Model", "B"), "class B {}")
            .with_file(FileId::new("App", "Model", "A"), "class A {}");

        let files = sources.list().unwrap();
        assert_eq!(files[0].name, "A");
        assert_eq!(&*sources.read(&files[1]).unwrap(), "class B {}");

        assert!(sources.remove(&files[0]));
        assert!(matches!(sources.read(&files[0]), Err(Error::Source(_))));
        assert_eq!(sources.len(), 1);
    }

    #[test]
    fn test_directory_sources() {
        let dir = tempfile::tempdir().unwrap();
        let model_dir = dir.path().join("Referentiel").join("Model");
        fs::create_dir_all(&model_dir).unwrap();
        fs::write(model_dir.join("Pays.tmd"), "class Pays {}").unwrap();
        fs::write(model_dir.join("notes.txt"), "ignored").unwrap();

        let sources = DirectorySources::new(dir.path());
        let files = sources.list().unwrap();
        assert_eq!(files, vec![FileId::new("Referentiel", "Model", "Pays")]);
        assert_eq!(&*sources.read(&files[0]).unwrap(), "class Pays {}");
    }

    #[test]
    fn test_missing_directory() {
        let sources = DirectorySources::new("/nonexistent/modelc/root");
        assert!(matches!(sources.list(), Err(Error::Source(_))));
    }

    #[test]
    fn test_fingerprint_changes_with_content() {
        assert_eq!(fingerprint("class A {}"), fingerprint("class A {}"));
        assert_ne!(fingerprint("class A {}"), fingerprint("class B {}"));
        assert_eq!(fingerprint("").len(), 64);
    }
}
