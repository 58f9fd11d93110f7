//! Model loader: reading, parsing and dependency ordering of files.

use crate::config::GeneratorConfig;
use crate::error::Error;
use crate::model::FileId;
use crate::source::{fingerprint, SourceProvider};
use modelc_lang::ModelFile;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

/// A parsed file and its declared dependencies.
#[derive(Debug, Clone)]
pub struct LoadedFile {
    pub id: FileId,
    pub source: Arc<str>,
    pub ast: Arc<ModelFile>,
    /// blake3 hex digest of `source`.
    pub fingerprint: String,
    /// Files this file uses, deduplicated, in declaration order.
    pub uses: Vec<FileId>,
}

impl LoadedFile {
    /// Parse a file.
    pub fn parse(id: FileId, source: Arc<str>) -> Result<Self, Error> {
        let ast = modelc_lang::parse(&source).map_err(|e| Error::parse(id.clone(), e, &source))?;
        let mut uses: Vec<FileId> = Vec::with_capacity(ast.uses.len());
        for file_ref in &ast.uses {
            let dependency = FileId::from(&file_ref.value);
            if !uses.contains(&dependency) {
                uses.push(dependency);
            }
        }
        Ok(Self {
            fingerprint: fingerprint(&source),
            id,
            source,
            ast: Arc::new(ast),
            uses,
        })
    }
}

/// Parsed files from previous runs, keyed by file identity.
///
/// An entry is reused when the file's content fingerprint is unchanged, or
/// without reading the file at all when the caller knows it did not change.
#[derive(Debug, Default)]
pub struct ParseCache {
    entries: HashMap<FileId, LoadedFile>,
    hits: u64,
    misses: u64,
}

impl ParseCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cached files.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Cache hits since creation.
    pub fn hits(&self) -> u64 {
        self.hits
    }

    /// Parses performed since creation.
    pub fn misses(&self) -> u64 {
        self.misses
    }

    /// Drop one entry, forcing a re-read.
    pub fn invalidate(&mut self, file: &FileId) {
        self.entries.remove(file);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    fn cached(&mut self, file: &FileId) -> Option<LoadedFile> {
        let entry = self.entries.get(file).cloned();
        if entry.is_some() {
            self.hits += 1;
        }
        entry
    }

    fn load(&mut self, file: &FileId, source: Arc<str>) -> Result<LoadedFile, Error> {
        let digest = fingerprint(&source);
        if let Some(entry) = self.entries.get(file) {
            if entry.fingerprint == digest {
                self.hits += 1;
                return Ok(entry.clone());
            }
        }

        self.misses += 1;
        tracing::trace!(file = %file, "parsing model file");
        match LoadedFile::parse(file.clone(), source) {
            Ok(loaded) => {
                self.entries.insert(file.clone(), loaded.clone());
                Ok(loaded)
            }
            Err(e) => {
                // a stale parse must not outlive a broken file
                self.entries.remove(file);
                Err(e)
            }
        }
    }

    fn retain(&mut self, files: &BTreeSet<FileId>) {
        self.entries.retain(|id, _| files.contains(id));
    }
}

/// Read and parse every file of a provider.
///
/// With `unchanged_hint = Some(changed)`, files outside `changed` that are
/// already cached are reused without being read again. Otherwise every file
/// is read and reparsed only if its content changed.
pub fn read_all(
    provider: &dyn SourceProvider,
    config: &GeneratorConfig,
    cache: &mut ParseCache,
    changed: Option<&BTreeSet<FileId>>,
) -> Result<Vec<LoadedFile>, Error> {
    let ids: BTreeSet<FileId> = provider.list()?.into_iter().collect();
    cache.retain(&ids);

    let mut files = Vec::with_capacity(ids.len());
    for id in &ids {
        if !config.is_module_declared(&id.module) {
            return Err(Error::UndeclaredModule {
                module: id.module.clone(),
                file: id.clone(),
            });
        }

        let reusable = changed.is_some_and(|changed| !changed.contains(id));
        let loaded = match reusable.then(|| cache.cached(id)).flatten() {
            Some(loaded) => loaded,
            None => {
                let source = provider.read(id)?;
                cache.load(id, source)?
            }
        };
        files.push(loaded);
    }
    Ok(files)
}

/// Order files so that every file follows all files it uses.
///
/// Ties are broken by file identity, so the order is stable for identical
/// inputs.
pub fn order(files: Vec<LoadedFile>) -> Result<Vec<LoadedFile>, Error> {
    let mut by_id: BTreeMap<FileId, LoadedFile> =
        files.into_iter().map(|f| (f.id.clone(), f)).collect();

    let mut pending: BTreeMap<FileId, usize> = BTreeMap::new();
    let mut dependents: HashMap<FileId, Vec<FileId>> = HashMap::new();
    for (id, file) in &by_id {
        for dependency in &file.uses {
            if !by_id.contains_key(dependency) {
                return Err(Error::UnknownDependency {
                    file: id.clone(),
                    dependency: dependency.clone(),
                });
            }
            dependents.entry(dependency.clone()).or_default().push(id.clone());
        }
        pending.insert(id.clone(), file.uses.len());
    }

    let mut ready: BTreeSet<FileId> = pending
        .iter()
        .filter(|(_, count)| **count == 0)
        .map(|(id, _)| id.clone())
        .collect();

    let mut ordered = Vec::with_capacity(by_id.len());
    while let Some(id) = ready.pop_first() {
        pending.remove(&id);
        if let Some(users) = dependents.get(&id) {
            for user in users {
                if let Some(count) = pending.get_mut(user) {
                    *count -= 1;
                    if *count == 0 {
                        ready.insert(user.clone());
                    }
                }
            }
        }
        if let Some(file) = by_id.remove(&id) {
            ordered.push(file);
        }
    }

    if !by_id.is_empty() {
        return Err(Error::DependencyCycle {
            files: find_cycle(&by_id),
        });
    }
    Ok(ordered)
}

/// Extract one cycle from files that could not be ordered.
///
/// Every remaining file still uses at least one remaining file, so walking
/// first remaining dependencies from the smallest file must revisit a file.
fn find_cycle(remaining: &BTreeMap<FileId, LoadedFile>) -> Vec<FileId> {
    let Some(start) = remaining.keys().next() else {
        return Vec::new();
    };

    let mut path: Vec<FileId> = Vec::new();
    let mut current = start.clone();
    loop {
        if let Some(pos) = path.iter().position(|id| *id == current) {
            return path.split_off(pos);
        }
        path.push(current.clone());

        let next = remaining.get(&current).and_then(|file| {
            file.uses
                .iter()
                .filter(|dep| remaining.contains_key(*dep))
                .min()
                .cloned()
        });
        match next {
            Some(next) => current = next,
            None => return path,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MemorySources;

    fn file(name: &str, source: &str) -> LoadedFile {
        LoadedFile::parse(FileId::new("App", "Model", name), Arc::from(source)).unwrap()
    }

    fn names(files: &[LoadedFile]) -> Vec<&str> {
        files.iter().map(|f| f.id.name.as_str()).collect()
    }

    #[test]
    fn test_dependencies_come_first() {
        let files = vec![
            file("Societe", "uses App::Model::Pays; uses App::Domain::Domains;"),
            file("Pays", "uses App::Domain::Domains;"),
            LoadedFile::parse(FileId::new("App", "Domain", "Domains"), Arc::from("")).unwrap(),
        ];
        let ordered = order(files).unwrap();
        assert_eq!(names(&ordered), vec!["Domains", "Pays", "Societe"]);
    }

    #[test]
    fn test_ties_break_by_identity() {
        let ordered = order(vec![file("C", ""), file("A", ""), file("B", "")]).unwrap();
        assert_eq!(names(&ordered), vec!["A", "B", "C"]);
    }

    #[test]
    fn test_duplicate_uses_are_ignored() {
        let files = vec![
            file("A", "uses App::Model::B; uses App::Model::B;"),
            file("B", ""),
        ];
        assert_eq!(files[0].uses.len(), 1);
        assert_eq!(names(&order(files).unwrap()), vec!["B", "A"]);
    }

    #[test]
    fn test_cycle_is_reported_with_members() {
        let files = vec![
            file("A", "uses App::Model::B;"),
            file("B", "uses App::Model::C;"),
            file("C", "uses App::Model::A;"),
            file("D", "uses App::Model::A;"),
        ];
        match order(files) {
            Err(Error::DependencyCycle { files }) => {
                let names: Vec<_> = files.iter().map(|f| f.name.as_str()).collect();
                assert_eq!(names, vec!["A", "B", "C"]);
            }
            other => panic!("expected cycle, got {:?}", other.map(|f| f.len())),
        }
    }

    #[test]
    fn test_self_use_is_a_cycle() {
        let result = order(vec![file("A", "uses App::Model::A;")]);
        assert!(matches!(result, Err(Error::DependencyCycle { files }) if files.len() == 1));
    }

    #[test]
    fn test_unknown_dependency() {
        let result = order(vec![file("A", "uses App::Model::Missing;")]);
        assert!(matches!(
            result,
            Err(Error::UnknownDependency { dependency, .. }) if dependency.name == "Missing"
        ));
    }

    #[test]
    fn test_parse_cache_skips_unchanged_files() {
        let sources = MemorySources::new()
            .with_file(FileId::new("App", "Model", "A"), "class A {}")
            .with_file(FileId::new("App", "Model", "B"), "class B {}");
        let config = GeneratorConfig::new("App");
        let mut cache = ParseCache::new();

        read_all(&sources, &config, &mut cache, None).unwrap();
        assert_eq!(cache.misses(), 2);

        sources.insert(FileId::new("App", "Model", "B"), "class B { abstract; }");
        read_all(&sources, &config, &mut cache, None).unwrap();
        assert_eq!(cache.misses(), 3);
        assert_eq!(cache.hits(), 1);
    }

    #[test]
    fn test_changed_set_limits_reads() {
        let a = FileId::new("App", "Model", "A");
        let sources = MemorySources::new().with_file(a.clone(), "class A {}");
        let config = GeneratorConfig::new("App");
        let mut cache = ParseCache::new();
        read_all(&sources, &config, &mut cache, None).unwrap();

        // Not listed as changed: the cached parse is kept even though the
        // text moved on.
        sources.insert(a.clone(), "class A { abstract; }");
        let files = read_all(&sources, &config, &mut cache, Some(&BTreeSet::new())).unwrap();
        assert!(!files[0].ast.classes[0].is_abstract);

        let changed: BTreeSet<FileId> = [a].into_iter().collect();
        let files = read_all(&sources, &config, &mut cache, Some(&changed)).unwrap();
        assert!(files[0].ast.classes[0].is_abstract);
    }

    #[test]
    fn test_removed_files_leave_the_cache() {
        let a = FileId::new("App", "Model", "A");
        let sources = MemorySources::new().with_file(a.clone(), "class A {}");
        let config = GeneratorConfig::new("App");
        let mut cache = ParseCache::new();
        read_all(&sources, &config, &mut cache, None).unwrap();
        assert_eq!(cache.len(), 1);

        sources.remove(&a);
        read_all(&sources, &config, &mut cache, None).unwrap();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_undeclared_module() {
        let sources =
            MemorySources::new().with_file(FileId::new("Facturation", "Model", "A"), "");
        let config = GeneratorConfig::new("App").with_module("Referentiel");
        let mut cache = ParseCache::new();
        assert!(matches!(
            read_all(&sources, &config, &mut cache, None),
            Err(Error::UndeclaredModule { module, .. }) if module == "Facturation"
        ));
    }

    #[test]
    fn test_parse_error_names_file() {
        let sources = MemorySources::new().with_file(FileId::new("App", "Model", "A"), "class {");
        let config = GeneratorConfig::new("App");
        let mut cache = ParseCache::new();
        let err = read_all(&sources, &config, &mut cache, None).unwrap_err();
        assert!(matches!(err, Error::Parse { ref file, .. } if file.name == "A"));
    }
}
