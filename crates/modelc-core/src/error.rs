//! Core error types.
//!
//! [`Error`] covers problems that stop a resolution run outright.
//! Per-class and per-field problems are reported as
//! [`Diagnostic`](crate::Diagnostic)s instead.

use crate::model::FileId;
use modelc_lang::ParseError;
use thiserror::Error;

/// Fatal resolution errors.
#[derive(Debug, Error)]
pub enum Error {
    /// A required top-level setting is missing.
    #[error("missing required setting: {setting}")]
    MissingSetting {
        /// Name of the setting.
        setting: String,
    },

    /// A file belongs to a module that is not declared in the configuration.
    #[error("file {file} belongs to undeclared module '{module}'")]
    UndeclaredModule {
        /// The undeclared module.
        module: String,
        /// The file that declared it.
        file: FileId,
    },

    /// Files depend on each other in a cycle.
    #[error("dependency cycle between files: {}", join_files(.files))]
    DependencyCycle {
        /// Cycle members in walk order.
        files: Vec<FileId>,
    },

    /// A file uses another file that is not part of the batch.
    #[error("file {file} uses unknown file {dependency}")]
    UnknownDependency {
        /// The file declaring the dependency.
        file: FileId,
        /// The missing dependency.
        dependency: FileId,
    },

    /// Two classes share a name.
    #[error("class '{name}' is declared in both {first} and {second}")]
    DuplicateClass {
        /// The class name.
        name: String,
        /// File of the first declaration.
        first: FileId,
        /// File of the second declaration.
        second: FileId,
    },

    /// Two domains share a name.
    #[error("domain '{name}' is declared in both {first} and {second}")]
    DuplicateDomain {
        /// The domain name.
        name: String,
        /// File of the first declaration.
        first: FileId,
        /// File of the second declaration.
        second: FileId,
    },

    /// A class's declared key is not a unique property.
    #[error("key '{key}' of class '{class}' ({file}) is not a unique property")]
    NoUniqueKey {
        /// The class name.
        class: String,
        /// The declared key.
        key: String,
        /// The owning file.
        file: FileId,
    },

    /// A model file failed to parse.
    #[error("{file}: {rendered}")]
    Parse {
        /// The file that failed.
        file: FileId,
        /// The error rendered against the file's source.
        rendered: String,
        /// The parse error.
        #[source]
        error: ParseError,
    },

    /// A source provider could not supply a file.
    #[error("source error: {0}")]
    Source(String),

    /// Invalid configuration document.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Parse error for a file, rendered with a source excerpt.
    pub fn parse(file: FileId, error: ParseError, source: &str) -> Self {
        Error::Parse {
            file,
            rendered: error.format_with_source(source),
            error,
        }
    }
}

fn join_files(files: &[FileId]) -> String {
    files
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" -> ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_message() {
        let err = Error::DependencyCycle {
            files: vec![
                FileId::new("App", "Model", "A"),
                FileId::new("App", "Model", "B"),
            ],
        };
        assert_eq!(
            err.to_string(),
            "dependency cycle between files: App/Model/A -> App/Model/B"
        );
    }

    #[test]
    fn test_duplicate_class_names_both_files() {
        let err = Error::DuplicateClass {
            name: "Pays".to_string(),
            first: FileId::new("App", "Model", "Pays"),
            second: FileId::new("App", "Model", "Autre"),
        };
        let message = err.to_string();
        assert!(message.contains("App/Model/Pays"));
        assert!(message.contains("App/Model/Autre"));
    }
}
