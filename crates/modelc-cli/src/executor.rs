//! Command execution against a resolved model.

use crate::args::Command;
use crate::formatter::{Formatter, PropertyLine};
use modelc_core::{ModelStore, ProjectionError, Property, ReloadOutcome, ResolvedModel};
use thiserror::Error;

/// Execution errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// Fatal resolution or configuration error.
    #[error("{0}")]
    Core(#[from] modelc_core::Error),

    /// The model has error diagnostics and nothing was published.
    #[error("model has {errors} error(s)")]
    Rejected { errors: usize },

    #[error("unknown class '{0}'")]
    UnknownClass(String),

    #[error("{0}")]
    Projection(#[from] ProjectionError),
}

/// Output of a command and whether it succeeded.
#[derive(Debug)]
pub struct Output {
    pub text: String,
    pub success: bool,
}

impl Output {
    fn ok(text: String) -> Self {
        Self { text, success: true }
    }
}

/// Resolve the model of `store` and run `command` on it.
pub fn execute(
    store: &ModelStore,
    command: &Command,
    formatter: &dyn Formatter,
) -> Result<Output, CliError> {
    let outcome = store.reload()?;

    if *command == Command::Check {
        let diagnostics = store.diagnostics().into_vec();
        return Ok(Output {
            text: formatter.format_diagnostics(&diagnostics),
            success: matches!(outcome, ReloadOutcome::Published { .. }),
        });
    }

    let model = match (outcome, store.current()) {
        (ReloadOutcome::Published { .. }, Some(model)) => model,
        (ReloadOutcome::Rejected { errors }, _) => {
            eprintln!("{}", formatter.format_diagnostics(&store.diagnostics().into_vec()));
            return Err(CliError::Rejected { errors });
        }
        (ReloadOutcome::Published { .. }, None) => return Err(CliError::Rejected { errors: 0 }),
    };

    run_query(&model, command, formatter).map(Output::ok)
}

/// Run a read-only command on a published model.
pub fn run_query(
    model: &ResolvedModel,
    command: &Command,
    formatter: &dyn Formatter,
) -> Result<String, CliError> {
    match command {
        Command::Check => Ok(formatter.format_diagnostics(model.warnings())),
        Command::Classes => Ok(formatter.format_classes(model)),
        Command::Describe { class } => {
            let found = model
                .class_by_name(class)
                .ok_or_else(|| CliError::UnknownClass(class.clone()))?;
            let lines: Vec<PropertyLine> = found
                .properties
                .iter()
                .map(|property| describe_property(model, &found.name, property))
                .collect();
            Ok(formatter.format_properties(&found.name, &lines))
        }
        Command::Rows { class } => {
            let found = model
                .class_by_name(class)
                .ok_or_else(|| CliError::UnknownClass(class.clone()))?;
            Ok(formatter.format_rows(found))
        }
        Command::Domains => Ok(formatter.format_domains(model)),
        Command::Project { subject, target } => {
            let ty = match subject.split_once('.') {
                Some((class, property)) => model.project_property(class, property, target)?,
                None => model.project(subject, target)?,
            };
            Ok(formatter.format_projection(subject, target, &ty))
        }
    }
}

fn describe_property(model: &ResolvedModel, class: &str, property: &Property) -> PropertyLine {
    let config = model.config();
    let projected = |target: &str| match model.project_property(class, property.name(), target) {
        Ok(ty) => Some(ty),
        Err(ProjectionError::NotPersisted { .. }) => None,
        Err(e) => Some(format!("<{}>", e)),
    };

    let target = match property {
        Property::Composition(composition) => Some(composition.target.clone()),
        _ => property.linked_class().map(str::to_string),
    };

    PropertyLine {
        name: property.name().to_string(),
        kind: property_kind(property),
        domain: property.domain().map(str::to_string),
        persisted_name: property.persisted_name().map(str::to_string),
        persisted_type: projected(&config.persisted_target),
        client_type: projected(&config.client_target),
        target,
        primary_key: property.is_primary_key(),
        required: property.is_required(),
    }
}

fn property_kind(property: &Property) -> &'static str {
    match property {
        Property::Field(_) => "field",
        Property::Association(_) => "ref",
        Property::Composition(_) => "compose",
        Property::Alias(_) => "alias",
    }
}
