//! Command-line arguments.

use clap::{Args as ClapArgs, Parser, Subcommand};
use modelc_core::GeneratorConfig;
use std::path::PathBuf;

use crate::executor::CliError;
use crate::formatter::OutputFormat;

/// modelc - resolve and inspect model definitions
#[derive(Parser, Debug)]
#[command(name = "modelc")]
#[command(version, about = "Resolve and inspect model definitions", long_about = None)]
pub struct Args {
    /// Root directory of the model files (`<module>/<kind>/<name>.tmd`).
    #[arg(short, long, default_value = "./model")]
    pub root: PathBuf,

    /// Output format
    #[arg(long, default_value = "table", value_enum)]
    pub format: OutputFormat,

    #[command(flatten)]
    pub settings: Settings,

    #[command(subcommand)]
    pub command: Command,
}

/// Generator settings. Flags override the configuration file.
#[derive(ClapArgs, Debug, Default)]
pub struct Settings {
    /// JSON configuration file.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Application name (root namespace).
    #[arg(short, long)]
    pub app: Option<String>,

    /// Declared module; repeat for several. Files outside them are rejected.
    #[arg(short, long = "module")]
    pub modules: Vec<String>,

    /// Domain of generated identifiers.
    #[arg(long)]
    pub identifier_domain: Option<String>,

    /// Domain marking free-form alias fields.
    #[arg(long)]
    pub free_alias_domain: Option<String>,

    /// Target name of the persisted schema.
    #[arg(long)]
    pub persisted_target: Option<String>,

    /// Target name of the client side.
    #[arg(long)]
    pub client_target: Option<String>,
}

impl Settings {
    /// Build the generator configuration.
    pub fn into_config(self) -> Result<GeneratorConfig, CliError> {
        let mut config = match &self.config {
            Some(path) => GeneratorConfig::from_file(path)?,
            None => GeneratorConfig::default(),
        };

        if let Some(app) = self.app {
            config.app_name = Some(app);
        }
        for module in self.modules {
            config = config.with_module(module);
        }
        if let Some(domain) = self.identifier_domain {
            config = config.with_identifier_domain(domain);
        }
        if let Some(domain) = self.free_alias_domain {
            config = config.with_free_alias_domain(domain);
        }
        if let Some(target) = self.persisted_target {
            config = config.with_persisted_target(target);
        }
        if let Some(target) = self.client_target {
            config = config.with_client_target(target);
        }

        config.validate()?;
        Ok(config)
    }
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Resolve the model and report diagnostics.
    Check,
    /// List classes.
    Classes,
    /// Show the properties of a class with their projected types.
    Describe {
        /// Class name.
        class: String,
    },
    /// Show the literal rows of an enumeration or reference list.
    Rows {
        /// Class name.
        class: String,
    },
    /// List domains and their target mappings.
    Domains,
    /// Project a domain, or a `Class.Property`, to a target type.
    Project {
        /// Domain name or `Class.Property`.
        subject: String,
        /// Target name.
        #[arg(short, long)]
        target: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_describe() {
        let args = Args::parse_from(["modelc", "--app", "App", "--format", "json", "describe", "Pays"]);
        assert_eq!(args.format, OutputFormat::Json);
        assert_eq!(args.command, Command::Describe { class: "Pays".to_string() });
        assert_eq!(args.root, PathBuf::from("./model"));
    }

    #[test]
    fn test_flags_build_config() {
        let args = Args::parse_from([
            "modelc",
            "--app",
            "App",
            "-m",
            "Referentiel",
            "-m",
            "Facturation",
            "--client-target",
            "cs",
            "check",
        ]);
        let config = args.settings.into_config().unwrap();
        assert_eq!(config.app_name(), "App");
        assert_eq!(config.modules, vec!["Referentiel", "Facturation"]);
        assert_eq!(config.client_target, "cs");
        assert_eq!(config.persisted_target, "sql");
    }

    #[test]
    fn test_flags_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("modelc.json");
        std::fs::write(&path, r#"{ "app_name": "Fichier", "identifier_domain": "DO_CLE" }"#).unwrap();

        let settings = Settings {
            config: Some(path),
            app: Some("App".to_string()),
            ..Settings::default()
        };
        let config = settings.into_config().unwrap();
        assert_eq!(config.app_name(), "App");
        assert_eq!(config.identifier_domain, "DO_CLE");
    }

    #[test]
    fn test_missing_app_name() {
        let err = Settings::default().into_config().unwrap_err();
        assert!(err.to_string().contains("app_name"));
    }
}
