//! Output formatters for model inspection.

use clap::ValueEnum;
use comfy_table::{Cell, Table};
use modelc_core::{Class, Diagnostic, ResolvedModel};
use serde_json::json;

/// Output format for results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// ASCII table format
    Table,
    /// JSON format
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// One property of a described class, with its projected types.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyLine {
    pub name: String,
    pub kind: &'static str,
    pub domain: Option<String>,
    pub persisted_name: Option<String>,
    /// `None` for properties without a column.
    pub persisted_type: Option<String>,
    pub client_type: Option<String>,
    /// Referenced or composed class.
    pub target: Option<String>,
    pub primary_key: bool,
    pub required: bool,
}

/// Trait for formatting output.
pub trait Formatter: Send + Sync {
    /// Format diagnostics in discovery order.
    fn format_diagnostics(&self, diagnostics: &[Diagnostic]) -> String;

    /// Format the class list of a model.
    fn format_classes(&self, model: &ResolvedModel) -> String;

    /// Format the properties of one class.
    fn format_properties(&self, class: &str, properties: &[PropertyLine]) -> String;

    /// Format the literal rows of a class.
    fn format_rows(&self, class: &Class) -> String;

    /// Format the domains of a model.
    fn format_domains(&self, model: &ResolvedModel) -> String;

    /// Format a single projection result.
    fn format_projection(&self, subject: &str, target: &str, ty: &str) -> String;

    /// Format an error message.
    fn format_error(&self, error: &str) -> String;
}

/// Create a formatter for the given output format.
pub fn create_formatter(format: OutputFormat) -> Box<dyn Formatter> {
    match format {
        OutputFormat::Table => Box::new(TableFormatter),
        OutputFormat::Json => Box::new(JsonFormatter),
    }
}

fn or_dash(value: Option<&str>) -> String {
    value.unwrap_or("-").to_string()
}

/// Table formatter using comfy-table.
pub struct TableFormatter;

impl Formatter for TableFormatter {
    fn format_diagnostics(&self, diagnostics: &[Diagnostic]) -> String {
        if diagnostics.is_empty() {
            return "No problems found".to_string();
        }

        let mut table = Table::new();
        table.set_header(vec!["Severity", "Kind", "Location", "Class", "Field", "Message"]);

        for diagnostic in diagnostics {
            let location = match &diagnostic.location {
                Some(loc) => format!("{}:{}:{}", diagnostic.file, loc.line, loc.column),
                None => diagnostic.file.to_string(),
            };
            table.add_row(vec![
                Cell::new(diagnostic.severity),
                Cell::new(diagnostic.kind),
                Cell::new(location),
                Cell::new(or_dash(diagnostic.class.as_deref())),
                Cell::new(or_dash(diagnostic.field.as_deref())),
                Cell::new(&diagnostic.message),
            ]);
        }

        let errors = diagnostics.iter().filter(|d| d.is_error()).count();
        format!(
            "{}\n{} error(s), {} warning(s)",
            table,
            errors,
            diagnostics.len() - errors
        )
    }

    fn format_classes(&self, model: &ResolvedModel) -> String {
        let mut table = Table::new();
        table.set_header(vec!["Class", "Stereotype", "File", "Primary key", "Properties", "Rows"]);

        for class in model.classes() {
            let key = model.primary_key(class).map(|p| p.name());
            table.add_row(vec![
                Cell::new(&class.name),
                Cell::new(class.stereotype),
                Cell::new(&class.file),
                Cell::new(or_dash(key)),
                Cell::new(class.properties.len()),
                Cell::new(class.rows.len()),
            ]);
        }

        format!("{}\nmodel version {}", table, model.version())
    }

    fn format_properties(&self, class: &str, properties: &[PropertyLine]) -> String {
        let mut table = Table::new();
        table.set_header(vec![
            "Property", "Kind", "Domain", "Column", "Persisted", "Client", "Target", "Flags",
        ]);

        for line in properties {
            let mut flags = Vec::new();
            if line.primary_key {
                flags.push("pk");
            }
            if line.required {
                flags.push("required");
            }
            table.add_row(vec![
                Cell::new(&line.name),
                Cell::new(line.kind),
                Cell::new(or_dash(line.domain.as_deref())),
                Cell::new(or_dash(line.persisted_name.as_deref())),
                Cell::new(or_dash(line.persisted_type.as_deref())),
                Cell::new(or_dash(line.client_type.as_deref())),
                Cell::new(or_dash(line.target.as_deref())),
                Cell::new(flags.join(" ")),
            ]);
        }

        format!("{}\n{}", class, table)
    }

    fn format_rows(&self, class: &Class) -> String {
        if class.rows.is_empty() {
            return format!("{} has no rows", class.name);
        }

        let columns: Vec<&str> = class.persisted_properties().map(|p| p.name()).collect();
        let mut header = vec!["Row"];
        header.extend(columns.iter().copied());

        let mut table = Table::new();
        table.set_header(header);
        for row in &class.rows {
            let mut cells = vec![Cell::new(&row.name)];
            cells.extend(columns.iter().map(|column| match row.get(column) {
                Some(value) => Cell::new(value),
                None => Cell::new(""),
            }));
            table.add_row(cells);
        }

        table.to_string()
    }

    fn format_domains(&self, model: &ResolvedModel) -> String {
        let mut table = Table::new();
        table.set_header(vec!["Domain", "Length", "Scale", "Mappings"]);

        for domain in model.domains() {
            let mappings: Vec<String> = domain
                .mappings
                .iter()
                .map(|(target, ty)| format!("{}={}", target, ty))
                .collect();
            table.add_row(vec![
                Cell::new(&domain.name),
                Cell::new(domain.length.map(|l| l.to_string()).unwrap_or_default()),
                Cell::new(domain.scale.map(|s| s.to_string()).unwrap_or_default()),
                Cell::new(mappings.join(", ")),
            ]);
        }

        table.to_string()
    }

    fn format_projection(&self, subject: &str, target: &str, ty: &str) -> String {
        format!("{} [{}] = {}", subject, target, ty)
    }

    fn format_error(&self, error: &str) -> String {
        format!("Error: {}", error)
    }
}

/// JSON formatter.
pub struct JsonFormatter;

impl JsonFormatter {
    fn render(value: &impl serde::Serialize) -> String {
        serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
    }
}

impl Formatter for JsonFormatter {
    fn format_diagnostics(&self, diagnostics: &[Diagnostic]) -> String {
        Self::render(&diagnostics)
    }

    fn format_classes(&self, model: &ResolvedModel) -> String {
        Self::render(&model.view())
    }

    fn format_properties(&self, class: &str, properties: &[PropertyLine]) -> String {
        let lines: Vec<serde_json::Value> = properties
            .iter()
            .map(|line| {
                json!({
                    "name": line.name,
                    "kind": line.kind,
                    "domain": line.domain,
                    "persisted_name": line.persisted_name,
                    "persisted_type": line.persisted_type,
                    "client_type": line.client_type,
                    "target": line.target,
                    "primary_key": line.primary_key,
                    "required": line.required,
                })
            })
            .collect();
        Self::render(&json!({ "class": class, "properties": lines }))
    }

    fn format_rows(&self, class: &Class) -> String {
        Self::render(&json!({ "class": class.name, "rows": class.rows }))
    }

    fn format_domains(&self, model: &ResolvedModel) -> String {
        let domains: Vec<_> = model.domains().collect();
        Self::render(&domains)
    }

    fn format_projection(&self, subject: &str, target: &str, ty: &str) -> String {
        json!({ "subject": subject, "target": target, "type": ty }).to_string()
    }

    fn format_error(&self, error: &str) -> String {
        json!({ "error": error }).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use modelc_core::{DiagnosticKind, FileId};

    fn diagnostics() -> Vec<Diagnostic> {
        vec![
            Diagnostic::new(
                DiagnosticKind::MissingPrimaryKey,
                FileId::new("App", "Model", "Pays"),
                "class 'Pays' has no primary key",
            )
            .with_class("Pays"),
            Diagnostic::new(
                DiagnosticKind::UnmappedDomain,
                FileId::new("App", "Model", "Pays"),
                "domain 'DO_BLOB' of 'Pays.Drapeau' has no 'sql' mapping",
            )
            .with_class("Pays")
            .with_field("Drapeau"),
        ]
    }

    #[test]
    fn test_table_diagnostics_summary() {
        let output = TableFormatter.format_diagnostics(&diagnostics());
        assert!(output.contains("MissingPrimaryKey"));
        assert!(output.ends_with("1 error(s), 1 warning(s)"));
        assert_eq!(TableFormatter.format_diagnostics(&[]), "No problems found");
    }

    #[test]
    fn test_json_diagnostics() {
        let output = JsonFormatter.format_diagnostics(&diagnostics());
        let json: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(json[0]["kind"], "MissingPrimaryKey");
        assert_eq!(json[1]["severity"], "warning");
        assert_eq!(json[1]["field"], "Drapeau");
        assert!(json[0].get("field").is_none());
    }

    #[test]
    fn test_projection_output() {
        assert_eq!(
            TableFormatter.format_projection("DO_CODE", "ts", "string"),
            "DO_CODE [ts] = string"
        );
        let json: serde_json::Value =
            serde_json::from_str(&JsonFormatter.format_projection("DO_CODE", "ts", "string")).unwrap();
        assert_eq!(json["type"], "string");
    }

    #[test]
    fn test_error_output() {
        assert_eq!(TableFormatter.format_error("boom"), "Error: boom");
        assert_eq!(JsonFormatter.format_error("boom"), r#"{"error":"boom"}"#);
    }
}
