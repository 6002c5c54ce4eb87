//! Command execution.

use crate::config::Config;
use crate::Commands;
use bicfg_core::{lint, value_text, Activation, ConfigDocument, PassReport, Workspace};
use bicfg_storage::{load_workspace, read_export, read_export_verified, write_export};
use colored::Colorize;
use serde_json::Value;
use std::path::Path;

/// Executes a one-shot command and returns the formatted output.
pub fn execute(cmd: Commands, config: &Config) -> Result<String, Box<dyn std::error::Error>> {
    match cmd {
        Commands::Repl { .. } => Err("repl is interactive and cannot run as a one-shot command".into()),

        Commands::Sample { output } => {
            let doc = ConfigDocument::sample();
            match output {
                Some(path) => {
                    let meta = write_export(&path, &doc, config.output.pretty)?;
                    Ok(format!(
                        "{} sample to {} (checksum: {})",
                        "Wrote".green(),
                        path.display().to_string().cyan(),
                        meta.checksum
                    ))
                }
                None => Ok(doc.to_json_string(config.output.pretty)?),
            }
        }

        Commands::Check { file, checksum } => {
            let doc = match checksum {
                Some(expected) => read_export_verified(&file, &expected)?,
                None => read_export(&file)?,
            };
            let timestamp = doc.timestamp;
            let ws = Workspace::from_document(doc, config.workspace_config())?;

            let mut output = format!(
                "{} {}\n  exported:  {}\n  variables: {}\n  elements:  {}\n  events:    {}\n  states:    {}",
                "Configuration".bold(),
                file.display().to_string().cyan(),
                timestamp.to_rfc3339(),
                ws.variables().len(),
                ws.elements().len(),
                ws.events().len(),
                ws.states().len()
            );

            let issues = lint(&ws);
            if issues.is_empty() {
                output.push_str(&format!("\n{}", "No dangling references".green()));
            } else {
                output.push_str(&format!(
                    "\n{} ({})",
                    "Dangling references".yellow(),
                    issues.len()
                ));
                for issue in issues {
                    output.push_str(&format!("\n  - {}", issue));
                }
            }
            Ok(output)
        }

        Commands::Simulate { file, sets, output } => {
            let mut ws = load_workspace(&file, config.workspace_config())?;
            let mut out = String::new();

            for assignment in &sets {
                let (id, value) = parse_assignment(assignment)?;
                let outcome = ws.set_variable_input(id, value)?;
                let report = ws.run_pass();
                out.push_str(&format!(
                    "{} {} = {}{}\n{}\n",
                    "set".bold(),
                    id.cyan(),
                    value,
                    if outcome.changed {
                        String::new()
                    } else {
                        format!(" {}", "(unchanged)".dimmed())
                    },
                    format_report(&report)
                ));
            }

            if sets.is_empty() {
                out.push_str(&format_report(&ws.run_pass()));
                out.push('\n');
            }

            out.push_str(&format_elements(&ws));

            if let Some(path) = output {
                let meta = write_export(&path, &ws.export(), config.output.pretty)?;
                out.push_str(&format!(
                    "\n{} result to {} (checksum: {})",
                    "Wrote".green(),
                    path.display().to_string().cyan(),
                    meta.checksum
                ));
            }
            Ok(out)
        }

        Commands::Export { file, output } => {
            let ws = load_workspace(&file, config.workspace_config())?;
            export_to(&ws, &output, config.output.pretty)
        }
    }
}

/// Writes the workspace and reports the result.
pub fn export_to(
    ws: &Workspace,
    path: &Path,
    pretty: bool,
) -> Result<String, Box<dyn std::error::Error>> {
    let meta = write_export(path, &ws.export(), pretty)?;
    Ok(format!(
        "{} {} ({} variables, {} elements, {} events, {} states, {} bytes, checksum: {})",
        "Exported".green(),
        path.display().to_string().cyan(),
        meta.variables,
        meta.elements,
        meta.events,
        meta.states,
        meta.size_bytes,
        meta.checksum
    ))
}

/// Splits `id=value`. The value may itself contain `=`.
pub fn parse_assignment(s: &str) -> Result<(&str, &str), String> {
    match s.split_once('=') {
        Some((id, value)) if !id.trim().is_empty() => Ok((id.trim(), value)),
        _ => Err(format!("expected ID=VALUE, got '{}'", s)),
    }
}

/// Formats the states active in a pass.
pub fn format_report(report: &PassReport) -> String {
    if report.active.is_empty() {
        return format!("  {}", "no active states".dimmed());
    }

    let mut lines = Vec::new();
    for state in &report.active {
        let marker = match state.activation {
            Activation::Level => "active".green(),
            Activation::Edge => "changed".yellow(),
        };
        lines.push(format!(
            "  {} {} ({}, {} effect(s))",
            marker,
            state.name.bold(),
            state.state_id,
            state.effects.len()
        ));
    }
    if report.skipped > 0 {
        lines.push(format!(
            "  {}: {} effect(s) target missing elements",
            "Warning".yellow(),
            report.skipped
        ));
    }
    lines.join("\n")
}

/// Formats every element with its properties.
pub fn format_elements(ws: &Workspace) -> String {
    let mut out = format!("{}", "Elements".bold());
    for element in ws.elements().iter() {
        out.push_str(&format!(
            "\n  {} {} ({}, {})",
            element.icon,
            element.name,
            element.id.cyan(),
            element.kind
        ));
        for (key, value) in &element.properties {
            out.push_str(&format!("\n      {}: {}", key, display_value(value)));
        }
    }
    out
}

/// Formats every variable with type and current value.
pub fn format_variables<'a>(vars: impl Iterator<Item = &'a bicfg_core::Variable>) -> String {
    let mut lines = Vec::new();
    for var in vars {
        lines.push(format!(
            "  {} ({}, {}) = {}",
            var.id.cyan(),
            var.name,
            var.var_type,
            display_value(&var.current_value)
        ));
    }
    if lines.is_empty() {
        return "No variables".yellow().to_string();
    }
    lines.join("\n")
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => format!("{:?}", s),
        other => value_text(other),
    }
}
