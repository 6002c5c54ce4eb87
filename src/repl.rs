//! Interactive test mode.

use crate::commands::{export_to, format_elements, format_report, format_variables};
use crate::config::Config;
use bicfg_core::{lint, ConfigDocument, Workspace};
use bicfg_storage::load_workspace;
use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::Editor;
use serde_json::Value;
use std::path::{Path, PathBuf};

const HELP_TEXT: &str = r#"
Available commands:
  help                             Show this help
  vars [term]                      List variables (optionally filtered by name)
  elements                         List elements and their properties
  states                           List states and their conditions
  events                           List events

  set <id> <value>                 Set a variable (value parsed per its type)
  eval                             Run an evaluation pass and apply effects
  fire <element> <event> [value]   Dispatch an element event
  reset                            Restore all variables to their defaults

  lint                             Report dangling references
  export <path>                    Write the configuration to a file

  quit, exit                       Exit the REPL
"#;

pub fn run(file: Option<PathBuf>, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", "bicfg test mode".bold().cyan());

    let mut ws = match &file {
        Some(path) => {
            let ws = load_workspace(path, config.workspace_config())?;
            println!("Loaded {}", path.display());
            ws
        }
        None => {
            println!("No file given, starting from the sample configuration");
            Workspace::from_document(ConfigDocument::sample(), config.workspace_config())?
        }
    };

    // Create readline editor
    let rl_config = rustyline::Config::builder()
        .history_ignore_space(true)
        .auto_add_history(true)
        .build();
    let mut rl: Editor<(), DefaultHistory> = Editor::with_config(rl_config)?;

    let history_path = config.repl.history_path();
    let _ = rl.load_history(&history_path);

    println!("Type 'help' for available commands.\n");

    loop {
        let prompt = format!("{} ", "bicfg>".cyan());
        match rl.readline(&prompt) {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                match execute_repl_command(&mut ws, line, config) {
                    Ok(Some(output)) => println!("{}\n", output),
                    Ok(None) => break, // Exit command
                    Err(e) => println!("{}: {}\n", "Error".red(), e),
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("^D");
                break;
            }
            Err(err) => {
                println!("{}: {:?}", "Error".red(), err);
                break;
            }
        }
    }

    let _ = rl.save_history(&history_path);
    Ok(())
}

fn execute_repl_command(
    ws: &mut Workspace,
    line: &str,
    config: &Config,
) -> Result<Option<String>, Box<dyn std::error::Error>> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.is_empty() {
        return Ok(Some(String::new()));
    }

    let cmd = parts[0].to_lowercase();
    let args = &parts[1..];

    match cmd.as_str() {
        "help" | "?" => Ok(Some(HELP_TEXT.to_string())),

        "quit" | "exit" | "q" => Ok(None),

        "vars" | "variables" => {
            let term = args.join(" ");
            Ok(Some(format_variables(
                ws.variables().search(&term).into_iter(),
            )))
        }

        "elements" | "els" => Ok(Some(format_elements(ws))),

        "states" => {
            if ws.states().is_empty() {
                return Ok(Some("No states".yellow().to_string()));
            }
            let lines: Vec<String> = ws
                .states()
                .iter()
                .map(|s| {
                    format!(
                        "  {} ({}) when {} -> {} effect(s)",
                        s.name.bold(),
                        s.id.cyan(),
                        s.condition,
                        s.effects.len()
                    )
                })
                .collect();
            Ok(Some(lines.join("\n")))
        }

        "events" => {
            if ws.events().is_empty() {
                return Ok(Some("No events".yellow().to_string()));
            }
            let lines: Vec<String> = ws
                .events()
                .iter()
                .map(|e| {
                    format!(
                        "  {} ({}) {} -> {} {}",
                        e.name.bold(),
                        e.id.cyan(),
                        e.trigger,
                        e.action,
                        e.target
                    )
                })
                .collect();
            Ok(Some(lines.join("\n")))
        }

        "set" => {
            if args.len() < 2 {
                return Ok(Some("Usage: set <id> <value>".to_string()));
            }
            // Re-slice the raw line so values keep their inner spacing.
            let value = raw_tail(line, 2);
            let outcome = ws.set_variable_input(args[0], value)?;
            Ok(Some(if outcome.changed {
                format!("{} {}", "Changed".green(), args[0].cyan())
            } else {
                format!("{} {}", "Unchanged".dimmed(), args[0].cyan())
            }))
        }

        "eval" | "pass" => {
            let report = ws.run_pass();
            Ok(Some(format_report(&report)))
        }

        "fire" => {
            if args.len() < 2 {
                return Ok(Some("Usage: fire <element> <event> [value]".to_string()));
            }
            let payload = if args.len() > 2 {
                Value::String(raw_tail(line, 3).to_string())
            } else {
                Value::Null
            };
            let changed = ws.fire_event(args[0], args[1], payload);
            if changed.is_empty() {
                Ok(Some("No variables changed".dimmed().to_string()))
            } else {
                Ok(Some(format!("{} {}", "Changed".green(), changed.join(", "))))
            }
        }

        "reset" => {
            let changed = ws.reset_variables();
            Ok(Some(format!("Reset {} variable(s)", changed.len())))
        }

        "lint" => {
            let issues = lint(ws);
            if issues.is_empty() {
                return Ok(Some("No dangling references".green().to_string()));
            }
            let lines: Vec<String> = issues.iter().map(|i| format!("  - {}", i)).collect();
            Ok(Some(lines.join("\n")))
        }

        "export" => {
            if args.is_empty() {
                return Ok(Some("Usage: export <path>".to_string()));
            }
            Ok(Some(export_to(ws, Path::new(args[0]), config.output.pretty)?))
        }

        _ => Ok(Some(format!(
            "Unknown command: {}. Type 'help' for available commands.",
            cmd
        ))),
    }
}

/// Returns the text after the first `skip` whitespace-separated words.
fn raw_tail(line: &str, skip: usize) -> &str {
    let mut rest = line.trim_start();
    for _ in 0..skip {
        rest = rest.trim_start();
        match rest.find(char::is_whitespace) {
            Some(i) => rest = &rest[i..],
            None => return "",
        }
    }
    rest.trim()
}
