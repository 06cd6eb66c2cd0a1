//! Output formatting for the CLI.

use clap::ValueEnum;
use serde::Serialize;
use serde_json::json;

/// Output format.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Print output in the specified format.
pub fn print<T: Serialize + std::fmt::Display>(value: &T, format: &OutputFormat) {
    match format {
        OutputFormat::Text => println!("{}", value),
        OutputFormat::Json => match serde_json::to_string_pretty(value) {
            Ok(json) => println!("{}", json),
            Err(_) => println!("{}", value),
        },
    }
}

/// Print a success message.
pub fn print_success(message: &str, format: &OutputFormat) {
    match format {
        OutputFormat::Text => println!("{}", message),
        OutputFormat::Json => {
            println!("{}", json!({ "status": "success", "message": message }));
        }
    }
}

/// Print an error message.
pub fn print_error(message: &str, format: &OutputFormat) {
    match format {
        OutputFormat::Text => eprintln!("Error: {}", message),
        OutputFormat::Json => {
            eprintln!("{}", json!({ "status": "error", "message": message }));
        }
    }
}

/// Print a session change as it is published.
pub fn print_session_event(user_id: Option<&str>, format: &OutputFormat) {
    match format {
        OutputFormat::Text => match user_id {
            Some(user_id) => println!("Session:  signed in as {}", user_id),
            None => println!("Session:  signed out"),
        },
        OutputFormat::Json => {
            println!("{}", json!({ "event": "session", "user_id": user_id }));
        }
    }
}

/// Format a labelled row.
pub fn row(label: &str, value: &str) -> String {
    format!("{:<16} {}", format!("{}:", label), value)
}
