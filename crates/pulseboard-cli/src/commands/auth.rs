//! Session commands.

use super::Client;
use crate::output::{self, OutputFormat};
use anyhow::Result;
use auth_engine::backend::StartupValidation;
use auth_engine::AuthErrorKind;
use serde::Serialize;
use std::fmt;
use std::io::{self, Write};

#[derive(Serialize)]
struct StatusReport {
    logged_in: bool,
    user_id: Option<String>,
    provider_id: Option<String>,
    expires_at: Option<String>,
    /// `None` unless `--validate` was given.
    validated: Option<bool>,
}

impl fmt::Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.logged_in {
            return write!(f, "{}", output::row("Auth", "not logged in"));
        }
        writeln!(f, "{}", output::row("Auth", "logged in"))?;
        writeln!(
            f,
            "{}",
            output::row("User ID", self.user_id.as_deref().unwrap_or("unknown"))
        )?;
        writeln!(
            f,
            "{}",
            output::row("Provider", self.provider_id.as_deref().unwrap_or("unknown"))
        )?;
        write!(
            f,
            "{}",
            output::row("Expires", self.expires_at.as_deref().unwrap_or("unknown"))
        )?;
        if let Some(validated) = self.validated {
            let state = if validated { "valid" } else { "unreachable" };
            write!(f, "\n{}", output::row("Backend", state))?;
        }
        Ok(())
    }
}

/// Show the stored session, optionally confirming it with the backend.
pub async fn status(validate: bool, format: &OutputFormat) -> Result<()> {
    let client = Client::load()?;

    let validated = if validate {
        match client.backend.validate_session_on_startup().await {
            Ok(StartupValidation::Valid(_)) => Some(true),
            Ok(StartupValidation::NoSession) => None,
            // Offline: the stored session is kept but not confirmed.
            Err(e) if e.kind() == AuthErrorKind::Network => Some(false),
            Err(e) => return Err(e.into()),
        }
    } else {
        None
    };

    let session = client.backend.state().session();
    let report = StatusReport {
        logged_in: session.is_some(),
        user_id: session.as_ref().map(|s| s.user_id.clone()),
        provider_id: session.as_ref().and_then(|s| s.provider_id.clone()),
        expires_at: session.as_ref().map(|s| s.expires_at.to_rfc3339()),
        validated,
    };
    output::print(&report, format);
    Ok(())
}

/// Logout and clear session.
pub fn logout(format: &OutputFormat) -> Result<()> {
    let client = Client::load()?;
    let service = client.service();

    if service.current_user().is_none() {
        output::print_success("Not logged in", format);
        return Ok(());
    }

    service.logout()?;
    output::print_success("Logged out successfully", format);
    Ok(())
}

/// Delete the signed-in account after confirmation.
pub async fn delete_account(yes: bool, format: &OutputFormat) -> Result<()> {
    let client = Client::load()?;
    let service = client.service();

    let user_id = match service.current_user() {
        Some(user_id) => user_id,
        None => {
            output::print_error("Not logged in", format);
            return Ok(());
        }
    };

    if !yes && !confirm(&format!("Permanently delete account {}?", user_id)) {
        output::print_success("Cancelled", format);
        return Ok(());
    }

    service.delete_account().await?;
    output::print_success(&format!("Deleted account {}", user_id), format);
    Ok(())
}

/// Ask user for confirmation.
fn confirm(prompt: &str) -> bool {
    print!("{} [y/N] ", prompt);
    io::stdout().flush().ok();

    let mut input = String::new();
    if io::stdin().read_line(&mut input).is_err() {
        return false;
    }

    matches!(input.trim().to_lowercase().as_str(), "y" | "yes")
}
