//! Configuration commands.

use crate::output::{self, OutputFormat};
use anyhow::{Context, Result};
use client_config_and_utils::{Config, Paths};
use serde::Serialize;
use std::fmt;

#[derive(Serialize)]
struct ConfigReport {
    config_file: String,
    project_id: String,
    functions_url: String,
    auth_base_url: String,
    kakao_url_scheme: String,
    naver_app_name: String,
    naver_url_scheme: String,
    log_level: String,
}

impl fmt::Display for ConfigReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Configuration OK")?;
        writeln!(f, "{}", output::row("File", &self.config_file))?;
        writeln!(f, "{}", output::row("Project", &self.project_id))?;
        writeln!(f, "{}", output::row("Functions", &self.functions_url))?;
        writeln!(f, "{}", output::row("Auth", &self.auth_base_url))?;
        writeln!(f, "{}", output::row("Kakao scheme", &self.kakao_url_scheme))?;
        writeln!(f, "{}", output::row("Naver app", &self.naver_app_name))?;
        writeln!(f, "{}", output::row("Naver scheme", &self.naver_url_scheme))?;
        write!(f, "{}", output::row("Log level", &self.log_level))
    }
}

/// Load and validate the configuration. Secrets are never printed.
pub fn config_check(format: &OutputFormat) -> Result<()> {
    let paths = Paths::new()?;
    let config_file = paths.config_file();
    let config = Config::load(&paths)
        .with_context(|| format!("invalid configuration in {}", config_file.display()))?;

    let report = ConfigReport {
        config_file: config_file.display().to_string(),
        project_id: config.backend.project_id.clone(),
        functions_url: config.backend.functions_url(),
        auth_base_url: config.backend.auth_base_url.clone(),
        kakao_url_scheme: config.kakao.url_scheme(),
        naver_app_name: config.naver.app_name.clone(),
        naver_url_scheme: config.naver.url_scheme.clone(),
        log_level: config.log_level.clone(),
    };
    output::print(&report, format);
    Ok(())
}
