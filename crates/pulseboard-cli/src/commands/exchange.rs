//! Token exchange commands.

use super::Client;
use crate::output::{self, OutputFormat};
use anyhow::{anyhow, Result};
use auth_engine::{failure_stage, ExchangeRequest, Provider, SessionAuthenticator, TokenExchange};
use serde::Serialize;
use std::fmt;
use tracing::info;

#[derive(Serialize)]
struct ExchangeReport {
    provider: Provider,
    token_len: usize,
}

impl fmt::Display for ExchangeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Exchange succeeded")?;
        writeln!(f, "{}", output::row("Provider", self.provider.as_str()))?;
        write!(f, "{}", output::row("Token length", &self.token_len.to_string()))
    }
}

#[derive(Serialize)]
struct RedeemReport {
    provider: Provider,
    user_id: String,
}

impl fmt::Display for RedeemReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Signed in")?;
        writeln!(f, "{}", output::row("Provider", self.provider.as_str()))?;
        write!(f, "{}", output::row("User ID", &self.user_id))
    }
}

/// Run one token exchange. The backend token itself is never printed.
pub async fn exchange(provider: Provider, access_token: &str, format: &OutputFormat) -> Result<()> {
    let client = Client::load()?;
    let exchange = client.token_exchange();

    let token = exchange
        .exchange(ExchangeRequest::new(access_token, provider))
        .await
        .map_err(|e| anyhow!("token exchange failed at {} stage: {}", failure_stage(&e), e))?;

    output::print(
        &ExchangeReport {
            provider,
            token_len: token.as_str().len(),
        },
        format,
    );
    Ok(())
}

/// Exchange and sign in, printing every published session change.
pub async fn redeem(provider: Provider, access_token: &str, format: &OutputFormat) -> Result<()> {
    let client = Client::load()?;
    let service = client.service();

    let event_format = *format;
    service.observe(move |user| output::print_session_event(user.as_deref(), &event_format));
    service.start();

    let token = client
        .token_exchange()
        .exchange(ExchangeRequest::new(access_token, provider))
        .await
        .map_err(|e| anyhow!("token exchange failed at {} stage: {}", failure_stage(&e), e))?;

    let user_id = SessionAuthenticator::new(client.backend.clone())
        .sign_in(&token)
        .await?;
    info!(provider = %provider, user_id = %user_id, "redeemed provider token");

    service.stop();
    output::print(&RedeemReport { provider, user_id }, format);
    Ok(())
}
