// src/config.rs

//! Configuration and credential loading utilities.
//!
//! This module provides convenience functions for loading the TOML
//! configuration and for turning secret files into an API bearer token.

use std::path::Path;

use reqwest::Client;
use serde::Deserialize;
use url::Url;

use crate::error::{AppError, Result};
use crate::models::{Config, CredentialsConfig};

/// Token endpoint, relative to the API base URL.
const TOKEN_PATH: &str = "oauth2/token";

/// Load configuration from a TOML file and validate it.
///
/// A missing file yields the default configuration; an unreadable or
/// invalid one is an error.
pub fn load_config(path: &Path) -> Result<Config> {
    if path.is_dir() {
        return Err(AppError::config(format!(
            "{} is a directory, not a configuration file",
            path.display()
        )));
    }

    let config = if path.exists() {
        log::debug!("Loading configuration from {}", path.display());
        Config::load(path)?
    } else {
        log::warn!("No configuration at {}, using defaults", path.display());
        Config::default()
    };

    config.validate()?;
    Ok(config)
}

/// Read a secret file, trimming surrounding whitespace.
///
/// Returns `None` when the file is missing or blank.
pub fn read_secret(path: &Path) -> Result<Option<String>> {
    match std::fs::read_to_string(path) {
        Ok(raw) => {
            let secret = raw.trim();
            Ok((!secret.is_empty()).then(|| secret.to_string()))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(AppError::Io(e)),
    }
}

/// Obtain a bearer token for the timeline API.
///
/// A pre-issued token in the bearer token file wins. Otherwise the API key
/// and secret are exchanged for an app-only token.
pub async fn load_bearer_token(
    client: &Client,
    base_url: &str,
    credentials: &CredentialsConfig,
) -> Result<String> {
    if let Some(token) = read_secret(&credentials.bearer_token_file)? {
        log::debug!(
            "Using bearer token from {}",
            credentials.bearer_token_file.display()
        );
        return Ok(token);
    }

    let api_key = require_secret(&credentials.api_key_file, "API key")?;
    let api_secret = require_secret(&credentials.api_secret_file, "API secret")?;
    exchange_token(client, base_url, &api_key, &api_secret).await
}

fn require_secret(path: &Path, what: &str) -> Result<String> {
    read_secret(path)?.ok_or_else(|| {
        AppError::credentials(format!("{what} file {} is missing or empty", path.display()))
    })
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    token_type: String,
    access_token: String,
}

/// Exchange client credentials for an app-only bearer token.
pub async fn exchange_token(
    client: &Client,
    base_url: &str,
    api_key: &str,
    api_secret: &str,
) -> Result<String> {
    let url = Url::parse(base_url)?.join(TOKEN_PATH)?;
    log::debug!("Requesting bearer token from {}", url);

    let response = client
        .post(url)
        .basic_auth(api_key, Some(api_secret))
        .form(&[("grant_type", "client_credentials")])
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(AppError::credentials(format!(
            "token request failed ({}): {}",
            status.as_u16(),
            body.trim()
        )));
    }

    let token: TokenResponse = response.json().await?;
    if !token.token_type.eq_ignore_ascii_case("bearer") {
        return Err(AppError::credentials(format!(
            "unexpected token type '{}'",
            token.token_type
        )));
    }
    Ok(token.access_token)
}
