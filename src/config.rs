//! Engine configuration parsed from environment variables.

use std::str::FromStr;

use money::{Locale, PrettyOptions};

use crate::error::ErrorCode;
use crate::path::Path;

pub const DEFAULT_FETCH_FLAG: &str = "transient.doFetch";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid {var}: {message}")]
    Parse { var: &'static str, message: String },
}

impl ErrorCode for ConfigError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Parse { .. } => "E_CONFIG_PARSE",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EngineConfig {
    /// Store path of the fetch-readiness flag.
    pub fetch_flag: Path,
    /// Whether url and image fields get the https check by default.
    pub require_https: bool,
    /// Currency given to a monetary field edited from empty.
    pub default_currency: Option<String>,
    pub locale: Locale,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            fetch_flag: Path::new(["transient", "doFetch"]),
            require_https: true,
            default_currency: None,
            locale: Locale::default(),
        }
    }
}

impl EngineConfig {
    /// Build typed engine config from environment variables.
    ///
    /// Optional:
    /// - `PROPCONTROL_FETCH_FLAG`: dotted store path, default `transient.doFetch`
    /// - `PROPCONTROL_REQUIRE_HTTPS`: `true` (default) or `false`
    /// - `PROPCONTROL_DEFAULT_CURRENCY`: three-letter code, unset by default
    /// - `PROPCONTROL_LOCALE`: `en-GB` (default), `en-US`, `de-DE`, `fr-FR`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Parse` naming the first variable that does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// [`EngineConfig::from_env`] over an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// See [`EngineConfig::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let fetch_flag = lookup("PROPCONTROL_FETCH_FLAG").unwrap_or_else(|| DEFAULT_FETCH_FLAG.to_owned());
        let fetch_flag = Path::from_dotted(fetch_flag.trim())
            .ok()
            .filter(|p| !p.is_empty())
            .ok_or_else(|| parse_error("PROPCONTROL_FETCH_FLAG", format!("bad path '{fetch_flag}'")))?;

        let require_https = match lookup("PROPCONTROL_REQUIRE_HTTPS") {
            Some(raw) => parse_bool("PROPCONTROL_REQUIRE_HTTPS", &raw)?,
            None => true,
        };

        let default_currency = lookup("PROPCONTROL_DEFAULT_CURRENCY")
            .map(|raw| parse_currency(&raw))
            .transpose()?
            .flatten();

        let locale = match lookup("PROPCONTROL_LOCALE") {
            Some(raw) => Locale::from_str(&raw).map_err(|err| parse_error("PROPCONTROL_LOCALE", err.to_string()))?,
            None => Locale::default(),
        };

        Ok(Self {
            fetch_flag,
            require_https,
            default_currency,
            locale,
        })
    }

    /// Formatting options for monetary display in this locale.
    #[must_use]
    pub fn pretty_options(&self) -> PrettyOptions {
        PrettyOptions {
            locale: self.locale,
            ..PrettyOptions::default()
        }
    }
}

fn parse_error(var: &'static str, message: String) -> ConfigError {
    tracing::error!(var, %message, "bad engine config");
    ConfigError::Parse { var, message }
}

fn parse_bool(var: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        other => Err(parse_error(var, format!("expected true or false, got '{other}'"))),
    }
}

/// Blank means unset; anything else must be a three-letter code.
fn parse_currency(raw: &str) -> Result<Option<String>, ConfigError> {
    let code = raw.trim();
    if code.is_empty() {
        return Ok(None);
    }
    if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(parse_error(
            "PROPCONTROL_DEFAULT_CURRENCY",
            format!("expected a three-letter code, got '{code}'"),
        ));
    }
    Ok(Some(code.to_ascii_uppercase()))
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
