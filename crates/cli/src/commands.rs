//! CLI commands

use anyhow::{Context as _, Result, anyhow, bail};
use clap::Subcommand;
use fawwerty_core::{AppConfig, FileStore, StateDir};
use fawwerty_http::RequestOptions;
use fawwerty_session::{AuthOutcome, SessionManager, StaticTokenProvider};
use reqwest::Method;
use serde_json::{Map, Value, json};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};

use crate::config;

/// Shared inputs for every command
pub struct Context {
    pub config: AppConfig,
    pub state_dir: StateDir,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Sign in with email and password
    Login {
        #[arg(long)]
        email: String,

        #[arg(long, env = "FAWWERTY_PASSWORD")]
        password: String,

        /// Two-factor code; prompted for on stdin when required and absent
        #[arg(long)]
        code: Option<String>,
    },

    /// Create an account
    Signup {
        #[arg(long)]
        email: String,

        #[arg(long, env = "FAWWERTY_PASSWORD")]
        password: String,

        #[arg(long)]
        name: Option<String>,

        /// Extra registration fields as key=value
        #[arg(long = "field", value_parser = parse_key_val)]
        fields: Vec<(String, String)>,
    },

    /// Request a password reset email
    ForgotPassword {
        #[arg(long)]
        email: String,
    },

    /// End the stored session
    Logout,

    /// Exchange the stored token for a fresh one
    Refresh,

    /// Show the stored session
    Whoami,

    /// Sign in with a Google access token
    GoogleLogin {
        #[arg(long, env = "FAWWERTY_GOOGLE_TOKEN")]
        access_token: String,
    },

    /// Create an account with a Google access token
    GoogleSignup {
        #[arg(long, env = "FAWWERTY_GOOGLE_TOKEN")]
        access_token: String,
    },

    /// Call an API endpoint with the stored session
    Request {
        /// HTTP method (GET, POST, PATCH, DELETE, ...)
        method: String,

        /// Endpoint relative to the API base URL, e.g. /admin/summary
        endpoint: String,

        /// JSON request body
        #[arg(long)]
        body: Option<String>,
    },

    /// Print the effective configuration
    Config,
}

impl Commands {
    pub async fn execute(self, ctx: Context) -> Result<()> {
        if let Self::Config = self {
            return print_json(&serde_json::to_value(&ctx.config)?);
        }

        let manager = open_session(&ctx)?;

        match self {
            Self::Login {
                email,
                password,
                code,
            } => {
                let outcome = manager.login(&email, &password).await;
                if !matches!(outcome, AuthOutcome::TwoFactorRequired) {
                    return finish(&outcome);
                }
                info!("Two-factor verification required");
                let code = match code {
                    Some(code) => code,
                    None => prompt("Two-factor code: ").await?,
                };
                finish(&manager.verify_2fa(&code).await)
            }
            Self::Signup {
                email,
                password,
                name,
                fields,
            } => {
                let user_data = registration_body(email, password, name, fields);
                finish(&manager.signup(&user_data).await)
            }
            Self::ForgotPassword { email } => finish(&manager.forgot_password(&email).await),
            Self::Logout => {
                manager.logout();
                print_json(&json!({ "success": true }))
            }
            Self::Refresh => finish(&manager.refresh_token().await),
            Self::Whoami => {
                let session = manager.session();
                print_json(&json!({
                    "state": session.state(),
                    "session": session,
                }))
            }
            Self::GoogleLogin { access_token } => {
                let manager = manager
                    .with_identity_provider(Arc::new(StaticTokenProvider::new(access_token)));
                finish(&manager.google_login().await)
            }
            Self::GoogleSignup { access_token } => {
                let manager = manager
                    .with_identity_provider(Arc::new(StaticTokenProvider::new(access_token)));
                finish(&manager.google_signup().await)
            }
            Self::Request {
                method,
                endpoint,
                body,
            } => {
                let options = request_options(&method, body.as_deref())?;
                debug!(%method, %endpoint, "Issuing request");
                let response: Value = manager
                    .api()
                    .request(&endpoint, options)
                    .await
                    .map_err(|e| anyhow!(e.message()))?;
                print_json(&response)
            }
            Self::Config => Ok(()),
        }
    }
}

fn open_session(ctx: &Context) -> Result<SessionManager> {
    let dir = config::session_dir(&ctx.config, &ctx.state_dir);
    let store = FileStore::open_in(&dir)
        .with_context(|| format!("Failed to open session store in {}", dir.display()))?;
    debug!(path = %store.path().display(), "Opened session store");
    Ok(SessionManager::from_config(&ctx.config, Arc::new(store))?)
}

/// Print the outcome and fail the command if it did not succeed
fn finish(outcome: &AuthOutcome) -> Result<()> {
    print_json(&outcome.to_json())?;
    match outcome.error() {
        Some(error) => bail!("{error}"),
        None => Ok(()),
    }
}

fn print_json(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn prompt(label: &str) -> Result<String> {
    eprint!("{label}");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let line = lines
        .next_line()
        .await?
        .ok_or_else(|| anyhow!("No input provided"))?;
    Ok(line.trim().to_string())
}

fn registration_body(
    email: String,
    password: String,
    name: Option<String>,
    fields: Vec<(String, String)>,
) -> Value {
    let mut body = Map::new();
    body.insert("email".into(), Value::String(email));
    body.insert("password".into(), Value::String(password));
    if let Some(name) = name {
        body.insert("name".into(), Value::String(name));
    }
    for (key, value) in fields {
        body.insert(key, Value::String(value));
    }
    Value::Object(body)
}

fn request_options(method: &str, body: Option<&str>) -> Result<RequestOptions> {
    let method = Method::from_bytes(method.to_ascii_uppercase().as_bytes())
        .with_context(|| format!("Invalid HTTP method: {method}"))?;
    let body = body
        .map(serde_json::from_str::<Value>)
        .transpose()
        .context("Request body is not valid JSON")?;

    Ok(match body {
        Some(body) => RequestOptions::with_body(method, body),
        None => RequestOptions {
            method,
            ..RequestOptions::default()
        },
    })
}

fn parse_key_val(s: &str) -> Result<(String, String)> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| anyhow!("Expected key=value, got `{s}`"))?;
    Ok((key.to_string(), value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registration_body_merges_fields() {
        let body = registration_body(
            "a@b.c".into(),
            "pw".into(),
            Some("Ada".into()),
            vec![("company".into(), "Acme".into())],
        );
        assert_eq!(
            body,
            json!({"email": "a@b.c", "password": "pw", "name": "Ada", "company": "Acme"})
        );
    }

    #[test]
    fn test_request_options() {
        let options = request_options("patch", Some(r#"{"status":"closed"}"#)).unwrap();
        assert_eq!(options.method, Method::PATCH);
        assert_eq!(options.body, Some(json!({"status": "closed"})));

        let options = request_options("GET", None).unwrap();
        assert_eq!(options.method, Method::GET);
        assert!(options.body.is_none());

        assert!(request_options("GET", Some("not json")).is_err());
        assert!(request_options("BAD METHOD", None).is_err());
    }

    #[test]
    fn test_parse_key_val() {
        assert_eq!(
            parse_key_val("role=client").unwrap(),
            ("role".to_string(), "client".to_string())
        );
        assert!(parse_key_val("role").is_err());
    }
}
