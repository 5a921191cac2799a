//! Base config: Messenger platform connection, webhook server, logging, user store. Loaded from env.

use anyhow::{Context, Result};
use std::env;
use storage::UserStoreBackend;

/// Base config: platform credentials, HTTP port, logging and persistence only.
#[derive(Debug, Clone)]
pub struct BaseConfig {
    /// PORT
    pub port: u16,
    /// VERIFY_TOKEN; webhook verification always fails when empty
    pub verify_token: String,
    /// PAGE_ACCESS_TOKEN
    pub page_access_token: String,
    /// APP_SECRET; enables the `X-Hub-Signature-256` check when set
    pub app_secret: Option<String>,
    /// PAGE_ID; events sent by the page itself are ignored
    pub page_id: Option<String>,
    /// GRAPH_API_URL
    pub graph_api_url: String,
    /// Log file path
    pub log_file: String,
    /// USER_DB_TYPE: `json` | `sqlite` | `memory`
    pub user_db_type: String,
    /// USER_DB_PATH (json backend)
    pub user_db_path: String,
    /// SQLITE_PATH (sqlite backend)
    pub sqlite_path: String,
}

fn non_empty(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

impl BaseConfig {
    /// Load from environment variables. `port` overrides PORT if provided.
    pub fn load(port: Option<u16>) -> Result<Self> {
        let page_access_token =
            non_empty("PAGE_ACCESS_TOKEN").context("PAGE_ACCESS_TOKEN not set")?;
        let port = match port {
            Some(p) => p,
            None => match non_empty("PORT") {
                Some(raw) => raw
                    .trim()
                    .parse()
                    .with_context(|| format!("PORT is not a valid port number: {}", raw))?,
                None => 3000,
            },
        };
        let verify_token = env::var("VERIFY_TOKEN").unwrap_or_default();
        let app_secret = non_empty("APP_SECRET");
        let page_id = non_empty("PAGE_ID");
        let graph_api_url = non_empty("GRAPH_API_URL")
            .unwrap_or_else(|| "https://graph.facebook.com/v19.0".to_string());
        let log_file =
            non_empty("LOG_FILE").unwrap_or_else(|| "logs/messenger-bot.log".to_string());
        let user_db_type = non_empty("USER_DB_TYPE").unwrap_or_else(|| "json".to_string());
        let user_db_path =
            non_empty("USER_DB_PATH").unwrap_or_else(|| "./data/users.json".to_string());
        let sqlite_path =
            non_empty("SQLITE_PATH").unwrap_or_else(|| "./data/users.sqlite".to_string());

        Ok(Self {
            port,
            verify_token,
            page_access_token,
            app_secret,
            page_id,
            graph_api_url,
            log_file,
            user_db_type,
            user_db_path,
            sqlite_path,
        })
    }

    /// Validate config (GRAPH_API_URL must be a valid URL, USER_DB_TYPE a known backend).
    pub fn validate(&self) -> Result<()> {
        if reqwest::Url::parse(&self.graph_api_url).is_err() {
            anyhow::bail!("GRAPH_API_URL is not a valid URL: {}", self.graph_api_url);
        }
        self.user_store_backend()?;
        Ok(())
    }

    pub fn user_store_backend(&self) -> Result<UserStoreBackend> {
        self.user_db_type
            .parse()
            .with_context(|| format!("USER_DB_TYPE is not supported: {}", self.user_db_type))
    }
}
