use anyhow::{Context, Result};
use serde::Deserialize;
use std::io::{self, Write};
use std::path::Path;

const ENV_FILE: &str = ".env";

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub api: ApiConfig,
    #[serde(default)]
    pub feed: FeedConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub members: MembersConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// Retry a 404/405 unlike as a like. Some deployments never grew an
    /// unlike route; turn this off if yours did.
    #[serde(default = "default_true")]
    pub unlike_like_fallback: bool,
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize, Clone)]
pub struct FeedConfig {
    /// Pause before each reconciling refresh, letting server-side counters
    /// catch up with the operation that just settled.
    #[serde(default = "default_sync_delay_ms")]
    pub sync_delay_ms: u64,
}

fn default_sync_delay_ms() -> u64 {
    150
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            sync_delay_ms: default_sync_delay_ms(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    #[serde(default = "default_state_path")]
    pub state_path: String,
}

fn default_state_path() -> String {
    "classfeed_state.json".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            state_path: default_state_path(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct MembersConfig {
    #[serde(default = "default_year")]
    pub default_year: i64,
}

fn default_year() -> i64 {
    2023
}

impl Default for MembersConfig {
    fn default() -> Self {
        Self {
            default_year: default_year(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Config =
            toml::from_str(&content).with_context(|| "Failed to parse config TOML")?;
        Ok(config)
    }

    /// Load .env file into process environment. Real env vars take precedence.
    pub fn load_env_file() {
        let path = Path::new(ENV_FILE);
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(_) => return,
        };
        // Strip BOM if present (common on Windows-created files)
        let content = content.strip_prefix('\u{feff}').unwrap_or(&content);
        for line in content.lines() {
            let line = line.trim().trim_matches('\r');
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if let Some((key, value)) = line.split_once('=') {
                let key = key.trim();
                let value = value.trim().trim_matches('"').trim_matches('\'');
                if std::env::var(key).is_err() {
                    std::env::set_var(key, value);
                }
            }
        }
    }

    /// The x-api-key value comes from the environment, or is prompted at
    /// startup and saved to .env for future runs.
    pub fn classroom_api_key() -> Result<String> {
        match std::env::var("CLASSFEED_API_KEY") {
            Ok(key) if !key.is_empty() => Ok(sanitize(&key)),
            _ => {
                let key = prompt("Classroom API key")?;
                save_env_var("CLASSFEED_API_KEY", &key);
                Ok(key)
            }
        }
    }

    /// Sign-in email, remembered across runs. The password is prompted every
    /// time and never written anywhere.
    pub fn sign_in_email() -> Result<String> {
        match std::env::var("CLASSFEED_EMAIL") {
            Ok(email) if !email.is_empty() => Ok(sanitize(&email)),
            _ => {
                let email = prompt("Email")?;
                save_env_var("CLASSFEED_EMAIL", &email);
                Ok(email)
            }
        }
    }

    pub fn sign_in_password() -> Result<String> {
        prompt("Password")
    }
}

fn prompt(label: &str) -> Result<String> {
    print!("  {} > ", label);
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    let value = input.trim().to_string();
    if value.is_empty() {
        anyhow::bail!("{} cannot be empty", label);
    }
    Ok(value)
}

/// Strip carriage returns, BOM, and other invisible chars from a pasted value.
fn sanitize(raw: &str) -> String {
    raw.replace(['\r', '\u{feff}', '\u{200b}'], "")
        .trim()
        .to_string()
}

/// Append a KEY=VALUE line to .env and set it in the current process.
fn save_env_var(key: &str, value: &str) {
    std::env::set_var(key, value);
    let path = Path::new(ENV_FILE);
    let mut contents = std::fs::read_to_string(path).unwrap_or_default();
    if !contents.is_empty() && !contents.ends_with('\n') {
        contents.push('\n');
    }
    contents.push_str(&format!("{}={}\n", key, value));
    let _ = std::fs::write(path, contents);
}
