use serde_json::Value;
use std::sync::RwLock;

#[derive(Debug, Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// In-process session token slot, consulted per request and cleared when the
/// server answers 401.
#[derive(Debug, Default)]
pub struct SessionToken {
    token: RwLock<Option<String>>,
}

impl SessionToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<String> {
        self.token.read().ok().and_then(|t| t.clone())
    }

    pub fn set(&self, token: String) {
        if let Ok(mut slot) = self.token.write() {
            *slot = Some(token);
        }
    }

    pub fn clear(&self) {
        if let Ok(mut slot) = self.token.write() {
            *slot = None;
        }
    }
}

/// Probe a sign-in response for the session token.
pub fn extract_token(data: &Value) -> Option<String> {
    for key in ["token", "access_token"] {
        if let Some(t) = data.get(key).and_then(Value::as_str) {
            if !t.is_empty() {
                return Some(t.to_string());
            }
        }
    }
    data.get("data")
        .and_then(|d| d.get("token"))
        .and_then(Value::as_str)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}
