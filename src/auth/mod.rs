//! Credentials captured by the browser login flow.
//!
//! The login helper stores a browser storage-state file: the session cookies
//! plus each origin's `localStorage`. Brightspace keeps its API tokens in a
//! `D2L.Fetch.Tokens` entry whose value is itself a JSON object keyed by
//! scope, so the token is found by walking the document rather than through a
//! fixed schema.

use std::path::Path;

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::error::{CmsError, Result};

const TOKEN_STORE_KEY: &str = "D2L.Fetch.Tokens";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StoredCookie {
    pub name: String,
    pub value: String,
    pub domain: String,
}

#[derive(Debug, Clone)]
pub struct Credentials {
    pub cookies: Vec<StoredCookie>,
    pub token: String,
}

impl Credentials {
    pub fn load(path: &Path, host: Option<&str>) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            CmsError::Authorization(format!("cannot read {}: {e}", path.display()))
        })?;
        let state: Value = serde_json::from_str(&text)
            .map_err(|e| CmsError::Authorization(format!("malformed {}: {e}", path.display())))?;
        Self::from_storage_state(&state, host)
    }

    /// Extract cookies and the bearer token from a storage-state document.
    ///
    /// Origins whose URL contains `host` are searched first; the first token
    /// store found wins.
    pub fn from_storage_state(state: &Value, host: Option<&str>) -> Result<Self> {
        let cookies = match state.get("cookies") {
            Some(raw) => Vec::<StoredCookie>::deserialize(raw)
                .map_err(|e| CmsError::Authorization(format!("malformed cookies: {e}")))?,
            None => Vec::new(),
        };

        let origins = state
            .get("origins")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();

        let matches_host = |origin: &Value| match host {
            Some(host) => origin
                .get("origin")
                .and_then(Value::as_str)
                .is_some_and(|o| o.contains(host)),
            None => false,
        };
        let ordered = origins
            .iter()
            .filter(|&o| matches_host(o))
            .chain(origins.iter().filter(|&o| !matches_host(o)));

        let token = ordered
            .filter_map(token_from_origin)
            .next()
            .ok_or_else(|| CmsError::Authorization("no bearer token in credential file".into()))?;

        debug!(cookies = cookies.len(), "Loaded credentials");
        Ok(Self { cookies, token })
    }
}

fn token_from_origin(origin: &Value) -> Option<String> {
    origin
        .get("localStorage")?
        .as_array()?
        .iter()
        .filter(|item| item.get("name").and_then(Value::as_str) == Some(TOKEN_STORE_KEY))
        .find_map(|item| {
            let raw = item.get("value")?.as_str()?;
            let store: Value = serde_json::from_str(raw).ok()?;
            let (_, first) = store.as_object()?.iter().next()?;
            first.get("access_token")?.as_str().map(str::to_string)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn token_store(token: &str) -> String {
        json!({ "*:*:*": { "access_token": token, "expires_at": 1700000000 } }).to_string()
    }

    #[test]
    fn extracts_cookies_and_token() {
        let state = json!({
            "cookies": [
                { "name": "d2lSessionVal", "value": "abc", "domain": "lms.example", "path": "/" },
                { "name": "d2lSecureSessionVal", "value": "def", "domain": ".lms.example" }
            ],
            "origins": [
                {
                    "origin": "https://lms.example",
                    "localStorage": [
                        { "name": "other", "value": "x" },
                        { "name": TOKEN_STORE_KEY, "value": token_store("tok-1") }
                    ]
                }
            ]
        });

        let creds = Credentials::from_storage_state(&state, Some("lms.example")).unwrap();
        assert_eq!(creds.token, "tok-1");
        assert_eq!(creds.cookies.len(), 2);
        assert_eq!(creds.cookies[1].domain, ".lms.example");
    }

    #[test]
    fn prefers_origin_matching_host() {
        let state = json!({
            "origins": [
                {
                    "origin": "https://login.example",
                    "localStorage": [{ "name": TOKEN_STORE_KEY, "value": token_store("wrong") }]
                },
                {
                    "origin": "https://lms.example",
                    "localStorage": [{ "name": TOKEN_STORE_KEY, "value": token_store("right") }]
                }
            ]
        });

        let creds = Credentials::from_storage_state(&state, Some("lms.example")).unwrap();
        assert_eq!(creds.token, "right");

        let creds = Credentials::from_storage_state(&state, None).unwrap();
        assert_eq!(creds.token, "wrong");
    }

    #[test]
    fn skips_unusable_token_stores() {
        let state = json!({
            "origins": [
                { "origin": "https://a.example", "localStorage": [{ "name": TOKEN_STORE_KEY, "value": "not json" }] },
                { "origin": "https://b.example", "localStorage": [{ "name": TOKEN_STORE_KEY, "value": "{}" }] },
                { "origin": "https://c.example", "localStorage": [{ "name": TOKEN_STORE_KEY, "value": token_store("tok-c") }] }
            ]
        });

        let creds = Credentials::from_storage_state(&state, None).unwrap();
        assert_eq!(creds.token, "tok-c");
    }

    #[test]
    fn missing_token_is_authorization_error() {
        let state = json!({ "cookies": [], "origins": [] });
        let err = Credentials::from_storage_state(&state, None).unwrap_err();
        assert!(matches!(err, CmsError::Authorization(_)));
    }

    #[test]
    fn unreadable_file_is_authorization_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Credentials::load(&dir.path().join("auth.json"), None).unwrap_err();
        assert!(matches!(err, CmsError::Authorization(_)));
    }
}
