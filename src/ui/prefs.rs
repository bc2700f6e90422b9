// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! User preferences kept in a cookie
//!
//! The CMS stores preferences as URL-encoded JSON in the `KRANG_PREFS`
//! cookie. Missing keys fall back to defaults so an empty or absent cookie
//! still yields usable preferences.

use std::time::Duration;

use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use url::Url;

use super::cookie::{Cookie, CookieJar};
use crate::error::{Error, Result};

/// Name of the preferences cookie
pub const PREFS_COOKIE: &str = "KRANG_PREFS";

/// Read/write access to the cookies of one site
pub trait CookieStore {
    fn get_cookie(&self, name: &str) -> Option<String>;
    fn set_cookie(&self, name: &str, value: &str);
}

/// [`CookieStore`] over a [`CookieJar`], scoped to one URL
#[derive(Debug, Clone)]
pub struct JarCookieStore {
    jar: CookieJar,
    url: Url,
}

impl JarCookieStore {
    pub fn new(jar: CookieJar, url: Url) -> Self {
        Self { jar, url }
    }

    /// Store scoped to `url` with a fresh jar
    pub fn for_url(url: &str) -> Result<Self> {
        Ok(Self::new(CookieJar::new(), Url::parse(url)?))
    }

    pub fn jar(&self) -> &CookieJar {
        &self.jar
    }
}

impl CookieStore for JarCookieStore {
    fn get_cookie(&self, name: &str) -> Option<String> {
        self.jar.get(&self.url, name)
    }

    fn set_cookie(&self, name: &str, value: &str) {
        let domain = self.url.host_str().unwrap_or_default();
        self.jar.add(Cookie::new(name, value).domain(domain));
    }
}

fn default_message_timeout() -> u64 {
    5
}

/// Seconds arrive as JSON numbers or as numeric strings
fn lenient_seconds<'de, D>(deserializer: D) -> std::result::Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_u64().or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
    .ok_or_else(|| de::Error::custom("message_timeout is not a number of seconds"))
}

/// Preferences of the logged-in CMS user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preferences {
    /// Seconds before messages auto-hide
    #[serde(default = "default_message_timeout", deserialize_with = "lenient_seconds")]
    pub message_timeout: u64,
    /// Keys this crate does not interpret, kept for round trips
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            message_timeout: default_message_timeout(),
            extra: Map::new(),
        }
    }
}

impl Preferences {
    /// Preferences from a response's prefs segment; unusable input yields defaults
    pub fn from_value(value: &Value) -> Self {
        if value.is_null() {
            return Self::default();
        }
        serde_json::from_value(value.clone()).unwrap_or_else(|e| {
            tracing::warn!(error = %e, prefs = %value, "Unusable preferences; using defaults");
            Self::default()
        })
    }

    /// Read the preferences cookie
    pub fn load(store: &dyn CookieStore) -> Result<Self> {
        let Some(raw) = store.get_cookie(PREFS_COOKIE) else {
            return Ok(Self::default());
        };

        let json = decode_component(&raw);
        if json.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_json::from_str(&json).map_err(|e| Error::malformed(PREFS_COOKIE, e))
    }

    /// Write the preferences cookie
    pub fn save(&self, store: &dyn CookieStore) -> Result<()> {
        let json = serde_json::to_string(self)?;
        store.set_cookie(PREFS_COOKIE, &encode_component(&json));
        Ok(())
    }

    pub fn message_timeout(&self) -> Duration {
        Duration::from_secs(self.message_timeout)
    }
}

fn encode_component(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

fn decode_component(value: &str) -> String {
    url::form_urlencoded::parse(format!("v={}", value).as_bytes())
        .next()
        .map(|(_, v)| v.into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_missing_cookie_gives_defaults() {
        let store = JarCookieStore::for_url("https://cms.example.com/").unwrap();
        let prefs = Preferences::load(&store).unwrap();
        assert_eq!(prefs.message_timeout, 5);
    }

    #[test]
    fn test_save_and_load() {
        let store = JarCookieStore::for_url("https://cms.example.com/krang/").unwrap();
        let mut prefs = Preferences::default();
        prefs.message_timeout = 12;
        prefs.extra.insert("search_page_size".into(), json!(50));
        prefs.save(&store).unwrap();

        let raw = store.get_cookie(PREFS_COOKIE).unwrap();
        assert!(!raw.contains('{'));

        let loaded = Preferences::load(&store).unwrap();
        assert_eq!(loaded, prefs);
    }

    #[test]
    fn test_malformed_cookie_is_critical() {
        let store = JarCookieStore::for_url("https://cms.example.com/").unwrap();
        store.set_cookie(PREFS_COOKIE, "%7Bnope");
        let err = Preferences::load(&store).unwrap_err();
        assert!(err.is_critical());
    }

    #[test]
    fn test_from_value() {
        assert_eq!(Preferences::from_value(&json!({"message_timeout": 2})).message_timeout, 2);
        assert_eq!(Preferences::from_value(&json!({})).message_timeout, 5);
        assert_eq!(Preferences::from_value(&json!("junk")).message_timeout, 5);
    }

    #[test]
    fn test_timeout_sent_as_string() {
        let prefs = Preferences::from_value(&json!({"message_timeout": "7", "language": "en"}));
        assert_eq!(prefs.message_timeout(), Duration::from_secs(7));
        assert_eq!(prefs.extra["language"], "en");

        assert_eq!(Preferences::from_value(&json!({"message_timeout": 2.5})).message_timeout, 2);
        assert_eq!(Preferences::from_value(&json!({"message_timeout": "soon"})).message_timeout, 5);
    }
}
