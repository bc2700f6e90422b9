// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Cookie storage shared by the UI preferences and the CMS transport

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use url::Url;

/// A single HTTP cookie
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    /// Domain the cookie belongs to
    pub domain: String,
    /// Path prefix the cookie is valid for
    pub path: String,
    /// Expiration time (None = session cookie)
    pub expires: Option<DateTime<Utc>>,
    /// HTTPS only
    pub secure: bool,
    /// Hidden from page scripts
    pub http_only: bool,
}

impl Cookie {
    /// Session cookie valid for every path
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            domain: String::new(),
            path: "/".to_string(),
            expires: None,
            secure: false,
            http_only: false,
        }
    }

    /// Set the domain
    pub fn domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = domain.into();
        self
    }

    /// Set the path
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Set expiration time
    pub fn expires(mut self, expires: DateTime<Utc>) -> Self {
        self.expires = Some(expires);
        self
    }

    pub fn is_expired(&self) -> bool {
        self.expires.map_or(false, |exp| exp < Utc::now())
    }

    /// Whether the cookie is sent along with a request to `url`
    pub fn matches(&self, url: &Url) -> bool {
        let host = url.host_str().unwrap_or("");
        self.domain_matches(host)
            && url.path().starts_with(&self.path)
            && (!self.secure || url.scheme() == "https")
            && !self.is_expired()
    }

    fn domain_matches(&self, host: &str) -> bool {
        if self.domain.is_empty() {
            return true;
        }

        let domain = self.domain.trim_start_matches('.');
        host == domain || host.ends_with(&format!(".{}", domain))
    }

    /// Parse a `Set-Cookie` header received from `url`
    pub fn parse(header: &str, url: &Url) -> Option<Self> {
        let mut parts = header.split(';');
        let (name, value) = parts.next()?.trim().split_once('=')?;
        let name = name.trim();
        if name.is_empty() {
            return None;
        }

        let mut cookie = Cookie::new(name, value.trim()).domain(url.host_str().unwrap_or(""));

        for part in parts.map(str::trim) {
            match part.split_once('=') {
                Some((attr, val)) => {
                    let val = val.trim();
                    match attr.trim().to_ascii_lowercase().as_str() {
                        "domain" => cookie.domain = val.trim_start_matches('.').to_string(),
                        "path" => cookie.path = val.to_string(),
                        "expires" => {
                            if let Ok(dt) = DateTime::parse_from_rfc2822(val) {
                                cookie.expires = Some(dt.with_timezone(&Utc));
                            }
                        }
                        "max-age" => {
                            if let Ok(secs) = val.parse::<i64>() {
                                cookie.expires = Some(Utc::now() + chrono::Duration::seconds(secs));
                            }
                        }
                        _ => {}
                    }
                }
                None => match part.to_ascii_lowercase().as_str() {
                    "secure" => cookie.secure = true,
                    "httponly" => cookie.http_only = true,
                    _ => {}
                },
            }
        }

        Some(cookie)
    }

    /// `name=value` as sent in a `Cookie` header
    pub fn to_header_value(&self) -> String {
        format!("{}={}", self.name, self.value)
    }
}

/// Thread-safe cookie storage keyed by domain
#[derive(Debug, Clone, Default)]
pub struct CookieJar {
    cookies: Arc<DashMap<String, Vec<Cookie>>>,
}

impl CookieJar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a cookie, replacing one with the same name and path
    pub fn add(&self, cookie: Cookie) {
        let mut entry = self.cookies.entry(cookie.domain.clone()).or_default();
        entry.retain(|c| c.name != cookie.name || c.path != cookie.path);
        entry.push(cookie);
    }

    /// Store the cookie of a `Set-Cookie` header
    pub fn add_from_header(&self, header: &str, url: &Url) {
        match Cookie::parse(header, url) {
            Some(cookie) => self.add(cookie),
            None => tracing::debug!(header, "Ignoring unparsable Set-Cookie header"),
        }
    }

    /// Live cookies for `url`
    pub fn get_cookies(&self, url: &Url) -> Vec<Cookie> {
        for mut entry in self.cookies.iter_mut() {
            entry.value_mut().retain(|c| !c.is_expired());
        }

        self.cookies
            .iter()
            .flat_map(|entry| entry.value().clone())
            .filter(|c| c.matches(url))
            .collect()
    }

    /// Value of the cookie `name` visible at `url`
    pub fn get(&self, url: &Url, name: &str) -> Option<String> {
        self.get_cookies(url)
            .into_iter()
            .find(|c| c.name == name)
            .map(|c| c.value)
    }

    /// `Cookie` header value for a request to `url`
    pub fn get_cookie_header(&self, url: &Url) -> Option<String> {
        let cookies = self.get_cookies(url);
        if cookies.is_empty() {
            return None;
        }

        Some(
            cookies
                .iter()
                .map(Cookie::to_header_value)
                .collect::<Vec<_>>()
                .join("; "),
        )
    }

    /// Total cookie count
    pub fn len(&self) -> usize {
        self.cookies.iter().map(|e| e.value().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cookie_parsing() {
        let url = Url::parse("https://cms.example.com/krang/story.pl").unwrap();
        let header = "KRANG_SESSION=abc123; Domain=.example.com; Path=/krang; Secure; HttpOnly";
        let cookie = Cookie::parse(header, &url).unwrap();

        assert_eq!(cookie.name, "KRANG_SESSION");
        assert_eq!(cookie.value, "abc123");
        assert_eq!(cookie.domain, "example.com");
        assert_eq!(cookie.path, "/krang");
        assert!(cookie.secure);
        assert!(cookie.http_only);
    }

    #[test]
    fn test_jar_scoping() {
        let jar = CookieJar::new();
        let cms = Url::parse("https://cms.example.com/krang/").unwrap();
        let other = Url::parse("https://other.test/").unwrap();

        jar.add(Cookie::new("a", "1").domain("cms.example.com"));
        jar.add(Cookie::new("a", "2").domain("cms.example.com"));
        assert_eq!(jar.len(), 1);

        assert_eq!(jar.get(&cms, "a").as_deref(), Some("2"));
        assert!(jar.get(&other, "a").is_none());
        assert_eq!(jar.get_cookie_header(&cms).as_deref(), Some("a=2"));
    }

    #[test]
    fn test_expired_cookie_dropped() {
        let jar = CookieJar::new();
        let url = Url::parse("https://cms.example.com/").unwrap();
        jar.add_from_header("gone=1; Max-Age=-10", &url);
        assert!(jar.get(&url, "gone").is_none());
        assert!(jar.is_empty());
    }
}
