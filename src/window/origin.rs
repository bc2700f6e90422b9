// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Web origins (scheme + host + port)

use std::fmt;
use std::str::FromStr;

use url::Url;

use crate::error::{Error, Result};

/// A tuple origin as browsers serialize it into `MessageEvent.origin`
///
/// Default ports are omitted, so `https://cms.example.com:443/story.pl`
/// yields `https://cms.example.com`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Origin {
    scheme: String,
    host: String,
    port: Option<u16>,
}

impl Origin {
    /// Origin of a parsed URL
    pub fn from_url(url: &Url) -> Result<Self> {
        let host = url
            .host_str()
            .ok_or_else(|| Error::InvalidOrigin(url.to_string()))?;

        Ok(Self {
            scheme: url.scheme().to_string(),
            host: host.to_string(),
            port: url.port(),
        })
    }

    /// Origin of a URL string such as a `cmsURL`
    pub fn parse(url: &str) -> Result<Self> {
        let parsed = Url::parse(url.trim()).map_err(|_| Error::InvalidOrigin(url.to_string()))?;
        Self::from_url(&parsed)
    }

    /// URL scheme
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Host name
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Explicit non-default port
    pub fn port(&self) -> Option<u16> {
        self.port
    }

    /// Serialized form (`scheme://host[:port]`)
    pub fn serialize(&self) -> String {
        format!(
            "{}://{}{}",
            self.scheme,
            self.host,
            self.port.map(|p| format!(":{}", p)).unwrap_or_default()
        )
    }

    /// Exact comparison against a serialized origin, e.g. `MessageEvent.origin`
    pub fn matches(&self, serialized: &str) -> bool {
        self.serialize() == serialized
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.serialize())
    }
}

impl FromStr for Origin {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// `targetOrigin` argument of `postMessage`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetOrigin {
    /// `"*"`: deliver regardless of the receiver's origin
    Any,
    /// Deliver only if the receiver's origin is exactly this one
    Exact(Origin),
}

impl TargetOrigin {
    /// Parse `"*"` or a URL
    pub fn parse(target: &str) -> Result<Self> {
        if target.trim() == "*" {
            return Ok(TargetOrigin::Any);
        }
        Origin::parse(target).map(TargetOrigin::Exact)
    }

    /// Whether a window with `origin` may receive the message
    pub fn admits(&self, origin: &Origin) -> bool {
        match self {
            TargetOrigin::Any => true,
            TargetOrigin::Exact(expected) => expected == origin,
        }
    }
}

impl From<Origin> for TargetOrigin {
    fn from(origin: Origin) -> Self {
        TargetOrigin::Exact(origin)
    }
}

impl fmt::Display for TargetOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetOrigin::Any => f.write_str("*"),
            TargetOrigin::Exact(origin) => origin.fmt(f),
        }
    }
}
