//! Target descriptors.
//!
//! # Responsibilities
//! - Turn a raw `scheme://address` string into a typed [`Target`]
//! - Reject unsupported schemes before any probing starts

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use thiserror::Error;
use url::Url;

/// Errors produced while parsing an endpoint string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TargetError {
    /// The string is not a valid URL.
    #[error("can't parse url: {raw} error: {reason}")]
    Parse { raw: String, reason: String },

    /// The scheme is not one of http, https or tcp.
    #[error("unsupported scheme: {raw}")]
    UnsupportedScheme { raw: String },

    /// The URL has no host component.
    #[error("missing host in {raw}")]
    MissingHost { raw: String },

    /// TCP targets need an explicit port.
    #[error("missing port in {raw}")]
    MissingPort { raw: String },
}

/// Supported probe schemes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Scheme {
    Http,
    Https,
    Tcp,
}

impl Scheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scheme::Http => "http",
            Scheme::Https => "https",
            Scheme::Tcp => "tcp",
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scheme {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "http" => Ok(Scheme::Http),
            "https" => Ok(Scheme::Https),
            "tcp" => Ok(Scheme::Tcp),
            _ => Err(()),
        }
    }
}

/// A parsed endpoint. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Target {
    scheme: Scheme,
    /// Full URL for HTTP(S), `host:port` for TCP.
    address: String,
    /// The string the user supplied, kept for reporting.
    raw: String,
}

impl Target {
    /// Parse a raw endpoint string.
    pub fn parse(raw: &str) -> Result<Self, TargetError> {
        let raw = raw.trim();
        let url = Url::parse(raw).map_err(|e| TargetError::Parse {
            raw: raw.to_string(),
            reason: e.to_string(),
        })?;

        let scheme: Scheme = url
            .scheme()
            .parse()
            .map_err(|_| TargetError::UnsupportedScheme { raw: raw.to_string() })?;

        let host = url
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| TargetError::MissingHost { raw: raw.to_string() })?;

        let address = match scheme {
            Scheme::Http | Scheme::Https => url.to_string(),
            Scheme::Tcp => {
                let port = url
                    .port()
                    .ok_or_else(|| TargetError::MissingPort { raw: raw.to_string() })?;
                format!("{}:{}", host, port)
            }
        };

        Ok(Self {
            scheme,
            address,
            raw: raw.to_string(),
        })
    }

    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl Serialize for Target {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

/// Split a comma separated list, dropping blank entries.
pub fn split_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
