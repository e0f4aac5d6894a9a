//! Streaming endpoint address.

use std::fmt;
use std::str::FromStr;

use http::Uri;

use crate::error::EndpointError;

/// A `ws://` or `wss://` URI. Nothing beyond scheme and host is checked;
/// reachability is the transport's problem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    raw: String,
    uri: Uri,
}

impl Endpoint {
    pub fn parse(raw: &str) -> Result<Self, EndpointError> {
        let uri: Uri = raw.parse().map_err(|source| EndpointError::InvalidUri {
            uri: raw.to_string(),
            source,
        })?;

        match uri.scheme_str() {
            Some("ws") | Some("wss") => {}
            Some(other) => return Err(EndpointError::UnsupportedScheme(other.to_string())),
            None => return Err(EndpointError::UnsupportedScheme(String::new())),
        }
        if uri.host().is_none_or(str::is_empty) {
            return Err(EndpointError::MissingHost(raw.to_string()));
        }

        Ok(Self {
            raw: raw.to_string(),
            uri,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    pub fn is_secure(&self) -> bool {
        self.uri.scheme_str() == Some("wss")
    }
}

impl FromStr for Endpoint {
    type Err = EndpointError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_ws_and_wss() {
        let plain = Endpoint::parse("ws://127.0.0.1:8004/ws").unwrap();
        assert!(!plain.is_secure());
        assert_eq!(plain.uri().port_u16(), Some(8004));

        let secure = Endpoint::parse("wss://localhost:8004/ws").unwrap();
        assert!(secure.is_secure());
        assert_eq!(secure.to_string(), "wss://localhost:8004/ws");
    }

    #[test]
    fn rejects_http_scheme() {
        let err = Endpoint::parse("http://localhost:8004/ws").unwrap_err();
        assert!(
            matches!(err, EndpointError::UnsupportedScheme(ref s) if s == "http"),
            "got {err:?}"
        );
    }

    #[test]
    fn rejects_missing_scheme() {
        let err = Endpoint::parse("/ws").unwrap_err();
        assert!(matches!(err, EndpointError::UnsupportedScheme(_)), "got {err:?}");
    }

    #[test]
    fn rejects_garbage() {
        let err = "ws://exa mple".parse::<Endpoint>().unwrap_err();
        assert!(matches!(err, EndpointError::InvalidUri { .. }), "got {err:?}");
    }
}
