use std::fmt;
use std::str::FromStr;

use tokio_tungstenite::tungstenite::http::Uri;

use crate::error::{Result, TransportError};

/// Path the dispatcher serves worker sessions on.
pub const DEFAULT_WORKER_PATH: &str = "/agent";

/// A validated dispatcher address (`ws://` or `wss://`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    uri: Uri,
}

impl Target {
    /// Parse and validate a WebSocket URL.
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();
        let uri: Uri = input.parse().map_err(|err| invalid(input, err))?;

        match uri.scheme_str() {
            Some("ws") | Some("wss") => {}
            Some(other) => {
                return Err(invalid(
                    input,
                    format!("unsupported scheme '{other}' (expected ws or wss)"),
                ))
            }
            None => return Err(invalid(input, "missing scheme (expected ws or wss)")),
        }

        match uri.host() {
            Some(host) if !host.is_empty() => {}
            _ => return Err(invalid(input, "missing host")),
        }

        Ok(Self { uri })
    }

    /// Build `ws://<host>:<port>/agent`.
    pub fn from_host_port(host: &str, port: u16) -> Result<Self> {
        Self::parse(&format!("ws://{host}:{port}{DEFAULT_WORKER_PATH}"))
    }

    /// Host component.
    pub fn host(&self) -> &str {
        self.uri.host().unwrap_or_default()
    }

    /// Explicit or scheme-default port.
    pub fn port(&self) -> u16 {
        self.uri
            .port_u16()
            .unwrap_or(if self.is_secure() { 443 } else { 80 })
    }

    /// True for `wss://` targets.
    pub fn is_secure(&self) -> bool {
        self.uri.scheme_str() == Some("wss")
    }

    pub(crate) fn uri(&self) -> &Uri {
        &self.uri
    }
}

impl FromStr for Target {
    type Err = TransportError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.uri)
    }
}

fn invalid(target: &str, reason: impl ToString) -> TransportError {
    TransportError::InvalidTarget {
        target: target.to_string(),
        reason: reason.to_string(),
    }
}
