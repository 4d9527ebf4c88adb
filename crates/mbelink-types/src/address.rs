//! Codec server address grammar.
//!
//! A single configuration string selects the transport:
//! `"" | "/"<path> | <host>[":"<port>]`.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Port a codec server listens on when none is given.
pub const DEFAULT_PORT: u16 = 1073;

/// Where a synthesizer session connects to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServerAddress {
    /// No server configured; the in-process codec is used.
    Default,
    /// A unix domain socket, addressed by filesystem path.
    Unix { path: String },
    /// A TCP endpoint. The host is passed to the transport unvalidated.
    Tcp { host: String, port: u16 },
}

#[derive(Debug, Error)]
pub enum AddressError {
    /// The segment after the host/port separator did not parse as a port.
    #[error("invalid port `{port}` in server address `{address}`")]
    InvalidPort { address: String, port: String },
}

impl ServerAddress {
    /// Classifies a server string into a transport selection.
    ///
    /// An empty string selects the in-process codec. A string starting with
    /// `/` is taken whole as a unix socket path. Anything else is a host,
    /// optionally followed by `:` and a port; the port defaults to
    /// [`DEFAULT_PORT`] when absent and is a hard error when present but
    /// unparsable.
    ///
    /// The first `:` separates host from port, so bare IPv6 literals are not
    /// accepted as hosts. Host syntax is otherwise not validated here; DNS
    /// resolution and the like are the transport's job.
    pub fn parse(server: &str) -> Result<Self, AddressError> {
        if server.is_empty() {
            return Ok(Self::Default);
        }
        if server.starts_with('/') {
            return Ok(Self::Unix {
                path: server.to_string(),
            });
        }

        match server.split_once(':') {
            Some((host, port)) => {
                let port = port.parse().map_err(|_| AddressError::InvalidPort {
                    address: server.to_string(),
                    port: port.to_string(),
                })?;
                Ok(Self::Tcp {
                    host: host.to_string(),
                    port,
                })
            }
            None => Ok(Self::Tcp {
                host: server.to_string(),
                port: DEFAULT_PORT,
            }),
        }
    }
}

impl fmt::Display for ServerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Default => write!(f, "<default>"),
            Self::Unix { path } => write!(f, "{path}"),
            Self::Tcp { host, port } => write!(f, "{host}:{port}"),
        }
    }
}
