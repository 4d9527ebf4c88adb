use mbelink_proto::ProtoError;
use mbelink_types::{AddressError, ControlWordError};
use thiserror::Error;

/// Errors surfaced by mode resolution and session construction.
///
/// Structural failures (descriptor, address, connection) unwind out of
/// construction immediately and are never retried here. Per-code dynamic
/// resolution failures are deliberately *not* represented: they are logged
/// and contained in the resolution callback.
#[derive(Debug, Error)]
pub enum MbeError {
    /// The descriptor is missing a required accessor, or the accessor
    /// produced a wrong-typed or out-of-range value.
    #[error("invalid mode descriptor: {0}")]
    InvalidDescriptor(String),

    /// Control-word payload was not exactly 12 bytes.
    #[error(transparent)]
    SizeMismatch(#[from] ControlWordError),

    /// The descriptor matches none of the recognized shapes.
    #[error("unsupported mode descriptor")]
    UnsupportedMode,

    /// The server string did not parse.
    #[error(transparent)]
    InvalidAddress(#[from] AddressError),

    /// Transport-level failure while establishing the backend connection,
    /// including the greeting exchange.
    #[error("codec server connection failed: {0}")]
    Connection(String),

    /// Post-handshake wire protocol violation.
    #[error("codec server protocol error: {0}")]
    Protocol(#[from] ProtoError),

    /// The server rejected a request.
    #[error("codec server error: {0}")]
    Server(String),

    /// `set_mode` was called on a session that already has a mode bound.
    #[error("session mode is already set")]
    ModeAlreadySet,

    /// `synthesize` was called before a mode was bound.
    #[error("no mode set on this session")]
    ModeNotSet,
}
