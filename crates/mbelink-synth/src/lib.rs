//! Mode resolution and backend connection for MBE voice synthesis.
//!
//! Turns a caller-supplied codec mode descriptor into a backend-ready mode
//! and connects a synthesizer session to the backend selected by a single
//! address string: the in-process codec, a local unix socket, or a remote
//! codec server.
//!
//! Three descriptor shapes are recognized: a lookup-table index, a raw
//! 12-byte control word, and a dynamic shape whose mode is resolved
//! per-frame through a caller-supplied callback. The dynamic path may be
//! driven from a synthesis thread that does not own the descriptor; every
//! call back into descriptor code is serialized through a process-wide
//! guard (see [`descriptor`]).

mod backend;
mod native;
mod remote;

pub mod descriptor;
pub mod error;
pub mod mode;
pub mod resolve;
pub mod session;

pub use descriptor::{
    ControlWordDescriptor, DescriptorError, DescriptorShape, FnDescriptor, ModeDescriptor,
    TableDescriptor,
};
pub use error::MbeError;
pub use mode::{DynamicMode, Mode};
pub use resolve::resolve_descriptor;
pub use session::MbeSynthesizer;

/// Name of the codec this synthesizer targets.
pub const AMBE_CODEC: &str = "ambe";
