//! The synthesizer session: one backend, one mode, many frames.

use crate::backend::Backend;
use crate::descriptor::ModeDescriptor;
use crate::error::MbeError;
use crate::mode::Mode;
use crate::resolve::resolve_descriptor;
use crate::AMBE_CODEC;
use mbelink_types::ServerAddress;
use std::sync::Arc;
use tracing::debug;

/// A connected synthesizer session.
///
/// Sessions are born connected; failed construction leaves nothing behind.
/// Exactly one mode is bound per session, after which frames can be
/// synthesized. There is no rebinding, pooling, or reconnection.
pub struct MbeSynthesizer {
    backend: Backend,
    mode: Option<Mode>,
}

impl MbeSynthesizer {
    /// Connects to the backend selected by `server` (see
    /// [`ServerAddress::parse`] for the grammar). No mode is bound yet.
    ///
    /// Establishing a remote connection blocks on network I/O; keep this
    /// off latency-sensitive paths.
    pub async fn connect(server: &str) -> Result<Self, MbeError> {
        let address = ServerAddress::parse(server)?;
        debug!(%address, "connecting synthesizer backend");
        let backend = Backend::connect(&address).await?;
        Ok(Self {
            backend,
            mode: None,
        })
    }

    /// Resolves `descriptor`, connects to `server`, and binds the resolved
    /// mode: the all-in-one construction entry point. Any structural
    /// failure unwinds with no session left behind.
    pub async fn open(
        descriptor: &Arc<dyn ModeDescriptor>,
        server: &str,
    ) -> Result<Self, MbeError> {
        let mode = resolve_descriptor(descriptor)?;
        let mut session = Self::connect(server).await?;
        session.set_mode(mode).await?;
        Ok(session)
    }

    /// Checks whether the backend at `server` supports the AMBE codec.
    ///
    /// Performs the full classify/connect cycle and tears the connection
    /// down once the answer is in. No mode is involved.
    pub async fn has_codec(server: &str) -> Result<bool, MbeError> {
        let mut session = Self::connect(server).await?;
        session.backend.has_codec(AMBE_CODEC).await
    }

    /// Binds `mode` to this session.
    ///
    /// A session's mode is set exactly once; further calls are rejected
    /// with [`MbeError::ModeAlreadySet`] and leave the bound mode intact.
    pub async fn set_mode(&mut self, mode: Mode) -> Result<(), MbeError> {
        if self.mode.is_some() {
            return Err(MbeError::ModeAlreadySet);
        }
        self.backend.bind_mode(mode.to_spec()).await?;
        self.mode = Some(mode);
        Ok(())
    }

    /// Synthesizes one voice frame into PCM samples.
    ///
    /// On a dynamically resolved stream, byte 0 of `frame` is the mode code
    /// and the rest is the voice payload; a code that resolves to no mode
    /// skips the frame: the result is empty, not an error.
    pub async fn synthesize(&mut self, frame: &[u8]) -> Result<Vec<i16>, MbeError> {
        let mode = self.mode.as_ref().ok_or(MbeError::ModeNotSet)?;

        match mode {
            Mode::Dynamic(dynamic) => {
                let Some((&code, payload)) = frame.split_first() else {
                    debug!("dropping empty frame on a dynamic stream");
                    return Ok(Vec::new());
                };
                match dynamic.mode_for(code) {
                    Some(frame_mode) => {
                        let spec = frame_mode.to_spec();
                        self.backend.synthesize(spec, payload).await
                    }
                    None => {
                        debug!(code, "no mode for code, skipping frame");
                        Ok(Vec::new())
                    }
                }
            }
            _ => self.backend.synthesize(None, frame).await,
        }
    }
}
