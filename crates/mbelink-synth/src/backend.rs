//! Backend selection and dispatch.

use crate::error::MbeError;
use crate::native::NativeCodec;
use crate::remote::RemoteCodec;
use mbelink_proto::ModeSpec;
use mbelink_types::ServerAddress;

/// An established synthesis backend.
pub(crate) enum Backend {
    Native(NativeCodec),
    Remote(RemoteCodec),
}

impl Backend {
    /// Establishes the backend selected by `address`.
    ///
    /// Remote variants block on network I/O for as long as the transport
    /// takes; no timeout is imposed at this layer. Failure never yields a
    /// half-open backend.
    pub(crate) async fn connect(address: &ServerAddress) -> Result<Self, MbeError> {
        match address {
            ServerAddress::Default => Ok(Self::Native(NativeCodec::new())),
            ServerAddress::Unix { path } => {
                Ok(Self::Remote(RemoteCodec::connect_unix(path).await?))
            }
            ServerAddress::Tcp { host, port } => {
                Ok(Self::Remote(RemoteCodec::connect_tcp(host, *port).await?))
            }
        }
    }

    pub(crate) async fn has_codec(&mut self, codec: &str) -> Result<bool, MbeError> {
        match self {
            Self::Native(native) => Ok(native.has_codec(codec)),
            Self::Remote(remote) => remote.check_codec(codec).await,
        }
    }

    /// Announces a stream-wide mode to the backend. Dynamic modes have no
    /// stream-wide spec; their per-frame resolutions ride with the frames.
    pub(crate) async fn bind_mode(&mut self, spec: Option<ModeSpec>) -> Result<(), MbeError> {
        match (self, spec) {
            (Self::Remote(remote), Some(spec)) => remote.set_mode(spec).await,
            _ => Ok(()),
        }
    }

    pub(crate) async fn synthesize(
        &mut self,
        mode: Option<ModeSpec>,
        frame: &[u8],
    ) -> Result<Vec<i16>, MbeError> {
        match self {
            Self::Native(native) => Ok(native.synthesize(frame)),
            Self::Remote(remote) => remote.synthesize(mode, frame).await,
        }
    }
}
