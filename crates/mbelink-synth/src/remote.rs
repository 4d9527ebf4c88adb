//! Remote codec server backend over TCP or unix domain sockets.

use crate::error::MbeError;
use mbelink_proto::{
    read_frame, write_frame, ModeSpec, ProtoError, Request, Response, PROTOCOL_VERSION,
};
use tokio::io::{AsyncRead, AsyncWrite, BufStream};
use tokio::net::TcpStream;
#[cfg(unix)]
use tokio::net::UnixStream;
use tracing::debug;

trait Transport: AsyncRead + AsyncWrite + Unpin + Send {}
impl<T: AsyncRead + AsyncWrite + Unpin + Send> Transport for T {}

/// A connected codec server.
///
/// Construction performs the greeting exchange; a `RemoteCodec` is never
/// half-open. All failures up to and including the greeting are connection
/// errors; everything after is a protocol or server error.
pub(crate) struct RemoteCodec {
    stream: Box<dyn Transport>,
}

impl RemoteCodec {
    pub(crate) async fn connect_tcp(host: &str, port: u16) -> Result<Self, MbeError> {
        let stream = TcpStream::connect((host, port)).await.map_err(|e| {
            MbeError::Connection(format!("connect to {host}:{port} failed: {e}"))
        })?;
        Self::greet(Box::new(BufStream::new(stream))).await
    }

    #[cfg(unix)]
    pub(crate) async fn connect_unix(path: &str) -> Result<Self, MbeError> {
        let stream = UnixStream::connect(path)
            .await
            .map_err(|e| MbeError::Connection(format!("connect to {path} failed: {e}")))?;
        Self::greet(Box::new(BufStream::new(stream))).await
    }

    #[cfg(not(unix))]
    pub(crate) async fn connect_unix(path: &str) -> Result<Self, MbeError> {
        Err(MbeError::Connection(format!(
            "unix domain socket `{path}` is not supported on this platform"
        )))
    }

    async fn greet(mut stream: Box<dyn Transport>) -> Result<Self, MbeError> {
        let hello = Request::Hello {
            version: PROTOCOL_VERSION,
        };
        write_frame(&mut stream, &hello)
            .await
            .map_err(|e| MbeError::Connection(format!("greeting failed: {e}")))?;

        let greeting: Response = read_frame(&mut stream)
            .await
            .map_err(|e| MbeError::Connection(format!("greeting failed: {e}")))?;

        match greeting {
            Response::HelloOk { version } if version == PROTOCOL_VERSION => {
                debug!(version, "codec server greeting complete");
                Ok(Self { stream })
            }
            Response::HelloOk { version } => Err(MbeError::Connection(format!(
                "protocol version mismatch: server speaks {version}, expected {PROTOCOL_VERSION}"
            ))),
            other => Err(MbeError::Connection(format!(
                "unexpected greeting: {other:?}"
            ))),
        }
    }

    async fn round_trip(&mut self, request: &Request) -> Result<Response, MbeError> {
        write_frame(&mut self.stream, request).await?;
        match read_frame(&mut self.stream).await? {
            Response::Err { message } => Err(MbeError::Server(message)),
            response => Ok(response),
        }
    }

    pub(crate) async fn check_codec(&mut self, codec: &str) -> Result<bool, MbeError> {
        let request = Request::CheckCodec {
            codec: codec.to_string(),
        };
        match self.round_trip(&request).await? {
            Response::Codec { available } => Ok(available),
            other => Err(ProtoError::UnexpectedResponse(other).into()),
        }
    }

    pub(crate) async fn set_mode(&mut self, mode: ModeSpec) -> Result<(), MbeError> {
        match self.round_trip(&Request::SetMode { mode }).await? {
            Response::Ok => Ok(()),
            other => Err(ProtoError::UnexpectedResponse(other).into()),
        }
    }

    pub(crate) async fn synthesize(
        &mut self,
        mode: Option<ModeSpec>,
        frame: &[u8],
    ) -> Result<Vec<i16>, MbeError> {
        let request = Request::Synthesize {
            mode,
            frame: frame.to_vec(),
        };
        match self.round_trip(&request).await? {
            Response::Samples { pcm } => Ok(pcm),
            other => Err(ProtoError::UnexpectedResponse(other).into()),
        }
    }
}
