//! Wire protocol between a synthesizer session and a codec server.
//!
//! Messages are postcard-encoded and framed with a `u32` little-endian
//! length prefix over any tokio byte stream. The protocol is deliberately
//! small: a version handshake, a codec capability query, mode binding, and
//! the frame-in/samples-out exchange.

use mbelink_types::{ControlWord, TableMode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

pub const PROTOCOL_VERSION: u32 = 1;

/// Sanity limit on a single wire frame. Nothing this protocol carries comes
/// close; anything larger is a corrupt or hostile peer.
pub const MAX_FRAME_BYTES: usize = 16 * 1024 * 1024;

/// Wire form of a concrete codec mode.
///
/// Dynamically resolved modes never cross the wire as such; each frame of a
/// dynamic stream carries the mode resolved for that frame's code.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ModeSpec {
    Table(TableMode),
    ControlWord(ControlWord),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Request {
    Hello {
        version: u32,
    },
    /// Asks whether the server supports the named codec.
    CheckCodec {
        codec: String,
    },
    /// Binds a mode for the rest of the stream.
    SetMode {
        mode: ModeSpec,
    },
    /// One voice frame. `mode` overrides the bound mode for this frame only.
    Synthesize {
        mode: Option<ModeSpec>,
        frame: Vec<u8>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Response {
    HelloOk { version: u32 },
    Codec { available: bool },
    Ok,
    Samples { pcm: Vec<i16> },
    Err { message: String },
}

#[derive(Debug, Error)]
pub enum ProtoError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("postcard: {0}")]
    Postcard(#[from] postcard::Error),

    #[error("wire frame too large: {0} bytes")]
    FrameTooLarge(usize),

    #[error("unexpected response: {0:?}")]
    UnexpectedResponse(Response),
}

/// Writes one length-prefixed message.
pub async fn write_frame<W, T>(w: &mut W, msg: &T) -> Result<(), ProtoError>
where
    W: AsyncWrite + Unpin,
    T: Serialize,
{
    let payload = postcard::to_stdvec(msg)?;
    if payload.len() > MAX_FRAME_BYTES {
        return Err(ProtoError::FrameTooLarge(payload.len()));
    }
    w.write_all(&(payload.len() as u32).to_le_bytes()).await?;
    w.write_all(&payload).await?;
    w.flush().await?;
    Ok(())
}

/// Reads one length-prefixed message.
///
/// The length header is checked against [`MAX_FRAME_BYTES`] before the
/// payload buffer is allocated.
pub async fn read_frame<R, T>(r: &mut R) -> Result<T, ProtoError>
where
    R: AsyncRead + Unpin,
    T: for<'de> Deserialize<'de>,
{
    let mut len_bytes = [0u8; 4];
    r.read_exact(&mut len_bytes).await?;
    let len = u32::from_le_bytes(len_bytes) as usize;
    if len > MAX_FRAME_BYTES {
        return Err(ProtoError::FrameTooLarge(len));
    }
    let mut payload = vec![0u8; len];
    r.read_exact(&mut payload).await?;
    Ok(postcard::from_bytes(&payload)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn request_survives_framing() {
        let (mut client, mut server) = tokio::io::duplex(1024);

        let cw = ControlWord::from_bytes(&[1, 0, 2, 0, 3, 0, 4, 0, 5, 0, 6, 0]).unwrap();
        let request = Request::Synthesize {
            mode: Some(ModeSpec::ControlWord(cw)),
            frame: vec![0xAA, 0xBB, 0xCC],
        };

        write_frame(&mut client, &request).await.unwrap();
        let received: Request = read_frame(&mut server).await.unwrap();
        assert_eq!(received, request);
    }

    #[tokio::test]
    async fn messages_are_framed_independently() {
        let (mut client, mut server) = tokio::io::duplex(1024);

        write_frame(&mut client, &Request::Hello { version: 1 })
            .await
            .unwrap();
        write_frame(&mut client, &Request::CheckCodec { codec: "ambe".into() })
            .await
            .unwrap();

        let first: Request = read_frame(&mut server).await.unwrap();
        let second: Request = read_frame(&mut server).await.unwrap();
        assert_eq!(first, Request::Hello { version: 1 });
        assert_eq!(second, Request::CheckCodec { codec: "ambe".into() });
    }

    #[tokio::test]
    async fn oversized_length_header_is_rejected_before_allocation() {
        let (mut client, mut server) = tokio::io::duplex(64);

        let len = (MAX_FRAME_BYTES as u32) + 1;
        client.write_all(&len.to_le_bytes()).await.unwrap();

        let result: Result<Response, _> = read_frame(&mut server).await;
        assert!(matches!(result, Err(ProtoError::FrameTooLarge(_))));
    }
}
