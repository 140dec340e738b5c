//! Newline-delimited JSON-RPC over stdin/stdout.
//!
//! stdout carries protocol messages only; logging goes to stderr.

use futures::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::bytes::{Bytes, BytesMut};
use tokio_util::codec::{
    AnyDelimiterCodec, AnyDelimiterCodecError, Decoder, FramedRead, FramedWrite, LinesCodec,
    LinesCodecError,
};

use super::rpc::OutboundResponse;
use super::service::McpService;

const MAX_MESSAGE_BYTES: usize = 16 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to read from the host: {0}")]
    Read(#[source] std::io::Error),
    #[error("failed to write to the host: {0}")]
    Write(#[source] LinesCodecError),
    #[error("failed to encode response: {0}")]
    Encode(#[from] serde_json::Error),
}

/// One newline-terminated chunk of host input.
#[derive(Debug, PartialEq)]
enum Frame {
    Line(Bytes),
    Oversized,
}

/// Splits input on `\n` and reports an over-long line as a frame.
///
/// `FramedRead` ends the stream after any decoder error, so only I/O failures
/// surface as errors here.
struct MessageCodec {
    inner: AnyDelimiterCodec,
}

impl MessageCodec {
    fn new() -> Self {
        Self::with_max_length(MAX_MESSAGE_BYTES)
    }

    fn with_max_length(max_length: usize) -> Self {
        Self {
            inner: AnyDelimiterCodec::new_with_max_length(
                b"\n".to_vec(),
                b"\n".to_vec(),
                max_length,
            ),
        }
    }

    fn frame(
        decoded: Result<Option<Bytes>, AnyDelimiterCodecError>,
    ) -> Result<Option<Frame>, std::io::Error> {
        match decoded {
            Ok(chunk) => Ok(chunk.map(Frame::Line)),
            Err(AnyDelimiterCodecError::MaxChunkLengthExceeded) => Ok(Some(Frame::Oversized)),
            Err(AnyDelimiterCodecError::Io(err)) => Err(err),
        }
    }
}

impl Decoder for MessageCodec {
    type Item = Frame;
    type Error = std::io::Error;

    fn decode(&mut self, buf: &mut BytesMut) -> Result<Option<Frame>, std::io::Error> {
        Self::frame(self.inner.decode(buf))
    }

    fn decode_eof(&mut self, buf: &mut BytesMut) -> Result<Option<Frame>, std::io::Error> {
        Self::frame(self.inner.decode_eof(buf))
    }
}

/// Serve one request at a time until the reader reaches EOF.
pub async fn serve<R, W>(service: &McpService, reader: R, writer: W) -> Result<(), TransportError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut frames = FramedRead::new(reader, MessageCodec::new());
    let mut out = FramedWrite::new(writer, LinesCodec::new());

    while let Some(frame) = frames.next().await {
        let bytes = match frame.map_err(TransportError::Read)? {
            Frame::Line(bytes) => bytes,
            Frame::Oversized => {
                log::warn!("discarding message longer than {} bytes", MAX_MESSAGE_BYTES);
                continue;
            }
        };

        let response = match std::str::from_utf8(&bytes) {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                service.handle_message(line).await
            }
            Err(err) => {
                log::warn!("discarding message that is not valid UTF-8: {}", err);
                Some(OutboundResponse::parse_error(format!("message is not valid UTF-8: {}", err)))
            }
        };

        if let Some(response) = response {
            let encoded = serde_json::to_string(&response)?;
            out.send(encoded).await.map_err(TransportError::Write)?;
        }
    }

    log::info!("host closed stdin, shutting down");
    Ok(())
}

pub async fn serve_stdio(service: &McpService) -> Result<(), TransportError> {
    log::info!("Serving MCP over stdio");
    serve(service, tokio::io::stdin(), tokio::io::stdout()).await
}
