//! Frame codec: LF-delimited byte frames over an async byte stream, with a
//! per-connection receive buffer that reassembles partial reads.
//!
//! JSON payloads never legitimately contain a raw LF, so delimiting on it
//! lets frames be arbitrarily large without an arbitrary maximum; this
//! codec imposes none.

use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

const LF: u8 = b'\n';
const READ_CHUNK: usize = 1024;

#[derive(Debug, Error)]
pub enum WireError {
    #[error("connection closed")]
    ConnectionClosed,
    #[error("connection broken: {0}")]
    ConnectionBroken(#[source] std::io::Error),
}

impl From<std::io::Error> for WireError {
    fn from(e: std::io::Error) -> Self {
        WireError::ConnectionBroken(e)
    }
}

/// Writes `bytes` followed by one LF, retrying on short writes until the
/// full payload has gone out or the connection breaks.
pub async fn send_frame<W>(conn: &mut W, bytes: &[u8]) -> Result<(), WireError>
where
    W: tokio::io::AsyncWrite + Unpin,
{
    conn.write_all(bytes).await?;
    conn.write_all(&[LF]).await?;
    conn.flush().await?;
    Ok(())
}

/// A connection's persistent inbound buffer. Frames for one connection must
/// always be read through the same `RecvBuffer`; buffers never cross
/// connections.
#[derive(Debug, Default)]
pub struct RecvBuffer {
    buf: Vec<u8>,
}

impl RecvBuffer {
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    /// Returns the next complete frame (without the trailing LF), blocking
    /// (awaiting) until one is available. On `ConnectionClosed` the buffer
    /// is discarded; the caller should tear down the connection.
    pub async fn recv_frame<R>(&mut self, conn: &mut R) -> Result<Vec<u8>, WireError>
    where
        R: tokio::io::AsyncRead + Unpin,
    {
        loop {
            if let Some(pos) = self.buf.iter().position(|&b| b == LF) {
                let frame = self.buf[..pos].to_vec();
                self.buf.drain(..=pos);
                return Ok(frame);
            }

            let mut chunk = [0u8; READ_CHUNK];
            let n = match conn.read(&mut chunk).await {
                Ok(0) => {
                    self.buf.clear();
                    return Err(WireError::ConnectionClosed);
                }
                Ok(n) => n,
                Err(e) => {
                    self.buf.clear();
                    return Err(WireError::ConnectionBroken(e));
                }
            };
            self.buf.extend_from_slice(&chunk[..n]);
        }
    }
}
