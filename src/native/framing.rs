//! Length-prefixed JSON frames spoken with the native helper.
//!
//! Each frame is a 4-byte length in **native endianness** followed by that
//! many bytes of UTF-8 JSON. The relay plays the browser's role, so the
//! limits are mirrored from the host's point of view.

use serde::Serialize;
use std::io::{self, Read};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Largest frame the relay will send to the helper.
pub const MAX_TO_HOST: usize = 64 * 1_048_576; // 64 MiB
/// Largest frame the relay will accept from the helper.
pub const MAX_FROM_HOST: usize = 1_048_576; // 1 MiB

/// Encode `msg` as a frame: length prefix + JSON bytes.
pub fn encode_message<T: Serialize>(msg: &T) -> io::Result<Vec<u8>> {
    let json = serde_json::to_vec(msg)?;
    if json.len() > MAX_TO_HOST {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "outgoing message exceeds 64MiB",
        ));
    }
    let mut out = Vec::with_capacity(4 + json.len());
    out.extend_from_slice(&(json.len() as u32).to_ne_bytes());
    out.extend_from_slice(&json);
    Ok(out)
}

fn check_len(len: usize, max_size: usize) -> io::Result<()> {
    if len > max_size.min(MAX_FROM_HOST) {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "incoming message too large",
        ));
    }
    Ok(())
}

fn into_utf8(buf: Vec<u8>) -> io::Result<String> {
    String::from_utf8(buf).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

/// Decode a single frame from a blocking reader.
pub fn decode_message<R: Read>(reader: &mut R, max_size: usize) -> io::Result<String> {
    let mut len_buf = [0u8; 4];
    reader.read_exact(&mut len_buf)?;
    let len = u32::from_ne_bytes(len_buf) as usize;
    check_len(len, max_size)?;
    let mut buf = vec![0u8; len];
    reader.read_exact(&mut buf)?;
    into_utf8(buf)
}

/// Write one frame to an async writer and flush it.
pub async fn write_frame<W, T>(writer: &mut W, msg: &T) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
    T: Serialize,
{
    let frame = encode_message(msg)?;
    writer.write_all(&frame).await?;
    writer.flush().await
}

/// Read one frame from an async reader.
pub async fn read_frame<R>(reader: &mut R, max_size: usize) -> io::Result<String>
where
    R: AsyncRead + Unpin,
{
    let mut len_buf = [0u8; 4];
    reader.read_exact(&mut len_buf).await?;
    let len = u32::from_ne_bytes(len_buf) as usize;
    check_len(len, max_size)?;
    let mut buf = vec![0u8; len];
    reader.read_exact(&mut buf).await?;
    into_utf8(buf)
}
