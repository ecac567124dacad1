//! `Content-Length` framing.
//!
//! Every request and reply is a single JSON document preceded by a header
//! block:
//!
//! ```text
//! Content-Length: 42\r\n
//! \r\n
//! {"operation": "poll", "agent_id": "alpha"}
//! ```
//!
//! Unknown header lines are skipped; the block ends at the first empty line.

use super::error::{Result, TransportError};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::trace;

/// Upper bound for a single frame body (16 MiB)
pub const MAX_FRAME_SIZE: usize = 16 * 1024 * 1024;

/// Read the `Content-Length` value, skipping blank lines before it.
async fn read_content_length<R>(reader: &mut R, line: &mut String) -> Result<usize>
where
    R: AsyncBufRead + Unpin,
{
    loop {
        line.clear();
        let bytes_read = reader.read_line(line).await?;
        if bytes_read == 0 {
            return Err(TransportError::Closed);
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        if let Some(len_str) = trimmed.strip_prefix("Content-Length:") {
            return len_str
                .trim()
                .parse::<usize>()
                .map_err(|_| TransportError::InvalidFrame(format!("bad header: {}", trimmed)));
        }
        trace!("Skipping header line: {}", trimmed);
    }
}

/// Read one frame body.
///
/// Returns [`TransportError::Closed`] on a clean end of stream before a
/// header starts.
pub async fn read_frame<R>(reader: &mut R, line: &mut String) -> Result<Vec<u8>>
where
    R: AsyncBufRead + Unpin,
{
    let content_length = read_content_length(reader, line).await?;
    if content_length > MAX_FRAME_SIZE {
        return Err(TransportError::FrameTooLarge(content_length));
    }

    // Skip remaining headers up to the blank separator line
    loop {
        line.clear();
        if reader.read_line(line).await? == 0 {
            return Err(TransportError::Closed);
        }
        if line.trim().is_empty() {
            break;
        }
    }

    let mut body = vec![0u8; content_length];
    reader.read_exact(&mut body).await?;
    trace!("Received frame: {}", String::from_utf8_lossy(&body));
    Ok(body)
}

/// Read one frame and decode it as `T`.
pub async fn read_json<R, T>(reader: &mut R, line: &mut String) -> Result<T>
where
    R: AsyncBufRead + Unpin,
    T: DeserializeOwned,
{
    let body = read_frame(reader, line).await?;
    Ok(serde_json::from_slice(&body)?)
}

/// Encode `value` and write it as one frame, then flush.
pub async fn write_json<W, T>(writer: &mut W, value: &T) -> Result<()>
where
    W: AsyncWrite + Unpin,
    T: Serialize + ?Sized,
{
    let json = serde_json::to_string(value)?;
    trace!("Sending frame: {}", json);

    let header = format!("Content-Length: {}\r\n\r\n", json.len());
    writer.write_all(header.as_bytes()).await?;
    writer.write_all(json.as_bytes()).await?;
    writer.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use benchfleet_domain::{Directive, InboundMessage};
    use tokio::io::BufReader;

    #[tokio::test]
    async fn test_write_then_read() {
        let mut buffer = Vec::new();
        write_json(&mut buffer, &InboundMessage::poll("alpha"))
            .await
            .unwrap();

        let text = String::from_utf8(buffer.clone()).unwrap();
        assert!(text.starts_with("Content-Length: "));

        let mut reader = BufReader::new(buffer.as_slice());
        let mut line = String::new();
        let message: InboundMessage = read_json(&mut reader, &mut line).await.unwrap();
        assert_eq!(message, InboundMessage::poll("alpha"));
    }

    #[tokio::test]
    async fn test_extra_headers_and_blank_lines_skipped() {
        let body = r#"{"operation":"none"}"#;
        let raw = format!(
            "\r\nContent-Length: {}\r\nContent-Type: application/json\r\n\r\n{}",
            body.len(),
            body
        );
        let mut reader = BufReader::new(raw.as_bytes());
        let mut line = String::new();

        let directive: Directive = read_json(&mut reader, &mut line).await.unwrap();
        assert_eq!(directive, Directive::None);
    }

    #[tokio::test]
    async fn test_end_of_stream_is_closed() {
        let mut reader = BufReader::new(&b""[..]);
        let mut line = String::new();
        let err = read_frame(&mut reader, &mut line).await.unwrap_err();
        assert!(matches!(err, TransportError::Closed));
    }

    #[tokio::test]
    async fn test_bad_length_rejected() {
        let mut reader = BufReader::new(&b"Content-Length: lots\r\n\r\n"[..]);
        let mut line = String::new();
        let err = read_frame(&mut reader, &mut line).await.unwrap_err();
        assert!(matches!(err, TransportError::InvalidFrame(_)));
    }

    #[tokio::test]
    async fn test_oversized_frame_rejected() {
        let raw = format!("Content-Length: {}\r\n\r\n", MAX_FRAME_SIZE + 1);
        let mut reader = BufReader::new(raw.as_bytes());
        let mut line = String::new();
        let err = read_frame(&mut reader, &mut line).await.unwrap_err();
        assert!(matches!(err, TransportError::FrameTooLarge(_)));
    }

    #[tokio::test]
    async fn test_truncated_body_is_io_error() {
        let mut reader = BufReader::new(&b"Content-Length: 10\r\n\r\n{}"[..]);
        let mut line = String::new();
        let err = read_frame(&mut reader, &mut line).await.unwrap_err();
        assert!(matches!(err, TransportError::Io(_)));
    }
}
