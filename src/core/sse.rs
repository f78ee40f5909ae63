//! Server-sent events framing over a raw byte stream.

use bytes::{Buf, Bytes, BytesMut};
use futures::{Stream, StreamExt, stream};

use super::error::OpperError;

const DONE_SIGNAL: &str = "[DONE]";

/// One decoded SSE event: the concatenated `data:` lines of a frame.
#[derive(Debug, Clone, PartialEq)]
pub enum SseEvent {
    Data(String),
    Done,
}

/// Split the incoming bytes into SSE frames and yield their `data` payloads.
///
/// Frames are separated by a blank line. Bytes are buffered until a frame is
/// complete, so a character split across chunks decodes intact; a complete
/// frame that is not valid UTF-8 is a parse error. Comment lines (`:`) and
/// other fields (`event:`, `id:`, `retry:`) are ignored. The stream ends after
/// `[DONE]`, after the first error, or when the body ends.
pub fn decode<S>(input: S) -> impl Stream<Item = Result<SseEvent, OpperError>> + Send + 'static
where
    S: Stream<Item = Result<Bytes, OpperError>> + Send + Unpin + 'static,
{
    stream::unfold(Some((input, BytesMut::new())), |state| async move {
        let (mut input, mut buf) = state?;

        loop {
            if let Some(frame) = split_frame(&mut buf) {
                match decode_frame(&frame) {
                    Ok(Some(SseEvent::Done)) => return Some((Ok(SseEvent::Done), None)),
                    Ok(Some(event)) => return Some((Ok(event), Some((input, buf)))),
                    Ok(None) => continue,
                    Err(e) => return Some((Err(e), None)),
                }
            }

            match input.next().await {
                Some(Ok(bytes)) => {
                    buf.extend_from_slice(&bytes);
                    // Normalize CRLF so frame splitting only looks for "\n\n".
                    if buf.contains(&b'\r') {
                        buf = normalize_line_endings(&buf);
                    }
                }
                Some(Err(e)) => return Some((Err(e), None)),
                None => {
                    // A final frame may arrive without the trailing blank line.
                    return match decode_frame(&buf) {
                        Ok(Some(event)) => Some((Ok(event), None)),
                        Ok(None) => None,
                        Err(e) => Some((Err(e), None)),
                    };
                }
            }
        }
    })
}

fn split_frame(buf: &mut BytesMut) -> Option<BytesMut> {
    let idx = buf.windows(2).position(|w| w == b"\n\n")?;
    let frame = buf.split_to(idx);
    buf.advance(2);
    Some(frame)
}

/// Drops every `\r` that precedes a `\n`. A trailing `\r` is kept until its
/// `\n` arrives with the next chunk.
fn normalize_line_endings(buf: &[u8]) -> BytesMut {
    let mut out = BytesMut::with_capacity(buf.len());
    for (i, byte) in buf.iter().enumerate() {
        if *byte == b'\r' && buf.get(i + 1) == Some(&b'\n') {
            continue;
        }
        out.extend_from_slice(&[*byte]);
    }
    out
}

fn decode_frame(frame: &[u8]) -> Result<Option<SseEvent>, OpperError> {
    let text = std::str::from_utf8(frame).map_err(|e| OpperError::Parse {
        message: "Stream frame is not valid UTF-8".to_string(),
        source: Box::new(e),
    })?;
    Ok(parse_frame(text))
}

fn parse_frame(frame: &str) -> Option<SseEvent> {
    let data_lines: Vec<&str> = frame
        .lines()
        .filter_map(|line| line.strip_prefix("data:"))
        .map(|data| data.strip_prefix(' ').unwrap_or(data))
        .collect();

    if data_lines.is_empty() {
        return None;
    }

    let data = data_lines.join("\n");
    if data.trim() == DONE_SIGNAL {
        return Some(SseEvent::Done);
    }
    if data.trim().is_empty() {
        return None;
    }

    Some(SseEvent::Data(data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;

    fn chunks(
        parts: &[&'static str],
    ) -> impl Stream<Item = Result<Bytes, OpperError>> + Send + Unpin + 'static {
        stream::iter(
            parts
                .iter()
                .map(|p| Ok(Bytes::from_static(p.as_bytes())))
                .collect::<Vec<_>>(),
        )
    }

    async fn collect(parts: &[&'static str]) -> Vec<SseEvent> {
        decode(chunks(parts))
            .map(|event| event.expect("event"))
            .collect()
            .await
    }

    #[tokio::test]
    async fn test_frames_split_across_chunks_are_reassembled() {
        let events = collect(&[
            "data: {\"delta\":",
            " \"Hel\"}\n",
            "\ndata: {\"delta\": \"lo\"}\n\n",
        ])
        .await;
        assert_eq!(
            events,
            vec![
                SseEvent::Data("{\"delta\": \"Hel\"}".to_string()),
                SseEvent::Data("{\"delta\": \"lo\"}".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_done_signal_ends_the_stream() {
        let events = collect(&["data: a\n\ndata: [DONE]\n\ndata: ignored\n\n"]).await;
        assert_eq!(events, vec![SseEvent::Data("a".to_string()), SseEvent::Done]);
    }

    #[tokio::test]
    async fn test_comments_and_crlf_are_handled() {
        let events = collect(&[": keep-alive\r\n\r\nevent: message\r\ndata: x\r\n\r\n"]).await;
        assert_eq!(events, vec![SseEvent::Data("x".to_string())]);
    }

    #[tokio::test]
    async fn test_trailing_frame_without_blank_line() {
        let events = collect(&["data: last"]).await;
        assert_eq!(events, vec![SseEvent::Data("last".to_string())]);
    }

    #[tokio::test]
    async fn test_transport_error_is_yielded_once_then_ends() {
        let input = stream::iter(vec![
            Ok(Bytes::from_static(b"data: a\n\n")),
            Err(OpperError::Stream {
                message: "reset".into(),
            }),
            Ok(Bytes::from_static(b"data: b\n\n")),
        ]);
        let events: Vec<_> = decode(input).collect().await;
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], Ok(SseEvent::Data(ref d)) if d == "a"));
        assert!(events[1].is_err());
    }

    #[tokio::test]
    async fn test_multibyte_character_split_across_chunks() {
        let frame = "data: {\"delta\": \"Grüße\"}\n\n".as_bytes();
        let cut = frame.iter().position(|b| *b == 0xC3).unwrap() + 1;
        let input = stream::iter(vec![
            Ok(Bytes::copy_from_slice(&frame[..cut])),
            Ok(Bytes::copy_from_slice(&frame[cut..])),
        ]);

        let events: Vec<_> = decode(input).map(|event| event.unwrap()).collect().await;
        assert_eq!(
            events,
            vec![SseEvent::Data("{\"delta\": \"Grüße\"}".to_string())]
        );
    }

    #[tokio::test]
    async fn test_crlf_split_across_chunks() {
        let events = collect(&["data: a\r", "\n\r\n", "data: b\r\n\r\n"]).await;
        assert_eq!(
            events,
            vec![SseEvent::Data("a".to_string()), SseEvent::Data("b".to_string())]
        );
    }

    #[tokio::test]
    async fn test_invalid_utf8_frame_is_a_parse_error() {
        let input = stream::iter(vec![
            Ok(Bytes::from_static(b"data: \xff\xfe\n\n")),
            Ok(Bytes::from_static(b"data: after\n\n")),
        ]);
        let events: Vec<_> = decode(input).collect().await;
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], Err(OpperError::Parse { .. })));
    }
}
