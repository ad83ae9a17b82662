//! Server-sent event framing over a byte stream.
//!
//! The streaming endpoint answers with `text/event-stream`, one JSON
//! document per `data:` block. Blocks are separated by a blank line and
//! may use either `\n` or `\r\n` line endings.

use crate::Error;
use futures_util::{Stream, StreamExt};
use memchr::memmem;
use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{ready, Context, Poll};

/// Upper bound on buffered bytes that have not formed a complete event.
const MAX_PENDING_BYTES: usize = 1 << 20;

/// One decoded event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseEvent {
    /// The `event:` field, if the block had one.
    pub event_type: Option<String>,
    /// All `data:` lines joined with `\n`.
    pub data: String,
}

impl SseEvent {
    fn parse(block: &str) -> Option<SseEvent> {
        let mut event_type = None;
        let mut data: Option<String> = None;

        for line in block.lines() {
            if line.is_empty() || line.starts_with(':') {
                continue;
            }
            let (field, value) = line.split_once(':').unwrap_or((line, ""));
            let value = value.strip_prefix(' ').unwrap_or(value);
            match field {
                "event" => event_type = Some(value.to_string()),
                "data" => match data.as_mut() {
                    Some(existing) => {
                        existing.push('\n');
                        existing.push_str(value);
                    }
                    None => data = Some(value.to_string()),
                },
                _ => {}
            }
        }

        data.map(|data| SseEvent { event_type, data })
    }
}

/// Adapts a byte stream into a stream of [`SseEvent`]s.
pub struct SseStream<S> {
    inner: S,
    pending: Vec<u8>,
    ready: VecDeque<SseEvent>,
    finished: bool,
}

impl<S> SseStream<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            pending: Vec::new(),
            ready: VecDeque::new(),
            finished: false,
        }
    }

    fn push_chunk(&mut self, chunk: &[u8]) -> Result<(), Error> {
        self.pending
            .extend(chunk.iter().copied().filter(|&byte| byte != b'\r'));

        let finder = memmem::Finder::new(b"\n\n");
        let mut consumed = 0;
        while let Some(pos) = finder.find(&self.pending[consumed..]) {
            let end = consumed + pos;
            Self::decode_block(&self.pending[consumed..end], &mut self.ready)?;
            consumed = end + 2;
        }
        self.pending.drain(..consumed);

        if self.pending.len() > MAX_PENDING_BYTES {
            self.pending.clear();
            return Err(Error::streaming("event exceeded the maximum buffered size"));
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<(), Error> {
        let rest = std::mem::take(&mut self.pending);
        if rest.iter().any(|byte| !byte.is_ascii_whitespace()) {
            Self::decode_block(&rest, &mut self.ready)?;
        }
        Ok(())
    }

    fn decode_block(bytes: &[u8], out: &mut VecDeque<SseEvent>) -> Result<(), Error> {
        let text = std::str::from_utf8(bytes)
            .map_err(|e| Error::streaming(format!("invalid UTF-8 in event: {e}")))?;
        if let Some(event) = SseEvent::parse(text.trim_start_matches('\u{feff}')) {
            out.push_back(event);
        }
        Ok(())
    }
}

impl<S, E> Stream for SseStream<S>
where
    S: Stream<Item = Result<bytes::Bytes, E>> + Unpin,
    E: std::fmt::Display,
{
    type Item = Result<SseEvent, Error>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        loop {
            if let Some(event) = self.ready.pop_front() {
                return Poll::Ready(Some(Ok(event)));
            }
            if self.finished {
                return Poll::Ready(None);
            }

            let step = match ready!(self.inner.poll_next_unpin(cx)) {
                Some(Ok(chunk)) => self.push_chunk(&chunk),
                Some(Err(e)) => Err(Error::streaming(format!("body read failed: {e}"))),
                None => {
                    self.finished = true;
                    self.flush()
                }
            };
            if let Err(e) = step {
                return Poll::Ready(Some(Err(e)));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::stream;

    type ByteChunks = stream::Iter<std::vec::IntoIter<Result<bytes::Bytes, std::io::Error>>>;

    fn events_from(chunks: &[&[u8]]) -> SseStream<ByteChunks> {
        let chunks: Vec<_> = chunks
            .iter()
            .map(|chunk| Ok(bytes::Bytes::copy_from_slice(chunk)))
            .collect();
        SseStream::new(stream::iter(chunks))
    }

    #[tokio::test]
    async fn test_events_split_across_chunks() {
        let mut events = events_from(&[b"data: Hel", b"lo\n", b"\ndata: World\n\n"]);

        assert_eq!(events.next().await.unwrap().unwrap().data, "Hello");
        assert_eq!(events.next().await.unwrap().unwrap().data, "World");
        assert!(events.next().await.is_none());
    }

    #[tokio::test]
    async fn test_crlf_separators() {
        let mut events = events_from(&[b"data: {\"a\":1}\r\n\r\ndata: {\"a\":2}\r", b"\n\r\n"]);

        assert_eq!(events.next().await.unwrap().unwrap().data, "{\"a\":1}");
        assert_eq!(events.next().await.unwrap().unwrap().data, "{\"a\":2}");
        assert!(events.next().await.is_none());
    }

    #[tokio::test]
    async fn test_multiline_data_and_comments() {
        let mut events = events_from(&[b": keep-alive\nevent: chunk\ndata: one\ndata: two\n\n"]);

        let event = events.next().await.unwrap().unwrap();
        assert_eq!(event.event_type.as_deref(), Some("chunk"));
        assert_eq!(event.data, "one\ntwo");
    }

    #[tokio::test]
    async fn test_trailing_event_without_separator() {
        let mut events = events_from(&[b"data: first\n\n", b"data: last"]);

        assert_eq!(events.next().await.unwrap().unwrap().data, "first");
        assert_eq!(events.next().await.unwrap().unwrap().data, "last");
        assert!(events.next().await.is_none());
    }

    #[tokio::test]
    async fn test_utf8_split_across_chunks() {
        // "€" is E2 82 AC
        let mut events = events_from(&[b"data: 5\xE2\x82", b"\xAC\n\n"]);

        assert_eq!(events.next().await.unwrap().unwrap().data, "5€");
    }

    #[tokio::test]
    async fn test_invalid_utf8_is_an_error() {
        let mut events = events_from(&[b"data: \xFF\xFE\n\n"]);

        assert!(matches!(
            events.next().await,
            Some(Err(Error::Streaming(_)))
        ));
    }
}
