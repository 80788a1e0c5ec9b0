//! Server-Sent Events (SSE) frame splitting.
//!
//! This module turns an arbitrarily chunked byte stream into complete
//! text frames. It knows nothing about chat events; see [`crate::stream`]
//! for the layer that interprets frames.
//!
//! SSE format:
//! ```text
//! data: {"type": "meta", "data": {}}
//!
//! : keep-alive
//!
//! data: {"type": "token", "data": "Hi"}
//!
//! ```

use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures::Stream;

/// Separator between two frames: an empty line.
pub const FRAME_DELIMITER: &str = "\n\n";

/// Prefix marking the payload line inside a frame.
pub const DATA_PREFIX: &str = "data: ";

/// Incremental frame buffer.
///
/// Bytes are pushed in whatever pieces the transport delivers and decoded
/// as UTF-8, carrying an incomplete trailing character over to the next
/// push. Complete frames are then pulled out one at a time with
/// [`FrameSplitter::next_frame`].
///
/// # Example
/// ```
/// use assistant_stream::sse::FrameSplitter;
///
/// let mut splitter = FrameSplitter::new();
/// splitter.push(b"data: 1\n");
/// assert_eq!(splitter.next_frame(), None);
///
/// splitter.push(b"\ndata: 2\n\n");
/// assert_eq!(splitter.next_frame().as_deref(), Some("data: 1"));
/// assert_eq!(splitter.next_frame().as_deref(), Some("data: 2"));
/// assert_eq!(splitter.next_frame(), None);
/// ```
#[derive(Debug, Default)]
pub struct FrameSplitter {
    /// Decoded text not yet yielded as part of a frame.
    buffer: String,
    /// Leading bytes of a UTF-8 sequence cut off by a chunk boundary.
    partial: Vec<u8>,
    /// Length of `buffer` already searched for a delimiter without a match.
    scanned: usize,
}

impl FrameSplitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode `chunk` and append it to the buffer.
    ///
    /// Invalid UTF-8 is replaced with U+FFFD rather than rejected.
    pub fn push(&mut self, chunk: &[u8]) {
        let joined;
        let mut rest: &[u8] = if self.partial.is_empty() {
            chunk
        } else {
            let mut bytes = std::mem::take(&mut self.partial);
            bytes.extend_from_slice(chunk);
            joined = bytes;
            &joined
        };

        loop {
            match std::str::from_utf8(rest) {
                Ok(text) => {
                    self.buffer.push_str(text);
                    return;
                }
                Err(e) => {
                    let (valid, tail) = rest.split_at(e.valid_up_to());
                    self.buffer.push_str(&String::from_utf8_lossy(valid));

                    match e.error_len() {
                        Some(len) => {
                            self.buffer.push(char::REPLACEMENT_CHARACTER);
                            rest = &tail[len..];
                        }
                        None => {
                            // Incomplete sequence at the end; wait for its continuation.
                            self.partial.extend_from_slice(tail);
                            return;
                        }
                    }
                }
            }
        }
    }

    /// Pop the next complete frame, without its trailing delimiter.
    ///
    /// Each call only searches text pushed since the previous miss, plus
    /// enough overlap to catch a delimiter cut in two.
    pub fn next_frame(&mut self) -> Option<String> {
        let delimiter = FRAME_DELIMITER.as_bytes();
        let from = self.scanned.saturating_sub(delimiter.len() - 1);
        let Some(offset) = self.buffer.as_bytes()[from..]
            .windows(delimiter.len())
            .position(|window| window == delimiter)
        else {
            self.scanned = self.buffer.len();
            return None;
        };

        // The delimiter is ASCII, so `end` is a char boundary.
        let end = from + offset;
        let frame = self.buffer[..end].to_string();
        self.buffer.drain(..end + delimiter.len());
        self.scanned = 0;
        Some(frame)
    }

    /// Text received but not yet part of a complete frame.
    pub fn buffered(&self) -> &str {
        &self.buffer
    }

    /// Drop whatever is left over at end of stream.
    ///
    /// Returns the number of bytes discarded. An unterminated final frame
    /// is never yielded.
    pub fn finish(&mut self) -> usize {
        let discarded = self.buffer.len() + self.partial.len();
        self.buffer.clear();
        self.partial.clear();
        self.scanned = 0;
        discarded
    }
}

/// Stream of complete frames read from a byte stream.
///
/// The inner stream is only polled when the buffer holds no complete
/// frame, so a chunk is drained of every frame it completes before the
/// next read. The inner stream is dropped as soon as it ends or fails.
pub struct Frames<S> {
    inner: Option<S>,
    splitter: FrameSplitter,
}

impl<S> Frames<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner: Some(inner),
            splitter: FrameSplitter::new(),
        }
    }

    /// Whether the underlying byte stream is still held open.
    pub fn is_open(&self) -> bool {
        self.inner.is_some()
    }
}

impl<S, E> Stream for Frames<S>
where
    S: Stream<Item = Result<Bytes, E>> + Unpin,
{
    type Item = Result<String, E>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = &mut *self;
        loop {
            if let Some(frame) = this.splitter.next_frame() {
                return Poll::Ready(Some(Ok(frame)));
            }

            let Some(inner) = this.inner.as_mut() else {
                return Poll::Ready(None);
            };

            match Pin::new(inner).poll_next(cx) {
                Poll::Ready(Some(Ok(chunk))) => this.splitter.push(&chunk),
                Poll::Ready(Some(Err(e))) => {
                    this.inner = None;
                    return Poll::Ready(Some(Err(e)));
                }
                Poll::Ready(None) => {
                    this.inner = None;
                    let discarded = this.splitter.finish();
                    if discarded > 0 {
                        tracing::debug!(discarded, "stream ended inside a frame; dropping trailing bytes");
                    }
                    return Poll::Ready(None);
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

/// Extension trait to split any byte stream into SSE frames.
///
/// # Example
/// ```ignore
/// use assistant_stream::sse::FramesExt;
///
/// let mut frames = response.bytes_stream().frames();
/// while let Some(frame) = frames.next().await {
///     println!("frame: {}", frame?);
/// }
/// ```
pub trait FramesExt: Sized {
    fn frames(self) -> Frames<Self>;
}

impl<S, E> FramesExt for S
where
    S: Stream<Item = Result<Bytes, E>> + Unpin,
{
    fn frames(self) -> Frames<Self> {
        Frames::new(self)
    }
}

/// Parse an SSE line to extract the data portion.
///
/// # Example
/// ```
/// use assistant_stream::sse::parse_sse_line;
///
/// assert_eq!(parse_sse_line("data: {\"k\":1}"), Some("{\"k\":1}"));
/// assert_eq!(parse_sse_line(": comment"), None);
/// ```
pub fn parse_sse_line(line: &str) -> Option<&str> {
    line.strip_prefix(DATA_PREFIX)
}

/// Find the payload of a frame: the first line carrying the data prefix.
pub fn frame_payload(frame: &str) -> Option<&str> {
    frame.split('\n').find_map(parse_sse_line)
}
