//! Chat event stream decoding.
//!
//! [`ChatEventStream`] sits on top of [`crate::sse::Frames`] and turns each
//! frame into a [`ChatEvent`]:
//!
//! - frames without a `data: ` line (comments, keep-alives) are skipped;
//! - the payload of the first `data: ` line is parsed as JSON;
//! - a payload that fails to parse ends the stream with
//!   [`ClientError::Protocol`].
//!
//! Event kinds are not inspected here. Whatever `type` the server sends is
//! passed through in order.

use std::fmt;
use std::pin::Pin;
use std::task::{ready, Context, Poll};

use futures::stream::FusedStream;
use futures::Stream;

use crate::client::ClientError;
use crate::http::ByteStream;
use crate::model::ChatEvent;
use crate::sse::{frame_payload, Frames, FramesExt};

/// Decode a single frame.
///
/// Returns `Ok(None)` for frames that carry no payload line. The payload
/// must be a JSON object with a string `type` field; anything else, even
/// valid JSON such as `42` or `{"data":1}`, is a [`ClientError::Protocol`].
pub fn decode_frame(frame: &str) -> Result<Option<ChatEvent>, ClientError> {
    let Some(payload) = frame_payload(frame) else {
        return Ok(None);
    };
    serde_json::from_str(payload)
        .map(Some)
        .map_err(|source| ClientError::Protocol {
            payload: payload.to_string(),
            source,
        })
}

/// Lazily decoded events of one chat response.
///
/// The response body is read only when the caller polls for an event that
/// is not already buffered. The body is released as soon as the stream
/// ends or fails, and on drop if the caller stops early.
pub struct ChatEventStream {
    frames: Option<Frames<ByteStream>>,
}

impl ChatEventStream {
    pub fn new(body: ByteStream) -> Self {
        Self {
            frames: Some(body.frames()),
        }
    }

    /// Whether the response body is still held.
    pub fn is_open(&self) -> bool {
        self.frames.as_ref().is_some_and(Frames::is_open)
    }
}

impl Stream for ChatEventStream {
    type Item = Result<ChatEvent, ClientError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = &mut *self;
        loop {
            let Some(frames) = this.frames.as_mut() else {
                return Poll::Ready(None);
            };
            let polled = ready!(Pin::new(frames).poll_next(cx));

            let result = match polled {
                Some(Ok(frame)) => decode_frame(&frame),
                Some(Err(e)) => Err(e),
                None => {
                    this.frames = None;
                    return Poll::Ready(None);
                }
            };

            match result {
                Ok(Some(event)) => return Poll::Ready(Some(Ok(event))),
                Ok(None) => tracing::trace!("skipping frame without payload"),
                Err(e) => {
                    tracing::debug!(error = %e, "chat stream failed");
                    this.frames = None;
                    return Poll::Ready(Some(Err(e)));
                }
            }
        }
    }
}

impl FusedStream for ChatEventStream {
    fn is_terminated(&self) -> bool {
        self.frames.is_none()
    }
}

impl Drop for ChatEventStream {
    fn drop(&mut self) {
        if self.is_open() {
            tracing::debug!("chat stream dropped before the response ended; closing connection");
        }
    }
}

impl fmt::Debug for ChatEventStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatEventStream")
            .field("open", &self.is_open())
            .finish()
    }
}
