use futures::prelude::*;
pub use kube::runtime::watcher::{Event, Result};
use std::pin::Pin;
use tracing::{info, Instrument};

/// Wraps a resource event stream that logs and skips failures.
pub struct Watch<T> {
    span: tracing::Span,
    rx: Pin<Box<dyn Stream<Item = Result<Event<T>>> + Send + 'static>>,
}

// === impl Watch ===

impl<T, W> From<W> for Watch<T>
where
    W: Stream<Item = Result<Event<T>>> + Send + 'static,
{
    fn from(watch: W) -> Self {
        Self::new(watch.boxed())
    }
}

impl<T> Watch<T> {
    pub fn new(rx: Pin<Box<dyn Stream<Item = Result<Event<T>>> + Send + 'static>>) -> Watch<T> {
        Self {
            rx,
            span: tracing::Span::current(),
        }
    }

    pub fn instrument(mut self, span: tracing::Span) -> Self {
        self.span = span;
        self
    }

    /// The events of the watch, with failures logged and skipped.
    pub fn into_stream(self) -> impl Stream<Item = Event<T>> + Send + 'static
    where
        T: 'static,
    {
        futures::stream::unfold(self, |mut watch| async move {
            let event = watch.recv().await?;
            Some((event, watch))
        })
    }

    /// Receive the next event in the stream.
    ///
    /// Failures are logged and skipped; the underlying watcher is responsible for backing off
    /// and reconnecting. Returns `None` only if the stream ends.
    pub async fn recv(&mut self) -> Option<Event<T>> {
        loop {
            let ev = self.rx.next().instrument(self.span.clone()).await?;
            match ev {
                Ok(ev) => return Some(ev),
                Err(error) => {
                    info!(parent: &self.span, %error, "Watch failed");
                }
            }
        }
    }
}
