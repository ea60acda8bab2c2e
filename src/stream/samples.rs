//! Narrowing an event stream to decoded samples

use futures::{Stream, ready};
use pin_project_lite::pin_project;
use std::pin::Pin;
use std::task::{Context, Poll};

use super::ConnectionEvent;

/// Extension trait to pull only decoded values out of an event stream.
pub trait SampleStreamExt<T>: Stream<Item = ConnectionEvent<T>> {
    /// Yield the payload of every `Sample` event and skip everything else.
    ///
    /// The stream ends when the underlying event stream ends.
    fn samples(self) -> Samples<Self>
    where
        Self: Sized,
    {
        Samples { stream: self }
    }
}

impl<T, S: Stream<Item = ConnectionEvent<T>>> SampleStreamExt<T> for S {}

pin_project! {
    /// Stream returned by [`SampleStreamExt::samples`].
    pub struct Samples<S> {
        #[pin]
        stream: S,
    }
}

impl<T, S> Stream for Samples<S>
where
    S: Stream<Item = ConnectionEvent<T>>,
{
    type Item = T;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<T>> {
        let mut this = self.project();

        loop {
            match ready!(this.stream.as_mut().poll_next(cx)) {
                Some(ConnectionEvent::Sample(sample)) => return Poll::Ready(Some(sample)),
                Some(_) => continue,
                None => return Poll::Ready(None),
            }
        }
    }
}
