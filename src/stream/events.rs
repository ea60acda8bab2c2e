//! Connection events and their delivery to an observer

use futures::Stream;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::mpsc;

use crate::error::{DecodeError, LinkError};
use crate::types::{ConnectionState, DataSample};

/// Something the controller observed, in the order it happened.
#[derive(Debug)]
pub enum ConnectionEvent<T = DataSample> {
    /// A frame decoded successfully.
    Sample(T),

    /// A frame could not be decoded. The connection stays up.
    DecodeError { raw: String, cause: DecodeError },

    /// The link failed without a preceding `disconnect()`.
    ConnectionLost { cause: LinkError },

    /// The controller moved between states.
    StateChanged { old: ConnectionState, new: ConnectionState },
}

impl<T> ConnectionEvent<T> {
    /// Hand this event to the matching observer callback.
    pub fn deliver_to<O>(self, observer: &mut O)
    where
        O: Observer<T> + ?Sized,
    {
        match self {
            ConnectionEvent::Sample(sample) => observer.on_sample(sample),
            ConnectionEvent::DecodeError { raw, cause } => observer.on_decode_error(&raw, &cause),
            ConnectionEvent::ConnectionLost { cause } => observer.on_connection_lost(&cause),
            ConnectionEvent::StateChanged { old, new } => observer.on_state_changed(old, new),
        }
    }

    pub fn is_sample(&self) -> bool {
        matches!(self, ConnectionEvent::Sample(_))
    }
}

/// Receives controller events, typically a UI layer.
///
/// Every callback defaults to a no-op so observers only implement what they
/// render.
pub trait Observer<T = DataSample> {
    fn on_sample(&mut self, _sample: T) {}

    fn on_decode_error(&mut self, _raw: &str, _cause: &DecodeError) {}

    fn on_connection_lost(&mut self, _cause: &LinkError) {}

    fn on_state_changed(&mut self, _old: ConnectionState, _new: ConnectionState) {}
}

/// Receiving end of a controller's event channel.
///
/// The read loop only ever enqueues; callbacks run wherever this receiver is
/// polled, so the observer never runs on the read-loop task. The stream ends
/// once the controller and its read loop are gone.
#[derive(Debug)]
pub struct EventReceiver<T = DataSample> {
    rx: mpsc::UnboundedReceiver<ConnectionEvent<T>>,
}

impl<T> EventReceiver<T> {
    pub(crate) fn new(rx: mpsc::UnboundedReceiver<ConnectionEvent<T>>) -> Self {
        Self { rx }
    }

    /// Wait for the next event.
    pub async fn recv(&mut self) -> Option<ConnectionEvent<T>> {
        self.rx.recv().await
    }

    /// Take the next event if one is queued.
    pub fn try_recv(&mut self) -> Option<ConnectionEvent<T>> {
        self.rx.try_recv().ok()
    }

    /// Deliver events to `observer` until the controller goes away.
    ///
    /// Returns the number of events delivered.
    pub async fn dispatch<O>(&mut self, observer: &mut O) -> usize
    where
        O: Observer<T> + ?Sized,
    {
        let mut delivered = 0;
        while let Some(event) = self.rx.recv().await {
            event.deliver_to(observer);
            delivered += 1;
        }
        delivered
    }

    /// Deliver whatever is queued right now without waiting.
    ///
    /// Suits a UI loop that drains the channel once per tick.
    pub fn dispatch_pending<O>(&mut self, observer: &mut O) -> usize
    where
        O: Observer<T> + ?Sized,
    {
        let mut delivered = 0;
        while let Ok(event) = self.rx.try_recv() {
            event.deliver_to(observer);
            delivered += 1;
        }
        delivered
    }
}

impl<T> Stream for EventReceiver<T> {
    type Item = ConnectionEvent<T>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ErrorReason;

    #[derive(Default)]
    struct Recorder {
        log: Vec<String>,
    }

    impl Observer for Recorder {
        fn on_sample(&mut self, sample: DataSample) {
            self.log.push(format!("sample {:?}", sample.temperature));
        }

        fn on_decode_error(&mut self, raw: &str, _cause: &DecodeError) {
            self.log.push(format!("decode {}", raw));
        }

        fn on_connection_lost(&mut self, _cause: &LinkError) {
            self.log.push("lost".to_string());
        }

        fn on_state_changed(&mut self, old: ConnectionState, new: ConnectionState) {
            self.log.push(format!("{} -> {}", old, new));
        }
    }

    #[test]
    fn dispatch_pending_delivers_in_order() {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut receiver = EventReceiver::new(rx);

        tx.send(ConnectionEvent::Sample(DataSample::new(None, Some(1.0), None))).unwrap();
        tx.send(ConnectionEvent::DecodeError { raw: "oops".into(), cause: DecodeError::Empty })
            .unwrap();
        tx.send(ConnectionEvent::ConnectionLost { cause: LinkError::connection_lost("x") })
            .unwrap();
        tx.send(ConnectionEvent::StateChanged {
            old: ConnectionState::Connected,
            new: ConnectionState::Error(ErrorReason::ConnectionLost),
        })
        .unwrap();

        let mut recorder = Recorder::default();
        assert_eq!(receiver.dispatch_pending(&mut recorder), 4);
        assert_eq!(
            recorder.log,
            vec!["sample Some(1.0)", "decode oops", "lost", "connected -> error (connection lost)"]
        );
        assert_eq!(receiver.dispatch_pending(&mut recorder), 0);
    }

    #[tokio::test]
    async fn dispatch_returns_when_senders_drop() {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut receiver = EventReceiver::new(rx);

        tx.send(ConnectionEvent::Sample(DataSample::default())).unwrap();
        drop(tx);

        let mut recorder = Recorder::default();
        assert_eq!(receiver.dispatch(&mut recorder).await, 1);
    }

    #[test]
    fn default_observer_ignores_everything() {
        struct Silent;
        impl Observer for Silent {}

        let event: ConnectionEvent = ConnectionEvent::Sample(DataSample::default());
        event.deliver_to(&mut Silent);
    }
}
