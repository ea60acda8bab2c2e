//! State and event plumbing shared by the controller and its read loop

use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, trace};

use crate::LinkError;
use crate::stream::ConnectionEvent;
use crate::types::{ConnectionState, ErrorReason};

/// Single source of truth for the connection state plus the ordered event queue.
///
/// Every state change happens inside the watch channel's write lock and emits
/// its `StateChanged` event from there, so state order and event order agree.
pub(crate) struct Shared<T> {
    state: watch::Sender<ConnectionState>,
    events: mpsc::UnboundedSender<ConnectionEvent<T>>,
}

impl<T> Shared<T> {
    pub(crate) fn new(events: mpsc::UnboundedSender<ConnectionEvent<T>>) -> Self {
        let (state, _) = watch::channel(ConnectionState::Disconnected);
        Self { state, events }
    }

    pub(crate) fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }

    pub(crate) fn emit(&self, event: ConnectionEvent<T>) {
        if self.events.send(event).is_err() {
            trace!("Event receiver dropped, discarding event");
        }
    }

    /// Move to `next` if `allowed` accepts the current state.
    ///
    /// Returns false (and emits nothing) when rejected or already in `next`.
    pub(crate) fn transition_if(
        &self,
        allowed: impl FnOnce(&ConnectionState) -> bool,
        next: ConnectionState,
    ) -> bool {
        self.state.send_if_modified(|current| {
            if *current == next || !allowed(current) {
                return false;
            }
            let old = std::mem::replace(current, next);
            debug!("Connection state: {} -> {}", old, next);
            self.emit(ConnectionEvent::StateChanged { old, new: next });
            true
        })
    }

    /// Report a read-loop failure unless the session is shutting down.
    ///
    /// The closing check and the state change happen under the same lock, so a
    /// `disconnect()` that cancelled `closing` first always suppresses the event.
    pub(crate) fn connection_lost(&self, closing: &CancellationToken, cause: LinkError) -> bool {
        self.state.send_if_modified(|current| {
            if closing.is_cancelled() || *current != ConnectionState::Connected {
                debug!("Read loop ended during shutdown: {}", cause);
                return false;
            }
            let next = ConnectionState::Error(ErrorReason::ConnectionLost);
            let old = std::mem::replace(current, next);
            error!("Connection lost: {}", cause);
            self.emit(ConnectionEvent::StateChanged { old, new: next });
            self.emit(ConnectionEvent::ConnectionLost { cause });
            true
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DataSample;

    fn shared() -> (Shared<DataSample>, mpsc::UnboundedReceiver<ConnectionEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Shared::new(tx), rx)
    }

    #[test]
    fn rejected_transition_emits_nothing() {
        let (shared, mut rx) = shared();
        assert!(!shared.transition_if(|s| *s == ConnectionState::Connected, ConnectionState::Connecting));
        assert!(rx.try_recv().is_err());
        assert_eq!(shared.state(), ConnectionState::Disconnected);
    }

    #[test]
    fn same_state_transition_is_a_no_op() {
        let (shared, mut rx) = shared();
        assert!(!shared.transition_if(|_| true, ConnectionState::Disconnected));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn loss_suppressed_once_closing() {
        let (shared, mut rx) = shared();
        shared.transition_if(|_| true, ConnectionState::Connected);
        let _ = rx.try_recv();

        let closing = CancellationToken::new();
        closing.cancel();
        assert!(!shared.connection_lost(&closing, LinkError::connection_lost("x")));
        assert_eq!(shared.state(), ConnectionState::Connected);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn loss_emits_state_then_event() {
        let (shared, mut rx) = shared();
        shared.transition_if(|_| true, ConnectionState::Connected);
        let _ = rx.try_recv();

        assert!(shared.connection_lost(&CancellationToken::new(), LinkError::connection_lost("x")));
        assert!(matches!(
            rx.try_recv(),
            Ok(ConnectionEvent::StateChanged {
                new: ConnectionState::Error(ErrorReason::ConnectionLost),
                ..
            })
        ));
        assert!(matches!(rx.try_recv(), Ok(ConnectionEvent::ConnectionLost { .. })));
    }
}
