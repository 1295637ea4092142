use serde::Serialize;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use uuid::Uuid;

/// Ledger change notifications.
///
/// Published after the store write commits. Subscribers use them to
/// invalidate views of a user's data without polling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum LedgerEvent {
    TransactionAdded { user_id: Uuid, transaction_id: Uuid },
    TransactionUpdated { user_id: Uuid, transaction_id: Uuid },
    TransactionDeleted { user_id: Uuid, transaction_id: Uuid },
    TransactionsCleared { user_id: Uuid, count: u64 },
    UserDeleted { user_id: Uuid },
    FeedbackCreated { user_id: Uuid, feedback_id: Uuid },
    FeedbackDeleted { feedback_id: Uuid },
}

impl LedgerEvent {
    pub fn name(&self) -> &'static str {
        match self {
            LedgerEvent::TransactionAdded { .. } => "transactionAdded",
            LedgerEvent::TransactionUpdated { .. } => "transactionUpdated",
            LedgerEvent::TransactionDeleted { .. } => "transactionDeleted",
            LedgerEvent::TransactionsCleared { .. } => "transactionsCleared",
            LedgerEvent::UserDeleted { .. } => "userDeleted",
            LedgerEvent::FeedbackCreated { .. } => "feedbackCreated",
            LedgerEvent::FeedbackDeleted { .. } => "feedbackDeleted",
        }
    }

    /// Owner whose ledger changed, when the event is user-scoped.
    pub fn user_id(&self) -> Option<Uuid> {
        match self {
            LedgerEvent::TransactionAdded { user_id, .. }
            | LedgerEvent::TransactionUpdated { user_id, .. }
            | LedgerEvent::TransactionDeleted { user_id, .. }
            | LedgerEvent::TransactionsCleared { user_id, .. }
            | LedgerEvent::UserDeleted { user_id }
            | LedgerEvent::FeedbackCreated { user_id, .. } => Some(*user_id),
            LedgerEvent::FeedbackDeleted { .. } => None,
        }
    }
}

const DEFAULT_CAPACITY: usize = 256;

/// In-process fan-out of `LedgerEvent`s.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<LedgerEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Returns how many subscribers saw the event. Having none is not an error.
    pub fn publish(&self, event: LedgerEvent) -> usize {
        self.sender.send(event).unwrap_or(0)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LedgerEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Background task that traces every event at debug level.
pub fn spawn_event_logger(bus: &EventBus) -> JoinHandle<()> {
    let mut receiver = bus.subscribe();
    tokio::spawn(async move {
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    tracing::debug!(event = event.name(), user_id = ?event.user_id(), "ledger event");
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Event logger lagged behind");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}
