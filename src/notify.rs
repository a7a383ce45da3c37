use tokio::sync::broadcast;

use crate::model::{EventId, TemplateId};

const CHANNEL_CAPACITY: usize = 256;

/// What a store mutation did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeKind {
    EventAdded { id: EventId },
    EventUpdated { id: EventId },
    EventDeleted { id: EventId },
    CompletionToggled { id: EventId, is_completed: bool },
    EventsCleared,
    EventsImported { count: usize },
    TemplateSaved { id: TemplateId },
    TemplateApplied { id: TemplateId, count: usize },
    TemplateDeleted { id: TemplateId },
}

impl ChangeKind {
    /// Short label for logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            ChangeKind::EventAdded { .. } => "add",
            ChangeKind::EventUpdated { .. } => "update",
            ChangeKind::EventDeleted { .. } => "delete",
            ChangeKind::CompletionToggled { .. } => "toggle_completion",
            ChangeKind::EventsCleared => "clear",
            ChangeKind::EventsImported { .. } => "import",
            ChangeKind::TemplateSaved { .. } => "save_template",
            ChangeKind::TemplateApplied { .. } => "apply_template",
            ChangeKind::TemplateDeleted { .. } => "delete_template",
        }
    }

    /// Whether the event collection (and so the geometry) may have changed.
    pub fn touches_events(&self) -> bool {
        !matches!(
            self,
            ChangeKind::TemplateSaved { .. } | ChangeKind::TemplateDeleted { .. }
        )
    }
}

/// A committed mutation, tagged with the store version it produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreChange {
    pub version: u64,
    pub kind: ChangeKind,
}

/// Broadcast hub for store changes.
pub struct ChangeHub {
    sender: broadcast::Sender<StoreChange>,
}

impl Default for ChangeHub {
    fn default() -> Self {
        Self::new()
    }
}

impl ChangeHub {
    pub fn new() -> Self {
        Self {
            sender: broadcast::channel(CHANNEL_CAPACITY).0,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreChange> {
        self.sender.subscribe()
    }

    /// Send a notification. No-op if nobody is listening.
    pub fn send(&self, change: StoreChange) {
        let _ = self.sender.send(change);
    }

    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscribe_and_receive() {
        let hub = ChangeHub::new();
        let mut rx = hub.subscribe();

        let change = StoreChange {
            version: 1,
            kind: ChangeKind::EventAdded { id: EventId::from("1") },
        };
        hub.send(change.clone());

        let received = rx.recv().await.unwrap();
        assert_eq!(received, change);
    }

    #[tokio::test]
    async fn send_without_subscribers_is_noop() {
        let hub = ChangeHub::new();
        assert_eq!(hub.receiver_count(), 0);
        // No subscriber, should not panic
        hub.send(StoreChange {
            version: 1,
            kind: ChangeKind::EventsCleared,
        });
    }

    #[test]
    fn template_changes_leave_events_alone() {
        assert!(!ChangeKind::TemplateSaved { id: TemplateId::from("t") }.touches_events());
        assert!(ChangeKind::TemplateApplied { id: TemplateId::from("t"), count: 2 }.touches_events());
        assert!(ChangeKind::EventsCleared.touches_events());
    }
}
