use tokio::sync::broadcast;
use tracing::debug;

use crate::application::ports::{UploadCompleted, UploadEventPublisher};

/// Fans upload notifications out to every live subscriber.
///
/// Slow subscribers lag and lose the oldest events; nobody listening is
/// not an error.
pub struct BroadcastUploadNotifier {
    sender: broadcast::Sender<UploadCompleted>,
}

impl BroadcastUploadNotifier {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<UploadCompleted> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for BroadcastUploadNotifier {
    fn default() -> Self {
        Self::new(256)
    }
}

impl UploadEventPublisher for BroadcastUploadNotifier {
    fn publish(&self, event: UploadCompleted) {
        let file_id = event.file_id;
        match self.sender.send(event) {
            Ok(receivers) => debug!(file_id = %file_id, receivers, "Upload notification sent"),
            Err(_) => debug!(file_id = %file_id, "No subscribers for upload notification"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::{FileId, OwnerId};

    fn event(id: i64) -> UploadCompleted {
        UploadCompleted {
            file_id: FileId::new(id),
            owner_id: OwnerId::new("user-1").unwrap(),
            display_name: "a.png".to_string(),
            storage_key: "uploads/x_a.png".to_string(),
        }
    }

    #[tokio::test]
    async fn test_subscribers_receive_events() {
        let notifier = BroadcastUploadNotifier::new(8);
        let mut first = notifier.subscribe();
        let mut second = notifier.subscribe();

        notifier.publish(event(1));

        assert_eq!(first.recv().await.unwrap().file_id, FileId::new(1));
        assert_eq!(second.recv().await.unwrap().file_id, FileId::new(1));
    }

    #[test]
    fn test_publish_without_subscribers_is_silent() {
        let notifier = BroadcastUploadNotifier::default();
        assert_eq!(notifier.subscriber_count(), 0);
        notifier.publish(event(1));
    }
}
