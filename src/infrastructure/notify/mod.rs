use std::sync::Mutex;
use tokio::sync::mpsc;
use tracing::debug;

use crate::modules::conversion::events::ProgressEvent;

const CHANNEL_CAPACITY: usize = 256;

struct ListenerSlot {
    generation: u64,
    tx: Option<mpsc::Sender<ProgressEvent>>,
}

/// Best-effort outbound channel toward at most one live client.
///
/// Registration is last-writer-wins: a new connection replaces the previous
/// one. Each registration gets a generation tag so that a stale disconnect
/// cannot evict a listener that registered after it. `publish` never blocks
/// and never errors; with no listener (or a saturated one) the event is
/// dropped.
pub struct ProgressNotifier {
    listener: Mutex<ListenerSlot>,
}

impl ProgressNotifier {
    pub fn new() -> Self {
        Self {
            listener: Mutex::new(ListenerSlot {
                generation: 0,
                tx: None,
            }),
        }
    }

    /// Attach a listener, replacing any previous one. Returns the generation
    /// to hand back to `unregister` and the event receiver.
    pub fn register(&self) -> (u64, mpsc::Receiver<ProgressEvent>) {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        let mut slot = self.lock();
        slot.generation += 1;
        slot.tx = Some(tx);
        (slot.generation, rx)
    }

    /// Detach a listener. A no-op unless `generation` still owns the slot.
    pub fn unregister(&self, generation: u64) {
        let mut slot = self.lock();
        if slot.generation == generation {
            slot.tx = None;
        }
    }

    pub fn publish(&self, event: &ProgressEvent) {
        let slot = self.lock();
        if let Some(tx) = &slot.tx {
            if let Err(e) = tx.try_send(event.clone()) {
                debug!("Dropping progress event: {}", e);
            }
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ListenerSlot> {
        self.listener.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for ProgressNotifier {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[tokio::test]
    async fn publish_without_listener_is_a_no_op() {
        let notifier = ProgressNotifier::new();
        notifier.publish(&ProgressEvent::start(Uuid::new_v4()));
    }

    #[tokio::test]
    async fn registered_listener_receives_events_in_order() {
        let notifier = ProgressNotifier::new();
        let job_id = Uuid::new_v4();
        let (_generation, mut rx) = notifier.register();

        notifier.publish(&ProgressEvent::start(job_id));
        notifier.publish(&ProgressEvent::progress(job_id, 25.0));
        notifier.publish(&ProgressEvent::complete(job_id));

        assert_eq!(rx.recv().await, Some(ProgressEvent::start(job_id)));
        assert_eq!(rx.recv().await, Some(ProgressEvent::progress(job_id, 25.0)));
        assert_eq!(rx.recv().await, Some(ProgressEvent::complete(job_id)));
    }

    #[tokio::test]
    async fn events_before_registration_are_not_replayed() {
        let notifier = ProgressNotifier::new();
        let job_id = Uuid::new_v4();

        notifier.publish(&ProgressEvent::start(job_id));
        notifier.publish(&ProgressEvent::progress(job_id, 50.0));

        let (_generation, mut rx) = notifier.register();
        notifier.publish(&ProgressEvent::complete(job_id));

        assert_eq!(rx.recv().await, Some(ProgressEvent::complete(job_id)));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn a_new_listener_replaces_the_old_one() {
        let notifier = ProgressNotifier::new();
        let job_id = Uuid::new_v4();

        let (_first_gen, mut first_rx) = notifier.register();
        let (_second_gen, mut second_rx) = notifier.register();

        notifier.publish(&ProgressEvent::progress(job_id, 10.0));

        // The replaced listener's sender was dropped; its stream just ends.
        assert_eq!(first_rx.recv().await, None);
        assert_eq!(
            second_rx.recv().await,
            Some(ProgressEvent::progress(job_id, 10.0))
        );
    }

    #[tokio::test]
    async fn stale_unregister_does_not_evict_newer_listener() {
        let notifier = ProgressNotifier::new();
        let job_id = Uuid::new_v4();

        let (first_gen, _first_rx) = notifier.register();
        let (_second_gen, mut second_rx) = notifier.register();

        // The first client disconnects after it was already replaced.
        notifier.unregister(first_gen);

        notifier.publish(&ProgressEvent::progress(job_id, 75.0));
        assert_eq!(
            second_rx.recv().await,
            Some(ProgressEvent::progress(job_id, 75.0))
        );
    }

    #[tokio::test]
    async fn unregister_clears_the_slot() {
        let notifier = ProgressNotifier::new();
        let (generation, mut rx) = notifier.register();
        notifier.unregister(generation);

        notifier.publish(&ProgressEvent::start(Uuid::new_v4()));
        assert_eq!(rx.recv().await, None);
    }
}
