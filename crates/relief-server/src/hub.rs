//! In-process event fan-out to observers.
//!
//! The hub wraps a `tokio::sync::broadcast` channel. Every published change
//! is stamped with a sequence number and delivered to each live receiver;
//! receivers filter by the topics they subscribed to. Delivery is
//! at-most-once and never blocks the publisher: an observer that falls more
//! than `capacity` events behind loses the oldest ones.

use relief_types::{ChangeEvent, Envelope, Topic};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;

#[derive(Clone)]
pub struct Hub {
    tx: broadcast::Sender<Envelope>,
    /// Last issued sequence number. Held while sending so that sequence
    /// order and channel order agree.
    seq: Arc<Mutex<u64>>,
}

impl Hub {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self {
            tx,
            seq: Arc::new(Mutex::new(0)),
        }
    }

    /// Broadcasts `event` on its topic and returns the envelope sent.
    ///
    /// Having no observers is not an error.
    pub fn publish(&self, event: impl Into<ChangeEvent>) -> Envelope {
        let payload = event.into();
        let mut seq = self.seq.lock().unwrap_or_else(|e| e.into_inner());
        *seq += 1;

        let envelope = Envelope {
            topic: payload.topic(),
            seq: *seq,
            payload,
        };

        match self.tx.send(envelope.clone()) {
            Ok(receivers) => tracing::debug!(
                topic = %envelope.topic,
                seq = envelope.seq,
                kind = envelope.payload.kind().as_str(),
                receivers,
                "event published"
            ),
            Err(_) => tracing::debug!(
                topic = %envelope.topic,
                seq = envelope.seq,
                "event published with no observers"
            ),
        }

        envelope
    }

    /// A new observer with no topics selected.
    pub fn subscribe(&self) -> Subscription {
        Subscription {
            rx: self.tx.subscribe(),
            topics: HashSet::new(),
        }
    }

    /// Raw receiver over every topic, for stream adapters.
    pub fn receiver(&self) -> broadcast::Receiver<Envelope> {
        self.tx.subscribe()
    }

    /// Number of currently connected observers.
    pub fn observer_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

/// One observer's view of the hub.
pub struct Subscription {
    rx: broadcast::Receiver<Envelope>,
    topics: HashSet<Topic>,
}

impl Subscription {
    /// Starts receiving `topic`. Returns `false` if already subscribed.
    pub fn subscribe(&mut self, topic: Topic) -> bool {
        self.topics.insert(topic)
    }

    /// Stops receiving `topic`. Returns `false` if not subscribed.
    pub fn unsubscribe(&mut self, topic: Topic) -> bool {
        self.topics.remove(&topic)
    }

    pub fn topics(&self) -> &HashSet<Topic> {
        &self.topics
    }

    /// Waits for the next event on a subscribed topic.
    ///
    /// Events missed because this observer lagged are skipped with a
    /// warning. Returns `None` once the hub is gone.
    pub async fn recv(&mut self) -> Option<Envelope> {
        loop {
            match self.rx.recv().await {
                Ok(envelope) if self.topics.contains(&envelope.topic) => return Some(envelope),
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    tracing::warn!(missed, "observer lagged; events were dropped");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relief_types::{DisasterEvent, ReportEvent};

    #[tokio::test]
    async fn delivers_only_subscribed_topics_in_order() {
        let hub = Hub::new(16);
        let mut sub = hub.subscribe();
        assert!(sub.subscribe(Topic::DisasterUpdated));
        assert!(!sub.subscribe(Topic::DisasterUpdated));

        hub.publish(DisasterEvent::DeleteAll { count: 1 });
        hub.publish(ReportEvent::Delete {
            id: "r1".to_string(),
            disaster_id: "d1".to_string(),
            report: sample_report(),
        });
        hub.publish(DisasterEvent::DeleteAll { count: 2 });

        let first = sub.recv().await.unwrap();
        let second = sub.recv().await.unwrap();
        assert_eq!(first.seq, 1);
        assert_eq!(second.seq, 3);
        assert_eq!(
            second.payload,
            ChangeEvent::Disaster(DisasterEvent::DeleteAll { count: 2 })
        );
    }

    #[tokio::test]
    async fn every_observer_sees_every_event() {
        let hub = Hub::new(16);
        let mut a = hub.subscribe();
        let mut b = hub.subscribe();
        a.subscribe(Topic::DisasterUpdated);
        b.subscribe(Topic::DisasterUpdated);
        assert_eq!(hub.observer_count(), 2);

        let sent = hub.publish(DisasterEvent::DeleteAll { count: 0 });
        assert_eq!(a.recv().await.unwrap(), sent);
        assert_eq!(b.recv().await.unwrap(), sent);
    }

    #[tokio::test]
    async fn lagging_observer_skips_ahead() {
        let hub = Hub::new(2);
        let mut sub = hub.subscribe();
        sub.subscribe(Topic::DisasterUpdated);

        for count in 0..5 {
            hub.publish(DisasterEvent::DeleteAll { count });
        }

        // Capacity two: only the last two survive.
        assert_eq!(sub.recv().await.unwrap().seq, 4);
        assert_eq!(sub.recv().await.unwrap().seq, 5);
    }

    #[test]
    fn publishing_without_observers_is_fine() {
        let hub = Hub::new(4);
        let envelope = hub.publish(DisasterEvent::DeleteAll { count: 0 });
        assert_eq!(envelope.seq, 1);
        assert_eq!(envelope.topic, Topic::DisasterUpdated);
    }

    #[tokio::test]
    async fn unsubscribed_topics_are_filtered() {
        let hub = Hub::new(8);
        let mut sub = hub.subscribe();
        sub.subscribe(Topic::DisasterUpdated);
        assert!(sub.unsubscribe(Topic::DisasterUpdated));
        sub.subscribe(Topic::ReportUpdated);

        hub.publish(DisasterEvent::DeleteAll { count: 0 });
        hub.publish(ReportEvent::Delete {
            id: "r1".to_string(),
            disaster_id: "d1".to_string(),
            report: sample_report(),
        });

        let got = sub.recv().await.unwrap();
        assert_eq!(got.topic, Topic::ReportUpdated);
        assert_eq!(got.seq, 2);
    }

    fn sample_report() -> relief_types::Report {
        relief_types::Report {
            id: "r1".to_string(),
            disaster_id: "d1".to_string(),
            author: "citizen1".to_string(),
            content: "help".to_string(),
            image_url: None,
            verification_status: relief_types::VerificationStatus::Pending,
            audit_trail: Vec::new(),
            created_at: "2024-01-01T00:00:00.000Z".to_string(),
        }
    }
}
