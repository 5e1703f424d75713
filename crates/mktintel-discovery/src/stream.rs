//! Incremental delivery of artifacts over a channel.

use std::time::Duration;

use mktintel_core::Artifact;
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::time::Instant;

/// Buffered events between the producer task and the consumer.
pub const STREAM_CHANNEL_CAPACITY: usize = 16;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum StreamEvent {
    Start { total: usize },
    Item { index: usize, artifact: Artifact },
    ItemError { index: usize, message: String },
    /// `total` counts delivered items, not attempted ones.
    Complete { total: usize },
}

/// Producer side of a stream. Tracks delivered items and notices when the
/// receiver has gone away.
pub struct StreamEmitter {
    tx: mpsc::Sender<StreamEvent>,
    delivered: usize,
}

impl StreamEmitter {
    #[must_use]
    pub fn new(tx: mpsc::Sender<StreamEvent>) -> Self {
        Self { tx, delivered: 0 }
    }

    /// Returns `false` once the receiver is dropped; producers should stop.
    pub async fn start(&mut self, total: usize) -> bool {
        self.send(StreamEvent::Start { total }).await
    }

    pub async fn item(&mut self, index: usize, artifact: Artifact) -> bool {
        let sent = self.send(StreamEvent::Item { index, artifact }).await;
        if sent {
            self.delivered += 1;
        }
        sent
    }

    pub async fn item_error(&mut self, index: usize, message: impl Into<String>) -> bool {
        self.send(StreamEvent::ItemError {
            index,
            message: message.into(),
        })
        .await
    }

    /// Send the terminal event. Consumes the emitter.
    pub async fn complete(mut self) {
        let total = self.delivered;
        self.send(StreamEvent::Complete { total }).await;
    }

    #[must_use]
    pub fn delivered(&self) -> usize {
        self.delivered
    }

    async fn send(&mut self, event: StreamEvent) -> bool {
        if self.tx.send(event).await.is_err() {
            tracing::debug!("stream receiver dropped, stopping");
            return false;
        }
        true
    }
}

/// Replay already-generated artifacts with `pacing` between items.
///
/// Pacing never extends past `deadline`; once it has passed the remaining
/// items are sent back to back.
pub async fn replay(
    mut emitter: StreamEmitter,
    artifacts: Vec<Artifact>,
    pacing: Duration,
    deadline: Instant,
) {
    if !emitter.start(artifacts.len()).await {
        return;
    }
    for (index, artifact) in artifacts.into_iter().enumerate() {
        if index > 0 && !pacing.is_zero() {
            let wake = (Instant::now() + pacing).min(deadline);
            tokio::time::sleep_until(wake).await;
        }
        if !emitter.item(index, artifact).await {
            return;
        }
    }
    emitter.complete().await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use mktintel_core::CampaignIdea;

    fn idea(title: &str) -> Artifact {
        Artifact::Campaign(CampaignIdea {
            title: title.to_string(),
            summary: "s".to_string(),
            channel: None,
            goal: None,
            call_to_action: None,
            content_formats: vec![],
        })
    }

    #[tokio::test(start_paused = true)]
    async fn replay_emits_start_items_and_complete() {
        let (tx, mut rx) = mpsc::channel(STREAM_CHANNEL_CAPACITY);
        let deadline = Instant::now() + Duration::from_secs(30);
        let started = Instant::now();
        tokio::spawn(replay(
            StreamEmitter::new(tx),
            vec![idea("a"), idea("b"), idea("c")],
            Duration::from_millis(150),
            deadline,
        ));

        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }
        assert_eq!(events.len(), 5);
        assert_eq!(events[0], StreamEvent::Start { total: 3 });
        assert!(matches!(events[1], StreamEvent::Item { index: 0, .. }));
        assert!(matches!(events[3], StreamEvent::Item { index: 2, .. }));
        assert_eq!(events[4], StreamEvent::Complete { total: 3 });
        assert!(Instant::now() - started >= Duration::from_millis(300));
    }

    #[tokio::test(start_paused = true)]
    async fn pacing_is_capped_by_deadline() {
        let (tx, mut rx) = mpsc::channel(STREAM_CHANNEL_CAPACITY);
        let started = Instant::now();
        let deadline = started + Duration::from_millis(100);
        tokio::spawn(replay(
            StreamEmitter::new(tx),
            vec![idea("a"), idea("b"), idea("c"), idea("d")],
            Duration::from_secs(10),
            deadline,
        ));

        let mut count = 0;
        while rx.recv().await.is_some() {
            count += 1;
        }
        assert_eq!(count, 6);
        assert!(Instant::now() - started < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn dropped_receiver_stops_emitter() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let mut emitter = StreamEmitter::new(tx);
        assert!(!emitter.start(2).await);
        assert!(!emitter.item(0, idea("a")).await);
        assert_eq!(emitter.delivered(), 0);
    }

    #[test]
    fn events_serialize_with_tag() {
        let json = serde_json::to_value(StreamEvent::ItemError {
            index: 2,
            message: "boom".to_string(),
        })
        .unwrap();
        assert_eq!(
            json,
            serde_json::json!({"event": "item_error", "index": 2, "message": "boom"})
        );
    }
}
