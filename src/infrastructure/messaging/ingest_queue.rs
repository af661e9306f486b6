use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};

/// Background work units. Chunk batches re-enqueue themselves until the
/// database queue drains, then hand off to figure enrichment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestJob {
    ChunkBatch { manual_id: String },
    Figures { manual_id: String },
    Reingest { manual_id: String },
}

impl IngestJob {
    pub fn manual_id(&self) -> &str {
        match self {
            IngestJob::ChunkBatch { manual_id }
            | IngestJob::Figures { manual_id }
            | IngestJob::Reingest { manual_id } => manual_id,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            IngestJob::ChunkBatch { .. } => "chunk_batch",
            IngestJob::Figures { .. } => "figures",
            IngestJob::Reingest { .. } => "reingest",
        }
    }
}

#[derive(Debug)]
pub enum IngestQueueError {
    ChannelClosed,
}

impl std::fmt::Display for IngestQueueError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IngestQueueError::ChannelClosed => write!(f, "Job channel closed"),
        }
    }
}

impl std::error::Error for IngestQueueError {}

/// Sending half, cheap to clone into handlers and workers.
#[derive(Clone)]
pub struct IngestQueue {
    sender: mpsc::UnboundedSender<IngestJob>,
}

/// Receiving half, shared by the background workers behind a mutex so each
/// job is delivered to exactly one worker.
pub struct IngestQueueReceiver {
    receiver: Arc<Mutex<mpsc::UnboundedReceiver<IngestJob>>>,
}

impl IngestQueue {
    pub fn create_pair() -> (Self, IngestQueueReceiver) {
        let (sender, receiver) = mpsc::unbounded_channel();

        (
            Self { sender },
            IngestQueueReceiver {
                receiver: Arc::new(Mutex::new(receiver)),
            },
        )
    }

    pub fn enqueue(&self, job: IngestJob) -> Result<(), IngestQueueError> {
        self.sender
            .send(job)
            .map_err(|_| IngestQueueError::ChannelClosed)
    }
}

impl IngestQueueReceiver {
    pub async fn recv(&self) -> Option<IngestJob> {
        let mut receiver = self.receiver.lock().await;
        receiver.recv().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_jobs_are_delivered_in_order() {
        let (queue, receiver) = IngestQueue::create_pair();

        queue
            .enqueue(IngestJob::ChunkBatch {
                manual_id: "m-1".to_string(),
            })
            .unwrap();
        queue
            .enqueue(IngestJob::Figures {
                manual_id: "m-1".to_string(),
            })
            .unwrap();

        let first = receiver.recv().await.unwrap();
        assert_eq!(first.kind(), "chunk_batch");
        let second = receiver.recv().await.unwrap();
        assert_eq!(second.kind(), "figures");
    }

    #[tokio::test]
    async fn test_enqueue_fails_after_receiver_drops() {
        let (queue, receiver) = IngestQueue::create_pair();
        drop(receiver);

        let result = queue.enqueue(IngestJob::Reingest {
            manual_id: "m-1".to_string(),
        });
        assert!(result.is_err());
    }
}
