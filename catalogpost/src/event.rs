use crate::submission::SubmissionState;
use log::{debug, error};
use serde::{Deserialize, Serialize};
use tokio::fs::File;
use tokio::sync::Mutex;
use uuid::Uuid;

/// One orchestrator state transition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub submission_id: Uuid,
    pub from: SubmissionState,
    pub to: SubmissionState,
    pub detail: Option<String>,
    pub timestamp: u64,
}

#[async_trait::async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, event: &Event);
}

/// Forwards events to the logger, the default when no event file is configured
pub struct EventPublisherLog;

#[async_trait::async_trait]
impl EventPublisher for EventPublisherLog {
    async fn publish(&self, event: &Event) {
        debug!(
            "submission={}; {} -> {} {}",
            event.submission_id,
            event.from,
            event.to,
            event.detail.as_deref().unwrap_or("")
        );
    }
}

/// Appends events as JSON lines
pub struct EventPublisherFileLogger {
    pub file_path: String,
    file: Mutex<File>,
}

impl EventPublisherFileLogger {
    pub async fn new(file_path: String) -> std::io::Result<Self> {
        use tokio::fs::OpenOptions;

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&file_path)
            .await?;

        Ok(EventPublisherFileLogger {
            file_path,
            file: Mutex::new(file),
        })
    }
}

#[async_trait::async_trait]
impl EventPublisher for EventPublisherFileLogger {
    async fn publish(&self, event: &Event) {
        use tokio::io::AsyncWriteExt;

        let event_json = match serde_json::to_string(event) {
            Ok(json) => json,
            Err(e) => {
                error!("Failed to serialize event: {}", e);
                return;
            }
        };

        let mut file = self.file.lock().await;
        let written = async {
            file.write_all((event_json + "\n").as_bytes()).await?;
            file.flush().await
        };
        if let Err(e) = written.await {
            error!("Failed to write to event log file {}: {}", &self.file_path, e);
        }
    }
}

/// Keeps every event in memory
#[derive(Default)]
pub struct EventPublisherMemory {
    events: Mutex<Vec<Event>>,
}

impl EventPublisherMemory {
    pub fn new() -> Self {
        EventPublisherMemory::default()
    }

    pub async fn events(&self) -> Vec<Event> {
        self.events.lock().await.clone()
    }

    /// Target states in publish order
    pub async fn path(&self) -> Vec<SubmissionState> {
        self.events.lock().await.iter().map(|e| e.to).collect()
    }
}

#[async_trait::async_trait]
impl EventPublisher for EventPublisherMemory {
    async fn publish(&self, event: &Event) {
        self.events.lock().await.push(event.clone());
    }
}

#[async_trait::async_trait]
impl<T: EventPublisher + ?Sized> EventPublisher for std::sync::Arc<T> {
    async fn publish(&self, event: &Event) {
        (**self).publish(event).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::now_millis;

    fn event(from: SubmissionState, to: SubmissionState) -> Event {
        Event {
            submission_id: Uuid::new_v4(),
            from,
            to,
            detail: None,
            timestamp: now_millis(),
        }
    }

    #[tokio::test]
    async fn file_logger_appends_json_lines() {
        let path = std::env::temp_dir().join(format!("catalogpost-events-{}.log", Uuid::new_v4()));
        let path_str = path.display().to_string();

        let publisher = EventPublisherFileLogger::new(path_str.clone()).await.unwrap();
        publisher
            .publish(&event(SubmissionState::Idle, SubmissionState::Uploading))
            .await;
        publisher
            .publish(&event(SubmissionState::Uploading, SubmissionState::Failed))
            .await;

        let contents = tokio::fs::read_to_string(&path).await.unwrap();
        let lines: Vec<Event> = contents
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1].to, SubmissionState::Failed);

        tokio::fs::remove_file(&path).await.ok();
    }

    #[tokio::test]
    async fn memory_publisher_records_path() {
        let publisher = EventPublisherMemory::new();
        publisher
            .publish(&event(SubmissionState::Idle, SubmissionState::Uploading))
            .await;
        publisher
            .publish(&event(SubmissionState::Uploading, SubmissionState::Persisting))
            .await;

        assert_eq!(
            publisher.path().await,
            vec![SubmissionState::Uploading, SubmissionState::Persisting]
        );
    }
}
