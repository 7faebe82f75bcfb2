use crate::asset_host::{AssetUploader, HttpAssetUploader};
use crate::catalog::{CatalogWriter, HttpCatalogWriter};
use crate::config::{Config, ConfigError};
use crate::event::{EventPublisher, EventPublisherFileLogger, EventPublisherLog};
use crate::rebuild::{BuildHook, HttpBuildHook};

/// External collaborators of a submission
pub struct Env {
    pub uploader: Box<dyn AssetUploader>,
    pub writer: Box<dyn CatalogWriter>,
    pub event_publisher: Box<dyn EventPublisher>,
}

impl Env {
    pub fn new(
        uploader: Box<dyn AssetUploader>,
        writer: Box<dyn CatalogWriter>,
        event_publisher: Box<dyn EventPublisher>,
    ) -> Self {
        Env {
            uploader,
            writer,
            event_publisher,
        }
    }

    /// Wire the HTTP clients from configuration
    pub async fn from_config(config: &Config, client: reqwest::Client) -> Result<Self, ConfigError> {
        let uploader = HttpAssetUploader::new(
            client.clone(),
            config.upload_url.clone(),
            config.require_api_key()?.to_string(),
        );
        let writer = HttpCatalogWriter::new(client, config.require_db_url()?.to_string());

        let event_publisher: Box<dyn EventPublisher> = match &config.event_log {
            Some(path) => Box::new(
                EventPublisherFileLogger::new(path.clone())
                    .await
                    .map_err(|e| ConfigError::EventLog(path.clone(), e))?,
            ),
            None => Box::new(EventPublisherLog),
        };

        Ok(Env::new(Box::new(uploader), Box::new(writer), event_publisher))
    }

    pub fn get_uploader(&self) -> &dyn AssetUploader {
        self.uploader.as_ref()
    }

    pub fn get_writer(&self) -> &dyn CatalogWriter {
        self.writer.as_ref()
    }

    pub fn get_event_publisher(&self) -> &dyn EventPublisher {
        self.event_publisher.as_ref()
    }
}

pub fn build_hook_from_config(
    config: &Config,
    client: reqwest::Client,
) -> Result<Box<dyn BuildHook>, ConfigError> {
    Ok(Box::new(HttpBuildHook::new(
        client,
        config.require_build_hook_url()?.to_string(),
    )))
}
