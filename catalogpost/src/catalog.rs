use crate::asset_host::truncate_body;
use crate::item::CatalogRecord;
use log::{error, info};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WriteError {
    #[error("Failed to send catalog write: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Catalog store responded with status {status}: {body}")]
    Status { status: u16, body: String },
}

#[async_trait::async_trait]
pub trait CatalogWriter: Send + Sync {
    /// Persist once, no retry
    async fn write(&self, record: &CatalogRecord) -> Result<(), WriteError>;
}

pub struct HttpCatalogWriter {
    client: reqwest::Client,
    db_url: String,
}

impl HttpCatalogWriter {
    pub fn new(client: reqwest::Client, db_url: String) -> Self {
        HttpCatalogWriter { client, db_url }
    }
}

#[async_trait::async_trait]
impl CatalogWriter for HttpCatalogWriter {
    async fn write(&self, record: &CatalogRecord) -> Result<(), WriteError> {
        info!(
            "Writing catalog record to {}: {}, price {}, photo {}",
            &self.db_url, &record.name, record.price, &record.photo_url
        );

        let resp = self.client.post(&self.db_url).json(record).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.bytes().await.map(|b| truncate_body(&b)).unwrap_or_default();
            error!("Catalog store rejected write: {}", status);
            return Err(WriteError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(())
    }
}
