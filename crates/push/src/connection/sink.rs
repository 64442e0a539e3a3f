use std::error::Error;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::mpsc;

/// Receiver of decoded streaming-body bytes.
///
/// The streaming task calls [`deliver`] once per decoded chunk, strictly in
/// on-wire order. Returning an error stops the stream and surfaces through
/// the task handle.
///
/// [`deliver`]: PushSink::deliver
#[async_trait]
pub trait PushSink: Send {
    async fn deliver(&mut self, chunk: Bytes) -> Result<(), Box<dyn Error + Send + Sync>>;
}

/// Channel senders work as sinks out of the box.
#[async_trait]
impl PushSink for mpsc::Sender<Bytes> {
    async fn deliver(&mut self, chunk: Bytes) -> Result<(), Box<dyn Error + Send + Sync>> {
        self.send(chunk).await.map_err(Into::into)
    }
}

/// Sink that discards everything, for responses whose body nobody wants.
#[derive(Debug, Default)]
pub struct NullSink;

#[async_trait]
impl PushSink for NullSink {
    async fn deliver(&mut self, _chunk: Bytes) -> Result<(), Box<dyn Error + Send + Sync>> {
        Ok(())
    }
}
