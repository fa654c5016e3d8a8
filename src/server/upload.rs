//! Streaming uploads
//!
//! Multipart chunks arrive on the async side while the storage layer writes
//! through a blocking `Read`. A bounded channel connects the two so only a few
//! chunks are held in memory at a time.

use std::io::{self, Read};
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::multipart::Field;
use tokio::sync::mpsc;

use crate::error::{StorageError, WebError};
use crate::navigate::ResolvedLocation;
use crate::storage::StorageOperations;

/// Chunks buffered between the request body and the file writer
pub const UPLOAD_CHANNEL_CAPACITY: usize = 8;

/// Blocking reader over chunks sent from an async task.
///
/// A closed channel is end of input; an `Err` chunk aborts the read.
#[derive(Debug)]
pub struct ChunkReader {
    receiver: mpsc::Receiver<io::Result<Bytes>>,
    current: Bytes,
}

impl ChunkReader {
    pub fn new(receiver: mpsc::Receiver<io::Result<Bytes>>) -> Self {
        Self {
            receiver,
            current: Bytes::new(),
        }
    }
}

impl Read for ChunkReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }

        while self.current.is_empty() {
            match self.receiver.blocking_recv() {
                Some(Ok(chunk)) => self.current = chunk,
                Some(Err(e)) => return Err(e),
                None => return Ok(0),
            }
        }

        let len = buf.len().min(self.current.len());
        let chunk = self.current.split_to(len);
        buf[..len].copy_from_slice(&chunk);
        Ok(len)
    }
}

/// Streams one multipart field into `filename` inside `directory`.
///
/// The file is only put in place once the whole field has been read; a body
/// error mid-stream discards the partial upload.
pub async fn stream_field_to_storage(
    storage: &Arc<StorageOperations>,
    directory: ResolvedLocation,
    filename: String,
    mut field: Field<'_>,
) -> Result<(), WebError> {
    let (sender, receiver) = mpsc::channel(UPLOAD_CHANNEL_CAPACITY);

    let storage = Arc::clone(storage);
    let writer = tokio::task::spawn_blocking(move || {
        storage.save_upload(&directory, &filename, ChunkReader::new(receiver))
    });

    let mut body_error = None;
    loop {
        match field.chunk().await {
            Ok(Some(chunk)) => {
                // The writer has stopped early; its result says why
                if sender.send(Ok(chunk)).await.is_err() {
                    break;
                }
            }
            Ok(None) => break,
            Err(e) => {
                let _ = sender.send(Err(io::Error::other(e.body_text()))).await;
                body_error = Some(e);
                break;
            }
        }
    }
    drop(sender);

    let stored = writer
        .await
        .map_err(|e| StorageError::Io(io::Error::other(e)))?;

    if let Some(e) = body_error {
        return Err(e.into());
    }
    stored?;
    Ok(())
}
