//! Single-writer wrapper around [`FileStorage`].
//!
//! One blocking task owns the store and serves requests in arrival order, so
//! every caller holding a [`StorageHandle`] sees a consistent index. The task
//! exits once the last handle is dropped.

use crate::error::{Result, StorageError};
use crate::file_storage::{AuditReport, FileStorage};
use crate::search::SearchQuery;
use std::path::PathBuf;
use storage::FileRecord;
use tokio::sync::{mpsc, oneshot};
use tokio::task;
use tracing::debug;

const QUEUE_DEPTH: usize = 64;

enum Request {
    Store {
        source: PathBuf,
        filename: Option<String>,
        tags: Vec<String>,
        reply: oneshot::Sender<Result<PathBuf>>,
    },
    Search {
        query: SearchQuery,
        reply: oneshot::Sender<Vec<FileRecord>>,
    },
    Path {
        filename: String,
        reply: oneshot::Sender<Option<PathBuf>>,
    },
    Record {
        filename: String,
        reply: oneshot::Sender<Option<FileRecord>>,
    },
    Load {
        filename: String,
        reply: oneshot::Sender<Result<Vec<u8>>>,
    },
    List {
        reply: oneshot::Sender<Vec<FileRecord>>,
    },
    Delete {
        filename: String,
        reply: oneshot::Sender<bool>,
    },
    AddTags {
        filename: String,
        tags: Vec<String>,
        reply: oneshot::Sender<bool>,
    },
    AllTags {
        reply: oneshot::Sender<Vec<String>>,
    },
    Audit {
        reply: oneshot::Sender<Result<AuditReport>>,
    },
}

pub struct StorageService;

impl StorageService {
    /// Moves `storage` onto a blocking task. Must be called inside a Tokio
    /// runtime.
    pub fn spawn(storage: FileStorage) -> StorageHandle {
        let (tx, rx) = mpsc::channel(QUEUE_DEPTH);
        task::spawn_blocking(move || serve(storage, rx));
        StorageHandle { tx }
    }
}

fn serve(mut storage: FileStorage, mut rx: mpsc::Receiver<Request>) {
    debug!(root = %storage.root().display(), "storage service started");
    // A dropped reply receiver only means the caller stopped waiting.
    while let Some(request) = rx.blocking_recv() {
        match request {
            Request::Store {
                source,
                filename,
                tags,
                reply,
            } => {
                let _ = reply.send(storage.store(&source, filename.as_deref(), &tags));
            }
            Request::Search { query, reply } => {
                let _ = reply.send(storage.search_files(&query));
            }
            Request::Path { filename, reply } => {
                let _ = reply.send(storage.get_file_path(&filename));
            }
            Request::Record { filename, reply } => {
                let _ = reply.send(storage.get_record(&filename).cloned());
            }
            Request::Load { filename, reply } => {
                let _ = reply.send(storage.load_file_content(&filename));
            }
            Request::List { reply } => {
                let _ = reply.send(storage.list_all_files());
            }
            Request::Delete { filename, reply } => {
                let _ = reply.send(storage.delete(&filename));
            }
            Request::AddTags {
                filename,
                tags,
                reply,
            } => {
                let _ = reply.send(storage.add_tags(&filename, &tags));
            }
            Request::AllTags { reply } => {
                let _ = reply.send(storage.get_all_tags());
            }
            Request::Audit { reply } => {
                let _ = reply.send(storage.audit());
            }
        }
    }
    debug!("storage service stopped");
}

#[derive(Clone)]
pub struct StorageHandle {
    tx: mpsc::Sender<Request>,
}

impl StorageHandle {
    async fn call<T>(&self, make: impl FnOnce(oneshot::Sender<T>) -> Request) -> Result<T> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(make(reply))
            .await
            .map_err(|_| StorageError::ServiceClosed)?;
        rx.await.map_err(|_| StorageError::ServiceClosed)
    }

    pub async fn store(
        &self,
        source: impl Into<PathBuf>,
        filename: Option<String>,
        tags: Vec<String>,
    ) -> Result<PathBuf> {
        let source = source.into();
        self.call(|reply| Request::Store {
            source,
            filename,
            tags,
            reply,
        })
        .await?
    }

    pub async fn search_files(&self, query: SearchQuery) -> Result<Vec<FileRecord>> {
        self.call(|reply| Request::Search { query, reply }).await
    }

    pub async fn get_file_path(&self, filename: &str) -> Result<Option<PathBuf>> {
        let filename = filename.to_string();
        self.call(|reply| Request::Path { filename, reply }).await
    }

    pub async fn get_record(&self, filename: &str) -> Result<Option<FileRecord>> {
        let filename = filename.to_string();
        self.call(|reply| Request::Record { filename, reply }).await
    }

    pub async fn load_file_content(&self, filename: &str) -> Result<Vec<u8>> {
        let filename = filename.to_string();
        self.call(|reply| Request::Load { filename, reply }).await?
    }

    pub async fn list_all_files(&self) -> Result<Vec<FileRecord>> {
        self.call(|reply| Request::List { reply }).await
    }

    pub async fn delete(&self, filename: &str) -> Result<bool> {
        let filename = filename.to_string();
        self.call(|reply| Request::Delete { filename, reply }).await
    }

    pub async fn add_tags(&self, filename: &str, tags: Vec<String>) -> Result<bool> {
        let filename = filename.to_string();
        self.call(|reply| Request::AddTags {
            filename,
            tags,
            reply,
        })
        .await
    }

    pub async fn get_all_tags(&self) -> Result<Vec<String>> {
        self.call(|reply| Request::AllTags { reply }).await
    }

    pub async fn audit(&self) -> Result<AuditReport> {
        self.call(|reply| Request::Audit { reply }).await?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn calls_fail_once_the_service_is_gone() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let handle = StorageHandle { tx };
        assert!(matches!(
            handle.list_all_files().await,
            Err(StorageError::ServiceClosed)
        ));
    }

    #[tokio::test]
    async fn unanswered_request_is_service_closed() {
        let (tx, mut rx) = mpsc::channel(1);
        let handle = StorageHandle { tx };
        // Take the request and drop its reply sender.
        tokio::spawn(async move { drop(rx.recv().await) });
        assert!(matches!(
            handle.get_all_tags().await,
            Err(StorageError::ServiceClosed)
        ));
    }
}
