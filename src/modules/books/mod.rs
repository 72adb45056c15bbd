//! Book catalog backed by the remote table, with an in-memory fallback.
//!
//! Reads never fail: when there is no client, or the remote call goes wrong,
//! the fallback list is served and tagged [`CatalogSource::Local`]. Writes
//! that reach for the backend report every failure to the caller.

pub mod error;
pub mod models;
pub mod seed;
pub mod shelves;

use std::path::Path;
use std::sync::Arc;

use folio_backend::{BackendClient, BackendError, Direction, Gateway, ListQuery};
use folio_kernel::settings::BackendSettings;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use url::Url;

use crate::utils::TokenClock;

pub use error::CatalogError;
pub use models::{Book, BookRow, FileLink, NewBookInput};

const LOG_TARGET: &str = "folio::books";
const DEFAULT_TABLE: &str = "books";
const DEFAULT_BUCKET: &str = "books";

/// Provenance of catalog data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CatalogSource {
    Local,
    Remote,
}

/// Data tagged with where it came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sourced<T> {
    pub data: T,
    pub source: CatalogSource,
}

impl<T> Sourced<T> {
    pub fn local(data: T) -> Self {
        Self {
            data,
            source: CatalogSource::Local,
        }
    }

    pub fn remote(data: T) -> Self {
        Self {
            data,
            source: CatalogSource::Remote,
        }
    }
}

pub struct CatalogRepository {
    gateway: Arc<Gateway>,
    table: String,
    bucket: String,
    fallback: RwLock<Vec<Book>>,
    clock: TokenClock,
}

impl std::fmt::Debug for CatalogRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogRepository")
            .field("table", &self.table)
            .field("bucket", &self.bucket)
            .field("configured", &self.gateway.is_configured())
            .finish()
    }
}

impl CatalogRepository {
    /// Repository over the default table and bucket, seeded with [`seed::catalog`].
    pub fn new(gateway: Arc<Gateway>) -> Self {
        Self::with_fallback(gateway, seed::catalog())
    }

    pub fn from_settings(gateway: Arc<Gateway>, settings: &BackendSettings) -> Self {
        Self::new(gateway).with_names(&settings.table, &settings.bucket)
    }

    /// Repository serving `fallback` whenever the backend cannot.
    pub fn with_fallback(gateway: Arc<Gateway>, fallback: Vec<Book>) -> Self {
        Self {
            gateway,
            table: DEFAULT_TABLE.to_string(),
            bucket: DEFAULT_BUCKET.to_string(),
            fallback: RwLock::new(fallback),
            clock: TokenClock::new(),
        }
    }

    pub fn with_names(mut self, table: &str, bucket: &str) -> Self {
        self.table = table.to_string();
        self.bucket = bucket.to_string();
        self
    }

    fn list_query(&self) -> ListQuery {
        ListQuery::new(self.table.as_str())
            .select(models::BOOK_COLUMNS)
            .order_by("title", Direction::Ascending)
    }

    async fn fallback_snapshot(&self) -> Sourced<Vec<Book>> {
        Sourced::local(self.fallback.read().await.clone())
    }

    /// Current catalog. Remote rows come back in backend order (title
    /// ascending); the fallback list keeps its own order.
    pub async fn fetch_books(&self) -> Sourced<Vec<Book>> {
        let Some(client) = self.gateway.client() else {
            tracing::warn!(target: LOG_TARGET, "no backend client; serving local catalog");
            return self.fallback_snapshot().await;
        };

        match client.list_rows(&self.list_query()).await.and_then(map_rows) {
            Ok(books) => {
                tracing::debug!(target: LOG_TARGET, count = books.len(), "fetched remote catalog");
                Sourced::remote(books)
            }
            Err(err) => {
                tracing::warn!(
                    target: LOG_TARGET,
                    error = %err,
                    "falling back to local catalog because the backend failed"
                );
                self.fallback_snapshot().await
            }
        }
    }

    /// Add a book.
    ///
    /// Offline, the book goes to the front of the fallback list with a
    /// `local-` id and zero progress; this cannot fail. Online, the row is
    /// inserted remotely and any failure is returned as-is.
    pub async fn add_book(&self, input: NewBookInput) -> Result<Sourced<Book>, CatalogError> {
        let Some(client) = self.gateway.client() else {
            let id = format!("local-{}", self.clock.next());
            let book = Book::from(input.into_row(id, Some(0.0)));
            self.fallback.write().await.insert(0, book.clone());
            tracing::info!(target: LOG_TARGET, id = %book.id, "book added to local catalog");
            return Ok(Sourced::local(book));
        };

        let id = match input.id.clone() {
            Some(id) if !id.trim().is_empty() => id,
            _ => format!("book-{}", self.clock.next()),
        };
        let payload = serde_json::to_value(input.into_row(id, None)).map_err(BackendError::from)?;

        let stored = client
            .insert_row(&self.table, payload)
            .await
            .and_then(|row| serde_json::from_value::<BookRow>(row).map_err(BackendError::from))
            .map_err(|err| {
                tracing::warn!(target: LOG_TARGET, error = %err, "remote insert failed");
                CatalogError::from(err)
            })?;

        let book = Book::from(stored);
        tracing::info!(target: LOG_TARGET, id = %book.id, "book added to remote catalog");
        Ok(Sourced::remote(book))
    }

    /// Delete a book by id. Only possible against the backend; offline the
    /// request is refused and the fallback list is left alone.
    pub async fn delete_book(&self, id: &str) -> Result<(), CatalogError> {
        let Some(client) = self.gateway.client() else {
            tracing::warn!(target: LOG_TARGET, id, "delete requested without a backend");
            return Err(CatalogError::UnsupportedOffline {
                operation: "delete",
            });
        };

        client
            .delete_eq(&self.table, "id", id)
            .await
            .map_err(|err| {
                tracing::warn!(target: LOG_TARGET, id, error = %err, "remote delete failed");
                CatalogError::from(err)
            })?;
        tracing::info!(target: LOG_TARGET, id, "book deleted");
        Ok(())
    }

    /// Upload a file to object storage under `file_name`, replacing any
    /// existing object, and return its public URL.
    ///
    /// `file_uri` may be a local path, a `file://` URI, or an `http(s)://` URL.
    pub async fn upload_book_file(
        &self,
        file_uri: &str,
        file_name: &str,
    ) -> Result<String, CatalogError> {
        let Some(client) = self.gateway.client() else {
            return Err(CatalogError::NotConfigured);
        };

        let bytes = read_source(client.as_ref(), file_uri).await?;
        let size = bytes.len();
        client
            .upload_object(&self.bucket, file_name, bytes, true)
            .await
            .map_err(|err| {
                tracing::warn!(target: LOG_TARGET, file = file_name, error = %err, "upload failed");
                CatalogError::from(err)
            })?;

        let url = client.public_url(&self.bucket, file_name)?;
        tracing::info!(target: LOG_TARGET, file = file_name, bytes = size, "book file uploaded");
        Ok(url)
    }

    /// Object name for a freshly picked file: `book-<token>-<name>`.
    pub fn upload_name(&self, original: Option<&str>) -> String {
        let name = original
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or("file");
        format!("book-{}-{}", self.clock.next(), name)
    }
}

fn map_rows(rows: Vec<folio_backend::Row>) -> Result<Vec<Book>, BackendError> {
    rows.into_iter()
        .map(|row| {
            serde_json::from_value::<BookRow>(row)
                .map(Book::from)
                .map_err(BackendError::from)
        })
        .collect()
}

async fn read_source(client: &dyn BackendClient, uri: &str) -> Result<Vec<u8>, CatalogError> {
    let path = match Url::parse(uri) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {
            return Ok(client.fetch_bytes(uri).await?);
        }
        Ok(url) if url.scheme() == "file" => url.to_file_path().map_err(|_| CatalogError::Source {
            uri: uri.to_string(),
            source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "not a local file path"),
        })?,
        _ => Path::new(uri).to_path_buf(),
    };

    tokio::fs::read(&path)
        .await
        .map_err(|source| CatalogError::Source {
            uri: uri.to_string(),
            source,
        })
}
