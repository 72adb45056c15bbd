use async_trait::async_trait;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::error::BackendError;

/// One table row as the backend returns it.
pub type Row = serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Ascending => "asc",
            Direction::Descending => "desc",
        }
    }
}

/// A projected, optionally ordered list query against one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    pub table: String,
    pub columns: Vec<String>,
    pub order: Option<(String, Direction)>,
}

impl ListQuery {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            columns: Vec::new(),
            order: None,
        }
    }

    pub fn select<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn order_by(mut self, column: impl Into<String>, direction: Direction) -> Self {
        self.order = Some((column.into(), direction));
        self
    }

    /// `select` parameter value; `*` when nothing was projected.
    pub fn select_clause(&self) -> String {
        if self.columns.is_empty() {
            "*".to_string()
        } else {
            self.columns.join(",")
        }
    }

    /// `order` parameter value, e.g. `title.asc`.
    pub fn order_clause(&self) -> Option<String> {
        self.order
            .as_ref()
            .map(|(column, direction)| format!("{}.{}", column, direction.as_str()))
    }
}

/// Email and password pair for the auth service.
pub struct Credentials {
    pub email: String,
    pub password: SecretString,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: SecretString::from(password.into()),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

/// The user record handed back by the auth service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// Everything the catalog and identity layers need from the hosted service.
#[async_trait]
pub trait BackendClient: Send + Sync {
    /// Run a list query and return the rows in backend order.
    async fn list_rows(&self, query: &ListQuery) -> Result<Vec<Row>, BackendError>;

    /// Insert a single row and return the stored representation.
    async fn insert_row(&self, table: &str, row: Row) -> Result<Row, BackendError>;

    /// Delete rows where `column` equals `value`.
    async fn delete_eq(&self, table: &str, column: &str, value: &str) -> Result<(), BackendError>;

    /// Store `bytes` under `path` in `bucket`.
    async fn upload_object(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        upsert: bool,
    ) -> Result<(), BackendError>;

    /// Stable public URL for an object.
    fn public_url(&self, bucket: &str, path: &str) -> Result<String, BackendError>;

    /// Download an arbitrary remote resource.
    async fn fetch_bytes(&self, uri: &str) -> Result<Vec<u8>, BackendError>;

    async fn sign_in_with_password(
        &self,
        credentials: &Credentials,
    ) -> Result<AuthUser, BackendError>;

    /// Register a user. `None` means the service accepted the request without
    /// returning a user record.
    async fn sign_up(&self, credentials: &Credentials) -> Result<Option<AuthUser>, BackendError>;

    async fn sign_out(&self) -> Result<(), BackendError>;
}
