//! In-memory backend with failure injection.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use secrecy::ExposeSecret;
use serde_json::{Map, Value};

use crate::client::{AuthUser, BackendClient, Credentials, Direction, ListQuery, Row};
use crate::error::BackendError;

/// Operations that can be counted or made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    List,
    Insert,
    Delete,
    Upload,
    FetchBytes,
    SignIn,
    SignUp,
    SignOut,
}

#[derive(Debug, Default)]
struct State {
    tables: HashMap<String, Vec<Row>>,
    objects: HashMap<(String, String), Vec<u8>>,
    sources: HashMap<String, Vec<u8>>,
    accounts: HashMap<String, (String, AuthUser)>,
    session: Option<AuthUser>,
    failures: HashMap<Operation, BackendError>,
    calls: HashMap<Operation, usize>,
    next_id: u64,
}

/// Behaves like the hosted service for tests: tables of JSON rows, a flat
/// object store, and email/password accounts.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    state: Arc<Mutex<State>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Replace the rows of `table`, kept in the given (unsorted) order.
    pub fn with_rows(self, table: &str, rows: Vec<Row>) -> Self {
        self.state().tables.insert(table.to_string(), rows);
        self
    }

    /// Make every later call of `operation` fail with `error`.
    pub fn fail(&self, operation: Operation, error: BackendError) {
        self.state().failures.insert(operation, error);
    }

    pub fn recover(&self, operation: Operation) {
        self.state().failures.remove(&operation);
    }

    pub fn calls(&self, operation: Operation) -> usize {
        self.state().calls.get(&operation).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.state().calls.values().sum()
    }

    pub fn rows(&self, table: &str) -> Vec<Row> {
        self.state().tables.get(table).cloned().unwrap_or_default()
    }

    pub fn object(&self, bucket: &str, path: &str) -> Option<Vec<u8>> {
        self.state()
            .objects
            .get(&(bucket.to_string(), path.to_string()))
            .cloned()
    }

    /// Bytes served by [`BackendClient::fetch_bytes`] for `uri`.
    pub fn serve(&self, uri: &str, bytes: Vec<u8>) {
        self.state().sources.insert(uri.to_string(), bytes);
    }

    pub fn register(&self, email: &str, password: &str) -> AuthUser {
        let mut state = self.state();
        state.next_id += 1;
        let user = AuthUser {
            id: format!("user-{}", state.next_id),
            email: Some(email.to_string()),
        };
        state
            .accounts
            .insert(email.to_string(), (password.to_string(), user.clone()));
        user
    }

    pub fn session(&self) -> Option<AuthUser> {
        self.state().session.clone()
    }

    /// Count the call and return the injected failure, if any.
    fn enter(&self, operation: Operation) -> Result<MutexGuard<'_, State>, BackendError> {
        let mut state = self.state();
        *state.calls.entry(operation).or_insert(0) += 1;
        match state.failures.get(&operation) {
            Some(err) => Err(err.clone()),
            None => Ok(state),
        }
    }
}

fn compare(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::String(a)), Some(Value::String(b))) => a.cmp(b),
        (Some(Value::Number(a)), Some(Value::Number(b))) => a
            .as_f64()
            .partial_cmp(&b.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(a), Some(b)) => a.to_string().cmp(&b.to_string()),
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (None, None) => Ordering::Equal,
    }
}

fn project(row: &Row, columns: &[String]) -> Row {
    if columns.is_empty() {
        return row.clone();
    }
    let Some(object) = row.as_object() else {
        return row.clone();
    };
    let projected: Map<String, Value> = columns
        .iter()
        .filter_map(|column| object.get(column).map(|v| (column.clone(), v.clone())))
        .collect();
    Value::Object(projected)
}

#[async_trait]
impl BackendClient for MemoryBackend {
    async fn list_rows(&self, query: &ListQuery) -> Result<Vec<Row>, BackendError> {
        let state = self.enter(Operation::List)?;
        let mut rows = state.tables.get(&query.table).cloned().unwrap_or_default();
        if let Some((column, direction)) = &query.order {
            rows.sort_by(|a, b| {
                let ordering = compare(a.get(column), b.get(column));
                match direction {
                    Direction::Ascending => ordering,
                    Direction::Descending => ordering.reverse(),
                }
            });
        }
        Ok(rows.iter().map(|row| project(row, &query.columns)).collect())
    }

    async fn insert_row(&self, table: &str, mut row: Row) -> Result<Row, BackendError> {
        let mut state = self.enter(Operation::Insert)?;
        if row.get("id").map_or(true, Value::is_null) {
            state.next_id += 1;
            let id = format!("mem-{}", state.next_id);
            if let Some(object) = row.as_object_mut() {
                object.insert("id".to_string(), Value::String(id));
            }
        }

        let rows = state.tables.entry(table.to_string()).or_default();
        if rows.iter().any(|existing| existing.get("id") == row.get("id")) {
            return Err(BackendError::Http {
                status: 409,
                message: "duplicate key value violates unique constraint".to_string(),
            });
        }
        rows.push(row.clone());
        Ok(row)
    }

    async fn delete_eq(&self, table: &str, column: &str, value: &str) -> Result<(), BackendError> {
        let mut state = self.enter(Operation::Delete)?;
        if let Some(rows) = state.tables.get_mut(table) {
            rows.retain(|row| row.get(column).and_then(Value::as_str) != Some(value));
        }
        Ok(())
    }

    async fn upload_object(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        upsert: bool,
    ) -> Result<(), BackendError> {
        let mut state = self.enter(Operation::Upload)?;
        let key = (bucket.to_string(), path.to_string());
        if !upsert && state.objects.contains_key(&key) {
            return Err(BackendError::Http {
                status: 409,
                message: "The resource already exists".to_string(),
            });
        }
        state.objects.insert(key, bytes);
        Ok(())
    }

    fn public_url(&self, bucket: &str, path: &str) -> Result<String, BackendError> {
        Ok(format!("memory://{bucket}/{path}"))
    }

    async fn fetch_bytes(&self, uri: &str) -> Result<Vec<u8>, BackendError> {
        let state = self.enter(Operation::FetchBytes)?;
        state.sources.get(uri).cloned().ok_or_else(|| BackendError::Http {
            status: 404,
            message: format!("{uri} not found"),
        })
    }

    async fn sign_in_with_password(
        &self,
        credentials: &Credentials,
    ) -> Result<AuthUser, BackendError> {
        let mut state = self.enter(Operation::SignIn)?;
        let user = match state.accounts.get(&credentials.email) {
            Some((password, user)) if password == credentials.password.expose_secret() => {
                user.clone()
            }
            _ => {
                return Err(BackendError::Http {
                    status: 400,
                    message: "Invalid login credentials".to_string(),
                })
            }
        };
        state.session = Some(user.clone());
        Ok(user)
    }

    async fn sign_up(&self, credentials: &Credentials) -> Result<Option<AuthUser>, BackendError> {
        {
            let state = self.enter(Operation::SignUp)?;
            if state.accounts.contains_key(&credentials.email) {
                return Err(BackendError::Http {
                    status: 422,
                    message: "User already registered".to_string(),
                });
            }
        }
        let user = self.register(&credentials.email, credentials.password.expose_secret());
        Ok(Some(user))
    }

    async fn sign_out(&self) -> Result<(), BackendError> {
        let mut state = self.enter(Operation::SignOut)?;
        state.session = None;
        Ok(())
    }
}
