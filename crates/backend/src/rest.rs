//! REST dialect of the hosted service: table rows under `/rest/v1`, objects
//! under `/storage/v1`, accounts under `/auth/v1`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, RequestBuilder, Response};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::RwLock;
use url::Url;

use crate::client::{AuthUser, BackendClient, Credentials, ListQuery, Row};
use crate::error::BackendError;

const SINGLE_OBJECT: &str = "application/vnd.pgrst.object+json";

/// HTTP client for one backend project.
///
/// Holds the signed-in access token in memory only; nothing is refreshed or
/// persisted.
pub struct RestClient {
    http: Client,
    base: Url,
    key: SecretString,
    session: RwLock<Option<SecretString>>,
}

impl std::fmt::Debug for RestClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestClient")
            .field("base", &self.base.as_str())
            .field(
                "has_session",
                &self.session.try_read().map(|s| s.is_some()).unwrap_or(false),
            )
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    user: AuthUser,
}

impl RestClient {
    /// Build a client. `timeout` is opt-in; without it requests never time out.
    pub fn new(
        base_url: &str,
        key: &SecretString,
        timeout: Option<Duration>,
    ) -> Result<Self, BackendError> {
        let base = Url::parse(base_url)
            .map_err(|e| BackendError::Build(format!("invalid backend url '{base_url}': {e}")))?;
        if base.cannot_be_a_base() {
            return Err(BackendError::Build(format!(
                "backend url '{base_url}' cannot be used as a base"
            )));
        }

        let mut builder =
            Client::builder().user_agent(concat!("folio/", env!("CARGO_PKG_VERSION")));
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build()?;

        tracing::info!(base = %base, "backend client created");

        Ok(Self {
            http,
            base,
            key: SecretString::from(key.expose_secret().to_owned()),
            session: RwLock::new(None),
        })
    }

    /// Base URL with `segments` appended, each percent-encoded.
    fn url_for<'a, I>(&self, segments: I) -> Result<Url, BackendError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| BackendError::Build(format!("{} cannot be a base url", self.base)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn object_url(&self, prefix: &[&str], bucket: &str, path: &str) -> Result<Url, BackendError> {
        let segments = prefix
            .iter()
            .copied()
            .chain(std::iter::once(bucket))
            .chain(path.split('/').filter(|s| !s.is_empty()));
        self.url_for(segments)
    }

    /// Attach the project key plus the session token when there is one.
    async fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        let session = self.session.read().await;
        let bearer = session
            .as_ref()
            .map(|token| token.expose_secret())
            .unwrap_or_else(|| self.key.expose_secret());
        builder
            .header("apikey", self.key.expose_secret())
            .header(AUTHORIZATION, format!("Bearer {bearer}"))
    }

    /// Send and turn any non-2xx status into [`BackendError::Http`].
    async fn send(&self, builder: RequestBuilder) -> Result<Response, BackendError> {
        let response = builder.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = error_message(&body)
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed").to_string());
        Err(BackendError::Http {
            status: status.as_u16(),
            message,
        })
    }

    async fn store_session(&self, token: Option<String>) {
        *self.session.write().await = token.map(SecretString::from);
    }
}

#[async_trait]
impl BackendClient for RestClient {
    async fn list_rows(&self, query: &ListQuery) -> Result<Vec<Row>, BackendError> {
        let url = self.url_for(["rest", "v1", query.table.as_str()])?;
        let mut params = vec![("select", query.select_clause())];
        if let Some(order) = query.order_clause() {
            params.push(("order", order));
        }

        let request = self.authorized(self.http.get(url).query(&params)).await;
        let rows: Vec<Row> = self.send(request).await?.json().await?;
        Ok(rows)
    }

    async fn insert_row(&self, table: &str, row: Row) -> Result<Row, BackendError> {
        let url = self.url_for(["rest", "v1", table])?;
        let request = self
            .authorized(
                self.http
                    .post(url)
                    .header("Prefer", "return=representation")
                    .header(ACCEPT, SINGLE_OBJECT)
                    .json(&row),
            )
            .await;
        let stored: Row = self.send(request).await?.json().await?;
        Ok(stored)
    }

    async fn delete_eq(&self, table: &str, column: &str, value: &str) -> Result<(), BackendError> {
        let url = self.url_for(["rest", "v1", table])?;
        let filter = format!("eq.{value}");
        let request = self
            .authorized(self.http.delete(url).query(&[(column, filter.as_str())]))
            .await;
        self.send(request).await?;
        Ok(())
    }

    async fn upload_object(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        upsert: bool,
    ) -> Result<(), BackendError> {
        let url = self.object_url(&["storage", "v1", "object"], bucket, path)?;
        let request = self
            .authorized(
                self.http
                    .post(url)
                    .header(CONTENT_TYPE, "application/octet-stream")
                    .header("x-upsert", if upsert { "true" } else { "false" })
                    .body(bytes),
            )
            .await;
        self.send(request).await?;
        Ok(())
    }

    fn public_url(&self, bucket: &str, path: &str) -> Result<String, BackendError> {
        self.object_url(&["storage", "v1", "object", "public"], bucket, path)
            .map(String::from)
    }

    async fn fetch_bytes(&self, uri: &str) -> Result<Vec<u8>, BackendError> {
        let response = self.send(self.http.get(uri)).await?;
        Ok(response.bytes().await?.to_vec())
    }

    async fn sign_in_with_password(
        &self,
        credentials: &Credentials,
    ) -> Result<AuthUser, BackendError> {
        let url = self.url_for(["auth", "v1", "token"])?;
        let body = json!({
            "email": credentials.email,
            "password": credentials.password.expose_secret(),
        });
        let request = self
            .authorized(
                self.http
                    .post(url)
                    .query(&[("grant_type", "password")])
                    .json(&body),
            )
            .await;

        let token: TokenResponse = self.send(request).await?.json().await?;
        self.store_session(Some(token.access_token)).await;
        tracing::debug!(user = %token.user.id, "signed in");
        Ok(token.user)
    }

    async fn sign_up(&self, credentials: &Credentials) -> Result<Option<AuthUser>, BackendError> {
        let url = self.url_for(["auth", "v1", "signup"])?;
        let body = json!({
            "email": credentials.email,
            "password": credentials.password.expose_secret(),
        });
        let request = self.authorized(self.http.post(url).json(&body)).await;
        let value: Value = self.send(request).await?.json().await?;

        // Confirmed sign-ups come back as a session, pending ones as a bare user.
        if let Some(token) = value.get("access_token").and_then(Value::as_str) {
            self.store_session(Some(token.to_string())).await;
        }
        let user = match value.get("user") {
            Some(user) if !user.is_null() => Some(serde_json::from_value(user.clone())?),
            _ if value.get("id").is_some() => Some(serde_json::from_value(value)?),
            _ => None,
        };
        Ok(user)
    }

    async fn sign_out(&self) -> Result<(), BackendError> {
        let token = self
            .session
            .read()
            .await
            .as_ref()
            .map(|token| token.expose_secret().to_owned());
        let Some(token) = token else {
            return Ok(());
        };

        let url = self.url_for(["auth", "v1", "logout"])?;
        let request = self
            .http
            .post(url)
            .header("apikey", self.key.expose_secret())
            .header(AUTHORIZATION, format!("Bearer {token}"));
        self.send(request).await?;

        // Only forget the token once the service has ended the session.
        self.store_session(None).await;
        Ok(())
    }
}

/// Pull a readable message out of an error body.
fn error_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }

    match serde_json::from_str::<Value>(trimmed) {
        Ok(value) => ["message", "msg", "error_description", "error"]
            .iter()
            .find_map(|field| value.get(*field).and_then(Value::as_str))
            .map(str::to_string),
        Err(_) => Some(trimmed.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::Direction;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn client(base: &str) -> RestClient {
        RestClient::new(base, &SecretString::from("anon-key".to_string()), None).unwrap()
    }

    /// Accept one connection, answer with `status` and `body`, and hand back
    /// the raw request text.
    async fn serve_once(
        status: &'static str,
        body: &'static str,
    ) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = Vec::new();
            let mut chunk = [0u8; 4096];
            loop {
                let n = socket.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                buf.extend_from_slice(&chunk[..n]);
                let text = String::from_utf8_lossy(&buf).to_string();
                if let Some(split) = text.find("\r\n\r\n") {
                    let length = text[..split]
                        .lines()
                        .find_map(|line| {
                            let lower = line.to_ascii_lowercase();
                            lower
                                .strip_prefix("content-length:")
                                .map(|v| v.trim().parse::<usize>().unwrap_or(0))
                        })
                        .unwrap_or(0);
                    if buf.len() >= split + 4 + length {
                        break;
                    }
                }
            }
            let response = format!(
                "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            String::from_utf8_lossy(&buf).to_string()
        });
        (format!("http://{addr}"), handle)
    }

    #[test]
    fn rejects_unusable_base_urls() {
        let key = SecretString::from("k".to_string());
        assert!(matches!(
            RestClient::new("not a url", &key, None),
            Err(BackendError::Build(_))
        ));
        assert!(matches!(
            RestClient::new("mailto:someone@example.com", &key, None),
            Err(BackendError::Build(_))
        ));
    }

    #[test]
    fn public_url_encodes_object_names() {
        let client = client("https://project.example.co/");
        let url = client.public_url("books", "book-1-My File.pdf").unwrap();
        assert_eq!(
            url,
            "https://project.example.co/storage/v1/object/public/books/book-1-My%20File.pdf"
        );
    }

    #[test]
    fn error_message_prefers_known_fields() {
        assert_eq!(
            error_message(r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#)
                .as_deref(),
            Some("Invalid login credentials")
        );
        assert_eq!(
            error_message(r#"{"msg":"User already registered"}"#).as_deref(),
            Some("User already registered")
        );
        assert_eq!(error_message("gateway down").as_deref(), Some("gateway down"));
        assert_eq!(error_message("  "), None);
    }

    #[tokio::test]
    async fn list_rows_sends_projection_and_order() {
        let (base, server) = serve_once("200 OK", r#"[{"id":"b1","title":"Alpha"}]"#).await;
        let client = client(&base);

        let query = ListQuery::new("books")
            .select(["id", "title"])
            .order_by("title", Direction::Ascending);
        let rows = client.list_rows(&query).await.unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["title"], "Alpha");

        let request = server.await.unwrap();
        assert!(request.starts_with("GET /rest/v1/books?select=id%2Ctitle&order=title.asc"));
        assert!(request.to_ascii_lowercase().contains("apikey: anon-key"));
        assert!(request
            .to_ascii_lowercase()
            .contains("authorization: bearer anon-key"));
    }

    #[tokio::test]
    async fn non_success_status_becomes_http_error() {
        let (base, server) = serve_once(
            "400 Bad Request",
            r#"{"error_description":"Invalid login credentials"}"#,
        )
        .await;
        let client = client(&base);

        let err = client
            .sign_in_with_password(&Credentials::new("reader@email.com", "wrong"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            BackendError::Http { status: 400, ref message } if message == "Invalid login credentials"
        ));

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /auth/v1/token?grant_type=password"));
    }

    #[tokio::test]
    async fn sign_out_without_session_is_a_no_op() {
        let client = client("http://127.0.0.1:9");
        client.sign_out().await.unwrap();
    }

    #[tokio::test]
    async fn failed_sign_out_keeps_the_session() {
        let (base, server) =
            serve_once("500 Internal Server Error", r#"{"message":"logout failed"}"#).await;
        let client = client(&base);
        client.store_session(Some("user-token".to_string())).await;

        let err = client.sign_out().await.unwrap_err();
        assert!(matches!(err, BackendError::Http { status: 500, .. }));
        assert!(client.session.read().await.is_some());

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /auth/v1/logout"));
        assert!(request
            .to_ascii_lowercase()
            .contains("authorization: bearer user-token"));
    }

    #[tokio::test]
    async fn successful_sign_out_forgets_the_session() {
        let (base, server) = serve_once("204 No Content", "").await;
        let client = client(&base);
        client.store_session(Some("user-token".to_string())).await;

        client.sign_out().await.unwrap();
        assert!(client.session.read().await.is_none());
        server.await.unwrap();
    }
}
