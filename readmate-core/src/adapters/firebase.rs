//! Firebase adapters
//!
//! Identity goes through the Identity Toolkit REST API (`accounts:signUp`,
//! `accounts:signInWithPassword`) with Secure Token refresh. Documents go
//! through the Firestore REST API v1. Firestore values are typed
//! (`stringValue`, `integerValue`, ...) and are converted to plain JSON at
//! this boundary.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use url::Url;

use super::session::SessionStore;
use crate::config::FirebaseSettings;
use crate::domain::result::{Error, IdentityError, Result};
use crate::domain::{Document, TIMESTAMP_FIELDS};
use crate::ports::{AuthSession, DocumentStore, IdentityProvider};

pub const DEFAULT_IDENTITY_URL: &str = "https://identitytoolkit.googleapis.com";
pub const DEFAULT_TOKEN_URL: &str = "https://securetoken.googleapis.com";
pub const DEFAULT_FIRESTORE_URL: &str = "https://firestore.googleapis.com";

/// Tokens this close to expiry are refreshed before use
const TOKEN_REFRESH_MARGIN_SECS: i64 = 60;

/// Validate a configured base URL and strip any trailing slash
fn base_url(configured: Option<&str>, default: &str) -> Result<String> {
    let raw = configured.unwrap_or(default);
    let parsed = Url::parse(raw).map_err(|e| Error::config(format!("Invalid URL '{raw}': {e}")))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(Error::config(format!("URL must use http or https: {raw}")));
    }
    Ok(raw.trim_end_matches('/').to_string())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignInResponse {
    local_id: String,
    #[serde(default)]
    email: Option<String>,
    id_token: String,
    refresh_token: String,
    expires_in: String,
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    id_token: String,
    refresh_token: String,
    expires_in: String,
    user_id: String,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

/// Pull the error message out of a Google API error response
async fn error_message(response: Response) -> String {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    serde_json::from_str::<ErrorEnvelope>(&body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| format!("HTTP {status}: {body}"))
}

/// Map an Identity Toolkit error code to the identity taxonomy
///
/// Codes may carry a suffix, e.g. `WEAK_PASSWORD : Password should be ...`.
fn map_identity_error(message: &str) -> IdentityError {
    let code = message.split(" : ").next().unwrap_or(message).trim();
    match code {
        "INVALID_EMAIL" | "MISSING_EMAIL" => IdentityError::InvalidEmail,
        "EMAIL_NOT_FOUND" => IdentityError::UnknownAccount,
        "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS" | "MISSING_PASSWORD" => {
            IdentityError::InvalidCredentials
        }
        "EMAIL_EXISTS" => IdentityError::EmailInUse,
        "WEAK_PASSWORD" => IdentityError::WeakPassword,
        _ => IdentityError::Other(message.to_string()),
    }
}

fn expiry(expires_in: &str) -> Option<DateTime<Utc>> {
    let secs: i64 = expires_in.parse().ok()?;
    Some(Utc::now() + chrono::Duration::seconds(secs))
}

/// Firebase Authentication via the Identity Toolkit REST API
pub struct FirebaseAuthProvider {
    client: Client,
    api_key: String,
    identity_url: String,
    token_url: String,
    session: Arc<SessionStore>,
}

impl FirebaseAuthProvider {
    pub fn new(settings: &FirebaseSettings, timeout: Duration, session: Arc<SessionStore>) -> Result<Self> {
        let api_key = settings
            .api_key
            .clone()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| Error::config("Firebase API key is not set"))?;

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key,
            identity_url: base_url(settings.identity_url.as_deref(), DEFAULT_IDENTITY_URL)?,
            token_url: base_url(settings.token_url.as_deref(), DEFAULT_TOKEN_URL)?,
            session,
        })
    }

    pub(crate) fn client(&self) -> &Client {
        &self.client
    }

    async fn account_request(&self, endpoint: &str, email: &str, password: &str) -> Result<AuthSession> {
        let url = format!("{}/v1/accounts:{}", self.identity_url, endpoint);
        let response = self
            .client
            .post(&url)
            .query(&[("key", &self.api_key)])
            .json(&json!({
                "email": email,
                "password": password,
                "returnSecureToken": true,
            }))
            .send()
            .await
            .map_err(|e| IdentityError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let message = error_message(response).await;
            return Err(map_identity_error(&message).into());
        }

        let data: SignInResponse = response
            .json()
            .await
            .map_err(|e| IdentityError::Other(format!("Failed to parse sign-in response: {e}")))?;

        let session = AuthSession {
            user_id: data.local_id,
            email: data.email.unwrap_or_else(|| email.to_string()),
            signed_in_at: Utc::now(),
            expires_at: expiry(&data.expires_in),
            id_token: Some(data.id_token),
            refresh_token: Some(data.refresh_token),
        };
        self.session.save(&session)?;
        Ok(session)
    }

    /// A valid ID token for the current session, refreshing it if needed
    pub async fn id_token(&self) -> Result<String> {
        let session = self.session.load().ok_or(Error::NotAuthenticated)?;

        let fresh_until = Utc::now() + chrono::Duration::seconds(TOKEN_REFRESH_MARGIN_SECS);
        if let (Some(token), Some(expires_at)) = (&session.id_token, session.expires_at) {
            if expires_at > fresh_until {
                return Ok(token.clone());
            }
        }

        let refreshed = self.refresh(&session).await?;
        refreshed.id_token.ok_or(Error::NotAuthenticated)
    }

    async fn refresh(&self, session: &AuthSession) -> Result<AuthSession> {
        let refresh_token = session.refresh_token.as_deref().ok_or(Error::NotAuthenticated)?;
        let url = format!("{}/v1/token", self.token_url);

        let response = self
            .client
            .post(&url)
            .query(&[("key", &self.api_key)])
            .form(&[("grant_type", "refresh_token"), ("refresh_token", refresh_token)])
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        if !response.status().is_success() {
            // Refresh tokens are revoked on password change or account removal
            let message = error_message(response).await;
            eprintln!("[readmate] Session refresh rejected: {}", message);
            self.session.clear()?;
            return Err(Error::NotAuthenticated);
        }

        let data: RefreshResponse = response
            .json()
            .await
            .map_err(|e| Error::store(format!("Failed to parse token response: {e}")))?;

        let renewed = AuthSession {
            user_id: data.user_id,
            email: session.email.clone(),
            signed_in_at: session.signed_in_at,
            expires_at: expiry(&data.expires_in),
            id_token: Some(data.id_token),
            refresh_token: Some(data.refresh_token),
        };
        self.session.save(&renewed)?;
        Ok(renewed)
    }
}

#[async_trait]
impl IdentityProvider for FirebaseAuthProvider {
    fn name(&self) -> &str {
        "firebase"
    }

    async fn create_user(&self, email: &str, password: &str) -> Result<AuthSession> {
        self.account_request("signUp", email, password).await
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession> {
        self.account_request("signInWithPassword", email, password).await
    }

    fn current_session(&self) -> Option<AuthSession> {
        self.session.load()
    }

    fn sign_out(&self) -> Result<()> {
        self.session.clear()
    }
}

/// Convert plain JSON into a Firestore typed value
pub fn to_firestore_value(value: &Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Number(n) => match n.as_i64() {
            Some(i) => json!({ "integerValue": i.to_string() }),
            None => json!({ "doubleValue": n.as_f64() }),
        },
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(items) => json!({
            "arrayValue": { "values": items.iter().map(to_firestore_value).collect::<Vec<_>>() }
        }),
        Value::Object(map) => json!({ "mapValue": { "fields": to_firestore_fields(map) } }),
    }
}

/// Convert a Firestore typed value into plain JSON
///
/// Timestamps become epoch milliseconds. Unknown value kinds read as null.
pub fn from_firestore_value(value: &Value) -> Value {
    let Some(typed) = value.as_object() else {
        return Value::Null;
    };

    if let Some(s) = typed.get("stringValue") {
        return s.clone();
    }
    if let Some(b) = typed.get("booleanValue") {
        return b.clone();
    }
    if let Some(i) = typed.get("integerValue") {
        return match i {
            Value::String(s) => s.parse::<i64>().map(Value::from).unwrap_or(Value::Null),
            other => other.clone(),
        };
    }
    if let Some(d) = typed.get("doubleValue") {
        return d.clone();
    }
    if let Some(ts) = typed.get("timestampValue").and_then(Value::as_str) {
        return DateTime::parse_from_rfc3339(ts)
            .map(|dt| Value::from(dt.timestamp_millis()))
            .unwrap_or(Value::Null);
    }
    if let Some(r) = typed.get("referenceValue") {
        return r.clone();
    }
    if let Some(array) = typed.get("arrayValue") {
        let values = array
            .get("values")
            .and_then(Value::as_array)
            .map(|items| items.iter().map(from_firestore_value).collect())
            .unwrap_or_default();
        return Value::Array(values);
    }
    if let Some(map) = typed.get("mapValue") {
        let fields = map.get("fields").and_then(Value::as_object);
        return Value::Object(fields.map(from_firestore_fields).unwrap_or_default());
    }
    Value::Null
}

/// Convert a stored document into Firestore fields
///
/// Integer values under [`TIMESTAMP_FIELDS`] are written as `timestampValue`
/// so other Firestore clients read them as dates.
pub fn to_document_fields(doc: &Document) -> Document {
    doc.iter()
        .map(|(k, v)| {
            let typed = match v.as_i64() {
                Some(ms) if TIMESTAMP_FIELDS.contains(&k.as_str()) => timestamp_value(ms)
                    .unwrap_or_else(|| to_firestore_value(v)),
                _ => to_firestore_value(v),
            };
            (k.clone(), typed)
        })
        .collect()
}

fn timestamp_value(ms: i64) -> Option<Value> {
    let dt = Utc.timestamp_millis_opt(ms).single()?;
    Some(json!({ "timestampValue": dt.to_rfc3339_opts(SecondsFormat::Millis, true) }))
}

fn to_firestore_fields(doc: &Document) -> Document {
    doc.iter()
        .map(|(k, v)| (k.clone(), to_firestore_value(v)))
        .collect()
}

fn from_firestore_fields(fields: &Document) -> Document {
    fields
        .iter()
        .map(|(k, v)| (k.clone(), from_firestore_value(v)))
        .collect()
}

#[derive(Debug, Deserialize)]
struct FirestoreDocument {
    #[serde(default)]
    fields: Document,
}

#[derive(Debug, Deserialize)]
struct RunQueryItem {
    #[serde(default)]
    document: Option<FirestoreDocument>,
}

/// Cloud Firestore via the REST API
pub struct FirestoreDocumentStore {
    client: Client,
    documents_url: String,
    auth: Arc<FirebaseAuthProvider>,
}

impl FirestoreDocumentStore {
    pub fn new(settings: &FirebaseSettings, auth: Arc<FirebaseAuthProvider>) -> Result<Self> {
        let project_id = settings
            .project_id
            .clone()
            .filter(|p| !p.is_empty())
            .ok_or_else(|| Error::config("Firebase project id is not set"))?;
        let base = base_url(settings.firestore_url.as_deref(), DEFAULT_FIRESTORE_URL)?;

        Ok(Self {
            client: auth.client().clone(),
            documents_url: format!("{base}/v1/projects/{project_id}/databases/(default)/documents"),
            auth,
        })
    }

    fn document_url(&self, collection: &str, id: &str) -> String {
        format!("{}/{}/{}", self.documents_url, collection, id)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let token = self.auth.id_token().await?;
        request
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))
    }

    async fn fail(response: Response, what: &str) -> Error {
        match response.status() {
            StatusCode::UNAUTHORIZED => Error::NotAuthenticated,
            StatusCode::NOT_FOUND => Error::not_found(what.to_string()),
            status => {
                let message = error_message(response).await;
                Error::store(format!("Firestore {status} for {what}: {message}"))
            }
        }
    }
}

#[async_trait]
impl DocumentStore for FirestoreDocumentStore {
    async fn set(&self, collection: &str, id: &str, data: Document) -> Result<()> {
        let request = self
            .client
            .patch(self.document_url(collection, id))
            .json(&json!({ "fields": to_document_fields(&data) }));
        let response = self.send(request).await?;
        if !response.status().is_success() {
            return Err(Self::fail(response, &format!("{collection}/{id}")).await);
        }
        Ok(())
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>> {
        let response = self.send(self.client.get(self.document_url(collection, id))).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(Self::fail(response, &format!("{collection}/{id}")).await);
        }
        let doc: FirestoreDocument = response
            .json()
            .await
            .map_err(|e| Error::store(format!("Failed to parse document: {e}")))?;
        Ok(Some(from_firestore_fields(&doc.fields)))
    }

    async fn update(&self, collection: &str, id: &str, fields: Document) -> Result<()> {
        let mut query: Vec<(&str, String)> = fields
            .keys()
            .map(|k| ("updateMask.fieldPaths", k.clone()))
            .collect();
        query.push(("currentDocument.exists", "true".to_string()));

        let request = self
            .client
            .patch(self.document_url(collection, id))
            .query(&query)
            .json(&json!({ "fields": to_document_fields(&fields) }));
        let response = self.send(request).await?;
        if !response.status().is_success() {
            return Err(Self::fail(response, &format!("{collection}/{id}")).await);
        }
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<()> {
        let response = self.send(self.client.delete(self.document_url(collection, id))).await?;
        if response.status().is_success() || response.status() == StatusCode::NOT_FOUND {
            return Ok(());
        }
        Err(Self::fail(response, &format!("{collection}/{id}")).await)
    }

    async fn query_eq(&self, collection: &str, field: &str, value: &Value) -> Result<Vec<Document>> {
        let body = json!({
            "structuredQuery": {
                "from": [{ "collectionId": collection }],
                "where": {
                    "fieldFilter": {
                        "field": { "fieldPath": field },
                        "op": "EQUAL",
                        "value": to_firestore_value(value),
                    }
                }
            }
        });
        let request = self
            .client
            .post(format!("{}:runQuery", self.documents_url))
            .json(&body);
        let response = self.send(request).await?;
        if !response.status().is_success() {
            return Err(Self::fail(response, &format!("query on {collection}")).await);
        }

        let items: Vec<RunQueryItem> = response
            .json()
            .await
            .map_err(|e| Error::store(format!("Failed to parse query response: {e}")))?;
        Ok(items
            .into_iter()
            .filter_map(|item| item.document)
            .map(|doc| from_firestore_fields(&doc.fields))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{NewTask, Task, User};
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const DOCS_PATH: &str = "/v1/projects/demo/databases/(default)/documents";

    fn settings(server: &MockServer) -> FirebaseSettings {
        FirebaseSettings {
            api_key: Some("test-key".into()),
            project_id: Some("demo".into()),
            identity_url: Some(server.uri()),
            token_url: Some(server.uri()),
            firestore_url: Some(server.uri()),
        }
    }

    fn auth(server: &MockServer) -> Arc<FirebaseAuthProvider> {
        Arc::new(
            FirebaseAuthProvider::new(
                &settings(server),
                Duration::from_secs(5),
                Arc::new(SessionStore::in_memory()),
            )
            .unwrap(),
        )
    }

    async fn mount_sign_in(server: &MockServer, expires_in: &str) {
        Mock::given(method("POST"))
            .and(path("/v1/accounts:signInWithPassword"))
            .and(query_param("key", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "localId": "uid-1",
                "email": "ana@example.com",
                "idToken": "token-1",
                "refreshToken": "refresh-1",
                "expiresIn": expires_in
            })))
            .mount(server)
            .await;
    }

    #[test]
    fn test_identity_error_codes() {
        assert_eq!(map_identity_error("EMAIL_NOT_FOUND"), IdentityError::UnknownAccount);
        assert_eq!(map_identity_error("INVALID_LOGIN_CREDENTIALS"), IdentityError::InvalidCredentials);
        assert_eq!(map_identity_error("INVALID_EMAIL"), IdentityError::InvalidEmail);
        assert_eq!(
            map_identity_error("WEAK_PASSWORD : Password should be at least 6 characters"),
            IdentityError::WeakPassword
        );
        assert!(matches!(map_identity_error("USER_DISABLED"), IdentityError::Other(_)));
    }

    #[test]
    fn test_value_conversion() {
        let doc = json!({
            "title": "Read",
            "completed": false,
            "dueAt": 1_700_000_000_000i64,
            "tags": ["a"],
            "meta": {"score": 1.5}
        });
        let typed = to_firestore_value(&doc);
        assert_eq!(typed["mapValue"]["fields"]["dueAt"]["integerValue"], "1700000000000");
        assert_eq!(from_firestore_value(&typed), doc);

        let ts = json!({"timestampValue": "2023-11-14T22:13:20Z"});
        assert_eq!(from_firestore_value(&ts), json!(1_700_000_000_000i64));
    }

    #[test]
    fn test_task_due_time_written_as_timestamp() {
        let due = Utc.with_ymd_and_hms(2023, 11, 14, 22, 13, 20).unwrap();
        let task = Task::from_new("t1", &NewTask::new("Leer", "Capitulo 3", due), "uid-1");

        let fields = to_document_fields(&task.to_document());
        assert_eq!(fields["fecha"], json!({"timestampValue": "2023-11-14T22:13:20.000Z"}));
        assert_eq!(fields["titulo"], json!({"stringValue": "Leer"}));
        assert_eq!(fields["completada"], json!({"booleanValue": false}));

        let profile = User::new("uid-1", "Ana Lopez", "ana@example.com", due).to_document();
        assert!(to_document_fields(&profile)["createdAt"].get("timestampValue").is_some());
    }

    #[test]
    fn test_mobile_app_task_document_parses() {
        let stored = json!({"mapValue": {"fields": {
            "id": {"stringValue": "abc123"},
            "titulo": {"stringValue": "Leer"},
            "descripcion": {"stringValue": "Capitulo 3"},
            "completada": {"booleanValue": false},
            "fecha": {"timestampValue": "2023-11-14T22:13:20.000000Z"},
            "imagenPath": {"stringValue": "/data/user/0/files/1700000000000.jpg"},
            "userId": {"stringValue": "uid-1"}
        }}});

        let doc = from_firestore_value(&stored).as_object().cloned().unwrap();
        let task = Task::from_document(&doc).unwrap();

        assert_eq!(task.id, "abc123");
        assert_eq!(task.title, "Leer");
        assert_eq!(task.description, "Capitulo 3");
        assert!(!task.completed);
        assert_eq!(task.due_at, 1_700_000_000_000);
        assert_eq!(task.image_path.as_deref(), Some("/data/user/0/files/1700000000000.jpg"));
    }

    #[tokio::test]
    async fn test_sign_in_persists_session() {
        let server = MockServer::start().await;
        mount_sign_in(&server, "3600").await;

        let auth = auth(&server);
        let session = auth.sign_in("ana@example.com", "Secret1").await.unwrap();

        assert_eq!(session.user_id, "uid-1");
        assert_eq!(auth.current_session().unwrap().id_token.as_deref(), Some("token-1"));
        assert_eq!(auth.id_token().await.unwrap(), "token-1");
    }

    #[tokio::test]
    async fn test_sign_in_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/accounts:signInWithPassword"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": {"code": 400, "message": "INVALID_LOGIN_CREDENTIALS"}
            })))
            .mount(&server)
            .await;

        let result = auth(&server).sign_in("ana@example.com", "nope").await;
        assert!(matches!(result, Err(Error::Identity(IdentityError::InvalidCredentials))));
    }

    #[tokio::test]
    async fn test_unreachable_identity_is_network_error() {
        let settings = FirebaseSettings {
            api_key: Some("test-key".into()),
            identity_url: Some("http://127.0.0.1:9".into()),
            ..Default::default()
        };
        let auth = FirebaseAuthProvider::new(
            &settings,
            Duration::from_secs(2),
            Arc::new(SessionStore::in_memory()),
        )
        .unwrap();

        let result = auth.sign_in("ana@example.com", "Secret1").await;
        assert!(matches!(result, Err(Error::Identity(IdentityError::Network(_)))));
    }

    #[tokio::test]
    async fn test_expiring_token_is_refreshed() {
        let server = MockServer::start().await;
        mount_sign_in(&server, "30").await;
        Mock::given(method("POST"))
            .and(path("/v1/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id_token": "token-2",
                "refresh_token": "refresh-2",
                "expires_in": "3600",
                "user_id": "uid-1"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let auth = auth(&server);
        auth.sign_in("ana@example.com", "Secret1").await.unwrap();

        assert_eq!(auth.id_token().await.unwrap(), "token-2");
        assert_eq!(auth.id_token().await.unwrap(), "token-2");
    }

    #[tokio::test]
    async fn test_firestore_get_and_missing() {
        let server = MockServer::start().await;
        mount_sign_in(&server, "3600").await;
        Mock::given(method("GET"))
            .and(path(format!("{DOCS_PATH}/Tasks/t1")))
            .and(header("authorization", "Bearer token-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": "projects/demo/databases/(default)/documents/Tasks/t1",
                "fields": {
                    "id": {"stringValue": "t1"},
                    "completada": {"booleanValue": true},
                    "fecha": {"timestampValue": "1970-01-01T00:00:00.042Z"}
                }
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(format!("{DOCS_PATH}/Tasks/missing")))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "error": {"code": 404, "message": "Document not found", "status": "NOT_FOUND"}
            })))
            .mount(&server)
            .await;

        let auth = auth(&server);
        auth.sign_in("ana@example.com", "Secret1").await.unwrap();
        let store = FirestoreDocumentStore::new(&settings(&server), auth).unwrap();

        let doc = store.get("Tasks", "t1").await.unwrap().unwrap();
        assert_eq!(doc.get("completada"), Some(&json!(true)));
        assert_eq!(doc.get("fecha"), Some(&json!(42)));
        assert!(store.get("Tasks", "missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_firestore_update_missing_document() {
        let server = MockServer::start().await;
        mount_sign_in(&server, "3600").await;
        Mock::given(method("PATCH"))
            .and(path(format!("{DOCS_PATH}/Tasks/gone")))
            .and(query_param("updateMask.fieldPaths", "completada"))
            .and(query_param("currentDocument.exists", "true"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let auth = auth(&server);
        auth.sign_in("ana@example.com", "Secret1").await.unwrap();
        let store = FirestoreDocumentStore::new(&settings(&server), auth).unwrap();

        let mut fields = Document::new();
        fields.insert("completada".into(), json!(true));
        let result = store.update("Tasks", "gone", fields).await;
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn test_firestore_query_skips_read_time_entries() {
        let server = MockServer::start().await;
        mount_sign_in(&server, "3600").await;
        Mock::given(method("POST"))
            .and(path(format!("{DOCS_PATH}:runQuery")))
            .and(body_partial_json(json!({
                "structuredQuery": {"where": {"fieldFilter": {
                    "field": {"fieldPath": "userId"},
                    "op": "EQUAL",
                    "value": {"stringValue": "uid-1"}
                }}}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"document": {"name": "x", "fields": {"id": {"stringValue": "a"}}}, "readTime": "2024-01-01T00:00:00Z"},
                {"document": {"name": "y", "fields": {"id": {"stringValue": "b"}}}, "readTime": "2024-01-01T00:00:00Z"},
                {"readTime": "2024-01-01T00:00:00Z"}
            ])))
            .mount(&server)
            .await;

        let auth = auth(&server);
        auth.sign_in("ana@example.com", "Secret1").await.unwrap();
        let store = FirestoreDocumentStore::new(&settings(&server), auth).unwrap();

        let docs = store.query_eq("Tasks", "userId", &json!("uid-1")).await.unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[1].get("id"), Some(&json!("b")));
    }

    #[tokio::test]
    async fn test_store_requires_session() {
        let server = MockServer::start().await;
        let store = FirestoreDocumentStore::new(&settings(&server), auth(&server)).unwrap();
        let result = store.get("Tasks", "t1").await;
        assert!(matches!(result, Err(Error::NotAuthenticated)));
    }
}
