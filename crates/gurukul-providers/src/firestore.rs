//! Firestore REST document store.
//!
//! Talks to the Firestore v1 REST API. Field values travel in Firestore's
//! typed JSON form (`{"stringValue": "..."}`, `{"integerValue": "42"}`, ...)
//! and are converted to and from [`FieldValue`] at this boundary.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::instrument;

use reqwest::Url;

use gurukul_core::error::StoreError;
use gurukul_core::model::{Document, DocumentKey, FieldValue, Fields};
use gurukul_core::traits::{Direction, DocumentStore, Filter, FilterOp, Query};

pub const DEFAULT_BASE_URL: &str = "https://firestore.googleapis.com";
pub const DEFAULT_DATABASE: &str = "(default)";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Connection settings for [`FirestoreStore`].
#[derive(Clone, Default)]
pub struct FirestoreOptions {
    pub project_id: String,
    pub database: Option<String>,
    pub api_key: Option<String>,
    /// OAuth2 access token sent as a bearer token.
    pub auth_token: Option<String>,
    pub base_url: Option<String>,
}

/// A [`DocumentStore`] backed by Cloud Firestore.
pub struct FirestoreStore {
    /// `.../v1/projects/{project}/databases/{database}`; path segments are
    /// appended per request so ids are percent-encoded.
    database_url: Url,
    api_key: Option<String>,
    auth_token: Option<String>,
    client: reqwest::Client,
}

impl FirestoreStore {
    pub fn new(options: FirestoreOptions) -> anyhow::Result<Self> {
        if options.project_id.is_empty() {
            anyhow::bail!("firestore project_id must not be empty");
        }
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .map_err(|e| anyhow::anyhow!("failed to build HTTP client: {e}"))?;

        let base_url = options
            .base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let database = options
            .database
            .unwrap_or_else(|| DEFAULT_DATABASE.to_string());

        let mut database_url = Url::parse(&base_url)
            .map_err(|e| anyhow::anyhow!("invalid firestore base_url `{base_url}`: {e}"))?;
        database_url
            .path_segments_mut()
            .map_err(|_| anyhow::anyhow!("firestore base_url `{base_url}` cannot hold a path"))?
            .pop_if_empty()
            .extend(["v1", "projects", options.project_id.as_str(), "databases", database.as_str()]);

        Ok(Self {
            database_url,
            api_key: options.api_key.filter(|k| !k.is_empty()),
            auth_token: options.auth_token.filter(|t| !t.is_empty()),
            client,
        })
    }

    /// The database URL with `segments` appended, each percent-encoded.
    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.database_url.clone();
        // `new` rejected base URLs that cannot hold path segments.
        if let Ok(mut path) = url.path_segments_mut() {
            path.extend(segments);
        }
        url
    }

    fn document_url(&self, key: &DocumentKey) -> Url {
        self.url(&["documents", &key.collection, &key.id])
    }

    fn request(&self, method: reqwest::Method, url: Url) -> reqwest::RequestBuilder {
        let mut builder = self.client.request(method, url);
        if let Some(key) = &self.api_key {
            builder = builder.query(&[("key", key)]);
        }
        if let Some(token) = &self.auth_token {
            builder = builder.bearer_auth(token);
        }
        builder
    }

    async fn send(
        &self,
        builder: reqwest::RequestBuilder,
        target: &str,
    ) -> Result<reqwest::Response, StoreError> {
        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                StoreError::Timeout(DEFAULT_TIMEOUT_SECS)
            } else {
                StoreError::Network(e.to_string())
            }
        })?;

        let status = response.status().as_u16();
        if status < 400 {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorEnvelope>(&body)
            .map(|e| e.error.message)
            .unwrap_or(body);
        Err(match status {
            401 | 403 => StoreError::PermissionDenied(message),
            404 => StoreError::NotFound(target.to_string()),
            _ => StoreError::Api { status, message },
        })
    }
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

#[derive(Deserialize)]
struct RawDocument {
    name: String,
    #[serde(default)]
    fields: Map<String, Value>,
}

#[derive(Deserialize)]
struct RunQueryItem {
    #[serde(default)]
    document: Option<RawDocument>,
}

#[async_trait]
impl DocumentStore for FirestoreStore {
    fn name(&self) -> &str {
        "firestore"
    }

    #[instrument(skip(self), fields(key = %key))]
    async fn get(&self, key: &DocumentKey) -> Result<Option<Document>, StoreError> {
        key.validate()?;
        let target = key.to_string();
        let builder = self.request(reqwest::Method::GET, self.document_url(key));
        let response = match self.send(builder, &target).await {
            Ok(response) => response,
            Err(StoreError::NotFound(_)) => return Ok(None),
            Err(e) => return Err(e),
        };
        let raw: RawDocument = response
            .json()
            .await
            .map_err(|e| StoreError::malformed(&target, e.to_string()))?;
        decode_document(raw).map(Some)
    }

    #[instrument(skip(self, fields), fields(key = %key))]
    async fn set(&self, key: &DocumentKey, fields: Fields) -> Result<(), StoreError> {
        key.validate()?;
        let builder = self
            .request(reqwest::Method::PATCH, self.document_url(key))
            .json(&json!({ "fields": encode_fields(&fields) }));
        self.send(builder, &key.to_string()).await?;
        Ok(())
    }

    #[instrument(skip(self, fields), fields(key = %key))]
    async fn update(&self, key: &DocumentKey, fields: Fields) -> Result<(), StoreError> {
        key.validate()?;
        let mut params: Vec<(&str, String)> = fields
            .keys()
            .map(|name| ("updateMask.fieldPaths", field_path(name)))
            .collect();
        params.push(("currentDocument.exists", "true".to_string()));

        let builder = self
            .request(reqwest::Method::PATCH, self.document_url(key))
            .query(&params)
            .json(&json!({ "fields": encode_fields(&fields) }));
        self.send(builder, &key.to_string()).await?;
        Ok(())
    }

    #[instrument(skip(self, fields))]
    async fn add(&self, collection: &str, fields: Fields) -> Result<String, StoreError> {
        if collection.is_empty() || collection.contains('/') {
            return Err(StoreError::InvalidKey(collection.to_string()));
        }
        let builder = self
            .request(reqwest::Method::POST, self.url(&["documents", collection]))
            .json(&json!({ "fields": encode_fields(&fields) }));
        let response = self.send(builder, collection).await?;
        let raw: RawDocument = response
            .json()
            .await
            .map_err(|e| StoreError::malformed(collection, e.to_string()))?;
        Ok(document_id(&raw.name).to_string())
    }

    #[instrument(skip(self, query), fields(collection = %query.collection))]
    async fn query(&self, query: &Query) -> Result<Vec<Document>, StoreError> {
        let builder = self
            .request(reqwest::Method::POST, self.url(&["documents:runQuery"]))
            .json(&json!({ "structuredQuery": structured_query(query) }));
        let response = self.send(builder, &query.collection).await?;
        let items: Vec<RunQueryItem> = response
            .json()
            .await
            .map_err(|e| StoreError::malformed(&query.collection, e.to_string()))?;

        // Items without a document only carry a read time.
        items
            .into_iter()
            .filter_map(|item| item.document)
            .map(decode_document)
            .collect()
    }
}

fn document_id(name: &str) -> &str {
    name.rsplit('/').next().unwrap_or(name)
}

/// Field names outside `[A-Za-z_][A-Za-z0-9_]*` must be backquoted in masks.
fn field_path(name: &str) -> String {
    let simple = name
        .chars()
        .next()
        .map(|c| c.is_ascii_alphabetic() || c == '_')
        .unwrap_or(false)
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if simple {
        name.to_string()
    } else {
        format!("`{}`", name.replace('\\', "\\\\").replace('`', "\\`"))
    }
}

fn structured_query(query: &Query) -> Value {
    let mut structured = Map::new();
    structured.insert(
        "from".into(),
        json!([{ "collectionId": query.collection }]),
    );

    let mut filters: Vec<Value> = query.filters.iter().map(field_filter).collect();
    match filters.len() {
        0 => {}
        1 => {
            structured.insert("where".into(), filters.remove(0));
        }
        _ => {
            structured.insert(
                "where".into(),
                json!({ "compositeFilter": { "op": "AND", "filters": filters } }),
            );
        }
    }

    if let Some(order) = &query.order_by {
        let direction = match order.direction {
            Direction::Ascending => "ASCENDING",
            Direction::Descending => "DESCENDING",
        };
        structured.insert(
            "orderBy".into(),
            json!([{ "field": { "fieldPath": field_path(&order.field) }, "direction": direction }]),
        );
    }
    if let Some(limit) = query.limit {
        structured.insert("limit".into(), json!(limit));
    }

    Value::Object(structured)
}

fn field_filter(filter: &Filter) -> Value {
    let op = match filter.op {
        FilterOp::Equal => "EQUAL",
        FilterOp::ArrayContains => "ARRAY_CONTAINS",
    };
    json!({
        "fieldFilter": {
            "field": { "fieldPath": field_path(&filter.field) },
            "op": op,
            "value": encode_value(&filter.value),
        }
    })
}

fn encode_fields(fields: &Fields) -> Value {
    Value::Object(
        fields
            .iter()
            .map(|(name, value)| (name.clone(), encode_value(value)))
            .collect(),
    )
}

fn encode_value(value: &FieldValue) -> Value {
    match value {
        FieldValue::Null => json!({ "nullValue": null }),
        FieldValue::Bool(b) => json!({ "booleanValue": b }),
        FieldValue::Integer(i) => json!({ "integerValue": i.to_string() }),
        FieldValue::Double(d) if d.is_nan() => json!({ "doubleValue": "NaN" }),
        FieldValue::Double(d) if d.is_infinite() => {
            let text = if *d > 0.0 { "Infinity" } else { "-Infinity" };
            json!({ "doubleValue": text })
        }
        FieldValue::Double(d) => json!({ "doubleValue": d }),
        FieldValue::String(s) => json!({ "stringValue": s }),
        FieldValue::Timestamp(t) => {
            json!({ "timestampValue": t.to_rfc3339_opts(SecondsFormat::AutoSi, true) })
        }
        FieldValue::Array(items) => {
            let values: Vec<Value> = items.iter().map(encode_value).collect();
            json!({ "arrayValue": { "values": values } })
        }
        FieldValue::Map(fields) => json!({ "mapValue": { "fields": encode_fields(fields) } }),
    }
}

fn decode_document(raw: RawDocument) -> Result<Document, StoreError> {
    let fields = decode_fields(&raw.fields).map_err(|e| StoreError::malformed(&raw.name, e))?;
    Ok(Document {
        id: document_id(&raw.name).to_string(),
        fields,
    })
}

fn decode_fields(raw: &Map<String, Value>) -> Result<Fields, String> {
    raw.iter()
        .map(|(name, value)| {
            decode_value(value)
                .map(|v| (name.clone(), v))
                .map_err(|e| format!("field `{name}`: {e}"))
        })
        .collect()
}

fn decode_value(raw: &Value) -> Result<FieldValue, String> {
    let Some((kind, inner)) = raw.as_object().and_then(|o| o.iter().next()) else {
        return Err("expected a typed value object".into());
    };

    match kind.as_str() {
        "nullValue" => Ok(FieldValue::Null),
        "booleanValue" => inner
            .as_bool()
            .map(FieldValue::Bool)
            .ok_or_else(|| "booleanValue is not a bool".into()),
        "integerValue" => match inner {
            Value::String(s) => s.parse().map(FieldValue::Integer).map_err(|e| e.to_string()),
            other => other
                .as_i64()
                .map(FieldValue::Integer)
                .ok_or_else(|| "integerValue is not an integer".into()),
        },
        "doubleValue" => match inner {
            Value::String(s) => s.parse().map(FieldValue::Double).map_err(|e| e.to_string()),
            other => other
                .as_f64()
                .map(FieldValue::Double)
                .ok_or_else(|| "doubleValue is not a number".into()),
        },
        "timestampValue" => inner
            .as_str()
            .ok_or_else(|| "timestampValue is not a string".to_string())
            .and_then(|s| DateTime::parse_from_rfc3339(s).map_err(|e| e.to_string()))
            .map(|t| FieldValue::Timestamp(t.with_timezone(&Utc))),
        "stringValue" | "referenceValue" => inner
            .as_str()
            .map(FieldValue::from)
            .ok_or_else(|| format!("{kind} is not a string")),
        "arrayValue" => {
            let values = inner
                .get("values")
                .and_then(Value::as_array)
                .map(Vec::as_slice)
                .unwrap_or_default();
            values
                .iter()
                .map(decode_value)
                .collect::<Result<Vec<_>, _>>()
                .map(FieldValue::Array)
        }
        "mapValue" => match inner.get("fields").and_then(Value::as_object) {
            Some(fields) => decode_fields(fields).map(FieldValue::Map),
            None => Ok(FieldValue::Map(Fields::new())),
        },
        other => Err(format!("unsupported value type `{other}`")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const DOCS: &str = "/v1/projects/demo/databases/(default)/documents";

    fn store(server: &MockServer) -> FirestoreStore {
        FirestoreStore::new(FirestoreOptions {
            project_id: "demo".into(),
            api_key: Some("web-key".into()),
            base_url: Some(server.uri()),
            ..Default::default()
        })
        .unwrap()
    }

    fn key(collection: &str, id: &str) -> DocumentKey {
        DocumentKey::new(collection, id)
    }

    #[tokio::test]
    async fn get_decodes_typed_fields() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(format!("{DOCS}/student_progress/s1_c1")))
            .and(query_param("key", "web-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": "projects/demo/databases/(default)/documents/student_progress/s1_c1",
                "fields": {
                    "studentId": {"stringValue": "s1"},
                    "assignmentsCompleted": {"integerValue": "3"},
                    "averageGrade": {"doubleValue": 84.5},
                    "lastActive": {"timestampValue": "2026-03-01T09:30:00Z"},
                    "tags": {"arrayValue": {}},
                    "meta": {"mapValue": {"fields": {"late": {"booleanValue": false}}}}
                },
                "createTime": "2026-03-01T09:30:00.000001Z",
                "updateTime": "2026-03-01T09:30:00.000001Z"
            })))
            .mount(&server)
            .await;

        let doc = store(&server)
            .get(&key("student_progress", "s1_c1"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(doc.id, "s1_c1");
        assert_eq!(
            doc.fields.get("assignmentsCompleted"),
            Some(&FieldValue::Integer(3))
        );
        assert_eq!(
            doc.fields.get("lastActive"),
            Some(&FieldValue::Timestamp(
                Utc.with_ymd_and_hms(2026, 3, 1, 9, 30, 0).unwrap()
            ))
        );
        assert_eq!(doc.fields.get("tags"), Some(&FieldValue::Array(vec![])));
        let meta = doc.fields.get("meta").and_then(FieldValue::as_map).unwrap();
        assert_eq!(meta.get("late"), Some(&FieldValue::Bool(false)));
    }

    #[tokio::test]
    async fn reserved_characters_in_ids_are_encoded() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(format!("{DOCS}/users/a")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": "projects/demo/databases/(default)/documents/users/a",
                "fields": {"displayName": {"stringValue": "someone else"}}
            })))
            .expect(0)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(format!("{DOCS}/users/a%3Fb%23c")))
            .and(query_param("key", "web-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": "projects/demo/databases/(default)/documents/users/a?b#c",
                "fields": {"displayName": {"stringValue": "Asha"}}
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("PATCH"))
            .and(path(format!("{DOCS}/student_progress/x%3Fy_c1")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": "projects/demo/databases/(default)/documents/student_progress/x?y_c1"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let store = store(&server);
        let doc = store.get(&key("users", "a?b#c")).await.unwrap().unwrap();
        assert_eq!(doc.fields.get("displayName"), Some(&FieldValue::from("Asha")));
        store
            .set(&key("student_progress", "x?y_c1"), Fields::new())
            .await
            .unwrap();
    }

    #[test]
    fn base_url_without_path_support_is_rejected() {
        let result = FirestoreStore::new(FirestoreOptions {
            project_id: "demo".into(),
            base_url: Some("mailto:ops@example.com".into()),
            ..Default::default()
        });
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn get_missing_is_none() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "error": {"code": 404, "message": "Document not found", "status": "NOT_FOUND"}
            })))
            .mount(&server)
            .await;

        let doc = store(&server)
            .get(&key("class_analytics", "c9"))
            .await
            .unwrap();
        assert!(doc.is_none());
    }

    #[tokio::test]
    async fn set_overwrites_with_patch() {
        let server = MockServer::start().await;

        Mock::given(method("PATCH"))
            .and(path(format!("{DOCS}/class_analytics/c1")))
            .and(body_partial_json(json!({
                "fields": {
                    "totalStudents": {"integerValue": "4"},
                    "classId": {"stringValue": "c1"}
                }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": "projects/demo/databases/(default)/documents/class_analytics/c1"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let mut fields = Fields::new();
        fields.insert("classId".into(), "c1".into());
        fields.insert("totalStudents".into(), FieldValue::Integer(4));
        store(&server)
            .set(&key("class_analytics", "c1"), fields)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn update_uses_mask_and_precondition() {
        let server = MockServer::start().await;

        Mock::given(method("PATCH"))
            .and(path(format!("{DOCS}/submissions/sub1")))
            .and(query_param("updateMask.fieldPaths", "grade"))
            .and(query_param("updateMask.fieldPaths", "feedback"))
            .and(query_param("currentDocument.exists", "true"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": "projects/demo/databases/(default)/documents/submissions/sub1"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let mut fields = Fields::new();
        fields.insert("grade".into(), FieldValue::Integer(80));
        fields.insert("feedback".into(), "Good".into());
        store(&server)
            .update(&key("submissions", "sub1"), fields)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn update_of_missing_document_is_not_found() {
        let server = MockServer::start().await;

        Mock::given(method("PATCH"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let err = store(&server)
            .update(&key("student_progress", "s1_c1"), Fields::new())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(k) if k == "student_progress/s1_c1"));
    }

    #[tokio::test]
    async fn add_returns_generated_id() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(format!("{DOCS}/analytics_events")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": "projects/demo/databases/(default)/documents/analytics_events/Xy12Ab",
                "fields": {}
            })))
            .mount(&server)
            .await;

        let id = store(&server)
            .add("analytics_events", Fields::new())
            .await
            .unwrap();
        assert_eq!(id, "Xy12Ab");
    }

    #[tokio::test]
    async fn query_builds_structured_query() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(format!("{DOCS}:runQuery")))
            .and(body_partial_json(json!({
                "structuredQuery": {
                    "from": [{"collectionId": "users"}],
                    "where": {"compositeFilter": {"op": "AND", "filters": [
                        {"fieldFilter": {
                            "field": {"fieldPath": "role"},
                            "op": "EQUAL",
                            "value": {"stringValue": "student"}
                        }},
                        {"fieldFilter": {
                            "field": {"fieldPath": "classes"},
                            "op": "ARRAY_CONTAINS",
                            "value": {"stringValue": "c1"}
                        }}
                    ]}},
                    "orderBy": [{"field": {"fieldPath": "displayName"}, "direction": "ASCENDING"}]
                }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"document": {
                    "name": "projects/demo/databases/(default)/documents/users/s2",
                    "fields": {"displayName": {"stringValue": "Arjun"}}
                }, "readTime": "2026-03-01T00:00:00Z"},
                {"document": {
                    "name": "projects/demo/databases/(default)/documents/users/s1",
                    "fields": {"displayName": {"stringValue": "Zoya"}}
                }, "readTime": "2026-03-01T00:00:00Z"}
            ])))
            .mount(&server)
            .await;

        let query = Query::collection("users")
            .filter(Filter::eq("role", "student"))
            .filter(Filter::array_contains("classes", "c1"))
            .order_by("displayName", Direction::Ascending);
        let docs = store(&server).query(&query).await.unwrap();
        let ids: Vec<_> = docs.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["s2", "s1"]);
    }

    #[tokio::test]
    async fn empty_query_result_has_only_read_time() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(format!("{DOCS}:runQuery")))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([{"readTime": "2026-03-01T00:00:00Z"}])),
            )
            .mount(&server)
            .await;

        let docs = store(&server)
            .query(&Query::collection("analytics_events").limit(10))
            .await
            .unwrap();
        assert!(docs.is_empty());
    }

    #[tokio::test]
    async fn forbidden_is_permission_denied() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({
                "error": {"code": 403, "message": "Missing or insufficient permissions.", "status": "PERMISSION_DENIED"}
            })))
            .mount(&server)
            .await;

        let err = store(&server)
            .get(&key("users", "u1"))
            .await
            .unwrap_err();
        assert!(
            matches!(err, StoreError::PermissionDenied(m) if m.contains("insufficient permissions"))
        );
    }

    #[tokio::test]
    async fn bearer_token_is_sent() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(header("authorization", "Bearer ya29.token"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let store = FirestoreStore::new(FirestoreOptions {
            project_id: "demo".into(),
            auth_token: Some("ya29.token".into()),
            base_url: Some(server.uri()),
            ..Default::default()
        })
        .unwrap();
        assert!(store.get(&key("users", "u1")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn invalid_key_is_rejected_locally() {
        let server = MockServer::start().await;
        let err = store(&server).get(&key("users", "")).await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidKey(_)));
    }

    #[test]
    fn field_paths_are_quoted_when_needed() {
        assert_eq!(field_path("averageGrade"), "averageGrade");
        assert_eq!(field_path("last-active"), "`last-active`");
        assert_eq!(field_path("2nd"), "`2nd`");
    }

    #[test]
    fn non_finite_doubles_survive_encoding() {
        let encoded = encode_value(&FieldValue::Double(f64::INFINITY));
        assert_eq!(encoded, json!({"doubleValue": "Infinity"}));
        assert_eq!(
            decode_value(&encoded).unwrap(),
            FieldValue::Double(f64::INFINITY)
        );
    }

    #[test]
    fn unknown_value_type_is_malformed() {
        let raw = RawDocument {
            name: "projects/demo/databases/(default)/documents/users/u1".into(),
            fields: json!({"pos": {"geoPointValue": {"latitude": 1.0}}})
                .as_object()
                .cloned()
                .unwrap(),
        };
        assert!(matches!(
            decode_document(raw),
            Err(StoreError::Malformed { .. })
        ));
    }
}
