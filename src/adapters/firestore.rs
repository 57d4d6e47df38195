//! Firestore REST (v1) document store.
//!
//! Documents carry typed values (`{"stringValue": "O+"}`); they are flattened
//! to plain JSON and deserialized into [`UserRecord`], so a document that does
//! not fit the record shape fails loudly instead of yielding half a record.

use crate::config::toml_config::FirestoreConfig;
use crate::core::{DocumentStore, ProfileChanges, Result, UserRecord};
use crate::utils::error::DirectoryError;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use url::Url;

const DEFAULT_PAGE_SIZE: u32 = 300;

pub struct FirestoreStore {
    client: Client,
    config: FirestoreConfig,
}

#[derive(Debug, Deserialize)]
struct Document {
    name: String,
    #[serde(default)]
    fields: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListResponse {
    #[serde(default)]
    documents: Vec<Document>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RunQueryItem {
    document: Option<Document>,
}

impl FirestoreStore {
    pub fn new(config: FirestoreConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    fn documents_root(&self) -> String {
        format!(
            "{}/v1/projects/{}/databases/(default)/documents",
            self.config.base_url().trim_end_matches('/'),
            self.config.project_id
        )
    }

    fn parse_url(raw: &str) -> Result<Url> {
        Url::parse(raw).map_err(|e| DirectoryError::ConfigError {
            message: format!("invalid Firestore URL {}: {}", raw, e),
        })
    }

    fn collection_url(&self) -> Result<Url> {
        let mut url = Self::parse_url(&self.documents_root())?;
        url.path_segments_mut()
            .map_err(|_| DirectoryError::ConfigError {
                message: "Firestore base URL cannot have path segments".to_string(),
            })?
            .push(self.config.collection());
        Ok(url)
    }

    fn document_url(&self, id: &str) -> Result<Url> {
        let mut url = self.collection_url()?;
        url.path_segments_mut()
            .map_err(|_| DirectoryError::ConfigError {
                message: "Firestore base URL cannot have path segments".to_string(),
            })?
            .push(id);
        Ok(url)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.config.auth_token {
            Some(token) if !token.is_empty() => request.bearer_auth(token),
            _ => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        self.authorize(request)
            .send()
            .await
            .map_err(|e| DirectoryError::retrieval(format!("Firestore request failed: {}", e)))
    }

    async fn expect_success(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(DirectoryError::retrieval(format!(
            "Firestore returned {}: {}",
            status,
            error_message(&body)
        )))
    }

    async fn json<T: serde::de::DeserializeOwned>(response: Response) -> Result<T> {
        response
            .json()
            .await
            .map_err(|e| DirectoryError::retrieval(format!("unreadable Firestore response: {}", e)))
    }

    async fn patch(&self, id: &str, fields: Value, mask: Option<Vec<&'static str>>) -> Result<()> {
        let mut url = self.document_url(id)?;
        if let Some(mask) = mask {
            let mut query = url.query_pairs_mut();
            for field in mask {
                query.append_pair("updateMask.fieldPaths", field);
            }
            query.append_pair("currentDocument.exists", "true");
        }

        let body = json!({ "fields": encode_fields(fields) });
        let response = self.send(self.client.patch(url).json(&body)).await?;
        Self::expect_success(response).await?;
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for FirestoreStore {
    async fn get(&self, id: &str) -> Result<Option<UserRecord>> {
        let url = self.document_url(id)?;
        tracing::debug!("GET {}", url);

        let response = self.send(self.client.get(url)).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let document: Document = Self::json(Self::expect_success(response).await?).await?;
        decode_document(document).map(Some)
    }

    async fn set(&self, id: &str, changes: &ProfileChanges) -> Result<()> {
        let fields = serde_json::to_value(changes)?;
        tracing::debug!("PATCH {} fields {:?}", id, changes.field_names());
        self.patch(id, fields, Some(changes.field_names())).await
    }

    async fn query(&self, field: &str, value: &str) -> Result<Vec<UserRecord>> {
        let url = Self::parse_url(&format!("{}:runQuery", self.documents_root()))?;
        let body = json!({
            "structuredQuery": {
                "from": [{ "collectionId": self.config.collection() }],
                "where": {
                    "fieldFilter": {
                        "field": { "fieldPath": field },
                        "op": "EQUAL",
                        "value": { "stringValue": value }
                    }
                }
            }
        });
        tracing::debug!("runQuery {} == {}", field, value);

        let response = self.send(self.client.post(url).json(&body)).await?;
        let items: Vec<RunQueryItem> = Self::json(Self::expect_success(response).await?).await?;

        items
            .into_iter()
            .filter_map(|item| item.document)
            .map(decode_document)
            .collect()
    }

    async fn put(&self, record: &UserRecord) -> Result<()> {
        let fields = serde_json::to_value(record)?;
        tracing::debug!("PATCH {} (full document)", record.user_id());
        self.patch(record.user_id(), fields, None).await
    }

    async fn list(&self) -> Result<Vec<UserRecord>> {
        let mut records = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut url = self.collection_url()?;
            {
                let mut query = url.query_pairs_mut();
                query.append_pair("pageSize", &DEFAULT_PAGE_SIZE.to_string());
                if let Some(token) = &page_token {
                    query.append_pair("pageToken", token);
                }
            }

            let response = self.send(self.client.get(url)).await?;
            let page: ListResponse = Self::json(Self::expect_success(response).await?).await?;
            for document in page.documents {
                records.push(decode_document(document)?);
            }

            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        tracing::debug!("Listed {} documents", records.len());
        Ok(records)
    }
}

fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
        .unwrap_or_else(|| body.to_string())
}

fn decode_document(document: Document) -> Result<UserRecord> {
    // Unset fields are stored as `nullValue`; treat them as absent.
    let mut plain: Map<String, Value> = document
        .fields
        .iter()
        .map(|(key, value)| (key.clone(), decode_value(value)))
        .filter(|(_, value)| !value.is_null())
        .collect();

    // Older documents only carry the id in their resource name.
    if !plain.contains_key("userId") {
        if let Some(id) = document.name.rsplit('/').next() {
            plain.insert("userId".to_string(), Value::String(id.to_string()));
        }
    }

    serde_json::from_value(Value::Object(plain)).map_err(|e| {
        DirectoryError::retrieval(format!("malformed document {}: {}", document.name, e))
    })
}

fn decode_value(value: &Value) -> Value {
    let Some((kind, inner)) = value.as_object().and_then(|o| o.iter().next()) else {
        return Value::Null;
    };

    match kind.as_str() {
        "stringValue" | "booleanValue" | "doubleValue" | "timestampValue" => inner.clone(),
        "integerValue" => inner
            .as_str()
            .and_then(|s| s.parse::<i64>().ok())
            .map(Value::from)
            .unwrap_or_else(|| inner.clone()),
        "mapValue" => Value::Object(
            inner["fields"]
                .as_object()
                .map(|fields| {
                    fields
                        .iter()
                        .map(|(k, v)| (k.clone(), decode_value(v)))
                        .collect()
                })
                .unwrap_or_default(),
        ),
        "arrayValue" => Value::Array(
            inner["values"]
                .as_array()
                .map(|values| values.iter().map(decode_value).collect())
                .unwrap_or_default(),
        ),
        _ => Value::Null,
    }
}

fn encode_fields(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, value)| (key, encode_value(value)))
                .collect(),
        ),
        _ => Value::Object(Map::new()),
    }
}

fn encode_value(value: Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Number(n) if n.is_i64() || n.is_u64() => json!({ "integerValue": n.to_string() }),
        Value::Number(n) => json!({ "doubleValue": n }),
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(values) => {
            let values: Vec<Value> = values.into_iter().map(encode_value).collect();
            json!({ "arrayValue": { "values": values } })
        }
        Value::Object(_) => json!({ "mapValue": { "fields": encode_fields(value) } }),
    }
}
