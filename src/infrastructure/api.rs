//! HTTP client for the Abstract REST API
//!
//! One request per trait call, bearer authenticated. No retries and no timeouts:
//! a hanging request keeps the caller waiting.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::config::Settings;
use crate::domain::{LayerRecord, Record};
use crate::infrastructure::traits::{LayerQuery, PreviewRef, ResourceGraph};
use crate::infrastructure::{InfraError, InfraResult, RemoteError, RemoteResult};

const API_VERSION_HEADER: &str = "abstract-api-version";
/// Project and branch listings leave out archived and deleted entries.
const ACTIVE_FILTER: (&str, &str) = ("filter", "active");
const USER_AGENT: &str = concat!("abstract-explorer/", env!("CARGO_PKG_VERSION"));

/// `ResourceGraph` over the Abstract REST API.
pub struct AbstractApiClient {
    http: Client,
    api_base: Url,
    previews_base: Url,
}

impl AbstractApiClient {
    pub fn new(settings: &Settings, token: &SecretString) -> InfraResult<Self> {
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", token.expose_secret()))
            .map_err(|_| InfraError::Client {
                message: "API token contains invalid characters".into(),
            })?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);
        headers.insert(
            API_VERSION_HEADER,
            HeaderValue::from_str(&settings.api_version).map_err(|e| InfraError::Client {
                message: format!("invalid api_version: {e}"),
            })?,
        );

        let http = Client::builder()
            .default_headers(headers)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| InfraError::Client {
                message: e.to_string(),
            })?;

        Ok(Self {
            http,
            api_base: parse_base("api_base_url", &settings.api_base_url)?,
            previews_base: parse_base("previews_base_url", &settings.previews_base_url)?,
        })
    }

    async fn get(&self, url: Url) -> RemoteResult<reqwest::Response> {
        debug!("GET {}", url);
        let response = self
            .http
            .get(url.clone())
            .send()
            .await
            .map_err(|source| RemoteError::Transport {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RemoteError::Status {
                url: url.to_string(),
                status: status.as_u16(),
                body: body.chars().take(200).collect(),
            });
        }
        Ok(response)
    }

    async fn get_list<T: DeserializeOwned>(&self, url: Url, key: &str) -> RemoteResult<Vec<T>> {
        let response = self.get(url.clone()).await?;
        let body = response
            .bytes()
            .await
            .map_err(|source| RemoteError::Transport {
                url: url.to_string(),
                source,
            })?;
        decode_list(&url, &body, key)
    }
}

/// Decode a list response body; anything that is not the expected JSON is a `Decode` error.
fn decode_list<T: DeserializeOwned>(url: &Url, body: &[u8], key: &str) -> RemoteResult<Vec<T>> {
    let decode = |message: String| RemoteError::Decode {
        url: url.to_string(),
        message,
    };
    let value: Value = serde_json::from_slice(body).map_err(|e| decode(e.to_string()))?;
    extract_list(value, key).map_err(decode)
}

fn parse_base(name: &str, raw: &str) -> InfraResult<Url> {
    let url = Url::parse(raw).map_err(|e| InfraError::Client {
        message: format!("{name} '{raw}': {e}"),
    })?;
    if url.cannot_be_a_base() {
        return Err(InfraError::Client {
            message: format!("{name} '{raw}' cannot be used as a base URL"),
        });
    }
    Ok(url)
}

/// Append path segments (percent-encoded) and query pairs to a base URL.
fn endpoint(base: &Url, segments: &[&str], query: &[(&str, &str)]) -> Url {
    let mut url = base.clone();
    if let Ok(mut path) = url.path_segments_mut() {
        path.pop_if_empty().extend(segments);
    }
    if !query.is_empty() {
        url.query_pairs_mut().extend_pairs(query);
    }
    url
}

/// Pull the list out of a response envelope.
///
/// Accepts a bare array, `{"<key>": [...]}`, `{"data": [...]}` and
/// `{"data": {"<key>": [...]}}`.
fn extract_list<T: DeserializeOwned>(value: Value, key: &str) -> Result<Vec<T>, String> {
    let list = match value {
        Value::Array(_) => value,
        Value::Object(mut map) => match (map.remove(key), map.remove("data")) {
            (Some(list), _) => list,
            (None, Some(Value::Object(mut data))) => data
                .remove(key)
                .ok_or_else(|| format!("missing 'data.{key}'"))?,
            (None, Some(data)) => data,
            (None, None) => return Err(format!("missing '{key}' or 'data'")),
        },
        other => return Err(format!("expected list, got {other}")),
    };
    serde_json::from_value(list).map_err(|e| e.to_string())
}

#[async_trait]
impl ResourceGraph for AbstractApiClient {
    async fn list_organizations(&self) -> RemoteResult<Vec<Record>> {
        let url = endpoint(&self.api_base, &["organizations"], &[]);
        self.get_list(url, "organizations").await
    }

    async fn list_projects(&self, organization_id: &str) -> RemoteResult<Vec<Record>> {
        let url = endpoint(
            &self.api_base,
            &["projects"],
            &[("organizationId", organization_id), ACTIVE_FILTER],
        );
        self.get_list(url, "projects").await
    }

    async fn list_branches(&self, project_id: &str) -> RemoteResult<Vec<Record>> {
        let url = endpoint(
            &self.api_base,
            &["projects", project_id, "branches"],
            &[ACTIVE_FILTER],
        );
        self.get_list(url, "branches").await
    }

    async fn list_files(&self, project_id: &str, branch_id: &str) -> RemoteResult<Vec<Record>> {
        let url = endpoint(
            &self.api_base,
            &["projects", project_id, "branches", branch_id, "files"],
            &[],
        );
        self.get_list(url, "files").await
    }

    async fn list_pages(
        &self,
        project_id: &str,
        branch_id: &str,
        file_id: &str,
    ) -> RemoteResult<Vec<Record>> {
        let url = endpoint(
            &self.api_base,
            &[
                "projects", project_id, "branches", branch_id, "files", file_id, "pages",
            ],
            &[],
        );
        self.get_list(url, "pages").await
    }

    async fn list_layers(&self, query: &LayerQuery<'_>) -> RemoteResult<Vec<LayerRecord>> {
        let limit = query.limit.to_string();
        let url = endpoint(
            &self.api_base,
            &[
                "projects",
                query.project_id,
                "branches",
                query.branch_id,
                "files",
                query.file_id,
                "layers",
            ],
            &[("pageId", query.page_id), ("limit", limit.as_str())],
        );
        self.get_list(url, "layers").await
    }

    async fn fetch_preview(&self, layer: &PreviewRef<'_>) -> RemoteResult<Vec<u8>> {
        let url = endpoint(
            &self.previews_base,
            &[
                "projects",
                layer.project_id,
                "commits",
                layer.sha,
                "files",
                layer.file_id,
                "layers",
                layer.layer_id,
            ],
            &[],
        );
        let response = self.get(url.clone()).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|source| RemoteError::Transport {
                url: url.to_string(),
                source,
            })?;
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn given_base_with_trailing_slash_when_endpoint_then_single_separator() {
        let base = Url::parse("https://api.goabstract.com/").unwrap();
        let url = endpoint(&base, &["projects", "a b", "branches"], &[("filter", "active")]);
        assert_eq!(
            url.as_str(),
            "https://api.goabstract.com/projects/a%20b/branches?filter=active"
        );
    }

    #[test]
    fn given_envelopes_when_extract_then_all_shapes_accepted() {
        let record = json!({"id": "1", "name": "a"});
        let bare: Vec<Record> = extract_list(json!([record]), "files").unwrap();
        let keyed: Vec<Record> = extract_list(json!({"files": [record]}), "files").unwrap();
        let data: Vec<Record> = extract_list(json!({"data": [record]}), "files").unwrap();
        let nested: Vec<Record> =
            extract_list(json!({"data": {"files": [record]}}), "files").unwrap();

        for list in [bare, keyed, data, nested] {
            assert_eq!(list, vec![Record::new("1", "a")]);
        }
    }

    #[test]
    fn given_record_without_name_when_extract_then_error() {
        let result: Result<Vec<Record>, _> = extract_list(json!([{"id": "1"}]), "files");
        assert!(result.is_err());
    }

    #[test]
    fn given_unrelated_object_when_extract_then_error() {
        let result: Result<Vec<Record>, _> = extract_list(json!({"meta": {}}), "pages");
        assert!(result.unwrap_err().contains("pages"));
    }

    #[test]
    fn given_non_json_body_when_decode_then_decode_error() {
        let url = Url::parse("https://api.goabstract.com/organizations").unwrap();

        let result: RemoteResult<Vec<Record>> =
            decode_list(&url, b"<html>maintenance</html>", "organizations");

        match result {
            Err(RemoteError::Decode { url, .. }) => {
                assert_eq!(url, "https://api.goabstract.com/organizations");
            }
            other => panic!("expected decode error, got {other:?}"),
        }
    }

    #[test]
    fn given_json_list_body_when_decode_then_records() {
        let url = Url::parse("https://api.goabstract.com/organizations").unwrap();

        let records: Vec<Record> =
            decode_list(&url, br#"{"data": [{"id": "O", "name": "Acme"}]}"#, "organizations")
                .unwrap();

        assert_eq!(records, vec![Record::new("O", "Acme")]);
    }

    #[test]
    fn given_settings_when_client_built_then_bases_parsed() {
        let settings = Settings::default();
        let token = SecretString::from("tok".to_string());
        let client = AbstractApiClient::new(&settings, &token).unwrap();
        assert_eq!(client.api_base.as_str(), "https://api.goabstract.com/");
    }

    #[test]
    fn given_token_with_newline_when_client_built_then_rejected() {
        let settings = Settings::default();
        let token = SecretString::from("bad\ntoken".to_string());
        let result = AbstractApiClient::new(&settings, &token);
        assert!(matches!(result, Err(InfraError::Client { .. })));
    }
}
