use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use super::config::Endpoints;
use crate::search::codec::SearchParams;

/// Primary key of a resource. The API reports it either as a number or a string.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct ResourceKey(pub String);

impl<'de> Deserialize<'de> for ResourceKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawKey {
            Text(String),
            Number(serde_json::Number),
        }
        Ok(match RawKey::deserialize(deserializer)? {
            RawKey::Text(text) => ResourceKey(text),
            RawKey::Number(number) => ResourceKey(number.to_string()),
        })
    }
}

impl From<&str> for ResourceKey {
    fn from(value: &str) -> Self {
        ResourceKey(value.to_string())
    }
}

impl From<u64> for ResourceKey {
    fn from(value: u64) -> Self {
        ResourceKey(value.to_string())
    }
}

impl std::fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A catalogue entry. Only `pk` and the resource type are interpreted, everything
/// else is carried along untouched.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub pk: ResourceKey,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ctype: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Resource {
    pub fn new(pk: impl Into<ResourceKey>, ctype: &str, title: &str) -> Self {
        Self {
            pk: pk.into(),
            ctype: Some(ctype.to_string()),
            resource_type: None,
            title: Some(title.to_string()),
            fields: Map::new(),
        }
    }

    /// `ctype` when present, `resource_type` otherwise
    pub fn kind(&self) -> Option<&str> {
        self.ctype.as_deref().or(self.resource_type.as_deref())
    }
}

/// One page of search results
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SearchPage {
    pub resources: Vec<Resource>,
    pub is_next_page_available: bool,
}

#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum ApiError {
    #[error("Network Error: {0}")]
    Network(String),
    #[error("HTTP Error: status {status}")]
    Http { status: u16 },
    #[error("Resource {0} not found")]
    NotFound(ResourceKey),
    #[error("Could not decode response: {0}")]
    Decode(String),
}

#[async_trait]
pub trait ResourceApi: Send + Sync {
    async fn search(&self, params: &SearchParams, page_size: u32) -> Result<SearchPage, ApiError>;
    async fn get_by_key(&self, pk: &ResourceKey) -> Result<Resource, ApiError>;
    async fn autocomplete(&self, text: &str) -> Result<Vec<String>, ApiError>;
}

#[derive(Deserialize)]
struct ResourcesResponse {
    #[serde(default)]
    resources: Vec<Resource>,
    #[serde(default)]
    links: Links,
}

#[derive(Default, Deserialize)]
struct Links {
    next: Option<String>,
}

#[derive(Deserialize)]
struct ResourceResponse {
    resource: Resource,
}

#[derive(Deserialize)]
struct AutocompleteResponse {
    #[serde(default)]
    results: Vec<AutocompleteEntry>,
}

#[derive(Deserialize)]
struct AutocompleteEntry {
    text: String,
}

/// GeoNode REST client
#[derive(Clone)]
pub struct HttpResourceApi {
    base_url: String,
    endpoints: Endpoints,
    client: reqwest::Client,
}

impl std::fmt::Debug for HttpResourceApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpResourceApi")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl HttpResourceApi {
    pub fn new(base_url: &str, endpoints: Endpoints) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            endpoints,
            client: reqwest::Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn get<T: serde::de::DeserializeOwned>(
        &self,
        url: String,
        query: Vec<(String, String)>,
    ) -> Result<T, ApiError> {
        log::debug!("GET {url} {query:?}");
        let response = self
            .client
            .get(&url)
            .query(&query)
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Http {
                status: status.as_u16(),
            });
        }
        response
            .json::<T>()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }
}

#[async_trait]
impl ResourceApi for HttpResourceApi {
    async fn search(&self, params: &SearchParams, page_size: u32) -> Result<SearchPage, ApiError> {
        let mut query: Vec<(String, String)> = params
            .iter()
            .flat_map(|(key, value)| {
                value
                    .values()
                    .into_iter()
                    .map(move |v| (key.clone(), v.to_string()))
            })
            .collect();
        query.push(("page_size".to_string(), page_size.to_string()));
        let response: ResourcesResponse =
            self.get(self.url(&self.endpoints.resources), query).await?;
        Ok(SearchPage {
            resources: response.resources,
            is_next_page_available: response.links.next.is_some(),
        })
    }

    async fn get_by_key(&self, pk: &ResourceKey) -> Result<Resource, ApiError> {
        let path = format!(
            "{}/{}",
            self.endpoints.resources.trim_end_matches('/'),
            urlencoding::encode(&pk.0)
        );
        match self.get::<ResourceResponse>(self.url(&path), Vec::new()).await {
            Ok(response) => Ok(response.resource),
            Err(ApiError::Http { status }) if status == StatusCode::NOT_FOUND.as_u16() => {
                Err(ApiError::NotFound(pk.clone()))
            }
            Err(e) => Err(e),
        }
    }

    async fn autocomplete(&self, text: &str) -> Result<Vec<String>, ApiError> {
        let response: AutocompleteResponse = self
            .get(
                self.url(&self.endpoints.autocomplete),
                vec![("q".to_string(), text.to_string())],
            )
            .await?;
        Ok(response.results.into_iter().map(|e| e.text).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::codec::{params, ParamValue};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn api(server: &MockServer) -> HttpResourceApi {
        HttpResourceApi::new(&server.uri(), Endpoints::default())
    }

    #[test]
    fn resource_keys_accept_numbers_and_strings() {
        let a: Resource = serde_json::from_value(json!({"pk": 42, "resource_type": "map"})).unwrap();
        let b: Resource = serde_json::from_value(json!({"pk": "42", "ctype": "map"})).unwrap();
        assert_eq!(a.pk, ResourceKey::from(42));
        assert_eq!(a.pk, b.pk);
        assert_eq!(a.kind(), Some("map"));
        assert_eq!(b.kind(), Some("map"));
    }

    #[test]
    fn resources_may_carry_both_type_fields() {
        let resource: Resource = serde_json::from_value(json!({
            "pk": 1,
            "ctype": "layer",
            "resource_type": "dataset",
            "title": "Rivers"
        }))
        .unwrap();
        assert_eq!(resource.kind(), Some("layer"));
        assert_eq!(resource.resource_type.as_deref(), Some("dataset"));
        assert!(resource.fields.is_empty());
    }

    #[tokio::test]
    async fn search_sends_params_and_page_size() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v2/resources"))
            .and(query_param("q", "roads"))
            .and(query_param("page", "2"))
            .and(query_param("page_size", "10"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "resources": [{"pk": 1, "title": "Roads", "resource_type": "dataset"}],
                "links": {"next": "http://example.com/?page=3", "previous": null},
                "total": 21
            })))
            .expect(1)
            .mount(&server)
            .await;

        let page = api(&server)
            .search(&params([("q", "roads"), ("page", "2")]), 10)
            .await
            .unwrap();
        assert!(page.is_next_page_available);
        assert_eq!(page.resources.len(), 1);
        assert_eq!(page.resources[0].title.as_deref(), Some("Roads"));
        assert_eq!(page.resources[0].fields.get("total"), None);
    }

    #[tokio::test]
    async fn search_sends_list_values_as_repeated_keys() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v2/resources"))
            .and(query_param("filter{resource_type.in}", "map"))
            .and(query_param("filter{resource_type.in}", "dataset"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "resources": [],
                "links": {"next": null}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let p = params([(
            "filter{resource_type.in}",
            ParamValue::from(vec!["map", "dataset"]),
        )]);
        let page = api(&server).search(&p, 10).await.unwrap();
        assert!(!page.is_next_page_available);
    }

    #[tokio::test]
    async fn server_errors_keep_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        let result = api(&server).search(&SearchParams::new(), 10).await;
        assert_eq!(result, Err(ApiError::Http { status: 500 }));
    }

    #[tokio::test]
    async fn missing_resource_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v2/resources/7"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        let result = api(&server).get_by_key(&ResourceKey::from(7)).await;
        assert_eq!(result, Err(ApiError::NotFound(ResourceKey::from(7))));
    }

    #[tokio::test]
    async fn resource_by_key_unwraps_envelope() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v2/resources/7"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "resource": {"pk": "7", "title": "Rivers", "resource_type": "dataset"}
            })))
            .mount(&server)
            .await;
        let resource = api(&server).get_by_key(&ResourceKey::from(7)).await.unwrap();
        assert_eq!(resource.title.as_deref(), Some("Rivers"));
    }

    #[tokio::test]
    async fn autocomplete_reads_result_texts() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/base/autocomplete_response/"))
            .and(query_param("q", "ro"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": [{"id": 1, "text": "roads"}, {"id": 2, "text": "rocks"}]
            })))
            .mount(&server)
            .await;
        let suggestions = api(&server).autocomplete("ro").await.unwrap();
        assert_eq!(suggestions, vec!["roads".to_string(), "rocks".to_string()]);
    }

    #[tokio::test]
    async fn unreachable_server_is_a_network_error() {
        let api = HttpResourceApi::new("http://127.0.0.1:1", Endpoints::default());
        let result = api.autocomplete("x").await;
        assert!(matches!(result, Err(ApiError::Network(_))));
    }
}
