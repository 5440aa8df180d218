//! Shopping search tool backed by the `SerpAPI` Google Shopping engine

use super::{Tool, ToolFailure};
use crate::config::SearchConfig;
use crate::llm::ToolPayload;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;

/// Number of products handed back to the engine
const MAX_RESULTS: usize = 3;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Fashion product search
pub struct ShoppingSearchTool {
    client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct SearchInput {
    #[serde(default)]
    query: Option<String>,
}

/// One product as shown to the engine and the user
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Product {
    pub title: Option<String>,
    pub price: Option<String>,
    pub link: Option<String>,
    pub source: Option<String>,
    pub thumbnail: Option<String>,
}

impl ShoppingSearchTool {
    pub fn new(config: &SearchConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: config.api_key.clone(),
            base_url: config.base_url.clone(),
        }
    }

    async fn fetch(&self, api_key: &str, query: &str) -> Result<Value, ToolFailure> {
        let response = self
            .client
            .get(&self.base_url)
            .timeout(REQUEST_TIMEOUT)
            .query(&[
                ("engine", "google_shopping"),
                ("q", query),
                ("api_key", api_key),
                ("gl", "us"),
                ("hl", "en"),
                ("google_domain", "google.com"),
                ("device", "desktop"),
                ("direct_link", "true"),
            ])
            .send()
            .await
            .map_err(|e| ToolFailure::Upstream(format!("search request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ToolFailure::Upstream(format!("HTTP {status}: {body}")));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| ToolFailure::Upstream(format!("invalid search response: {e}")))
    }
}

/// Pick the first few shopping results, keeping the engine's order.
pub fn top_results(body: &Value) -> Vec<Product> {
    let Some(items) = body.get("shopping_results").and_then(Value::as_array) else {
        return Vec::new();
    };

    items
        .iter()
        .take(MAX_RESULTS)
        .map(|item| {
            let field = |key: &str| {
                item.get(key)
                    .and_then(Value::as_str)
                    .filter(|v| !v.is_empty())
                    .map(str::to_string)
            };
            Product {
                title: field("title"),
                price: field("price"),
                link: field("link").or_else(|| field("product_link")),
                source: field("source"),
                thumbnail: field("thumbnail"),
            }
        })
        .collect()
}

fn results_payload(products: &[Product]) -> ToolPayload {
    let mut payload = ToolPayload::new();
    payload.insert("results".to_string(), json!(products));
    payload
}

#[async_trait]
impl Tool for ShoppingSearchTool {
    fn name(&self) -> &'static str {
        "search_tool"
    }

    fn description(&self) -> String {
        "Fashion product search".to_string()
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {"type": "string"}
            },
            "required": ["query"]
        })
    }

    async fn run(&self, input: Value) -> Result<ToolPayload, ToolFailure> {
        let input: SearchInput = serde_json::from_value(input)
            .map_err(|e| ToolFailure::InvalidInput(e.to_string()))?;

        let query = match input.query.as_deref() {
            None | Some("") => return Ok(results_payload(&[])),
            Some(query) => query,
        };

        let api_key = self
            .api_key
            .as_deref()
            .ok_or(ToolFailure::MissingCredential("SERPAPI_API_KEY"))?;

        let body = self.fetch(api_key, query).await?;
        let products = top_results(&body);
        tracing::info!(query = %query, results = products.len(), "Shopping search completed");

        Ok(results_payload(&products))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tool(api_key: Option<&str>) -> ShoppingSearchTool {
        ShoppingSearchTool::new(&SearchConfig {
            api_key: api_key.map(str::to_string),
            // Nothing listens here; any network attempt fails fast
            base_url: "http://127.0.0.1:9/search.json".to_string(),
        })
    }

    fn item(n: usize) -> Value {
        json!({
            "title": format!("Dress {n}"),
            "price": format!("${n}9.99"),
            "link": format!("https://shop.example/{n}"),
            "source": "Example Shop",
            "thumbnail": format!("https://img.example/{n}.jpg")
        })
    }

    #[tokio::test]
    async fn test_empty_query_skips_api() {
        // A configured key plus an unreachable endpoint proves no request is made
        let payload = tool(Some("key")).run(json!({"query": ""})).await.unwrap();
        assert_eq!(Value::Object(payload), json!({"results": []}));
    }

    #[tokio::test]
    async fn test_empty_query_wins_over_missing_key() {
        let payload = tool(None).run(json!({})).await.unwrap();
        assert_eq!(payload["results"], json!([]));
    }

    #[tokio::test]
    async fn test_null_query_counts_as_empty() {
        let payload = tool(None).run(json!({"query": null})).await.unwrap();
        assert_eq!(Value::Object(payload), json!({"results": []}));
    }

    #[tokio::test]
    async fn test_missing_key() {
        let err = tool(None)
            .run(json!({"query": "white sneakers"}))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolFailure::MissingCredential(_)));
    }

    #[tokio::test]
    async fn test_invalid_input() {
        let err = tool(Some("key")).run(json!("sneakers")).await.unwrap_err();
        assert!(matches!(err, ToolFailure::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_unreachable_upstream() {
        let err = tool(Some("key"))
            .run(json!({"query": "white sneakers"}))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolFailure::Upstream(_)));
    }

    #[test]
    fn test_truncates_to_three_in_order() {
        let body = json!({"shopping_results": (1..=5).map(item).collect::<Vec<_>>()});
        let products = top_results(&body);

        assert_eq!(products.len(), 3);
        let titles: Vec<_> = products.iter().filter_map(|p| p.title.as_deref()).collect();
        assert_eq!(titles, vec!["Dress 1", "Dress 2", "Dress 3"]);
    }

    #[test]
    fn test_link_falls_back_to_product_link() {
        let body = json!({"shopping_results": [{
            "title": "Clutch",
            "product_link": "https://google.example/p/1"
        }]});
        let products = top_results(&body);

        assert_eq!(products[0].link.as_deref(), Some("https://google.example/p/1"));
        assert_eq!(products[0].price, None);
    }

    #[test]
    fn test_empty_link_falls_back_to_product_link() {
        let body = json!({"shopping_results": [{
            "title": "Tote",
            "link": "",
            "product_link": "https://google.example/p/2"
        }]});
        let products = top_results(&body);

        assert_eq!(products[0].link.as_deref(), Some("https://google.example/p/2"));
    }

    #[test]
    fn test_no_shopping_results() {
        assert!(top_results(&json!({"error": "no results"})).is_empty());
    }

    #[test]
    fn test_payload_shape() {
        let products = top_results(&json!({"shopping_results": [item(1)]}));
        let payload = Value::Object(results_payload(&products));
        assert_eq!(payload["results"][0]["source"], "Example Shop");
        assert_eq!(payload["results"][0]["thumbnail"], "https://img.example/1.jpg");
    }
}
