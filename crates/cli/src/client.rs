//! API client for the ESRB prediction server

use anyhow::{Context, Result};
use esrb_lib::{GameInfo, HealthResponse, PredictionResult};
use reqwest::Client;
use serde::{de::DeserializeOwned, Serialize};
use url::Url;

/// Route of the server's minimal prediction endpoint
const PREDICT_PATH: &str = "esrb-predictor";

/// API client for the prediction server
pub struct ApiClient {
    client: Client,
    base_url: Url,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        let mut base_url = Url::parse(base_url).context("Invalid API URL")?;
        // Relative joins replace the last segment unless the path ends in '/'
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self { client, base_url })
    }

    /// Make a POST request with JSON body
    pub async fn post<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T> {
        let url = self.base_url.join(path).context("Invalid path")?;

        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .context("Failed to send request")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("API error ({}): {}", status, body);
        }

        response.json().await.context("Failed to parse response")
    }

    pub async fn predict(&self, game: &GameInfo) -> Result<PredictionResult> {
        self.post(PREDICT_PATH, game).await
    }

    /// Fetch `/healthz`. An unhealthy server answers 503 with the same body,
    /// so the body is parsed regardless of status.
    pub async fn health(&self) -> Result<HealthResponse> {
        let url = self.base_url.join("healthz").context("Invalid path")?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("Failed to send request")?;

        let status = response.status();
        let body = response.text().await.context("Failed to read response")?;
        serde_json::from_str(&body).with_context(|| format!("API error ({}): {}", status, body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use esrb_lib::ComponentStatus;

    #[tokio::test]
    async fn test_predict_posts_game_json() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/esrb-predictor")
            .match_body(mockito::Matcher::PartialJsonString(
                r#"{"title":"Kinda Sus","mildCartoonViolence":true}"#.to_string(),
            ))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"esrbRating":"E","score":[0.9,0.1],"labels":["E","T"]}"#)
            .create_async()
            .await;

        let client = ApiClient::new(&server.url()).unwrap();
        let game = GameInfo::new("Kinda Sus").with("mild_cartoon_violence");
        let result = client.predict(&game).await.unwrap();

        mock.assert_async().await;
        assert_eq!(result.esrb_rating, "E");
        assert_eq!(result.probability("T"), Some(0.1));
    }

    #[tokio::test]
    async fn test_predict_surfaces_server_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/esrb-predictor")
            .with_status(503)
            .with_body(r#"{"error":"You must train or load a model before predicting ESRB ratings"}"#)
            .create_async()
            .await;

        let client = ApiClient::new(&server.url()).unwrap();
        let err = client.predict(&GameInfo::new("x")).await.unwrap_err();
        let message = err.to_string();
        assert!(message.contains("503"));
        assert!(message.contains("You must train or load a model"));
    }

    #[tokio::test]
    async fn test_health_parses_unhealthy_body() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/healthz")
            .with_status(503)
            .with_body(
                r#"{"status":"unhealthy","components":{"model":{"status":"unhealthy","message":"missing","last_check_timestamp":0}}}"#,
            )
            .create_async()
            .await;

        let client = ApiClient::new(&server.url()).unwrap();
        let health = client.health().await.unwrap();
        assert_eq!(health.status, ComponentStatus::Unhealthy);
        assert_eq!(health.components["model"].message.as_deref(), Some("missing"));
    }

    #[tokio::test]
    async fn test_base_url_path_prefix_is_kept() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/esrb-predictor")
            .with_status(200)
            .with_body(r#"{"esrbRating":"M","score":[1.0],"labels":["M"]}"#)
            .create_async()
            .await;

        let client = ApiClient::new(&format!("{}/api", server.url())).unwrap();
        let result = client.predict(&GameInfo::new("x")).await.unwrap();

        mock.assert_async().await;
        assert_eq!(result.esrb_rating, "M");
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(ApiClient::new("not a url").is_err());
    }
}
