use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use tracing::debug;

use super::{GeneratedImage, ImageModel, ProviderError, truncate_body};

const PROVIDER: &str = "huggingface";

/// MIME type assumed when the provider does not name an image type.
const DEFAULT_MIME: &str = "image/png";

/// Client for a Hugging Face text-to-image inference endpoint.
///
/// The endpoint takes `{"inputs": "<prompt>"}` and answers with the raw
/// image bytes.
#[derive(Debug, Clone)]
pub struct HuggingFaceClient {
    http: reqwest::Client,
    api_key: String,
    model_url: String,
}

impl HuggingFaceClient {
    pub const DEFAULT_MODEL_URL: &str =
        "https://router.huggingface.co/hf-inference/models/black-forest-labs/FLUX.1-dev";

    pub fn new(
        http: reqwest::Client,
        api_key: impl Into<String>,
        model_url: impl Into<String>,
    ) -> Self {
        Self {
            http,
            api_key: api_key.into(),
            model_url: model_url.into(),
        }
    }
}

/// Pick the MIME type from a `Content-Type` header value.
fn image_mime(content_type: Option<&str>) -> String {
    content_type
        .and_then(|v| v.split(';').next())
        .map(str::trim)
        .filter(|v| v.starts_with("image/"))
        .unwrap_or(DEFAULT_MIME)
        .to_owned()
}

#[async_trait]
impl ImageModel for HuggingFaceClient {
    fn name(&self) -> &str {
        &self.model_url
    }

    async fn generate_image(&self, prompt: &str) -> Result<GeneratedImage, ProviderError> {
        debug!(model = %self.model_url, "calling image model");
        let response = self
            .http
            .post(&self.model_url)
            .bearer_auth(&self.api_key)
            .json(&serde_json::json!({ "inputs": prompt }))
            .send()
            .await
            .map_err(|source| ProviderError::Transport {
                provider: PROVIDER,
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Status {
                provider: PROVIDER,
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        let mime = image_mime(
            response
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|v| v.to_str().ok()),
        );
        let bytes = response
            .bytes()
            .await
            .map_err(|source| ProviderError::Transport {
                provider: PROVIDER,
                source,
            })?;
        if bytes.is_empty() {
            return Err(ProviderError::EmptyResponse { provider: PROVIDER });
        }

        Ok(GeneratedImage {
            mime,
            bytes: bytes.to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use axum::Router;
    use axum::http::{HeaderMap, StatusCode, header};
    use axum::response::{IntoResponse, Response};
    use axum::routing::post;
    use serde_json::Value;

    use super::*;
    use crate::provider::stub;

    fn client(base_url: &str) -> HuggingFaceClient {
        HuggingFaceClient::new(reqwest::Client::new(), "hf-token", format!("{base_url}/model"))
    }

    #[test]
    fn image_mime_uses_image_content_type() {
        assert_eq!(image_mime(Some("image/jpeg")), "image/jpeg");
        assert_eq!(image_mime(Some("image/webp; charset=binary")), "image/webp");
    }

    #[test]
    fn image_mime_defaults_to_png() {
        assert_eq!(image_mime(None), "image/png");
        assert_eq!(image_mime(Some("application/octet-stream")), "image/png");
    }

    #[tokio::test]
    async fn generate_image_sends_bearer_and_reads_mime() {
        async fn jpeg(headers: HeaderMap, axum::Json(body): axum::Json<Value>) -> Response {
            let authorized = headers
                .get(header::AUTHORIZATION)
                .is_some_and(|v| v == "Bearer hf-token");
            if !authorized || body["inputs"] != "a fox logo" {
                return StatusCode::BAD_REQUEST.into_response();
            }
            ([(header::CONTENT_TYPE, "image/jpeg")], vec![0xffu8, 0xd8, 0xff]).into_response()
        }

        let base = stub::serve(Router::new().route("/model", post(jpeg))).await;
        let image = client(&base).generate_image("a fox logo").await.unwrap();
        assert_eq!(image.mime, "image/jpeg");
        assert_eq!(image.bytes, vec![0xff, 0xd8, 0xff]);
    }

    #[tokio::test]
    async fn untyped_bytes_default_to_png() {
        let app = Router::new().route(
            "/model",
            post(|| async { ([(header::CONTENT_TYPE, "application/octet-stream")], vec![1u8, 2, 3]) }),
        );
        let base = stub::serve(app).await;

        let image = client(&base).generate_image("logo").await.unwrap();
        assert_eq!(image.mime, "image/png");
    }

    #[tokio::test]
    async fn loading_model_is_a_status_error() {
        let app = Router::new().route(
            "/model",
            post(|| async {
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    r#"{"error":"Model is currently loading"}"#,
                )
            }),
        );
        let base = stub::serve(app).await;

        let err = client(&base).generate_image("logo").await.unwrap_err();
        assert!(
            matches!(err, ProviderError::Status { status: 503, ref body, .. } if body.contains("loading")),
            "{err:?}"
        );
    }

    #[tokio::test]
    async fn empty_success_body_is_rejected() {
        let app = Router::new().route("/model", post(|| async { StatusCode::OK }));
        let base = stub::serve(app).await;

        let err = client(&base).generate_image("logo").await.unwrap_err();
        assert!(matches!(err, ProviderError::EmptyResponse { provider: "huggingface" }));
    }
}
