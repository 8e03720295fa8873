use async_trait::async_trait;
use reqwest::{header, multipart, StatusCode};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::domain::{
    error::{ApiError, Detail},
    ports::{TokenStore, Transport},
    request::{ApiRequest, Body, Method, MultipartBody},
};
use crate::infrastructure::config::ApiConfig;

/// reqwest-backed `Transport`: resolves paths against the API root, attaches
/// the stored bearer token and maps failures onto [`ApiError`].
pub struct HttpClient {
    http: reqwest::Client,
    api: ApiConfig,
    tokens: Arc<dyn TokenStore>,
}

impl HttpClient {
    pub fn new(cfg: &ApiConfig, tokens: Arc<dyn TokenStore>) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()
            .map_err(|e| ApiError::Network(e.to_string()))?;

        debug!(base_url = %cfg.base_url, timeout_secs = cfg.timeout_secs, "http client ready");
        Ok(Self {
            http,
            api: cfg.clone(),
            tokens,
        })
    }

    fn url(&self, path: &str) -> String {
        self.api.endpoint(path)
    }

    fn builder(&self, request: &ApiRequest) -> reqwest::RequestBuilder {
        let url = self.url(&request.path);
        let builder = match request.method {
            Method::Get => self.http.get(url),
            Method::Post => self.http.post(url),
            Method::Put => self.http.put(url),
            Method::Patch => self.http.patch(url),
            Method::Delete => self.http.delete(url),
        };
        let builder = if request.query.is_empty() {
            builder
        } else {
            builder.query(&request.query)
        };
        match self.tokens.load() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn check_status(&self, resp: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        match status {
            StatusCode::UNAUTHORIZED => {
                if let Err(e) = self.tokens.clear() {
                    warn!(error = %e, "could not clear rejected token");
                }
                let body = error_body(resp).await;
                let detail = match Detail::from_body(&body, "") {
                    Detail::Message(m) if !m.is_empty() => Some(m),
                    _ => None,
                };
                Err(ApiError::Unauthorized { detail })
            }
            StatusCode::FORBIDDEN => Err(ApiError::PermissionDenied),
            _ => {
                let body = error_body(resp).await;
                let fallback = status
                    .canonical_reason()
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));
                Err(ApiError::Backend {
                    status: status.as_u16(),
                    detail: Detail::from_body(&body, &fallback),
                })
            }
        }
    }
}

/// JSON body of a failed response, or `Null` when it has none.
async fn error_body(resp: reqwest::Response) -> Value {
    let text = resp.text().await.unwrap_or_default();
    serde_json::from_str::<Value>(&text).unwrap_or(Value::Null)
}

fn multipart_form(body: MultipartBody) -> Result<multipart::Form, ApiError> {
    let mut form = multipart::Form::new();
    for (name, value) in body.fields {
        form = form.text(name, value);
    }
    for file in body.files {
        let part = multipart::Part::bytes(file.bytes)
            .file_name(file.file_name)
            .mime_str(&file.mime)
            .map_err(|e| ApiError::Decode(format!("bad mime type: {e}")))?;
        form = form.part(file.field, part);
    }
    Ok(form)
}

#[async_trait]
impl Transport for HttpClient {
    async fn send(&self, request: ApiRequest) -> Result<Value, ApiError> {
        let builder = self.builder(&request);
        let builder = match request.body {
            Body::Empty => builder,
            Body::Json(value) => builder.json(&value),
            Body::Form(fields) => builder.form(&fields),
            Body::Multipart(body) => builder.multipart(multipart_form(body)?),
        };

        let resp = builder
            .header(header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;
        let resp = self.check_status(resp).await?;

        if resp.status() == StatusCode::NO_CONTENT {
            return Ok(Value::Null);
        }
        let bytes = resp
            .bytes()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Null);
        }
        serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode(e.to_string()))
    }
}
