use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::domain::error::ApiError;
use crate::domain::ports::Transport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }
}

/// A file attached to a multipart submission.
#[derive(Debug, Clone, PartialEq)]
pub struct FilePart {
    pub field: String,
    pub file_name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MultipartBody {
    pub fields: Vec<(String, String)>,
    pub files: Vec<FilePart>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Empty,
    Json(Value),
    Form(Vec<(String, String)>),
    Multipart(MultipartBody),
}

/// One backend call, independent of the HTTP library carrying it.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    /// Path relative to the API base URL, e.g. `apartment/12/`.
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Body,
}

impl ApiRequest {
    fn new(method: Method, path: impl Into<String>, body: Body) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path, Body::Empty)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::Delete, path, Body::Empty)
    }

    pub fn post_json(path: impl Into<String>, body: &impl Serialize) -> Result<Self, ApiError> {
        Ok(Self::new(Method::Post, path, Body::Json(to_value(body)?)))
    }

    pub fn patch_json(path: impl Into<String>, body: &impl Serialize) -> Result<Self, ApiError> {
        Ok(Self::new(Method::Patch, path, Body::Json(to_value(body)?)))
    }

    pub fn put_json(path: impl Into<String>, body: &impl Serialize) -> Result<Self, ApiError> {
        Ok(Self::new(Method::Put, path, Body::Json(to_value(body)?)))
    }

    pub fn post_form(path: impl Into<String>, fields: Vec<(String, String)>) -> Self {
        Self::new(Method::Post, path, Body::Form(fields))
    }

    pub fn post_multipart(path: impl Into<String>, body: MultipartBody) -> Self {
        Self::new(Method::Post, path, Body::Multipart(body))
    }

    pub fn patch_multipart(path: impl Into<String>, body: MultipartBody) -> Self {
        Self::new(Method::Patch, path, Body::Multipart(body))
    }

    pub fn with_query(mut self, query: Vec<(String, String)>) -> Self {
        self.query.extend(query);
        self
    }
}

fn to_value(body: &impl Serialize) -> Result<Value, ApiError> {
    serde_json::to_value(body).map_err(|e| ApiError::Decode(e.to_string()))
}

/// Send `request` and decode the JSON answer into `T`.
pub async fn call<T: DeserializeOwned>(
    transport: &dyn Transport,
    request: ApiRequest,
) -> Result<T, ApiError> {
    let value = transport.send(request).await?;
    serde_json::from_value(value).map_err(|e| ApiError::Decode(e.to_string()))
}

/// Path of a collection: `apartment/`.
pub fn collection_path(resource: &str) -> String {
    format!("{}/", resource.trim_matches('/'))
}

/// Path of one member: `apartment/12/`.
pub fn member_path(resource: &str, id: i64) -> String {
    format!("{}/{}/", resource.trim_matches('/'), id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn paths_are_normalised() {
        assert_eq!(collection_path("/apartment/"), "apartment/");
        assert_eq!(member_path("clients", 9), "clients/9/");
    }

    #[test]
    fn builders_set_method_and_body() {
        let req = ApiRequest::patch_json("land/1/", &json!({"price": 5}))
            .unwrap()
            .with_query(vec![("x".into(), "1".into())]);
        assert_eq!(req.method, Method::Patch);
        assert_eq!(req.body, Body::Json(json!({"price": 5})));
        assert_eq!(req.query.len(), 1);
    }
}
