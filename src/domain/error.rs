use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

pub const PERMISSION_DENIED_MESSAGE: &str = "У вас нет прав для выполнения этого действия";
pub const NETWORK_ERROR_MESSAGE: &str = "Ошибка сети. Проверьте подключение";
pub const LOGIN_PATH: &str = "/login";

/// Known English backend phrases and their display text.
const TRANSLATIONS: &[(&str, &str)] = &[
    ("Invalid credentials", "Неверный телефон или пароль"),
    (
        "No active account found with the given credentials",
        "Неверный телефон или пароль",
    ),
    ("Not found.", "Не найдено"),
    (
        "Authentication credentials were not provided.",
        "Требуется авторизация",
    ),
    (
        "You do not have permission to perform this action.",
        PERMISSION_DENIED_MESSAGE,
    ),
    ("This field is required.", "Это поле обязательно"),
    ("This field may not be blank.", "Это поле не может быть пустым"),
    ("This field may not be null.", "Это поле не может быть пустым"),
    ("A valid integer is required.", "Введите целое число"),
    ("A valid number is required.", "Введите число"),
    (
        "A user with that phone already exists.",
        "Пользователь с таким телефоном уже существует",
    ),
];

pub const SESSION_EXPIRED_MESSAGE: &str = "Сессия истекла. Войдите снова";

/// Display text of a known backend phrase.
pub fn translation(message: &str) -> Option<&'static str> {
    let trimmed = message.trim();
    TRANSLATIONS
        .iter()
        .find(|(en, _)| *en == trimmed)
        .map(|(_, ru)| *ru)
}

/// Translate a backend phrase when it is one we know; otherwise return it as is.
pub fn translate(message: &str) -> String {
    translation(message)
        .map(str::to_string)
        .unwrap_or_else(|| message.trim().to_string())
}

/// Per-field validation messages, keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldErrors(pub BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(|v| v.as_slice())
    }

    pub fn merge(&mut self, other: FieldErrors) {
        for (field, messages) in other.0 {
            self.0.entry(field).or_default().extend(messages);
        }
    }

    /// First message of the first field, for toast-style display.
    pub fn first_message(&self) -> Option<String> {
        self.0
            .iter()
            .next()
            .and_then(|(field, msgs)| msgs.first().map(|m| format!("{field}: {m}")))
    }
}

impl std::fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|(field, msgs)| format!("{}: {}", field, msgs.join(", ")))
            .collect();
        f.write_str(&parts.join("; "))
    }
}

impl From<validator::ValidationErrors> for FieldErrors {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut out = FieldErrors::new();
        for (field, errs) in errors.field_errors() {
            for e in errs.iter() {
                let msg = e
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| e.code.to_string());
                out.add(field.to_string(), msg);
            }
        }
        out
    }
}

/// The `detail` payload of a failed backend call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Detail {
    Message(String),
    Fields(FieldErrors),
}

impl Detail {
    /// Extract the detail from an error body.
    ///
    /// Accepts `{"detail": "..."}`, `{"detail": {field: msg|[msgs]}}`, a
    /// top-level `{field: [msgs]}` map, or a bare string. Anything else falls
    /// back to `fallback`.
    pub fn from_body(body: &Value, fallback: &str) -> Detail {
        match body.get("detail") {
            Some(Value::String(s)) => Detail::Message(s.clone()),
            Some(Value::Object(_)) => field_map(&body["detail"])
                .map(Detail::Fields)
                .unwrap_or_else(|| Detail::Message(fallback.to_string())),
            Some(Value::Array(items)) => Detail::Message(join_messages(items)),
            _ => match body {
                Value::String(s) if !s.is_empty() => Detail::Message(s.clone()),
                Value::Object(_) => field_map(body)
                    .map(Detail::Fields)
                    .unwrap_or_else(|| Detail::Message(fallback.to_string())),
                _ => Detail::Message(fallback.to_string()),
            },
        }
    }
}

fn field_map(value: &Value) -> Option<FieldErrors> {
    let map = value.as_object()?;
    let mut out = FieldErrors::new();
    for (field, msgs) in map {
        match msgs {
            Value::String(s) => out.add(field.clone(), translate(s)),
            Value::Array(items) => {
                for item in items {
                    if let Some(s) = item.as_str() {
                        out.add(field.clone(), translate(s));
                    }
                }
            }
            _ => {}
        }
    }
    (!out.is_empty()).then_some(out)
}

fn join_messages(items: &[Value]) -> String {
    items
        .iter()
        .filter_map(|v| v.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Every failure a backend interaction can end in. None of them is retried.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    #[error("validation failed: {0}")]
    Validation(FieldErrors),
    #[error("network error: {0}")]
    Network(String),
    #[error("backend returned {status}: {detail:?}")]
    Backend { status: u16, detail: Detail },
    /// 401. `detail` is the backend's reason, when it sent one.
    #[error("unauthorized: {}", .detail.as_deref().unwrap_or("login required"))]
    Unauthorized { detail: Option<String> },
    #[error("permission denied")]
    PermissionDenied,
    #[error("invalid response body: {0}")]
    Decode(String),
}

impl ApiError {
    /// Where the caller must send the operator after this error, if anywhere.
    pub fn login_redirect(&self) -> Option<&'static str> {
        matches!(self, ApiError::Unauthorized { .. }).then_some(LOGIN_PATH)
    }

    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            ApiError::Validation(fields) => Some(fields),
            ApiError::Backend {
                detail: Detail::Fields(fields),
                ..
            } => Some(fields),
            _ => None,
        }
    }

    /// Text shown to the operator.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Validation(fields) => fields
                .first_message()
                .unwrap_or_else(|| "Проверьте заполнение формы".to_string()),
            ApiError::Network(_) => NETWORK_ERROR_MESSAGE.to_string(),
            ApiError::Backend {
                detail: Detail::Message(m),
                ..
            } => translate(m),
            ApiError::Backend {
                detail: Detail::Fields(fields),
                ..
            } => fields
                .first_message()
                .unwrap_or_else(|| "Ошибка запроса".to_string()),
            ApiError::Unauthorized { detail } => detail
                .as_deref()
                .and_then(translation)
                .unwrap_or(SESSION_EXPIRED_MESSAGE)
                .to_string(),
            ApiError::PermissionDenied => PERMISSION_DENIED_MESSAGE.to_string(),
            ApiError::Decode(m) => m.clone(),
        }
    }
}

impl From<FieldErrors> for ApiError {
    fn from(fields: FieldErrors) -> Self {
        ApiError::Validation(fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn string_detail_is_translated_for_display() {
        let detail = Detail::from_body(&json!({"detail": "Not found."}), "404");
        let err = ApiError::Backend { status: 404, detail };
        assert_eq!(err.user_message(), "Не найдено");
    }

    #[test]
    fn unknown_phrase_passes_through() {
        assert_eq!(translate("  Something else  "), "Something else");
    }

    #[test]
    fn detail_field_map_becomes_field_errors() {
        let detail = Detail::from_body(
            &json!({"detail": {"phone": ["A user with that phone already exists."]}}),
            "400",
        );
        match detail {
            Detail::Fields(f) => assert_eq!(
                f.get("phone").unwrap(),
                &["Пользователь с таким телефоном уже существует".to_string()]
            ),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn top_level_field_map_without_detail() {
        let detail = Detail::from_body(&json!({"price": "This field is required."}), "400");
        let err = ApiError::Backend { status: 400, detail };
        assert_eq!(
            err.field_errors().unwrap().get("price").unwrap()[0],
            "Это поле обязательно"
        );
    }

    #[test]
    fn non_json_body_uses_fallback() {
        let detail = Detail::from_body(&Value::Null, "Bad Gateway");
        assert_eq!(detail, Detail::Message("Bad Gateway".into()));
    }

    #[test]
    fn unauthorized_redirects_to_login() {
        let expired = ApiError::Unauthorized { detail: None };
        assert_eq!(expired.login_redirect(), Some("/login"));
        assert_eq!(expired.user_message(), SESSION_EXPIRED_MESSAGE);
        assert_eq!(ApiError::PermissionDenied.login_redirect(), None);
        assert_eq!(
            ApiError::PermissionDenied.user_message(),
            PERMISSION_DENIED_MESSAGE
        );
    }

    #[test]
    fn unauthorized_shows_known_reason() {
        let wrong_password = ApiError::Unauthorized {
            detail: Some("No active account found with the given credentials".into()),
        };
        assert_eq!(wrong_password.user_message(), "Неверный телефон или пароль");

        let bad_token = ApiError::Unauthorized {
            detail: Some("Given token not valid for any token type".into()),
        };
        assert_eq!(bad_token.user_message(), SESSION_EXPIRED_MESSAGE);
    }

    #[test]
    fn field_errors_merge_and_display() {
        let mut a = FieldErrors::new();
        a.add("price", "must be positive");
        let mut b = FieldErrors::new();
        b.add("price", "required");
        b.add("title", "too long");
        a.merge(b);
        assert_eq!(a.get("price").unwrap().len(), 2);
        assert_eq!(a.to_string(), "price: must be positive, required; title: too long");
    }
}
