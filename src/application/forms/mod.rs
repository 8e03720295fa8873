//! Validated input for every entity the back office edits.
//!
//! Field rules come from `validator` derives. Rules that look at more than one
//! field run afterwards through [`Form::cross_field`] and report against a
//! single named field, so the caller can show every message inline.

use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use std::sync::LazyLock;
use validator::{Validate, ValidationError};

use crate::application::format::number_string;
use crate::application::media::MediaEdit;
use crate::domain::entities::{ActionType, PropertyStatus};
use crate::domain::error::{ApiError, FieldErrors};
use crate::domain::request::MultipartBody;

pub mod deal;
pub mod people;
pub mod property;
pub mod reference;

pub use deal::{DealForm, ViewForm};
pub use people::{ClientForm, LoginForm, UserForm};
pub use property::{ApartmentForm, CommercialForm, LandForm};
pub use reference::{DistrictForm, MetroForm};

/// What a form turns into once it passes validation.
#[derive(Debug, Clone, PartialEq)]
pub enum Submission {
    Json(Value),
    Multipart(MultipartBody),
}

pub trait Form: Validate + Serialize {
    /// Rules spanning several fields. Runs after the field rules.
    fn cross_field(&self, _errors: &mut FieldErrors) {}

    /// Run all rules and collect every message.
    fn check(&self) -> Result<(), FieldErrors> {
        let mut errors = match self.validate() {
            Ok(()) => FieldErrors::new(),
            Err(e) => FieldErrors::from(e),
        };
        self.cross_field(&mut errors);
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Validate and build the request body: JSON, or multipart when files are
    /// attached.
    fn submission(&self, media: Option<&MediaEdit>) -> Result<Submission, ApiError> {
        self.check()?;
        let value = serde_json::to_value(self).map_err(|e| ApiError::Decode(e.to_string()))?;
        match media.filter(|m| m.has_uploads()) {
            None => Ok(Submission::Json(value)),
            Some(m) => Ok(Submission::Multipart(MultipartBody {
                fields: multipart_fields(&value),
                files: m.file_parts(),
            })),
        }
    }
}

/// Flatten a JSON object into text form fields. Nulls are left out.
pub fn multipart_fields(value: &Value) -> Vec<(String, String)> {
    let Some(map) = value.as_object() else {
        return Vec::new();
    };
    map.iter()
        .filter_map(|(k, v)| {
            let text = match v {
                Value::Null => return None,
                Value::String(s) => s.clone(),
                Value::Bool(b) => b.to_string(),
                Value::Number(n) => n
                    .as_i64()
                    .map(|i| i.to_string())
                    .or_else(|| n.as_f64().map(number_string))
                    .unwrap_or_else(|| n.to_string()),
                other => other.to_string(),
            };
            Some((k.clone(), text))
        })
        .collect()
}

// ─── Shared field rules ──────────────────────────────────────────────────────

/// `+998` followed by nine digits. Surrounding blanks are tolerated, the
/// login form trims before sending.
pub(crate) static PHONE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*\+998\d{9}\s*$").expect("Invalid phone regex")
});

/// Same as [`PHONE_RE`] but an empty value passes.
pub(crate) static OPTIONAL_PHONE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(\+998\d{9})?\s*$").expect("Invalid phone regex")
});

pub(crate) fn validate_action_type(value: &str) -> Result<(), ValidationError> {
    one_of(value, ActionType::ALL, "Выберите тип: аренда или продажа")
}

pub(crate) fn validate_status(value: &str) -> Result<(), ValidationError> {
    one_of(value, PropertyStatus::ALL, "Недопустимый статус")
}

pub(crate) fn validate_object_type(value: &str) -> Result<(), ValidationError> {
    one_of(
        value,
        &["apartment", "land", "commercial"],
        "Выберите тип объекта",
    )
}

fn one_of(value: &str, allowed: &[&str], message: &'static str) -> Result<(), ValidationError> {
    if allowed.contains(&value) {
        Ok(())
    } else {
        Err(ValidationError::new("one_of").with_message(message.into()))
    }
}
