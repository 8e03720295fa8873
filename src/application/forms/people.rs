use serde::Serialize;
use validator::Validate;

use super::{validate_action_type, Form, PHONE_RE};

#[derive(Debug, Clone, Default, Serialize, Validate)]
pub struct ClientForm {
    #[validate(length(min = 2, max = 100, message = "Имя от 2 до 100 символов"))]
    pub full_name: String,
    #[validate(regex(path = *PHONE_RE, message = "Телефон в формате +998XXXXXXXXX"))]
    pub phone: String,
    #[validate(custom(function = "validate_action_type"))]
    pub action_type: String,
    #[validate(range(exclusive_min = 0.0, message = "Бюджет должен быть больше 0"))]
    pub budget: Option<f64>,
    pub district: Option<i64>,
    #[validate(range(min = 1, max = 20, message = "Комнат от 1 до 20"))]
    pub rooms: Option<u32>,
    #[validate(required(message = "Выберите ответственного"))]
    pub responsible: Option<i64>,
    #[validate(length(max = 1000, message = "Комментарий не длиннее 1000 символов"))]
    pub comment: Option<String>,
}

impl Form for ClientForm {}

/// Staff account. `password` is only sent when set.
#[derive(Debug, Clone, Default, Serialize, Validate)]
pub struct UserForm {
    #[validate(regex(path = *PHONE_RE, message = "Телефон в формате +998XXXXXXXXX"))]
    pub phone: String,
    #[validate(length(min = 2, max = 100, message = "Имя от 2 до 100 символов"))]
    pub full_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 8, max = 128, message = "Пароль от 8 до 128 символов"))]
    pub password: Option<String>,
    pub is_superuser: bool,
    pub is_active: bool,
}

impl Form for UserForm {}

/// Credentials for the login endpoint (sent form-encoded).
#[derive(Debug, Clone, Default, Serialize, Validate)]
pub struct LoginForm {
    #[validate(regex(path = *PHONE_RE, message = "Телефон в формате +998XXXXXXXXX"))]
    pub phone: String,
    #[validate(length(min = 1, message = "Введите пароль"))]
    pub password: String,
}

impl Form for LoginForm {}

impl LoginForm {
    pub fn fields(&self) -> Vec<(String, String)> {
        vec![
            ("phone".to_string(), self.phone.trim().to_string()),
            ("password".to_string(), self.password.clone()),
        ]
    }
}
