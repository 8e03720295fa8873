use chrono::NaiveDate;
use serde::Serialize;
use validator::Validate;

use super::{validate_action_type, validate_status, Form, OPTIONAL_PHONE_RE};
use crate::domain::error::FieldErrors;

const STATUS_FREE: &str = "free";

/// `status_date` is required unless the property is free.
fn status_date_rule(status: &str, status_date: Option<NaiveDate>, errors: &mut FieldErrors) {
    if status != STATUS_FREE && status_date.is_none() {
        errors.add("status_date", "Укажите дату статуса");
    }
}

#[derive(Debug, Clone, Default, Serialize, Validate)]
pub struct ApartmentForm {
    #[validate(length(min = 1, max = 200, message = "Название от 1 до 200 символов"))]
    pub title: String,
    #[validate(required(message = "Выберите район"))]
    pub district: Option<i64>,
    pub metro: Option<i64>,
    #[validate(length(max = 255, message = "Адрес не длиннее 255 символов"))]
    pub address: Option<String>,
    #[validate(range(min = 1, max = 20, message = "Комнат от 1 до 20"))]
    pub rooms: u32,
    #[validate(range(min = -2, max = 100, message = "Недопустимый этаж"))]
    pub floor: i32,
    #[validate(range(min = 1, max = 100, message = "Этажность от 1 до 100"))]
    pub total_floor: i32,
    #[validate(range(exclusive_min = 0.0, message = "Площадь должна быть больше 0"))]
    pub area: f64,
    #[validate(range(exclusive_min = 0.0, message = "Цена должна быть больше 0"))]
    pub price: f64,
    #[validate(custom(function = "validate_action_type"))]
    pub action_type: String,
    #[validate(custom(function = "validate_status"))]
    pub status: String,
    pub status_date: Option<NaiveDate>,
    pub furnished: bool,
    pub parking_place: bool,
    #[validate(required(message = "Выберите ответственного"))]
    pub responsible: Option<i64>,
    #[validate(range(min = 0.0, max = 100.0, message = "Процент от 0 до 100"))]
    pub agent_percent: Option<f64>,
    #[validate(range(min = 0.0, message = "Комиссия не может быть отрицательной"))]
    pub agent_commission: Option<f64>,
    #[validate(length(max = 100, message = "Имя не длиннее 100 символов"))]
    pub owner_name: Option<String>,
    #[validate(regex(path = *OPTIONAL_PHONE_RE, message = "Телефон в формате +998XXXXXXXXX"))]
    pub owner_phone: String,
    #[validate(length(max = 2000, message = "Описание не длиннее 2000 символов"))]
    pub description: Option<String>,
}

impl Form for ApartmentForm {
    fn cross_field(&self, errors: &mut FieldErrors) {
        status_date_rule(&self.status, self.status_date, errors);
        if self.floor > self.total_floor {
            errors.add("floor", "Этаж не может быть выше этажности дома");
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Validate)]
pub struct LandForm {
    #[validate(length(min = 1, max = 200, message = "Название от 1 до 200 символов"))]
    pub title: String,
    #[validate(required(message = "Выберите район"))]
    pub district: Option<i64>,
    #[validate(length(max = 255, message = "Адрес не длиннее 255 символов"))]
    pub address: Option<String>,
    /// In sotkas.
    #[validate(range(exclusive_min = 0.0, message = "Площадь должна быть больше 0"))]
    pub area: f64,
    #[validate(range(exclusive_min = 0.0, message = "Цена должна быть больше 0"))]
    pub price: f64,
    #[validate(custom(function = "validate_action_type"))]
    pub action_type: String,
    #[validate(custom(function = "validate_status"))]
    pub status: String,
    pub status_date: Option<NaiveDate>,
    #[validate(required(message = "Выберите ответственного"))]
    pub responsible: Option<i64>,
    #[validate(range(min = 0.0, max = 100.0, message = "Процент от 0 до 100"))]
    pub agent_percent: Option<f64>,
    #[validate(range(min = 0.0, message = "Комиссия не может быть отрицательной"))]
    pub agent_commission: Option<f64>,
    #[validate(regex(path = *OPTIONAL_PHONE_RE, message = "Телефон в формате +998XXXXXXXXX"))]
    pub owner_phone: String,
    #[validate(length(max = 2000, message = "Описание не длиннее 2000 символов"))]
    pub description: Option<String>,
}

impl Form for LandForm {
    fn cross_field(&self, errors: &mut FieldErrors) {
        status_date_rule(&self.status, self.status_date, errors);
    }
}

#[derive(Debug, Clone, Default, Serialize, Validate)]
pub struct CommercialForm {
    #[validate(length(min = 1, max = 200, message = "Название от 1 до 200 символов"))]
    pub title: String,
    #[validate(required(message = "Выберите район"))]
    pub district: Option<i64>,
    pub metro: Option<i64>,
    #[validate(length(max = 255, message = "Адрес не длиннее 255 символов"))]
    pub address: Option<String>,
    #[validate(range(min = -2, max = 100, message = "Недопустимый этаж"))]
    pub floor: Option<i32>,
    #[validate(range(exclusive_min = 0.0, message = "Площадь должна быть больше 0"))]
    pub area: f64,
    #[validate(range(exclusive_min = 0.0, message = "Цена должна быть больше 0"))]
    pub price: f64,
    #[validate(custom(function = "validate_action_type"))]
    pub action_type: String,
    #[validate(custom(function = "validate_status"))]
    pub status: String,
    pub status_date: Option<NaiveDate>,
    pub parking_place: bool,
    #[validate(required(message = "Выберите ответственного"))]
    pub responsible: Option<i64>,
    #[validate(range(min = 0.0, max = 100.0, message = "Процент от 0 до 100"))]
    pub agent_percent: Option<f64>,
    #[validate(range(min = 0.0, message = "Комиссия не может быть отрицательной"))]
    pub agent_commission: Option<f64>,
    #[validate(regex(path = *OPTIONAL_PHONE_RE, message = "Телефон в формате +998XXXXXXXXX"))]
    pub owner_phone: String,
    #[validate(length(max = 2000, message = "Описание не длиннее 2000 символов"))]
    pub description: Option<String>,
}

impl Form for CommercialForm {
    fn cross_field(&self, errors: &mut FieldErrors) {
        status_date_rule(&self.status, self.status_date, errors);
    }
}
