use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use validator::Validate;

use super::{validate_action_type, validate_object_type, Form};
use crate::domain::error::FieldErrors;

#[derive(Debug, Clone, Default, Serialize, Validate)]
pub struct DealForm {
    #[validate(required(message = "Выберите клиента"))]
    pub client: Option<i64>,
    #[validate(custom(function = "validate_object_type"))]
    pub object_type: String,
    #[validate(required(message = "Выберите объект"))]
    pub object_id: Option<i64>,
    #[validate(custom(function = "validate_action_type"))]
    pub action_type: String,
    #[validate(range(exclusive_min = 0.0, message = "Цена должна быть больше 0"))]
    pub price: f64,
    #[validate(required(message = "Выберите ответственного"))]
    pub responsible: Option<i64>,
    #[validate(range(min = 0.0, max = 100.0, message = "Процент от 0 до 100"))]
    pub agent_percent: Option<f64>,
    #[validate(range(min = 0.0, message = "Комиссия не может быть отрицательной"))]
    pub agent_commission: Option<f64>,
    pub second_responsible: Option<i64>,
    #[validate(range(min = 0.0, max = 100.0, message = "Процент от 0 до 100"))]
    pub second_agent_percent: Option<f64>,
    #[validate(range(min = 0.0, message = "Комиссия не может быть отрицательной"))]
    pub second_agent_commission: Option<f64>,
    #[validate(required(message = "Укажите дату сделки"))]
    pub date: Option<NaiveDate>,
    #[validate(length(max = 1000, message = "Комментарий не длиннее 1000 символов"))]
    pub comment: Option<String>,
}

impl Form for DealForm {
    fn cross_field(&self, errors: &mut FieldErrors) {
        let has_second_share =
            self.second_agent_percent.is_some() || self.second_agent_commission.is_some();
        if has_second_share && self.second_responsible.is_none() {
            errors.add("second_responsible", "Выберите второго агента");
        }
        if self.second_responsible.is_some() && self.second_responsible == self.responsible {
            errors.add("second_responsible", "Второй агент совпадает с первым");
        }
        let total = self.agent_percent.unwrap_or(0.0) + self.second_agent_percent.unwrap_or(0.0);
        if total > 100.0 {
            errors.add("second_agent_percent", "Сумма процентов превышает 100");
        }
    }
}

/// A showing of a property to a client.
#[derive(Debug, Clone, Default, Serialize, Validate)]
pub struct ViewForm {
    #[validate(required(message = "Выберите клиента"))]
    pub client: Option<i64>,
    #[validate(custom(function = "validate_object_type"))]
    pub object_type: String,
    #[validate(required(message = "Выберите объект"))]
    pub object_id: Option<i64>,
    #[validate(required(message = "Выберите ответственного"))]
    pub responsible: Option<i64>,
    #[validate(required(message = "Укажите дату показа"))]
    pub date: Option<DateTime<Utc>>,
    pub deal: bool,
    #[validate(length(max = 1000, message = "Комментарий не длиннее 1000 символов"))]
    pub comment: Option<String>,
}

impl Form for ViewForm {}
