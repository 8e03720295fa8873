use serde::Serialize;
use validator::Validate;

use super::Form;

#[derive(Debug, Clone, Default, Serialize, Validate)]
pub struct DistrictForm {
    #[validate(length(min = 2, max = 100, message = "Название от 2 до 100 символов"))]
    pub name: String,
}

impl Form for DistrictForm {}

#[derive(Debug, Clone, Default, Serialize, Validate)]
pub struct MetroForm {
    #[validate(length(min = 2, max = 100, message = "Название от 2 до 100 символов"))]
    pub name: String,
    pub district: Option<i64>,
}

impl Form for MetroForm {}
