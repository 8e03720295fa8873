use chrono::{DateTime, NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

/// A flat record owned by one backend resource.
///
/// `RESOURCE` is the list path (no slashes), `COLUMNS` the keys shown in
/// listings, in display order.
pub trait Entity: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    const RESOURCE: &'static str;
    const LABEL: &'static str;
    const COLUMNS: &'static [&'static str];

    fn id(&self) -> i64;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionType {
    Rent,
    Sale,
}

impl ActionType {
    pub const ALL: &'static [&'static str] = &["rent", "sale"];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyStatus {
    Free,
    Sold,
    Rented,
    Reserved,
}

impl PropertyStatus {
    pub const ALL: &'static [&'static str] = &["free", "sold", "rented", "reserved"];
}

/// An uploaded photo or document attached to a property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Media {
    pub id: i64,
    pub file: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Apartment {
    pub id: i64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub district: Option<i64>,
    #[serde(default)]
    pub metro: Option<i64>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub rooms: Option<u32>,
    #[serde(default)]
    pub floor: Option<i32>,
    #[serde(default)]
    pub total_floor: Option<i32>,
    #[serde(default, deserialize_with = "amount")]
    pub area: Option<f64>,
    #[serde(default, deserialize_with = "amount")]
    pub price: Option<f64>,
    #[serde(default)]
    pub action_type: Option<ActionType>,
    #[serde(default)]
    pub status: Option<PropertyStatus>,
    #[serde(default)]
    pub status_date: Option<NaiveDate>,
    #[serde(default)]
    pub furnished: bool,
    #[serde(default)]
    pub parking_place: bool,
    #[serde(default)]
    pub responsible: Option<i64>,
    #[serde(default, deserialize_with = "amount")]
    pub agent_percent: Option<f64>,
    #[serde(default, deserialize_with = "amount")]
    pub agent_commission: Option<f64>,
    #[serde(default)]
    pub owner_name: Option<String>,
    #[serde(default)]
    pub owner_phone: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub media: Vec<Media>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Land {
    pub id: i64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub district: Option<i64>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default, deserialize_with = "amount")]
    pub area: Option<f64>,
    #[serde(default, deserialize_with = "amount")]
    pub price: Option<f64>,
    #[serde(default)]
    pub action_type: Option<ActionType>,
    #[serde(default)]
    pub status: Option<PropertyStatus>,
    #[serde(default)]
    pub status_date: Option<NaiveDate>,
    #[serde(default)]
    pub responsible: Option<i64>,
    #[serde(default, deserialize_with = "amount")]
    pub agent_percent: Option<f64>,
    #[serde(default, deserialize_with = "amount")]
    pub agent_commission: Option<f64>,
    #[serde(default)]
    pub owner_phone: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub media: Vec<Media>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Commercial {
    pub id: i64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub district: Option<i64>,
    #[serde(default)]
    pub metro: Option<i64>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub floor: Option<i32>,
    #[serde(default, deserialize_with = "amount")]
    pub area: Option<f64>,
    #[serde(default, deserialize_with = "amount")]
    pub price: Option<f64>,
    #[serde(default)]
    pub action_type: Option<ActionType>,
    #[serde(default)]
    pub status: Option<PropertyStatus>,
    #[serde(default)]
    pub status_date: Option<NaiveDate>,
    #[serde(default)]
    pub parking_place: bool,
    #[serde(default)]
    pub responsible: Option<i64>,
    #[serde(default, deserialize_with = "amount")]
    pub agent_percent: Option<f64>,
    #[serde(default, deserialize_with = "amount")]
    pub agent_commission: Option<f64>,
    #[serde(default)]
    pub owner_phone: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub media: Vec<Media>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Client {
    pub id: i64,
    pub full_name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub action_type: Option<ActionType>,
    #[serde(default, deserialize_with = "amount")]
    pub budget: Option<f64>,
    #[serde(default)]
    pub district: Option<i64>,
    #[serde(default)]
    pub rooms: Option<u32>,
    #[serde(default)]
    pub responsible: Option<i64>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Deal {
    pub id: i64,
    #[serde(default)]
    pub client: Option<i64>,
    #[serde(default)]
    pub object_type: Option<String>,
    #[serde(default)]
    pub object_id: Option<i64>,
    #[serde(default)]
    pub action_type: Option<ActionType>,
    #[serde(default, deserialize_with = "amount")]
    pub price: Option<f64>,
    #[serde(default)]
    pub responsible: Option<i64>,
    #[serde(default, deserialize_with = "amount")]
    pub agent_percent: Option<f64>,
    #[serde(default, deserialize_with = "amount")]
    pub agent_commission: Option<f64>,
    #[serde(default)]
    pub second_responsible: Option<i64>,
    #[serde(default, deserialize_with = "amount")]
    pub second_agent_percent: Option<f64>,
    #[serde(default, deserialize_with = "amount")]
    pub second_agent_commission: Option<f64>,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// A showing of a property to a client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct View {
    pub id: i64,
    #[serde(default)]
    pub client: Option<i64>,
    #[serde(default)]
    pub object_type: Option<String>,
    #[serde(default)]
    pub object_id: Option<i64>,
    #[serde(default)]
    pub responsible: Option<i64>,
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
    /// Whether the showing ended in a deal.
    #[serde(default)]
    pub deal: bool,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub phone: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub is_superuser: bool,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct District {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Metro {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub district: Option<i64>,
}

/// The signed-in account, as returned by the `me` endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginInfo {
    pub id: i64,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub is_superuser: bool,
}

impl Entity for Apartment {
    const RESOURCE: &'static str = "apartment";
    const LABEL: &'static str = "Квартиры";
    const COLUMNS: &'static [&'static str] = &[
        "id", "title", "rooms", "floor", "area", "price", "action_type", "status", "furnished",
    ];

    fn id(&self) -> i64 {
        self.id
    }
}

impl Entity for Land {
    const RESOURCE: &'static str = "land";
    const LABEL: &'static str = "Участки";
    const COLUMNS: &'static [&'static str] =
        &["id", "title", "address", "area", "price", "action_type", "status"];

    fn id(&self) -> i64 {
        self.id
    }
}

impl Entity for Commercial {
    const RESOURCE: &'static str = "commercial";
    const LABEL: &'static str = "Коммерция";
    const COLUMNS: &'static [&'static str] = &[
        "id", "title", "floor", "area", "price", "action_type", "status", "parking_place",
    ];

    fn id(&self) -> i64 {
        self.id
    }
}

impl Entity for Client {
    const RESOURCE: &'static str = "clients";
    const LABEL: &'static str = "Клиенты";
    const COLUMNS: &'static [&'static str] =
        &["id", "full_name", "phone", "action_type", "budget", "rooms"];

    fn id(&self) -> i64 {
        self.id
    }
}

impl Entity for Deal {
    const RESOURCE: &'static str = "deals";
    const LABEL: &'static str = "Сделки";
    const COLUMNS: &'static [&'static str] = &[
        "id", "client", "object_type", "price", "agent_percent", "agent_commission", "date",
    ];

    fn id(&self) -> i64 {
        self.id
    }
}

impl Entity for View {
    const RESOURCE: &'static str = "views";
    const LABEL: &'static str = "Показы";
    const COLUMNS: &'static [&'static str] =
        &["id", "client", "object_type", "object_id", "date", "deal"];

    fn id(&self) -> i64 {
        self.id
    }
}

impl Entity for User {
    const RESOURCE: &'static str = "user";
    const LABEL: &'static str = "Пользователи";
    const COLUMNS: &'static [&'static str] =
        &["id", "full_name", "phone", "is_superuser", "is_active"];

    fn id(&self) -> i64 {
        self.id
    }
}

impl Entity for District {
    const RESOURCE: &'static str = "district";
    const LABEL: &'static str = "Районы";
    const COLUMNS: &'static [&'static str] = &["id", "name"];

    fn id(&self) -> i64 {
        self.id
    }
}

impl Entity for Metro {
    const RESOURCE: &'static str = "metro";
    const LABEL: &'static str = "Метро";
    const COLUMNS: &'static [&'static str] = &["id", "name", "district"];

    fn id(&self) -> i64 {
        self.id
    }
}

/// Money and area fields arrive either as JSON numbers or as decimal strings.
fn amount<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    match Option::<Raw>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Raw::Number(n)) => Ok(Some(n)),
        Some(Raw::Text(s)) if s.trim().is_empty() => Ok(None),
        Some(Raw::Text(s)) => s
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn apartment_accepts_decimal_strings() {
        let apt: Apartment = serde_json::from_value(json!({
            "id": 4,
            "price": "125000.50",
            "area": 64,
            "action_type": "sale",
            "status": "free",
            "furnished": true
        }))
        .unwrap();
        assert_eq!(apt.price, Some(125000.5));
        assert_eq!(apt.area, Some(64.0));
        assert_eq!(apt.action_type, Some(ActionType::Sale));
        assert!(apt.furnished);
        assert!(!apt.parking_place);
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let d: District = serde_json::from_value(json!({"id": 1, "name": "Chilonzor", "extra": 1}))
            .unwrap();
        assert_eq!(d.name, "Chilonzor");
    }

    #[test]
    fn invalid_amount_string_is_an_error() {
        let res: Result<Land, _> = serde_json::from_value(json!({"id": 1, "price": "abc"}));
        assert!(res.is_err());
    }
}
