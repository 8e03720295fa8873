use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, Timelike};
use serde_json::Value;

/// Shown for null or missing values.
pub const EMPTY: &str = "—";

const CURRENCY_KEYS: &[&str] = &["price", "agent_commission", "second_agent_commission"];
const PERCENT_KEYS: &[&str] = &["agent_percent", "second_agent_percent"];
const BOOL_KEYS: &[&str] = &["furnished", "parking_place", "deal"];
const DATE_KEYS: &[&str] = &["created_at", "updated_at"];

const CURRENCY_SYMBOL: &str = "сум";
const GROUP_SEPARATOR: char = '\u{a0}';
/// Tashkent, UTC+5 all year.
const DISPLAY_OFFSET_SECS: i32 = 5 * 3600;

const MONTHS_GENITIVE: [&str; 12] = [
    "января",
    "февраля",
    "марта",
    "апреля",
    "мая",
    "июня",
    "июля",
    "августа",
    "сентября",
    "октября",
    "ноября",
    "декабря",
];

/// Render one snapshot value for display.
///
/// The format is chosen by the field name, never by the value's JSON type:
/// money in UZS, percentages, yes/no flags, long dates. Everything else is
/// shown as its plain string form. Deterministic for a given `(key, value)`.
pub fn format_value(key: &str, value: &Value) -> String {
    if value.is_null() {
        return EMPTY.to_string();
    }

    if CURRENCY_KEYS.contains(&key) {
        return as_number(value)
            .map(format_currency)
            .unwrap_or_else(|| coerce(value));
    }
    if PERCENT_KEYS.contains(&key) {
        return format!("{}%", coerce(value));
    }
    if BOOL_KEYS.contains(&key) {
        return if truthy(value) { "Да" } else { "Нет" }.to_string();
    }
    if DATE_KEYS.contains(&key) {
        return value
            .as_str()
            .and_then(format_datetime)
            .unwrap_or_else(|| coerce(value));
    }

    coerce(value)
}

/// Same as [`format_value`] for a value that may be absent altogether.
pub fn format_optional(key: &str, value: Option<&Value>) -> String {
    value
        .map(|v| format_value(key, v))
        .unwrap_or_else(|| EMPTY.to_string())
}

/// `1234567.5` → `1 234 567,50 сум` (no-break spaces).
pub fn format_currency(amount: f64) -> String {
    let cents = (amount.abs() * 100.0).round() as u128;
    let whole = cents / 100;
    let frac = cents % 100;
    let sign = if amount < 0.0 && cents > 0 { "-" } else { "" };
    format!(
        "{}{},{:02}{}{}",
        sign,
        group_thousands(whole),
        frac,
        GROUP_SEPARATOR,
        CURRENCY_SYMBOL
    )
}

fn group_thousands(n: u128) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(GROUP_SEPARATOR);
        }
        out.push(ch);
    }
    out
}

/// RFC 3339 timestamps → `16 октября 2026 г. в 14:30` (Tashkent time);
/// bare dates → `16 октября 2026 г.`.
pub fn format_datetime(raw: &str) -> Option<String> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        let offset = FixedOffset::east_opt(DISPLAY_OFFSET_SECS)?;
        let local = dt.with_timezone(&offset);
        return Some(format!(
            "{} {} {} г. в {:02}:{:02}",
            local.day(),
            MONTHS_GENITIVE[local.month0() as usize],
            local.year(),
            local.hour(),
            local.minute()
        ));
    }
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()?;
    Some(format!(
        "{} {} {} г.",
        date.day(),
        MONTHS_GENITIVE[date.month0() as usize],
        date.year()
    ))
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Plain string form of a value: strings unquoted, integral numbers without a
/// fractional part, containers as compact JSON.
pub fn coerce(value: &Value) -> String {
    match value {
        Value::Null => EMPTY.to_string(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                i.to_string()
            } else if let Some(u) = n.as_u64() {
                u.to_string()
            } else {
                n.as_f64().map(number_string).unwrap_or_else(|| n.to_string())
            }
        }
        other => other.to_string(),
    }
}

pub(crate) fn number_string(f: f64) -> String {
    if f.fract() == 0.0 && f.abs() < 1e15 {
        format!("{}", f as i64)
    } else {
        format!("{}", f)
    }
}
