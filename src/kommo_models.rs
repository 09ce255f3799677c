use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Lead identifier as Kommo sends it.
///
/// Keeps the JSON type it arrived with so that `external_id` echoes it
/// unchanged (a string stays a string, a number stays a number).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LeadId {
    Text(String),
    Number(serde_json::Number),
}

impl fmt::Display for LeadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LeadId::Text(id) => write!(f, "{}", id),
            LeadId::Number(id) => write!(f, "{}", id),
        }
    }
}

/// Webhook notification announcing a lead.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LeadNotification {
    /// Raw `object_id`; validated by [`LeadNotification::lead_id`].
    #[serde(default)]
    pub object_id: Option<Value>,
}

impl LeadNotification {
    /// Parses a raw request body. Anything that is not a JSON object yields
    /// an empty notification, which then fails [`Self::lead_id`].
    pub fn from_body(body: &[u8]) -> Self {
        serde_json::from_slice::<LeadNotification>(body).unwrap_or_default()
    }

    /// Extract the lead identifier.
    ///
    /// Absent, `null`, blank strings, non-scalar values and fractional
    /// numbers all count as missing. Whole floats such as `12345.0` are
    /// reduced to their integer form.
    pub fn lead_id(&self) -> Option<LeadId> {
        match self.object_id.as_ref()? {
            Value::String(s) if !s.trim().is_empty() => Some(LeadId::Text(s.trim().to_string())),
            Value::Number(n) => integer_id(n).map(LeadId::Number),
            _ => None,
        }
    }
}

/// Integer form of a JSON number, `None` for fractional or out-of-range values.
fn integer_id(n: &serde_json::Number) -> Option<serde_json::Number> {
    if n.is_u64() || n.is_i64() {
        return Some(n.clone());
    }
    let f = n.as_f64()?;
    if !f.is_finite() || f.fract() != 0.0 {
        return None;
    }
    if f >= 0.0 && f < u64::MAX as f64 {
        Some(serde_json::Number::from(f as u64))
    } else if f < 0.0 && f >= i64::MIN as f64 {
        Some(serde_json::Number::from(f as i64))
    } else {
        None
    }
}

/// Lead detail record from `GET /api/v4/leads/{id}`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Lead {
    /// Kommo sends `null` when no custom field is filled in
    #[serde(default)]
    pub custom_fields_values: Option<Vec<CustomField>>,
}

/// Entries are parsed leniently: a field without `field_id` never matches,
/// and `values: null` reads as no values.
#[derive(Debug, Clone, Deserialize)]
pub struct CustomField {
    #[serde(default)]
    pub field_id: Value,

    #[serde(default)]
    pub values: Option<Vec<CustomFieldValue>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CustomFieldValue {
    #[serde(default)]
    pub value: Value,
}

impl CustomField {
    /// Compares the field id in its decimal text form, the way ids appear
    /// in configuration.
    pub fn matches(&self, field_id: &str) -> bool {
        match &self.field_id {
            Value::Number(n) => n.to_string() == field_id,
            Value::String(s) => s == field_id,
            _ => false,
        }
    }

    /// Text of the first value, if any.
    pub fn first_value(&self) -> Option<String> {
        self.values
            .as_deref()
            .and_then(|values| values.first())
            .map(|v| value_text(&v.value))
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

impl Lead {
    pub fn custom_fields(&self) -> &[CustomField] {
        self.custom_fields_values.as_deref().unwrap_or_default()
    }

    /// First value of the custom field with the given id.
    pub fn field_value(&self, field_id: &str) -> Option<String> {
        self.custom_fields()
            .iter()
            .find(|field| field.matches(field_id))
            .and_then(|field| field.first_value())
    }

    /// Raw phone text, empty when the field is missing.
    pub fn phone(&self, field_id: &str) -> String {
        self.field_value(field_id).unwrap_or_default()
    }

    /// Click identifier, `None` when missing or empty.
    pub fn fbc(&self, field_id: &str) -> Option<String> {
        self.field_value(field_id).filter(|v| !v.is_empty())
    }
}
