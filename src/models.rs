use serde::{Deserialize, Serialize};

/// Distance as stored by the backend.
///
/// Rows written through this app always carry a number, but the table does
/// not enforce a type, so anything the store hands back is kept as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Kilometers {
    Number(f64),
    Text(String),
    Other(serde_json::Value),
}

impl Kilometers {
    /// Numeric value, if this reads as a finite number. Text is read up to
    /// the first character that no longer fits a number, so `"5 km"` is 5.
    pub fn value(&self) -> Option<f64> {
        let km = match self {
            Kilometers::Number(km) => *km,
            Kilometers::Text(text) => leading_number(text)?,
            Kilometers::Other(_) => return None,
        };
        km.is_finite().then_some(km)
    }
}

fn leading_number(text: &str) -> Option<f64> {
    let text = text.trim_start();
    text.char_indices()
        .map(|(at, ch)| at + ch.len_utf8())
        .rev()
        .find_map(|end| text[..end].parse::<f64>().ok())
}

impl From<f64> for Kilometers {
    fn from(km: f64) -> Self {
        Kilometers::Number(km)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Run {
    pub date: String,
    pub kilometers: Kilometers,
}

impl Run {
    pub fn new(date: impl Into<String>, kilometers: impl Into<Kilometers>) -> Self {
        Self {
            date: date.into(),
            kilometers: kilometers.into(),
        }
    }
}

/// Raw form input, before validation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RunForm {
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub kilometers: String,
}

#[derive(Debug, Deserialize)]
pub struct RunRequest {
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub kilometers: Option<Kilometers>,
}

impl RunRequest {
    /// Requested distance; anything unusable comes back as NaN so it fails
    /// validation with the rest of the bad input.
    pub fn kilometers(&self) -> f64 {
        self.kilometers
            .as_ref()
            .and_then(Kilometers::value)
            .unwrap_or(f64::NAN)
    }
}

#[derive(Debug, Deserialize)]
pub struct SelectQuery {
    pub date: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DayResponse {
    pub date: String,
    pub count: usize,
    pub total_km: f64,
    pub runs: Vec<f64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CalendarResponse {
    pub year: i32,
    pub month: u32,
    pub marked: Vec<String>,
    /// Dates with runs that the visible month does not show.
    pub skipped: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub phase: String,
    pub message: Option<String>,
    pub is_error: bool,
}
