use serde::{Serialize, Serializer};

/// A numeric cell that is either a number or an explicit null.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Numeric {
    Number(f64),
    Null,
}

impl Numeric {
    /// Replaces a non-finite number with `Null`.
    pub fn scrub(self) -> Self {
        match self {
            Numeric::Number(value) if value.is_finite() => self,
            _ => Numeric::Null,
        }
    }

    pub fn as_f64(self) -> Option<f64> {
        match self {
            Numeric::Number(value) => Some(value),
            Numeric::Null => None,
        }
    }

    pub fn is_finite(self) -> bool {
        self.as_f64().is_some_and(f64::is_finite)
    }
}

impl From<Option<f64>> for Numeric {
    fn from(value: Option<f64>) -> Self {
        value.map_or(Numeric::Null, Numeric::Number)
    }
}

impl Serialize for Numeric {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self.scrub() {
            Numeric::Number(value) => serializer.serialize_f64(value),
            Numeric::Null => serializer.serialize_none(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OccurrenceRecord {
    pub species: String,
    pub decimal_latitude: Numeric,
    pub decimal_longitude: Numeric,
    pub event_date: Option<String>,
    pub individual_count: i64,
    pub year: Numeric,
    pub state_province: Option<String>,
}

impl OccurrenceRecord {
    pub fn scrubbed(&self) -> Self {
        Self {
            decimal_latitude: self.decimal_latitude.scrub(),
            decimal_longitude: self.decimal_longitude.scrub(),
            year: self.year.scrub(),
            ..self.clone()
        }
    }
}

/// A source cell passed through as read: an integer, a number, or text that is neither.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Integer(i64),
    Number(Numeric),
    Text(String),
}

impl CellValue {
    pub fn from_text(text: &str) -> Self {
        let trimmed = text.trim();
        if let Ok(value) = trimmed.parse::<i64>() {
            CellValue::Integer(value)
        } else if let Ok(value) = trimmed.parse::<f64>() {
            CellValue::Number(Numeric::Number(value))
        } else {
            CellValue::Text(text.to_string())
        }
    }

    pub fn scrub(&self) -> Self {
        match self {
            CellValue::Number(value) => CellValue::Number(value.scrub()),
            other => other.clone(),
        }
    }
}

impl Serialize for CellValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            CellValue::Integer(value) => serializer.serialize_i64(*value),
            CellValue::Number(value) => value.serialize(serializer),
            CellValue::Text(value) => serializer.serialize_str(value),
        }
    }
}

/// A record of the minimal pipeline: the five projected columns, values as read.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MinimalRecord {
    pub species: String,
    pub decimal_latitude: CellValue,
    pub decimal_longitude: CellValue,
    pub event_date: String,
    pub individual_count: CellValue,
}

impl MinimalRecord {
    pub fn scrubbed(&self) -> Self {
        Self {
            decimal_latitude: self.decimal_latitude.scrub(),
            decimal_longitude: self.decimal_longitude.scrub(),
            individual_count: self.individual_count.scrub(),
            ..self.clone()
        }
    }
}

/// The cleaned, immutable set of records served for the process lifetime.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Dataset {
    Full(Vec<OccurrenceRecord>),
    Minimal(Vec<MinimalRecord>),
}

impl Dataset {
    /// Records of the full pipeline; empty for a minimal dataset.
    pub fn records(&self) -> &[OccurrenceRecord] {
        match self {
            Dataset::Full(records) => records,
            Dataset::Minimal(_) => &[],
        }
    }

    /// Records of the minimal pipeline; empty for a full dataset.
    pub fn minimal_records(&self) -> &[MinimalRecord] {
        match self {
            Dataset::Full(_) => &[],
            Dataset::Minimal(records) => records,
        }
    }

    pub fn scrubbed(&self) -> Self {
        match self {
            Dataset::Full(records) => {
                Dataset::Full(records.iter().map(OccurrenceRecord::scrubbed).collect())
            }
            Dataset::Minimal(records) => {
                Dataset::Minimal(records.iter().map(MinimalRecord::scrubbed).collect())
            }
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Dataset::Full(records) => records.len(),
            Dataset::Minimal(records) => records.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> OccurrenceRecord {
        OccurrenceRecord {
            species: "Hirundo rustica".to_string(),
            decimal_latitude: Numeric::Number(52.5),
            decimal_longitude: Numeric::Number(13.25),
            event_date: Some("2020-03-15".to_string()),
            individual_count: 3,
            year: Numeric::Number(2020.0),
            state_province: None,
        }
    }

    #[test]
    fn scrub_nulls_non_finite_numbers() {
        assert_eq!(Numeric::Number(f64::NAN).scrub(), Numeric::Null);
        assert_eq!(Numeric::Number(f64::INFINITY).scrub(), Numeric::Null);
        assert_eq!(Numeric::Number(f64::NEG_INFINITY).scrub(), Numeric::Null);
        assert_eq!(Numeric::Number(-1.5).scrub(), Numeric::Number(-1.5));
        assert_eq!(Numeric::Null.scrub(), Numeric::Null);
    }

    #[test]
    fn serialize_occurrence_record() {
        let serialized = serde_json::to_value(record()).unwrap();
        assert_eq!(
            serialized,
            serde_json::json!({
                "species": "Hirundo rustica",
                "decimalLatitude": 52.5,
                "decimalLongitude": 13.25,
                "eventDate": "2020-03-15",
                "individualCount": 3,
                "year": 2020.0,
                "stateProvince": null,
            })
        );
    }

    #[test]
    fn non_finite_fields_serialize_as_null() {
        let mut record = record();
        record.decimal_latitude = Numeric::Number(f64::NAN);
        record.year = Numeric::Number(f64::INFINITY);
        let text = serde_json::to_string(&record).unwrap();
        assert!(!text.contains("NaN"));
        assert!(!text.contains("inf"));

        let scrubbed = record.scrubbed();
        assert_eq!(scrubbed.decimal_latitude, Numeric::Null);
        assert_eq!(scrubbed.year, Numeric::Null);
        assert_eq!(scrubbed.decimal_longitude, Numeric::Number(13.25));
        assert_eq!(scrubbed.species, "Hirundo rustica");
    }

    #[test]
    fn cells_keep_their_source_type() {
        assert_eq!(CellValue::from_text("3"), CellValue::Integer(3));
        assert_eq!(CellValue::from_text(" 2.5 "), CellValue::Number(Numeric::Number(2.5)));
        assert_eq!(CellValue::from_text("several"), CellValue::Text("several".to_string()));
        assert_eq!(
            CellValue::from_text("inf").scrub(),
            CellValue::Number(Numeric::Null)
        );
    }

    #[test]
    fn serialize_minimal_record() {
        let record = MinimalRecord {
            species: "Grus grus".to_string(),
            decimal_latitude: CellValue::from_text("52.5"),
            decimal_longitude: CellValue::from_text("north"),
            event_date: "2020-03-15".to_string(),
            individual_count: CellValue::from_text("2.5"),
        };
        assert_eq!(
            serde_json::to_value(&record).unwrap(),
            serde_json::json!({
                "species": "Grus grus",
                "decimalLatitude": 52.5,
                "decimalLongitude": "north",
                "eventDate": "2020-03-15",
                "individualCount": 2.5,
            })
        );
    }
}
