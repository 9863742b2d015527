use serde::{Deserialize, Serialize};
use std::fmt;

use crate::location::LocationLevel;

/// Everything one prediction request says about a property.
///
/// Serialized field names are the ones the prediction endpoint expects, so
/// the record doubles as the outbound request body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyFormRecord {
    #[serde(rename = "pulau", default)]
    pub island: String,
    #[serde(rename = "provinsi", default)]
    pub province: String,
    #[serde(rename = "kota", default)]
    pub city: String,
    #[serde(rename = "luas_tanah", default)]
    pub land_area: f64,
    #[serde(rename = "luas_bangunan", default)]
    pub building_area: f64,
    #[serde(rename = "jumlah_kamar_tidur", default = "one")]
    pub bedroom_count: u32,
    #[serde(rename = "jumlah_kamar_mandi", default = "one")]
    pub bathroom_count: u32,
    #[serde(rename = "muatan_parkir", default)]
    pub parking_capacity: u32,
}

fn one() -> u32 {
    1
}

impl Default for PropertyFormRecord {
    fn default() -> Self {
        Self {
            island: String::new(),
            province: String::new(),
            city: String::new(),
            land_area: 0.0,
            building_area: 0.0,
            bedroom_count: FormField::BedroomCount.minimum(),
            bathroom_count: FormField::BathroomCount.minimum(),
            parking_capacity: FormField::ParkingCapacity.minimum(),
        }
    }
}

impl PropertyFormRecord {
    /// Apply a location choice, clearing every level beneath it.
    ///
    /// The reset is unconditional: re-selecting an island that happens to hold
    /// a province of the same label still clears the province.
    pub fn with_selection(&self, level: LocationLevel, label: impl Into<String>) -> Self {
        let label = label.into();
        let mut next = self.clone();
        match level {
            LocationLevel::Island => {
                next.island = label;
                next.province.clear();
                next.city.clear();
            }
            LocationLevel::Province => {
                next.province = label;
                next.city.clear();
            }
            LocationLevel::City => {
                next.city = label;
            }
        }
        next
    }

    pub fn selection(&self, level: LocationLevel) -> &str {
        match level {
            LocationLevel::Island => &self.island,
            LocationLevel::Province => &self.province,
            LocationLevel::City => &self.city,
        }
    }

    /// First location level that is still unset.
    pub fn missing_location(&self) -> Option<LocationLevel> {
        LocationLevel::ordered()
            .into_iter()
            .find(|level| self.selection(*level).trim().is_empty())
    }

    pub fn has_positive_areas(&self) -> bool {
        self.land_area > 0.0 && self.building_area > 0.0
    }
}

/// Controlled field names accepted by [`FormState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FormField {
    #[serde(rename = "pulau")]
    Island,
    #[serde(rename = "provinsi")]
    Province,
    #[serde(rename = "kota")]
    City,
    #[serde(rename = "luas_tanah")]
    LandArea,
    #[serde(rename = "luas_bangunan")]
    BuildingArea,
    #[serde(rename = "jumlah_kamar_tidur")]
    BedroomCount,
    #[serde(rename = "jumlah_kamar_mandi")]
    BathroomCount,
    #[serde(rename = "muatan_parkir")]
    ParkingCapacity,
}

impl FormField {
    pub const fn ordered() -> [Self; 8] {
        [
            Self::Island,
            Self::Province,
            Self::City,
            Self::LandArea,
            Self::BuildingArea,
            Self::BedroomCount,
            Self::BathroomCount,
            Self::ParkingCapacity,
        ]
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Island => "pulau",
            Self::Province => "provinsi",
            Self::City => "kota",
            Self::LandArea => "luas_tanah",
            Self::BuildingArea => "luas_bangunan",
            Self::BedroomCount => "jumlah_kamar_tidur",
            Self::BathroomCount => "jumlah_kamar_mandi",
            Self::ParkingCapacity => "muatan_parkir",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Island => "Pulau",
            Self::Province => "Provinsi",
            Self::City => "Kota/Kabupaten",
            Self::LandArea => "Luas Tanah (m²)",
            Self::BuildingArea => "Luas Bangunan (m²)",
            Self::BedroomCount => "Jumlah Kamar Tidur",
            Self::BathroomCount => "Jumlah Kamar Mandi",
            Self::ParkingCapacity => "Muatan Parkir",
        }
    }

    pub fn from_name(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        Self::ordered().into_iter().find(|field| field.name() == raw)
    }

    pub const fn location_level(self) -> Option<LocationLevel> {
        match self {
            Self::Island => Some(LocationLevel::Island),
            Self::Province => Some(LocationLevel::Province),
            Self::City => Some(LocationLevel::City),
            _ => None,
        }
    }

    /// Count fields are driven by steppers and never drop below this floor.
    pub const fn minimum(self) -> u32 {
        match self {
            Self::BedroomCount | Self::BathroomCount => 1,
            _ => 0,
        }
    }

    pub const fn is_count(self) -> bool {
        matches!(
            self,
            Self::BedroomCount | Self::BathroomCount | Self::ParkingCapacity
        )
    }
}

impl fmt::Display for FormField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Value carried by an `onChange` for any field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Text(String),
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<u32> for FieldValue {
    fn from(value: u32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FormError {
    #[error("unknown form field '{0}'")]
    UnknownField(String),
    #[error("{0} expects a text label")]
    ExpectedText(FormField),
    #[error("{field} expects a number, got '{value}'")]
    NotANumber { field: FormField, value: String },
    #[error("{0} must be a finite number")]
    NotFinite(FormField),
    #[error("{field} must be a whole number, got {value}")]
    NotAWholeNumber { field: FormField, value: f64 },
    #[error("{0} has no stepper")]
    NotSteppable(FormField),
}

/// Owner of the single [`PropertyFormRecord`], exposing controlled-field updates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormState {
    record: PropertyFormRecord,
}

impl FormState {
    pub fn new(record: PropertyFormRecord) -> Self {
        Self { record }
    }

    pub fn record(&self) -> &PropertyFormRecord {
        &self.record
    }

    pub fn into_record(self) -> PropertyFormRecord {
        self.record
    }

    pub fn value(&self, field: FormField) -> FieldValue {
        let record = &self.record;
        match field {
            FormField::Island => FieldValue::Text(record.island.clone()),
            FormField::Province => FieldValue::Text(record.province.clone()),
            FormField::City => FieldValue::Text(record.city.clone()),
            FormField::LandArea => FieldValue::Number(record.land_area),
            FormField::BuildingArea => FieldValue::Number(record.building_area),
            FormField::BedroomCount => record.bedroom_count.into(),
            FormField::BathroomCount => record.bathroom_count.into(),
            FormField::ParkingCapacity => record.parking_capacity.into(),
        }
    }

    pub fn select(&mut self, level: LocationLevel, label: impl Into<String>) {
        self.record = self.record.with_selection(level, label);
    }

    /// `onChange(newValue)` for any field. Location fields cascade; counts clamp
    /// to their minimum; an empty text value restores the field's default.
    pub fn set(&mut self, field: FormField, value: FieldValue) -> Result<(), FormError> {
        if let Some(level) = field.location_level() {
            return match value {
                FieldValue::Text(label) => {
                    self.select(level, label);
                    Ok(())
                }
                FieldValue::Number(_) => Err(FormError::ExpectedText(field)),
            };
        }

        let number = match value {
            FieldValue::Number(number) => Some(number),
            FieldValue::Text(raw) if raw.trim().is_empty() => None,
            FieldValue::Text(raw) => Some(raw.trim().parse::<f64>().map_err(|_| {
                FormError::NotANumber {
                    field,
                    value: raw.clone(),
                }
            })?),
        };

        match number {
            Some(number) if !number.is_finite() => Err(FormError::NotFinite(field)),
            Some(number) => {
                self.write_number(field, number)?;
                Ok(())
            }
            None => {
                let defaults = PropertyFormRecord::default();
                self.write_number(field, numeric_value(&defaults, field))?;
                Ok(())
            }
        }
    }

    /// Stepper `+`/`-` on a count field, floored at the field minimum.
    pub fn step(&mut self, field: FormField, delta: i64) -> Result<u32, FormError> {
        if !field.is_count() {
            return Err(FormError::NotSteppable(field));
        }
        let current = i64::from(numeric_value(&self.record, field) as u32);
        let next = current
            .saturating_add(delta)
            .clamp(i64::from(field.minimum()), i64::from(u32::MAX)) as u32;
        self.write_count(field, next);
        Ok(next)
    }

    fn write_number(&mut self, field: FormField, number: f64) -> Result<(), FormError> {
        match field {
            FormField::LandArea => self.record.land_area = number,
            FormField::BuildingArea => self.record.building_area = number,
            _ if field.is_count() => {
                if number.fract() != 0.0 || number > f64::from(u32::MAX) {
                    return Err(FormError::NotAWholeNumber {
                        field,
                        value: number,
                    });
                }
                let clamped = number.max(f64::from(field.minimum())) as u32;
                self.write_count(field, clamped);
            }
            _ => return Err(FormError::UnknownField(field.name().to_string())),
        }
        Ok(())
    }

    fn write_count(&mut self, field: FormField, value: u32) {
        match field {
            FormField::BedroomCount => self.record.bedroom_count = value,
            FormField::BathroomCount => self.record.bathroom_count = value,
            FormField::ParkingCapacity => self.record.parking_capacity = value,
            _ => {}
        }
    }
}

fn numeric_value(record: &PropertyFormRecord, field: FormField) -> f64 {
    match field {
        FormField::LandArea => record.land_area,
        FormField::BuildingArea => record.building_area,
        FormField::BedroomCount => f64::from(record.bedroom_count),
        FormField::BathroomCount => f64::from(record.bathroom_count),
        FormField::ParkingCapacity => f64::from(record.parking_capacity),
        FormField::Island | FormField::Province | FormField::City => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn located() -> PropertyFormRecord {
        PropertyFormRecord::default()
            .with_selection(LocationLevel::Island, "Jawa")
            .with_selection(LocationLevel::Province, "Yogyakarta")
            .with_selection(LocationLevel::City, "Sleman")
    }

    #[test]
    fn island_change_clears_descendants() {
        let record = located().with_selection(LocationLevel::Island, "Bali & Nusa Tenggara");
        assert_eq!(record.island, "Bali & Nusa Tenggara");
        assert!(record.province.is_empty());
        assert!(record.city.is_empty());
    }

    #[test]
    fn reselecting_same_island_still_resets() {
        let record = located().with_selection(LocationLevel::Island, "Jawa");
        assert_eq!(record.island, "Jawa");
        assert!(record.province.is_empty());
        assert!(record.city.is_empty());
    }

    #[test]
    fn province_change_clears_only_city() {
        let record = located().with_selection(LocationLevel::Province, "Jawa Tengah");
        assert_eq!(record.island, "Jawa");
        assert_eq!(record.province, "Jawa Tengah");
        assert!(record.city.is_empty());
        assert_eq!(record.missing_location(), Some(LocationLevel::City));
    }

    #[test]
    fn serializes_with_endpoint_field_names() {
        let mut record = located();
        record.land_area = 120.0;
        record.building_area = 80.0;
        record.bedroom_count = 3;
        record.bathroom_count = 2;
        record.parking_capacity = 1;

        let value = serde_json::to_value(&record).expect("record serializes");
        assert_eq!(
            value,
            json!({
                "pulau": "Jawa",
                "provinsi": "Yogyakarta",
                "kota": "Sleman",
                "luas_tanah": 120.0,
                "luas_bangunan": 80.0,
                "jumlah_kamar_tidur": 3,
                "jumlah_kamar_mandi": 2,
                "muatan_parkir": 1
            })
        );
    }

    #[test]
    fn set_routes_location_fields_through_cascade() {
        let mut form = FormState::new(located());
        form.set(FormField::Province, "Jawa Timur".into())
            .expect("province accepted");
        assert!(form.record().city.is_empty());
        assert_eq!(
            form.set(FormField::City, FieldValue::Number(3.0)),
            Err(FormError::ExpectedText(FormField::City))
        );
    }

    #[test]
    fn set_parses_text_numbers_and_clamps_counts() {
        let mut form = FormState::default();
        form.set(FormField::LandArea, " 120.5 ".into()).expect("area parses");
        assert_eq!(form.record().land_area, 120.5);

        form.set(FormField::BedroomCount, FieldValue::Number(0.0))
            .expect("count accepted");
        assert_eq!(form.record().bedroom_count, 1);

        assert!(matches!(
            form.set(FormField::BathroomCount, FieldValue::Number(1.5)),
            Err(FormError::NotAWholeNumber { .. })
        ));
        assert!(matches!(
            form.set(FormField::BuildingArea, "luas".into()),
            Err(FormError::NotANumber { .. })
        ));
        assert_eq!(
            form.set(FormField::BuildingArea, FieldValue::Number(f64::NAN)),
            Err(FormError::NotFinite(FormField::BuildingArea))
        );
    }

    #[test]
    fn empty_text_restores_defaults() {
        let mut form = FormState::default();
        form.set(FormField::LandArea, FieldValue::Number(90.0))
            .expect("area set");
        form.set(FormField::ParkingCapacity, FieldValue::Number(2.0))
            .expect("parking set");
        form.set(FormField::LandArea, "".into()).expect("cleared");
        form.set(FormField::ParkingCapacity, "".into()).expect("cleared");
        assert_eq!(form.record().land_area, 0.0);
        assert_eq!(form.record().parking_capacity, 0);
    }

    #[test]
    fn areas_accept_values_the_widgets_would_block() {
        let mut form = FormState::default();
        form.set(FormField::LandArea, FieldValue::Number(-5.0))
            .expect("raw writes are allowed");
        assert!(!form.record().has_positive_areas());
    }

    #[test]
    fn stepper_floors_at_minimum() {
        let mut form = FormState::default();
        assert_eq!(form.step(FormField::BedroomCount, -1), Ok(1));
        assert_eq!(form.step(FormField::BedroomCount, 2), Ok(3));
        assert_eq!(form.step(FormField::ParkingCapacity, -4), Ok(0));
        assert_eq!(
            form.step(FormField::LandArea, 1),
            Err(FormError::NotSteppable(FormField::LandArea))
        );
    }

    #[test]
    fn field_names_round_trip() {
        for field in FormField::ordered() {
            assert_eq!(FormField::from_name(field.name()), Some(field));
        }
        assert_eq!(FormField::from_name("harga"), None);
    }
}
