use serde::{Deserialize, Serialize};

use crate::error::InputError;

/// One set of field measurements. Built fresh for every prediction request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldObservation {
    pub district: String,
    pub soil_color: String,
    pub nitrogen: f64,
    pub phosphorus: f64,
    pub potassium: f64,
    pub ph: f64,
    pub rainfall: f64,
    pub temperature: f64,
}

impl FieldObservation {
    /// Numeric part of the feature vector, in model order.
    pub fn measurements(&self) -> [f64; 6] {
        [
            self.nitrogen,
            self.phosphorus,
            self.potassium,
            self.ph,
            self.rainfall,
            self.temperature,
        ]
    }
}

/// Bounds and default of one numeric form input. `max: None` means unbounded above.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct NumericField {
    pub key: &'static str,
    pub label: &'static str,
    pub min: f64,
    pub max: Option<f64>,
    pub step: f64,
    pub default: f64,
}

impl NumericField {
    pub fn check(&self, value: f64) -> Result<f64, InputError> {
        if !value.is_finite() {
            return Err(InputError::NotFinite { field: self.key });
        }
        match self.max {
            Some(max) if value < self.min || value > max => Err(InputError::OutOfRange {
                field: self.key,
                min: self.min,
                max,
                value,
            }),
            None if value < self.min => Err(InputError::BelowMinimum {
                field: self.key,
                min: self.min,
                value,
            }),
            _ => Ok(value),
        }
    }
}

pub const NITROGEN: NumericField = NumericField {
    key: "nitrogen",
    label: "Nitrogen (N) Content",
    min: 0.0,
    max: Some(150.0),
    step: 1.0,
    default: 75.0,
};
pub const PHOSPHORUS: NumericField = NumericField {
    key: "phosphorus",
    label: "Phosphorus (P) Content",
    min: 0.0,
    max: Some(100.0),
    step: 1.0,
    default: 50.0,
};
pub const POTASSIUM: NumericField = NumericField {
    key: "potassium",
    label: "Potassium (K) Content",
    min: 0.0,
    max: Some(150.0),
    step: 1.0,
    default: 100.0,
};
pub const PH: NumericField = NumericField {
    key: "ph",
    label: "Soil pH Level",
    min: 3.0,
    max: Some(9.0),
    step: 0.1,
    default: 6.5,
};
pub const RAINFALL: NumericField = NumericField {
    key: "rainfall",
    label: "Rainfall (in mm)",
    min: 0.0,
    max: None,
    step: 1.0,
    default: 1000.0,
};
pub const TEMPERATURE: NumericField = NumericField {
    key: "temperature",
    label: "Temperature (°C)",
    min: 0.0,
    max: Some(50.0),
    step: 1.0,
    default: 25.0,
};

/// Raw form submission. Missing numeric fields take the form defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct FormInput {
    #[serde(default)]
    pub district: String,
    #[serde(default)]
    pub soil_color: String,
    #[serde(default = "default_nitrogen")]
    pub nitrogen: f64,
    #[serde(default = "default_phosphorus")]
    pub phosphorus: f64,
    #[serde(default = "default_potassium")]
    pub potassium: f64,
    #[serde(default = "default_ph")]
    pub ph: f64,
    #[serde(default = "default_rainfall")]
    pub rainfall: f64,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
}

fn default_nitrogen() -> f64 {
    NITROGEN.default
}
fn default_phosphorus() -> f64 {
    PHOSPHORUS.default
}
fn default_potassium() -> f64 {
    POTASSIUM.default
}
fn default_ph() -> f64 {
    PH.default
}
fn default_rainfall() -> f64 {
    RAINFALL.default
}
fn default_temperature() -> f64 {
    TEMPERATURE.default
}

impl FormInput {
    /// Range-checks the numeric inputs. Categorical values pass through untouched;
    /// their domain is the encoder's and is enforced by the facade.
    pub fn validate(self) -> Result<FieldObservation, InputError> {
        Ok(FieldObservation {
            nitrogen: NITROGEN.check(self.nitrogen)?,
            phosphorus: PHOSPHORUS.check(self.phosphorus)?,
            potassium: POTASSIUM.check(self.potassium)?,
            ph: PH.check(self.ph)?,
            rainfall: RAINFALL.check(self.rainfall)?,
            temperature: TEMPERATURE.check(self.temperature)?,
            district: self.district,
            soil_color: self.soil_color,
        })
    }
}

/// Fertilizer request: the form plus the crop currently chosen in the override control.
#[derive(Debug, Clone, Deserialize)]
pub struct FertilizerRequest {
    #[serde(flatten)]
    pub form: FormInput,
    #[serde(default)]
    pub crop: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CropSelection {
    pub crop: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CropRecommendation {
    pub crop: String,
    pub guide_link: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FertilizerRecommendation {
    pub crop: String,
    pub fertilizer: String,
}

impl FertilizerRecommendation {
    pub fn message(&self) -> String {
        format!("For {}, the best fertilizer is {}", self.crop, self.fertilizer)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SelectField {
    pub key: &'static str,
    pub label: &'static str,
    pub options: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum FormField {
    Numeric(NumericField),
    Select(SelectField),
}

#[derive(Debug, Clone, Serialize)]
pub struct FormSection {
    pub header: &'static str,
    pub fields: Vec<FormField>,
}

/// Everything a front end needs to render the input form.
#[derive(Debug, Clone, Serialize)]
pub struct FormSchema {
    pub title: &'static str,
    pub description: &'static str,
    pub sections: Vec<FormSection>,
}
