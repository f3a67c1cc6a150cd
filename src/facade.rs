use std::collections::HashMap;

use crate::encoder::CategoryEncoder;
use crate::error::PredictionError;
use crate::model::Classifier;
use crate::types::FieldObservation;

/// Number of features the crop model consumes; the fertilizer model takes one more (the crop).
pub const CROP_FEATURES: usize = 8;
pub const FERTILIZER_FEATURES: usize = CROP_FEATURES + 1;

/// Read-only bundle of everything loaded at startup. Shared by all sessions.
pub struct InferenceFacade {
    crop_model: Box<dyn Classifier>,
    fertilizer_model: Box<dyn Classifier>,
    districts: CategoryEncoder,
    soil_colors: CategoryEncoder,
    crops: CategoryEncoder,
    fertilizers: CategoryEncoder,
    guide_links: HashMap<String, String>,
    log_features: bool,
}

impl InferenceFacade {
    pub fn new(
        crop_model: Box<dyn Classifier>,
        fertilizer_model: Box<dyn Classifier>,
        districts: CategoryEncoder,
        soil_colors: CategoryEncoder,
        crops: CategoryEncoder,
        fertilizers: CategoryEncoder,
        guide_links: HashMap<String, String>,
    ) -> Self {
        Self {
            crop_model,
            fertilizer_model,
            districts,
            soil_colors,
            crops,
            fertilizers,
            guide_links,
            log_features: false,
        }
    }

    /// Log every assembled feature vector at info level.
    pub fn with_feature_logging(mut self, on: bool) -> Self {
        self.log_features = on;
        self
    }

    fn base_features(&self, obs: &FieldObservation) -> Result<Vec<f64>, PredictionError> {
        let mut x = Vec::with_capacity(FERTILIZER_FEATURES);
        x.push(self.districts.encode(&obs.district)? as f64);
        x.push(self.soil_colors.encode(&obs.soil_color)? as f64);
        x.extend_from_slice(&obs.measurements());
        Ok(x)
    }

    fn trace_features(&self, stage: &str, x: &[f64]) {
        if self.log_features {
            tracing::info!("{} features in_dim={} x={:?}", stage, x.len(), x);
        } else {
            tracing::debug!("{} features x={:?}", stage, x);
        }
    }

    /// `[district, soil, N, P, K, pH, rainfall, temperature]` -> crop label.
    pub fn predict_crop(&self, obs: &FieldObservation) -> Result<String, PredictionError> {
        let x = self.base_features(obs)?;
        self.trace_features("crop", &x);
        let code = self.crop_model.predict(&x)?;
        Ok(self.crops.decode(code)?.to_string())
    }

    /// Same as [`predict_crop`](Self::predict_crop) with the encoded crop as ninth feature.
    pub fn predict_fertilizer(
        &self,
        obs: &FieldObservation,
        crop: &str,
    ) -> Result<String, PredictionError> {
        let mut x = self.base_features(obs)?;
        x.push(self.crops.encode(crop)? as f64);
        self.trace_features("fertilizer", &x);
        let code = self.fertilizer_model.predict(&x)?;
        Ok(self.fertilizers.decode(code)?.to_string())
    }

    pub fn lookup_guide_link(&self, crop: &str) -> Option<&str> {
        self.guide_links.get(crop).map(String::as_str)
    }

    pub fn is_known_crop(&self, crop: &str) -> bool {
        self.crops.contains(crop)
    }

    pub fn district_options(&self) -> &[String] {
        self.districts.classes()
    }

    pub fn soil_color_options(&self) -> &[String] {
        self.soil_colors.classes()
    }

    pub fn crop_options(&self) -> &[String] {
        self.crops.classes()
    }

    pub fn fertilizer_options(&self) -> &[String] {
        self.fertilizers.classes()
    }
}
