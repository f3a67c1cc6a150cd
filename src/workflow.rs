//! Two-step recommendation flow for a single user session.
//!
//! A session starts in [`Phase::AwaitingCropRequest`]. A successful crop request moves it to
//! [`Phase::CropRecommended`] and seeds the override selection with the predicted crop. The
//! fertilizer request always runs against the *selected* crop, so an override fully replaces the
//! model's choice. A failed request never changes the predicted or selected crop.

use serde::Serialize;

use crate::error::{Stage, WorkflowError};
use crate::facade::InferenceFacade;
use crate::types::{CropRecommendation, FertilizerRecommendation, FieldObservation};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Phase {
    AwaitingCropRequest,
    CropRecommended,
    FertilizerRecommended,
}

/// Per-session recommendation state.
#[derive(Debug, Clone, Default)]
pub struct Session {
    predicted_crop: Option<String>,
    selected_crop: Option<String>,
    fertilizer: Option<FertilizerRecommendation>,
}

/// Render-ready snapshot of a session.
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub phase: Phase,
    pub predicted_crop: Option<String>,
    pub guide_link: Option<String>,
    pub selected_crop: Option<String>,
    /// Override choices; empty until a crop has been predicted.
    pub crop_options: Vec<String>,
    pub fertilizer: Option<FertilizerRecommendation>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> Phase {
        match (&self.predicted_crop, &self.fertilizer) {
            (None, _) => Phase::AwaitingCropRequest,
            (Some(_), None) => Phase::CropRecommended,
            (Some(_), Some(_)) => Phase::FertilizerRecommended,
        }
    }

    pub fn predicted_crop(&self) -> Option<&str> {
        self.predicted_crop.as_deref()
    }

    pub fn selected_crop(&self) -> Option<&str> {
        self.selected_crop.as_deref()
    }

    pub fn fertilizer(&self) -> Option<&FertilizerRecommendation> {
        self.fertilizer.as_ref()
    }

    fn require_selections(obs: &FieldObservation) -> Result<(), WorkflowError> {
        if obs.district.trim().is_empty() {
            return Err(WorkflowError::MissingSelection("district"));
        }
        if obs.soil_color.trim().is_empty() {
            return Err(WorkflowError::MissingSelection("soil color"));
        }
        Ok(())
    }

    /// Action 1. Allowed in any phase; a new prediction resets the override and drops any
    /// earlier fertilizer result.
    pub fn request_crop(
        &mut self,
        facade: &InferenceFacade,
        obs: &FieldObservation,
    ) -> Result<CropRecommendation, WorkflowError> {
        Self::require_selections(obs)?;
        let crop = facade
            .predict_crop(obs)
            .map_err(|source| WorkflowError::Prediction {
                stage: Stage::Crop,
                source,
            })?;

        self.predicted_crop = Some(crop.clone());
        self.selected_crop = Some(crop.clone());
        self.fertilizer = None;

        Ok(CropRecommendation {
            guide_link: facade.lookup_guide_link(&crop).map(str::to_string),
            crop,
        })
    }

    /// Override the crop used by the fertilizer step.
    pub fn select_crop(&mut self, facade: &InferenceFacade, crop: &str) -> Result<(), WorkflowError> {
        if self.predicted_crop.is_none() {
            return Err(WorkflowError::NoCropRecommended);
        }
        if !facade.is_known_crop(crop) {
            return Err(WorkflowError::UnknownCrop(crop.to_string()));
        }
        if self.selected_crop.as_deref() != Some(crop) {
            // a shown result must always belong to the selected crop
            self.fertilizer = None;
            self.selected_crop = Some(crop.to_string());
        }
        Ok(())
    }

    /// Action 2. `crop`, when given, is applied as an override first. Runs against the selected
    /// crop. A failed prediction drops any earlier fertilizer result (back to
    /// [`Phase::CropRecommended`]) but keeps the predicted and selected crops.
    pub fn request_fertilizer(
        &mut self,
        facade: &InferenceFacade,
        obs: &FieldObservation,
        crop: Option<&str>,
    ) -> Result<FertilizerRecommendation, WorkflowError> {
        if self.predicted_crop.is_none() {
            return Err(WorkflowError::NoCropRecommended);
        }
        Self::require_selections(obs)?;
        let final_crop = match crop {
            Some(c) if !facade.is_known_crop(c) => {
                return Err(WorkflowError::UnknownCrop(c.to_string()))
            }
            Some(c) => c.to_string(),
            None => self
                .selected_crop
                .clone()
                .ok_or(WorkflowError::MissingSelection("crop"))?,
        };

        let fertilizer = match facade.predict_fertilizer(obs, &final_crop) {
            Ok(f) => f,
            Err(source) => {
                self.fertilizer = None;
                return Err(WorkflowError::Prediction {
                    stage: Stage::Fertilizer,
                    source,
                });
            }
        };

        let rec = FertilizerRecommendation {
            crop: final_crop.clone(),
            fertilizer,
        };
        self.selected_crop = Some(final_crop);
        self.fertilizer = Some(rec.clone());
        Ok(rec)
    }

    /// Back to the initial phase.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn view(&self, facade: &InferenceFacade) -> SessionView {
        let guide_link = self
            .predicted_crop
            .as_deref()
            .and_then(|c| facade.lookup_guide_link(c))
            .map(str::to_string);
        let crop_options = if self.predicted_crop.is_some() {
            facade.crop_options().to_vec()
        } else {
            Vec::new()
        };
        SessionView {
            phase: self.phase(),
            predicted_crop: self.predicted_crop.clone(),
            guide_link,
            selected_crop: self.selected_crop.clone(),
            crop_options,
            fertilizer: self.fertilizer.clone(),
        }
    }
}
