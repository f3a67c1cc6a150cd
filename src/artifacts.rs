use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::encoder::{CategoryEncoder, EncoderJson};
use crate::error::StartupError;
use crate::facade::{InferenceFacade, CROP_FEATURES, FERTILIZER_FEATURES};
use crate::model::{Classifier, ForestJson, TreeEnsemble};

pub const CROP_MODEL: &str = "crop_prediction_model.json";
pub const FERTILIZER_MODEL: &str = "fertilizer_prediction_model.json";
pub const DISTRICT_ENCODER: &str = "district_name_encoder.json";
pub const SOIL_ENCODER: &str = "soil_color_encoder.json";
pub const CROP_ENCODER: &str = "crop_encoder.json";
pub const FERTILIZER_ENCODER: &str = "fertilizer_encoder.json";
pub const LINK_MAPPING: &str = "crop_to_link_mapping.json";

/// All artifacts the service needs, in load order.
pub const REQUIRED: [&str; 7] = [
    CROP_MODEL,
    FERTILIZER_MODEL,
    DISTRICT_ENCODER,
    SOIL_ENCODER,
    CROP_ENCODER,
    FERTILIZER_ENCODER,
    LINK_MAPPING,
];

fn read_json<T: DeserializeOwned>(dir: &Path, name: &'static str) -> Result<T, StartupError> {
    let path = dir.join(name);
    let txt = fs::read_to_string(&path).map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            StartupError::MissingArtifact { name, path: path.clone() }
        } else {
            StartupError::UnreadableArtifact {
                name,
                path: path.clone(),
                source,
            }
        }
    })?;
    serde_json::from_str(&txt).map_err(|source| StartupError::CorruptArtifact { name, source })
}

fn load_encoder(
    dir: &Path,
    name: &'static str,
    field: &'static str,
) -> Result<CategoryEncoder, StartupError> {
    let raw: EncoderJson = read_json(dir, name)?;
    CategoryEncoder::new(field, raw.classes)
        .map_err(|reason| StartupError::InvalidArtifact { name, reason })
}

fn load_model(
    dir: &Path,
    name: &'static str,
    n_features: usize,
    target: &CategoryEncoder,
) -> Result<TreeEnsemble, StartupError> {
    let raw: ForestJson = read_json(dir, name)?;
    let model = TreeEnsemble::new(raw.n_features, raw.classes, raw.trees).map_err(|e| {
        StartupError::InvalidArtifact {
            name,
            reason: e.to_string(),
        }
    })?;
    check_model(name, &model, n_features, target)?;
    Ok(model)
}

/// A model must take the expected feature count and only emit codes its target encoder can decode.
pub fn check_model(
    name: &'static str,
    model: &dyn Classifier,
    n_features: usize,
    target: &CategoryEncoder,
) -> Result<(), StartupError> {
    if model.n_features() != n_features {
        return Err(StartupError::InvalidArtifact {
            name,
            reason: format!(
                "model takes {} features, expected {}",
                model.n_features(),
                n_features
            ),
        });
    }
    if let Some(code) = model.classes().iter().find(|&&c| target.decode(c).is_err()) {
        return Err(StartupError::InvalidArtifact {
            name,
            reason: format!(
                "class code {} is not in the {} encoder ({} classes)",
                code,
                target.field(),
                target.class_count()
            ),
        });
    }
    Ok(())
}

/// Loads every artifact from `dir`. The first failure aborts with the artifact named.
pub fn load_facade(dir: &Path) -> Result<InferenceFacade, StartupError> {
    let districts = load_encoder(dir, DISTRICT_ENCODER, "district")?;
    let soil_colors = load_encoder(dir, SOIL_ENCODER, "soil color")?;
    let crops = load_encoder(dir, CROP_ENCODER, "crop")?;
    let fertilizers = load_encoder(dir, FERTILIZER_ENCODER, "fertilizer")?;

    let crop_model = load_model(dir, CROP_MODEL, CROP_FEATURES, &crops)?;
    let fertilizer_model = load_model(dir, FERTILIZER_MODEL, FERTILIZER_FEATURES, &fertilizers)?;

    let links: HashMap<String, String> = read_json(dir, LINK_MAPPING)?;
    if let Some(crop) = links.keys().find(|c| !crops.contains(c.as_str())) {
        tracing::warn!("guide link for unknown crop `{}` will never be shown", crop);
    }

    tracing::info!(
        "loaded artifacts from {}: {} districts, {} soil colors, {} crops, {} fertilizers, {} guide links",
        dir.display(),
        districts.class_count(),
        soil_colors.class_count(),
        crops.class_count(),
        fertilizers.class_count(),
        links.len()
    );

    Ok(InferenceFacade::new(
        Box::new(crop_model),
        Box::new(fertilizer_model),
        districts,
        soil_colors,
        crops,
        fertilizers,
        links,
    ))
}
