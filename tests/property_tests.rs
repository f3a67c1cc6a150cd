//! Property-based tests for the inference facade
//!
//! For any in-range observation built from encoder domains, both predictions
//! decode to known labels and repeat exactly.

use std::path::Path;
use std::sync::OnceLock;

use proptest::prelude::*;

use agro_recommender::artifacts::load_facade;
use agro_recommender::types::{FieldObservation, FormInput};
use agro_recommender::InferenceFacade;

fn facade() -> &'static InferenceFacade {
    static FACADE: OnceLock<InferenceFacade> = OnceLock::new();
    FACADE.get_or_init(|| {
        let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("artifacts");
        load_facade(&dir).expect("sample artifacts should load")
    })
}

/// Strategy for in-range observations over the sample encoder domains
fn observation_strategy() -> impl Strategy<Value = FieldObservation> {
    let f = facade();
    (
        prop::sample::select(f.district_options().to_vec()),
        prop::sample::select(f.soil_color_options().to_vec()),
        0u32..=150,
        0u32..=100,
        0u32..=150,
        30u32..=90,
        0u32..=4000,
        0u32..=50,
    )
        .prop_map(|(district, soil_color, n, p, k, ph, rain, temp)| FieldObservation {
            district,
            soil_color,
            nitrogen: n as f64,
            phosphorus: p as f64,
            potassium: k as f64,
            ph: ph as f64 / 10.0,
            rainfall: rain as f64,
            temperature: temp as f64,
        })
}

proptest! {
    /// predict_crop always decodes to a crop the encoder knows
    #[test]
    fn crop_is_in_domain(obs in observation_strategy()) {
        let crop = facade().predict_crop(&obs).unwrap();
        prop_assert!(facade().crop_options().contains(&crop));
    }

    /// predict_crop has no hidden state
    #[test]
    fn crop_is_idempotent(obs in observation_strategy()) {
        prop_assert_eq!(facade().predict_crop(&obs), facade().predict_crop(&obs));
    }

    /// any known crop, predicted or chosen, yields a known fertilizer
    #[test]
    fn fertilizer_is_in_domain(
        obs in observation_strategy(),
        crop in prop::sample::select(facade().crop_options().to_vec()),
    ) {
        let fert = facade().predict_fertilizer(&obs, &crop).unwrap();
        prop_assert!(facade().fertilizer_options().contains(&fert));
    }

    /// boundary validation accepts exactly what the form allows
    #[test]
    fn generated_observations_pass_validation(obs in observation_strategy()) {
        let form = FormInput {
            district: obs.district.clone(),
            soil_color: obs.soil_color.clone(),
            nitrogen: obs.nitrogen,
            phosphorus: obs.phosphorus,
            potassium: obs.potassium,
            ph: obs.ph,
            rainfall: obs.rainfall,
            temperature: obs.temperature,
        };
        prop_assert_eq!(form.validate().unwrap(), obs);
    }
}
