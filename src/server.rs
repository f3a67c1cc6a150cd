use axum::{
    extract::{rejection::JsonRejection, FromRequest, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{InputError, WorkflowError};
use crate::facade::InferenceFacade;
use crate::session::SessionStore;
use crate::types::{
    CropRecommendation, CropSelection, FertilizerRecommendation, FertilizerRequest, FormField,
    FormInput, FormSchema, FormSection, SelectField, NITROGEN, PH, PHOSPHORUS, POTASSIUM,
    RAINFALL, TEMPERATURE,
};
use crate::workflow::{Session, SessionView};

// ---------- Server state ----------

#[derive(Clone)]
pub struct AppState {
    pub facade: Arc<InferenceFacade>,
    pub sessions: Arc<SessionStore>,
}

impl AppState {
    pub fn new(facade: InferenceFacade) -> Self {
        Self::with_sessions(facade, SessionStore::default())
    }

    pub fn with_sessions(facade: InferenceFacade, sessions: SessionStore) -> Self {
        Self {
            facade: Arc::new(facade),
            sessions: Arc::new(sessions),
        }
    }

    fn session(&self, id: Uuid) -> Result<Arc<Mutex<Session>>, ApiError> {
        self.sessions.get(&id).ok_or(ApiError::UnknownSession(id))
    }
}

// ---------- Errors ----------

#[derive(Debug)]
pub enum ApiError {
    UnknownSession(Uuid),
    Body(JsonRejection),
    Input(InputError),
    Workflow(WorkflowError),
}

impl From<JsonRejection> for ApiError {
    fn from(e: JsonRejection) -> Self {
        ApiError::Body(e)
    }
}

impl From<InputError> for ApiError {
    fn from(e: InputError) -> Self {
        ApiError::Input(e)
    }
}

impl From<WorkflowError> for ApiError {
    fn from(e: WorkflowError) -> Self {
        ApiError::Workflow(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, msg) = match &self {
            ApiError::UnknownSession(id) => (StatusCode::NOT_FOUND, format!("unknown session {}", id)),
            ApiError::Body(e) => (e.status(), e.body_text()),
            ApiError::Input(e) => (StatusCode::UNPROCESSABLE_ENTITY, e.to_string()),
            ApiError::Workflow(e) => {
                let status = match e {
                    WorkflowError::NoCropRecommended => StatusCode::CONFLICT,
                    WorkflowError::MissingSelection(_) | WorkflowError::UnknownCrop(_) => {
                        StatusCode::UNPROCESSABLE_ENTITY
                    }
                    WorkflowError::Prediction { .. } => StatusCode::INTERNAL_SERVER_ERROR,
                };
                (status, e.to_string())
            }
        };
        (status, Json(json!({ "error": msg }))).into_response()
    }
}

// ---------- Extractors ----------

/// `Json` whose rejections come back as the usual `{"error": ...}` body.
#[derive(FromRequest)]
#[from_request(via(Json), rejection(ApiError))]
struct AppJson<T>(T);

// ---------- Response types ----------

#[derive(Serialize)]
struct Created {
    id: Uuid,
    #[serde(flatten)]
    view: SessionView,
}

#[derive(Serialize)]
struct FertilizerOut {
    #[serde(flatten)]
    rec: FertilizerRecommendation,
    message: String,
}

// ---------- Handlers ----------

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn form(State(state): State<AppState>) -> Json<FormSchema> {
    Json(form_schema(&state.facade))
}

pub fn form_schema(facade: &InferenceFacade) -> FormSchema {
    FormSchema {
        title: "Advanced Crop & Fertilizer Recommendation System",
        description: "Enter your field's details to receive a tailored crop and fertilizer recommendation.",
        sections: vec![
            FormSection {
                header: "Soil & Environment",
                fields: vec![
                    FormField::Numeric(NITROGEN),
                    FormField::Numeric(PHOSPHORUS),
                    FormField::Numeric(POTASSIUM),
                ],
            },
            FormSection {
                header: "Climate",
                fields: vec![
                    FormField::Numeric(PH),
                    FormField::Numeric(RAINFALL),
                    FormField::Numeric(TEMPERATURE),
                ],
            },
            FormSection {
                header: "Location",
                fields: vec![
                    FormField::Select(SelectField {
                        key: "district",
                        label: "District Name",
                        options: facade.district_options().to_vec(),
                    }),
                    FormField::Select(SelectField {
                        key: "soil_color",
                        label: "Soil Color",
                        options: facade.soil_color_options().to_vec(),
                    }),
                ],
            },
        ],
    }
}

async fn create_session(State(state): State<AppState>) -> (StatusCode, Json<Created>) {
    let id = state.sessions.create();
    tracing::info!("session {} created ({} live)", id, state.sessions.live_count());
    let view = Session::new().view(&state.facade);
    (StatusCode::CREATED, Json(Created { id, view }))
}

async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, ApiError> {
    let session = state.session(id)?;
    let view = session.lock().view(&state.facade);
    Ok(Json(view))
}

async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    if state.sessions.remove(&id) {
        tracing::info!("session {} closed", id);
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::UnknownSession(id))
    }
}

async fn recommend_crop(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    AppJson(payload): AppJson<FormInput>,
) -> Result<Json<CropRecommendation>, ApiError> {
    let session = state.session(id)?;
    let obs = payload.validate()?;
    let result = session.lock().request_crop(&state.facade, &obs);
    match result {
        Ok(rec) => {
            tracing::info!(
                "session {} crop={} district={} soil={}",
                id,
                rec.crop,
                obs.district,
                obs.soil_color
            );
            Ok(Json(rec))
        }
        Err(e) => {
            log_rejection(id, &e);
            Err(e.into())
        }
    }
}

async fn select_crop(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    AppJson(payload): AppJson<CropSelection>,
) -> Result<Json<SessionView>, ApiError> {
    let session = state.session(id)?;
    let mut guard = session.lock();
    if let Err(e) = guard.select_crop(&state.facade, &payload.crop) {
        log_rejection(id, &e);
        return Err(e.into());
    }
    Ok(Json(guard.view(&state.facade)))
}

async fn recommend_fertilizer(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    AppJson(payload): AppJson<FertilizerRequest>,
) -> Result<Json<FertilizerOut>, ApiError> {
    let session = state.session(id)?;
    let obs = payload.form.validate()?;
    let result = session
        .lock()
        .request_fertilizer(&state.facade, &obs, payload.crop.as_deref());
    match result {
        Ok(rec) => {
            tracing::info!("session {} crop={} fertilizer={}", id, rec.crop, rec.fertilizer);
            let message = rec.message();
            Ok(Json(FertilizerOut { rec, message }))
        }
        Err(e) => {
            log_rejection(id, &e);
            Err(e.into())
        }
    }
}

async fn reset_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, ApiError> {
    let session = state.session(id)?;
    let mut guard = session.lock();
    guard.reset();
    Ok(Json(guard.view(&state.facade)))
}

fn log_rejection(id: Uuid, e: &WorkflowError) {
    match e {
        WorkflowError::Prediction { .. } => tracing::error!("session {}: {}", id, e),
        _ => tracing::warn!("session {}: {}", id, e),
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/form", get(form))
        .route("/api/sessions", post(create_session))
        .route("/api/sessions/:id", get(get_session).delete(delete_session))
        .route("/api/sessions/:id/crop", post(recommend_crop))
        .route("/api/sessions/:id/selection", put(select_crop))
        .route("/api/sessions/:id/fertilizer", post(recommend_fertilizer))
        .route("/api/sessions/:id/reset", post(reset_session))
        .with_state(state)
}
