//! HTTP front end.
//!
//! - `GET /health` → `{"status": "OK"}`
//! - `POST /predict` with `{"flights": [{"OPERA", "TIPOVUELO", "MES"}, ...]}`
//!   → `{"predict": [0 | 1, ...]}` in request order.
//!
//! Every flight is checked against the [`ReferenceValues`] before any
//! feature is built; one unknown value rejects the whole request with 400.

mod error;
pub mod validation;

pub use error::{ApiError, ErrorBody};
pub use validation::ReferenceValues;

use crate::model::DelayClassifier;
use crate::preprocessing::{FeatureBuilder, FlightRecord, Label};
use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// Shared, read-only state of the service.
#[derive(Debug)]
pub struct AppState {
    pub classifier: Arc<DelayClassifier>,
    pub references: ReferenceValues,
    pub features: FeatureBuilder,
}

impl AppState {
    pub fn new(classifier: Arc<DelayClassifier>, references: ReferenceValues) -> Self {
        Self {
            classifier,
            references,
            features: FeatureBuilder::new(),
        }
    }
}

/// One flight in a prediction request.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Flight {
    #[serde(rename = "OPERA")]
    pub airline: String,
    #[serde(rename = "TIPOVUELO")]
    pub flight_type: String,
    /// Signed so an out-of-range month reaches validation instead of
    /// failing deserialization.
    #[serde(rename = "MES")]
    pub month: i64,
}

/// A month outside `u32` becomes an absent month, which validation rejects.
impl From<Flight> for FlightRecord {
    fn from(flight: Flight) -> Self {
        FlightRecord {
            airline: Some(flight.airline),
            flight_type: Some(flight.flight_type),
            month: u32::try_from(flight.month).ok(),
            ..FlightRecord::default()
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct PredictRequest {
    pub flights: Vec<Flight>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct PredictResponse {
    pub predict: Vec<Label>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct HealthResponse {
    pub status: String,
}

/// Builds the router over shared state.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/predict", post(predict_handler))
        .with_state(state)
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "OK".to_string(),
    })
}

async fn predict_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<PredictRequest>,
) -> Result<Json<PredictResponse>, ApiError> {
    let records: Vec<FlightRecord> = request.flights.into_iter().map(Into::into).collect();
    state.references.validate(&records)?;

    let features = state.features.features(&records)?;
    let predict = state.classifier.predict(&features);
    debug!(flights = predict.len(), "served prediction");
    Ok(Json(PredictResponse { predict }))
}
