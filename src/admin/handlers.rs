use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::admin::AdminState;
use crate::dashboard::{DashboardSnapshot, EntityKind};
use crate::detector::{AlertState, AlertView};
use crate::recovery::{IssuedTicket, RecoveryOutcome, RecoveryPrompt};

type ApiError = (StatusCode, String);

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub detector_active: bool,
    pub alert: AlertView,
}

#[derive(Debug, Deserialize)]
pub struct RecordUpdates {
    pub ids: Vec<String>,
}

#[derive(Serialize)]
pub struct RecordedUpdates {
    pub added: usize,
    pub dashboard: DashboardSnapshot,
}

#[derive(Serialize)]
pub struct RecoveryResult {
    pub outcome: RecoveryOutcome,
    pub error_count: u32,
}

pub async fn get_status(State(state): State<AdminState>) -> Json<SystemStatus> {
    let alert = state.detector.view();
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: match alert.state {
            AlertState::Quiet => "operational",
            AlertState::Alerting => "alerting",
        },
        detector_active: state.detector.is_active(),
        alert,
    })
}

pub async fn get_alert(State(state): State<AdminState>) -> Json<AlertView> {
    Json(state.detector.view())
}

pub async fn get_dashboard(State(state): State<AdminState>) -> Json<DashboardSnapshot> {
    Json(state.dashboard.snapshot())
}

pub async fn clear_cache(State(state): State<AdminState>) -> Json<DashboardSnapshot> {
    Json(state.dashboard.clear_all_cache())
}

pub async fn clear_collection(
    State(state): State<AdminState>,
    Path(collection): Path<String>,
) -> Result<Json<DashboardSnapshot>, ApiError> {
    state
        .dashboard
        .clear_collection_cache(&collection)
        .map(Json)
        .map_err(|e| (StatusCode::NOT_FOUND, e.to_string()))
}

pub async fn record_updates(
    State(state): State<AdminState>,
    Path(kind): Path<String>,
    Json(body): Json<RecordUpdates>,
) -> Result<Json<RecordedUpdates>, ApiError> {
    let kind: EntityKind = kind.parse().map_err(|e| (StatusCode::BAD_REQUEST, e))?;
    let added = state.realtime.record(kind, body.ids);
    Ok(Json(RecordedUpdates {
        added,
        dashboard: state.dashboard.snapshot(),
    }))
}

pub async fn acknowledge_updates(State(state): State<AdminState>) -> Json<DashboardSnapshot> {
    Json(state.dashboard.acknowledge_updates())
}

pub async fn issue_recovery_ticket(State(state): State<AdminState>) -> Json<IssuedTicket> {
    let prompt = RecoveryPrompt {
        error_count: state.detector.view().error_count,
    };
    let issued = state.tickets.issue(prompt);
    tracing::info!(
        ticket = %issued.ticket,
        error_count = prompt.error_count,
        "Recovery ticket issued"
    );
    Json(issued)
}

pub async fn redeem_recovery_ticket(
    State(state): State<AdminState>,
    Path(ticket): Path<Uuid>,
) -> Result<Json<RecoveryResult>, ApiError> {
    let confirmed = state
        .tickets
        .redeem(ticket)
        .map_err(|e| (StatusCode::CONFLICT, e.to_string()))?;

    let outcome = state
        .detector
        .recover(&confirmed)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("recovery failed: {e}")))?;

    let disclosed = confirmed.prompt().error_count;
    if outcome == RecoveryOutcome::Declined {
        // The ticket is spent; the caller must look at the new count first.
        return Err((
            StatusCode::CONFLICT,
            format!(
                "error count changed from {disclosed} to {}, request a new recovery ticket",
                state.detector.view().error_count
            ),
        ));
    }

    Ok(Json(RecoveryResult {
        outcome,
        error_count: disclosed,
    }))
}
