//! # API REST
//!
//! REST API implementation for the Clearwater referral backend.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON wire types, CORS, status-code mapping)
//!
//! Uses `api-shared` for wire types and `clearwater-core` for the domain
//! logic. Binaries build the [`AppState`] and mount [`build_router`].

use axum::{
    extract::{Path as AxumPath, State},
    http::StatusCode,
    response::Json,
    routing::{get, patch, post},
    Router,
};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use api_shared::{
    CreatePatientReq, CreatePatientRes, CreateReferralReq, CreateReferralRes, DashboardEntryRes,
    DashboardRes, HealthRes, HealthService, ListPatientsRes, ListReferralsRes, NotifyNoShowRes,
    PatientRes, ReferralRes, UpdateStatusReq, UpdateStatusRes,
};
use clearwater_core::{
    dashboard, risk, DashboardEntry, NewPatient, NewReferral, NotificationDispatcher, Patient,
    Referral, ReferralError, ReferralStatus, ReferralStore,
};

/// Application state shared across REST API handlers.
///
/// Holds the store gateway and the notification dispatcher; both are cheap
/// to clone via `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<ReferralStore>,
    pub dispatcher: Arc<NotificationDispatcher>,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        get_dashboard,
        list_patients,
        create_patient,
        list_referrals,
        create_referral,
        update_referral_status,
        notify_no_show,
    ),
    components(schemas(
        HealthRes,
        PatientRes,
        CreatePatientReq,
        CreatePatientRes,
        ListPatientsRes,
        ReferralRes,
        CreateReferralReq,
        CreateReferralRes,
        ListReferralsRes,
        UpdateStatusReq,
        UpdateStatusRes,
        DashboardEntryRes,
        DashboardRes,
        NotifyNoShowRes,
    ))
)]
struct ApiDoc;

/// Build the REST router with all endpoints and the Swagger UI mounted.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/dashboard", get(get_dashboard))
        .route("/patients", get(list_patients))
        .route("/patients", post(create_patient))
        .route("/referrals", get(list_referrals))
        .route("/referrals", post(create_referral))
        .route("/referrals/:id/status", patch(update_referral_status))
        .route("/referrals/:id/notify-no-show", post(notify_no_show))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for the REST API
///
/// Used for monitoring and load balancer health checks.
#[axum::debug_handler]
async fn health(State(_state): State<AppState>) -> Json<HealthRes> {
    Json(HealthService::check_health())
}

#[utoipa::path(
    get,
    path = "/dashboard",
    responses(
        (status = 200, description = "Ranked referral dashboard", body = DashboardRes),
        (status = 500, description = "Internal server error")
    )
)]
/// Triage dashboard
///
/// Joins every referral with its patient and returns the list ranked by
/// effective risk, missed appointments first. Referrals without a matching
/// patient record are omitted.
#[axum::debug_handler]
async fn get_dashboard(
    State(state): State<AppState>,
) -> Result<Json<DashboardRes>, (StatusCode, String)> {
    let joined = state
        .store
        .joined_referrals()
        .map_err(|e| map_error("Dashboard", e))?;
    let entries = dashboard::rank(joined)
        .into_iter()
        .map(dashboard_entry_res)
        .collect();
    Ok(Json(DashboardRes { entries }))
}

#[utoipa::path(
    get,
    path = "/patients",
    responses(
        (status = 200, description = "List of patients", body = ListPatientsRes),
        (status = 500, description = "Internal server error")
    )
)]
/// List all registered patients
#[axum::debug_handler]
async fn list_patients(
    State(state): State<AppState>,
) -> Result<Json<ListPatientsRes>, (StatusCode, String)> {
    let patients = state
        .store
        .list_patients()
        .map_err(|e| map_error("List patients", e))?
        .into_iter()
        .map(patient_res)
        .collect();
    Ok(Json(ListPatientsRes { patients }))
}

#[utoipa::path(
    post,
    path = "/patients",
    request_body = CreatePatientReq,
    responses(
        (status = 200, description = "Patient registered", body = CreatePatientRes),
        (status = 500, description = "Internal server error")
    )
)]
/// Register a new patient
///
/// The risk score is computed from the submitted medical history exactly
/// once, here; it is never recomputed afterwards.
#[axum::debug_handler]
async fn create_patient(
    State(state): State<AppState>,
    Json(req): Json<CreatePatientReq>,
) -> Result<Json<CreatePatientRes>, (StatusCode, String)> {
    let risk_score = risk::score_medical_history(&req.medical_history);
    let patient = state
        .store
        .create_patient(
            NewPatient {
                full_name: req.full_name,
                phone: req.phone,
                email: req.email,
                address: req.address,
                medical_history: req.medical_history,
            },
            risk_score,
        )
        .map_err(|e| map_error("Create patient", e))?;
    Ok(Json(CreatePatientRes {
        patient: patient_res(patient),
    }))
}

#[utoipa::path(
    get,
    path = "/referrals",
    responses(
        (status = 200, description = "List of referrals", body = ListReferralsRes),
        (status = 500, description = "Internal server error")
    )
)]
/// List all referrals
#[axum::debug_handler]
async fn list_referrals(
    State(state): State<AppState>,
) -> Result<Json<ListReferralsRes>, (StatusCode, String)> {
    let referrals = state
        .store
        .list_referrals()
        .map_err(|e| map_error("List referrals", e))?
        .into_iter()
        .map(referral_res)
        .collect();
    Ok(Json(ListReferralsRes { referrals }))
}

#[utoipa::path(
    post,
    path = "/referrals",
    request_body = CreateReferralReq,
    responses(
        (status = 200, description = "Referral created", body = CreateReferralRes),
        (status = 400, description = "Bad request"),
        (status = 404, description = "Patient not found"),
        (status = 500, description = "Internal server error")
    )
)]
/// Create a referral for an existing patient
///
/// New referrals start in `CREATED` status with the urgency flag off.
#[axum::debug_handler]
async fn create_referral(
    State(state): State<AppState>,
    Json(req): Json<CreateReferralReq>,
) -> Result<Json<CreateReferralRes>, (StatusCode, String)> {
    let appointment_date = req
        .appointment_date
        .as_deref()
        .map(parse_timestamp)
        .transpose()?;

    let referral = state
        .store
        .create_referral(NewReferral {
            patient_id: req.patient_id,
            specialty: req.specialty,
            priority: req.priority,
            requires_transport: req.requires_transport,
            appointment_date,
            notes: req.notes,
        })
        .map_err(|e| map_error("Create referral", e))?;
    Ok(Json(CreateReferralRes {
        referral: referral_res(referral),
    }))
}

#[utoipa::path(
    patch,
    path = "/referrals/{id}/status",
    request_body = UpdateStatusReq,
    responses(
        (status = 200, description = "Status updated", body = UpdateStatusRes),
        (status = 400, description = "Unknown status value"),
        (status = 404, description = "Referral not found"),
        (status = 500, description = "Internal server error")
    )
)]
/// Apply a status transition to a referral
///
/// A transition into `NO_SHOW` or `MISSED` forces the urgency flag on; it is
/// never cleared automatically.
#[axum::debug_handler]
async fn update_referral_status(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
    Json(req): Json<UpdateStatusReq>,
) -> Result<Json<UpdateStatusRes>, (StatusCode, String)> {
    let Some(new_status) = ReferralStatus::from_wire(&req.status) else {
        return Err((
            StatusCode::BAD_REQUEST,
            format!("unknown referral status: {}", req.status),
        ));
    };

    let referral = state
        .store
        .update_referral_status(&id, new_status)
        .map_err(|e| map_error("Update referral status", e))?;
    Ok(Json(UpdateStatusRes {
        id: referral.id,
        status: referral.status.as_wire().to_string(),
        is_urgent: referral.is_urgent,
    }))
}

#[utoipa::path(
    post,
    path = "/referrals/{id}/notify-no-show",
    responses(
        (status = 200, description = "Notifications enqueued", body = NotifyNoShowRes),
        (status = 400, description = "Patient has no email address"),
        (status = 404, description = "Referral or patient not found"),
        (status = 500, description = "Internal server error")
    )
)]
/// Trigger the no-show notification for a referral
///
/// Responds as soon as the messages are on the delivery queue; delivery
/// itself is fire-and-forget and any failure is only logged.
#[axum::debug_handler]
async fn notify_no_show(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
) -> Result<Json<NotifyNoShowRes>, (StatusCode, String)> {
    let queued = state
        .dispatcher
        .notify_no_show(&id)
        .map_err(|e| map_error("Notify no-show", e))?;
    Ok(Json(NotifyNoShowRes {
        ok: true,
        queued: queued as u32,
    }))
}

// Helper functions

fn map_error(context: &str, err: ReferralError) -> (StatusCode, String) {
    match err {
        e @ ReferralError::NotFound { .. } => (StatusCode::NOT_FOUND, e.to_string()),
        e @ ReferralError::BadRequest(_) => (StatusCode::BAD_REQUEST, e.to_string()),
        e => {
            tracing::error!("{context} error: {e:?}");
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal error".to_string())
        }
    }
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, (StatusCode, String)> {
    raw.parse::<DateTime<Utc>>().map_err(|_| {
        (
            StatusCode::BAD_REQUEST,
            format!("invalid RFC 3339 timestamp: {raw}"),
        )
    })
}

fn patient_res(patient: Patient) -> PatientRes {
    PatientRes {
        id: patient.id,
        full_name: patient.full_name,
        risk_score: patient.risk_score,
        phone: patient.phone,
        email: patient.email,
        address: patient.address,
        medical_history: patient.medical_history,
        created_at: patient.created_at.to_rfc3339(),
    }
}

fn referral_res(referral: Referral) -> ReferralRes {
    ReferralRes {
        id: referral.id,
        patient_id: referral.patient_id,
        specialty: referral.specialty,
        status: referral.status.as_wire().to_string(),
        priority: referral.priority,
        is_urgent: referral.is_urgent,
        requires_transport: referral.requires_transport,
        appointment_date: referral.appointment_date.map(|d| d.to_rfc3339()),
        notes: referral.notes,
        created_at: referral.created_at.to_rfc3339(),
        updated_at: referral.updated_at.to_rfc3339(),
    }
}

fn dashboard_entry_res(entry: DashboardEntry) -> DashboardEntryRes {
    DashboardEntryRes {
        referral_id: entry.referral_id,
        patient_id: entry.patient_id,
        patient_name: entry.patient_name,
        specialty: entry.specialty,
        status: entry.status.as_wire().to_string(),
        priority: entry.priority,
        is_urgent: entry.is_urgent,
        requires_transport: entry.requires_transport,
        appointment_date: entry.appointment_date.map(|d| d.to_rfc3339()),
        notes: entry.notes,
        effective_risk: entry.effective_risk,
    }
}
