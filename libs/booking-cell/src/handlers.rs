// libs/booking-cell/src/handlers.rs
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_models::error::AppError;
use shared_utils::extractor::TenantContext;

use crate::models::{
    AvailabilityQuery, CommissionLookupQuery, CreateAppointmentRequest, RescheduleAppointmentRequest,
    SlotQuery, UpdateStatusRequest, UpsertCommissionRequest,
};
use crate::router::BookingState;

// ==============================================================================
// APPOINTMENT HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn create_appointment(
    State(state): State<BookingState>,
    TenantContext(tenant_id): TenantContext,
    Json(request): Json<CreateAppointmentRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let appointment = state.lifecycle.create_appointment(tenant_id, request).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "appointment": appointment,
            "message": "Appointment booked successfully"
        })),
    ))
}

#[axum::debug_handler]
pub async fn get_appointment(
    State(state): State<BookingState>,
    TenantContext(tenant_id): TenantContext,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let appointment = state.lifecycle.get_appointment(tenant_id, appointment_id).await?;
    Ok(Json(json!(appointment)))
}

#[axum::debug_handler]
pub async fn reschedule_appointment(
    State(state): State<BookingState>,
    TenantContext(tenant_id): TenantContext,
    Path(appointment_id): Path<Uuid>,
    Json(request): Json<RescheduleAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let appointment = state
        .lifecycle
        .reschedule_appointment(tenant_id, appointment_id, request)
        .await?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
        "message": "Appointment rescheduled successfully"
    })))
}

#[axum::debug_handler]
pub async fn update_appointment_status(
    State(state): State<BookingState>,
    TenantContext(tenant_id): TenantContext,
    Path(appointment_id): Path<Uuid>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<Json<Value>, AppError> {
    let appointment = state
        .lifecycle
        .update_status(tenant_id, appointment_id, request.status)
        .await?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment
    })))
}

#[axum::debug_handler]
pub async fn cancel_appointment(
    State(state): State<BookingState>,
    TenantContext(tenant_id): TenantContext,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let appointment = state.lifecycle.cancel_appointment(tenant_id, appointment_id).await?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
        "message": "Appointment cancelled"
    })))
}

// ==============================================================================
// AVAILABILITY HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn get_day_availability(
    State(state): State<BookingState>,
    TenantContext(tenant_id): TenantContext,
    Path(provider_id): Path<Uuid>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<Value>, AppError> {
    let intervals = state
        .availability
        .day_availability(tenant_id, provider_id, query.date)
        .await?;

    Ok(Json(json!({
        "providerId": provider_id,
        "date": query.date,
        "intervals": intervals
    })))
}

#[axum::debug_handler]
pub async fn get_bookable_slots(
    State(state): State<BookingState>,
    TenantContext(tenant_id): TenantContext,
    Path(provider_id): Path<Uuid>,
    Query(query): Query<SlotQuery>,
) -> Result<Json<Value>, AppError> {
    let slots = state
        .availability
        .bookable_slots(tenant_id, provider_id, query.service_id, query.date, query.step_minutes)
        .await?;

    Ok(Json(json!({
        "providerId": provider_id,
        "serviceId": query.service_id,
        "date": query.date,
        "slots": slots
    })))
}

// ==============================================================================
// COMMISSION HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn get_commission(
    State(state): State<BookingState>,
    TenantContext(tenant_id): TenantContext,
    Path(provider_id): Path<Uuid>,
    Query(query): Query<CommissionLookupQuery>,
) -> Result<Json<Value>, AppError> {
    let resolved = state
        .commissions
        .lookup(tenant_id, provider_id, query.service_id)
        .await?;
    Ok(Json(json!(resolved)))
}

#[axum::debug_handler]
pub async fn upsert_commission(
    State(state): State<BookingState>,
    TenantContext(tenant_id): TenantContext,
    Path(provider_id): Path<Uuid>,
    Json(request): Json<UpsertCommissionRequest>,
) -> Result<Json<Value>, AppError> {
    let rule = state
        .commissions
        .upsert_rule(tenant_id, provider_id, request)
        .await?;

    Ok(Json(json!({
        "success": true,
        "rule": rule
    })))
}
