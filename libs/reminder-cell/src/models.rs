use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use booking_cell::models::Appointment;
use shared_models::tenant::TenantId;

/// What a reminder carries to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReminderMessage {
    pub appointment_id: Uuid,
    pub tenant_id: TenantId,
    pub phone: String,
    pub client_name: String,
    pub service_name: String,
    pub start_at: DateTime<Utc>,
}

impl From<&Appointment> for ReminderMessage {
    fn from(appointment: &Appointment) -> Self {
        Self {
            appointment_id: appointment.id,
            tenant_id: appointment.tenant_id,
            phone: appointment.client_phone.clone(),
            client_name: appointment.client_name.clone(),
            service_name: appointment.service_name.clone(),
            start_at: appointment.start_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NoShowReport {
    pub cutoff: DateTime<Utc>,
    pub marked: u64,
}

/// Outcome counts of one reminder sweep across all tenants.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReminderReport {
    pub tenants: usize,
    pub candidates: usize,
    pub sent: usize,
    /// Another sweep claimed the appointment first.
    pub already_claimed: usize,
    pub invalid_phone: usize,
    pub failed: usize,
}
