use async_trait::async_trait;
use tracing::info;

use crate::error::ReminderError;
use crate::models::ReminderMessage;

/// Delivery channel for appointment reminders (SMS, WhatsApp, ...).
#[async_trait]
pub trait ReminderSender: Send + Sync {
    async fn send(&self, message: &ReminderMessage) -> Result<(), ReminderError>;
}

/// Logs the reminder instead of delivering it. Used when no channel is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSender;

#[async_trait]
impl ReminderSender for TracingSender {
    async fn send(&self, message: &ReminderMessage) -> Result<(), ReminderError> {
        info!(
            appointment_id = %message.appointment_id,
            tenant_id = %message.tenant_id,
            "Reminder for {} ({}) at {}: {}",
            message.client_name,
            message.phone,
            message.start_at,
            message.service_name
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use shared_models::tenant::TenantId;
    use uuid::Uuid;

    #[test]
    fn tracing_sender_always_accepts() {
        let message = ReminderMessage {
            appointment_id: Uuid::new_v4(),
            tenant_id: TenantId::new(),
            phone: "+5511988887777".to_string(),
            client_name: "Maria".to_string(),
            service_name: "Haircut".to_string(),
            start_at: Utc::now(),
        };
        assert!(tokio_test::block_on(TracingSender.send(&message)).is_ok());
    }
}
