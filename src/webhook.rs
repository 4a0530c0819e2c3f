//! MercadoPago payment notifications.
//!
//! Acknowledge-only: notifications are parsed and logged, nothing is verified or stored.
//! MercadoPago retries any non-2xx answer, so only a body we cannot read at all fails.

use axum::{
    Json,
    body::Bytes,
    extract::{Query, rejection::BytesRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::{IntoParams, ToSchema};

pub const WEBHOOK_PATH: &str = "/api/mercadopago/webhook";

const PAYMENT_TOPIC: &str = "payment";
const PROCESSING_ERROR: &str = "Error processing webhook";

/// Acknowledgement returned to the provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct WebhookAck {
    pub received: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct WebhookError {
    pub error: String,
}

/// WebhookQuery
///
/// Query-string notifications. Classic IPN sends `id` + `topic`; newer webhooks send
/// `data.id` + `type`.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct WebhookQuery {
    pub id: Option<String>,
    pub topic: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    #[serde(rename = "data.id")]
    pub data_id: Option<String>,
}

/// A recognized payment notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentNotification {
    pub payment_id: String,
    pub action: Option<String>,
}

impl WebhookQuery {
    pub fn payment_notification(&self) -> Option<PaymentNotification> {
        let topic = self.topic.as_deref().or(self.kind.as_deref());
        if topic != Some(PAYMENT_TOPIC) {
            return None;
        }

        self.data_id
            .as_deref()
            .or(self.id.as_deref())
            .filter(|id| !id.is_empty())
            .map(|id| PaymentNotification {
                payment_id: id.to_string(),
                action: None,
            })
    }
}

/// Extracts a payment notification from a JSON body. `data.id` may be a string or a number.
pub fn payment_notification(body: &Value) -> Option<PaymentNotification> {
    if body.get("type").and_then(Value::as_str) != Some(PAYMENT_TOPIC) {
        return None;
    }

    let payment_id = match body.pointer("/data/id")? {
        Value::String(id) if !id.is_empty() => id.clone(),
        Value::Number(id) => id.to_string(),
        _ => return None,
    };

    Some(PaymentNotification {
        payment_id,
        action: body.get("action").and_then(Value::as_str).map(str::to_string),
    })
}

fn acknowledge(notification: Option<PaymentNotification>) -> Response {
    match notification {
        Some(PaymentNotification { payment_id, action }) => {
            tracing::info!(
                payment_id = %payment_id,
                action = action.as_deref().unwrap_or("-"),
                "payment notification received"
            );
        }
        None => tracing::debug!("non-payment webhook notification acknowledged"),
    }

    (StatusCode::OK, Json(WebhookAck { received: true })).into_response()
}

/// receive_notification
///
/// [Public Route] JSON notification pushed by MercadoPago.
#[utoipa::path(
    post,
    path = "/api/mercadopago/webhook",
    request_body(content = String, content_type = "application/json"),
    responses(
        (status = 200, description = "Notification acknowledged", body = WebhookAck),
        (status = 500, description = "Unreadable notification", body = WebhookError)
    )
)]
pub async fn receive_notification(body: Result<Bytes, BytesRejection>) -> Response {
    let body = match body {
        Ok(body) => body,
        Err(e) => {
            tracing::error!(error = %e, "failed to read webhook body");
            return processing_error();
        }
    };

    match serde_json::from_slice::<Value>(&body) {
        Ok(notification) => acknowledge(payment_notification(&notification)),
        Err(e) => {
            tracing::error!(error = %e, "failed to parse webhook body");
            processing_error()
        }
    }
}

fn processing_error() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(WebhookError {
            error: PROCESSING_ERROR.to_string(),
        }),
    )
        .into_response()
}

/// receive_notification_query
///
/// [Public Route] Query-string notification (IPN style).
#[utoipa::path(
    get,
    path = "/api/mercadopago/webhook",
    params(WebhookQuery),
    responses((status = 200, description = "Notification acknowledged", body = WebhookAck))
)]
pub async fn receive_notification_query(Query(query): Query<WebhookQuery>) -> Response {
    acknowledge(query.payment_notification())
}
