//! # Payment Types
//!
//! Backend payment status and the verification state shown to a shopper
//! returning from the payment provider.

use serde::{Deserialize, Serialize};

pub const MSG_VERIFYING: &str = "Verifying Payment...";
pub const MSG_SUCCESS: &str = "Payment Successful!";
pub const MSG_CANCELLED: &str = "Payment Cancelled";
pub const MSG_NOT_COMPLETED: &str = "Your payment could not be completed.";
pub const MSG_VERIFY_ERROR: &str = "An error occurred while verifying your payment.";

/// Payment status string reported by the backend for an order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentStatus {
    Pending,
    Completed,
    Cancelled,
    Failed,
    Other(String),
}

impl PaymentStatus {
    /// Parse the backend's status string (exact, upper-case match)
    pub fn parse(raw: &str) -> Self {
        match raw {
            "PENDING" => PaymentStatus::Pending,
            "COMPLETED" => PaymentStatus::Completed,
            "CANCELLED" => PaymentStatus::Cancelled,
            "FAILED" => PaymentStatus::Failed,
            other => PaymentStatus::Other(other.to_string()),
        }
    }
}

/// Body of `GET /api/orders/payment/status/{orderId}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentStatusResponse {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub payment_status: Option<String>,
}

impl PaymentStatusResponse {
    pub fn status(&self) -> PaymentStatus {
        PaymentStatus::parse(self.payment_status.as_deref().unwrap_or_default())
    }
}

/// Payment verification state machine.
///
/// `Loading` moves to exactly one of the three terminal states. `Abort` is
/// the separate exit taken when the return navigation carried no order id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum VerificationState {
    Abort,
    #[serde(rename_all = "camelCase")]
    Loading { order_id: String },
    #[serde(rename_all = "camelCase")]
    Success { order_id: String, message: String },
    #[serde(rename_all = "camelCase")]
    Cancelled { order_id: String, message: String },
    #[serde(rename_all = "camelCase")]
    Failed { order_id: String, message: String },
}

impl VerificationState {
    pub fn loading(order_id: impl Into<String>) -> Self {
        VerificationState::Loading {
            order_id: order_id.into(),
        }
    }

    pub fn success(order_id: impl Into<String>) -> Self {
        VerificationState::Success {
            order_id: order_id.into(),
            message: MSG_SUCCESS.to_string(),
        }
    }

    pub fn cancelled(order_id: impl Into<String>) -> Self {
        VerificationState::Cancelled {
            order_id: order_id.into(),
            message: MSG_CANCELLED.to_string(),
        }
    }

    pub fn failed(order_id: impl Into<String>, message: impl Into<String>) -> Self {
        VerificationState::Failed {
            order_id: order_id.into(),
            message: message.into(),
        }
    }

    /// No outgoing transition (Abort included)
    pub fn is_terminal(&self) -> bool {
        !matches!(self, VerificationState::Loading { .. })
    }

    pub fn order_id(&self) -> Option<&str> {
        match self {
            VerificationState::Abort => None,
            VerificationState::Loading { order_id }
            | VerificationState::Success { order_id, .. }
            | VerificationState::Cancelled { order_id, .. }
            | VerificationState::Failed { order_id, .. } => Some(order_id),
        }
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            VerificationState::Abort => None,
            VerificationState::Loading { .. } => Some(MSG_VERIFYING),
            VerificationState::Success { message, .. }
            | VerificationState::Cancelled { message, .. }
            | VerificationState::Failed { message, .. } => Some(message),
        }
    }

    /// Display projection; `None` for `Abort`
    pub fn outcome(&self) -> Option<PaymentOutcome> {
        let state = match self {
            VerificationState::Abort => return None,
            VerificationState::Loading { .. } => PaymentState::Loading,
            VerificationState::Success { .. } => PaymentState::Success,
            VerificationState::Cancelled { .. } => PaymentState::Cancelled,
            VerificationState::Failed { .. } => PaymentState::Failed,
        };
        Some(PaymentOutcome {
            order_id: self.order_id().unwrap_or_default().to_string(),
            state,
            message: self.message().unwrap_or_default().to_string(),
        })
    }
}

/// Coarse outcome used by views
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentState {
    Loading,
    Success,
    Cancelled,
    Failed,
}

/// What a verification view renders; discarded once shown
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentOutcome {
    pub order_id: String,
    pub state: PaymentState,
    pub message: String,
}
