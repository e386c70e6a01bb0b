//! # Cart Error Types
//!
//! Typed error handling for the foodies cart core.
//! All cart, order and backend operations return `Result<T, CartError>`.
//!
//! A failed payment is *not* an error: it is a terminal
//! [`VerificationState`](crate::payment::VerificationState).

use thiserror::Error;

/// Core error type for cart, order and backend operations
#[derive(Debug, Error)]
pub enum CartError {
    /// No cart line with a positive quantity
    #[error("Your cart is empty. Please add items to place an order.")]
    EmptyCart,

    /// At least one delivery field is blank (deliberately not named)
    #[error("Please fill in all the delivery information fields.")]
    IncompleteForm,

    /// Operation requires a session token and none is held
    #[error("No session token; please sign in first")]
    MissingToken,

    /// Standalone payment amount is zero, negative or unparsable
    #[error("Please enter a valid, positive amount")]
    InvalidAmount,

    /// Food id not present in the catalog
    #[error("Food not found: {food_id}")]
    FoodNotFound { food_id: String },

    /// Backend answered with a non-success status
    #[error("Backend error [{status}]: {message}")]
    Backend { status: u16, message: String },

    /// Transport failure talking to the backend
    #[error("Network error: {0}")]
    Network(String),

    /// Order submission failed (backend message when available)
    #[error("Failed to place order. {0}")]
    SubmissionFailed(String),

    /// The consuming view went away before the request finished
    #[error("Request cancelled")]
    Cancelled,

    /// Configuration errors (bad URL, unreadable pricing file)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl CartError {
    /// Returns true for errors raised before any network call was made
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            CartError::EmptyCart
                | CartError::IncompleteForm
                | CartError::MissingToken
                | CartError::InvalidAmount
        )
    }

    /// Returns true if retrying the same call may succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            CartError::Network(_) => true,
            CartError::Backend { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Message suitable for a shopper-facing notification.
    ///
    /// Backend errors surface the backend's own message rather than the status.
    pub fn user_message(&self) -> String {
        match self {
            CartError::Backend { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }

    /// Returns the HTTP status code appropriate for this error
    pub fn status_code(&self) -> u16 {
        match self {
            CartError::EmptyCart => 400,
            CartError::IncompleteForm => 422,
            CartError::MissingToken => 401,
            CartError::InvalidAmount => 400,
            CartError::FoodNotFound { .. } => 404,
            CartError::Backend { status, .. } if (400..500).contains(status) => *status,
            CartError::Backend { .. } => 502,
            CartError::Network(_) => 503,
            CartError::SubmissionFailed(_) => 502,
            CartError::Cancelled => 499,
            CartError::Configuration(_) => 500,
            CartError::Serialization(_) => 502,
        }
    }
}

/// Result type alias for cart operations
pub type CartResult<T> = Result<T, CartError>;
