//! # Payment Verification
//!
//! Runs once when the shopper comes back from the payment provider. The
//! verifier fetches the order's payment status a single time and settles
//! into one terminal [`VerificationState`].
//!
//! ```text
//!   (no order id) ──► Abort
//!
//!   Loading ──COMPLETED──► clear cart, hydrate ──► Success
//!      │                          └──(fails)─────► Failed
//!      │
//!      ├────CANCELLED──────────────────────────► Cancelled
//!      ├────other status───────────────────────► Failed
//!      └────request error──────────────────────► Failed
//! ```

use crate::backend::BoxedBackend;
use crate::error::CartError;
use crate::payment::{
    PaymentStatus, VerificationState, MSG_NOT_COMPLETED, MSG_VERIFY_ERROR,
};
use crate::scope::ViewScope;
use crate::store::CartStore;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, error, info, instrument, warn};

/// Verifies a single returning payment
pub struct PaymentVerifier {
    backend: BoxedBackend,
    store: Arc<CartStore>,
    state: watch::Sender<VerificationState>,
    started: AtomicBool,
}

impl PaymentVerifier {
    /// Enter verification with the order id taken from the return navigation.
    ///
    /// An empty id is treated as absent.
    pub fn enter(backend: BoxedBackend, store: Arc<CartStore>, order_id: Option<String>) -> Self {
        let initial = match order_id.filter(|id| !id.trim().is_empty()) {
            Some(id) => VerificationState::loading(id),
            None => VerificationState::Abort,
        };
        Self {
            backend,
            store,
            state: watch::Sender::new(initial),
            started: AtomicBool::new(false),
        }
    }

    pub fn state(&self) -> VerificationState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<VerificationState> {
        self.state.subscribe()
    }

    /// Fetch the payment status and settle.
    ///
    /// Only the first call does any work; later calls return the current state.
    /// A cancelled scope leaves the verifier in `Loading`.
    #[instrument(skip(self, scope))]
    pub async fn resolve(&self, scope: &ViewScope) -> VerificationState {
        let order_id = match &*self.state.borrow() {
            VerificationState::Loading { order_id } => order_id.clone(),
            settled => return settled.clone(),
        };
        if self.started.swap(true, Ordering::SeqCst) {
            return self.state();
        }

        let Some(token) = self.store.token() else {
            warn!(%order_id, "No session token for payment verification");
            return self.settle(VerificationState::failed(&order_id, MSG_VERIFY_ERROR));
        };

        let response = match scope.run(self.backend.payment_status(&token, &order_id)).await {
            Ok(response) => response,
            Err(CartError::Cancelled) => {
                debug!(%order_id, "View left during verification");
                return self.state();
            }
            Err(e) => {
                error!(%order_id, "Payment status request failed: {}", e);
                return self.settle(VerificationState::failed(&order_id, MSG_VERIFY_ERROR));
            }
        };

        let next = match response.status() {
            PaymentStatus::Completed => match self.store.clear_after_payment(scope).await {
                Ok(()) => VerificationState::success(&order_id),
                Err(CartError::Cancelled) => {
                    debug!(%order_id, "View left while clearing the cart");
                    return self.state();
                }
                Err(e) => {
                    error!(%order_id, "Cart clear after payment failed: {}", e);
                    VerificationState::failed(&order_id, MSG_VERIFY_ERROR)
                }
            },
            PaymentStatus::Cancelled => VerificationState::cancelled(&order_id),
            other => {
                debug!(%order_id, status = ?other, "Payment not completed");
                VerificationState::failed(&order_id, MSG_NOT_COMPLETED)
            }
        };

        info!(%order_id, state = ?next, "Payment verified");
        self.settle(next)
    }

    fn settle(&self, next: VerificationState) -> VerificationState {
        self.state.send_replace(next.clone());
        next
    }
}
