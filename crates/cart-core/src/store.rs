//! # Cart Store
//!
//! The single writer of a session's cart. Mutations are applied locally
//! first so observers see them immediately, then confirmed with the backend.
//!
//! Each mutation is a [`CartCommand`] that knows its compensation. Whenever the
//! paired backend call does not complete, the compensation is applied locally.
//! Failures are handed back as a non-fatal notification.
//!
//! Backend calls for one food id run one at a time, in arrival order. Local
//! deltas commute, so overlapping increase/decrease calls never lose an update.

use crate::backend::{BoxedBackend, SessionToken};
use crate::cart::{Cart, CartLine};
use crate::error::CartResult;
use crate::scope::ViewScope;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use tokio::sync::{watch, Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::{debug, info, instrument, warn};

/// A single-unit cart mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartCommand {
    AddOne,
    RemoveOne,
}

impl CartCommand {
    fn delta(self) -> i64 {
        match self {
            CartCommand::AddOne => 1,
            CartCommand::RemoveOne => -1,
        }
    }

    /// The command that undoes this one
    pub fn compensation(self) -> CartCommand {
        match self {
            CartCommand::AddOne => CartCommand::RemoveOne,
            CartCommand::RemoveOne => CartCommand::AddOne,
        }
    }
}

/// Shared cart state for one shopper session
pub struct CartStore {
    backend: BoxedBackend,
    token: RwLock<Option<SessionToken>>,
    cart: watch::Sender<Cart>,
    item_queues: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl CartStore {
    /// Create an empty store. Anonymous until a token is set or hydrated.
    pub fn new(backend: BoxedBackend) -> Self {
        Self {
            backend,
            token: RwLock::new(None),
            cart: watch::Sender::new(Cart::new()),
            item_queues: Mutex::new(HashMap::new()),
        }
    }

    /// Create an empty store that already holds a session token
    pub fn with_token(backend: BoxedBackend, token: SessionToken) -> Self {
        let store = Self::new(backend);
        store.set_token(Some(token));
        store
    }

    // =========================================================================
    // Reads
    // =========================================================================

    pub fn token(&self) -> Option<SessionToken> {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn set_token(&self, token: Option<SessionToken>) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = token;
    }

    /// Current cart contents
    pub fn snapshot(&self) -> Cart {
        self.cart.borrow().clone()
    }

    pub fn quantity(&self, food_id: &str) -> u32 {
        self.cart.borrow().quantity(food_id)
    }

    pub fn lines(&self) -> Vec<CartLine> {
        self.cart.borrow().lines()
    }

    pub fn item_count(&self) -> u32 {
        self.cart.borrow().item_count()
    }

    /// Observe every local change
    pub fn subscribe(&self) -> watch::Receiver<Cart> {
        self.cart.subscribe()
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Add one unit locally, then on the backend
    #[instrument(skip(self, scope))]
    pub async fn increase(&self, food_id: &str, scope: &ViewScope) -> CartResult<()> {
        self.dispatch(food_id, CartCommand::AddOne, scope).await
    }

    /// Remove one unit locally (floored at zero), then on the backend
    #[instrument(skip(self, scope))]
    pub async fn decrease(&self, food_id: &str, scope: &ViewScope) -> CartResult<()> {
        self.dispatch(food_id, CartCommand::RemoveOne, scope).await
    }

    /// Drop a food from the cart entirely. Local only; returns the removed quantity.
    #[instrument(skip(self))]
    pub fn remove_all(&self, food_id: &str) -> u32 {
        let mut removed = 0;
        self.cart.send_if_modified(|cart| {
            removed = cart.remove(food_id);
            removed > 0
        });
        debug!(removed, "removed food from local cart");
        removed
    }

    /// Adopt a token and replace the local cart with the backend's.
    ///
    /// On failure the local cart is left as it was.
    #[instrument(skip(self, token, scope))]
    pub async fn hydrate(&self, token: SessionToken, scope: &ViewScope) -> CartResult<()> {
        self.set_token(Some(token.clone()));

        let cart = scope.run(self.backend.fetch_cart(&token)).await.map_err(|e| {
            warn!("Cart hydration failed: {}", e);
            e
        })?;

        info!(lines = cart.len(), items = cart.item_count(), "hydrated cart");
        self.cart.send_replace(cart);
        Ok(())
    }

    /// Clear the backend cart, then hydrate from it.
    ///
    /// Anonymous stores just clear locally.
    #[instrument(skip(self, scope))]
    pub async fn clear_after_payment(&self, scope: &ViewScope) -> CartResult<()> {
        let Some(token) = self.token() else {
            debug!("anonymous cart, clearing locally");
            self.cart.send_replace(Cart::new());
            return Ok(());
        };

        scope.run(self.backend.clear_cart(&token)).await?;
        self.hydrate(token, scope).await
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn apply_local(&self, food_id: &str, command: CartCommand) -> bool {
        self.cart
            .send_if_modified(|cart| cart.apply_delta(food_id, command.delta()))
    }

    /// Wait for this food's turn at the backend
    async fn item_turn<'a>(&'a self, food_id: &'a str) -> ItemTurn<'a> {
        let queue = {
            let mut queues = self
                .item_queues
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            queues
                .entry(food_id.to_string())
                .or_insert_with(|| Arc::new(AsyncMutex::new(())))
                .clone()
        };
        ItemTurn {
            queues: &self.item_queues,
            food_id,
            guard: Some(queue.lock_owned().await),
        }
    }

    async fn dispatch(
        &self,
        food_id: &str,
        command: CartCommand,
        scope: &ViewScope,
    ) -> CartResult<()> {
        if !self.apply_local(food_id, command) {
            debug!(?command, "no local change, skipping backend");
            return Ok(());
        }
        let pending = PendingCommand {
            cart: &self.cart,
            food_id,
            command,
            confirmed: false,
        };

        let Some(token) = self.token() else {
            debug!(?command, "anonymous cart, keeping mutation local");
            pending.confirm();
            return Ok(());
        };

        let _turn = self.item_turn(food_id).await;

        let request = async {
            match command {
                CartCommand::AddOne => self.backend.add_one(&token, food_id).await,
                CartCommand::RemoveOne => self.backend.remove_one(&token, food_id).await,
            }
        };

        if let Err(err) = scope.run(request).await {
            warn!(?command, "backend rejected cart mutation, reverting: {}", err);
            return Err(err);
        }

        debug!(?command, "backend confirmed cart mutation");
        pending.confirm();
        Ok(())
    }
}

/// An optimistic local change awaiting the backend.
///
/// Unless confirmed, dropping it applies the compensation. This covers a
/// failed request as well as the caller's future being dropped mid-flight.
struct PendingCommand<'a> {
    cart: &'a watch::Sender<Cart>,
    food_id: &'a str,
    command: CartCommand,
    confirmed: bool,
}

impl PendingCommand<'_> {
    fn confirm(mut self) {
        self.confirmed = true;
    }
}

impl Drop for PendingCommand<'_> {
    fn drop(&mut self) {
        if self.confirmed {
            return;
        }
        let compensation = self.command.compensation();
        debug!(command = ?self.command, ?compensation, "compensating local cart");
        self.cart
            .send_if_modified(|cart| cart.apply_delta(self.food_id, compensation.delta()));
    }
}

/// Exclusive backend access for one food id.
///
/// The queue entry is pruned once nobody else holds or waits on it.
struct ItemTurn<'a> {
    queues: &'a Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
    food_id: &'a str,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for ItemTurn<'_> {
    fn drop(&mut self) {
        // Releases this turn's handle on the queue before counting.
        self.guard.take();
        let mut queues = self.queues.lock().unwrap_or_else(PoisonError::into_inner);
        if queues
            .get(self.food_id)
            .is_some_and(|queue| Arc::strong_count(queue) == 1)
        {
            queues.remove(self.food_id);
        }
    }
}

impl std::fmt::Debug for CartStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartStore")
            .field("backend", &self.backend.backend_name())
            .field("authenticated", &self.token().is_some())
            .field("cart", &*self.cart.borrow())
            .finish()
    }
}
