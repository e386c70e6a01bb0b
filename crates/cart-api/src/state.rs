//! # Application State
//!
//! Shared state for the Axum application.
//! Contains the backend client, per-session cart stores, the cached food
//! catalog and the pricing policy.

use cart_core::{
    BoxedBackend, CartResult, CartStore, FoodCatalog, PricingPolicy, SessionToken,
    TotalsCalculator, ViewScope,
};
use cart_http::HttpStorefrontBackend;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::{OnceCell, RwLock};
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Environment (development, staging, production)
    pub environment: String,
    /// Sessions untouched for this long are dropped
    pub session_idle_ttl: Duration,
    /// Most sessions kept at once; the least recently used goes first
    pub max_sessions: usize,
}

impl AppConfig {
    /// Load from environment variables
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        let defaults = Self::default();

        Self {
            host: std::env::var("HOST").unwrap_or(defaults.host),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            environment: std::env::var("ENVIRONMENT").unwrap_or(defaults.environment),
            session_idle_ttl: std::env::var("SESSION_IDLE_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.session_idle_ttl),
            max_sessions: std::env::var("MAX_SESSIONS")
                .ok()
                .and_then(|n| n.parse().ok())
                .filter(|n| *n > 0)
                .unwrap_or(defaults.max_sessions),
        }
    }

    /// Get the socket address to bind to
    pub fn socket_addr(&self) -> anyhow::Result<std::net::SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid socket address {}:{}: {}", self.host, self.port, e))
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            environment: "development".to_string(),
            session_idle_ttl: Duration::from_secs(30 * 60),
            max_sessions: 10_000,
        }
    }
}

/// Who a request belongs to
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SessionKey {
    /// Signed-in shopper; the token is forwarded to the backend
    Authenticated(SessionToken),
    /// Anonymous shopper with an id issued by this service
    Anonymous(String),
}

struct SessionEntry {
    store: Arc<CartStore>,
    hydrated: OnceCell<()>,
    last_seen: Mutex<Instant>,
}

impl SessionEntry {
    fn new(store: CartStore) -> Arc<Self> {
        Arc::new(Self {
            store: Arc::new(store),
            hydrated: OnceCell::new(),
            last_seen: Mutex::new(Instant::now()),
        })
    }

    fn touch(&self) {
        *self.last_seen.lock().unwrap_or_else(PoisonError::into_inner) = Instant::now();
    }

    fn last_seen(&self) -> Instant {
        *self.last_seen.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

type Sessions = HashMap<SessionKey, Arc<SessionEntry>>;

/// One cart store per session, bounded by idle time and count
pub struct SessionRegistry {
    backend: BoxedBackend,
    idle_ttl: Duration,
    max_sessions: usize,
    sessions: Mutex<Sessions>,
}

impl SessionRegistry {
    pub fn new(backend: BoxedBackend, idle_ttl: Duration, max_sessions: usize) -> Self {
        Self {
            backend,
            idle_ttl,
            max_sessions: max_sessions.max(1),
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Issue a new anonymous session and return its id
    pub fn open_anonymous(&self) -> String {
        let id = uuid::Uuid::new_v4().to_string();
        let entry = SessionEntry::new(CartStore::new(self.backend.clone()));
        let mut sessions = self.lock();
        self.make_room(&mut sessions);
        sessions.insert(SessionKey::Anonymous(id.clone()), entry);
        debug!(session_id = %id, sessions = sessions.len(), "Opened anonymous session");
        id
    }

    /// Store for a session, or `None` for an anonymous id that was never
    /// issued or has expired.
    ///
    /// Authenticated sessions are created on first sight and hydrated from
    /// the backend once. A session whose first hydration fails is forgotten,
    /// so the next request starts over.
    pub async fn store_for(
        &self,
        key: &SessionKey,
        scope: &ViewScope,
    ) -> CartResult<Option<Arc<CartStore>>> {
        let entry = {
            let mut sessions = self.lock();
            let live = sessions
                .get(key)
                .filter(|entry| entry.last_seen().elapsed() < self.idle_ttl)
                .cloned();
            match (key, live) {
                (_, Some(entry)) => entry,
                (SessionKey::Anonymous(_), None) => {
                    sessions.remove(key);
                    return Ok(None);
                }
                (SessionKey::Authenticated(token), None) => {
                    sessions.remove(key);
                    self.make_room(&mut sessions);
                    let entry = SessionEntry::new(CartStore::with_token(
                        self.backend.clone(),
                        token.clone(),
                    ));
                    sessions.insert(key.clone(), entry.clone());
                    entry
                }
            }
        };
        entry.touch();

        if let SessionKey::Authenticated(token) = key {
            let hydrated = entry
                .hydrated
                .get_or_try_init(|| async {
                    entry.store.hydrate(token.clone(), scope).await?;
                    info!("Hydrated cart for new authenticated session");
                    Ok::<(), cart_core::CartError>(())
                })
                .await;
            if let Err(err) = hydrated {
                self.forget_unhydrated(key, &entry);
                return Err(err);
            }
        }

        Ok(Some(entry.store.clone()))
    }

    /// Number of sessions currently held
    pub fn active(&self) -> usize {
        self.lock().len()
    }

    fn forget_unhydrated(&self, key: &SessionKey, entry: &Arc<SessionEntry>) {
        let mut sessions = self.lock();
        if sessions
            .get(key)
            .is_some_and(|current| Arc::ptr_eq(current, entry) && current.hydrated.get().is_none())
        {
            sessions.remove(key);
            debug!("Dropped session after failed hydration");
        }
    }

    /// Drop idle sessions, then the least recently used while at capacity
    fn make_room(&self, sessions: &mut Sessions) {
        let before = sessions.len();
        sessions.retain(|_, entry| entry.last_seen().elapsed() < self.idle_ttl);

        while sessions.len() >= self.max_sessions {
            let oldest = sessions
                .iter()
                .min_by_key(|(_, entry)| entry.last_seen())
                .map(|(key, _)| key.clone());
            match oldest {
                Some(key) => sessions.remove(&key),
                None => break,
            };
        }

        let evicted = before - sessions.len();
        if evicted > 0 {
            debug!(evicted, remaining = sessions.len(), "Evicted sessions");
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Sessions> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Catalog fetched from the backend once and kept until refreshed
#[derive(Default)]
pub struct CatalogCache {
    catalog: RwLock<Option<Arc<FoodCatalog>>>,
}

impl CatalogCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached catalog, loading it on first use
    pub async fn get(&self, backend: &BoxedBackend) -> CartResult<Arc<FoodCatalog>> {
        if let Some(catalog) = self.catalog.read().await.as_ref() {
            return Ok(catalog.clone());
        }

        let mut slot = self.catalog.write().await;
        if let Some(catalog) = slot.as_ref() {
            return Ok(catalog.clone());
        }

        let catalog = Arc::new(FoodCatalog::from(backend.list_foods().await?));
        info!("Loaded {} foods from {}", catalog.len(), backend.backend_name());
        *slot = Some(catalog.clone());
        Ok(catalog)
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Foodies REST backend
    pub backend: BoxedBackend,
    /// Cart store per session
    pub sessions: Arc<SessionRegistry>,
    /// Food catalog
    pub catalog: Arc<CatalogCache>,
    /// Totals calculator
    pub calculator: TotalsCalculator,
    /// Application config
    pub config: AppConfig,
}

impl AppState {
    /// Create a new AppState backed by the HTTP client
    pub fn new() -> anyhow::Result<Self> {
        let config = AppConfig::from_env();
        let policy = load_pricing_policy()?;

        let backend = HttpStorefrontBackend::from_env()
            .map_err(|e| anyhow::anyhow!("Failed to initialize Foodies backend: {}", e))?;
        info!("Foodies API: {}", backend.config().api_base_url);

        Ok(Self::with_backend(
            Arc::new(backend),
            TotalsCalculator::new(policy),
            config,
        ))
    }

    /// Create state around any backend
    pub fn with_backend(
        backend: BoxedBackend,
        calculator: TotalsCalculator,
        config: AppConfig,
    ) -> Self {
        Self {
            sessions: Arc::new(SessionRegistry::new(
                backend.clone(),
                config.session_idle_ttl,
                config.max_sessions,
            )),
            catalog: Arc::new(CatalogCache::new()),
            backend,
            calculator,
            config,
        }
    }
}

/// Load the pricing policy from config file
fn load_pricing_policy() -> anyhow::Result<PricingPolicy> {
    let config_paths = [
        "config/pricing.toml",
        "../config/pricing.toml",
        "../../config/pricing.toml",
    ];

    for path in config_paths {
        if let Ok(content) = std::fs::read_to_string(path) {
            let policy = PricingPolicy::from_toml(&content)
                .map_err(|e| anyhow::anyhow!("Failed to parse {}: {}", path, e))?;
            info!(
                "Loaded pricing from {}: shipping {}, tax rate {}",
                path, policy.shipping_fee, policy.tax_rate
            );
            return Ok(policy);
        }
    }

    warn!("No pricing policy found, using defaults");
    Ok(PricingPolicy::default())
}
