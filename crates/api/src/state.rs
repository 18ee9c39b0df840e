//! Shared application state.

use std::sync::Arc;

use analytics::AnalyticsService;
use auth::{IdentityProvider, TokenService};
use store::Store;
use workflow::{AccountService, CatalogService, OrderWorkflow};

use crate::config::Config;

/// Services and configuration shared by every handler.
pub struct AppState<S: Store> {
    pub accounts: AccountService<S>,
    pub catalog: CatalogService<S>,
    pub orders: OrderWorkflow<S>,
    pub analytics: AnalyticsService<S>,
    /// `None` when Google sign-in is not configured.
    pub identity_provider: Option<Arc<dyn IdentityProvider>>,
    pub config: Config,
}

impl<S: Store> AppState<S> {
    /// Wires every service onto one store.
    pub fn new(
        store: S,
        config: Config,
        identity_provider: Option<Arc<dyn IdentityProvider>>,
    ) -> Self {
        let tokens = TokenService::new(&config.jwt_secret, config.jwt_expiry_secs);
        Self {
            accounts: AccountService::new(store.clone(), tokens),
            catalog: CatalogService::new(store.clone()),
            orders: OrderWorkflow::new(store.clone()),
            analytics: AnalyticsService::new(store),
            identity_provider,
            config,
        }
    }
}
