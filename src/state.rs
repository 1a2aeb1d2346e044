use crate::auth::AuthService;
use crate::config::Config;
use crate::storage::Store;

#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    pub auth: AuthService,
}

impl AppState {
    pub fn new(config: &Config, store: Store) -> Self {
        let auth = AuthService::new(store.clone(), config.session_ttl);
        Self { store, auth }
    }
}
