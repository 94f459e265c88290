use std::sync::Arc;

use crate::config::Config;
use crate::oauth::GoogleClient;
use crate::store::Store;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub config: Config,
    pub google: Option<GoogleClient>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, config: Config) -> Self {
        let google = config.google.clone().map(GoogleClient::new);
        AppState {
            store,
            config,
            google,
        }
    }
}
