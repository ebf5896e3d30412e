use std::sync::Arc;

pub mod config;
pub mod error;
pub mod media;
pub mod platform;
pub mod proxy;
pub mod resolver;
pub mod routes;
pub mod transport;
mod ui;

use config::Config;
use resolver::Resolver;
use transport::Transport;

#[derive(Clone)]
pub struct AppState {
    pub resolver: Arc<Resolver>,
    pub transport: Arc<dyn Transport>,
}

impl AppState {
    pub fn new(transport: Arc<dyn Transport>, config: &Config) -> Self {
        let resolver = Resolver::new(
            Arc::clone(&transport),
            config.api_key.clone(),
            config.api_host.clone(),
        );

        Self {
            resolver: Arc::new(resolver),
            transport,
        }
    }
}
