use std::sync::Arc;

use config::Config;
use services::Services;

pub mod config;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod store;
pub mod utils;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub services: Arc<Services>,
}
