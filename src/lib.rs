pub mod api;
pub mod config;
pub mod error;
pub mod extract;
pub mod logging;
pub mod model;
pub mod probe;
pub mod scraper;
pub mod sentences;
pub mod server;
pub mod servicer;
pub mod summary;

use std::sync::Arc;

use servicer::Servicer;
use tokio::sync::Semaphore;

/// Application state shared by every handler of both services.
#[derive(Clone)]
pub struct AppState {
    pub servicer: Arc<Servicer>,
    /// One permit per worker; a call holds a permit until its reply is built.
    pub workers: Arc<Semaphore>,
}

impl AppState {
    pub fn new(servicer: Arc<Servicer>, max_workers: usize) -> Self {
        Self {
            servicer,
            workers: Arc::new(Semaphore::new(max_workers.max(1))),
        }
    }
}
