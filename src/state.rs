use actix::Addr;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

use crate::backend::AnalysisBackend;
use crate::websocket::AnalysisSocket;

/// Application state shared between connections
pub struct AppState {
    pub backend: Arc<dyn AnalysisBackend>,
    pub api_url: String,
    pub static_dir: String,
    pub sessions: Mutex<HashMap<String, Addr<AnalysisSocket>>>,
}

impl AppState {
    pub fn new(backend: Arc<dyn AnalysisBackend>, api_url: &str, static_dir: &str) -> Self {
        AppState {
            backend,
            api_url: api_url.to_string(),
            static_dir: static_dir.to_string(),
            sessions: Mutex::new(HashMap::new()),
        }
    }

    pub fn session_count(&self) -> usize {
        self.sessions.lock().len()
    }
}
