use reqwest::Client;
use tokio_util::sync::CancellationToken;

use crate::config::Config;

/// Shared application state injected into all route handlers via Axum extractors.
/// Everything here is read-only after startup; per-user keys travel with each request.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Pooled outbound HTTP client shared by the Gemini, imgBB and D-ID clients.
    pub http: Client,
    /// Cancelled on shutdown; each request polls under a child token.
    pub shutdown: CancellationToken,
}
