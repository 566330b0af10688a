use crate::config::Config;
use crate::ranking::lock::AuditLock;
use crate::ranking::service::RankingService;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub ranking: RankingService,
    /// Per-job Redis lock around bias audits.
    pub audit_lock: AuditLock,
    pub config: Config,
}
