//! Core domain logic for the lab website content store.
//! This crate is the single source of truth for ordering invariants.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{ConfigError, LabsiteConfig};
pub use db::{open_db, open_db_in_memory, open_db_with_timeout, DbError, DbResult};
pub use logging::{default_log_level, init_logging, init_logging_from, logging_status, LoggingError};
pub use model::job::{Job, JobPatch, JobStatus, JobType};
pub use model::news::{News, NewsPatch};
pub use model::ordering::{Collection, Orderable, RecordId};
pub use model::page::{Page, PageInfo};
pub use model::paper::{FeaturePublication, FeaturePublicationPatch, Paper, PaperPatch};
pub use model::team_member::{TeamMember, TeamMemberPatch};
pub use model::validation::RecordValidationError;
pub use repo::collection_repo::{
    CollectionRepoError, CollectionRepoResult, CollectionRepository, ListQuery, OrderedRecord,
    SqliteCollectionRepository,
};
pub use repo::order_repo::{OrderRepoError, OrderRepository, SqliteOrderRepository};
pub use service::collection_service::{
    CollectionService, FeaturePublicationService, JobService, NewsService, PaperService,
    ServiceError, ServiceResult, TeamMemberService,
};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
