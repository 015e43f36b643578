//! Business logic services

pub mod borrows;
pub mod catalog;
pub mod stats;
pub mod uploads;
pub mod users;

use crate::{config::AppConfig, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub users: users::UsersService,
    pub catalog: catalog::CatalogService,
    pub borrows: borrows::BorrowsService,
    pub stats: stats::StatsService,
    pub uploads: uploads::UploadsService,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository, config: &AppConfig) -> Self {
        Self {
            users: users::UsersService::new(repository.clone(), config.auth.clone()),
            catalog: catalog::CatalogService::new(repository.clone()),
            borrows: borrows::BorrowsService::new(repository.clone(), config.borrows.clone()),
            stats: stats::StatsService::new(repository),
            uploads: uploads::UploadsService::new(config.media.clone()),
        }
    }
}
