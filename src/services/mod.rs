//! Business logic services

pub mod catalog;
pub mod ledger;
pub mod lending;
pub mod metadata;

use std::sync::Arc;

use crate::repository::Repository;

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub catalog: catalog::CatalogService,
    pub ledger: ledger::BorrowLedger,
    pub lending: lending::LendingService,
}

impl Services {
    /// Create all services over the given repository and metadata provider
    pub fn new(repository: Repository, metadata: Arc<dyn metadata::MetadataProvider>) -> Self {
        let catalog = catalog::CatalogService::new(repository.books.clone(), metadata);
        let ledger = ledger::BorrowLedger::new(repository.borrows.clone());
        let lending =
            lending::LendingService::new(repository.users.clone(), catalog.clone(), ledger.clone());
        Self {
            catalog,
            ledger,
            lending,
        }
    }
}
