//! Database migrations.
//!
//! One migration per component, applied in dependency order.
//! Migration names follow the pattern: m{YYYYMMDD}_{NNNNNN}_{description}

use sea_orm_migration::prelude::*;

mod m20240101_000001_create_accounts;
mod m20240101_000002_create_projects;
mod m20240101_000003_create_evidence;
mod m20240101_000004_create_transactions;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_accounts::Migration),
            Box::new(m20240101_000002_create_projects::Migration),
            Box::new(m20240101_000003_create_evidence::Migration),
            Box::new(m20240101_000004_create_transactions::Migration),
        ]
    }
}

/// Identifiers shared by later migrations
#[derive(DeriveIden)]
pub(crate) enum Users {
    Table,
    Id,
}

#[derive(DeriveIden)]
pub(crate) enum Projects {
    Table,
    Id,
}
