//! Database migrations for the HubSpot workflow actions service.

pub use sea_orm_migration::prelude::*;

mod m2026_06_02_101500_create_credentials;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![Box::new(m2026_06_02_101500_create_credentials::Migration)]
    }
}
