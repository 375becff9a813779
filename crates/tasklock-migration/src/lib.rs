//! Schema migrations for the lock table
//!
//! The migrator is idempotent: applying it to a database that already has the
//! table is a no-op, which lets every plugin scope run it on first use.

pub use sea_orm_migration::prelude::*;

mod m20211001_000001_create_locks_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![Box::new(m20211001_000001_create_locks_table::Migration)]
    }
}
