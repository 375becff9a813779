use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::DbBackend;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(locks_table(manager.get_database_backend()))
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Locks::Table).if_exists().to_owned())
            .await
    }
}

fn locks_table(backend: DbBackend) -> TableCreateStatement {
    let mut expires_at = ColumnDef::new(Locks::ExpiresAt);
    // Stored in whatever form the backend's own clock expressions produce,
    // so comparisons against server-now stay on the database side. MySQL gets
    // DATETIME because TIMESTAMP stops at 2038.
    match backend {
        DbBackend::Postgres => expires_at.timestamp_with_time_zone(),
        DbBackend::MySql => expires_at.custom(Alias::new("DATETIME(6)")),
        DbBackend::Sqlite => expires_at.string_len(32),
    };

    Table::create()
        .table(Locks::Table)
        .if_not_exists()
        .col(ColumnDef::new(Locks::Scope).string_len(255).not_null())
        .col(ColumnDef::new(Locks::Name).string_len(255).not_null())
        .col(ColumnDef::new(Locks::Token).string_len(64).not_null())
        .col(expires_at.not_null())
        .primary_key(Index::create().col(Locks::Scope).col(Locks::Name))
        .to_owned()
}

#[derive(DeriveIden)]
enum Locks {
    #[sea_orm(iden = "tasklock_locks")]
    Table,
    Scope,
    Name,
    Token,
    ExpiresAt,
}
