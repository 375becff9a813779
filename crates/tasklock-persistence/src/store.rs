//! Lease lock store
//!
//! Mutual exclusion rests entirely on the `(scope, name)` primary key of the
//! lock table. Acquisition is a single try:
//!
//! 1. Insert a fresh row expiring at server-now + lease. Success means we own it.
//! 2. On a unique key conflict, delete the row only if it has already expired
//!    and insert ours, both inside one transaction. Only one of several
//!    concurrent reclaimers can delete the stale row; the rest see zero
//!    affected rows (or a key conflict on insert) and report not acquired.
//!    A reclaim the database aborts as a deadlock victim or serialization
//!    failure is retried once, then reported as not acquired.
//!
//! There is no background sweeper. Expired rows linger until someone contends
//! for the same name.

use std::fmt::{Display, Formatter};
use std::sync::Arc;
use std::time::Duration;

use sea_orm::sea_query::{Expr, Query};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, DbBackend, DbErr, EntityTrait, QueryFilter,
    Statement, TransactionTrait,
};
use tracing::debug;

use tasklock_common::error::{is_transaction_conflict, is_unique_violation};
use tasklock_common::{LockError, Result, validate_id};

use crate::dialect::{TimeDialect, dialect_for};
use crate::entity::task_lock;

/// Reclaim attempts before a conflicting transaction counts as a lost race
const RECLAIM_ATTEMPTS: usize = 2;

/// Opaque per-acquisition value stored alongside the lock row
///
/// Release is conditional on this token, so a holder whose lease was reclaimed
/// by someone else cannot delete the new owner's row.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct LeaseToken(String);

impl LeaseToken {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for LeaseToken {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Row-level lock operations against the shared lock table
#[derive(Clone, Debug)]
pub struct LockStore {
    db: DatabaseConnection,
    dialect: Arc<dyn TimeDialect>,
}

impl LockStore {
    /// Create a store, picking the clock dialect from the connection's backend
    pub fn new(db: DatabaseConnection) -> Self {
        let dialect = dialect_for(db.get_database_backend());
        Self { db, dialect }
    }

    /// Create a store with an explicit clock dialect
    pub fn with_dialect(db: DatabaseConnection, dialect: Arc<dyn TimeDialect>) -> Self {
        Self { db, dialect }
    }

    /// Get a reference to the underlying database connection
    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    fn backend(&self) -> DbBackend {
        self.db.get_database_backend()
    }

    fn insert_statement(
        &self,
        scope: &str,
        name: &str,
        token: &LeaseToken,
        lease: Duration,
    ) -> std::result::Result<Statement, DbErr> {
        let stmt = Query::insert()
            .into_table(task_lock::Entity)
            .columns([
                task_lock::Column::Scope,
                task_lock::Column::Name,
                task_lock::Column::Token,
                task_lock::Column::ExpiresAt,
            ])
            .values([
                Expr::val(scope).into(),
                Expr::val(name).into(),
                Expr::val(token.as_str()).into(),
                Expr::cust(self.dialect.now_plus(lease)),
            ])
            .map_err(|e| DbErr::Custom(e.to_string()))?
            .to_owned();

        Ok(self.backend().build(&stmt))
    }

    /// Try once to take the lock `name` within `scope`
    ///
    /// Returns the fencing token on success and `None` when another live lease
    /// holds the name. Only infrastructure failures are returned as errors.
    pub async fn try_acquire(
        &self,
        scope: &str,
        name: &str,
        lease: Duration,
    ) -> Result<Option<LeaseToken>> {
        validate_id(scope)?;
        validate_id(name)?;

        let token = LeaseToken::generate();
        let insert = self.insert_statement(scope, name, &token, lease)?;

        match self.db.execute(insert).await {
            Ok(_) => {
                debug!(scope = %scope, name = %name, lease = ?lease, "Lock acquired");
                return Ok(Some(token));
            }
            Err(e) if is_unique_violation(&e) || is_transaction_conflict(&e) => {}
            Err(e) => return Err(e.into()),
        }

        for attempt in 1..=RECLAIM_ATTEMPTS {
            match self.reclaim_expired(scope, name, &token, lease).await {
                Err(LockError::Database(e)) if is_transaction_conflict(&e) => {
                    debug!(
                        scope = %scope,
                        name = %name,
                        attempt = attempt,
                        error = %e,
                        "Reclaim aborted by a concurrent transaction"
                    );
                }
                outcome => return outcome,
            }
        }

        debug!(scope = %scope, name = %name, "Lost reclaim race");
        Ok(None)
    }

    /// Replace an expired row with our own in one transaction
    async fn reclaim_expired(
        &self,
        scope: &str,
        name: &str,
        token: &LeaseToken,
        lease: Duration,
    ) -> Result<Option<LeaseToken>> {
        let txn = self.db.begin().await?;

        let deleted = task_lock::Entity::delete_many()
            .filter(task_lock::Column::Scope.eq(scope))
            .filter(task_lock::Column::Name.eq(name))
            .filter(
                Expr::col(task_lock::Column::ExpiresAt).lte(Expr::cust(self.dialect.now())),
            )
            .exec(&txn)
            .await?;

        if deleted.rows_affected == 0 {
            txn.rollback().await?;
            debug!(scope = %scope, name = %name, "Lock held by a live lease");
            return Ok(None);
        }

        let insert = self.insert_statement(scope, name, token, lease)?;
        match txn.execute(insert).await {
            Ok(_) => {
                txn.commit().await?;
                debug!(scope = %scope, name = %name, "Expired lock reclaimed");
                Ok(Some(token.clone()))
            }
            Err(e) if is_unique_violation(&e) => {
                txn.rollback().await?;
                debug!(scope = %scope, name = %name, "Lost reclaim race");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Delete the lock row if it still belongs to `token`
    ///
    /// Returns whether a row was removed. A missing or foreign row is not an
    /// error: the lease may have expired and been reclaimed in the meantime.
    pub async fn release(&self, scope: &str, name: &str, token: &LeaseToken) -> Result<bool> {
        validate_id(scope)?;
        validate_id(name)?;

        let result = task_lock::Entity::delete_many()
            .filter(task_lock::Column::Scope.eq(scope))
            .filter(task_lock::Column::Name.eq(name))
            .filter(task_lock::Column::Token.eq(token.as_str()))
            .exec(&self.db)
            .await?;

        let released = result.rows_affected > 0;
        debug!(scope = %scope, name = %name, released = released, "Lock release");
        Ok(released)
    }
}
