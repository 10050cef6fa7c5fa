pub mod ai_decision;
pub mod audit_log;
pub mod inbound_message;
pub mod pending_message;
pub mod processed_email;
pub mod retry_item;
pub mod supplier;
pub mod supplier_message;
pub mod ticket_state;

use sqlx::PgPool;
use sqlx::Postgres;
use sqlx::Transaction;

/// A transaction borrowed for the lifetime of a single logical unit of work.
/// Passed by value between free functions (never held behind a mutex),
/// following the teacher's `delivery.rs`/`idempotency::persistence` style.
pub type Tx<'a> = Transaction<'a, Postgres>;

/// Thin wrapper over the connection pool. This is the only component with
/// long-lived mutable process-wide state (§4.1); everything else takes a
/// `Store` handle (or a borrowed transaction) explicitly.
#[derive(Clone)]
pub struct Store {
    pool: PgPool,
}

impl Store {
    pub fn new(pool: PgPool) -> Self { Self { pool } }

    pub fn pool(&self) -> &PgPool { &self.pool }

    pub async fn begin(&self) -> Result<Tx<'static>, sqlx::Error> { self.pool.begin().await }

    /// Serialize all work touching one ticket behind a Postgres advisory
    /// transaction lock (§5: "per-ticket lock ... prevent lost updates").
    /// The lock is released automatically on commit or rollback; advisory
    /// locks are reentrant within the same session, so re-acquiring it in
    /// the second half of the Pipeline's two-phase transaction split is a
    /// no-op rather than a deadlock.
    pub async fn lock_ticket(
        tx: &mut Tx<'_>,
        ticket_number: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1, 0))")
            .bind(ticket_number)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }
}

/// True if `err` is a Postgres unique-violation (SQLSTATE 23505) — the signal
/// for an "invariant violation" error per §7, as opposed to any other
/// storage failure.
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(
        err.as_database_error().and_then(|e| e.code()),
        Some(code) if code.as_ref() == "23505"
    )
}
