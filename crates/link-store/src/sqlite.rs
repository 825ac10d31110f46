//! # SQLite Link Store
//!
//! Single-table persistence for payment links. Every status write is a single
//! SQL statement, so the conditional updates are atomic without explicit
//! transactions.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use link_core::{LinkError, LinkResult, LinkStatus, LinkStore, PaymentLink};
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::Mutex;
use tracing::debug;

/// SQLite-backed link store.
///
/// Holds a single connection behind a mutex; statements are short enough that
/// contention is not a concern at this service's scale.
pub struct SqliteLinkStore {
    conn: Mutex<Connection>,
}

impl SqliteLinkStore {
    /// Open (or create) the database at `path` and ensure the schema exists
    pub fn open(path: impl AsRef<Path>) -> LinkResult<Self> {
        let conn = Connection::open(path).map_err(storage_err)?;
        Self::from_connection(conn)
    }

    /// Open an in-memory database (tests)
    pub fn open_in_memory() -> LinkResult<Self> {
        let conn = Connection::open_in_memory().map_err(storage_err)?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> LinkResult<Self> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS payment_links (
                id           TEXT PRIMARY KEY,
                amount_minor INTEGER NOT NULL,
                currency     TEXT NOT NULL,
                reference    TEXT NOT NULL UNIQUE,
                status       TEXT NOT NULL,
                country      TEXT NOT NULL,
                expires_at   TEXT NOT NULL
            )",
            [],
        )
        .map_err(storage_err)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> LinkResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| LinkError::Storage("connection mutex poisoned".to_string()))
    }

    fn get_where(&self, column: &str, key: &str) -> LinkResult<Option<PaymentLink>> {
        let conn = self.lock()?;
        let sql = format!(
            "SELECT id, amount_minor, currency, reference, status, country, expires_at
             FROM payment_links WHERE {} = ?1",
            column
        );
        let mut stmt = conn.prepare(&sql).map_err(storage_err)?;

        match stmt.query_row(params![key], row_to_link) {
            Ok(link) => Ok(Some(link)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(storage_err(e)),
        }
    }
}

#[async_trait]
impl LinkStore for SqliteLinkStore {
    async fn create(&self, link: &PaymentLink) -> LinkResult<()> {
        let conn = self.lock()?;
        let result = conn.execute(
            "INSERT INTO payment_links (id, amount_minor, currency, reference, status, country, expires_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                link.id,
                link.amount_minor,
                link.currency.as_str(),
                link.reference,
                link.status.as_str(),
                link.country,
                link.expires_at,
            ],
        );

        match result {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Err(LinkError::DuplicateReference {
                    reference: link.reference.clone(),
                })
            }
            Err(e) => Err(storage_err(e)),
        }
    }

    async fn get_by_id(&self, id: &str) -> LinkResult<Option<PaymentLink>> {
        self.get_where("id", id)
    }

    async fn get_by_reference(&self, reference: &str) -> LinkResult<Option<PaymentLink>> {
        self.get_where("reference", reference)
    }

    async fn update_status_by_id(&self, id: &str, status: LinkStatus) -> LinkResult<()> {
        let conn = self.lock()?;
        conn.execute(
            "UPDATE payment_links SET status = ?1 WHERE id = ?2",
            params![status.as_str(), id],
        )
        .map_err(storage_err)?;
        Ok(())
    }

    async fn update_status_by_reference(
        &self,
        reference: &str,
        status: LinkStatus,
    ) -> LinkResult<()> {
        let conn = self.lock()?;
        conn.execute(
            "UPDATE payment_links SET status = ?1 WHERE reference = ?2",
            params![status.as_str(), reference],
        )
        .map_err(storage_err)?;
        Ok(())
    }

    async fn transition_status(
        &self,
        id: &str,
        from: LinkStatus,
        to: LinkStatus,
    ) -> LinkResult<bool> {
        let conn = self.lock()?;
        let updated = conn
            .execute(
                "UPDATE payment_links SET status = ?1 WHERE id = ?2 AND status = ?3",
                params![to.as_str(), id, from.as_str()],
            )
            .map_err(storage_err)?;

        if updated == 0 {
            debug!(id, %from, %to, "transition skipped; status did not match");
        }
        Ok(updated > 0)
    }

    async fn settle_by_reference(&self, reference: &str, authorised: bool) -> LinkResult<bool> {
        let conn = self.lock()?;
        let updated = if authorised {
            // Paid wins from any status
            conn.execute(
                "UPDATE payment_links SET status = ?1 WHERE reference = ?2",
                params![LinkStatus::Paid.as_str(), reference],
            )
        } else {
            // A declined attempt releases the lock but never demotes paid
            conn.execute(
                "UPDATE payment_links SET status = ?1 WHERE reference = ?2 AND status != ?3",
                params![
                    LinkStatus::Pending.as_str(),
                    reference,
                    LinkStatus::Paid.as_str()
                ],
            )
        }
        .map_err(storage_err)?;

        Ok(updated > 0)
    }
}

fn row_to_link(row: &rusqlite::Row<'_>) -> rusqlite::Result<PaymentLink> {
    let currency_raw: String = row.get(2)?;
    let status_raw: String = row.get(4)?;
    let expires_at: DateTime<Utc> = row.get(6)?;

    let currency = currency_raw.parse().map_err(|e: LinkError| {
        rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e))
    })?;
    let status = LinkStatus::from_str(&status_raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            4,
            rusqlite::types::Type::Text,
            format!("unknown link status: {}", status_raw).into(),
        )
    })?;

    Ok(PaymentLink {
        id: row.get(0)?,
        amount_minor: row.get(1)?,
        currency,
        reference: row.get(3)?,
        status,
        country: row.get(5)?,
        expires_at,
    })
}

fn storage_err(e: rusqlite::Error) -> LinkError {
    LinkError::Storage(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use link_core::Currency;

    fn store() -> SqliteLinkStore {
        SqliteLinkStore::open_in_memory().unwrap()
    }

    fn link(reference: &str) -> PaymentLink {
        PaymentLink::new(1099, Currency::EUR, reference, "NL", 24).unwrap()
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let store = store();
        let link = link("ORDER1");
        store.create(&link).await.unwrap();

        let fetched = store.get_by_id(&link.id).await.unwrap().unwrap();
        assert_eq!(fetched.id, link.id);
        assert_eq!(fetched.amount_minor, 1099);
        assert_eq!(fetched.currency, Currency::EUR);
        assert_eq!(fetched.reference, "ORDER1");
        assert_eq!(fetched.status, LinkStatus::Pending);
        assert_eq!(fetched.country, "NL");
        // Timestamp round-trips through TEXT storage
        assert!((fetched.expires_at - link.expires_at).num_seconds().abs() < 1);

        let by_ref = store.get_by_reference("ORDER1").await.unwrap().unwrap();
        assert_eq!(by_ref.id, link.id);
    }

    #[tokio::test]
    async fn test_get_missing_returns_none() {
        let store = store();
        assert!(store.get_by_id("nope").await.unwrap().is_none());
        assert!(store.get_by_reference("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_reference_rejected() {
        let store = store();
        let first = link("ORDER1");
        store.create(&first).await.unwrap();

        let second = link("ORDER1");
        let err = store.create(&second).await.unwrap_err();
        assert!(matches!(err, LinkError::DuplicateReference { .. }));

        // First link untouched
        let fetched = store.get_by_id(&first.id).await.unwrap().unwrap();
        assert_eq!(fetched.status, LinkStatus::Pending);
    }

    #[tokio::test]
    async fn test_unconditional_updates() {
        let store = store();
        let link = link("ORDER1");
        store.create(&link).await.unwrap();

        store
            .update_status_by_id(&link.id, LinkStatus::Processing)
            .await
            .unwrap();
        assert_eq!(
            store.get_by_id(&link.id).await.unwrap().unwrap().status,
            LinkStatus::Processing
        );

        store
            .update_status_by_reference("ORDER1", LinkStatus::Paid)
            .await
            .unwrap();
        assert_eq!(
            store.get_by_id(&link.id).await.unwrap().unwrap().status,
            LinkStatus::Paid
        );

        // Absent keys are a no-op, not an error
        store
            .update_status_by_id("nope", LinkStatus::Paid)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_conditional_transition() {
        let store = store();
        let link = link("ORDER1");
        store.create(&link).await.unwrap();

        assert!(store
            .transition_status(&link.id, LinkStatus::Pending, LinkStatus::Processing)
            .await
            .unwrap());

        // Same transition no longer matches
        assert!(!store
            .transition_status(&link.id, LinkStatus::Pending, LinkStatus::Processing)
            .await
            .unwrap());

        assert_eq!(
            store.get_by_id(&link.id).await.unwrap().unwrap().status,
            LinkStatus::Processing
        );
    }

    #[tokio::test]
    async fn test_settle_authorised_wins_from_any_status() {
        let store = store();
        let link = link("ORDER1");
        store.create(&link).await.unwrap();
        store
            .update_status_by_id(&link.id, LinkStatus::Processing)
            .await
            .unwrap();

        assert!(store.settle_by_reference("ORDER1", true).await.unwrap());
        assert_eq!(
            store.get_by_id(&link.id).await.unwrap().unwrap().status,
            LinkStatus::Paid
        );
    }

    #[tokio::test]
    async fn test_settle_declined_releases_lock_but_not_paid() {
        let store = store();
        let link = link("ORDER1");
        store.create(&link).await.unwrap();
        store
            .update_status_by_id(&link.id, LinkStatus::Processing)
            .await
            .unwrap();

        assert!(store.settle_by_reference("ORDER1", false).await.unwrap());
        assert_eq!(
            store.get_by_id(&link.id).await.unwrap().unwrap().status,
            LinkStatus::Pending
        );

        // Paid is terminal; a late declined notification changes nothing
        store.settle_by_reference("ORDER1", true).await.unwrap();
        assert!(!store.settle_by_reference("ORDER1", false).await.unwrap());
        assert_eq!(
            store.get_by_id(&link.id).await.unwrap().unwrap().status,
            LinkStatus::Paid
        );
    }

    #[tokio::test]
    async fn test_settle_unknown_reference() {
        let store = store();
        assert!(!store.settle_by_reference("nope", true).await.unwrap());
    }
}
