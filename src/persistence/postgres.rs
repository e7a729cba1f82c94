//! PostgreSQL implementation of the engagement store.
//!
//! Transactions take `SELECT … FOR UPDATE` row locks on the gig and bid
//! rows they check, so concurrent hire/close/submit/revise calls touching
//! the same gig serialize at the store: the first committer wins and the
//! loser re-reads the committed state, failing its own precondition with
//! a conflict. A per-transaction `lock_timeout` bounds how long a loser
//! may wait on a lock.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::{MarketStore, StoreTx};
use crate::domain::{Bid, BidId, BidStatus, Gig, GigId, GigStatus, UserId};
use crate::error::MarketError;

type GigRow = (
    Uuid,
    String,
    String,
    i64,
    Uuid,
    String,
    Option<Uuid>,
    Option<Uuid>,
    DateTime<Utc>,
    DateTime<Utc>,
);

type BidRow = (
    Uuid,
    Uuid,
    Uuid,
    String,
    i64,
    String,
    DateTime<Utc>,
    DateTime<Utc>,
);

/// PostgreSQL-backed engagement store using `sqlx::PgPool`.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
    lock_timeout_ms: u64,
}

impl PostgresStore {
    /// Creates a new store with the given connection pool.
    ///
    /// `lock_timeout_ms` bounds the row-lock wait inside every
    /// transaction opened by [`MarketStore::begin`].
    #[must_use]
    pub fn new(pool: PgPool, lock_timeout_ms: u64) -> Self {
        Self {
            pool,
            lock_timeout_ms,
        }
    }
}

/// Maps sqlx errors to the error taxonomy.
///
/// Lock-wait expiry (code `55P03`) means a concurrent transaction held
/// the row past the bounded wait; the caller gets a conflict, not a
/// retry. Everything else is an unexpected persistence fault.
fn map_sqlx(e: sqlx::Error) -> MarketError {
    if let sqlx::Error::Database(db) = &e
        && db.code().as_deref() == Some("55P03")
    {
        return MarketError::Conflict("a concurrent update is in progress".to_string());
    }
    MarketError::Persistence(e.to_string())
}

fn gig_from_row(row: GigRow) -> Result<Gig, MarketError> {
    let (
        id,
        title,
        description,
        budget,
        owner_id,
        status,
        hired_bid_id,
        hired_bidder_id,
        created_at,
        updated_at,
    ) = row;
    Ok(Gig {
        id: GigId::from_uuid(id),
        title,
        description,
        budget,
        owner_id: UserId::from_uuid(owner_id),
        status: status.parse()?,
        hired_bid_id: hired_bid_id.map(BidId::from_uuid),
        hired_bidder_id: hired_bidder_id.map(UserId::from_uuid),
        created_at,
        updated_at,
    })
}

fn bid_from_row(row: BidRow) -> Result<Bid, MarketError> {
    let (id, gig_id, bidder_id, message, price, status, created_at, updated_at) = row;
    Ok(Bid {
        id: BidId::from_uuid(id),
        gig_id: GigId::from_uuid(gig_id),
        bidder_id: UserId::from_uuid(bidder_id),
        message,
        price,
        status: status.parse()?,
        created_at,
        updated_at,
    })
}

#[async_trait]
impl MarketStore for PostgresStore {
    async fn begin(&self) -> Result<Box<dyn StoreTx>, MarketError> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx)?;
        // SET LOCAL takes no bind parameters; the value is a config int.
        sqlx::query(&format!("SET LOCAL lock_timeout = {}", self.lock_timeout_ms))
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx)?;
        Ok(Box::new(PgStoreTx { tx }))
    }

    async fn insert_gig(&self, gig: &Gig) -> Result<(), MarketError> {
        sqlx::query(
            "INSERT INTO gigs (id, title, description, budget, owner_id, status, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(gig.id.as_uuid())
        .bind(&gig.title)
        .bind(&gig.description)
        .bind(gig.budget)
        .bind(gig.owner_id.as_uuid())
        .bind(gig.status.as_str())
        .bind(gig.created_at)
        .bind(gig.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx)?;
        Ok(())
    }

    async fn gig_by_id(&self, id: GigId) -> Result<Option<Gig>, MarketError> {
        let row = sqlx::query_as::<_, GigRow>(
            "SELECT id, title, description, budget, owner_id, status, hired_bid_id, hired_bidder_id, created_at, updated_at \
             FROM gigs WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx)?;
        row.map(gig_from_row).transpose()
    }

    async fn open_gigs(&self, title_search: Option<&str>) -> Result<Vec<Gig>, MarketError> {
        let rows = if let Some(search) = title_search {
            sqlx::query_as::<_, GigRow>(
                "SELECT id, title, description, budget, owner_id, status, hired_bid_id, hired_bidder_id, created_at, updated_at \
                 FROM gigs WHERE status = 'open' AND title ILIKE '%' || $1 || '%' \
                 ORDER BY created_at DESC",
            )
            .bind(search)
            .fetch_all(&self.pool)
            .await
        } else {
            sqlx::query_as::<_, GigRow>(
                "SELECT id, title, description, budget, owner_id, status, hired_bid_id, hired_bidder_id, created_at, updated_at \
                 FROM gigs WHERE status = 'open' ORDER BY created_at DESC",
            )
            .fetch_all(&self.pool)
            .await
        }
        .map_err(map_sqlx)?;
        rows.into_iter().map(gig_from_row).collect()
    }

    async fn gigs_by_owner(&self, owner: UserId) -> Result<Vec<Gig>, MarketError> {
        let rows = sqlx::query_as::<_, GigRow>(
            "SELECT id, title, description, budget, owner_id, status, hired_bid_id, hired_bidder_id, created_at, updated_at \
             FROM gigs WHERE owner_id = $1 ORDER BY created_at DESC",
        )
        .bind(owner.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx)?;
        rows.into_iter().map(gig_from_row).collect()
    }

    async fn bids_for_gig(&self, gig: GigId) -> Result<Vec<Bid>, MarketError> {
        let rows = sqlx::query_as::<_, BidRow>(
            "SELECT id, gig_id, bidder_id, message, price, status, created_at, updated_at \
             FROM bids WHERE gig_id = $1 ORDER BY created_at DESC",
        )
        .bind(gig.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx)?;
        rows.into_iter().map(bid_from_row).collect()
    }

    async fn bid_by_id(&self, id: BidId) -> Result<Option<Bid>, MarketError> {
        let row = sqlx::query_as::<_, BidRow>(
            "SELECT id, gig_id, bidder_id, message, price, status, created_at, updated_at \
             FROM bids WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx)?;
        row.map(bid_from_row).transpose()
    }

    async fn bid_for_gig_and_bidder(
        &self,
        gig: GigId,
        bidder: UserId,
    ) -> Result<Option<Bid>, MarketError> {
        let row = sqlx::query_as::<_, BidRow>(
            "SELECT id, gig_id, bidder_id, message, price, status, created_at, updated_at \
             FROM bids WHERE gig_id = $1 AND bidder_id = $2",
        )
        .bind(gig.as_uuid())
        .bind(bidder.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx)?;
        row.map(bid_from_row).transpose()
    }

    async fn bids_by_bidder(&self, bidder: UserId) -> Result<Vec<(Bid, Gig)>, MarketError> {
        let bid_rows = sqlx::query_as::<_, BidRow>(
            "SELECT id, gig_id, bidder_id, message, price, status, created_at, updated_at \
             FROM bids WHERE bidder_id = $1 ORDER BY created_at DESC",
        )
        .bind(bidder.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx)?;

        let bids: Vec<Bid> = bid_rows
            .into_iter()
            .map(bid_from_row)
            .collect::<Result<_, _>>()?;
        let gig_ids: Vec<Uuid> = bids.iter().map(|b| *b.gig_id.as_uuid()).collect();

        let gig_rows = sqlx::query_as::<_, GigRow>(
            "SELECT id, title, description, budget, owner_id, status, hired_bid_id, hired_bidder_id, created_at, updated_at \
             FROM gigs WHERE id = ANY($1)",
        )
        .bind(&gig_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx)?;

        let mut gigs = std::collections::HashMap::with_capacity(gig_rows.len());
        for row in gig_rows {
            let gig = gig_from_row(row)?;
            gigs.insert(gig.id, gig);
        }

        Ok(bids
            .into_iter()
            .filter_map(|bid| gigs.get(&bid.gig_id).cloned().map(|gig| (bid, gig)))
            .collect())
    }

    async fn lowest_pending_bid(&self, gig: GigId) -> Result<Option<Bid>, MarketError> {
        let row = sqlx::query_as::<_, BidRow>(
            "SELECT id, gig_id, bidder_id, message, price, status, created_at, updated_at \
             FROM bids WHERE gig_id = $1 AND status = 'pending' \
             ORDER BY price ASC, created_at ASC LIMIT 1",
        )
        .bind(gig.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx)?;
        row.map(bid_from_row).transpose()
    }
}

/// One open PostgreSQL transaction.
///
/// Rolls back on drop unless [`StoreTx::commit`] consumed it.
#[derive(Debug)]
struct PgStoreTx {
    tx: sqlx::Transaction<'static, sqlx::Postgres>,
}

#[async_trait]
impl StoreTx for PgStoreTx {
    async fn gig_for_update(&mut self, id: GigId) -> Result<Option<Gig>, MarketError> {
        let row = sqlx::query_as::<_, GigRow>(
            "SELECT id, title, description, budget, owner_id, status, hired_bid_id, hired_bidder_id, created_at, updated_at \
             FROM gigs WHERE id = $1 FOR UPDATE",
        )
        .bind(id.as_uuid())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(map_sqlx)?;
        row.map(gig_from_row).transpose()
    }

    async fn bid_for_update(&mut self, id: BidId) -> Result<Option<Bid>, MarketError> {
        let row = sqlx::query_as::<_, BidRow>(
            "SELECT id, gig_id, bidder_id, message, price, status, created_at, updated_at \
             FROM bids WHERE id = $1 FOR UPDATE",
        )
        .bind(id.as_uuid())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(map_sqlx)?;
        row.map(bid_from_row).transpose()
    }

    async fn insert_bid(&mut self, bid: &Bid) -> Result<(), MarketError> {
        sqlx::query(
            "INSERT INTO bids (id, gig_id, bidder_id, message, price, status, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(bid.id.as_uuid())
        .bind(bid.gig_id.as_uuid())
        .bind(bid.bidder_id.as_uuid())
        .bind(&bid.message)
        .bind(bid.price)
        .bind(bid.status.as_str())
        .bind(bid.created_at)
        .bind(bid.updated_at)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db) = &e
                && db.is_unique_violation()
            {
                return MarketError::Conflict(
                    "you have already submitted a bid for this gig".to_string(),
                );
            }
            map_sqlx(e)
        })?;
        Ok(())
    }

    async fn assign_gig(
        &mut self,
        gig: GigId,
        bid: BidId,
        bidder: UserId,
    ) -> Result<(), MarketError> {
        sqlx::query(
            "UPDATE gigs SET status = 'assigned', hired_bid_id = $2, hired_bidder_id = $3, updated_at = now() \
             WHERE id = $1",
        )
        .bind(gig.as_uuid())
        .bind(bid.as_uuid())
        .bind(bidder.as_uuid())
        .execute(&mut *self.tx)
        .await
        .map_err(map_sqlx)?;
        Ok(())
    }

    async fn set_gig_status(&mut self, gig: GigId, status: GigStatus) -> Result<(), MarketError> {
        sqlx::query("UPDATE gigs SET status = $2, updated_at = now() WHERE id = $1")
            .bind(gig.as_uuid())
            .bind(status.as_str())
            .execute(&mut *self.tx)
            .await
            .map_err(map_sqlx)?;
        Ok(())
    }

    async fn set_bid_status(&mut self, bid: BidId, status: BidStatus) -> Result<(), MarketError> {
        sqlx::query("UPDATE bids SET status = $2, updated_at = now() WHERE id = $1")
            .bind(bid.as_uuid())
            .bind(status.as_str())
            .execute(&mut *self.tx)
            .await
            .map_err(map_sqlx)?;
        Ok(())
    }

    async fn update_bid_terms(
        &mut self,
        bid: BidId,
        message: &str,
        price: i64,
    ) -> Result<(), MarketError> {
        sqlx::query("UPDATE bids SET message = $2, price = $3, updated_at = now() WHERE id = $1")
            .bind(bid.as_uuid())
            .bind(message)
            .bind(price)
            .execute(&mut *self.tx)
            .await
            .map_err(map_sqlx)?;
        Ok(())
    }

    async fn reject_pending_bids(
        &mut self,
        gig: GigId,
        except: Option<BidId>,
    ) -> Result<u64, MarketError> {
        let result = if let Some(winner) = except {
            sqlx::query(
                "UPDATE bids SET status = 'rejected', updated_at = now() \
                 WHERE gig_id = $1 AND status = 'pending' AND id <> $2",
            )
            .bind(gig.as_uuid())
            .bind(winner.as_uuid())
            .execute(&mut *self.tx)
            .await
        } else {
            sqlx::query(
                "UPDATE bids SET status = 'rejected', updated_at = now() \
                 WHERE gig_id = $1 AND status = 'pending'",
            )
            .bind(gig.as_uuid())
            .execute(&mut *self.tx)
            .await
        }
        .map_err(map_sqlx)?;
        Ok(result.rows_affected())
    }

    async fn commit(self: Box<Self>) -> Result<(), MarketError> {
        self.tx.commit().await.map_err(map_sqlx)
    }
}
