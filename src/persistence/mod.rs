//! Persistence layer: the engagement store boundary.
//!
//! [`MarketStore`] is the durable record of gigs and bids. Mutating
//! operations with preconditions run against a [`StoreTx`], an explicit
//! transaction handle threaded through every store call of one atomic
//! unit. The handle is released on every exit path: [`StoreTx::commit`]
//! publishes the writes, dropping the handle aborts them in full.
//!
//! Two implementations: [`postgres::PostgresStore`] for production and
//! [`memory::MemoryStore`] for the dev profile and unit tests.

pub mod memory;
pub mod postgres;

use std::fmt;

use async_trait::async_trait;

use crate::domain::{Bid, BidId, BidStatus, Gig, GigId, GigStatus, UserId};
use crate::error::MarketError;

/// Durable store of gigs and bids.
///
/// Plain reads and unconditional inserts live here; anything that checks
/// state before writing goes through [`MarketStore::begin`].
#[async_trait]
pub trait MarketStore: fmt::Debug + Send + Sync {
    /// Opens a transaction for one atomic read-check-write unit.
    ///
    /// Implementations guarantee that no two concurrently committing
    /// transactions can both observe and act on the same gig as open:
    /// the first committer wins and the loser sees the committed state
    /// on its own locked re-read.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::Persistence`] if the transaction cannot be
    /// opened.
    async fn begin(&self) -> Result<Box<dyn StoreTx>, MarketError>;

    /// Inserts a freshly created gig.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::Persistence`] on store failure.
    async fn insert_gig(&self, gig: &Gig) -> Result<(), MarketError>;

    /// Fetches a gig by id.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::Persistence`] on store failure.
    async fn gig_by_id(&self, id: GigId) -> Result<Option<Gig>, MarketError>;

    /// Returns all open gigs, newest first, optionally filtered by a
    /// case-insensitive title search.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::Persistence`] on store failure.
    async fn open_gigs(&self, title_search: Option<&str>) -> Result<Vec<Gig>, MarketError>;

    /// Returns all gigs owned by `owner`, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::Persistence`] on store failure.
    async fn gigs_by_owner(&self, owner: UserId) -> Result<Vec<Gig>, MarketError>;

    /// Returns all bids on a gig, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::Persistence`] on store failure.
    async fn bids_for_gig(&self, gig: GigId) -> Result<Vec<Bid>, MarketError>;

    /// Fetches a bid by id.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::Persistence`] on store failure.
    async fn bid_by_id(&self, id: BidId) -> Result<Option<Bid>, MarketError>;

    /// Fetches the bid a specific bidder placed on a specific gig.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::Persistence`] on store failure.
    async fn bid_for_gig_and_bidder(
        &self,
        gig: GigId,
        bidder: UserId,
    ) -> Result<Option<Bid>, MarketError>;

    /// Returns all bids by `bidder` joined with their gigs, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::Persistence`] on store failure.
    async fn bids_by_bidder(&self, bidder: UserId) -> Result<Vec<(Bid, Gig)>, MarketError>;

    /// Returns the lowest-priced pending bid on a gig, if any.
    ///
    /// Read-side projection for the gig detail view; intentionally not
    /// transactional.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::Persistence`] on store failure.
    async fn lowest_pending_bid(&self, gig: GigId) -> Result<Option<Bid>, MarketError>;
}

/// One open transaction against the engagement store.
///
/// Reads through the handle lock the touched rows until commit or abort,
/// so a precondition checked here still holds when the write lands.
/// Dropping the handle without calling [`StoreTx::commit`] aborts the
/// transaction; no partial state ever becomes visible.
#[async_trait]
pub trait StoreTx: fmt::Debug + Send {
    /// Reads a gig and locks its row for the rest of the transaction.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::Conflict`] when the bounded lock wait
    /// expires (a concurrent transaction holds the row), or
    /// [`MarketError::Persistence`] on store failure.
    async fn gig_for_update(&mut self, id: GigId) -> Result<Option<Gig>, MarketError>;

    /// Reads a bid and locks its row for the rest of the transaction.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::Conflict`] on lock-wait expiry, or
    /// [`MarketError::Persistence`] on store failure.
    async fn bid_for_update(&mut self, id: BidId) -> Result<Option<Bid>, MarketError>;

    /// Inserts a freshly created bid.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::Conflict`] when the `(gig, bidder)`
    /// uniqueness constraint is violated, or [`MarketError::Persistence`]
    /// on store failure.
    async fn insert_bid(&mut self, bid: &Bid) -> Result<(), MarketError>;

    /// Marks a gig assigned and records the winning bid and bidder.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::Persistence`] on store failure.
    async fn assign_gig(
        &mut self,
        gig: GigId,
        bid: BidId,
        bidder: UserId,
    ) -> Result<(), MarketError>;

    /// Sets a gig's status.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::Persistence`] on store failure.
    async fn set_gig_status(&mut self, gig: GigId, status: GigStatus) -> Result<(), MarketError>;

    /// Sets a bid's status.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::Persistence`] on store failure.
    async fn set_bid_status(&mut self, bid: BidId, status: BidStatus) -> Result<(), MarketError>;

    /// Updates a bid's message and price in place.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::Persistence`] on store failure.
    async fn update_bid_terms(
        &mut self,
        bid: BidId,
        message: &str,
        price: i64,
    ) -> Result<(), MarketError>;

    /// Rejects every pending bid on `gig`, except `except` if given.
    ///
    /// One conditional bulk update inside the transaction; returns the
    /// number of bids rejected.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::Persistence`] on store failure.
    async fn reject_pending_bids(
        &mut self,
        gig: GigId,
        except: Option<BidId>,
    ) -> Result<u64, MarketError>;

    /// Commits the transaction, publishing all writes atomically.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::Conflict`] if a concurrent commit won the
    /// race, or [`MarketError::Persistence`] on store failure.
    async fn commit(self: Box<Self>) -> Result<(), MarketError>;
}
