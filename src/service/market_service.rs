//! Market service: the engagement state machine.
//!
//! All four mutating operations (hire, close, submit, revise) run their
//! read-check-write sequence against a single [`StoreTx`] handle, so the
//! preconditions they verify still hold at commit time. Notification of
//! the hired bidder happens strictly after commit, outside the
//! transaction boundary.

use std::sync::Arc;

use chrono::Utc;

use crate::domain::bid::validate_bid_fields;
use crate::domain::gig::validate_gig_fields;
use crate::domain::{Bid, BidId, BidStatus, Gig, GigId, GigStatus, Notification, Notifier, UserId};
use crate::error::MarketError;
use crate::persistence::MarketStore;

/// A gig as presented to a single viewer.
#[derive(Debug, Clone)]
pub struct GigDetail {
    /// The gig record.
    pub gig: Gig,
    /// Lowest-priced pending bid while the gig is open; informational
    /// read-side projection, not transactionally consistent.
    pub leading_bid: Option<Bid>,
    /// Whether the viewer owns this gig.
    pub is_owner: bool,
}

/// Orchestration layer for all marketplace operations.
///
/// Owns the store boundary for state and the [`Notifier`] for post-commit
/// event dispatch. Every mutation follows the pattern: begin transaction
/// → locked reads → precondition checks → writes → commit → notify.
/// Early returns drop the transaction handle, aborting it in full.
#[derive(Debug, Clone)]
pub struct MarketService {
    store: Arc<dyn MarketStore>,
    notifier: Notifier,
}

impl MarketService {
    /// Creates a new `MarketService`.
    #[must_use]
    pub fn new(store: Arc<dyn MarketStore>, notifier: Notifier) -> Self {
        Self { store, notifier }
    }

    /// Returns a reference to the inner [`Notifier`].
    #[must_use]
    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    /// Creates a new open gig owned by `caller`.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::Validation`] on field rule violations, or
    /// a persistence error.
    pub async fn create_gig(
        &self,
        caller: UserId,
        title: &str,
        description: &str,
        budget: i64,
    ) -> Result<Gig, MarketError> {
        let (title, description) = validate_gig_fields(title, description, budget)?;
        let gig = Gig::new(caller, title, description, budget);
        self.store.insert_gig(&gig).await?;
        tracing::info!(gig_id = %gig.id, owner = %caller, "gig created");
        Ok(gig)
    }

    /// Hires the bidder behind `bid_id`, assigning the gig to that bid.
    ///
    /// Atomically: the gig becomes assigned with the winning bid and
    /// bidder recorded, the bid becomes hired, and every other pending
    /// bid on the gig is rejected. After the transaction commits, the
    /// hired bidder is notified on a best-effort basis.
    ///
    /// When two hire calls race on the same gig, exactly one commits;
    /// the other observes the gig as no longer open and gets a conflict.
    ///
    /// # Errors
    ///
    /// [`MarketError::BidNotFound`] / [`MarketError::GigNotFound`] if a
    /// record is missing, [`MarketError::Forbidden`] if `caller` does not
    /// own the gig, [`MarketError::Conflict`] if the gig is not open or
    /// the bid is not pending. No mutation occurs on any failure path.
    pub async fn hire_bid(
        &self,
        bid_id: BidId,
        caller: UserId,
    ) -> Result<(Gig, Bid), MarketError> {
        let mut tx = self.store.begin().await?;

        // Lock order is bid first, then gig, everywhere a transaction
        // touches both.
        let Some(mut bid) = tx.bid_for_update(bid_id).await? else {
            return Err(MarketError::BidNotFound(bid_id));
        };
        let Some(mut gig) = tx.gig_for_update(bid.gig_id).await? else {
            return Err(MarketError::GigNotFound(bid.gig_id));
        };

        if !gig.is_owned_by(caller) {
            return Err(MarketError::Forbidden(
                "only the gig owner can hire a bidder".to_string(),
            ));
        }
        if !gig.is_open() {
            return Err(MarketError::Conflict(
                "this gig has already been assigned or closed".to_string(),
            ));
        }
        if !bid.is_pending() {
            return Err(MarketError::Conflict(
                "this bid is no longer available for hiring".to_string(),
            ));
        }

        tx.assign_gig(gig.id, bid.id, bid.bidder_id).await?;
        tx.set_bid_status(bid.id, BidStatus::Hired).await?;
        let rejected = tx.reject_pending_bids(gig.id, Some(bid.id)).await?;
        tx.commit().await?;

        let now = Utc::now();
        gig.status = GigStatus::Assigned;
        gig.hired_bid_id = Some(bid.id);
        gig.hired_bidder_id = Some(bid.bidder_id);
        gig.updated_at = now;
        bid.status = BidStatus::Hired;
        bid.updated_at = now;

        tracing::info!(
            gig_id = %gig.id,
            bid_id = %bid.id,
            bidder = %bid.bidder_id,
            rejected,
            "bidder hired"
        );

        // Post-commit, fire-and-forget: a slow or dead channel can never
        // block or undo the hire.
        self.notifier
            .notify(
                bid.bidder_id,
                Notification::BidHired {
                    gig_id: gig.id,
                    gig_title: gig.title.clone(),
                    bid_id: bid.id,
                },
            )
            .await;

        Ok((gig, bid))
    }

    /// Closes an open gig without hiring anyone.
    ///
    /// Atomically: the gig becomes closed and every pending bid on it is
    /// rejected.
    ///
    /// # Errors
    ///
    /// [`MarketError::GigNotFound`], [`MarketError::Forbidden`] if
    /// `caller` does not own the gig, [`MarketError::Conflict`] if the
    /// gig is not open. No mutation occurs on any failure path.
    pub async fn close_gig(&self, gig_id: GigId, caller: UserId) -> Result<Gig, MarketError> {
        let mut tx = self.store.begin().await?;

        let Some(mut gig) = tx.gig_for_update(gig_id).await? else {
            return Err(MarketError::GigNotFound(gig_id));
        };
        if !gig.is_owned_by(caller) {
            return Err(MarketError::Forbidden(
                "only the gig owner can close this gig".to_string(),
            ));
        }
        if !gig.is_open() {
            return Err(MarketError::Conflict(
                "this gig is already closed or assigned".to_string(),
            ));
        }

        tx.set_gig_status(gig.id, GigStatus::Closed).await?;
        let rejected = tx.reject_pending_bids(gig.id, None).await?;
        tx.commit().await?;

        gig.status = GigStatus::Closed;
        gig.updated_at = Utc::now();

        tracing::info!(gig_id = %gig.id, rejected, "gig closed");
        Ok(gig)
    }

    /// Submits a new pending bid by `caller` on `gig_id`.
    ///
    /// # Errors
    ///
    /// [`MarketError::Validation`] on field rule violations,
    /// [`MarketError::GigNotFound`], [`MarketError::Forbidden`] if the
    /// caller owns the gig, [`MarketError::Conflict`] if the gig is not
    /// open or the caller already has a bid on it.
    pub async fn submit_bid(
        &self,
        gig_id: GigId,
        caller: UserId,
        message: &str,
        price: i64,
    ) -> Result<Bid, MarketError> {
        let message = validate_bid_fields(message, price)?;

        let mut tx = self.store.begin().await?;
        let Some(gig) = tx.gig_for_update(gig_id).await? else {
            return Err(MarketError::GigNotFound(gig_id));
        };
        if gig.is_owned_by(caller) {
            return Err(MarketError::Forbidden(
                "you cannot bid on your own gig".to_string(),
            ));
        }
        if !gig.is_open() {
            return Err(MarketError::Conflict(
                "this gig is no longer accepting bids".to_string(),
            ));
        }

        let bid = Bid::new(gig_id, caller, message, price);
        tx.insert_bid(&bid).await?;
        tx.commit().await?;

        tracing::info!(gig_id = %gig_id, bid_id = %bid.id, bidder = %caller, "bid submitted");
        Ok(bid)
    }

    /// Revises the message and price of the caller's pending bid.
    ///
    /// # Errors
    ///
    /// [`MarketError::Validation`] on field rule violations,
    /// [`MarketError::BidNotFound`] / [`MarketError::GigNotFound`],
    /// [`MarketError::Forbidden`] if `caller` did not create the bid,
    /// [`MarketError::Conflict`] if the bid is not pending or the gig is
    /// not open. No mutation occurs on any failure path.
    pub async fn revise_bid(
        &self,
        bid_id: BidId,
        caller: UserId,
        message: &str,
        price: i64,
    ) -> Result<Bid, MarketError> {
        let message = validate_bid_fields(message, price)?;

        let mut tx = self.store.begin().await?;
        let Some(mut bid) = tx.bid_for_update(bid_id).await? else {
            return Err(MarketError::BidNotFound(bid_id));
        };
        if !bid.is_owned_by(caller) {
            return Err(MarketError::Forbidden(
                "you can only update your own bids".to_string(),
            ));
        }
        if !bid.is_pending() {
            return Err(MarketError::Conflict(
                "cannot update a bid that is not pending".to_string(),
            ));
        }
        let Some(gig) = tx.gig_for_update(bid.gig_id).await? else {
            return Err(MarketError::GigNotFound(bid.gig_id));
        };
        if !gig.is_open() {
            return Err(MarketError::Conflict(
                "this gig is no longer accepting bids".to_string(),
            ));
        }

        tx.update_bid_terms(bid.id, &message, price).await?;
        tx.commit().await?;

        bid.message = message;
        bid.price = price;
        bid.updated_at = Utc::now();

        tracing::info!(bid_id = %bid.id, "bid revised");
        Ok(bid)
    }

    /// Returns all open gigs, optionally filtered by title search.
    ///
    /// # Errors
    ///
    /// Returns a persistence error on store failure.
    pub async fn list_open_gigs(&self, search: Option<&str>) -> Result<Vec<Gig>, MarketError> {
        let search = search.map(str::trim).filter(|s| !s.is_empty());
        self.store.open_gigs(search).await
    }

    /// Returns the gigs owned by `caller`, newest first.
    ///
    /// # Errors
    ///
    /// Returns a persistence error on store failure.
    pub async fn gigs_for_owner(&self, caller: UserId) -> Result<Vec<Gig>, MarketError> {
        self.store.gigs_by_owner(caller).await
    }

    /// Returns a gig with its viewer-specific projections.
    ///
    /// # Errors
    ///
    /// [`MarketError::GigNotFound`], or a persistence error.
    pub async fn gig_detail(
        &self,
        gig_id: GigId,
        viewer: Option<UserId>,
    ) -> Result<GigDetail, MarketError> {
        let Some(gig) = self.store.gig_by_id(gig_id).await? else {
            return Err(MarketError::GigNotFound(gig_id));
        };
        let leading_bid = if gig.is_open() {
            self.store.lowest_pending_bid(gig_id).await?
        } else {
            None
        };
        let is_owner = viewer.is_some_and(|v| gig.is_owned_by(v));
        Ok(GigDetail {
            gig,
            leading_bid,
            is_owner,
        })
    }

    /// Returns every bid on a gig. Owner only.
    ///
    /// # Errors
    ///
    /// [`MarketError::GigNotFound`], [`MarketError::Forbidden`] if
    /// `caller` does not own the gig, or a persistence error.
    pub async fn bids_for_gig(
        &self,
        gig_id: GigId,
        caller: UserId,
    ) -> Result<Vec<Bid>, MarketError> {
        let Some(gig) = self.store.gig_by_id(gig_id).await? else {
            return Err(MarketError::GigNotFound(gig_id));
        };
        if !gig.is_owned_by(caller) {
            return Err(MarketError::Forbidden(
                "only the gig owner can view bids".to_string(),
            ));
        }
        self.store.bids_for_gig(gig_id).await
    }

    /// Returns the caller's own bid on a gig.
    ///
    /// # Errors
    ///
    /// [`MarketError::NoBidForGig`] if the caller has no bid on the gig,
    /// or a persistence error.
    pub async fn my_bid(&self, gig_id: GigId, caller: UserId) -> Result<Bid, MarketError> {
        self.store
            .bid_for_gig_and_bidder(gig_id, caller)
            .await?
            .ok_or(MarketError::NoBidForGig(gig_id))
    }

    /// Returns the caller's bids across all gigs, with their gigs.
    ///
    /// # Errors
    ///
    /// Returns a persistence error on store failure.
    pub async fn bids_for_bidder(&self, caller: UserId) -> Result<Vec<(Bid, Gig)>, MarketError> {
        self.store.bids_by_bidder(caller).await
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::session_registry::{ChannelHandle, SessionRegistry};
    use crate::persistence::memory::MemoryStore;

    fn make_service() -> (MarketService, Arc<SessionRegistry>) {
        let registry = Arc::new(SessionRegistry::new());
        let notifier = Notifier::new(Arc::clone(&registry));
        let service = MarketService::new(Arc::new(MemoryStore::new()), notifier);
        (service, registry)
    }

    async fn open_gig(service: &MarketService, owner: UserId) -> Gig {
        let Ok(gig) = service
            .create_gig(owner, "Paint the fence", "Two coats of white, back garden.", 500)
            .await
        else {
            panic!("gig creation failed");
        };
        gig
    }

    async fn pending_bid(service: &MarketService, gig: GigId, bidder: UserId, price: i64) -> Bid {
        let Ok(bid) = service
            .submit_bid(gig, bidder, "I can start on Monday.", price)
            .await
        else {
            panic!("bid submission failed");
        };
        bid
    }

    #[tokio::test]
    async fn hire_assigns_gig_and_rejects_competitors() {
        let (service, registry) = make_service();
        let owner = UserId::new();
        let gig = open_gig(&service, owner).await;
        let o1 = pending_bid(&service, gig.id, UserId::new(), 100).await;
        let o2 = pending_bid(&service, gig.id, UserId::new(), 80).await;

        let (handle, mut rx) = ChannelHandle::new();
        registry.register(o1.bidder_id, handle).await;

        let result = service.hire_bid(o1.id, owner).await;
        let Ok((hired_gig, hired_bid)) = result else {
            panic!("hire failed");
        };
        assert_eq!(hired_gig.status, GigStatus::Assigned);
        assert_eq!(hired_gig.hired_bid_id, Some(o1.id));
        assert_eq!(hired_gig.hired_bidder_id, Some(o1.bidder_id));
        assert_eq!(hired_bid.status, BidStatus::Hired);

        // cascade: the competing bid is rejected
        let Ok(loser) = service.my_bid(gig.id, o2.bidder_id).await else {
            panic!("competitor bid vanished");
        };
        assert_eq!(loser.status, BidStatus::Rejected);

        // the winner was notified with matching ids
        let Some(Notification::BidHired {
            gig_id,
            gig_title,
            bid_id,
        }) = rx.recv().await
        else {
            panic!("expected a bid_hired notification");
        };
        assert_eq!(gig_id, gig.id);
        assert_eq!(gig_title, "Paint the fence");
        assert_eq!(bid_id, o1.id);
        assert!(rx.try_recv().is_err()); // exactly one event
    }

    #[tokio::test]
    async fn concurrent_hires_produce_one_winner() {
        let (service, _registry) = make_service();
        let owner = UserId::new();
        let gig = open_gig(&service, owner).await;
        let o1 = pending_bid(&service, gig.id, UserId::new(), 100).await;
        let o2 = pending_bid(&service, gig.id, UserId::new(), 80).await;

        let service = Arc::new(service);
        let s1 = Arc::clone(&service);
        let s2 = Arc::clone(&service);
        let h1 = tokio::spawn(async move { s1.hire_bid(o1.id, owner).await });
        let h2 = tokio::spawn(async move { s2.hire_bid(o2.id, owner).await });

        let (r1, r2) = (h1.await, h2.await);
        let (Ok(r1), Ok(r2)) = (r1, r2) else {
            panic!("hire task panicked");
        };

        let successes = [&r1, &r2].iter().filter(|r| r.is_ok()).count();
        assert_eq!(successes, 1);
        let conflicts = [&r1, &r2]
            .iter()
            .filter(|r| matches!(r, Err(MarketError::Conflict(_))))
            .count();
        assert_eq!(conflicts, 1);

        // final state matches whichever committed first
        let Ok(detail) = service.gig_detail(gig.id, None).await else {
            panic!("gig vanished");
        };
        assert_eq!(detail.gig.status, GigStatus::Assigned);
        let winner = detail.gig.hired_bid_id;
        assert!(winner == Some(o1.id) || winner == Some(o2.id));
        assert!(detail.leading_bid.is_none());
    }

    #[tokio::test]
    async fn non_owner_cannot_hire() {
        let (service, _registry) = make_service();
        let owner = UserId::new();
        let gig = open_gig(&service, owner).await;
        let bid = pending_bid(&service, gig.id, UserId::new(), 100).await;

        let result = service.hire_bid(bid.id, UserId::new()).await;
        assert!(matches!(result, Err(MarketError::Forbidden(_))));

        // no state change
        let Ok(detail) = service.gig_detail(gig.id, None).await else {
            panic!("gig vanished");
        };
        assert_eq!(detail.gig.status, GigStatus::Open);
        let Ok(unchanged) = service.my_bid(gig.id, bid.bidder_id).await else {
            panic!("bid vanished");
        };
        assert_eq!(unchanged.status, BidStatus::Pending);
    }

    #[tokio::test]
    async fn hire_on_unknown_bid_is_not_found() {
        let (service, _registry) = make_service();
        let result = service.hire_bid(BidId::new(), UserId::new()).await;
        assert!(matches!(result, Err(MarketError::BidNotFound(_))));
    }

    #[tokio::test]
    async fn hire_after_close_conflicts() {
        let (service, _registry) = make_service();
        let owner = UserId::new();
        let gig = open_gig(&service, owner).await;
        let bid = pending_bid(&service, gig.id, UserId::new(), 100).await;

        assert!(service.close_gig(gig.id, owner).await.is_ok());
        let result = service.hire_bid(bid.id, owner).await;
        assert!(matches!(result, Err(MarketError::Conflict(_))));
    }

    #[tokio::test]
    async fn close_rejects_all_pending_bids() {
        let (service, _registry) = make_service();
        let owner = UserId::new();
        let gig = open_gig(&service, owner).await;
        let o1 = pending_bid(&service, gig.id, UserId::new(), 100).await;
        let o2 = pending_bid(&service, gig.id, UserId::new(), 80).await;

        let Ok(closed) = service.close_gig(gig.id, owner).await else {
            panic!("close failed");
        };
        assert_eq!(closed.status, GigStatus::Closed);
        assert!(closed.hired_bid_id.is_none());

        for bid in [o1, o2] {
            let Ok(after) = service.my_bid(gig.id, bid.bidder_id).await else {
                panic!("bid vanished");
            };
            assert_eq!(after.status, BidStatus::Rejected);
        }
    }

    #[tokio::test]
    async fn close_by_non_owner_is_forbidden() {
        let (service, _registry) = make_service();
        let gig = open_gig(&service, UserId::new()).await;
        let result = service.close_gig(gig.id, UserId::new()).await;
        assert!(matches!(result, Err(MarketError::Forbidden(_))));
    }

    #[tokio::test]
    async fn close_twice_conflicts() {
        let (service, _registry) = make_service();
        let owner = UserId::new();
        let gig = open_gig(&service, owner).await;
        assert!(service.close_gig(gig.id, owner).await.is_ok());
        let second = service.close_gig(gig.id, owner).await;
        assert!(matches!(second, Err(MarketError::Conflict(_))));
    }

    #[tokio::test]
    async fn duplicate_bid_conflicts_and_first_is_unchanged() {
        let (service, _registry) = make_service();
        let gig = open_gig(&service, UserId::new()).await;
        let bidder = UserId::new();
        let first = pending_bid(&service, gig.id, bidder, 100).await;

        let second = service
            .submit_bid(gig.id, bidder, "Actually I will do it cheaper.", 90)
            .await;
        assert!(matches!(second, Err(MarketError::Conflict(_))));

        let Ok(stored) = service.my_bid(gig.id, bidder).await else {
            panic!("bid vanished");
        };
        assert_eq!(stored.price, first.price);
        assert_eq!(stored.message, first.message);
    }

    #[tokio::test]
    async fn owner_cannot_bid_on_own_gig() {
        let (service, _registry) = make_service();
        let owner = UserId::new();
        let gig = open_gig(&service, owner).await;
        let result = service
            .submit_bid(gig.id, owner, "Bidding on my own work.", 100)
            .await;
        assert!(matches!(result, Err(MarketError::Forbidden(_))));
    }

    #[tokio::test]
    async fn bid_on_closed_gig_conflicts() {
        let (service, _registry) = make_service();
        let owner = UserId::new();
        let gig = open_gig(&service, owner).await;
        service.close_gig(gig.id, owner).await.ok();

        let result = service
            .submit_bid(gig.id, UserId::new(), "Too late to the party.", 100)
            .await;
        assert!(matches!(result, Err(MarketError::Conflict(_))));
    }

    #[tokio::test]
    async fn bid_with_invalid_fields_is_rejected() {
        let (service, _registry) = make_service();
        let gig = open_gig(&service, UserId::new()).await;
        let result = service.submit_bid(gig.id, UserId::new(), "hi", 0).await;
        let Err(MarketError::Validation(errors)) = result else {
            panic!("expected validation failure");
        };
        assert_eq!(errors.len(), 2);
    }

    #[tokio::test]
    async fn revise_updates_pending_bid() {
        let (service, _registry) = make_service();
        let gig = open_gig(&service, UserId::new()).await;
        let bidder = UserId::new();
        let bid = pending_bid(&service, gig.id, bidder, 100).await;

        let Ok(revised) = service
            .revise_bid(bid.id, bidder, "New plan, lower price.", 85)
            .await
        else {
            panic!("revise failed");
        };
        assert_eq!(revised.price, 85);
        assert_eq!(revised.status, BidStatus::Pending);

        let Ok(stored) = service.my_bid(gig.id, bidder).await else {
            panic!("bid vanished");
        };
        assert_eq!(stored.price, 85);
        assert_eq!(stored.message, "New plan, lower price.");
    }

    #[tokio::test]
    async fn revise_terminal_bid_conflicts_and_preserves_fields() {
        let (service, _registry) = make_service();
        let owner = UserId::new();
        let gig = open_gig(&service, owner).await;
        let bidder = UserId::new();
        let bid = pending_bid(&service, gig.id, bidder, 100).await;

        service.hire_bid(bid.id, owner).await.ok();

        let result = service
            .revise_bid(bid.id, bidder, "Trying to change a done deal.", 60)
            .await;
        assert!(matches!(result, Err(MarketError::Conflict(_))));

        let Ok(stored) = service.my_bid(gig.id, bidder).await else {
            panic!("bid vanished");
        };
        assert_eq!(stored.price, 100);
        assert_eq!(stored.status, BidStatus::Hired);
    }

    #[tokio::test]
    async fn revise_someone_elses_bid_is_forbidden() {
        let (service, _registry) = make_service();
        let gig = open_gig(&service, UserId::new()).await;
        let bid = pending_bid(&service, gig.id, UserId::new(), 100).await;

        let result = service
            .revise_bid(bid.id, UserId::new(), "Hijacking this bid.", 50)
            .await;
        assert!(matches!(result, Err(MarketError::Forbidden(_))));
    }

    #[tokio::test]
    async fn notification_reaches_only_the_hired_bidder() {
        let (service, registry) = make_service();
        let owner = UserId::new();
        let gig = open_gig(&service, owner).await;
        let winner = pending_bid(&service, gig.id, UserId::new(), 100).await;
        let loser = pending_bid(&service, gig.id, UserId::new(), 80).await;

        let (wh, mut winner_rx) = ChannelHandle::new();
        let (lh, mut loser_rx) = ChannelHandle::new();
        registry.register(winner.bidder_id, wh).await;
        registry.register(loser.bidder_id, lh).await;

        assert!(service.hire_bid(winner.id, owner).await.is_ok());

        assert!(winner_rx.recv().await.is_some());
        assert!(winner_rx.try_recv().is_err());
        assert!(loser_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn hire_without_any_sessions_still_succeeds() {
        let (service, _registry) = make_service();
        let owner = UserId::new();
        let gig = open_gig(&service, owner).await;
        let bid = pending_bid(&service, gig.id, UserId::new(), 100).await;

        assert!(service.hire_bid(bid.id, owner).await.is_ok());
    }

    #[tokio::test]
    async fn gig_detail_projects_leading_bid_for_open_gig() {
        let (service, _registry) = make_service();
        let owner = UserId::new();
        let gig = open_gig(&service, owner).await;
        pending_bid(&service, gig.id, UserId::new(), 100).await;
        let cheapest = pending_bid(&service, gig.id, UserId::new(), 80).await;

        let Ok(detail) = service.gig_detail(gig.id, Some(owner)).await else {
            panic!("gig vanished");
        };
        assert!(detail.is_owner);
        assert_eq!(detail.leading_bid.map(|b| b.id), Some(cheapest.id));

        let Ok(anon) = service.gig_detail(gig.id, None).await else {
            panic!("gig vanished");
        };
        assert!(!anon.is_owner);
    }

    #[tokio::test]
    async fn bids_listing_is_owner_only() {
        let (service, _registry) = make_service();
        let owner = UserId::new();
        let gig = open_gig(&service, owner).await;
        pending_bid(&service, gig.id, UserId::new(), 100).await;

        let Ok(bids) = service.bids_for_gig(gig.id, owner).await else {
            panic!("owner listing failed");
        };
        assert_eq!(bids.len(), 1);

        let result = service.bids_for_gig(gig.id, UserId::new()).await;
        assert!(matches!(result, Err(MarketError::Forbidden(_))));
    }

    #[tokio::test]
    async fn my_bid_absent_is_not_found() {
        let (service, _registry) = make_service();
        let gig = open_gig(&service, UserId::new()).await;
        let result = service.my_bid(gig.id, UserId::new()).await;
        assert!(matches!(result, Err(MarketError::NoBidForGig(_))));
    }

    #[tokio::test]
    async fn bids_for_bidder_joins_gigs() {
        let (service, _registry) = make_service();
        let bidder = UserId::new();
        let gig_a = open_gig(&service, UserId::new()).await;
        let gig_b = open_gig(&service, UserId::new()).await;
        pending_bid(&service, gig_a.id, bidder, 100).await;
        pending_bid(&service, gig_b.id, bidder, 200).await;

        let Ok(mine) = service.bids_for_bidder(bidder).await else {
            panic!("listing failed");
        };
        assert_eq!(mine.len(), 2);
        assert!(mine.iter().all(|(bid, gig)| bid.gig_id == gig.id));
    }

    #[tokio::test]
    async fn search_filters_open_gigs() {
        let (service, _registry) = make_service();
        let owner = UserId::new();
        open_gig(&service, owner).await;
        service
            .create_gig(owner, "Design a logo", "Vector format, two revisions.", 300)
            .await
            .ok();

        let Ok(all) = service.list_open_gigs(None).await else {
            panic!("listing failed");
        };
        assert_eq!(all.len(), 2);

        let Ok(found) = service.list_open_gigs(Some("fence")).await else {
            panic!("listing failed");
        };
        assert_eq!(found.len(), 1);

        // blank search behaves like no search
        let Ok(blank) = service.list_open_gigs(Some("   ")).await else {
            panic!("listing failed");
        };
        assert_eq!(blank.len(), 2);
    }
}
