//! In-process engagement store for the dev profile and unit tests.
//!
//! One async mutex serializes transactions: the handle returned by
//! `begin` holds the lock until commit or drop, which makes the
//! first-committer-wins guarantee trivial. A racing transaction cannot
//! even start its reads until the winner released the state. Writes are
//! staged on the handle and applied on commit, so an abort (drop) leaves
//! no partial state behind.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::{MarketStore, StoreTx};
use crate::domain::{Bid, BidId, BidStatus, Gig, GigId, GigStatus, UserId};
use crate::error::MarketError;

#[derive(Debug, Default)]
struct MemoryState {
    gigs: HashMap<GigId, Gig>,
    bids: HashMap<BidId, Bid>,
}

/// Memory-backed engagement store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[derive(Debug)]
enum Mutation {
    InsertBid(Bid),
    AssignGig {
        gig: GigId,
        bid: BidId,
        bidder: UserId,
    },
    SetGigStatus {
        gig: GigId,
        status: GigStatus,
    },
    SetBidStatus {
        bid: BidId,
        status: BidStatus,
    },
    UpdateBidTerms {
        bid: BidId,
        message: String,
        price: i64,
    },
    RejectPendingBids {
        gig: GigId,
        except: Option<BidId>,
    },
}

/// One open transaction: the state lock plus staged writes.
#[derive(Debug)]
struct MemoryTx {
    guard: OwnedMutexGuard<MemoryState>,
    staged: Vec<Mutation>,
}

fn sorted_newest_first(mut gigs: Vec<Gig>) -> Vec<Gig> {
    gigs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    gigs
}

#[async_trait]
impl MarketStore for MemoryStore {
    async fn begin(&self) -> Result<Box<dyn StoreTx>, MarketError> {
        let guard = Arc::clone(&self.state).lock_owned().await;
        Ok(Box::new(MemoryTx {
            guard,
            staged: Vec::new(),
        }))
    }

    async fn insert_gig(&self, gig: &Gig) -> Result<(), MarketError> {
        let mut state = self.state.lock().await;
        state.gigs.insert(gig.id, gig.clone());
        Ok(())
    }

    async fn gig_by_id(&self, id: GigId) -> Result<Option<Gig>, MarketError> {
        Ok(self.state.lock().await.gigs.get(&id).cloned())
    }

    async fn open_gigs(&self, title_search: Option<&str>) -> Result<Vec<Gig>, MarketError> {
        let state = self.state.lock().await;
        let needle = title_search.map(str::to_lowercase);
        let gigs = state
            .gigs
            .values()
            .filter(|g| g.is_open())
            .filter(|g| {
                needle
                    .as_deref()
                    .is_none_or(|n| g.title.to_lowercase().contains(n))
            })
            .cloned()
            .collect();
        Ok(sorted_newest_first(gigs))
    }

    async fn gigs_by_owner(&self, owner: UserId) -> Result<Vec<Gig>, MarketError> {
        let state = self.state.lock().await;
        let gigs = state
            .gigs
            .values()
            .filter(|g| g.owner_id == owner)
            .cloned()
            .collect();
        Ok(sorted_newest_first(gigs))
    }

    async fn bids_for_gig(&self, gig: GigId) -> Result<Vec<Bid>, MarketError> {
        let state = self.state.lock().await;
        let mut bids: Vec<Bid> = state
            .bids
            .values()
            .filter(|b| b.gig_id == gig)
            .cloned()
            .collect();
        bids.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(bids)
    }

    async fn bid_by_id(&self, id: BidId) -> Result<Option<Bid>, MarketError> {
        Ok(self.state.lock().await.bids.get(&id).cloned())
    }

    async fn bid_for_gig_and_bidder(
        &self,
        gig: GigId,
        bidder: UserId,
    ) -> Result<Option<Bid>, MarketError> {
        let state = self.state.lock().await;
        Ok(state
            .bids
            .values()
            .find(|b| b.gig_id == gig && b.bidder_id == bidder)
            .cloned())
    }

    async fn bids_by_bidder(&self, bidder: UserId) -> Result<Vec<(Bid, Gig)>, MarketError> {
        let state = self.state.lock().await;
        let mut bids: Vec<Bid> = state
            .bids
            .values()
            .filter(|b| b.bidder_id == bidder)
            .cloned()
            .collect();
        bids.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(bids
            .into_iter()
            .filter_map(|bid| state.gigs.get(&bid.gig_id).cloned().map(|gig| (bid, gig)))
            .collect())
    }

    async fn lowest_pending_bid(&self, gig: GigId) -> Result<Option<Bid>, MarketError> {
        let state = self.state.lock().await;
        Ok(state
            .bids
            .values()
            .filter(|b| b.gig_id == gig && b.is_pending())
            .min_by(|a, b| a.price.cmp(&b.price).then(a.created_at.cmp(&b.created_at)))
            .cloned())
    }
}

#[async_trait]
impl StoreTx for MemoryTx {
    async fn gig_for_update(&mut self, id: GigId) -> Result<Option<Gig>, MarketError> {
        Ok(self.guard.gigs.get(&id).cloned())
    }

    async fn bid_for_update(&mut self, id: BidId) -> Result<Option<Bid>, MarketError> {
        Ok(self.guard.bids.get(&id).cloned())
    }

    async fn insert_bid(&mut self, bid: &Bid) -> Result<(), MarketError> {
        let duplicate = self
            .guard
            .bids
            .values()
            .any(|b| b.gig_id == bid.gig_id && b.bidder_id == bid.bidder_id)
            || self.staged.iter().any(|m| {
                matches!(m, Mutation::InsertBid(staged)
                    if staged.gig_id == bid.gig_id && staged.bidder_id == bid.bidder_id)
            });
        if duplicate {
            return Err(MarketError::Conflict(
                "you have already submitted a bid for this gig".to_string(),
            ));
        }
        self.staged.push(Mutation::InsertBid(bid.clone()));
        Ok(())
    }

    async fn assign_gig(
        &mut self,
        gig: GigId,
        bid: BidId,
        bidder: UserId,
    ) -> Result<(), MarketError> {
        self.staged.push(Mutation::AssignGig { gig, bid, bidder });
        Ok(())
    }

    async fn set_gig_status(&mut self, gig: GigId, status: GigStatus) -> Result<(), MarketError> {
        self.staged.push(Mutation::SetGigStatus { gig, status });
        Ok(())
    }

    async fn set_bid_status(&mut self, bid: BidId, status: BidStatus) -> Result<(), MarketError> {
        self.staged.push(Mutation::SetBidStatus { bid, status });
        Ok(())
    }

    async fn update_bid_terms(
        &mut self,
        bid: BidId,
        message: &str,
        price: i64,
    ) -> Result<(), MarketError> {
        self.staged.push(Mutation::UpdateBidTerms {
            bid,
            message: message.to_string(),
            price,
        });
        Ok(())
    }

    async fn reject_pending_bids(
        &mut self,
        gig: GigId,
        except: Option<BidId>,
    ) -> Result<u64, MarketError> {
        let count = self
            .guard
            .bids
            .values()
            .filter(|b| b.gig_id == gig && b.is_pending() && Some(b.id) != except)
            .count() as u64;
        self.staged.push(Mutation::RejectPendingBids { gig, except });
        Ok(count)
    }

    async fn commit(mut self: Box<Self>) -> Result<(), MarketError> {
        let now = Utc::now();
        for mutation in self.staged.drain(..) {
            match mutation {
                Mutation::InsertBid(bid) => {
                    self.guard.bids.insert(bid.id, bid);
                }
                Mutation::AssignGig { gig, bid, bidder } => {
                    if let Some(g) = self.guard.gigs.get_mut(&gig) {
                        g.status = GigStatus::Assigned;
                        g.hired_bid_id = Some(bid);
                        g.hired_bidder_id = Some(bidder);
                        g.updated_at = now;
                    }
                }
                Mutation::SetGigStatus { gig, status } => {
                    if let Some(g) = self.guard.gigs.get_mut(&gig) {
                        g.status = status;
                        g.updated_at = now;
                    }
                }
                Mutation::SetBidStatus { bid, status } => {
                    if let Some(b) = self.guard.bids.get_mut(&bid) {
                        b.status = status;
                        b.updated_at = now;
                    }
                }
                Mutation::UpdateBidTerms {
                    bid,
                    message,
                    price,
                } => {
                    if let Some(b) = self.guard.bids.get_mut(&bid) {
                        b.message = message;
                        b.price = price;
                        b.updated_at = now;
                    }
                }
                Mutation::RejectPendingBids { gig, except } => {
                    for b in self.guard.bids.values_mut() {
                        if b.gig_id == gig && b.is_pending() && Some(b.id) != except {
                            b.status = BidStatus::Rejected;
                            b.updated_at = now;
                        }
                    }
                }
            }
        }
        Ok(())
    }
}
