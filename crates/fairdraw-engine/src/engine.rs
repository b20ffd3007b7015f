//! The allocation state machine.
//!
//! [`AllocationEngine`] owns all mutable draw state and exposes it only
//! through the operations below. Every operation checks all of its
//! preconditions before touching state and either applies fully or
//! returns an error with no effect.
//!
//! ```text
//!  window open           window closed
//! ─────────────┬───────────────────────────────────────────────────────────
//!  enter       │ provide_selection_entropy → (delivery) → advance_shuffle*
//!              │ claim*  ──▶ request_reveal → (delivery) ──▶ query
//!              │ withdraw_proceeds (owner, once)
//! ```
//!
//! Selection state is created lazily on the first post-close call, from
//! the final ledger length and the available supply. The same call seals
//! the ledger, so later entries are refused even if they carry an
//! in-window timestamp.

use chrono::{DateTime, Utc};
use fairdraw_ledger::{EntryLedger, EntryReceipt};
use fairdraw_reveal::{MetadataAssigner, render_content};
use fairdraw_settlement::{ClaimOutcome, ClaimProcessor, ProceedsVault, SettlementSink};
use fairdraw_shuffle::{DeferredShuffle, ShuffleProgress, compute_ordering_root};
use fairdraw_types::constants::{ENGINE_NAME, VERSION};
use fairdraw_types::{
    DrawConfig, DrawEvent, FairdrawError, Fulfillment, ItemId, ItemMetadata, MetadataRange,
    ParticipantId, RandomnessPurpose, RequestId, Result, SelectionStatus,
};
use rust_decimal::Decimal;

use crate::randomness::{RandomnessProvider, RandomnessRouter};

/// One draw: ledger, selection, settlement, reveal, and administration.
#[derive(Debug)]
pub struct AllocationEngine {
    config: DrawConfig,
    ledger: EntryLedger,
    /// `None` until the first operation after the window closes.
    selection: Option<DeferredShuffle>,
    claims: ClaimProcessor,
    reveal: MetadataAssigner,
    router: RandomnessRouter,
    proceeds: ProceedsVault,
    /// Fee attached to the next randomness request.
    randomness_fee: Decimal,
    events: Vec<DrawEvent>,
}

impl AllocationEngine {
    /// Build an engine from a validated config.
    ///
    /// # Errors
    /// Returns `Configuration` if the config is inconsistent.
    pub fn new(config: DrawConfig) -> Result<Self> {
        config.validate()?;
        let oracle = config.oracle_verifying_key()?;
        tracing::info!(
            engine = ENGINE_NAME,
            version = VERSION,
            supply = config.available_supply,
            cap = config.max_per_participant,
            price = %config.unit_price,
            start = %config.start,
            end = %config.end,
            oracle = oracle.is_some(),
            "Draw configured"
        );
        Ok(Self {
            ledger: EntryLedger::new(&config),
            selection: None,
            claims: ClaimProcessor::new(&config),
            reveal: MetadataAssigner::new(),
            router: RandomnessRouter::new(oracle),
            proceeds: ProceedsVault::new(),
            randomness_fee: config.randomness_fee,
            events: Vec::new(),
            config,
        })
    }

    #[must_use]
    pub fn config(&self) -> &DrawConfig {
        &self.config
    }

    // ── Entry ──────────────────────────────────────────────────────────

    /// Buy `count` tickets for `participant`.
    ///
    /// # Errors
    /// - `LedgerSealed` once any post-sale operation has observed the close
    /// - the ledger's window, cap and payment errors
    pub fn enter(
        &mut self,
        participant: ParticipantId,
        count: usize,
        payment: Decimal,
        now: DateTime<Utc>,
    ) -> Result<EntryReceipt> {
        let receipt = self.ledger.enter(participant, count, payment, now)?;
        self.events.push(DrawEvent::EntryRecorded { participant, count });
        Ok(receipt)
    }

    // ── Selection ──────────────────────────────────────────────────────

    /// Close-gate shared by every post-sale operation; derives the
    /// selection state on first use.
    fn ensure_closed(&mut self, now: DateTime<Utc>) -> Result<()> {
        self.ledger.window().check_closed(now)?;
        if self.selection.is_none() {
            self.ledger.seal();
            let shuffle = DeferredShuffle::new(self.ledger.len(), self.config.available_supply);
            tracing::info!(
                entries = self.ledger.len(),
                supply = self.config.available_supply,
                status = %shuffle.status(),
                "Entry window closed"
            );
            self.selection = Some(shuffle);
        }
        Ok(())
    }

    fn selection_mut(&mut self) -> Result<&mut DeferredShuffle> {
        self.selection
            .as_mut()
            .ok_or_else(|| FairdrawError::Internal("selection state not derived".to_string()))
    }

    /// Ask `provider` for the selection entropy.
    ///
    /// # Errors
    /// - `WindowStillOpen` before the window ends
    /// - `SelectionNotRequired` when entries fit within supply
    /// - `WrongSelectionStatus` if already requested or received
    /// - `ProviderRejected` if the provider refuses (nothing recorded)
    pub fn provide_selection_entropy<P: RandomnessProvider>(
        &mut self,
        now: DateTime<Utc>,
        provider: &mut P,
    ) -> Result<RequestId> {
        self.ensure_closed(now)?;
        self.selection_mut()?.check_request()?;

        let fee = self.randomness_fee;
        let request = self
            .router
            .issue(RandomnessPurpose::Selection, fee, provider)?;
        self.selection_mut()?.mark_requested()?;

        self.events.push(DrawEvent::RandomnessRequested {
            request_id: request.id,
            purpose: request.purpose,
            fee,
        });
        Ok(request.id)
    }

    /// Apply the next `batch_size` shuffle steps.
    ///
    /// Anyone may call this; the result does not depend on how the work
    /// is split.
    pub fn advance_shuffle(&mut self, now: DateTime<Utc>, batch_size: usize) -> Result<ShuffleProgress> {
        self.ensure_closed(now)?;
        let shuffle = self
            .selection
            .as_mut()
            .ok_or_else(|| FairdrawError::Internal("selection state not derived".to_string()))?;
        let progress = shuffle.advance(&mut self.ledger, batch_size)?;
        self.events.push(DrawEvent::ShuffleProgress {
            cursor: progress.to,
            batch: batch_size,
        });
        Ok(progress)
    }

    /// Apply the next `min(shuffle_batch, remaining)` steps.
    ///
    /// # Errors
    /// As [`advance_shuffle`](Self::advance_shuffle); `WrongSelectionStatus`
    /// once selection is complete.
    pub fn advance_shuffle_step(&mut self, now: DateTime<Utc>) -> Result<ShuffleProgress> {
        self.ensure_closed(now)?;
        let remaining = self.selection.as_ref().map_or(0, DeferredShuffle::remaining);
        let batch = self.config.shuffle_batch.min(remaining);
        self.advance_shuffle(now, batch)
    }

    // ── Randomness delivery ────────────────────────────────────────────

    /// Inbound fulfillment for an earlier request.
    ///
    /// The purpose comes from the request record, so selection and reveal
    /// values can never be confused.
    ///
    /// # Errors
    /// - `UnknownRequest` for ids never issued or already fulfilled
    /// - `InvalidRandomnessProof` when an oracle key is configured and the
    ///   signature does not verify
    /// - the target's state error if it can no longer accept the value
    pub fn on_randomness_delivered(&mut self, fulfillment: Fulfillment) -> Result<RandomnessPurpose> {
        let purpose = match self.router.check_fulfillment(&fulfillment) {
            Ok(purpose) => purpose,
            Err(err) => {
                tracing::warn!(
                    request_id = %fulfillment.request_id,
                    error = %err,
                    "Randomness delivery rejected"
                );
                return Err(err);
            }
        };

        match purpose {
            RandomnessPurpose::Selection => {
                self.selection_mut()?.check_accept()?;
                self.router.complete(fulfillment.request_id)?;
                self.selection_mut()?.accept_entropy(fulfillment.value)?;
                self.events.push(DrawEvent::SelectionEntropyReceived {
                    request_id: fulfillment.request_id,
                });
            }
            RandomnessPurpose::Reveal => {
                let settled = self.claims.settled();
                self.reveal.check_reveal(settled)?;
                self.router.complete(fulfillment.request_id)?;
                let range = self.reveal.apply(fulfillment.value, settled)?;
                self.events.push(DrawEvent::MetadataRevealed {
                    request_id: fulfillment.request_id,
                    range,
                });
            }
        }
        Ok(purpose)
    }

    // ── Settlement ─────────────────────────────────────────────────────

    /// Settle `indices` for `participant`: winners mint, losers refund.
    ///
    /// # Errors
    /// - `WindowStillOpen` before the window ends
    /// - `SelectionNotFinalized` while a required shuffle is unfinished
    /// - any claim validation, sink, or conservation error (no effect)
    pub fn claim<S: SettlementSink>(
        &mut self,
        now: DateTime<Utc>,
        participant: ParticipantId,
        indices: &[usize],
        sink: &mut S,
    ) -> Result<ClaimOutcome> {
        self.ensure_closed(now)?;
        let status = self.selection_status();
        if !status.is_final() {
            return Err(FairdrawError::SelectionNotFinalized(status));
        }

        let outcome = self.claims.claim(&mut self.ledger, participant, indices, sink)?;
        self.events.push(DrawEvent::TicketsClaimed {
            participant,
            minted: outcome.minted.len(),
            refunded: outcome.refunded.len(),
            refund: outcome.refund,
        });
        Ok(outcome)
    }

    // ── Reveal ─────────────────────────────────────────────────────────

    /// Ask `provider` for entropy covering the items minted since the last
    /// reveal.
    ///
    /// # Errors
    /// - `NothingToReveal` when no unrevealed item exists
    /// - `RequestAlreadyOutstanding` while an earlier reveal is pending
    pub fn request_reveal<P: RandomnessProvider>(&mut self, provider: &mut P) -> Result<RequestId> {
        self.reveal.check_reveal(self.claims.settled())?;
        let fee = self.randomness_fee;
        let request = self.router.issue(RandomnessPurpose::Reveal, fee, provider)?;
        self.events.push(DrawEvent::RandomnessRequested {
            request_id: request.id,
            purpose: request.purpose,
            fee,
        });
        Ok(request.id)
    }

    // ── Administration ─────────────────────────────────────────────────

    fn check_owner(&self, caller: ParticipantId) -> Result<()> {
        if caller == self.config.owner {
            Ok(())
        } else {
            Err(FairdrawError::Unauthorized { caller })
        }
    }

    /// Pay `unit_price × min(entries, supply)` to the owner, once.
    ///
    /// # Errors
    /// - `Unauthorized` unless `caller` is the owner
    /// - `WindowStillOpen` before the window ends
    /// - `ProceedsAlreadyWithdrawn` on a second attempt
    /// - the sink's transfer error (flag stays clear, retry allowed)
    pub fn withdraw_proceeds<S: SettlementSink>(
        &mut self,
        now: DateTime<Utc>,
        caller: ParticipantId,
        sink: &mut S,
    ) -> Result<Decimal> {
        self.check_owner(caller)?;
        self.ensure_closed(now)?;
        let amount = self.config.proceeds_for(self.ledger.len())?;
        let paid = self.proceeds.withdraw(self.config.owner, amount, sink)?;
        self.events.push(DrawEvent::ProceedsWithdrawn {
            to: self.config.owner,
            amount: paid,
        });
        Ok(paid)
    }

    /// Change the fee attached to future randomness requests.
    ///
    /// # Errors
    /// - `Unauthorized` unless `caller` is the owner
    /// - `InvalidAmount` for a negative fee
    pub fn set_randomness_fee(&mut self, caller: ParticipantId, fee: Decimal) -> Result<()> {
        self.check_owner(caller)?;
        if fee.is_sign_negative() {
            return Err(FairdrawError::InvalidAmount {
                reason: format!("randomness fee must not be negative, got {fee}"),
            });
        }
        let old = std::mem::replace(&mut self.randomness_fee, fee);
        tracing::info!(%old, new = %fee, "Randomness fee updated");
        self.events.push(DrawEvent::RandomnessFeeUpdated { old, new: fee });
        Ok(())
    }

    // ── Queries ────────────────────────────────────────────────────────

    /// Total tickets sold.
    #[must_use]
    pub fn ledger_len(&self) -> usize {
        self.ledger.len()
    }

    pub fn ticket_owner(&self, index: usize) -> Result<ParticipantId> {
        self.ledger.owner_of(index)
    }

    pub fn is_claimed(&self, index: usize) -> Result<bool> {
        self.ledger.is_claimed(index)
    }

    #[must_use]
    pub fn entries_of(&self, participant: ParticipantId) -> usize {
        self.ledger.entries_of(participant)
    }

    /// Current ticket indices held by `participant`.
    #[must_use]
    pub fn tickets_of(&self, participant: ParticipantId) -> Vec<usize> {
        self.ledger.tickets_of(participant)
    }

    /// Shuffle cursor (0 before selection starts).
    #[must_use]
    pub fn cursor(&self) -> usize {
        self.selection.as_ref().map_or(0, DeferredShuffle::cursor)
    }

    /// Selection status. Before the window closes this reports what the
    /// status would be for the current ledger.
    #[must_use]
    pub fn selection_status(&self) -> SelectionStatus {
        match &self.selection {
            Some(shuffle) => shuffle.status(),
            None => DeferredShuffle::new(self.ledger.len(), self.config.available_supply).status(),
        }
    }

    /// Items minted so far.
    #[must_use]
    pub fn settled_count(&self) -> u64 {
        self.claims.settled()
    }

    /// Tickets refunded so far.
    #[must_use]
    pub fn refunded_count(&self) -> u64 {
        self.claims.refunded()
    }

    /// Highest item id covered by a reveal.
    #[must_use]
    pub fn revealed_watermark(&self) -> u64 {
        self.reveal.watermark()
    }

    #[must_use]
    pub fn metadata_ranges(&self) -> &[MetadataRange] {
        self.reveal.ranges()
    }

    #[must_use]
    pub fn proceeds_withdrawn(&self) -> bool {
        self.proceeds.is_withdrawn()
    }

    #[must_use]
    pub fn randomness_fee(&self) -> Decimal {
        self.randomness_fee
    }

    /// Fees attached to every accepted randomness request.
    #[must_use]
    pub fn total_randomness_fees(&self) -> Decimal {
        self.router.fees_paid()
    }

    /// Audit hash of the winning prefix, once winners are final.
    #[must_use]
    pub fn winners_root(&self) -> Option<[u8; 32]> {
        let shuffle = self.selection.as_ref()?;
        if !shuffle.status().is_final() {
            return None;
        }
        Some(compute_ordering_root(
            &self.ledger.owners()[..shuffle.winner_count()],
        ))
    }

    /// [`winners_root`](Self::winners_root) as lowercase hex.
    #[must_use]
    pub fn winners_root_hex(&self) -> Option<String> {
        self.winners_root().map(hex::encode)
    }

    /// Metadata for `item`. Read-only.
    #[must_use]
    pub fn query(&self, item: ItemId) -> ItemMetadata {
        self.reveal.query(item)
    }

    /// JSON content document for `item`.
    pub fn render_content(&self, item: ItemId) -> Result<String> {
        render_content(item, &self.reveal.query(item))
    }

    /// Re-check every conservation law against current totals.
    ///
    /// # Errors
    /// `ConservationViolation` naming the broken law.
    pub fn verify_conservation(&self) -> Result<()> {
        let conservation = self.claims.conservation();
        conservation.verify(self.config.available_supply as u64, self.config.unit_price)?;
        conservation.verify_funds(self.ledger.total_paid(), self.proceeds.withdrawn_amount())?;
        if !self.reveal.is_contiguous() || self.reveal.watermark() > self.claims.settled() {
            return Err(FairdrawError::ConservationViolation {
                reason: format!(
                    "metadata ranges do not cover [1, {}] within settled {}",
                    self.reveal.watermark(),
                    self.claims.settled()
                ),
            });
        }
        Ok(())
    }

    // ── Events ─────────────────────────────────────────────────────────

    #[must_use]
    pub fn events(&self) -> &[DrawEvent] {
        &self.events
    }

    /// Take all recorded events, leaving the log empty.
    pub fn drain_events(&mut self) -> Vec<DrawEvent> {
        std::mem::take(&mut self.events)
    }
}
