//! End-to-end draws through the public engine API.
//!
//! Each scenario runs the full lifecycle:
//! entry -> close -> selection entropy -> shuffle -> claims -> reveals ->
//! proceeds, and checks the settlement and coverage laws at the end.

use chrono::{DateTime, Duration, Utc};
use fairdraw_engine::{AllocationEngine, RecordingProvider};
use fairdraw_settlement::InMemorySink;
use fairdraw_types::*;
use rand::Rng;
use rust_decimal::Decimal;

fn during() -> DateTime<Utc> {
    DrawConfig::dummy_start() + Duration::hours(2)
}

fn after() -> DateTime<Utc> {
    DrawConfig::dummy_end() + Duration::minutes(1)
}

fn alice() -> ParticipantId {
    ParticipantId::from_bytes([0x01; 16])
}

fn bob() -> ParticipantId {
    ParticipantId::from_bytes([0x02; 16])
}

/// Harness: one engine plus its provider and sink.
struct Draw {
    engine: AllocationEngine,
    provider: RecordingProvider,
    sink: InMemorySink,
}

impl Draw {
    fn new(supply: usize, cap: usize) -> Self {
        Self {
            engine: AllocationEngine::new(DrawConfig::dummy(supply, cap)).unwrap(),
            provider: RecordingProvider::new(),
            sink: InMemorySink::new(),
        }
    }

    fn buy(&mut self, who: ParticipantId, count: usize) {
        let price = self.engine.config().unit_price;
        self.engine
            .enter(who, count, price * Decimal::from(count), during())
            .unwrap();
    }

    /// Request and deliver selection entropy.
    fn seed_selection(&mut self, entropy: Entropy) {
        let id = self
            .engine
            .provide_selection_entropy(after(), &mut self.provider)
            .unwrap();
        let purpose = self
            .engine
            .on_randomness_delivered(Fulfillment::unsigned(id, entropy))
            .unwrap();
        assert_eq!(purpose, RandomnessPurpose::Selection);
    }

    fn shuffle_in(&mut self, batches: &[usize]) {
        for &batch in batches {
            self.engine.advance_shuffle(after(), batch).unwrap();
        }
    }

    fn claim_all(&mut self, who: ParticipantId) -> fairdraw_settlement::ClaimOutcome {
        let tickets = self.engine.tickets_of(who);
        self.engine
            .claim(after(), who, &tickets, &mut self.sink)
            .unwrap()
    }

    /// Request and deliver one reveal.
    fn reveal(&mut self, entropy: Entropy) -> MetadataRange {
        let id = self.engine.request_reveal(&mut self.provider).unwrap();
        self.engine
            .on_randomness_delivered(Fulfillment::unsigned(id, entropy))
            .unwrap();
        *self.engine.metadata_ranges().last().unwrap()
    }
}

#[test]
fn twelve_tickets_ten_items() {
    let mut d = Draw::new(10, 6);
    d.buy(alice(), 6);
    d.buy(bob(), 6);
    assert_eq!(d.engine.ledger_len(), 12);
    assert_eq!(d.engine.selection_status(), SelectionStatus::Idle);

    d.seed_selection(Entropy::from_u64(0x5EED_F00D));
    d.shuffle_in(&[10]);
    assert_eq!(d.engine.selection_status(), SelectionStatus::Complete);
    assert_eq!(d.engine.cursor(), 10);

    let a = d.claim_all(alice());
    let b = d.claim_all(bob());

    assert_eq!(a.minted.len() + b.minted.len(), 10);
    assert_eq!(a.refunded.len() + b.refunded.len(), 2);
    assert!(a.minted.iter().chain(&b.minted).all(|(i, _)| *i < 10));
    assert!(a.refunded.iter().chain(&b.refunded).all(|i| *i >= 10));

    assert_eq!(d.engine.settled_count(), 10);
    assert_eq!(d.engine.refunded_count(), 2);
    assert_eq!(d.sink.item_count(), 10);
    assert_eq!(
        d.sink.balance_of(alice()) + d.sink.balance_of(bob()),
        Decimal::new(2, 0)
    );
    assert_eq!(
        d.sink.items_of(alice()).len(),
        a.minted.len(),
        "every winning ticket yields one item"
    );

    let owner = d.engine.config().owner;
    let proceeds = d.engine.withdraw_proceeds(after(), owner, &mut d.sink).unwrap();
    assert_eq!(proceeds, Decimal::new(10, 0));
    assert_eq!(d.sink.total_transferred(), Decimal::new(12, 0));
    d.engine.verify_conservation().unwrap();
}

#[test]
fn winners_independent_of_batching() {
    let entropy = Entropy::random();
    let mut rng = rand::thread_rng();

    let mut reference = Draw::new(25, 10);
    for n in 1..=6u8 {
        reference.buy(ParticipantId::from_bytes([n; 16]), 7);
    }
    reference.seed_selection(entropy);
    reference.shuffle_in(&[25]);
    let root = reference.engine.winners_root().unwrap();

    for _ in 0..10 {
        let mut split = Draw::new(25, 10);
        for n in 1..=6u8 {
            split.buy(ParticipantId::from_bytes([n; 16]), 7);
        }
        split.seed_selection(entropy);
        while split.engine.cursor() < 25 {
            let remaining = 25 - split.engine.cursor();
            let batch = rng.gen_range(1..=remaining);
            split.engine.advance_shuffle(after(), batch).unwrap();
        }
        assert_eq!(split.engine.winners_root(), Some(root));
        for i in 0..42 {
            assert_eq!(
                split.engine.ticket_owner(i).unwrap(),
                reference.engine.ticket_owner(i).unwrap()
            );
        }
    }
}

#[test]
fn worked_example_through_engine() {
    // [A, B, C, D], supply 2, entropy 7 → winners {D, C}.
    let people: Vec<_> = (0..4u8).map(|n| ParticipantId::from_bytes([0x10 + n; 16])).collect();
    let run = |batches: &[usize]| {
        let mut d = Draw::new(2, 1);
        for p in &people {
            d.buy(*p, 1);
        }
        d.seed_selection(Entropy::from_u64(7));
        d.shuffle_in(batches);
        (0..4).map(|i| d.engine.ticket_owner(i).unwrap()).collect::<Vec<_>>()
    };
    let expected = vec![people[3], people[2], people[1], people[0]];
    assert_eq!(run(&[2]), expected);
    assert_eq!(run(&[1, 1]), expected);
}

#[test]
fn second_claim_is_rejected_without_effects() {
    let mut d = Draw::new(3, 5);
    d.buy(alice(), 2);
    d.buy(bob(), 2);
    d.seed_selection(Entropy::from_u64(99));
    d.shuffle_in(&[1, 2]);

    let tickets = d.engine.tickets_of(alice());
    d.engine
        .claim(after(), alice(), &tickets[..1], &mut d.sink)
        .unwrap();
    let items = d.sink.item_count();
    let paid = d.sink.total_transferred();

    let err = d
        .engine
        .claim(after(), alice(), &tickets, &mut d.sink)
        .unwrap_err();
    assert!(matches!(err, FairdrawError::TicketAlreadyClaimed(i) if i == tickets[0]));
    assert_eq!(d.sink.item_count(), items);
    assert_eq!(d.sink.total_transferred(), paid);
    assert!(!d.engine.is_claimed(tickets[1]).unwrap());

    // The unclaimed remainder still settles.
    d.engine
        .claim(after(), alice(), &tickets[1..], &mut d.sink)
        .unwrap();
    d.engine.verify_conservation().unwrap();
}

#[test]
fn failed_refund_transfer_reverts_claim() {
    let mut d = Draw::new(1, 3);
    d.buy(alice(), 3);
    d.seed_selection(Entropy::from_u64(5));
    d.shuffle_in(&[1]);

    d.sink.fail_transfers_to(alice());
    let tickets = d.engine.tickets_of(alice());
    let err = d
        .engine
        .claim(after(), alice(), &tickets, &mut d.sink)
        .unwrap_err();
    assert!(matches!(err, FairdrawError::TransferFailed { .. }));
    assert_eq!(d.engine.settled_count(), 0);
    assert_eq!(d.sink.item_count(), 0);
    assert!(tickets.iter().all(|&i| !d.engine.is_claimed(i).unwrap()));

    d.sink.clear_failures();
    let out = d.claim_all(alice());
    assert_eq!(out.minted.len(), 1);
    assert_eq!(out.refund, Decimal::new(2, 0));
}

#[test]
fn reveals_cover_minted_items_contiguously() {
    let mut d = Draw::new(8, 4);
    d.buy(alice(), 4);
    d.buy(bob(), 4);
    assert_eq!(d.engine.selection_status(), SelectionStatus::NotRequired);

    assert!(matches!(
        d.engine.request_reveal(&mut d.provider).unwrap_err(),
        FairdrawError::NothingToReveal { settled: 0, revealed: 0 }
    ));

    let tickets = d.engine.tickets_of(alice());
    d.engine
        .claim(after(), alice(), &tickets[..3], &mut d.sink)
        .unwrap();
    let first = d.reveal(Entropy::from_u64(111));
    assert_eq!((first.start, first.end), (1, 4));

    d.claim_all(bob());
    d.engine
        .claim(after(), alice(), &tickets[3..], &mut d.sink)
        .unwrap();
    let second = d.reveal(Entropy::from_u64(222));
    assert_eq!((second.start, second.end), (4, 9));

    assert_eq!(d.engine.revealed_watermark(), 8);
    assert_eq!(d.engine.settled_count(), 8);
    for id in 1..=8 {
        assert!(d.engine.query(ItemId(id)).is_revealed(), "item {id}");
    }
    assert_eq!(d.engine.query(ItemId(9)), ItemMetadata::Unrevealed);
    assert_eq!(
        d.engine.query(ItemId(2)),
        ItemMetadata::Revealed {
            range_index: 0,
            entropy: Entropy::from_u64(111)
        }
    );
    d.engine.verify_conservation().unwrap();

    let doc: serde_json::Value =
        serde_json::from_str(&d.engine.render_content(ItemId(5)).unwrap()).unwrap();
    assert_eq!(doc["item_id"], 5);
    assert_eq!(doc["revealed"], true);
    assert_eq!(doc["seed"], Entropy::from_u64(222).to_hex());

    let doc: serde_json::Value =
        serde_json::from_str(&d.engine.render_content(ItemId(9)).unwrap()).unwrap();
    assert_eq!(doc["revealed"], false);
    assert_eq!(doc["seed"], fairdraw_types::constants::NOT_REVEALED_MARKER);
}

#[test]
fn proceeds_withdrawn_once_by_owner() {
    let mut d = Draw::new(4, 6);
    d.buy(alice(), 6);
    let owner = d.engine.config().owner;

    assert!(matches!(
        d.engine
            .withdraw_proceeds(after(), alice(), &mut d.sink)
            .unwrap_err(),
        FairdrawError::Unauthorized { .. }
    ));

    d.sink.fail_transfers_to(owner);
    assert!(d.engine.withdraw_proceeds(after(), owner, &mut d.sink).is_err());
    assert!(!d.engine.proceeds_withdrawn());

    d.sink.clear_failures();
    let amount = d.engine.withdraw_proceeds(after(), owner, &mut d.sink).unwrap();
    assert_eq!(amount, Decimal::new(4, 0));
    assert!(d.engine.proceeds_withdrawn());
    assert!(matches!(
        d.engine
            .withdraw_proceeds(after(), owner, &mut d.sink)
            .unwrap_err(),
        FairdrawError::ProceedsAlreadyWithdrawn
    ));
    assert_eq!(d.sink.balance_of(owner), Decimal::new(4, 0));

    // Losers can still be refunded out of what remains.
    d.seed_selection(Entropy::from_u64(3));
    d.shuffle_in(&[4]);
    let out = d.claim_all(alice());
    assert_eq!(out.refund, Decimal::new(2, 0));
    d.engine.verify_conservation().unwrap();
}

#[test]
fn event_log_follows_lifecycle() {
    let mut d = Draw::new(1, 2);
    d.buy(alice(), 1);
    d.buy(bob(), 1);
    d.seed_selection(Entropy::from_u64(1));
    d.shuffle_in(&[1]);
    d.claim_all(alice());
    d.claim_all(bob());
    d.reveal(Entropy::from_u64(2));

    let kinds: Vec<_> = d.engine.drain_events().iter().map(DrawEvent::kind).collect();
    assert_eq!(
        kinds,
        vec![
            "ENTRY_RECORDED",
            "ENTRY_RECORDED",
            "RANDOMNESS_REQUESTED",
            "SELECTION_ENTROPY_RECEIVED",
            "SHUFFLE_PROGRESS",
            "TICKETS_CLAIMED",
            "TICKETS_CLAIMED",
            "RANDOMNESS_REQUESTED",
            "METADATA_REVEALED",
        ]
    );
    assert!(d.engine.events().is_empty());
}

#[test]
fn entries_after_close_are_refused() {
    let mut d = Draw::new(1, 3);
    d.buy(alice(), 1);
    d.buy(bob(), 1);
    let id = d
        .engine
        .provide_selection_entropy(after(), &mut d.provider)
        .unwrap();

    let err = d
        .engine
        .enter(alice(), 1, Decimal::ONE, during())
        .unwrap_err();
    assert!(matches!(err, FairdrawError::LedgerSealed { entries: 2 }));
    assert_eq!(d.engine.ledger_len(), 2);

    d.engine
        .on_randomness_delivered(Fulfillment::unsigned(id, Entropy::from_u64(21)))
        .unwrap();
    assert!(d.engine.advance_shuffle(after(), 1).unwrap().complete);
    d.claim_all(alice());
    d.claim_all(bob());
    assert_eq!(d.engine.settled_count(), 1);
    assert_eq!(d.engine.refunded_count(), 1);
}

#[test]
fn total_paid_overflow_is_refused() {
    // 3e28 per ticket: two payments fit in a Decimal, a third does not.
    let price = Decimal::from_i128_with_scale(30_000_000_000_000_000_000_000_000_000, 0);
    let mut config = DrawConfig::dummy(1, 1);
    config.unit_price = price;
    let mut d = Draw {
        engine: AllocationEngine::new(config).unwrap(),
        provider: RecordingProvider::new(),
        sink: InMemorySink::new(),
    };
    d.buy(alice(), 1);
    d.buy(bob(), 1);
    let carol = ParticipantId::from_bytes([0x03; 16]);
    let err = d.engine.enter(carol, 1, price, during()).unwrap_err();
    assert!(matches!(err, FairdrawError::InvalidAmount { .. }));
    assert_eq!(d.engine.ledger_len(), 2);
    assert_eq!(d.engine.entries_of(carol), 0);

    d.seed_selection(Entropy::from_u64(4));
    d.shuffle_in(&[1]);
    d.claim_all(alice());
    d.claim_all(bob());
    let owner = d.engine.config().owner;
    assert_eq!(
        d.engine.withdraw_proceeds(after(), owner, &mut d.sink).unwrap(),
        price
    );
    d.engine.verify_conservation().unwrap();
}
