use super::*;
use shared::models::Role;

fn breakdown(total: f64) -> PriceBreakdown {
    PriceBreakdown {
        base_amount: total,
        tier_discount: 0.0,
        promo_discount: 0.0,
        bank_charges: 0.0,
        total_amount: total,
    }
}

fn new_order(user_id: &str, quantity: u32) -> NewOrder {
    NewOrder {
        user_id: user_id.to_string(),
        buyer_name: "Test Buyer".to_string(),
        buyer_email: "buyer@example.com".to_string(),
        product_id: "prod-1".to_string(),
        product_name: "IELTS Mock Voucher".to_string(),
        quantity,
        price: breakdown(150.0 * quantity as f64),
        currency: "USD".to_string(),
        payment_method: PaymentMethod::BankTransfer,
        bank_reference: Some("TXN-001".to_string()),
        proof_attached: true,
    }
}

#[test]
fn test_create_assigns_receipt_ids_in_sequence() {
    let ledger = OrderLedger::open_in_memory().unwrap();
    let first = ledger.create(new_order("u1", 1)).unwrap();
    let second = ledger.create(new_order("u1", 1)).unwrap();

    let stamp = date_stamp();
    assert_eq!(first.id, format!("EDU{stamp}10001"));
    assert_eq!(second.id, format!("EDU{stamp}10002"));
    assert_eq!(first.status, OrderStatus::Pending);
    assert_eq!(first.history.len(), 1);
    assert!(first.voucher_codes.is_empty());
}

#[test]
fn test_transition_never_reaches_completed() {
    let ledger = OrderLedger::open_in_memory().unwrap();
    let order = ledger.create(new_order("u1", 1)).unwrap();

    let err = ledger
        .transition(&order.id, OrderStatus::Completed, "finance-1", None)
        .unwrap_err();
    assert!(matches!(err, LedgerError::IllegalTransition { .. }));

    // the only legal route to Completed attaches codes
    let done = ledger
        .fulfill(&order.id, vec!["CODE-A".to_string()], "finance-1", None)
        .unwrap();
    assert_eq!(done.status, OrderStatus::Completed);
    assert_eq!(done.voucher_codes, vec!["CODE-A".to_string()]);
}

#[test]
fn test_fulfill_rejects_code_count_mismatch() {
    let ledger = OrderLedger::open_in_memory().unwrap();
    let order = ledger.create(new_order("u1", 2)).unwrap();

    let err = ledger
        .fulfill(&order.id, vec!["only-one".to_string()], "finance-1", None)
        .unwrap_err();
    assert!(matches!(
        err,
        LedgerError::CodeCountMismatch {
            expected: 2,
            actual: 1
        }
    ));
    // order untouched by the failed attempt
    let reread = ledger.get(&order.id).unwrap();
    assert_eq!(reread.status, OrderStatus::Pending);
    assert!(reread.voucher_codes.is_empty());
}

#[test]
fn test_state_machine_is_closed_at_terminals() {
    let ledger = OrderLedger::open_in_memory().unwrap();
    let order = ledger.create(new_order("u1", 1)).unwrap();
    ledger
        .transition(&order.id, OrderStatus::Rejected, "finance-1", Some("bad proof".into()))
        .unwrap();

    for target in [
        OrderStatus::Pending,
        OrderStatus::Hold,
        OrderStatus::Cancelled,
    ] {
        let err = ledger
            .transition(&order.id, target, "finance-1", None)
            .unwrap_err();
        assert!(matches!(err, LedgerError::IllegalTransition { .. }));
    }
    let err = ledger
        .fulfill(&order.id, vec!["CODE-A".into()], "finance-1", None)
        .unwrap_err();
    assert!(matches!(err, LedgerError::IllegalTransition { .. }));
}

#[test]
fn test_hold_resolves_to_completed_or_rejected() {
    let ledger = OrderLedger::open_in_memory().unwrap();
    let order = ledger.create(new_order("u1", 1)).unwrap();
    ledger
        .transition(&order.id, OrderStatus::Hold, "finance-1", Some("awaiting proof".into()))
        .unwrap();

    let err = ledger
        .transition(&order.id, OrderStatus::Cancelled, "u1", None)
        .unwrap_err();
    assert!(matches!(err, LedgerError::IllegalTransition { .. }));

    let done = ledger
        .fulfill(&order.id, vec!["CODE-A".into()], "finance-1", None)
        .unwrap();
    assert_eq!(done.status, OrderStatus::Completed);
}

#[test]
fn test_history_records_every_change_in_order() {
    let ledger = OrderLedger::open_in_memory().unwrap();
    let order = ledger.create(new_order("u1", 1)).unwrap();
    ledger
        .transition(&order.id, OrderStatus::Hold, "finance-1", Some("checking".into()))
        .unwrap();
    let done = ledger
        .fulfill(&order.id, vec!["CODE-A".into()], "finance-2", Some("verified".into()))
        .unwrap();

    let statuses: Vec<OrderStatus> = done.history.iter().map(|h| h.status).collect();
    assert_eq!(
        statuses,
        vec![
            OrderStatus::Pending,
            OrderStatus::Hold,
            OrderStatus::Completed
        ]
    );
    assert_eq!(done.history[1].actor, "finance-1");
    assert_eq!(done.history[2].note.as_deref(), Some("verified"));
}

#[test]
fn test_append_note_works_after_terminal() {
    let ledger = OrderLedger::open_in_memory().unwrap();
    let order = ledger.create(new_order("u1", 1)).unwrap();
    ledger
        .transition(&order.id, OrderStatus::Cancelled, "u1", None)
        .unwrap();

    let noted = ledger
        .append_note(&order.id, "finance-1", "buyer asked to cancel by phone".into())
        .unwrap();
    assert_eq!(noted.status, OrderStatus::Cancelled);
    assert_eq!(noted.history.len(), 3);
    assert_eq!(
        noted.history[2].note.as_deref(),
        Some("buyer asked to cancel by phone")
    );
}

#[test]
fn test_get_scoped_enforces_ownership() {
    let ledger = OrderLedger::open_in_memory().unwrap();
    let order = ledger.create(new_order("u1", 1)).unwrap();

    let owner = Actor::test_buyer("u1");
    assert!(ledger.get_scoped(&order.id, &owner).is_ok());

    let stranger = Actor::test_buyer("u2");
    let err = ledger.get_scoped(&order.id, &stranger).unwrap_err();
    assert!(matches!(err, LedgerError::Forbidden(_)));

    let finance = Actor::test_finance();
    assert!(ledger.get_scoped(&order.id, &finance).is_ok());
    assert_eq!(finance.role, Role::Finance);
}

#[test]
fn test_list_for_user_is_isolated_and_newest_first() {
    let ledger = OrderLedger::open_in_memory().unwrap();
    ledger.create(new_order("u1", 1)).unwrap();
    ledger.create(new_order("u2", 1)).unwrap();
    ledger.create(new_order("u1", 2)).unwrap();

    let mine = ledger.list_for_user("u1").unwrap();
    assert_eq!(mine.len(), 2);
    assert!(mine.iter().all(|o| o.user_id == "u1"));
    assert!(mine[0].created_at >= mine[1].created_at);

    let admin = Actor::test_admin();
    assert_eq!(ledger.list_all(&admin).unwrap().len(), 3);

    let buyer = Actor::test_buyer("u1");
    assert!(matches!(
        ledger.list_all(&buyer).unwrap_err(),
        LedgerError::Forbidden(_)
    ));
}

#[test]
fn test_count_created_since_includes_cancelled() {
    let ledger = OrderLedger::open_in_memory().unwrap();
    let first = ledger.create(new_order("u1", 1)).unwrap();
    ledger
        .transition(&first.id, OrderStatus::Cancelled, "u1", None)
        .unwrap();
    ledger.create(new_order("u1", 1)).unwrap();

    // cancelling does not hand the quota slot back
    let count = ledger
        .count_created_since("u1", now_millis() - 1000)
        .unwrap();
    assert_eq!(count, 2);
}

#[test]
fn test_missing_order_is_not_found() {
    let ledger = OrderLedger::open_in_memory().unwrap();
    assert!(matches!(
        ledger.get("EDU0000000000").unwrap_err(),
        LedgerError::NotFound(_)
    ));
}
