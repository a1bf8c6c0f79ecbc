//! On-disk store persistence across reopen

use shared::models::{OrderStatus, PaymentMethod, PriceBreakdown, UnitType};
use shared::request::ProductCreate;
use voucher_server::catalog::CatalogStore;
use voucher_server::inventory::VoucherVault;
use voucher_server::ledger::{NewOrder, OrderLedger};

fn product_payload() -> ProductCreate {
    ProductCreate {
        name: "IELTS Mock Voucher".to_string(),
        category: "IELTS".to_string(),
        unit_type: UnitType::Voucher,
        base_price: 150.0,
        currency: "USD".to_string(),
        tier_discounts: Vec::new(),
    }
}

fn order_payload(user_id: &str, product_id: &str) -> NewOrder {
    NewOrder {
        user_id: user_id.to_string(),
        buyer_name: "Buyer".to_string(),
        buyer_email: "buyer@example.com".to_string(),
        product_id: product_id.to_string(),
        product_name: "IELTS Mock Voucher".to_string(),
        quantity: 1,
        price: PriceBreakdown {
            base_amount: 150.0,
            tier_discount: 0.0,
            promo_discount: 0.0,
            bank_charges: 0.0,
            total_amount: 150.0,
        },
        currency: "USD".to_string(),
        payment_method: PaymentMethod::BankTransfer,
        bank_reference: Some("TXN-1".to_string()),
        proof_attached: true,
    }
}

#[test]
fn test_stores_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let catalog_path = dir.path().join("catalog.redb");
    let vault_path = dir.path().join("inventory.redb");
    let ledger_path = dir.path().join("orders.redb");

    let product_id;
    let order_id;
    {
        let catalog = CatalogStore::open(&catalog_path).unwrap();
        let vault = VoucherVault::open(&vault_path).unwrap();
        let ledger = OrderLedger::open(&ledger_path).unwrap();

        let product = catalog.create(product_payload()).unwrap();
        product_id = product.id.clone();

        let report = vault.import(&product_id, "VC-001\nVC-002\nVC-001").unwrap();
        assert_eq!(report.added_count, 2);
        assert_eq!(report.duplicate_count, 1);

        order_id = ledger.create(order_payload("u1", &product_id)).unwrap().id;
    }

    // reopen everything from disk
    let catalog = CatalogStore::open(&catalog_path).unwrap();
    let vault = VoucherVault::open(&vault_path).unwrap();
    let ledger = OrderLedger::open(&ledger_path).unwrap();

    let product = catalog.get(&product_id).unwrap();
    assert_eq!(product.name, "IELTS Mock Voucher");

    let summary = vault.summary(&product_id).unwrap();
    assert_eq!(summary.available, 2);

    let order = ledger.get(&order_id).unwrap();
    assert_eq!(order.status, OrderStatus::Pending);

    // the receipt counter continues after reopen, no id reuse
    let second = ledger.create(order_payload("u2", &product_id)).unwrap();
    assert_ne!(second.id, order_id);
    assert!(second.id > order_id);

    // a re-import after reopen still deduplicates against stored codes
    let report = vault.import(&product_id, "VC-001\nVC-003").unwrap();
    assert_eq!(report.added_count, 1);
    assert_eq!(report.duplicate_count, 1);
    assert_eq!(vault.summary(&product_id).unwrap().available, 3);
}
