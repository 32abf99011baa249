//! End-to-end tests across catalog, ledger store and services.
//!
//! Verifies:
//! - multi-line orders are all-or-nothing
//! - stock never goes negative, whatever the interleaving
//! - each product's quantity equals the sum of its ledger deltas
//! - restock intents never move stock
//! - lock waits are bounded and reported as retryable contention

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use chrono::Utc;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    use grocer_core::{DomainError, ProductId, RequesterId};
    use grocer_inventory::NewLedgerEntry;
    use grocer_purchasing::{NewRestockLine, RestockStatus};
    use grocer_sales::{OrderLine, OrderRequest};

    use crate::adjustment::InventoryAdjuster;
    use crate::config::LedgerConfig;
    use crate::ledger_store::{LedgerFilter, LedgerStore, Pagination};
    use crate::restock::{InMemoryRestockStore, RestockWorkflow};
    use crate::settlement::OrderSettlement;
    use crate::test_support::{shop, shop_with_config};

    fn order(lines: &[(ProductId, i64)]) -> OrderRequest {
        OrderRequest::new(
            RequesterId::new(7),
            lines
                .iter()
                .map(|(product_id, quantity)| OrderLine {
                    product_id: *product_id,
                    quantity: *quantity,
                })
                .collect(),
        )
    }

    async fn entry_count<L: LedgerStore>(ledger: &L) -> u64 {
        ledger
            .list_entries(&LedgerFilter::default(), Pagination::default())
            .await
            .unwrap()
            .total
    }

    #[tokio::test]
    async fn multi_line_order_fails_as_a_whole() {
        let shop = shop(&[(dec!(1.00), 10), (dec!(2.00), 5)]).await;
        let (p1, p2) = (shop.products[0], shop.products[1]);
        let settlement = OrderSettlement::new(shop.ledger.clone(), shop.catalog.clone());
        let before = entry_count(&shop.ledger).await;

        let err = settlement
            .place_order(&order(&[(p1, 4), (p2, 20)]))
            .await
            .unwrap_err();

        assert_eq!(err.as_domain(), Some(&DomainError::insufficient_stock(p2, 20, 5)));
        assert_eq!(shop.ledger.get_stock(p1).await.unwrap(), 10);
        assert_eq!(shop.ledger.get_stock(p2).await.unwrap(), 5);
        assert_eq!(entry_count(&shop.ledger).await, before);
    }

    #[tokio::test]
    async fn duplicate_lines_draw_on_one_pool() {
        let shop = shop(&[(dec!(1.00), 10)]).await;
        let p1 = shop.products[0];
        let settlement = OrderSettlement::new(shop.ledger.clone(), shop.catalog.clone());

        let err = settlement
            .place_order(&order(&[(p1, 6), (p1, 6)]))
            .await
            .unwrap_err();

        assert_eq!(err.as_domain(), Some(&DomainError::insufficient_stock(p1, 12, 10)));
        assert_eq!(shop.ledger.get_stock(p1).await.unwrap(), 10);
    }

    #[tokio::test]
    async fn checkout_writes_one_entry_per_product() {
        let shop = shop(&[(dec!(2.50), 10)]).await;
        let p1 = shop.products[0];
        let settlement = OrderSettlement::new(shop.ledger.clone(), shop.catalog.clone());

        let receipt = settlement.place_order(&order(&[(p1, 4)])).await.unwrap();

        assert_eq!(receipt.total.amount(), dec!(10.00));
        assert_eq!(shop.ledger.get_stock(p1).await.unwrap(), 6);
        let page = shop
            .ledger
            .list_entries(&LedgerFilter::for_product(p1), Pagination::default())
            .await
            .unwrap();
        assert_eq!(page.entries[0].delta, -4);
        assert_eq!(page.entries[0].note, "customer purchase");
        assert!(shop.ledger.audit(p1).await.unwrap().is_consistent());
    }

    #[tokio::test]
    async fn adjustment_below_zero_is_rejected() {
        let shop = shop(&[(dec!(1.00), 2)]).await;
        let p1 = shop.products[0];
        let adjuster = InventoryAdjuster::new(shop.ledger.clone());
        let before = entry_count(&shop.ledger).await;

        let err = adjuster.adjust(p1, -3, "damaged").await.unwrap_err();

        assert!(matches!(err.as_domain(), Some(DomainError::IntegrityViolation(_))));
        assert_eq!(shop.ledger.get_stock(p1).await.unwrap(), 2);
        assert_eq!(entry_count(&shop.ledger).await, before);
    }

    #[tokio::test]
    async fn restock_intent_leaves_stock_alone() {
        let shop = shop(&[(dec!(1.00), 10), (dec!(3.00), 5)]).await;
        let (p1, p2) = (shop.products[0], shop.products[1]);
        let workflow = RestockWorkflow::new(Arc::new(InMemoryRestockStore::new()), shop.catalog.clone());
        let before = entry_count(&shop.ledger).await;

        let recorded = workflow
            .create_restock_order(
                shop.supplier,
                vec![
                    NewRestockLine {
                        product_id: p1,
                        quantity: 5,
                        unit_cost: dec!(1.20),
                    },
                    NewRestockLine {
                        product_id: p2,
                        quantity: 3,
                        unit_cost: dec!(4.00),
                    },
                ],
            )
            .await
            .unwrap();

        assert_eq!(recorded.intent.status, RestockStatus::Pending);
        assert_eq!(recorded.intent.lines.len(), 2);
        assert_eq!(recorded.expected_total_cost.amount(), dec!(18.00));
        assert_eq!(shop.ledger.get_stock(p1).await.unwrap(), 10);
        assert_eq!(shop.ledger.get_stock(p2).await.unwrap(), 5);
        assert_eq!(entry_count(&shop.ledger).await, before);
        assert!(shop.ledger.audit(p1).await.unwrap().is_consistent());
        assert!(shop.ledger.audit(p2).await.unwrap().is_consistent());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_orders_never_oversell() {
        const ORDERS: usize = 16;
        let shop = shop(&[(dec!(1.00), ORDERS as i64 - 1)]).await;
        let p1 = shop.products[0];
        let settlement = Arc::new(OrderSettlement::new(shop.ledger.clone(), shop.catalog.clone()));

        let mut handles = Vec::with_capacity(ORDERS);
        for _ in 0..ORDERS {
            let settlement = Arc::clone(&settlement);
            handles.push(tokio::spawn(async move {
                settlement.place_order(&order(&[(p1, 1)])).await
            }));
        }

        let mut succeeded = 0;
        let mut insufficient = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => succeeded += 1,
                Err(e) if e.code() == "insufficient_stock" => insufficient += 1,
                Err(e) => panic!("unexpected error: {e}"),
            }
        }

        assert_eq!(succeeded, ORDERS - 1);
        assert_eq!(insufficient, 1);
        assert_eq!(shop.ledger.get_stock(p1).await.unwrap(), 0);
        assert!(shop.ledger.audit(p1).await.unwrap().is_consistent());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn overlapping_orders_in_opposite_line_order_do_not_deadlock() {
        let shop = shop(&[(dec!(1.00), 100), (dec!(1.00), 100)]).await;
        let (p1, p2) = (shop.products[0], shop.products[1]);
        let settlement = Arc::new(OrderSettlement::new(shop.ledger.clone(), shop.catalog.clone()));

        let mut handles = Vec::new();
        for i in 0..20 {
            let settlement = Arc::clone(&settlement);
            let lines = if i % 2 == 0 { [(p1, 1), (p2, 1)] } else { [(p2, 1), (p1, 1)] };
            handles.push(tokio::spawn(async move { settlement.place_order(&order(&lines)).await }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(shop.ledger.get_stock(p1).await.unwrap(), 80);
        assert_eq!(shop.ledger.get_stock(p2).await.unwrap(), 80);
    }

    #[tokio::test]
    async fn held_lock_surfaces_as_retryable_contention() {
        let shop = shop_with_config(
            &[(dec!(1.00), 5)],
            LedgerConfig {
                lock_timeout: Duration::from_millis(50),
            },
        )
        .await;
        let p1 = shop.products[0];
        let settlement = OrderSettlement::new(shop.ledger.clone(), shop.catalog.clone());

        let held = shop.ledger.begin(&[p1]).await.unwrap();
        let err = settlement.place_order(&order(&[(p1, 1)])).await.unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(err.code(), "transient_contention");

        held.rollback().await;
        settlement.place_order(&order(&[(p1, 1)])).await.unwrap();
        assert_eq!(shop.ledger.get_stock(p1).await.unwrap(), 4);
    }

    #[derive(Debug, Clone)]
    enum Op {
        Order(i64),
        Adjust(i64),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (1i64..8).prop_map(Op::Order),
            prop_oneof![-8i64..0, 1i64..8].prop_map(Op::Adjust),
        ]
    }

    proptest! {
        #[test]
        fn quantity_always_equals_ledger_sum(initial in 0i64..20, ops in prop::collection::vec(op(), 1..30)) {
            let rt = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();
            rt.block_on(async {
                let shop = shop(&[(dec!(1.00), initial)]).await;
                let p1 = shop.products[0];
                let settlement = OrderSettlement::new(shop.ledger.clone(), shop.catalog.clone());
                let adjuster = InventoryAdjuster::new(shop.ledger.clone());
                let mut expected = initial;

                for op in ops {
                    match op {
                        Op::Order(qty) => match settlement.place_order(&order(&[(p1, qty)])).await {
                            Ok(_) => expected -= qty,
                            Err(e) => assert_eq!(e.code(), "insufficient_stock"),
                        },
                        Op::Adjust(delta) => match adjuster.adjust(p1, delta, "count correction").await {
                            Ok(_) => expected += delta,
                            Err(e) => assert_eq!(e.code(), "integrity_violation"),
                        },
                    }
                    let audit = shop.ledger.audit(p1).await.unwrap();
                    assert!(audit.on_hand >= 0);
                    assert!(audit.is_consistent());
                    assert_eq!(audit.on_hand, expected);
                }
            });
        }
    }

    /// Runs the core scenarios against Postgres when `TEST_DATABASE_URL` is set.
    #[tokio::test]
    async fn postgres_store_honours_the_same_rules() {
        let Ok(url) = std::env::var("TEST_DATABASE_URL") else {
            return;
        };
        let pool = crate::db::connect(&crate::config::DatabaseConfig {
            url,
            max_connections: 4,
        })
        .await
        .unwrap();
        crate::db::migrate(&pool).await.unwrap();

        let store = Arc::new(crate::ledger_store::PostgresLedgerStore::new(
            pool,
            LedgerConfig {
                lock_timeout: Duration::from_millis(200),
            },
        ));
        // Fresh ids per run so repeated runs against one database don't collide.
        let base = Utc::now().timestamp_micros();
        let (p1, p2) = (ProductId::new(base), ProductId::new(base + 1));
        for (p, qty) in [(p1, 10), (p2, 5)] {
            store.ensure_product(p).await.unwrap();
            store
                .append_entry(NewLedgerEntry::new(p, qty, "initial stock", Utc::now()))
                .await
                .unwrap();
        }

        let engine = crate::reservation::ReservationEngine::new(store.clone());
        let lines = [
            grocer_inventory::ReservationLine::new(p1, 4),
            grocer_inventory::ReservationLine::new(p2, 20),
        ];
        let err = engine.reserve(&lines, "customer purchase", Utc::now()).await.unwrap_err();
        assert_eq!(err.as_domain(), Some(&DomainError::insufficient_stock(p2, 20, 5)));
        assert_eq!(store.get_stock(p1).await.unwrap(), 10);

        let adjuster = InventoryAdjuster::new(store.clone());
        let err = adjuster.adjust(p2, -6, "damaged").await.unwrap_err();
        assert_eq!(err.code(), "integrity_violation");

        let held = store.begin(&[p1]).await.unwrap();
        let err = store.begin(&[p1]).await.err().unwrap();
        assert!(err.is_retryable());
        held.rollback().await;

        assert!(store.audit(p1).await.unwrap().is_consistent());
        assert!(store.audit(p2).await.unwrap().is_consistent());
    }
}
