//! End-to-end lifecycle flows over the in-memory store: open a table,
//! sell, close with payment reconciliation and stock debits, reopen with
//! stock reversal, correct a closed order, and guard table deletion.

use std::sync::Arc;

use jiff::civil::date;
use rust_decimal::Decimal;
use testresult::TestResult;

use comanda::prelude::*;

struct Venue {
    store: Arc<InMemoryStore>,
    floor: FloorService,
    ordering: OrderingService,
    checkout: CheckoutService,
    tenant: TenantId,
}

fn venue() -> Venue {
    let store = Arc::new(InMemoryStore::new());
    let clock: Arc<dyn Clock> = Arc::new(FixedClock(date(2026, 2, 6).at(21, 30, 0, 0)));
    let uow: Arc<dyn UnitOfWork> = store.clone();
    Venue {
        floor: FloorService::new(uow.clone(), clock.clone()),
        ordering: OrderingService::new(uow.clone(), clock.clone()),
        checkout: CheckoutService::new(uow, clock),
        store,
        tenant: TenantId::generate(),
    }
}

fn seeded_table(venue: &Venue, number: u32) -> TestResult<TableId> {
    let table = Table::new(TableId::generate(), venue.tenant, number)?;
    let id = table.id();
    venue.store.seed_table(table);
    Ok(id)
}

fn seeded_product(venue: &Venue, name: &str, price: Decimal) -> ProductId {
    let product = comanda::fixtures::product(venue.tenant, name, price);
    let id = product.id();
    venue.store.seed_product(product);
    id
}

fn seeded_tracked(venue: &Venue, name: &str, price: Decimal, stock: i64) -> ProductId {
    let product = comanda::fixtures::tracked_product(venue.tenant, name, price, stock);
    let id = product.id();
    venue.store.seed_product(product);
    id
}

fn add(venue: &Venue, order_id: OrderId, product_id: ProductId, quantity: u32) -> TestResult<Order> {
    Ok(venue.ordering.add_product(AddProductCommand {
        tenant: venue.tenant,
        order_id,
        product_id,
        quantity,
        note: None,
        extra_ids: Vec::new(),
    })?)
}

fn cash(amount: Decimal) -> TenderSpec {
    TenderSpec {
        method: PaymentMethod::Cash,
        amount,
    }
}

fn card(amount: Decimal) -> TenderSpec {
    TenderSpec {
        method: PaymentMethod::Card,
        amount,
    }
}

#[test]
fn open_table_pairs_one_order_and_occupies_it() -> TestResult {
    let venue = venue();
    let table_id = seeded_table(&venue, 4)?;

    let order = venue.floor.open_table(venue.tenant, table_id, 1)?;

    assert!(order.is_open());
    assert!(order.lines().is_empty());
    let table = venue.store.table(table_id).ok_or("table missing")?;
    assert_eq!(table.status(), TableStatus::Occupied);

    // A second open on the same table must be rejected.
    let again = venue.floor.open_table(venue.tenant, table_id, 2);
    assert!(matches!(again, Err(UseCaseError::TableBusy(_))));

    Ok(())
}

#[test]
fn close_with_cash_overpayment_returns_change_and_frees_the_table() -> TestResult {
    let venue = venue();
    let table_id = seeded_table(&venue, 4)?;
    let milanesa = seeded_product(&venue, "Milanesa", Decimal::from(150));

    let order = venue.floor.open_table(venue.tenant, table_id, 1)?;
    add(&venue, order.id(), milanesa, 1)?;

    let settled = venue
        .checkout
        .close_order(venue.tenant, order.id(), &[cash(Decimal::from(200))])?;

    assert_eq!(settled.change, Decimal::from(50));
    let totals = settled.order.closed_totals().ok_or("snapshot missing")?;
    assert_eq!(totals.total, Decimal::from(150));
    assert_eq!(totals.subtotal, Decimal::from(150));

    let table = venue.store.table(table_id).ok_or("table missing")?;
    assert_eq!(table.status(), TableStatus::Free);

    Ok(())
}

#[test]
fn close_rejecting_payments_keeps_everything_untouched() -> TestResult {
    let venue = venue();
    let table_id = seeded_table(&venue, 4)?;
    let milanesa = seeded_product(&venue, "Milanesa", Decimal::from(150));

    let order = venue.floor.open_table(venue.tenant, table_id, 1)?;
    add(&venue, order.id(), milanesa, 1)?;

    // Underpaid.
    let result = venue
        .checkout
        .close_order(venue.tenant, order.id(), &[cash(Decimal::from(100))]);
    assert!(matches!(
        result,
        Err(UseCaseError::Order(OrderError::PaymentMismatch { .. }))
    ));

    // Overpaid without any cash tender.
    let result = venue
        .checkout
        .close_order(venue.tenant, order.id(), &[card(Decimal::from(200))]);
    assert!(matches!(
        result,
        Err(UseCaseError::Order(OrderError::OverpaidWithoutCash { .. }))
    ));

    let stored = venue.store.order(order.id()).ok_or("order missing")?;
    assert!(stored.is_open());
    assert!(stored.closed_totals().is_none());
    let table = venue.store.table(table_id).ok_or("table missing")?;
    assert_eq!(table.status(), TableStatus::Occupied);

    Ok(())
}

#[test]
fn close_debits_stock_once_per_product_and_reopen_reverses_it() -> TestResult {
    let venue = venue();
    let table_id = seeded_table(&venue, 4)?;
    let beer = seeded_tracked(&venue, "Cerveza", Decimal::from(80), 10);
    let water = seeded_tracked(&venue, "Agua", Decimal::from(20), 10);

    let order = venue.floor.open_table(venue.tenant, table_id, 1)?;
    add(&venue, order.id(), beer, 3)?;
    add(&venue, order.id(), water, 3)?;

    venue
        .checkout
        .close_order(venue.tenant, order.id(), &[cash(Decimal::from(300))])?;

    assert_eq!(
        venue.store.product(beer).map(|p| p.stock_on_hand()),
        Some(7)
    );
    assert_eq!(
        venue.store.product(water).map(|p| p.stock_on_hand()),
        Some(7)
    );
    let debits = venue.store.movements();
    assert_eq!(debits.len(), 2);
    assert!(debits.iter().all(|m| m.kind() == MovementKind::SaleDebit));
    assert!(debits.iter().all(|m| m.quantity() == -3));

    let reopened = venue.checkout.reopen_order(venue.tenant, order.id())?;

    // Stock restored, snapshot gone, table occupied again.
    assert_eq!(
        venue.store.product(beer).map(|p| p.stock_on_hand()),
        Some(10)
    );
    assert_eq!(
        venue.store.product(water).map(|p| p.stock_on_hand()),
        Some(10)
    );
    assert!(reopened.is_open());
    assert!(reopened.closed_totals().is_none());
    assert!(reopened.payments().is_empty());
    let table = venue.store.table(table_id).ok_or("table missing")?;
    assert_eq!(table.status(), TableStatus::Occupied);

    let movements = venue.store.movements();
    assert_eq!(movements.len(), 4);
    let reversals: Vec<_> = movements
        .iter()
        .filter(|m| m.kind() == MovementKind::SaleReversal)
        .collect();
    assert_eq!(reversals.len(), 2);
    assert!(reversals.iter().all(|m| m.quantity() == 3));

    Ok(())
}

#[test]
fn reopening_an_open_order_is_a_state_conflict() -> TestResult {
    let venue = venue();
    let table_id = seeded_table(&venue, 4)?;
    let milanesa = seeded_product(&venue, "Milanesa", Decimal::from(150));

    let order = venue.floor.open_table(venue.tenant, table_id, 1)?;
    add(&venue, order.id(), milanesa, 1)?;

    let result = venue.checkout.reopen_order(venue.tenant, order.id());

    assert!(matches!(
        result,
        Err(UseCaseError::Order(OrderError::NotClosed(OrderStatus::Open)))
    ));

    Ok(())
}

#[test]
fn correcting_a_closed_order_leaves_table_and_stock_alone() -> TestResult {
    let venue = venue();
    let table_id = seeded_table(&venue, 4)?;
    let beer = seeded_tracked(&venue, "Cerveza", Decimal::from(80), 10);

    let order = venue.floor.open_table(venue.tenant, table_id, 1)?;
    let order = add(&venue, order.id(), beer, 3)?;
    let line_id = order.lines()[0].id();

    venue
        .checkout
        .close_order(venue.tenant, order.id(), &[cash(Decimal::from(240))])?;
    let movements_before = venue.store.movements().len();

    let settled = venue.checkout.correct_order(
        venue.tenant,
        order.id(),
        &[(line_id, 2)],
        &[cash(Decimal::from(160))],
    )?;

    assert_eq!(settled.change, Decimal::ZERO);
    let totals = settled.order.closed_totals().ok_or("snapshot missing")?;
    assert_eq!(totals.total, Decimal::from(160));
    assert!(!settled.order.is_open());

    // Table still free, no additional stock movements.
    let table = venue.store.table(table_id).ok_or("table missing")?;
    assert_eq!(table.status(), TableStatus::Free);
    assert_eq!(venue.store.movements().len(), movements_before);
    assert_eq!(
        venue.store.product(beer).map(|p| p.stock_on_hand()),
        Some(7)
    );

    Ok(())
}

#[test]
fn table_deletion_guards() -> TestResult {
    let venue = venue();
    let first = seeded_table(&venue, 1)?;
    let second = seeded_table(&venue, 2)?;

    let order = venue.floor.open_table(venue.tenant, first, 1)?;
    let milanesa = seeded_product(&venue, "Milanesa", Decimal::from(150));
    add(&venue, order.id(), milanesa, 1)?;

    // Occupied: rejected.
    let result = venue.floor.delete_table(venue.tenant, first);
    assert!(matches!(result, Err(UseCaseError::TableOccupied(_))));

    // Free and not the last one: deleted.
    venue.floor.delete_table(venue.tenant, second)?;
    assert!(venue.store.table(second).is_none());

    // Close to free the first table; it is now the last one: rejected.
    venue
        .checkout
        .close_order(venue.tenant, order.id(), &[cash(Decimal::from(150))])?;
    let result = venue.floor.delete_table(venue.tenant, first);
    assert!(matches!(result, Err(UseCaseError::LastTable)));

    Ok(())
}

#[test]
fn cross_tenant_access_is_a_referential_error() -> TestResult {
    let venue = venue();
    let table_id = seeded_table(&venue, 4)?;
    let milanesa = seeded_product(&venue, "Milanesa", Decimal::from(150));
    let order = venue.floor.open_table(venue.tenant, table_id, 1)?;
    add(&venue, order.id(), milanesa, 1)?;

    let intruder = TenantId::generate();
    let result = venue
        .checkout
        .close_order(intruder, order.id(), &[cash(Decimal::from(150))]);

    assert!(matches!(result, Err(UseCaseError::OrderNotFound(_))));

    Ok(())
}
