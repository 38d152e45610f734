use super::OrderRepository;
use crate::domain::order::{ItemSource, OrderItem};
use crate::domain::types::OrderStatus;
use crate::repository::error::RepositoryError;
use crate::repository::test_fixtures::{insert_restaurant, insert_user, sample_order, setup_conn};
use rust_decimal::Decimal;

fn d(s: &str) -> Decimal {
    s.parse().unwrap()
}

fn custom_item(order_id: &str, user_id: &str, name: &str, price: &str, qty: i32) -> OrderItem {
    OrderItem::new(
        order_id,
        user_id,
        "someone",
        ItemSource::Custom {
            name: name.to_string(),
            price: d(price),
        },
        name.to_string(),
        qty,
        d(price),
    )
    .unwrap()
}

#[test]
fn test_insert_and_find_order_with_assigned_users() {
    let conn = setup_conn();
    let guard = conn.lock().unwrap();
    let collector = insert_user(&guard, "collector");
    let a = insert_user(&guard, "a");
    let b = insert_user(&guard, "b");
    let restaurant = insert_restaurant(&guard, "Balbaa");

    let mut order = sample_order(&restaurant, &collector, "ABCD23");
    order.is_private = true;
    order.assigned_user_ids = vec![b.clone(), a.clone()];
    OrderRepository::insert_tx(&guard, &order).unwrap();

    let found = OrderRepository::find_by_id_tx(&guard, &order.order_id).unwrap().unwrap();
    assert_eq!(found.code, "ABCD23");
    assert_eq!(found.status, OrderStatus::Open);
    assert!(found.is_private);
    assert_eq!(found.assigned_user_ids, vec![b, a]);
    assert_eq!(found.fees.total(), d("40"));
    assert!(OrderRepository::code_exists_tx(&guard, "ABCD23").unwrap());
}

#[test]
fn test_duplicate_code_rejected() {
    let conn = setup_conn();
    let guard = conn.lock().unwrap();
    let collector = insert_user(&guard, "collector");
    let restaurant = insert_restaurant(&guard, "Balbaa");

    OrderRepository::insert_tx(&guard, &sample_order(&restaurant, &collector, "SAME22")).unwrap();
    let err = OrderRepository::insert_tx(&guard, &sample_order(&restaurant, &collector, "SAME22"))
        .unwrap_err();
    assert!(matches!(err, RepositoryError::UniqueConstraintViolation(_)));
}

#[test]
fn test_update_status_checks_expected_state() {
    let conn = setup_conn();
    let guard = conn.lock().unwrap();
    let collector = insert_user(&guard, "collector");
    let restaurant = insert_restaurant(&guard, "Balbaa");
    let mut order = sample_order(&restaurant, &collector, "STAT22");
    OrderRepository::insert_tx(&guard, &order).unwrap();

    order.status = OrderStatus::Locked;
    order.locked_at = Some(order.created_at);
    assert_eq!(OrderRepository::update_status_tx(&guard, &order, OrderStatus::Open).unwrap(), 1);
    // 状态已变化,再次以 OPEN 为前提更新不生效
    assert_eq!(OrderRepository::update_status_tx(&guard, &order, OrderStatus::Open).unwrap(), 0);

    let found = OrderRepository::find_by_id_tx(&guard, &order.order_id).unwrap().unwrap();
    assert_eq!(found.status, OrderStatus::Locked);
    assert_eq!(found.locked_at, Some(order.created_at));
}

#[test]
fn test_items_keep_insertion_order_and_sources() {
    let conn = setup_conn();
    let guard = conn.lock().unwrap();
    let collector = insert_user(&guard, "collector");
    let restaurant = insert_restaurant(&guard, "Balbaa");
    let order = sample_order(&restaurant, &collector, "ITEM22");
    OrderRepository::insert_tx(&guard, &order).unwrap();

    let first = custom_item(&order.order_id, &collector, "Bread", "2.50", 2);
    let second = custom_item(&order.order_id, &collector, "Tea", "5", 1);
    OrderRepository::insert_item_tx(&guard, &first).unwrap();
    OrderRepository::insert_item_tx(&guard, &second).unwrap();

    let items = OrderRepository::list_items_tx(&guard, &order.order_id).unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].item_id, first.item_id);
    assert_eq!(items[0].total_price, d("5.00"));
    assert_eq!(
        items[0].source,
        ItemSource::Custom {
            name: "Bread".to_string(),
            price: d("2.50")
        }
    );

    OrderRepository::delete_item_tx(&guard, &first.item_id).unwrap();
    assert_eq!(OrderRepository::count_items_tx(&guard, &order.order_id).unwrap(), 1);
    assert!(matches!(
        OrderRepository::delete_item_tx(&guard, &first.item_id),
        Err(RepositoryError::NotFound { .. })
    ));
}

#[test]
fn test_malformed_item_rejected_by_schema() {
    let conn = setup_conn();
    let guard = conn.lock().unwrap();
    let collector = insert_user(&guard, "collector");
    let restaurant = insert_restaurant(&guard, "Balbaa");
    let order = sample_order(&restaurant, &collector, "CHK222");
    OrderRepository::insert_tx(&guard, &order).unwrap();

    let result = guard.execute(
        r#"
        INSERT INTO order_item (item_id, order_id, user_id, user_name, item_kind,
            custom_name, custom_price, item_name, quantity, unit_price, total_price, created_at)
        VALUES ('x', ?1, ?2, 'c', 'CATALOG', 'Bread', '2', 'Bread', 1, '2', '2', datetime('now'))
        "#,
        [&order.order_id, &collector],
    );
    assert!(result.is_err());
}

#[test]
fn test_list_by_status() {
    let conn = setup_conn();
    {
        let guard = conn.lock().unwrap();
        let collector = insert_user(&guard, "collector");
        let restaurant = insert_restaurant(&guard, "Balbaa");
        let mut locked = sample_order(&restaurant, &collector, "LIST22");
        locked.status = OrderStatus::Locked;
        locked.locked_at = Some(locked.created_at);
        OrderRepository::insert_tx(&guard, &locked).unwrap();
        OrderRepository::insert_tx(&guard, &sample_order(&restaurant, &collector, "LIST33")).unwrap();
    }

    let repo = OrderRepository::new(conn);
    assert_eq!(repo.list(None).unwrap().len(), 2);
    let locked = repo.list(Some(OrderStatus::Locked)).unwrap();
    assert_eq!(locked.len(), 1);
    assert_eq!(locked[0].code, "LIST22");
    assert!(repo.find_by_code("LIST33").unwrap().is_some());
}
