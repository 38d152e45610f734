// ==========================================
// 并发控制测试
// ==========================================
// 职责: 验证锁单与加菜在独立连接上并发时的串行化
// ==========================================

mod helpers;

use std::sync::{Arc, Barrier};
use std::thread;

use brighteat::api::ApiError;
use brighteat::domain::types::OrderStatus;
use brighteat::ItemRequest;

use helpers::api_test_helper::ApiTestEnv;
use helpers::test_data_builder::OrderRequestBuilder;

const ADDERS: usize = 4;
const ADDS_PER_THREAD: usize = 10;

#[test]
fn test_lock_races_with_add_item() {
    let env = ApiTestEnv::with_seed().unwrap();
    let mostafa = env.state.user_api.find_by_username("mostafa").unwrap();
    let order = env
        .state
        .order_api
        .create_order(
            OrderRequestBuilder::new(&env.restaurant_id(), &mostafa.user_id)
                .fees("30", "10", "0")
                .build(),
        )
        .unwrap();
    let kunafa = env.menu_item_id("Kunafa");

    let barrier = Arc::new(Barrier::new(ADDERS + 1));
    let mut handles = Vec::new();

    for n in 0..ADDERS {
        // 每个线程使用独立连接,依赖 SQLite IMMEDIATE 事务串行化
        let state = env.reopen().unwrap();
        let user = env.register(&format!("racer{}", n)).unwrap();
        let order_id = order.order_id.clone();
        let kunafa = kunafa.clone();
        let barrier = barrier.clone();
        handles.push(thread::spawn(move || {
            barrier.wait();
            let mut added = 0;
            let mut rejected = 0;
            for _ in 0..ADDS_PER_THREAD {
                match state
                    .order_api
                    .add_item(&order_id, &user.user_id, ItemRequest::catalog(&kunafa, 1))
                {
                    Ok(_) => added += 1,
                    Err(ApiError::OrderLocked { .. }) => rejected += 1,
                    Err(e) => panic!("unexpected error: {}", e),
                }
            }
            (added, rejected)
        }));
    }

    let locker = env.reopen().unwrap();
    let order_id = order.order_id.clone();
    let collector_id = mostafa.user_id.clone();
    let lock_barrier = barrier.clone();
    let lock_handle = thread::spawn(move || {
        lock_barrier.wait();
        locker.order_api.lock(&order_id, &collector_id).unwrap()
    });

    let mut added_total = 0;
    let mut rejected_total = 0;
    for handle in handles {
        let (added, rejected) = handle.join().unwrap();
        added_total += added;
        rejected_total += rejected;
    }
    let locked = lock_handle.join().unwrap();

    assert_eq!(locked.status, OrderStatus::Locked);
    assert_eq!(added_total + rejected_total, ADDERS * ADDS_PER_THREAD);

    // 成功加入的明细都早于锁单
    let items = env.state.order_api.list_items(&order.order_id).unwrap();
    assert_eq!(items.len(), added_total);
    let locked_at = locked.locked_at.unwrap();
    assert!(items.iter().all(|item| item.created_at <= locked_at));

    // 锁单后不再有新明细
    let err = env
        .state
        .order_api
        .add_item(
            &order.order_id,
            &mostafa.user_id,
            ItemRequest::catalog(&kunafa, 1),
        )
        .unwrap_err();
    assert_eq!(err.code(), "ORDER_LOCKED");
    assert_eq!(
        env.state.order_api.list_items(&order.order_id).unwrap().len(),
        added_total
    );
}

#[test]
fn test_concurrent_lock_only_one_wins() {
    let env = ApiTestEnv::with_seed().unwrap();
    let mostafa = env.state.user_api.find_by_username("mostafa").unwrap();
    let order = env
        .state
        .order_api
        .create_order(OrderRequestBuilder::new(&env.restaurant_id(), &mostafa.user_id).build())
        .unwrap();

    let barrier = Arc::new(Barrier::new(3));
    let handles: Vec<_> = (0..3)
        .map(|_| {
            let state = env.reopen().unwrap();
            let order_id = order.order_id.clone();
            let actor = mostafa.user_id.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                state.order_api.lock(&order_id, &actor)
            })
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    for err in results.iter().filter_map(|r| r.as_ref().err()) {
        assert_eq!(err.code(), "INVALID_TRANSITION");
    }

    let locks = env
        .state
        .order_api
        .list_audit_logs(&order.order_id)
        .unwrap()
        .into_iter()
        .filter(|l| l.action() == Some(brighteat::AuditAction::Locked))
        .count();
    assert_eq!(locks, 1);
}
