// ==========================================
// 拼单全流程端到端测试
// ==========================================
// 场景: 演示数据 → 发起拼单 → 多人加菜 → 锁单 → 下单 → 付款 → 结单
// ==========================================

mod helpers;

use brighteat::api::ApiError;
use brighteat::config::config_keys;
use brighteat::domain::types::{FeeSplitRule, OrderStatus};
use brighteat::{AuditAction, ItemRequest};
use chrono::NaiveDate;

use helpers::api_test_helper::ApiTestEnv;
use helpers::test_data_builder::{dec, OrderRequestBuilder};

#[test]
fn test_full_order_flow_with_seed_data() {
    let env = ApiTestEnv::with_seed().unwrap();
    let api = &env.state.order_api;

    let mostafa = env.state.user_api.find_by_username("mostafa").unwrap();
    let sara = env.register("sara").unwrap();

    let talabat = env
        .state
        .fee_preset_api
        .find_preset_by_name("Talabat")
        .unwrap()
        .unwrap();
    let cutoff = NaiveDate::from_ymd_opt(2025, 3, 1)
        .and_then(|d| d.and_hms_opt(13, 30, 0))
        .unwrap();
    let order = api
        .create_order(
            OrderRequestBuilder::new(&env.restaurant_id(), &mostafa.user_id)
                .preset(&talabat.preset_id)
                .cutoff(cutoff)
                .build(),
        )
        .unwrap();
    assert_eq!(order.fees.total(), dec("40.00"));

    // 预设删除不影响已创建拼单的费用副本
    env.state.fee_preset_api.delete_preset(&talabat.preset_id).unwrap();
    assert_eq!(api.get_order(&order.order_id).unwrap().fees.total(), dec("40.00"));

    api.add_item(
        &order.order_id,
        &mostafa.user_id,
        ItemRequest::catalog(&env.menu_item_id("Shawarma Sandwich"), 1),
    )
    .unwrap();
    api.add_item(
        &order.order_id,
        &sara.user_id,
        ItemRequest::catalog(&env.menu_item_id("Falafel Sandwich"), 1),
    )
    .unwrap();

    let summary = api.get_summary(&order.order_id).unwrap();
    assert_eq!(summary.restaurant_name, "Balbaa");
    assert!(summary.share_message.contains("Order from Balbaa"));
    assert!(summary.share_message.contains(&format!("Join code: {}", order.code)));
    assert!(summary.share_message.contains("01:30 PM"));
    assert_eq!(summary.join_url, format!("/join/{}", order.code));
    assert!(summary.payments.is_empty());

    api.lock(&order.order_id, &mostafa.user_id).unwrap();
    api.mark_ordered(&order.order_id, &mostafa.user_id).unwrap();

    let summary = api.get_summary(&order.order_id).unwrap();
    assert_eq!(summary.total_cost, dec("110.00"));
    let total_due: rust_decimal::Decimal = summary.payments.iter().map(|p| p.amount).sum();
    assert_eq!(total_due, summary.total_cost);

    for payment in &summary.payments {
        api.mark_paid(&payment.payment_id, &payment.user_id).unwrap();
    }
    let closed = api.close(&order.order_id, &mostafa.user_id).unwrap();
    assert_eq!(closed.status, OrderStatus::Closed);

    let logs = api.list_audit_logs(&order.order_id).unwrap();
    let transitions: Vec<AuditAction> = logs
        .iter()
        .filter_map(|l| l.action())
        .filter(|a| a.is_transition())
        .collect();
    assert_eq!(
        transitions,
        vec![AuditAction::Locked, AuditAction::Ordered, AuditAction::Closed]
    );
    assert!(logs.windows(2).all(|w| w[0].action_ts <= w[1].action_ts));
}

#[test]
fn test_weighted_order_persists_across_reopen() {
    let env = ApiTestEnv::with_seed().unwrap();
    let mostafa = env.state.user_api.find_by_username("mostafa").unwrap();
    let sara = env.register("sara").unwrap();

    let order = env
        .state
        .order_api
        .create_order(
            OrderRequestBuilder::new(&env.restaurant_id(), &mostafa.user_id)
                .fees("30", "10", "0")
                .rule(FeeSplitRule::Weighted)
                .build(),
        )
        .unwrap();
    env.state
        .order_api
        .add_item(
            &order.order_id,
            &mostafa.user_id,
            ItemRequest::catalog(&env.menu_item_id("Mixed Grill"), 1),
        )
        .unwrap();
    env.state
        .order_api
        .add_item(
            &order.order_id,
            &sara.user_id,
            ItemRequest::custom("Extra bread", dec("10.00"), 3),
        )
        .unwrap();
    env.state.order_api.lock(&order.order_id, &mostafa.user_id).unwrap();
    env.state
        .order_api
        .mark_ordered(&order.order_id, &mostafa.user_id)
        .unwrap();

    // 独立连接读取,确认已落盘
    let reopened = env.reopen().unwrap();
    let payments = reopened.order_api.list_payments(&order.order_id).unwrap();
    assert_eq!(payments.len(), 2);
    let grill = payments.iter().find(|p| p.user_id == mostafa.user_id).unwrap();
    let bread = payments.iter().find(|p| p.user_id == sara.user_id).unwrap();
    // 120 : 30 → 32.00 : 8.00
    assert_eq!(grill.fee_share, dec("32.00"));
    assert_eq!(bread.fee_share, dec("8.00"));
    assert_eq!(
        reopened.order_api.get_order(&order.order_id).unwrap().status,
        OrderStatus::Ordered
    );
}

#[test]
fn test_frontend_url_and_locale_shape_share_message() {
    let env = ApiTestEnv::with_seed().unwrap();
    let config = &env.state.config_manager;
    config
        .set_value(config_keys::FRONTEND_URL, "https://eat.example.com/")
        .unwrap();
    config.set_value(config_keys::LOCALE, "zh-CN").unwrap();

    let mostafa = env.state.user_api.find_by_username("mostafa").unwrap();
    let order = env
        .state
        .order_api
        .create_order(OrderRequestBuilder::new(&env.restaurant_id(), &mostafa.user_id).build())
        .unwrap();

    let summary = env.state.order_api.get_summary(&order.order_id).unwrap();
    assert_eq!(
        summary.join_url,
        format!("https://eat.example.com/join/{}", order.code)
    );
    assert!(summary.share_message.contains(&format!("拼单码: {}", order.code)));
}

#[test]
fn test_unknown_order_code() {
    let env = ApiTestEnv::new().unwrap();
    let err = env.state.order_api.find_by_code("ZZZZZZ").unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));
}

#[test]
fn test_recommendations_survive_reopen() {
    let env = ApiTestEnv::with_seed().unwrap();
    let sara = env.register("sara").unwrap();
    let restaurant_id = env.restaurant_id();

    env.state
        .catalog_api
        .add_recommendation(&sara.user_id, Some(&restaurant_id), "Shawarma is the best")
        .unwrap();
    env.state
        .catalog_api
        .add_recommendation(&sara.user_id, None, "Order before 13:00")
        .unwrap();

    let reopened = env.reopen().unwrap();
    let all = reopened.catalog_api.list_recommendations(None).unwrap();
    assert_eq!(all.len(), 2);
    let for_balbaa = reopened
        .catalog_api
        .list_recommendations(Some(&restaurant_id))
        .unwrap();
    assert_eq!(for_balbaa.len(), 1);
    assert_eq!(for_balbaa[0].user_name, "sara");
    assert_eq!(for_balbaa[0].restaurant_name.as_deref(), Some("Balbaa"));
}
