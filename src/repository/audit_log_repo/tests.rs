use super::AuditLogRepository;
use crate::domain::audit_log::{AuditAction, AuditLog};
use crate::repository::test_fixtures::{insert_order, insert_user, setup_conn};
use chrono::Duration;
use std::sync::{Arc, Mutex};

fn setup() -> (AuditLogRepository, Arc<Mutex<rusqlite::Connection>>, String, String) {
    let conn = setup_conn();
    let (order_id, collector_id) = {
        let guard = conn.lock().unwrap();
        insert_order(&guard, "AUD001")
    };
    (AuditLogRepository::new(conn.clone()), conn, order_id, collector_id)
}

#[test]
fn test_insert_and_find_by_id() {
    let (repo, _conn, order_id, actor) = setup();

    let log = AuditLog::new(&order_id, AuditAction::Locked, &actor, "collector")
        .with_detail("锁单")
        .with_payload(&serde_json::json!({"from": "OPEN", "to": "LOCKED"}));
    let id = repo.insert(&log).unwrap();

    let found = repo.find_by_id(&id).unwrap().unwrap();
    assert_eq!(found.action(), Some(AuditAction::Locked));
    assert_eq!(found.actor_id.as_deref(), Some(actor.as_str()));
    assert_eq!(found.payload_json.unwrap()["to"], "LOCKED");
    assert_eq!(found.action_ts, log.action_ts);
}

#[test]
fn test_find_by_order_in_time_order() {
    let (repo, _conn, order_id, actor) = setup();
    let t0 = chrono::Utc::now().naive_utc();

    for (i, action) in [AuditAction::OrderCreated, AuditAction::ItemAdded, AuditAction::Locked]
        .into_iter()
        .enumerate()
    {
        let log = AuditLog::new(&order_id, action, &actor, "collector").at(t0 + Duration::seconds(i as i64));
        repo.insert(&log).unwrap();
    }

    let logs = repo.find_by_order_id(&order_id).unwrap();
    let actions: Vec<_> = logs.iter().filter_map(|l| l.action()).collect();
    assert_eq!(
        actions,
        vec![AuditAction::OrderCreated, AuditAction::ItemAdded, AuditAction::Locked]
    );
    assert_eq!(repo.count_by_action(&order_id, AuditAction::Locked).unwrap(), 1);
    assert_eq!(repo.find_recent(2).unwrap().len(), 2);
    assert_eq!(repo.find_by_actor(&actor, 10).unwrap().len(), 3);
}

#[test]
fn test_log_is_append_only() {
    let (repo, conn, order_id, actor) = setup();
    let log = AuditLog::new(&order_id, AuditAction::ItemAdded, &actor, "collector");
    repo.insert(&log).unwrap();

    let guard = conn.lock().unwrap();
    let result = guard.execute(
        "UPDATE audit_log SET detail = 'tampered' WHERE action_id = ?1",
        [&log.action_id],
    );
    assert!(result.is_err());
}

#[test]
fn test_actor_deletion_keeps_log() {
    let (repo, conn, order_id, _collector) = setup();
    let actor = {
        let guard = conn.lock().unwrap();
        insert_user(&guard, "temp_actor")
    };
    let log = AuditLog::new(&order_id, AuditAction::ItemRemoved, &actor, "temp_actor");
    repo.insert(&log).unwrap();

    {
        let guard = conn.lock().unwrap();
        guard.execute("DELETE FROM users WHERE user_id = ?1", [&actor]).unwrap();
    }

    let found = repo.find_by_id(&log.action_id).unwrap().unwrap();
    assert_eq!(found.actor_id, None);
    assert_eq!(found.actor_name, "temp_actor");
}
