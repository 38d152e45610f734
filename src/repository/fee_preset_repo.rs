// ==========================================
// BrightEat 团餐拼单系统 - 费用预设数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================

use crate::domain::fee_preset::{FeeBundle, FeePreset};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::sql_types::{decimal_at, money};
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

pub struct FeePresetRepository {
    conn: Arc<Mutex<Connection>>,
}

impl FeePresetRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    pub fn insert(&self, preset: &FeePreset) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO fee_preset (preset_id, name, delivery_fee, tip, service_fee, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                preset.preset_id,
                preset.name,
                money(preset.fees.delivery_fee),
                money(preset.fees.tip),
                money(preset.fees.service_fee),
                preset.created_at,
            ],
        )?;
        Ok(())
    }

    pub fn find_by_id(&self, preset_id: &str) -> RepositoryResult<Option<FeePreset>> {
        let conn = self.get_conn()?;
        Self::find_by_id_tx(&conn, preset_id)
    }

    pub fn find_by_id_tx(conn: &Connection, preset_id: &str) -> RepositoryResult<Option<FeePreset>> {
        let preset = conn
            .query_row(
                r#"
                SELECT preset_id, name, delivery_fee, tip, service_fee, created_at
                FROM fee_preset WHERE preset_id = ?1
                "#,
                params![preset_id],
                map_preset_row,
            )
            .optional()?;
        Ok(preset)
    }

    pub fn find_by_name(&self, name: &str) -> RepositoryResult<Option<FeePreset>> {
        let conn = self.get_conn()?;
        let preset = conn
            .query_row(
                r#"
                SELECT preset_id, name, delivery_fee, tip, service_fee, created_at
                FROM fee_preset WHERE name = ?1
                "#,
                params![name],
                map_preset_row,
            )
            .optional()?;
        Ok(preset)
    }

    pub fn list_all(&self) -> RepositoryResult<Vec<FeePreset>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT preset_id, name, delivery_fee, tip, service_fee, created_at
            FROM fee_preset ORDER BY name
            "#,
        )?;
        let list = stmt
            .query_map([], map_preset_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(list)
    }

    /// 删除预设（已创建的拼单持有费用副本,不受影响）
    pub fn delete(&self, preset_id: &str) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let rows = conn.execute("DELETE FROM fee_preset WHERE preset_id = ?1", params![preset_id])?;
        Ok(rows)
    }
}

fn map_preset_row(row: &Row<'_>) -> SqliteResult<FeePreset> {
    Ok(FeePreset {
        preset_id: row.get(0)?,
        name: row.get(1)?,
        fees: FeeBundle {
            delivery_fee: decimal_at(row, 2)?,
            tip: decimal_at(row, 3)?,
            service_fee: decimal_at(row, 4)?,
        },
        created_at: row.get(5)?,
    })
}
