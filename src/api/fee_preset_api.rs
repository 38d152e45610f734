// ==========================================
// BrightEat 团餐拼单系统 - 费用预设 API
// ==========================================
// 职责: 费用预设的创建、查询、删除
// 红线: 拼单创建时复制预设数值; 删除预设不影响已创建的拼单
// ==========================================

use std::sync::Arc;

use crate::api::error::{ApiError, ApiResult};
use crate::domain::fee_preset::{FeeBundle, FeePreset};
use crate::engine::money::validate_amount;
use crate::repository::FeePresetRepository;

pub struct FeePresetApi {
    fee_preset_repo: Arc<FeePresetRepository>,
}

impl FeePresetApi {
    pub fn new(fee_preset_repo: Arc<FeePresetRepository>) -> Self {
        Self { fee_preset_repo }
    }

    /// 创建费用预设
    ///
    /// # 错误
    /// - InvalidInput: 名称为空/重复,或任一费用为负、精度超限
    pub fn create_preset(&self, name: &str, fees: FeeBundle) -> ApiResult<FeePreset> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ApiError::InvalidInput("预设名称不能为空".to_string()));
        }
        if let Some(field) = fees.first_negative_field() {
            return Err(ApiError::InvalidInput(format!("{} 不能为负数", field)));
        }
        for (field, value) in [
            ("delivery_fee", fees.delivery_fee),
            ("tip", fees.tip),
            ("service_fee", fees.service_fee),
        ] {
            validate_amount(field, value).map_err(ApiError::InvalidInput)?;
        }

        let preset = FeePreset {
            preset_id: uuid::Uuid::new_v4().to_string(),
            name: name.to_string(),
            fees,
            created_at: chrono::Utc::now().naive_utc(),
        };
        self.fee_preset_repo.insert(&preset)?;
        tracing::info!(preset_id = %preset.preset_id, name = %preset.name, total = %fees.total(), "费用预设已创建");
        Ok(preset)
    }

    pub fn list_presets(&self) -> ApiResult<Vec<FeePreset>> {
        Ok(self.fee_preset_repo.list_all()?)
    }

    pub fn get_preset(&self, preset_id: &str) -> ApiResult<FeePreset> {
        self.fee_preset_repo
            .find_by_id(preset_id)?
            .ok_or_else(|| ApiError::not_found("FeePreset", preset_id))
    }

    pub fn find_preset_by_name(&self, name: &str) -> ApiResult<Option<FeePreset>> {
        Ok(self.fee_preset_repo.find_by_name(name.trim())?)
    }

    pub fn delete_preset(&self, preset_id: &str) -> ApiResult<()> {
        if self.fee_preset_repo.delete(preset_id)? == 0 {
            return Err(ApiError::not_found("FeePreset", preset_id));
        }
        tracing::info!(preset_id = preset_id, "费用预设已删除");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use std::sync::{Arc, Mutex};

    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn test_preset_crud() {
        let conn = Arc::new(Mutex::new(crate::db::open_in_memory().unwrap()));
        let api = FeePresetApi::new(Arc::new(FeePresetRepository::new(conn)));

        let preset = api
            .create_preset("Talabat", FeeBundle::new(d("30"), d("10"), d("0")))
            .unwrap();
        assert_eq!(api.get_preset(&preset.preset_id).unwrap().fees.total(), d("40"));
        assert_eq!(api.list_presets().unwrap().len(), 1);

        let err = api
            .create_preset("Otlob", FeeBundle::new(d("25"), d("-5"), d("0")))
            .unwrap_err();
        assert!(err.to_string().contains("tip"));

        api.delete_preset(&preset.preset_id).unwrap();
        assert_eq!(api.get_preset(&preset.preset_id).unwrap_err().code(), "NOT_FOUND");
    }
}
