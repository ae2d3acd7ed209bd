//! 库存看板

use bloodbank_core::utils::non_blank;
use bloodbank_core::{
    BloodBankError, BloodGroup, Hospital, InventoryPayload, InventoryRecord, RecordId, Result,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use bloodbank_integration::RemoteStore;

use crate::aggregation::InventorySummary;
use crate::mirror::Mirror;
use crate::severity::{record_severity, StockSeverity};

/// 库存表单；`id` 为空时新建，否则更新
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InventoryDraft {
    pub id: Option<RecordId>,
    pub hospital_id: Option<RecordId>,
    pub hospital_name: Option<String>,
    pub blood_group: Option<BloodGroup>,
    pub units: i64,
    pub expiry: Option<NaiveDate>,
}

impl InventoryDraft {
    /// 从现有记录生成编辑表单
    pub fn from_record(record: &InventoryRecord) -> Self {
        Self {
            id: Some(record.id),
            hospital_id: Some(record.hospital_id),
            hospital_name: record.hospital_name.clone(),
            blood_group: Some(record.blood_group),
            units: i64::from(record.units),
            expiry: Some(record.expiry),
        }
    }

    pub fn validate(&self) -> Result<InventoryPayload> {
        let hospital_id = self
            .hospital_id
            .ok_or_else(|| BloodBankError::Validation("Hospital is required".to_string()))?;
        let blood_group = self
            .blood_group
            .ok_or_else(|| BloodBankError::Validation("Blood group is required".to_string()))?;
        let expiry = self
            .expiry
            .ok_or_else(|| BloodBankError::Validation("Expiry date is required".to_string()))?;
        let units = u32::try_from(self.units).map_err(|_| {
            BloodBankError::Validation(format!("Units must be a non-negative count, got {}", self.units))
        })?;

        Ok(InventoryPayload {
            hospital_id,
            hospital_name: non_blank(self.hospital_name.clone()).unwrap_or_default(),
            blood_group,
            units,
            expiry,
        })
    }
}

/// 带严重程度的库存行
#[derive(Debug, Clone, Serialize)]
pub struct InventoryRow<'a> {
    pub record: &'a InventoryRecord,
    pub severity: StockSeverity,
}

/// 库存看板
pub struct InventoryBoard {
    store: Arc<dyn RemoteStore>,
    inventory: Mirror<InventoryRecord>,
}

impl InventoryBoard {
    pub fn new(store: Arc<dyn RemoteStore>) -> Self {
        Self {
            store,
            inventory: Mirror::appending(),
        }
    }

    pub async fn refresh(&mut self) -> Result<usize> {
        let records = self.store.list_inventory().await?;
        let count = records.len();
        self.inventory.replace_all(records);
        info!("Loaded {} inventory records from {}", count, self.store.name());
        Ok(count)
    }

    /// 新建或更新库存记录
    ///
    /// 医院镜像已加载时校验医院存在，并在表单未给出名称时补上医院名称。
    pub async fn upsert(&mut self, draft: &InventoryDraft, hospitals: Option<&Mirror<Hospital>>) -> Result<InventoryRecord> {
        let mut payload = draft.validate()?;

        if let Some(hospitals) = hospitals.filter(|h| h.is_loaded()) {
            let hospital = hospitals.get(payload.hospital_id).ok_or_else(|| {
                BloodBankError::Validation(format!("Hospital {} not found", payload.hospital_id))
            })?;
            if payload.hospital_name.is_empty() {
                payload.hospital_name = hospital.name.clone();
            }
        }

        let confirmed = match draft.id {
            Some(id) => self.store.update_inventory(id, &payload).await?,
            None => self.store.create_inventory(&payload).await?,
        };
        self.inventory.upsert_from_server(confirmed.clone());

        info!(
            "Inventory {} now holds {} units of {} ({})",
            confirmed.id,
            confirmed.units,
            confirmed.blood_group,
            record_severity(&confirmed)
        );
        Ok(confirmed)
    }

    /// 各记录及其即时严重程度
    pub fn rows(&self) -> Vec<InventoryRow<'_>> {
        self.inventory
            .iter()
            .map(|record| InventoryRow {
                record,
                severity: record_severity(record),
            })
            .collect()
    }

    /// 危急记录
    pub fn critical_records(&self) -> Vec<&InventoryRecord> {
        self.inventory
            .iter()
            .filter(|record| record_severity(record) == StockSeverity::Critical)
            .collect()
    }

    pub fn summary(&self) -> InventorySummary {
        InventorySummary::from_records(self.inventory.items())
    }

    pub fn records(&self) -> &Mirror<InventoryRecord> {
        &self.inventory
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bloodbank_integration::{InMemoryStore, StoreOperation};

    fn draft(units: i64) -> InventoryDraft {
        InventoryDraft {
            id: None,
            hospital_id: Some(1),
            hospital_name: None,
            blood_group: Some(BloodGroup::AbNegative),
            units,
            expiry: NaiveDate::from_ymd_opt(2025, 6, 1),
        }
    }

    #[test]
    fn test_negative_units_rejected() {
        assert!(matches!(draft(-1).validate(), Err(BloodBankError::Validation(_))));
        assert_eq!(draft(0).validate().unwrap().units, 0);
    }

    #[test]
    fn test_missing_expiry_rejected() {
        let mut d = draft(4);
        d.expiry = None;
        assert!(d.validate().is_err());
    }

    #[tokio::test]
    async fn test_create_then_edit_keeps_position() {
        let store = Arc::new(InMemoryStore::with_sample_data());
        let mut board = InventoryBoard::new(store.clone());
        board.refresh().await.unwrap();

        let mut hospitals = Mirror::appending();
        hospitals.replace_all(store.list_hospitals().await.unwrap());

        let created = board.upsert(&draft(3), Some(&hospitals)).await.unwrap();
        assert_eq!(created.hospital_name.as_deref(), Some("Apollo Hospital"));
        assert_eq!(board.records().items().last().map(|r| r.id), Some(created.id));
        assert_eq!(board.critical_records().len(), 1);

        let mut edit = InventoryDraft::from_record(&board.records().items()[0]);
        edit.units = 2;
        board.upsert(&edit, None).await.unwrap();

        assert_eq!(board.records().items()[0].units, 2);
        assert_eq!(board.records().len(), 3);
        assert_eq!(store.calls(StoreOperation::UpdateInventory).await, 1);
    }

    #[tokio::test]
    async fn test_rows_carry_severity() {
        let store = Arc::new(InMemoryStore::with_sample_data());
        let mut board = InventoryBoard::new(store);
        board.refresh().await.unwrap();

        let severities: Vec<StockSeverity> = board.rows().iter().map(|row| row.severity).collect();
        assert_eq!(severities, vec![StockSeverity::Sufficient, StockSeverity::Sufficient]);
        assert_eq!(board.summary().total_units, 28);
    }
}
