//! 聚合统计
//!
//! 每次都从完整集合重新计算。集合可能在重新拉取后被整体替换，
//! 因此不维护增量计数器。

use bloodbank_core::{BloodGroup, BloodRequest, DashboardStats, Donor, InventoryRecord, RecordId, RequestStatus};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

use crate::severity::{classify, StockSeverity};

/// 库存汇总
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InventorySummary {
    pub total_units: u64,
    /// 覆盖全部8种血型，无记录的血型为0
    pub units_by_group: BTreeMap<BloodGroup, u64>,
    pub hospital_count: usize,
}

impl InventorySummary {
    /// 从库存记录计算汇总
    pub fn from_records(records: &[InventoryRecord]) -> Self {
        let mut units_by_group: BTreeMap<BloodGroup, u64> =
            BloodGroup::ALL.iter().map(|group| (*group, 0)).collect();
        let mut hospitals: HashSet<RecordId> = HashSet::new();
        let mut total_units = 0u64;

        for record in records {
            let units = u64::from(record.units);
            total_units += units;
            *units_by_group.entry(record.blood_group).or_insert(0) += units;
            hospitals.insert(record.hospital_id);
        }

        Self {
            total_units,
            units_by_group,
            hospital_count: hospitals.len(),
        }
    }

    /// 某血型的总单位数
    pub fn units_for(&self, group: BloodGroup) -> u64 {
        self.units_by_group.get(&group).copied().unwrap_or(0)
    }

    /// 某血型汇总后的严重程度（血型卡片）
    pub fn severity_for(&self, group: BloodGroup) -> StockSeverity {
        classify(u32::try_from(self.units_for(group)).unwrap_or(u32::MAX))
    }

    /// 处于危急状态的血型
    pub fn critical_groups(&self) -> Vec<BloodGroup> {
        BloodGroup::ALL
            .iter()
            .copied()
            .filter(|group| self.severity_for(*group) == StockSeverity::Critical)
            .collect()
    }
}

/// 献血者汇总
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct DonorSummary {
    pub total: usize,
    pub available: usize,
    pub verified: usize,
}

impl DonorSummary {
    pub fn from_donors(donors: &[Donor]) -> Self {
        Self {
            total: donors.len(),
            available: donors.iter().filter(|d| d.available).count(),
            verified: donors.iter().filter(|d| d.verified).count(),
        }
    }
}

/// 在 `/stats` 不可用时，由本地镜像推导看板统计
pub fn derive_dashboard_stats(donors: &[Donor], requests: &[BloodRequest]) -> DashboardStats {
    let summary = DonorSummary::from_donors(donors);
    DashboardStats {
        total_donors: summary.total as u64,
        available_donors: summary.available as u64,
        active_requests: requests
            .iter()
            .filter(|r| r.status == RequestStatus::Open)
            .count() as u64,
    }
}
