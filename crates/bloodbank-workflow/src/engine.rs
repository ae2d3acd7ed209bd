//! 看板引擎
//!
//! 组合各视图组件并提供统一入口。各组件各自持有自己的镜像，
//! 引擎只负责把跨组件的引用（医院、库存、申请）传递给需要的操作。

use bloodbank_core::{
    BloodBankError, BloodRequest, DashboardStats, DonationPayload, DonationRecord, Donor,
    DonorProfile, Hospital, InventoryRecord, RecordId, Result, SessionContext,
};
use bloodbank_integration::RemoteStore;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

use crate::aggregation::{derive_dashboard_stats, DonorSummary, InventorySummary};
use crate::donors::{DonorDraft, DonorRegistry};
use crate::hospitals::{HospitalDirectory, HospitalDraft};
use crate::inventory::{InventoryBoard, InventoryDraft};
use crate::requests::{RequestBoard, RequestDraft, RequestViewCounts};

/// 统计数据来源
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub enum StatsSource {
    /// 远程 `/stats` 快照
    Remote,
    /// 由本地镜像推导
    Derived,
}

/// 看板概览
#[derive(Debug, Clone, Serialize)]
pub struct DashboardOverview {
    pub stats: DashboardStats,
    pub source: StatsSource,
    pub inventory: InventorySummary,
    pub donors: DonorSummary,
    pub request_counts: RequestViewCounts,
}

/// 看板引擎
pub struct DashboardEngine {
    store: Arc<dyn RemoteStore>,
    session: SessionContext,
    requests: RequestBoard,
    inventory: InventoryBoard,
    hospitals: HospitalDirectory,
    donors: DonorRegistry,
}

impl DashboardEngine {
    pub fn new(store: Arc<dyn RemoteStore>, session: SessionContext) -> Self {
        Self {
            requests: RequestBoard::new(Arc::clone(&store)),
            inventory: InventoryBoard::new(Arc::clone(&store)),
            hospitals: HospitalDirectory::new(Arc::clone(&store)),
            donors: DonorRegistry::new(Arc::clone(&store)),
            store,
            session,
        }
    }

    /// 依次重新拉取全部集合
    pub async fn refresh_all(&mut self) -> Result<()> {
        self.hospitals.refresh().await?;
        self.inventory.refresh().await?;
        self.requests.refresh().await?;
        self.donors.refresh().await?;
        info!("Dashboard refreshed from {}", self.store.name());
        Ok(())
    }

    pub async fn submit_request(&mut self, draft: &RequestDraft) -> Result<BloodRequest> {
        self.requests.submit(draft, Some(self.hospitals.hospitals())).await
    }

    pub async fn fulfill_request(&mut self, id: RecordId) -> Result<BloodRequest> {
        self.requests.fulfill(id).await
    }

    pub async fn cancel_request(&mut self, id: RecordId) -> Result<BloodRequest> {
        self.requests.cancel(id).await
    }

    pub async fn upsert_inventory(&mut self, draft: &InventoryDraft) -> Result<InventoryRecord> {
        self.inventory.upsert(draft, Some(self.hospitals.hospitals())).await
    }

    pub async fn create_hospital(&mut self, draft: &HospitalDraft) -> Result<Hospital> {
        self.hospitals.create(draft).await
    }

    pub async fn toggle_hospital(&mut self, id: RecordId) -> Result<Option<Hospital>> {
        self.hospitals.toggle_verified(id).await
    }

    /// 删除医院，仍被本地库存或申请引用时拒绝
    pub async fn delete_hospital(&mut self, id: RecordId) -> Result<bool> {
        self.hospitals
            .delete(id, self.inventory.records(), self.requests.requests())
            .await
    }

    pub async fn register_donor(&mut self, draft: &DonorDraft) -> Result<Donor> {
        self.donors.register(&mut self.session, draft).await
    }

    pub async fn toggle_donor(&mut self, id: RecordId) -> Result<Option<Donor>> {
        self.donors.toggle_availability(id).await
    }

    pub async fn record_donation(&mut self, id: RecordId, payload: &DonationPayload) -> Result<DonationRecord> {
        self.donors.record_donation(id, payload).await
    }

    /// 献血者档案；未指定邮箱时使用会话邮箱
    pub async fn donor_profile(&mut self, email: Option<&str>) -> Result<DonorProfile> {
        let email = email
            .map(str::to_string)
            .or_else(|| self.session.email.clone())
            .ok_or_else(|| BloodBankError::Validation("No donor email in session".to_string()))?;
        self.donors.profile(&email).await
    }

    /// 看板概览；`/stats` 失败时退回到由镜像推导
    pub async fn overview(&self) -> DashboardOverview {
        let (stats, source) = match self.store.stats().await {
            Ok(stats) => (stats, StatsSource::Remote),
            Err(e) => {
                warn!("Stats snapshot unavailable, deriving from mirrors: {}", e);
                let derived = derive_dashboard_stats(
                    self.donors.donors().items(),
                    self.requests.requests().items(),
                );
                (derived, StatsSource::Derived)
            }
        };

        DashboardOverview {
            stats,
            source,
            inventory: self.inventory.summary(),
            donors: self.donors.summary(),
            request_counts: self.requests.counts(),
        }
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    pub fn requests(&self) -> &RequestBoard {
        &self.requests
    }

    pub fn inventory(&self) -> &InventoryBoard {
        &self.inventory
    }

    pub fn hospitals(&self) -> &HospitalDirectory {
        &self.hospitals
    }

    pub fn donors(&self) -> &DonorRegistry {
        &self.donors
    }

    pub fn donors_mut(&mut self) -> &mut DonorRegistry {
        &mut self.donors
    }

    pub fn hospitals_mut(&mut self) -> &mut HospitalDirectory {
        &mut self.hospitals
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bloodbank_core::{BloodGroup, Role};
    use bloodbank_integration::{InMemoryStore, StoreOperation};

    fn session() -> SessionContext {
        SessionContext {
            role: Role::Admin,
            email: None,
            donor_registered: false,
        }
    }

    #[tokio::test]
    async fn test_overview_prefers_remote_stats() {
        let store = Arc::new(InMemoryStore::with_sample_data());
        let mut engine = DashboardEngine::new(store, session());
        engine.refresh_all().await.unwrap();

        let overview = engine.overview().await;
        assert_eq!(overview.source, StatsSource::Remote);
        assert_eq!(overview.stats.active_requests, 1);
        assert_eq!(overview.inventory.total_units, 28);
        assert_eq!(overview.inventory.hospital_count, 1);
    }

    #[tokio::test]
    async fn test_overview_falls_back_to_mirrors() {
        let store = Arc::new(InMemoryStore::with_sample_data());
        let mut engine = DashboardEngine::new(store.clone(), session());
        engine.refresh_all().await.unwrap();
        store.fail_on(StoreOperation::Stats).await;

        let overview = engine.overview().await;
        assert_eq!(overview.source, StatsSource::Derived);
        assert_eq!(overview.stats.active_requests, 1);
        assert_eq!(overview.stats.total_donors, 0);
    }

    #[tokio::test]
    async fn test_submit_checks_loaded_hospitals() {
        let store = Arc::new(InMemoryStore::with_sample_data());
        let mut engine = DashboardEngine::new(store.clone(), session());
        engine.refresh_all().await.unwrap();

        let draft = RequestDraft {
            hospital_id: Some(9),
            blood_group: Some(BloodGroup::BPositive),
            ..Default::default()
        };
        assert!(matches!(
            engine.submit_request(&draft).await,
            Err(BloodBankError::Validation(_))
        ));
        assert_eq!(store.calls(StoreOperation::CreateRequest).await, 0);
    }

    #[tokio::test]
    async fn test_delete_hospital_uses_other_mirrors() {
        let store = Arc::new(InMemoryStore::with_sample_data());
        let mut engine = DashboardEngine::new(store, session());
        engine.refresh_all().await.unwrap();

        // 医院2被唯一的申请引用
        assert!(engine.delete_hospital(2).await.is_err());
        engine.cancel_request(1).await.unwrap();
        assert!(engine.delete_hospital(2).await.is_err());
        assert!(!engine.delete_hospital(5).await.unwrap());
    }

    #[tokio::test]
    async fn test_donor_profile_defaults_to_session_email() {
        let store = Arc::new(InMemoryStore::with_sample_data());
        let mut engine = DashboardEngine::new(store.clone(), session());
        engine.refresh_all().await.unwrap();

        // 管理员会话没有邮箱
        assert!(matches!(
            engine.donor_profile(None).await,
            Err(BloodBankError::Validation(_))
        ));
        assert_eq!(store.calls(StoreOperation::DonorProfile).await, 0);

        let mut donor_session = session();
        donor_session.role = Role::Donor;
        donor_session.email = Some("kiran@example.org".to_string());
        let mut engine = DashboardEngine::new(store.clone(), donor_session);
        let draft = crate::donors::DonorDraft {
            name: "Kiran".to_string(),
            gender: "male".to_string(),
            blood_group: Some(BloodGroup::BPositive),
            phone: "555-0199".to_string(),
            city: "Chennai".to_string(),
            email: None,
        };
        let registered = engine.register_donor(&draft).await.unwrap();

        let profile = engine.donor_profile(None).await.unwrap();
        assert_eq!(profile.donor.id, registered.id);
        assert!(profile.donation_history.is_empty());
    }
}
