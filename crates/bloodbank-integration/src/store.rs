//! 远程存储接口
//!
//! 每个调用都会挂起发起方直到远程响应到达，接口本身不定义超时或取消。

use async_trait::async_trait;
use bloodbank_core::{
    BloodRequest, DashboardStats, Donor, DonationPayload, DonationReceipt, DonorProfile, DonorRegistration,
    Hospital, HospitalPayload, InventoryPayload, InventoryRecord, NewRequestPayload, RecordId,
    RequestStatus, Result, UnavailableDate,
};

/// 远程存储
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// 存储名称，用于日志
    fn name(&self) -> &str;

    // 用血申请
    async fn list_requests(&self) -> Result<Vec<BloodRequest>>;
    async fn create_request(&self, payload: &NewRequestPayload) -> Result<BloodRequest>;
    async fn update_request_status(&self, id: RecordId, status: RequestStatus) -> Result<BloodRequest>;

    // 库存
    async fn list_inventory(&self) -> Result<Vec<InventoryRecord>>;
    async fn create_inventory(&self, payload: &InventoryPayload) -> Result<InventoryRecord>;
    async fn update_inventory(&self, id: RecordId, payload: &InventoryPayload) -> Result<InventoryRecord>;

    // 医院
    async fn list_hospitals(&self) -> Result<Vec<Hospital>>;
    async fn create_hospital(&self, payload: &HospitalPayload) -> Result<Hospital>;
    async fn update_hospital(&self, id: RecordId, payload: &HospitalPayload) -> Result<Hospital>;
    async fn toggle_hospital(&self, id: RecordId) -> Result<Hospital>;
    async fn delete_hospital(&self, id: RecordId) -> Result<()>;

    // 献血者
    async fn list_donors(&self) -> Result<Vec<Donor>>;
    async fn register_donor(&self, payload: &DonorRegistration) -> Result<Donor>;
    async fn toggle_donor(&self, id: RecordId) -> Result<Donor>;
    async fn update_unavailable_dates(&self, id: RecordId, dates: &[UnavailableDate]) -> Result<Donor>;
    async fn record_donation(&self, id: RecordId, payload: &DonationPayload) -> Result<DonationReceipt>;
    /// 按邮箱查询献血者档案及献血历史
    async fn donor_profile(&self, email: &str) -> Result<DonorProfile>;

    /// 预计算统计快照
    async fn stats(&self) -> Result<DashboardStats>;
}
