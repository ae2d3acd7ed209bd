//! 内存远程存储
//!
//! 复现服务端的权威语义（ID分配、冗余字段填充、切换与统计），
//! 并支持按操作注入故障，便于验证失败时本地镜像保持不变。

use async_trait::async_trait;
use bloodbank_core::{
    BloodBankError, BloodGroup, BloodRequest, DashboardStats, Donor, DonationPayload,
    DonationReceipt, DonationRecord, DonorProfile, DonorRegistration, Hospital, HospitalPayload, Identified,
    InventoryPayload, InventoryRecord, NewRequestPayload, RecordId, RequestStatus, Result,
    UnavailableDate, Urgency,
};
use chrono::{NaiveDate, NaiveDateTime, Utc};
use std::collections::{HashMap, HashSet};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::store::RemoteStore;

/// 存储操作类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOperation {
    ListRequests,
    CreateRequest,
    UpdateRequestStatus,
    ListInventory,
    CreateInventory,
    UpdateInventory,
    ListHospitals,
    CreateHospital,
    UpdateHospital,
    ToggleHospital,
    DeleteHospital,
    ListDonors,
    RegisterDonor,
    ToggleDonor,
    UpdateUnavailableDates,
    RecordDonation,
    DonorProfile,
    Stats,
}

#[derive(Debug, Default)]
struct StoreState {
    requests: Vec<BloodRequest>,
    inventory: Vec<InventoryRecord>,
    hospitals: Vec<Hospital>,
    donors: Vec<Donor>,
    /// 献血历史，按献血者邮箱（缺省为 `donor_<id>`）归档
    donation_history: HashMap<String, Vec<DonationRecord>>,
}

fn history_key(donor: &Donor) -> String {
    if donor.email.is_empty() {
        format!("donor_{}", donor.id)
    } else {
        donor.email.clone()
    }
}

/// 内存远程存储
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: RwLock<StoreState>,
    failing: Mutex<HashSet<StoreOperation>>,
    offline: Mutex<bool>,
    calls: Mutex<HashMap<StoreOperation, usize>>,
}

fn next_id<T: Identified>(items: &[T]) -> RecordId {
    items.iter().map(Identified::id).max().unwrap_or(0) + 1
}

fn now() -> NaiveDateTime {
    Utc::now().naive_utc()
}

fn not_found(kind: &str, id: RecordId) -> BloodBankError {
    BloodBankError::RemoteFailure(format!("{} {} not found", kind, id))
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 预置与服务端初始数据一致的样例
    pub fn with_sample_data() -> Self {
        let hospitals = vec![
            Hospital {
                id: 1,
                name: "Apollo Hospital".to_string(),
                email: "apollo@gmail.com".to_string(),
                phone: "9876543210".to_string(),
                city: "Bangalore".to_string(),
                license: "LIC-AP-001".to_string(),
                verified: true,
            },
            Hospital {
                id: 2,
                name: "Fortis Care".to_string(),
                email: "fortis@gmail.com".to_string(),
                phone: "9123456789".to_string(),
                city: "Delhi".to_string(),
                license: "LIC-FT-002".to_string(),
                verified: false,
            },
        ];

        let inventory = vec![
            InventoryRecord {
                id: 1,
                hospital_id: 1,
                hospital_name: Some("Apollo Hospital".to_string()),
                blood_group: BloodGroup::BNegative,
                units: 10,
                expiry: NaiveDate::from_ymd_opt(2025, 3, 10).unwrap_or_default(),
                updated_at: NaiveDate::from_ymd_opt(2025, 1, 24).and_then(|d| d.and_hms_opt(22, 2, 0)),
            },
            InventoryRecord {
                id: 2,
                hospital_id: 1,
                hospital_name: Some("Apollo Hospital".to_string()),
                blood_group: BloodGroup::OPositive,
                units: 18,
                expiry: NaiveDate::from_ymd_opt(2025, 4, 2).unwrap_or_default(),
                updated_at: NaiveDate::from_ymd_opt(2025, 1, 23).and_then(|d| d.and_hms_opt(20, 15, 0)),
            },
        ];

        let requests = vec![BloodRequest {
            id: 1,
            hospital_id: 2,
            hospital_name: Some("Fortis Care".to_string()),
            city: Some("Delhi".to_string()),
            blood_group: BloodGroup::ANegative,
            units: 1,
            urgency: Urgency::Low,
            status: RequestStatus::Open,
            phone: Some("+1 555 200 3000".to_string()),
            patient_name: None,
            reason: None,
            created_at: NaiveDate::from_ymd_opt(2025, 1, 24).and_then(|d| d.and_hms_opt(12, 33, 0)),
        }];

        Self::new()
            .with_hospitals(hospitals)
            .with_inventory(inventory)
            .with_requests(requests)
    }

    pub fn with_hospitals(mut self, hospitals: Vec<Hospital>) -> Self {
        self.state.get_mut().hospitals = hospitals;
        self
    }

    pub fn with_inventory(mut self, inventory: Vec<InventoryRecord>) -> Self {
        self.state.get_mut().inventory = inventory;
        self
    }

    pub fn with_requests(mut self, requests: Vec<BloodRequest>) -> Self {
        self.state.get_mut().requests = requests;
        self
    }

    pub fn with_donors(mut self, donors: Vec<Donor>) -> Self {
        self.state.get_mut().donors = donors;
        self
    }

    /// 使指定操作失败，直到 `recover` 被调用
    pub async fn fail_on(&self, operation: StoreOperation) {
        self.failing.lock().await.insert(operation);
    }

    pub async fn recover(&self, operation: StoreOperation) {
        self.failing.lock().await.remove(&operation);
    }

    /// 模拟整个存储不可达
    pub async fn set_offline(&self, offline: bool) {
        *self.offline.lock().await = offline;
    }

    /// 某操作被调用的次数（含失败）
    pub async fn calls(&self, operation: StoreOperation) -> usize {
        self.calls.lock().await.get(&operation).copied().unwrap_or(0)
    }

    pub async fn total_calls(&self) -> usize {
        self.calls.lock().await.values().sum()
    }

    /// 绕过接口直接读取服务端记录
    pub async fn request_snapshot(&self, id: RecordId) -> Option<BloodRequest> {
        self.state.read().await.requests.iter().find(|r| r.id == id).cloned()
    }

    async fn check(&self, operation: StoreOperation) -> Result<()> {
        *self.calls.lock().await.entry(operation).or_insert(0) += 1;

        if *self.offline.lock().await {
            warn!("In-memory store offline, rejecting {:?}", operation);
            return Err(BloodBankError::RemoteFailure("store unreachable".to_string()));
        }
        if self.failing.lock().await.contains(&operation) {
            warn!("Injected failure for {:?}", operation);
            return Err(BloodBankError::RemoteFailure(format!("{:?} rejected by store", operation)));
        }

        debug!("In-memory store handling {:?}", operation);
        Ok(())
    }
}

#[async_trait]
impl RemoteStore for InMemoryStore {
    fn name(&self) -> &str {
        "in-memory"
    }

    async fn list_requests(&self) -> Result<Vec<BloodRequest>> {
        self.check(StoreOperation::ListRequests).await?;
        Ok(self.state.read().await.requests.clone())
    }

    async fn create_request(&self, payload: &NewRequestPayload) -> Result<BloodRequest> {
        self.check(StoreOperation::CreateRequest).await?;
        let mut state = self.state.write().await;

        let hospital = state
            .hospitals
            .iter()
            .find(|h| h.id == payload.hospital_id)
            .cloned()
            .ok_or_else(|| not_found("Hospital", payload.hospital_id))?;

        let request = BloodRequest {
            id: next_id(&state.requests),
            hospital_id: hospital.id,
            hospital_name: Some(hospital.name),
            city: Some(hospital.city),
            blood_group: payload.blood_group,
            units: payload.units,
            urgency: payload.urgency,
            status: RequestStatus::Open,
            phone: payload.phone.clone(),
            patient_name: payload.patient_name.clone(),
            reason: payload.reason.clone(),
            created_at: Some(now()),
        };

        state.requests.push(request.clone());
        info!("Store created request {}", request.id);
        Ok(request)
    }

    async fn update_request_status(&self, id: RecordId, status: RequestStatus) -> Result<BloodRequest> {
        self.check(StoreOperation::UpdateRequestStatus).await?;
        let mut state = self.state.write().await;

        let request = state
            .requests
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| not_found("Request", id))?;
        request.status = status;
        Ok(request.clone())
    }

    async fn list_inventory(&self) -> Result<Vec<InventoryRecord>> {
        self.check(StoreOperation::ListInventory).await?;
        Ok(self.state.read().await.inventory.clone())
    }

    async fn create_inventory(&self, payload: &InventoryPayload) -> Result<InventoryRecord> {
        self.check(StoreOperation::CreateInventory).await?;
        let mut state = self.state.write().await;

        let record = InventoryRecord {
            id: next_id(&state.inventory),
            hospital_id: payload.hospital_id,
            hospital_name: Some(payload.hospital_name.clone()),
            blood_group: payload.blood_group,
            units: payload.units,
            expiry: payload.expiry,
            updated_at: Some(now()),
        };

        state.inventory.push(record.clone());
        Ok(record)
    }

    async fn update_inventory(&self, id: RecordId, payload: &InventoryPayload) -> Result<InventoryRecord> {
        self.check(StoreOperation::UpdateInventory).await?;
        let mut state = self.state.write().await;

        let record = state
            .inventory
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| not_found("Inventory", id))?;
        record.hospital_id = payload.hospital_id;
        record.hospital_name = Some(payload.hospital_name.clone());
        record.blood_group = payload.blood_group;
        record.units = payload.units;
        record.expiry = payload.expiry;
        record.updated_at = Some(now());
        Ok(record.clone())
    }

    async fn list_hospitals(&self) -> Result<Vec<Hospital>> {
        self.check(StoreOperation::ListHospitals).await?;
        Ok(self.state.read().await.hospitals.clone())
    }

    async fn create_hospital(&self, payload: &HospitalPayload) -> Result<Hospital> {
        self.check(StoreOperation::CreateHospital).await?;
        let mut state = self.state.write().await;

        let hospital = Hospital {
            id: next_id(&state.hospitals),
            name: payload.name.clone(),
            email: payload.email.clone(),
            phone: payload.phone.clone(),
            city: payload.city.clone(),
            license: payload.license.clone(),
            verified: false,
        };

        state.hospitals.push(hospital.clone());
        Ok(hospital)
    }

    async fn update_hospital(&self, id: RecordId, payload: &HospitalPayload) -> Result<Hospital> {
        self.check(StoreOperation::UpdateHospital).await?;
        let mut state = self.state.write().await;

        let hospital = state
            .hospitals
            .iter_mut()
            .find(|h| h.id == id)
            .ok_or_else(|| not_found("Hospital", id))?;
        hospital.name = payload.name.clone();
        hospital.email = payload.email.clone();
        hospital.phone = payload.phone.clone();
        hospital.city = payload.city.clone();
        hospital.license = payload.license.clone();
        Ok(hospital.clone())
    }

    async fn toggle_hospital(&self, id: RecordId) -> Result<Hospital> {
        self.check(StoreOperation::ToggleHospital).await?;
        let mut state = self.state.write().await;

        let hospital = state
            .hospitals
            .iter_mut()
            .find(|h| h.id == id)
            .ok_or_else(|| not_found("Hospital", id))?;
        hospital.verified = !hospital.verified;
        Ok(hospital.clone())
    }

    async fn delete_hospital(&self, id: RecordId) -> Result<()> {
        self.check(StoreOperation::DeleteHospital).await?;
        let mut state = self.state.write().await;

        let before = state.hospitals.len();
        state.hospitals.retain(|h| h.id != id);
        if state.hospitals.len() == before {
            return Err(not_found("Hospital", id));
        }
        Ok(())
    }

    async fn list_donors(&self) -> Result<Vec<Donor>> {
        self.check(StoreOperation::ListDonors).await?;
        Ok(self.state.read().await.donors.clone())
    }

    async fn register_donor(&self, payload: &DonorRegistration) -> Result<Donor> {
        self.check(StoreOperation::RegisterDonor).await?;
        let mut state = self.state.write().await;

        if !payload.email.is_empty() && state.donors.iter().any(|d| d.email == payload.email) {
            return Err(BloodBankError::RemoteFailure("Donor already registered".to_string()));
        }

        let donor = Donor {
            id: next_id(&state.donors),
            name: payload.name.clone(),
            gender: payload.gender.clone(),
            email: payload.email.clone(),
            phone: payload.phone.clone(),
            city: payload.city.clone(),
            blood_group: payload.blood_group,
            available: false,
            verified: false,
            donation_count: 0,
            last_donation_date: None,
            unavailable_dates: Vec::new(),
        };

        state.donors.push(donor.clone());
        Ok(donor)
    }

    async fn toggle_donor(&self, id: RecordId) -> Result<Donor> {
        self.check(StoreOperation::ToggleDonor).await?;
        let mut state = self.state.write().await;

        let donor = state
            .donors
            .iter_mut()
            .find(|d| d.id == id)
            .ok_or_else(|| not_found("Donor", id))?;
        donor.available = !donor.available;
        Ok(donor.clone())
    }

    async fn update_unavailable_dates(&self, id: RecordId, dates: &[UnavailableDate]) -> Result<Donor> {
        self.check(StoreOperation::UpdateUnavailableDates).await?;
        let mut state = self.state.write().await;

        let donor = state
            .donors
            .iter_mut()
            .find(|d| d.id == id)
            .ok_or_else(|| not_found("Donor", id))?;
        donor.unavailable_dates = dates.to_vec();
        Ok(donor.clone())
    }

    async fn record_donation(&self, id: RecordId, payload: &DonationPayload) -> Result<DonationReceipt> {
        self.check(StoreOperation::RecordDonation).await?;
        let mut state = self.state.write().await;
        let state = &mut *state;

        let donor = state
            .donors
            .iter_mut()
            .find(|d| d.id == id)
            .ok_or_else(|| not_found("Donor", id))?;

        let timestamp = now();
        donor.donation_count += 1;
        donor.last_donation_date = Some(timestamp);

        let donation = DonationRecord {
            blood_group: donor.blood_group,
            units: payload.units,
            date_time: timestamp,
            requestor_name: payload.requestor_name.clone(),
            requestor_email: payload.requestor_email.clone(),
        };
        state
            .donation_history
            .entry(history_key(donor))
            .or_default()
            .push(donation.clone());

        Ok(DonationReceipt {
            donor: donor.clone(),
            donation,
        })
    }

    async fn donor_profile(&self, email: &str) -> Result<DonorProfile> {
        self.check(StoreOperation::DonorProfile).await?;
        let state = self.state.read().await;

        let donor = state
            .donors
            .iter()
            .find(|d| d.email == email)
            .cloned()
            .ok_or_else(|| BloodBankError::RemoteFailure("Donor profile not found".to_string()))?;
        let donation_history = state
            .donation_history
            .get(email)
            .cloned()
            .unwrap_or_default();

        Ok(DonorProfile { donor, donation_history })
    }

    async fn stats(&self) -> Result<DashboardStats> {
        self.check(StoreOperation::Stats).await?;
        let state = self.state.read().await;

        Ok(DashboardStats {
            total_donors: state.donors.len() as u64,
            available_donors: state.donors.iter().filter(|d| d.available).count() as u64,
            active_requests: state
                .requests
                .iter()
                .filter(|r| r.status == RequestStatus::Open)
                .count() as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(hospital_id: RecordId) -> NewRequestPayload {
        NewRequestPayload {
            hospital_id,
            blood_group: BloodGroup::ONegative,
            units: 2,
            urgency: Urgency::Medium,
            phone: None,
            patient_name: None,
            reason: None,
        }
    }

    #[tokio::test]
    async fn test_create_request_fills_hospital_fields() {
        let store = InMemoryStore::with_sample_data();

        let created = store.create_request(&payload(1)).await.unwrap();
        assert_eq!(created.id, 2);
        assert_eq!(created.status, RequestStatus::Open);
        assert_eq!(created.hospital_name.as_deref(), Some("Apollo Hospital"));
        assert_eq!(created.city.as_deref(), Some("Bangalore"));
    }

    #[tokio::test]
    async fn test_unknown_hospital_rejected() {
        let store = InMemoryStore::with_sample_data();
        let result = store.create_request(&payload(99)).await;
        assert!(matches!(result, Err(BloodBankError::RemoteFailure(_))));
    }

    #[tokio::test]
    async fn test_injected_failure_and_call_counting() {
        let store = InMemoryStore::with_sample_data();
        store.fail_on(StoreOperation::ToggleHospital).await;

        assert!(store.toggle_hospital(1).await.is_err());
        assert_eq!(store.calls(StoreOperation::ToggleHospital).await, 1);

        store.recover(StoreOperation::ToggleHospital).await;
        let hospital = store.toggle_hospital(1).await.unwrap();
        assert!(!hospital.verified);
        assert_eq!(store.total_calls().await, 2);
    }

    #[tokio::test]
    async fn test_profile_lists_recorded_donations() {
        let donor = Donor {
            id: 1,
            name: "Asha".to_string(),
            gender: "female".to_string(),
            email: "asha@example.org".to_string(),
            phone: "555-0101".to_string(),
            city: "Pune".to_string(),
            blood_group: BloodGroup::BPositive,
            available: true,
            verified: true,
            donation_count: 0,
            last_donation_date: None,
            unavailable_dates: Vec::new(),
        };
        let store = InMemoryStore::new().with_donors(vec![donor]);

        let empty = store.donor_profile("asha@example.org").await.unwrap();
        assert!(empty.donation_history.is_empty());

        let payload = DonationPayload {
            request_id: None,
            requestor_name: "Apollo Hospital".to_string(),
            requestor_email: "apollo@gmail.com".to_string(),
            units: 1,
        };
        store.record_donation(1, &payload).await.unwrap();
        store.record_donation(1, &payload).await.unwrap();

        let profile = store.donor_profile("asha@example.org").await.unwrap();
        assert_eq!(profile.donor.donation_count, 2);
        assert_eq!(profile.donation_history.len(), 2);
        assert_eq!(profile.donation_history[0].blood_group, BloodGroup::BPositive);

        let missing = store.donor_profile("nobody@example.org").await;
        assert!(matches!(missing, Err(BloodBankError::RemoteFailure(_))));
        assert_eq!(store.calls(StoreOperation::DonorProfile).await, 3);
    }

    #[tokio::test]
    async fn test_offline_store() {
        let store = InMemoryStore::with_sample_data();
        store.set_offline(true).await;
        assert!(store.list_inventory().await.is_err());

        store.set_offline(false).await;
        assert_eq!(store.list_inventory().await.unwrap().len(), 2);
    }
}
