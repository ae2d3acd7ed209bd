//! 医院目录

use bloodbank_core::utils::is_blank;
use bloodbank_core::{
    BloodBankError, BloodRequest, Hospital, HospitalPayload, InventoryRecord, RecordId, Result,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

use bloodbank_integration::RemoteStore;

use crate::filter::{Query, TextField};
use crate::mirror::Mirror;

const SEARCH_FIELDS: [TextField<Hospital>; 2] = [hospital_name, hospital_city];

fn hospital_name(hospital: &Hospital) -> &str {
    &hospital.name
}

fn hospital_city(hospital: &Hospital) -> &str {
    &hospital.city
}

fn hospital_verified(hospital: &Hospital) -> bool {
    hospital.verified
}

/// 医院表单，全部字段必填
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HospitalDraft {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub city: String,
    pub license: String,
}

impl HospitalDraft {
    pub fn from_hospital(hospital: &Hospital) -> Self {
        Self {
            name: hospital.name.clone(),
            email: hospital.email.clone(),
            phone: hospital.phone.clone(),
            city: hospital.city.clone(),
            license: hospital.license.clone(),
        }
    }

    pub fn validate(&self) -> Result<HospitalPayload> {
        let fields = [
            ("name", &self.name),
            ("email", &self.email),
            ("phone", &self.phone),
            ("city", &self.city),
            ("license", &self.license),
        ];
        if let Some((field, _)) = fields.iter().find(|(_, value)| is_blank(value)) {
            return Err(BloodBankError::Validation(format!("Hospital {} is required", field)));
        }

        Ok(HospitalPayload {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            phone: self.phone.trim().to_string(),
            city: self.city.trim().to_string(),
            license: self.license.trim().to_string(),
        })
    }
}

/// 医院过滤条件
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HospitalFilter {
    /// 按名称或城市搜索
    pub query: String,
    pub verified: Option<bool>,
}

/// 医院目录
pub struct HospitalDirectory {
    store: Arc<dyn RemoteStore>,
    hospitals: Mirror<Hospital>,
}

impl HospitalDirectory {
    pub fn new(store: Arc<dyn RemoteStore>) -> Self {
        Self {
            store,
            hospitals: Mirror::appending(),
        }
    }

    pub async fn refresh(&mut self) -> Result<usize> {
        let hospitals = self.store.list_hospitals().await?;
        let count = hospitals.len();
        self.hospitals.replace_all(hospitals);
        info!("Loaded {} hospitals from {}", count, self.store.name());
        Ok(count)
    }

    pub async fn create(&mut self, draft: &HospitalDraft) -> Result<Hospital> {
        let payload = draft.validate()?;
        let created = self.store.create_hospital(&payload).await?;
        self.hospitals.upsert_from_server(created.clone());
        info!("Registered hospital {} ({})", created.id, created.name);
        Ok(created)
    }

    pub async fn update(&mut self, id: RecordId, draft: &HospitalDraft) -> Result<Hospital> {
        let payload = draft.validate()?;
        let updated = self.store.update_hospital(id, &payload).await?;
        self.hospitals.upsert_from_server(updated.clone());
        info!("Updated hospital {}", id);
        Ok(updated)
    }

    /// 切换认证状态；医院不在镜像中时为空操作
    pub async fn toggle_verified(&mut self, id: RecordId) -> Result<Option<Hospital>> {
        let store = Arc::clone(&self.store);
        let toggled = self
            .hospitals
            .toggle_boolean_field(id, hospital_verified, |id, _desired| async move {
                store.toggle_hospital(id).await
            })
            .await?;

        if let Some(hospital) = &toggled {
            info!("Hospital {} verified = {}", hospital.id, hospital.verified);
        }
        Ok(toggled)
    }

    /// 删除医院
    ///
    /// 仍被库存或申请引用时拒绝；不在镜像中时返回 `Ok(false)`。
    pub async fn delete(
        &mut self,
        id: RecordId,
        inventory: &Mirror<InventoryRecord>,
        requests: &Mirror<BloodRequest>,
    ) -> Result<bool> {
        if !self.hospitals.contains(id) {
            debug!("Delete skipped: hospital {} not in mirror", id);
            return Ok(false);
        }

        let stock = inventory.iter().filter(|r| r.hospital_id == id).count();
        let open = requests.iter().filter(|r| r.hospital_id == id).count();
        if stock > 0 || open > 0 {
            warn!(
                "Refusing to delete hospital {}: referenced by {} inventory and {} request records",
                id, stock, open
            );
            return Err(BloodBankError::Validation(format!(
                "Hospital {} is still referenced by {} inventory and {} request records",
                id, stock, open
            )));
        }

        self.store.delete_hospital(id).await?;
        self.hospitals.remove_by_id(id);
        info!("Deleted hospital {}", id);
        Ok(true)
    }

    pub fn search(&self, filter: &HospitalFilter) -> Vec<&Hospital> {
        Query::new()
            .search(&filter.query, &SEARCH_FIELDS)
            .exact(hospital_verified, filter.verified)
            .apply(self.hospitals.items())
    }

    pub fn hospitals(&self) -> &Mirror<Hospital> {
        &self.hospitals
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bloodbank_integration::{InMemoryStore, StoreOperation};

    fn draft(name: &str, city: &str) -> HospitalDraft {
        HospitalDraft {
            name: name.to_string(),
            email: "desk@example.org".to_string(),
            phone: "555-0100".to_string(),
            city: city.to_string(),
            license: "LIC-900".to_string(),
        }
    }

    #[test]
    fn test_blank_field_rejected() {
        let mut d = draft("Metro Blood Bank", "Lansing");
        d.license = "  ".to_string();
        assert!(matches!(d.validate(), Err(BloodBankError::Validation(_))));
    }

    #[tokio::test]
    async fn test_toggle_and_filter_by_verified() {
        let store = Arc::new(InMemoryStore::with_sample_data());
        let mut directory = HospitalDirectory::new(store);
        directory.refresh().await.unwrap();

        let toggled = directory.toggle_verified(2).await.unwrap().unwrap();
        assert!(toggled.verified);

        let verified = directory.search(&HospitalFilter {
            query: String::new(),
            verified: Some(true),
        });
        assert_eq!(verified.len(), 2);
    }

    #[tokio::test]
    async fn test_toggle_unknown_is_noop() {
        let store = Arc::new(InMemoryStore::with_sample_data());
        let mut directory = HospitalDirectory::new(store.clone());
        directory.refresh().await.unwrap();

        assert!(directory.toggle_verified(77).await.unwrap().is_none());
        assert_eq!(store.calls(StoreOperation::ToggleHospital).await, 0);
    }

    #[tokio::test]
    async fn test_delete_refused_while_referenced() {
        let store = Arc::new(InMemoryStore::with_sample_data());
        let mut directory = HospitalDirectory::new(store.clone());
        directory.refresh().await.unwrap();

        let mut inventory = Mirror::appending();
        inventory.replace_all(store.list_inventory().await.unwrap());
        let mut requests = Mirror::prepending();
        requests.replace_all(store.list_requests().await.unwrap());

        let result = directory.delete(1, &inventory, &requests).await;
        assert!(matches!(result, Err(BloodBankError::Validation(_))));
        assert_eq!(store.calls(StoreOperation::DeleteHospital).await, 0);

        let created = directory.create(&draft("Metro Blood Bank", "Lansing")).await.unwrap();
        assert!(directory.delete(created.id, &inventory, &requests).await.unwrap());
        assert!(!directory.hospitals().contains(created.id));
        assert!(!directory.delete(created.id, &inventory, &requests).await.unwrap());
    }

    #[tokio::test]
    async fn test_update_replaces_in_place() {
        let store = Arc::new(InMemoryStore::with_sample_data());
        let mut directory = HospitalDirectory::new(store);
        directory.refresh().await.unwrap();

        let mut edit = HospitalDraft::from_hospital(&directory.hospitals().items()[0]);
        edit.city = "Mysore".to_string();
        directory.update(1, &edit).await.unwrap();

        assert_eq!(directory.hospitals().items()[0].city, "Mysore");
        assert_eq!(directory.search(&HospitalFilter { query: "mys".to_string(), verified: None }).len(), 1);
    }
}
