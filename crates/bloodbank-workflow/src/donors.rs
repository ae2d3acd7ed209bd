//! 献血者登记
//!
//! 注册、可用状态切换、不可献血日期维护与献血记录。
//! 可用标志与不可献血日期相互独立，不由一方推导另一方。

use bloodbank_core::utils::{is_blank, non_blank};
use bloodbank_core::{
    BloodBankError, BloodGroup, DonationPayload, DonationRecord, Donor, DonorProfile, DonorRegistration,
    RecordId, Result, Role, SessionContext, UnavailableDate,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

use bloodbank_integration::RemoteStore;

use crate::aggregation::DonorSummary;
use crate::filter::{Query, TextField};
use crate::mirror::Mirror;

const SEARCH_FIELDS: [TextField<Donor>; 3] = [donor_name, donor_email, donor_city];

fn donor_name(donor: &Donor) -> &str {
    &donor.name
}

fn donor_email(donor: &Donor) -> &str {
    &donor.email
}

fn donor_city(donor: &Donor) -> &str {
    &donor.city
}

fn donor_available(donor: &Donor) -> bool {
    donor.available
}

/// 献血者注册表单
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DonorDraft {
    pub name: String,
    pub gender: String,
    pub blood_group: Option<BloodGroup>,
    pub phone: String,
    pub city: String,
    /// 为空时取会话邮箱
    pub email: Option<String>,
}

impl DonorDraft {
    pub fn validate(&self, session: &SessionContext) -> Result<DonorRegistration> {
        let required = [
            ("name", &self.name),
            ("gender", &self.gender),
            ("phone", &self.phone),
            ("city", &self.city),
        ];
        if let Some((field, _)) = required.iter().find(|(_, value)| is_blank(value)) {
            return Err(BloodBankError::Validation(format!("Donor {} is required", field)));
        }
        let blood_group = self
            .blood_group
            .ok_or_else(|| BloodBankError::Validation("Blood group is required".to_string()))?;

        let email = non_blank(self.email.clone())
            .or_else(|| non_blank(session.email.clone()))
            .unwrap_or_default();

        Ok(DonorRegistration {
            name: self.name.trim().to_string(),
            gender: self.gender.trim().to_string(),
            blood_group,
            phone: self.phone.trim().to_string(),
            city: self.city.trim().to_string(),
            email,
        })
    }
}

/// 献血者过滤条件
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DonorFilter {
    /// 按姓名、邮箱或城市搜索
    pub query: String,
    pub blood_group: Option<BloodGroup>,
    pub city: Option<String>,
    pub available: Option<bool>,
}

/// 献血者登记簿
pub struct DonorRegistry {
    store: Arc<dyn RemoteStore>,
    donors: Mirror<Donor>,
}

impl DonorRegistry {
    pub fn new(store: Arc<dyn RemoteStore>) -> Self {
        Self {
            store,
            donors: Mirror::appending(),
        }
    }

    pub async fn refresh(&mut self) -> Result<usize> {
        let donors = self.store.list_donors().await?;
        let count = donors.len();
        self.donors.replace_all(donors);
        info!("Loaded {} donors from {}", count, self.store.name());
        Ok(count)
    }

    /// 注册献血者，成功后在会话中记下已注册
    pub async fn register(&mut self, session: &mut SessionContext, draft: &DonorDraft) -> Result<Donor> {
        if session.role != Role::Donor {
            return Err(BloodBankError::Validation(format!(
                "Only donor sessions can register, current role is {:?}",
                session.role
            )));
        }
        if session.donor_registered {
            warn!("Donor registration refused: session already registered");
            return Err(BloodBankError::Validation("Donor already registered".to_string()));
        }

        let payload = draft.validate(session)?;
        let donor = self.store.register_donor(&payload).await?;
        self.donors.upsert_from_server(donor.clone());
        session.donor_registered = true;

        info!("Registered donor {} ({})", donor.id, donor.blood_group);
        Ok(donor)
    }

    /// 切换可用状态；献血者不在镜像中时为空操作
    pub async fn toggle_availability(&mut self, id: RecordId) -> Result<Option<Donor>> {
        let store = Arc::clone(&self.store);
        let toggled = self
            .donors
            .toggle_boolean_field(id, donor_available, |id, _desired| async move {
                store.toggle_donor(id).await
            })
            .await?;

        if let Some(donor) = &toggled {
            info!("Donor {} available = {}", donor.id, donor.available);
        }
        Ok(toggled)
    }

    /// 添加不可献血日期
    pub async fn add_unavailable_date(&mut self, id: RecordId, date: NaiveDate, reason: &str) -> Result<Donor> {
        if is_blank(reason) {
            return Err(BloodBankError::Validation("Reason is required".to_string()));
        }
        let donor = self
            .donors
            .get(id)
            .ok_or_else(|| BloodBankError::NotFound(format!("Donor {} not found", id)))?;

        let mut dates = donor.unavailable_dates.clone();
        let entry = UnavailableDate::new(date, reason.trim().to_string(), &dates);
        dates.push(entry);

        let confirmed = self.store.update_unavailable_dates(id, &dates).await?;
        self.donors.upsert_from_server(confirmed.clone());
        info!("Donor {} marked unavailable on {}", id, date);
        Ok(confirmed)
    }

    /// 删除不可献血日期；献血者或条目不存在时为空操作
    pub async fn remove_unavailable_date(&mut self, id: RecordId, entry: u64) -> Result<Option<Donor>> {
        let Some(donor) = self.donors.get(id) else {
            debug!("Remove skipped: donor {} not in mirror", id);
            return Ok(None);
        };
        if !donor.unavailable_dates.iter().any(|d| d.id == entry) {
            debug!("Remove skipped: donor {} has no entry {}", id, entry);
            return Ok(None);
        }

        let dates: Vec<UnavailableDate> = donor
            .unavailable_dates
            .iter()
            .filter(|d| d.id != entry)
            .cloned()
            .collect();

        let confirmed = self.store.update_unavailable_dates(id, &dates).await?;
        self.donors.upsert_from_server(confirmed.clone());
        Ok(Some(confirmed))
    }

    /// 记录一次献血
    pub async fn record_donation(&mut self, id: RecordId, payload: &DonationPayload) -> Result<DonationRecord> {
        if payload.units < 1 {
            return Err(BloodBankError::Validation("Units must be at least 1".to_string()));
        }
        if !self.donors.contains(id) {
            return Err(BloodBankError::NotFound(format!("Donor {} not found", id)));
        }

        let receipt = self.store.record_donation(id, payload).await?;
        self.donors.upsert_from_server(receipt.donor);
        info!("Recorded donation of {} units by donor {}", receipt.donation.units, id);
        Ok(receipt.donation)
    }

    /// 按邮箱拉取献血者档案，档案中的献血者记录并入镜像
    pub async fn profile(&mut self, email: &str) -> Result<DonorProfile> {
        if is_blank(email) {
            return Err(BloodBankError::Validation("Donor email is required".to_string()));
        }

        let profile = self.store.donor_profile(email.trim()).await?;
        self.donors.upsert_from_server(profile.donor.clone());
        debug!(
            "Donor {} profile carries {} donations",
            profile.donor.id,
            profile.donation_history.len()
        );
        Ok(profile)
    }

    pub fn search(&self, filter: &DonorFilter) -> Vec<&Donor> {
        Query::new()
            .search(&filter.query, &SEARCH_FIELDS)
            .exact(|donor: &Donor| donor.blood_group, filter.blood_group)
            .exact_text(donor_city, filter.city.as_deref())
            .exact(donor_available, filter.available)
            .apply(self.donors.items())
    }

    pub fn summary(&self) -> DonorSummary {
        DonorSummary::from_donors(self.donors.items())
    }

    pub fn donors(&self) -> &Mirror<Donor> {
        &self.donors
    }
}
