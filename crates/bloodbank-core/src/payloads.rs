//! 远程存储接口请求载荷
//!
//! 字段命名与服务端保持一致（camelCase），状态与紧急程度为大写枚举字符串。

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::{BloodGroup, Donor, DonationRecord, RecordId, RequestStatus, UnavailableDate, Urgency};

/// 新建用血申请
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewRequestPayload {
    pub hospital_id: RecordId,
    pub blood_group: BloodGroup,
    pub units: u32,
    pub urgency: Urgency,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patient_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// 申请状态更新
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct StatusUpdate {
    pub status: RequestStatus,
}

/// 库存新增/编辑
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InventoryPayload {
    pub hospital_id: RecordId,
    pub hospital_name: String,
    pub blood_group: BloodGroup,
    pub units: u32,
    pub expiry: NaiveDate,
}

/// 医院新增/编辑
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HospitalPayload {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub city: String,
    pub license: String,
}

/// 献血者登记
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DonorRegistration {
    pub name: String,
    pub gender: String,
    pub blood_group: BloodGroup,
    pub phone: String,
    pub city: String,
    #[serde(default)]
    pub email: String,
}

/// 不可献血日期整表替换
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UnavailableDatesPayload {
    pub unavailable_dates: Vec<UnavailableDate>,
}

/// 记录一次献血
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DonationPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<RecordId>,
    pub requestor_name: String,
    pub requestor_email: String,
    pub units: u32,
}

/// 记录献血后的服务端回执
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DonationReceipt {
    pub donor: Donor,
    pub donation: DonationRecord,
}

/// 献血者档案，附带献血历史
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DonorProfile {
    #[serde(flatten)]
    pub donor: Donor,
    #[serde(default)]
    pub donation_history: Vec<DonationRecord>,
}
