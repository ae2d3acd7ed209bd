//! 核心数据模型定义

use chrono::{NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::BloodBankError;

/// 远程存储分配的记录ID
pub type RecordId = u64;

/// 按ID识别的实体
pub trait Identified {
    fn id(&self) -> RecordId;
}

/// ABO/Rh 血型
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BloodGroup {
    #[serde(rename = "A+")]
    APositive,
    #[serde(rename = "A-")]
    ANegative,
    #[serde(rename = "B+")]
    BPositive,
    #[serde(rename = "B-")]
    BNegative,
    #[serde(rename = "AB+")]
    AbPositive,
    #[serde(rename = "AB-")]
    AbNegative,
    #[serde(rename = "O+")]
    OPositive,
    #[serde(rename = "O-")]
    ONegative,
}

impl BloodGroup {
    /// 全部8种标准血型，按界面展示顺序
    pub const ALL: [BloodGroup; 8] = [
        BloodGroup::APositive,
        BloodGroup::ANegative,
        BloodGroup::BPositive,
        BloodGroup::BNegative,
        BloodGroup::AbPositive,
        BloodGroup::AbNegative,
        BloodGroup::OPositive,
        BloodGroup::ONegative,
    ];

    /// 标准标签，如 "AB-"
    pub fn label(&self) -> &'static str {
        match self {
            BloodGroup::APositive => "A+",
            BloodGroup::ANegative => "A-",
            BloodGroup::BPositive => "B+",
            BloodGroup::BNegative => "B-",
            BloodGroup::AbPositive => "AB+",
            BloodGroup::AbNegative => "AB-",
            BloodGroup::OPositive => "O+",
            BloodGroup::ONegative => "O-",
        }
    }
}

impl fmt::Display for BloodGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for BloodGroup {
    type Err = BloodBankError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase();
        BloodGroup::ALL
            .iter()
            .copied()
            .find(|group| group.label() == normalized)
            .ok_or_else(|| {
                BloodBankError::Validation(format!(
                    "Invalid blood group '{}'; expected one of A+, A-, B+, B-, AB+, AB-, O+, O-",
                    s
                ))
            })
    }
}

/// 申请方声明的紧急程度
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Urgency {
    #[serde(alias = "Low")]
    Low,
    #[default]
    #[serde(alias = "Medium")]
    Medium,
    #[serde(alias = "High")]
    High,
    #[serde(alias = "Critical")]
    Critical,
}

impl fmt::Display for Urgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Urgency::Low => "LOW",
            Urgency::Medium => "MEDIUM",
            Urgency::High => "HIGH",
            Urgency::Critical => "CRITICAL",
        };
        f.write_str(label)
    }
}

impl FromStr for Urgency {
    type Err = BloodBankError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "LOW" => Ok(Urgency::Low),
            "MEDIUM" => Ok(Urgency::Medium),
            "HIGH" => Ok(Urgency::High),
            "CRITICAL" => Ok(Urgency::Critical),
            other => Err(BloodBankError::Validation(format!("Invalid urgency '{}'", other))),
        }
    }
}

/// 用血申请状态
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum RequestStatus {
    Open,      // 待处理
    Fulfilled, // 已满足
    Cancelled, // 已取消
}

impl RequestStatus {
    /// 终态不允许任何后续转换
    pub fn is_terminal(&self) -> bool {
        matches!(self, RequestStatus::Fulfilled | RequestStatus::Cancelled)
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RequestStatus::Open => "OPEN",
            RequestStatus::Fulfilled => "FULFILLED",
            RequestStatus::Cancelled => "CANCELLED",
        };
        f.write_str(label)
    }
}

/// 用血申请
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BloodRequest {
    pub id: RecordId,
    pub hospital_id: RecordId,
    #[serde(rename = "hospital", default)]
    pub hospital_name: Option<String>, // 服务端冗余的医院名称
    #[serde(default)]
    pub city: Option<String>,
    pub blood_group: BloodGroup,
    pub units: u32,
    #[serde(default)]
    pub urgency: Urgency,
    pub status: RequestStatus,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub patient_name: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,
}

impl Identified for BloodRequest {
    fn id(&self) -> RecordId {
        self.id
    }
}

/// 库存记录
///
/// 严重程度不存储，每次读取时根据 `units` 重新计算。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InventoryRecord {
    pub id: RecordId,
    pub hospital_id: RecordId,
    #[serde(default)]
    pub hospital_name: Option<String>,
    pub blood_group: BloodGroup,
    pub units: u32,
    pub expiry: NaiveDate,
    #[serde(default)]
    pub updated_at: Option<NaiveDateTime>,
}

impl Identified for InventoryRecord {
    fn id(&self) -> RecordId {
        self.id
    }
}

/// 医院
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Hospital {
    pub id: RecordId,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub city: String,
    pub license: String, // 执业许可证号
    #[serde(default)]
    pub verified: bool,
}

impl Identified for Hospital {
    fn id(&self) -> RecordId {
        self.id
    }
}

/// 献血者不可献血日期
///
/// 条目ID沿用服务端的毫秒时间戳整数。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UnavailableDate {
    pub id: u64,
    pub date: NaiveDate,
    pub reason: String,
}

impl UnavailableDate {
    /// 以当前毫秒时间戳为ID，与已有条目冲突时顺延
    pub fn new(date: NaiveDate, reason: String, existing: &[UnavailableDate]) -> Self {
        let now = u64::try_from(Utc::now().timestamp_millis()).unwrap_or(0);
        let next = existing
            .iter()
            .map(|entry| entry.id.saturating_add(1))
            .max()
            .unwrap_or(0);

        Self {
            id: now.max(next),
            date,
            reason,
        }
    }
}

/// 献血者
///
/// `available` 只能通过显式切换改变，与 `unavailable_dates` 相互独立。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Donor {
    pub id: RecordId,
    pub name: String,
    #[serde(default)]
    pub gender: String,
    #[serde(default)]
    pub email: String,
    pub phone: String,
    pub city: String,
    pub blood_group: BloodGroup,
    #[serde(default)]
    pub available: bool,
    #[serde(default)]
    pub verified: bool,
    #[serde(default)]
    pub donation_count: u32,
    #[serde(default)]
    pub last_donation_date: Option<NaiveDateTime>,
    #[serde(default)]
    pub unavailable_dates: Vec<UnavailableDate>,
}

impl Identified for Donor {
    fn id(&self) -> RecordId {
        self.id
    }
}

/// 单次献血记录
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DonationRecord {
    pub blood_group: BloodGroup,
    pub units: u32,
    pub date_time: NaiveDateTime,
    #[serde(default)]
    pub requestor_name: String,
    #[serde(default)]
    pub requestor_email: String,
}

/// 服务端预计算的看板统计
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_donors: u64,
    pub available_donors: u64,
    pub active_requests: u64,
}

/// 登录角色
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Donor,
    Hospital,
    Admin,
}

/// 会话上下文
///
/// 显式传入各组件，替代浏览器本地存储中的全局标记。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct SessionContext {
    pub role: Role,
    pub email: Option<String>,
    pub donor_registered: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blood_group_labels() {
        for group in BloodGroup::ALL {
            assert_eq!(group.label().parse::<BloodGroup>().unwrap(), group);
        }
        assert_eq!(" ab- ".parse::<BloodGroup>().unwrap(), BloodGroup::AbNegative);
        assert!("C+".parse::<BloodGroup>().is_err());
    }

    #[test]
    fn test_wire_enums_are_uppercase() {
        assert_eq!(serde_json::to_string(&RequestStatus::Cancelled).unwrap(), "\"CANCELLED\"");
        assert_eq!(serde_json::to_string(&Urgency::High).unwrap(), "\"HIGH\"");
        assert_eq!(serde_json::to_string(&BloodGroup::ONegative).unwrap(), "\"O-\"");

        let urgency: Urgency = serde_json::from_str("\"Medium\"").unwrap();
        assert_eq!(urgency, Urgency::Medium);
    }

    #[test]
    fn test_request_from_server_json() {
        let json = r#"{
            "id": 1,
            "hospitalId": 1,
            "hospital": "Metro Blood Bank",
            "phone": "+1 555 200 3000",
            "city": "Los Angeles",
            "bloodGroup": "A-",
            "units": 1,
            "urgency": "LOW",
            "status": "OPEN",
            "createdAt": "2025-01-24T12:33:00",
            "matchedDonorsCount": 0
        }"#;

        let request: BloodRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.hospital_name.as_deref(), Some("Metro Blood Bank"));
        assert_eq!(request.blood_group, BloodGroup::ANegative);
        assert_eq!(request.urgency, Urgency::Low);
        assert_eq!(request.status, RequestStatus::Open);
        assert!(request.patient_name.is_none());
    }

    #[test]
    fn test_donor_with_timestamp_entry_ids() {
        let json = r#"{
            "id": 4,
            "name": "Asha",
            "gender": "female",
            "email": "asha@example.org",
            "phone": "555-0101",
            "city": "Pune",
            "bloodGroup": "O+",
            "available": true,
            "unavailableDates": [
                {"date": "2025-02-14", "reason": "travel", "id": 1737722000000}
            ]
        }"#;

        let donor: Donor = serde_json::from_str(json).unwrap();
        assert_eq!(donor.unavailable_dates.len(), 1);
        assert_eq!(donor.unavailable_dates[0].id, 1737722000000);
        assert_eq!(donor.unavailable_dates[0].reason, "travel");
    }

    #[test]
    fn test_new_entry_id_never_collides() {
        let date = NaiveDate::from_ymd_opt(2025, 2, 14).unwrap();
        let future = UnavailableDate {
            id: u64::MAX - 1,
            date,
            reason: "surgery".to_string(),
        };

        let entry = UnavailableDate::new(date, "travel".to_string(), std::slice::from_ref(&future));
        assert_eq!(entry.id, u64::MAX);

        let fresh = UnavailableDate::new(date, "travel".to_string(), &[]);
        assert!(fresh.id > 1_700_000_000_000);
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(!RequestStatus::Open.is_terminal());
        assert!(RequestStatus::Fulfilled.is_terminal());
        assert!(RequestStatus::Cancelled.is_terminal());
    }
}
