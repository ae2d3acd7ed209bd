//! 徽章查找表
//!
//! 严重程度、申请状态与紧急程度统一映射到展示元数据。

use bloodbank_core::{RequestStatus, Urgency};
use serde::Serialize;

use crate::severity::StockSeverity;

/// 色调
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub enum Tone {
    Danger,
    Warning,
    Success,
    Info,
    Neutral,
}

/// 徽章展示元数据
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct Badge {
    pub label: &'static str,
    pub tone: Tone,
}

/// 可展示为徽章的标签种类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BadgeKind {
    Severity(StockSeverity),
    Status(RequestStatus),
    Urgency(Urgency),
}

const fn badge(label: &'static str, tone: Tone) -> Badge {
    Badge { label, tone }
}

impl BadgeKind {
    pub fn badge(&self) -> Badge {
        match self {
            BadgeKind::Severity(StockSeverity::Critical) => badge("Critical", Tone::Danger),
            BadgeKind::Severity(StockSeverity::Low) => badge("Low", Tone::Warning),
            BadgeKind::Severity(StockSeverity::Sufficient) => badge("Sufficient", Tone::Success),

            BadgeKind::Status(RequestStatus::Open) => badge("Pending", Tone::Info),
            BadgeKind::Status(RequestStatus::Fulfilled) => badge("Fulfilled", Tone::Success),
            BadgeKind::Status(RequestStatus::Cancelled) => badge("Cancelled", Tone::Neutral),

            BadgeKind::Urgency(Urgency::Low) => badge("Low", Tone::Success),
            BadgeKind::Urgency(Urgency::Medium) => badge("Medium", Tone::Info),
            BadgeKind::Urgency(Urgency::High) => badge("High", Tone::Warning),
            BadgeKind::Urgency(Urgency::Critical) => badge("Critical", Tone::Danger),
        }
    }
}

impl From<StockSeverity> for BadgeKind {
    fn from(severity: StockSeverity) -> Self {
        BadgeKind::Severity(severity)
    }
}

impl From<RequestStatus> for BadgeKind {
    fn from(status: RequestStatus) -> Self {
        BadgeKind::Status(status)
    }
}

impl From<Urgency> for BadgeKind {
    fn from(urgency: Urgency) -> Self {
        BadgeKind::Urgency(urgency)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_labels_match_request_tabs() {
        assert_eq!(BadgeKind::from(RequestStatus::Open).badge().label, "Pending");
        assert_eq!(BadgeKind::from(RequestStatus::Cancelled).badge().tone, Tone::Neutral);
    }

    #[test]
    fn test_critical_variants_share_danger_tone() {
        assert_eq!(BadgeKind::from(StockSeverity::Critical).badge().tone, Tone::Danger);
        assert_eq!(BadgeKind::from(Urgency::Critical).badge().tone, Tone::Danger);
    }
}
