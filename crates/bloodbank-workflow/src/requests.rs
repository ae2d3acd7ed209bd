//! 用血申请看板
//!
//! 提交、满足、取消用血申请，并按状态划分视图

use bloodbank_core::utils::non_blank;
use bloodbank_core::{
    BloodBankError, BloodGroup, BloodRequest, Hospital, NewRequestPayload, RecordId,
    RequestStatus, Result, Urgency,
};
use bloodbank_integration::RemoteStore;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use crate::mirror::Mirror;
use crate::state_machine::{RequestEvent, RequestStateMachine};

/// 申请表单
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestDraft {
    pub hospital_id: Option<RecordId>,
    pub blood_group: Option<BloodGroup>,
    pub units: i64,
    pub urgency: Option<Urgency>,
    pub phone: Option<String>,
    pub patient_name: Option<String>,
    pub reason: Option<String>,
}

impl Default for RequestDraft {
    fn default() -> Self {
        Self {
            hospital_id: None,
            blood_group: None,
            units: 1,
            urgency: None,
            phone: None,
            patient_name: None,
            reason: None,
        }
    }
}

impl RequestDraft {
    /// 校验并生成提交载荷，未设置紧急程度时取 Medium
    pub fn validate(&self) -> Result<NewRequestPayload> {
        let hospital_id = self
            .hospital_id
            .ok_or_else(|| BloodBankError::Validation("Hospital is required".to_string()))?;
        let blood_group = self
            .blood_group
            .ok_or_else(|| BloodBankError::Validation("Blood group is required".to_string()))?;
        if self.units < 1 {
            return Err(BloodBankError::Validation(format!(
                "Units must be at least 1, got {}",
                self.units
            )));
        }
        let units = u32::try_from(self.units)
            .map_err(|_| BloodBankError::Validation(format!("Units out of range: {}", self.units)))?;

        Ok(NewRequestPayload {
            hospital_id,
            blood_group,
            units,
            urgency: self.urgency.unwrap_or_default(),
            phone: non_blank(self.phone.clone()),
            patient_name: non_blank(self.patient_name.clone()),
            reason: non_blank(self.reason.clone()),
        })
    }
}

/// 申请视图（页签）
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum RequestView {
    All,
    Pending,
    Fulfilled,
    Cancelled,
}

impl RequestView {
    pub const ALL: [RequestView; 4] = [
        RequestView::All,
        RequestView::Pending,
        RequestView::Fulfilled,
        RequestView::Cancelled,
    ];

    pub fn matches(&self, request: &BloodRequest) -> bool {
        match self {
            RequestView::All => true,
            RequestView::Pending => request.status == RequestStatus::Open,
            RequestView::Fulfilled => request.status == RequestStatus::Fulfilled,
            RequestView::Cancelled => request.status == RequestStatus::Cancelled,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RequestView::All => "All",
            RequestView::Pending => "Pending",
            RequestView::Fulfilled => "Fulfilled",
            RequestView::Cancelled => "Cancelled",
        }
    }
}

/// 各页签计数
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct RequestViewCounts {
    pub all: usize,
    pub pending: usize,
    pub fulfilled: usize,
    pub cancelled: usize,
}

impl RequestViewCounts {
    pub fn from_requests(requests: &[BloodRequest]) -> Self {
        let count = |view: RequestView| requests.iter().filter(|r| view.matches(r)).count();
        Self {
            all: requests.len(),
            pending: count(RequestView::Pending),
            fulfilled: count(RequestView::Fulfilled),
            cancelled: count(RequestView::Cancelled),
        }
    }

    pub fn get(&self, view: RequestView) -> usize {
        match view {
            RequestView::All => self.all,
            RequestView::Pending => self.pending,
            RequestView::Fulfilled => self.fulfilled,
            RequestView::Cancelled => self.cancelled,
        }
    }
}

/// 用血申请看板
pub struct RequestBoard {
    store: Arc<dyn RemoteStore>,
    state_machine: RequestStateMachine,
    requests: Mirror<BloodRequest>,
}

impl RequestBoard {
    pub fn new(store: Arc<dyn RemoteStore>) -> Self {
        Self {
            store,
            state_machine: RequestStateMachine::new(),
            requests: Mirror::prepending(),
        }
    }

    /// 重新拉取全部申请
    pub async fn refresh(&mut self) -> Result<usize> {
        let requests = self.store.list_requests().await?;
        let count = requests.len();
        self.requests.replace_all(requests);
        info!("Loaded {} blood requests from {}", count, self.store.name());
        Ok(count)
    }

    /// 提交新申请
    ///
    /// 医院镜像已加载时，要求 `hospital_id` 指向其中的医院。
    pub async fn submit(&mut self, draft: &RequestDraft, hospitals: Option<&Mirror<Hospital>>) -> Result<BloodRequest> {
        let payload = draft.validate()?;

        if let Some(hospitals) = hospitals.filter(|h| h.is_loaded()) {
            if !hospitals.contains(payload.hospital_id) {
                return Err(BloodBankError::Validation(format!(
                    "Hospital {} not found",
                    payload.hospital_id
                )));
            }
        }

        let created = self.store.create_request(&payload).await?;
        self.requests.upsert_from_server(created.clone());

        info!(
            "Submitted request {} for {} x{} ({})",
            created.id, created.blood_group, created.units, created.urgency
        );
        Ok(created)
    }

    /// 标记为已满足
    pub async fn fulfill(&mut self, id: RecordId) -> Result<BloodRequest> {
        self.apply_event(id, RequestEvent::Fulfill).await
    }

    /// 取消申请
    pub async fn cancel(&mut self, id: RecordId) -> Result<BloodRequest> {
        self.apply_event(id, RequestEvent::Cancel).await
    }

    async fn apply_event(&mut self, id: RecordId, event: RequestEvent) -> Result<BloodRequest> {
        let current = self
            .requests
            .get(id)
            .ok_or_else(|| BloodBankError::NotFound(format!("Request {} not found", id)))?;

        // 本地先行校验，非法转换不写远程
        let next = match self.state_machine.transition(&current.status, &event) {
            Ok(next) => next,
            Err(e) => {
                warn!("Rejected {:?} on request {}: {}", event, id, e);
                return Err(e);
            }
        };

        let confirmed = self.store.update_request_status(id, next).await?;
        self.requests.upsert_from_server(confirmed.clone());

        info!("Request {} moved to {}", id, confirmed.status);
        Ok(confirmed)
    }

    /// 某视图下的申请，保持镜像顺序
    pub fn view(&self, view: RequestView) -> Vec<&BloodRequest> {
        self.requests.iter().filter(|r| view.matches(r)).collect()
    }

    pub fn counts(&self) -> RequestViewCounts {
        RequestViewCounts::from_requests(self.requests.items())
    }

    pub fn get(&self, id: RecordId) -> Option<&BloodRequest> {
        self.requests.get(id)
    }

    pub fn requests(&self) -> &Mirror<BloodRequest> {
        &self.requests
    }

    pub fn state_machine(&self) -> &RequestStateMachine {
        &self.state_machine
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bloodbank_integration::{InMemoryStore, StoreOperation};

    fn draft(hospital_id: RecordId, units: i64) -> RequestDraft {
        RequestDraft {
            hospital_id: Some(hospital_id),
            blood_group: Some(BloodGroup::ONegative),
            units,
            ..Default::default()
        }
    }

    #[test]
    fn test_draft_validation() {
        assert!(matches!(
            RequestDraft::default().validate(),
            Err(BloodBankError::Validation(_))
        ));
        assert!(draft(1, 0).validate().is_err());
        assert!(draft(1, -2).validate().is_err());

        let payload = draft(1, 2).validate().unwrap();
        assert_eq!(payload.urgency, Urgency::Medium);
        assert_eq!(payload.units, 2);
    }

    #[test]
    fn test_blank_optional_text_is_dropped() {
        let mut d = draft(1, 1);
        d.phone = Some("   ".to_string());
        d.reason = Some(" surgery ".to_string());
        let payload = d.validate().unwrap();
        assert!(payload.phone.is_none());
        assert_eq!(payload.reason.as_deref(), Some("surgery"));
    }

    #[test]
    fn test_view_counts() {
        let template = BloodRequest {
            id: 1,
            hospital_id: 1,
            hospital_name: None,
            city: None,
            blood_group: BloodGroup::APositive,
            units: 1,
            urgency: Urgency::Low,
            status: RequestStatus::Open,
            phone: None,
            patient_name: None,
            reason: None,
            created_at: None,
        };
        let requests = vec![
            template.clone(),
            BloodRequest { id: 2, status: RequestStatus::Fulfilled, ..template.clone() },
            BloodRequest { id: 3, status: RequestStatus::Open, ..template.clone() },
            BloodRequest { id: 4, status: RequestStatus::Cancelled, ..template },
        ];

        let counts = RequestViewCounts::from_requests(&requests);
        assert_eq!(counts.all, 4);
        assert_eq!(counts.get(RequestView::Pending), 2);
        assert_eq!(counts.fulfilled, 1);
        assert_eq!(counts.cancelled, 1);
    }

    #[tokio::test]
    async fn test_new_requests_surface_first() {
        let store = Arc::new(InMemoryStore::with_sample_data());
        let mut board = RequestBoard::new(store);
        board.refresh().await.unwrap();

        let created = board.submit(&draft(1, 2), None).await.unwrap();
        assert_eq!(board.requests().items()[0].id, created.id);
        assert_eq!(board.view(RequestView::Pending).len(), 2);
    }

    #[tokio::test]
    async fn test_unknown_hospital_rejected_before_store() {
        let store = Arc::new(InMemoryStore::with_sample_data());
        let mut board = RequestBoard::new(store.clone());

        let mut hospitals = Mirror::appending();
        hospitals.replace_all(store.list_hospitals().await.unwrap());

        let result = board.submit(&draft(42, 1), Some(&hospitals)).await;
        assert!(matches!(result, Err(BloodBankError::Validation(_))));
        assert_eq!(store.calls(StoreOperation::CreateRequest).await, 0);
    }

    #[tokio::test]
    async fn test_unknown_request_is_not_found() {
        let store = Arc::new(InMemoryStore::with_sample_data());
        let mut board = RequestBoard::new(store);
        board.refresh().await.unwrap();

        assert!(matches!(board.fulfill(99).await, Err(BloodBankError::NotFound(_))));
    }
}
