//! 用血申请状态机
//!
//! 管理用血申请的生命周期状态转换

use bloodbank_core::{BloodBankError, BloodRequest, RequestStatus, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 申请状态转换事件
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum RequestEvent {
    Fulfill,
    Cancel,
}

/// 用血申请状态机
#[derive(Debug)]
pub struct RequestStateMachine {
    transitions: HashMap<(RequestStatus, RequestEvent), RequestStatus>,
}

impl RequestStateMachine {
    /// 创建新的状态机实例
    pub fn new() -> Self {
        let mut transitions = HashMap::new();

        // 只有 OPEN 可以离开，FULFILLED 与 CANCELLED 为终态
        transitions.insert((RequestStatus::Open, RequestEvent::Fulfill), RequestStatus::Fulfilled);
        transitions.insert((RequestStatus::Open, RequestEvent::Cancel), RequestStatus::Cancelled);

        Self { transitions }
    }

    /// 检查状态转换是否有效
    pub fn can_transition(&self, from: &RequestStatus, event: &RequestEvent) -> bool {
        self.transitions.contains_key(&(*from, *event))
    }

    /// 执行状态转换
    pub fn transition(&self, from: &RequestStatus, event: &RequestEvent) -> Result<RequestStatus> {
        match self.transitions.get(&(*from, *event)) {
            Some(to) => Ok(*to),
            None => Err(BloodBankError::InvalidStateTransition {
                from: from.to_string(),
                event: format!("{:?}", event),
            }),
        }
    }

    /// 对申请应用事件，返回转换后的副本；失败时原记录不受影响
    pub fn apply(&self, request: &BloodRequest, event: RequestEvent) -> Result<BloodRequest> {
        let status = self.transition(&request.status, &event)?;
        Ok(BloodRequest {
            status,
            ..request.clone()
        })
    }

    /// 获取所有可能的状态
    pub fn get_all_states() -> Vec<RequestStatus> {
        vec![
            RequestStatus::Open,
            RequestStatus::Fulfilled,
            RequestStatus::Cancelled,
        ]
    }

    /// 获取状态的所有可能事件
    pub fn get_possible_events(&self, current_state: &RequestStatus) -> Vec<RequestEvent> {
        self.transitions
            .keys()
            .filter(|(state, _)| state == current_state)
            .map(|(_, event)| *event)
            .collect()
    }
}

impl Default for RequestStateMachine {
    fn default() -> Self {
        Self::new()
    }
}
