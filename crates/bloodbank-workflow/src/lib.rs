//! # 血库工作流模块
//!
//! 提供用血申请生命周期与库存状态引擎，包括：
//! - 严重程度分级：根据库存单位数判定 Critical/Low/Sufficient
//! - 申请状态机：OPEN → FULFILLED / CANCELLED，终态不可再转换
//! - 聚合统计：总单位数、按血型汇总、覆盖医院数
//! - 集合镜像：按ID与远程存储对账的本地副本
//! - 过滤查询：文本搜索与精确字段过滤的组合
//! - 各视图组件与协调它们的看板引擎

pub mod aggregation;
pub mod badge;
pub mod donors;
pub mod engine;
pub mod filter;
pub mod hospitals;
pub mod inventory;
pub mod mirror;
pub mod requests;
pub mod severity;
pub mod state_machine;

// 重新导出主要类型
pub use aggregation::{derive_dashboard_stats, DonorSummary, InventorySummary};
pub use badge::{Badge, BadgeKind, Tone};
pub use donors::{DonorDraft, DonorFilter, DonorRegistry};
pub use engine::{DashboardEngine, DashboardOverview, StatsSource};
pub use filter::{filter_by_exact_field, search, Query, TextField};
pub use hospitals::{HospitalDirectory, HospitalDraft, HospitalFilter};
pub use inventory::{InventoryBoard, InventoryDraft, InventoryRow};
pub use mirror::{InsertPosition, Mirror, UpsertOutcome};
pub use requests::{RequestBoard, RequestDraft, RequestView, RequestViewCounts};
pub use severity::{classify, StockSeverity};
pub use state_machine::{RequestEvent, RequestStateMachine};
