//! # 血库远程存储集成模块
//!
//! 远程存储是所有实体的唯一事实来源，本模块提供：
//! - `RemoteStore` 接口：看板消费的全部远程操作
//! - `HttpStore`：基于 REST 的实现
//! - `InMemoryStore`：与服务端语义一致的内存实现，供演示与测试使用

pub mod http;
pub mod memory;
pub mod store;

pub use http::{AuthenticationConfig, HttpStore, StoreConfig};
pub use memory::{InMemoryStore, StoreOperation};
pub use store::RemoteStore;
