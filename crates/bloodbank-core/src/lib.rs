//! # BloodBank Core
//!
//! 血库协调系统的核心模块，提供领域模型、接口载荷、错误定义和通用工具。

pub mod error;
pub mod models;
pub mod payloads;
pub mod utils;

pub use error::{BloodBankError, Result};
pub use models::*;
pub use payloads::*;
