//! Service layer for business logic
//!
//! 领域逻辑所在：地理位置查询（provider 抽象与回退链）
//! 和访问网关（按请求编排访问控制与响应整形）。

mod gateway;
pub mod geo;

pub use gateway::{Gateway, LookupRequest, LookupResponse};
