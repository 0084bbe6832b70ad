//! HTTP API 层
//!
//! 路由 handler 与中间件。handler 不做策略决策，
//! 只负责参数提取、调用 Gateway/Store 以及错误 → 状态码映射。

pub mod middleware;
pub mod services;
