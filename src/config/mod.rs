//! 配置管理模块
//!
//! 所有配置在启动时从 TOML + 环境变量加载为 [`StaticConfig`]，
//! 之后以注入方式传给各组件，不做全局可变状态。

mod structs;

pub use structs::*;
