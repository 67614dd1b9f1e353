//! # Infrastructure Common
//!
//! 这个 crate 提供了 Lorn 注入器各层共享的基础定义。
//!
//! ## 核心内容
//!
//! - [`DependencyError`] - 注入器错误分类
//! - [`InjectorOptions`] - 注入器选项（TOML / JSON / 环境变量）
//! - [`provider_token`] - 令牌命名约定
//!
//! ## 设计原则
//!
//! - 错误使用强类型枚举，便于调用方按种类匹配
//! - 约定优于配置

pub mod configuration;
pub mod conventions;
pub mod errors;

pub use configuration::*;
pub use conventions::*;
pub use errors::*;
