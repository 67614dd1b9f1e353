//! # Dependency Injection Abstractions
//!
//! 依赖注入抽象层，定义注入值、可调用单元、提供者与模块的核心类型。
//!
//! ## 核心接口
//!
//! - [`Value`] - 注入器中流动的统一值
//! - [`Unit`] - 可调用/可构造单元及其依赖声明
//! - [`annotate`] - 依赖令牌解析
//! - [`Provider`] / [`ProviderHandle`] - 配置期提供者
//! - [`Module`] / [`ModuleRegistry`] - 模块描述与查找
//! - [`Resolver`] - 注入器解析接口

pub mod annotate;
pub mod module;
pub mod provider;
pub mod registry;
pub mod resolver;
pub mod unit;
pub mod value;

pub use annotate::*;
pub use module::*;
pub use provider::*;
pub use registry::*;
pub use resolver::*;
pub use unit::*;
pub use value::*;

pub use infrastructure_common::{DependencyError, DependencyResult};
