//! # 注入器组合层
//!
//! 负责把模块列表、注入器选项（文件与环境变量）和日志配置组合起来，
//! 创建可直接使用的注入器。
//!
//! ## 基本使用
//!
//! ```rust,no_run
//! use infrastructure_composition::{InjectorBuilder, LoggingConfig};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let injector = InjectorBuilder::new()
//!         .add_options_file("config/injector.toml")?
//!         .add_options_env("ADSP")
//!         .add_module("app")
//!         .with_logging(LoggingConfig::development())
//!         .build()?;
//!
//!     println!("注入器已创建: {}", injector.id());
//!     Ok(())
//! }
//! ```

pub mod builder;


pub use builder::{InjectorBuilder, LoggingConfig};

// 重新导出常用类型
pub use di_impl::Injector;
pub use infrastructure_common::{InfrastructureError, InjectorOptions, OptionsLoader};
