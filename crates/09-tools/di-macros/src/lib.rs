//! # DI Macros
//!
//! 这个 crate 提供了把普通函数变成可注入单元、以及在启动时声明模块的过程宏。
//!
//! ## 核心宏
//!
//! - [`injectable`] - 为函数生成 `<fn>_unit()`，返回对应的注入单元
//! - [`module`] - 在程序启动时把模块注册到全局模块目录
//!
//! ## 使用示例
//!
//! ```rust,ignore
//! use di_abstractions::{Module, Value};
//! use di_macros::{injectable, module};
//! use std::sync::Arc;
//!
//! #[injectable]
//! fn shout(greeting: Arc<String>) -> String {
//!     greeting.to_uppercase()
//! }
//!
//! #[module(name = "app")]
//! fn app(module: Module) -> Module {
//!     module
//!         .value("greeting", Value::new("hello".to_string()))
//!         .factory("shout", shout_unit())
//! }
//! ```
//!
//! 生成的代码引用 `::di_abstractions`；使用 [`module`] 的 crate 还需要依赖 `ctor`。

use proc_macro::TokenStream;

mod injectable;
mod module;
mod utils;

/// 可注入单元宏
///
/// 保留原函数，并生成同可见性的 `<fn>_unit()`。每个参数按位置通过
/// `Args::extract` 取得，返回值经 `IntoValue` 转换（`Result` 的错误会向上传播）。
///
/// # 参数
///
/// - 无参数 - 依赖从参数名推断，严格模式下会被拒绝
/// - `tokens = ["a", "b"]` - 显式声明依赖令牌，数量必须与参数一致
/// - `constructor` - 生成构造单元，供 `service` 或 `instantiate` 使用
/// - `name = "custom"` - 诊断信息中使用的名称（默认为函数名）
///
/// # 示例
///
/// ```rust,ignore
/// #[injectable(tokens = ["greeting"])]
/// fn shout(greeting: Arc<String>) -> String {
///     greeting.to_uppercase()
/// }
///
/// let unit = shout_unit();
/// ```
#[proc_macro_attribute]
pub fn injectable(args: TokenStream, input: TokenStream) -> TokenStream {
    injectable::injectable_impl(args, input)
}

/// 模块声明宏
///
/// 作用于 `fn(Module) -> Module`，在程序启动时以给定名称和依赖创建模块，
/// 交给该函数填充后注册到 `ModuleCatalog::global()`。
///
/// # 参数
///
/// - `name = "app"` - 模块名称（默认为函数名）
/// - `requires = ["core"]` - 依赖的模块
///
/// # 示例
///
/// ```rust,ignore
/// #[module(name = "audit", requires = ["app"])]
/// fn audit(module: Module) -> Module {
///     module.value("auditor", Value::new(Auditor::default()))
/// }
/// ```
#[proc_macro_attribute]
pub fn module(args: TokenStream, input: TokenStream) -> TokenStream {
    module::module_impl(args, input)
}
