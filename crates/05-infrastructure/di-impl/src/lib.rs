//! # 依赖注入具体实现
//!
//! 提供基于模块的注入器：解析引擎、提供者注册器（`$provide`）、模块加载器
//! 以及注入器门面。
//!
//! ```
//! use di_abstractions::{Module, ModuleCatalog, Resolver, Unit, Value};
//! use di_impl::create_injector_with;
//! use std::sync::Arc;
//!
//! let catalog = ModuleCatalog::new();
//! catalog.register(
//!     Module::new("app", Vec::<String>::new())
//!         .value("greeting", Value::new("hello".to_string()))
//!         .factory("shout", Unit::annotated(["greeting"], |args| {
//!             let greeting: Arc<String> = args.extract(0)?;
//!             Ok(Value::new(greeting.to_uppercase()))
//!         })),
//! );
//!
//! let injector = create_injector_with(&catalog, ["app"], false)?;
//! assert_eq!(*injector.get_as::<String>("shout")?, "HELLO");
//! # Ok::<(), di_abstractions::DependencyError>(())
//! ```

mod engine;
mod injector;
mod loader;
mod path;
mod provide;

pub use engine::CacheScope;
pub use injector::{create_injector, create_injector_with, Injector, InjectorRef};
pub use provide::Provide;
