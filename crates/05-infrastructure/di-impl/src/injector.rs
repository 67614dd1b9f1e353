//! 注入器门面
//!
//! [`create_injector`] 完成整个启动过程：预置保留令牌、加载模块、执行运行块，
//! 然后返回实例作用域的 [`Injector`]。

use crate::engine::{CacheScope, InjectorCore};
use crate::loader;
use di_abstractions::{
    Locals, ModuleCatalog, ModuleRef, ModuleRegistry, Resolver, Unit, Value,
};
use infrastructure_common::{DependencyError, DependencyResult};
use std::fmt;
use std::sync::{Arc, Weak};
use tracing::{debug, info};
use uuid::Uuid;

/// 注入器引用
///
/// `$injector` 令牌解析得到的句柄，绑定到一个缓存作用域。
/// 它不持有注入器的所有权，注入器释放后调用会返回 `InjectorReleased`。
#[derive(Clone)]
pub struct InjectorRef {
    core: Weak<InjectorCore>,
    scope: CacheScope,
}

impl InjectorRef {
    pub(crate) fn new(core: Weak<InjectorCore>, scope: CacheScope) -> Self {
        Self { core, scope }
    }

    fn core(&self) -> DependencyResult<Arc<InjectorCore>> {
        self.core.upgrade().ok_or(DependencyError::InjectorReleased)
    }

    /// 绑定的缓存作用域
    pub fn scope(&self) -> CacheScope {
        self.scope
    }
}

impl Resolver for InjectorRef {
    fn get(&self, token: &str, caller: Option<&str>) -> DependencyResult<Value> {
        self.core()?.get(self.scope, token, caller)
    }

    fn invoke(
        &self,
        unit: &Unit,
        receiver: Option<Value>,
        locals: Option<&Locals>,
        caller: Option<&str>,
    ) -> DependencyResult<Value> {
        self.core()?
            .invoke(self.scope, unit, receiver, locals, caller)
    }

    fn instantiate(
        &self,
        unit: &Unit,
        locals: Option<&Locals>,
        caller: Option<&str>,
    ) -> DependencyResult<Value> {
        self.core()?.instantiate(self.scope, unit, locals, caller)
    }

    fn has(&self, token: &str) -> bool {
        self.core
            .upgrade()
            .is_some_and(|core| core.has(self.scope, token))
    }
}

impl fmt::Debug for InjectorRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InjectorRef")
            .field("scope", &self.scope)
            .field("alive", &(self.core.strong_count() > 0))
            .finish()
    }
}

/// 注入器
///
/// 持有注入器核心，对外提供实例作用域的解析能力。克隆得到同一个注入器。
#[derive(Clone)]
pub struct Injector {
    core: Arc<InjectorCore>,
}

impl Injector {
    /// 注入器标识
    pub fn id(&self) -> Uuid {
        self.core.id()
    }

    /// 是否为严格模式
    pub fn is_strict(&self) -> bool {
        self.core.is_strict()
    }

    /// 提供者作用域的引用
    pub fn provider_injector(&self) -> InjectorRef {
        InjectorRef::new(Arc::downgrade(&self.core), CacheScope::Provider)
    }

    /// 实例作用域的引用
    pub fn instance_injector(&self) -> InjectorRef {
        InjectorRef::new(Arc::downgrade(&self.core), CacheScope::Instance)
    }

    /// 已加载的具名模块（已排序）
    pub fn loaded_modules(&self) -> Vec<String> {
        self.core.loaded_modules()
    }
}

impl Resolver for Injector {
    fn get(&self, token: &str, caller: Option<&str>) -> DependencyResult<Value> {
        self.core.get(CacheScope::Instance, token, caller)
    }

    fn invoke(
        &self,
        unit: &Unit,
        receiver: Option<Value>,
        locals: Option<&Locals>,
        caller: Option<&str>,
    ) -> DependencyResult<Value> {
        self.core
            .invoke(CacheScope::Instance, unit, receiver, locals, caller)
    }

    fn instantiate(
        &self,
        unit: &Unit,
        locals: Option<&Locals>,
        caller: Option<&str>,
    ) -> DependencyResult<Value> {
        self.core
            .instantiate(CacheScope::Instance, unit, locals, caller)
    }

    fn has(&self, token: &str) -> bool {
        self.core.has(CacheScope::Instance, token)
    }
}

impl fmt::Debug for Injector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Injector")
            .field("id", &self.core.id())
            .field("strict", &self.core.is_strict())
            .finish()
    }
}

/// 使用全局模块目录创建注入器
pub fn create_injector<I>(modules: I, strict: bool) -> DependencyResult<Injector>
where
    I: IntoIterator,
    I::Item: Into<ModuleRef>,
{
    create_injector_with(ModuleCatalog::global(), modules, strict)
}

/// 使用指定的模块注册表创建注入器
pub fn create_injector_with<I>(
    registry: &dyn ModuleRegistry,
    modules: I,
    strict: bool,
) -> DependencyResult<Injector>
where
    I: IntoIterator,
    I::Item: Into<ModuleRef>,
{
    let modules: Vec<ModuleRef> = modules.into_iter().map(Into::into).collect();
    let core = InjectorCore::new(strict);
    info!(injector = %core.id(), strict, modules = modules.len(), "开始创建注入器");

    {
        let _shared = core.lock();
        let run_blocks = loader::load_modules(&core, registry, &modules)?;
        debug!(injector = %core.id(), "执行运行块: {} 个", run_blocks.len());
        for block in run_blocks {
            run(&core, block)?;
        }
    }

    info!(injector = %core.id(), "注入器创建完成");
    Ok(Injector { core })
}

fn run(core: &InjectorCore, block: Value) -> DependencyResult<()> {
    match block {
        Value::Undefined => Ok(()),
        Value::Unit(unit) => core
            .invoke(CacheScope::Instance, &unit, None, None, None)
            .map(|_| ()),
        other => Err(DependencyError::InvalidUnitKind {
            name: "fn".to_string(),
            found: other.kind().to_string(),
        }),
    }
}
