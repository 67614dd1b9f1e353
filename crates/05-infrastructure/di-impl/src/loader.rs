//! 模块加载
//!
//! 深度优先、从左到右地加载模块：先加载依赖，再按序重放注册调用与配置块，
//! 并收集运行块。每个模块（按名称或内联单元身份）在一个注入器中只加载一次。

use crate::engine::{CacheScope, InjectorCore};
use crate::injector::InjectorRef;
use crate::provide::Provide;
use di_abstractions::{FromValue, ModuleRef, ModuleRegistry, Resolver, Unit, Value};
use infrastructure_common::{DependencyError, DependencyResult, INJECTOR_TOKEN, PROVIDE_TOKEN};
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// 已加载模块集合中的键
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) enum ModuleKey {
    Named(String),
    Inline(usize),
}

impl ModuleKey {
    fn of(module: &ModuleRef) -> Self {
        match module {
            ModuleRef::Named(name) => Self::Named(name.clone()),
            ModuleRef::Inline(unit) => Self::Inline(unit.identity()),
        }
    }
}

/// 加载模块列表，返回按顺序收集的运行块
pub(crate) fn load_modules(
    core: &InjectorCore,
    registry: &dyn ModuleRegistry,
    modules: &[ModuleRef],
) -> DependencyResult<Vec<Value>> {
    let mut run_blocks = Vec::new();

    for module in modules {
        if !core.mark_loaded(ModuleKey::of(module)) {
            trace!("跳过已加载的模块: {:?}", module.name());
            continue;
        }

        let outcome = match module {
            ModuleRef::Named(name) => load_named(core, registry, name, &mut run_blocks),
            ModuleRef::Inline(unit) => core
                .invoke(CacheScope::Provider, unit, None, None, None)
                .map(|block| run_blocks.push(block)),
        };

        if let Err(error) = outcome {
            warn!("模块加载失败: {:?}, 原因: {}", module.name(), error);
            return Err(DependencyError::module_load_failure(module.name(), error));
        }
    }

    Ok(run_blocks)
}

fn load_named(
    core: &InjectorCore,
    registry: &dyn ModuleRegistry,
    name: &str,
    run_blocks: &mut Vec<Value>,
) -> DependencyResult<()> {
    let module = registry.lookup(name)?;
    debug!("加载模块: {}", name);

    let requires: Vec<ModuleRef> = module.requires().iter().map(ModuleRef::from).collect();
    run_blocks.extend(load_modules(core, registry, &requires)?);
    run_blocks.extend(module.run_blocks().iter().cloned().map(Value::Unit));

    let provide = core.get(CacheScope::Provider, PROVIDE_TOKEN, None)?;
    let provide = Arc::<Provide>::from_value(&provide, PROVIDE_TOKEN)?;
    for registration in module.invoke_queue() {
        trace!("重放注册调用: {}.{}({})", name, registration.method(), registration.name());
        provide.apply(registration.clone())?;
    }

    let injector = core.get(CacheScope::Provider, INJECTOR_TOKEN, None)?;
    let injector = Arc::<InjectorRef>::from_value(&injector, INJECTOR_TOKEN)?;
    for block in module.config_blocks() {
        run_config_block(&injector, block)?;
    }

    debug!("模块加载完成: {}", name);
    Ok(())
}

fn run_config_block(injector: &InjectorRef, block: &Unit) -> DependencyResult<()> {
    injector.invoke(block, None, None, None).map(|_| ())
}
