//! 模块注册表
//!
//! 注入器启动时通过 [`ModuleRegistry`] 按名称查找模块描述。

use crate::module::Module;
use dashmap::DashMap;
use infrastructure_common::{DependencyError, DependencyResult};
use once_cell::sync::Lazy;
use std::sync::Arc;
use tracing::debug;

/// 模块注册表 trait
pub trait ModuleRegistry: Send + Sync {
    /// 按名称查找模块，不存在时返回 `UnknownModule`
    fn lookup(&self, name: &str) -> DependencyResult<Arc<Module>>;
}

impl<T: ModuleRegistry + ?Sized> ModuleRegistry for Arc<T> {
    fn lookup(&self, name: &str) -> DependencyResult<Arc<Module>> {
        (**self).lookup(name)
    }
}

/// 全局模块目录
static GLOBAL_MODULE_CATALOG: Lazy<ModuleCatalog> = Lazy::new(ModuleCatalog::new);

/// 基于并发哈希表的模块目录
#[derive(Debug, Default)]
pub struct ModuleCatalog {
    modules: DashMap<String, Arc<Module>>,
}

impl ModuleCatalog {
    /// 创建空目录
    pub fn new() -> Self {
        Self::default()
    }

    /// 进程级的全局目录
    pub fn global() -> &'static ModuleCatalog {
        &GLOBAL_MODULE_CATALOG
    }

    /// 注册模块，同名模块会被替换
    pub fn register(&self, module: Module) -> Arc<Module> {
        let module = Arc::new(module);
        let previous = self
            .modules
            .insert(module.name().to_string(), module.clone());
        if previous.is_some() {
            debug!("替换已存在的模块: {}", module.name());
        } else {
            debug!("注册模块: {}", module.name());
        }
        module
    }

    /// 获取已注册的模块
    pub fn module(&self, name: &str) -> Option<Arc<Module>> {
        self.modules.get(name).map(|entry| entry.value().clone())
    }

    /// 移除模块
    pub fn remove(&self, name: &str) -> Option<Arc<Module>> {
        self.modules.remove(name).map(|(_, module)| module)
    }

    /// 是否包含模块
    pub fn contains(&self, name: &str) -> bool {
        self.modules.contains_key(name)
    }

    /// 所有模块名（已排序）
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.modules.iter().map(|entry| entry.key().clone()).collect();
        names.sort();
        names
    }

    /// 模块数量
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

impl ModuleRegistry for ModuleCatalog {
    fn lookup(&self, name: &str) -> DependencyResult<Arc<Module>> {
        self.module(name).ok_or_else(|| DependencyError::UnknownModule {
            name: name.to_string(),
        })
    }
}
