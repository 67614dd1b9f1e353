//! 解析引擎
//!
//! 一个注入器核心持有两个缓存作用域：提供者作用域（配置期）与实例作用域（运行期）。
//! 两个作用域共享解析路径，实例作用域未命中时回退到提供者作用域查找 `<name>Provider`。

use crate::injector::InjectorRef;
use crate::loader::ModuleKey;
use crate::path::{PathGuard, ResolutionPath};
use crate::provide::Provide;
use di_abstractions::{annotate, Args, Locals, Unit, Value};
use infrastructure_common::{
    is_valid_token, provider_token, DependencyError, DependencyResult, INJECTOR_TOKEN,
    PROVIDE_TOKEN,
};
use parking_lot::{ReentrantMutex, ReentrantMutexGuard};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Weak};
use tracing::{debug, trace, warn};
use uuid::Uuid;

/// 缓存作用域
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheScope {
    /// 提供者缓存，配置期可见
    Provider,
    /// 实例缓存，运行期可见
    Instance,
}

/// 缓存槽位，不存在即未设置
#[derive(Clone)]
enum Slot {
    Instantiating,
    Resolved(Value),
}

#[derive(Default)]
struct Caches {
    provider: HashMap<String, Slot>,
    instance: HashMap<String, Slot>,
}

impl Caches {
    fn scope(&self, scope: CacheScope) -> &HashMap<String, Slot> {
        match scope {
            CacheScope::Provider => &self.provider,
            CacheScope::Instance => &self.instance,
        }
    }

    fn scope_mut(&mut self, scope: CacheScope) -> &mut HashMap<String, Slot> {
        match scope {
            CacheScope::Provider => &mut self.provider,
            CacheScope::Instance => &mut self.instance,
        }
    }
}

/// 槽位守卫：创建时标记 `Instantiating`，未提交就离开作用域时撤销标记（包括 panic 展开）
struct SlotGuard<'a> {
    caches: &'a RefCell<Caches>,
    scope: CacheScope,
    token: &'a str,
    committed: bool,
}

impl<'a> SlotGuard<'a> {
    fn enter(caches: &'a RefCell<Caches>, scope: CacheScope, token: &'a str) -> Self {
        caches
            .borrow_mut()
            .scope_mut(scope)
            .insert(token.to_string(), Slot::Instantiating);
        Self {
            caches,
            scope,
            token,
            committed: false,
        }
    }

    fn commit(mut self, value: Value) {
        self.caches
            .borrow_mut()
            .scope_mut(self.scope)
            .insert(self.token.to_string(), Slot::Resolved(value));
        self.committed = true;
    }
}

impl Drop for SlotGuard<'_> {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        if let Ok(mut caches) = self.caches.try_borrow_mut() {
            let slots = caches.scope_mut(self.scope);
            if matches!(slots.get(self.token), Some(Slot::Instantiating)) {
                slots.remove(self.token);
            }
        }
    }
}

/// 受重入锁保护的共享状态
///
/// `RefCell` 借用只在锁内短暂持有，从不跨越用户回调。
#[derive(Default)]
pub(crate) struct Shared {
    caches: RefCell<Caches>,
    path: RefCell<ResolutionPath>,
    loaded: RefCell<HashSet<ModuleKey>>,
}

/// 注入器核心
pub(crate) struct InjectorCore {
    id: Uuid,
    strict: bool,
    shared: ReentrantMutex<Shared>,
}

impl InjectorCore {
    /// 创建核心并预置 `$provide` 与两个作用域的 `$injector`
    pub(crate) fn new(strict: bool) -> Arc<Self> {
        Arc::new_cyclic(|this: &Weak<InjectorCore>| {
            let mut caches = Caches::default();
            caches.provider.insert(
                PROVIDE_TOKEN.to_string(),
                Slot::Resolved(Value::new(Provide::new(this.clone()))),
            );
            caches.provider.insert(
                INJECTOR_TOKEN.to_string(),
                Slot::Resolved(Value::new(InjectorRef::new(
                    this.clone(),
                    CacheScope::Provider,
                ))),
            );
            caches.instance.insert(
                INJECTOR_TOKEN.to_string(),
                Slot::Resolved(Value::new(InjectorRef::new(
                    this.clone(),
                    CacheScope::Instance,
                ))),
            );

            Self {
                id: Uuid::new_v4(),
                strict,
                shared: ReentrantMutex::new(Shared {
                    caches: RefCell::new(caches),
                    ..Shared::default()
                }),
            }
        })
    }

    pub(crate) fn id(&self) -> Uuid {
        self.id
    }

    pub(crate) fn is_strict(&self) -> bool {
        self.strict
    }

    /// 获取重入锁；同一线程上的嵌套解析可以再次进入
    pub(crate) fn lock(&self) -> ReentrantMutexGuard<'_, Shared> {
        self.shared.lock()
    }

    /// 按令牌取得服务，未命中时构造并缓存
    pub(crate) fn get(
        &self,
        scope: CacheScope,
        token: &str,
        caller: Option<&str>,
    ) -> DependencyResult<Value> {
        let shared = self.lock();

        let cached = shared.caches.borrow().scope(scope).get(token).cloned();
        match cached {
            Some(Slot::Resolved(value)) => return Ok(value),
            Some(Slot::Instantiating) => {
                let chain = shared.path.borrow().chain_from(token);
                warn!(injector = %self.id, "检测到循环依赖: {}", chain.join(" <- "));
                return Err(DependencyError::CircularDependency {
                    token: token.to_string(),
                    chain,
                });
            }
            None => {}
        }

        let _path = PathGuard::enter(&shared.path, token);
        let slot = SlotGuard::enter(&shared.caches, scope, token);
        trace!(injector = %self.id, ?scope, "开始解析: {}", token);

        let outcome = self.on_miss(scope, token, caller);

        match &outcome {
            Ok(value) => {
                slot.commit(value.clone());
                debug!(injector = %self.id, ?scope, "解析完成: {}", token);
            }
            Err(error) => {
                drop(slot);
                debug!(injector = %self.id, ?scope, "解析失败: {}, 原因: {}", token, error);
            }
        }
        outcome
    }

    fn on_miss(
        &self,
        scope: CacheScope,
        token: &str,
        caller: Option<&str>,
    ) -> DependencyResult<Value> {
        match scope {
            CacheScope::Provider => {
                let shared = self.lock();
                let mut chain: Vec<String> =
                    shared.path.borrow().most_recent_first().cloned().collect();
                if let Some(caller) = caller {
                    if !chain.iter().any(|entry| entry == caller) {
                        chain.push(caller.to_string());
                    }
                }
                Err(DependencyError::UnknownProvider {
                    token: token.to_string(),
                    chain,
                })
            }
            CacheScope::Instance => {
                let provider =
                    self.get(CacheScope::Provider, &provider_token(token), caller)?;
                let handle = provider.as_provider().cloned().ok_or_else(|| {
                    DependencyError::MissingGetFactory {
                        name: token.to_string(),
                    }
                })?;
                let factory =
                    handle
                        .get_factory()
                        .ok_or_else(|| DependencyError::MissingGetFactory {
                            name: token.to_string(),
                        })?;
                self.invoke(
                    CacheScope::Instance,
                    &factory,
                    Some(Value::Provider(handle)),
                    None,
                    Some(token),
                )
            }
        }
    }

    /// 解析依赖后调用单元
    pub(crate) fn invoke(
        &self,
        scope: CacheScope,
        unit: &Unit,
        receiver: Option<Value>,
        locals: Option<&Locals>,
        caller: Option<&str>,
    ) -> DependencyResult<Value> {
        let _shared = self.lock();
        let args = self.collect_args(scope, unit, receiver, locals, caller)?;
        trace!(injector = %self.id, ?scope, "调用单元: {:?}", unit.name().or(caller));
        unit.call(args)
    }

    /// 解析依赖后构造单元
    pub(crate) fn instantiate(
        &self,
        scope: CacheScope,
        unit: &Unit,
        locals: Option<&Locals>,
        caller: Option<&str>,
    ) -> DependencyResult<Value> {
        let _shared = self.lock();
        let args = self.collect_args(scope, unit, None, locals, caller)?;
        trace!(injector = %self.id, ?scope, "构造单元: {:?}", unit.name().or(caller));
        unit.construct(args).map(di_abstractions::Construction::resolve)
    }

    fn collect_args(
        &self,
        scope: CacheScope,
        unit: &Unit,
        receiver: Option<Value>,
        locals: Option<&Locals>,
        caller: Option<&str>,
    ) -> DependencyResult<Args> {
        let tokens = annotate(unit, self.strict, caller)?;
        let mut values = Vec::with_capacity(tokens.len());
        for token in &tokens {
            if !is_valid_token(token) {
                return Err(DependencyError::InvalidToken {
                    found: format!("{token:?}"),
                });
            }
            let value = match locals.and_then(|locals| locals.get(token)) {
                Some(local) => local.clone(),
                None => self.get(scope, token, caller)?,
            };
            values.push(value);
        }
        Ok(Args::new(receiver, tokens, values))
    }

    /// `<token>Provider` 已注册，或本作用域缓存中存在 `token`
    pub(crate) fn has(&self, scope: CacheScope, token: &str) -> bool {
        let shared = self.lock();
        let caches = shared.caches.borrow();
        caches.provider.contains_key(&provider_token(token))
            || caches.scope(scope).contains_key(token)
    }

    /// 本作用域缓存中是否已有该令牌的槽位
    pub(crate) fn contains(&self, scope: CacheScope, token: &str) -> bool {
        let shared = self.lock();
        let contains = shared.caches.borrow().scope(scope).contains_key(token);
        contains
    }

    /// 直接写入已解析的值
    pub(crate) fn store(&self, scope: CacheScope, token: &str, value: Value) {
        let shared = self.lock();
        shared
            .caches
            .borrow_mut()
            .scope_mut(scope)
            .insert(token.to_string(), Slot::Resolved(value));
    }

    /// 标记模块已加载；已加载过时返回 `false`
    pub(crate) fn mark_loaded(&self, key: ModuleKey) -> bool {
        let shared = self.lock();
        let inserted = shared.loaded.borrow_mut().insert(key);
        inserted
    }

    /// 已加载的具名模块
    pub(crate) fn loaded_modules(&self) -> Vec<String> {
        let shared = self.lock();
        let mut names: Vec<String> = shared
            .loaded
            .borrow()
            .iter()
            .filter_map(|key| match key {
                ModuleKey::Named(name) => Some(name.clone()),
                ModuleKey::Inline(_) => None,
            })
            .collect();
        names.sort();
        names
    }
}
