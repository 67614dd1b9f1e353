//! 提供者抽象
//!
//! 提供者是知道如何通过 `$get` 工厂产生服务实例的配置期对象。

use crate::unit::Unit;
use parking_lot::RwLock;
use std::any::{type_name, Any};
use std::fmt;
use std::sync::{Arc, Weak};

/// 提供者 trait
///
/// 实现者在配置期可被配置块注入和修改，`get` 返回用于产生实例的 `$get` 工厂。
pub trait Provider: Any + Send + Sync {
    /// `$get` 工厂；返回 `None` 的提供者无法注册
    fn get(&self) -> Option<Unit>;
}

struct ProviderInner {
    type_name: &'static str,
    state: Arc<dyn Any + Send + Sync>,
    get: RwLock<Option<Unit>>,
}

/// 已注册提供者的句柄
///
/// 持有提供者状态（`$get` 调用时的接收者）和可替换的 `$get` 槽位。
/// 装饰器原地替换 `$get`，句柄身份保持不变。
#[derive(Clone)]
pub struct ProviderHandle {
    inner: Arc<ProviderInner>,
}

/// 不持有所有权的提供者句柄
#[derive(Clone)]
pub struct WeakProviderHandle {
    inner: Weak<ProviderInner>,
}

/// 仅由 `$get` 组成的字面量提供者的状态
#[derive(Debug, Default)]
pub struct GetOnly;

impl ProviderHandle {
    /// 由提供者实现创建句柄
    pub fn new<P: Provider>(provider: P) -> Self {
        Self::from_arc(Arc::new(provider))
    }

    /// 由共享的提供者实现创建句柄
    pub fn from_arc<P: Provider>(provider: Arc<P>) -> Self {
        let get = provider.get();
        Self {
            inner: Arc::new(ProviderInner {
                type_name: type_name::<P>(),
                state: provider,
                get: RwLock::new(get),
            }),
        }
    }

    /// 仅包含 `$get` 工厂的字面量提供者
    pub fn from_get(get: Unit) -> Self {
        Self {
            inner: Arc::new(ProviderInner {
                type_name: type_name::<GetOnly>(),
                state: Arc::new(GetOnly),
                get: RwLock::new(Some(get)),
            }),
        }
    }

    /// 当前的 `$get` 工厂
    pub fn get_factory(&self) -> Option<Unit> {
        self.inner.get.read().clone()
    }

    /// 替换 `$get` 工厂，返回被替换的工厂
    pub fn replace_get_factory(&self, get: Unit) -> Option<Unit> {
        self.inner.get.write().replace(get)
    }

    /// 提供者状态
    pub fn state(&self) -> Arc<dyn Any + Send + Sync> {
        self.inner.state.clone()
    }

    /// 将提供者状态转型为具体类型
    pub fn downcast<P: Any + Send + Sync>(&self) -> Option<Arc<P>> {
        self.state().downcast::<P>().ok()
    }

    /// 提供者实现的类型名
    pub fn type_name(&self) -> &'static str {
        self.inner.type_name
    }

    /// 引用身份比较
    pub fn ptr_eq(&self, other: &ProviderHandle) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// 降级为弱引用
    pub fn downgrade(&self) -> WeakProviderHandle {
        WeakProviderHandle {
            inner: Arc::downgrade(&self.inner),
        }
    }
}

impl WeakProviderHandle {
    /// 尝试升级为强引用
    pub fn upgrade(&self) -> Option<ProviderHandle> {
        self.inner.upgrade().map(|inner| ProviderHandle { inner })
    }
}

impl fmt::Debug for ProviderHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderHandle")
            .field("type_name", &self.inner.type_name)
            .field("get", &*self.inner.get.read())
            .finish()
    }
}

/// 提供者注册规格
#[derive(Debug, Clone)]
pub enum ProviderSpec {
    /// 现成的提供者对象
    Object(ProviderHandle),
    /// 由提供者作用域实例化的提供者构造单元，结果必须是提供者
    Constructor(Unit),
}

impl ProviderSpec {
    /// 由提供者实现创建规格
    pub fn object<P: Provider>(provider: P) -> Self {
        Self::Object(ProviderHandle::new(provider))
    }
}

impl From<ProviderHandle> for ProviderSpec {
    fn from(handle: ProviderHandle) -> Self {
        Self::Object(handle)
    }
}

impl From<Unit> for ProviderSpec {
    fn from(unit: Unit) -> Self {
        Self::Constructor(unit)
    }
}
