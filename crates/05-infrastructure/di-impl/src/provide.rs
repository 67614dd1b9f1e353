//! 提供者注册器
//!
//! 在提供者作用域中以 `$provide` 令牌可注入，所有注册形式最终都归结为
//! 一个带 `$get` 工厂的提供者，或同时写入两个缓存的常量。

use crate::engine::{CacheScope, InjectorCore};
use crate::injector::InjectorRef;
use di_abstractions::{
    Locals, ProviderHandle, ProviderSpec, Registration, Resolver, Unit, Value,
};
use infrastructure_common::{
    provider_token, DependencyError, DependencyResult, DELEGATE_TOKEN, INJECTOR_TOKEN,
    RESERVED_SERVICE_NAME,
};
use std::sync::{Arc, Weak};
use tracing::debug;

/// 提供者注册器（`$provide`）
#[derive(Clone)]
pub struct Provide {
    core: Weak<InjectorCore>,
}

impl Provide {
    pub(crate) fn new(core: Weak<InjectorCore>) -> Self {
        Self { core }
    }

    fn core(&self) -> DependencyResult<Arc<InjectorCore>> {
        self.core.upgrade().ok_or(DependencyError::InjectorReleased)
    }

    /// 注册提供者
    ///
    /// 构造单元形式的规格会在提供者作用域中实例化，结果必须是带 `$get` 的提供者。
    pub fn provider(
        &self,
        name: &str,
        spec: impl Into<ProviderSpec>,
    ) -> DependencyResult<ProviderHandle> {
        if name == RESERVED_SERVICE_NAME {
            return Err(DependencyError::NameCollision {
                name: name.to_string(),
                kind: "service".to_string(),
            });
        }

        let core = self.core()?;
        let handle = match spec.into() {
            ProviderSpec::Object(handle) => handle,
            ProviderSpec::Constructor(unit) => {
                let value = core.instantiate(CacheScope::Provider, &unit, None, Some(name))?;
                match value {
                    Value::Provider(handle) => handle,
                    _ => {
                        return Err(DependencyError::MissingGetFactory {
                            name: name.to_string(),
                        })
                    }
                }
            }
        };

        if handle.get_factory().is_none() {
            return Err(DependencyError::MissingGetFactory {
                name: name.to_string(),
            });
        }

        core.store(
            CacheScope::Provider,
            &provider_token(name),
            Value::Provider(handle.clone()),
        );
        debug!(injector = %core.id(), "注册提供者: {} ({})", name, handle.type_name());
        Ok(handle)
    }

    /// 注册工厂，`$get` 返回 `Undefined` 时报错
    pub fn factory(&self, name: &str, factory: Unit) -> DependencyResult<ProviderHandle> {
        self.factory_with(name, factory, true)
    }

    /// 注册工厂，可选择是否强制返回值
    pub fn factory_with(
        &self,
        name: &str,
        factory: Unit,
        enforce: bool,
    ) -> DependencyResult<ProviderHandle> {
        let get = if enforce {
            self.enforce_return_value(name, factory)
        } else {
            factory
        };
        self.provider(name, ProviderHandle::from_get(get))
    }

    fn enforce_return_value(&self, name: &str, factory: Unit) -> Unit {
        let core = self.core.clone();
        let name = name.to_string();
        Unit::function(move |args| {
            let core = core.upgrade().ok_or(DependencyError::InjectorReleased)?;
            let result = core.invoke(
                CacheScope::Instance,
                &factory,
                args.receiver().cloned(),
                None,
                Some(name.as_str()),
            )?;
            if result.is_undefined() {
                return Err(DependencyError::FactoryReturnedUndefined { name: name.clone() });
            }
            Ok(result)
        })
    }

    /// 注册服务：通过 `$injector` 构造给定的构造单元
    pub fn service(&self, name: &str, constructor: Unit) -> DependencyResult<ProviderHandle> {
        let get = Unit::annotated([INJECTOR_TOKEN], move |args| {
            let injector: Arc<InjectorRef> = args.extract(0)?;
            injector.instantiate(&constructor, None, None)
        });
        self.factory(name, get)
    }

    /// 注册值，允许 `Undefined`
    pub fn value(&self, name: &str, value: Value) -> DependencyResult<ProviderHandle> {
        self.factory_with(name, Unit::function(move |_| Ok(value.clone())), false)
    }

    /// 注册常量：同时写入两个缓存，配置期即可注入
    pub fn constant(&self, name: &str, value: Value) -> DependencyResult<()> {
        let core = self.core()?;
        if core.contains(CacheScope::Provider, name)
            || core.contains(CacheScope::Provider, &provider_token(name))
        {
            return Err(DependencyError::NameCollision {
                name: name.to_string(),
                kind: "constant".to_string(),
            });
        }

        core.store(CacheScope::Provider, name, value.clone());
        core.store(CacheScope::Instance, name, value);
        debug!(injector = %core.id(), "注册常量: {}", name);
        Ok(())
    }

    /// 装饰已注册的服务
    ///
    /// 原地替换 `<name>Provider` 的 `$get`：先以提供者为接收者调用原工厂，
    /// 再以 `$delegate` 局部值调用装饰单元，返回其结果。
    pub fn decorator(&self, name: &str, decorator: Unit) -> DependencyResult<()> {
        let core = self.core()?;
        let provider = core.get(CacheScope::Provider, &provider_token(name), None)?;
        let handle = provider
            .as_provider()
            .cloned()
            .ok_or_else(|| DependencyError::MissingGetFactory {
                name: name.to_string(),
            })?;
        let original = handle
            .get_factory()
            .ok_or_else(|| DependencyError::MissingGetFactory {
                name: name.to_string(),
            })?;

        let weak_core = self.core.clone();
        let weak_handle = handle.downgrade();
        let service = name.to_string();
        handle.replace_get_factory(Unit::function(move |_| {
            let core = weak_core.upgrade().ok_or(DependencyError::InjectorReleased)?;
            let receiver = weak_handle.upgrade().map(Value::Provider);
            let delegate = core.invoke(
                CacheScope::Instance,
                &original,
                receiver,
                None,
                Some(service.as_str()),
            )?;

            let mut locals = Locals::new();
            locals.insert(DELEGATE_TOKEN.to_string(), delegate);
            core.invoke(
                CacheScope::Instance,
                &decorator,
                None,
                Some(&locals),
                Some(service.as_str()),
            )
        }));

        debug!(injector = %core.id(), "装饰服务: {}", name);
        Ok(())
    }

    /// 重放一条排队的注册调用
    pub fn apply(&self, registration: Registration) -> DependencyResult<()> {
        match registration {
            Registration::Provider { name, spec } => self.provider(&name, spec).map(|_| ()),
            Registration::Factory { name, factory } => self.factory(&name, factory).map(|_| ()),
            Registration::Service { name, constructor } => {
                self.service(&name, constructor).map(|_| ())
            }
            Registration::Value { name, value } => self.value(&name, value).map(|_| ()),
            Registration::Constant { name, value } => self.constant(&name, value),
            Registration::Decorator { name, decorator } => self.decorator(&name, decorator),
        }
    }

    /// 批量注册
    pub fn register_all<I>(&self, registrations: I) -> DependencyResult<()>
    where
        I: IntoIterator<Item = Registration>,
    {
        registrations
            .into_iter()
            .try_for_each(|registration| self.apply(registration))
    }
}
