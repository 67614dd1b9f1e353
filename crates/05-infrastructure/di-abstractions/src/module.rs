//! 模块描述
//!
//! 模块是一组具名的注册调用、配置块和运行块，可以依赖其他模块。

use crate::provider::ProviderSpec;
use crate::unit::Unit;
use crate::value::Value;

/// 排队等待重放的注册调用
#[derive(Debug, Clone)]
pub enum Registration {
    /// `provider(name, spec)`
    Provider { name: String, spec: ProviderSpec },
    /// `factory(name, unit)`
    Factory { name: String, factory: Unit },
    /// `service(name, constructor)`
    Service { name: String, constructor: Unit },
    /// `value(name, value)`
    Value { name: String, value: Value },
    /// `constant(name, value)`
    Constant { name: String, value: Value },
    /// `decorator(name, unit)`
    Decorator { name: String, decorator: Unit },
}

impl Registration {
    /// 注册的服务名
    pub fn name(&self) -> &str {
        match self {
            Self::Provider { name, .. }
            | Self::Factory { name, .. }
            | Self::Service { name, .. }
            | Self::Value { name, .. }
            | Self::Constant { name, .. }
            | Self::Decorator { name, .. } => name,
        }
    }

    /// 对应的注册方法名
    pub fn method(&self) -> &'static str {
        match self {
            Self::Provider { .. } => "provider",
            Self::Factory { .. } => "factory",
            Self::Service { .. } => "service",
            Self::Value { .. } => "value",
            Self::Constant { .. } => "constant",
            Self::Decorator { .. } => "decorator",
        }
    }
}

/// 模块描述符
///
/// 注册方法按调用顺序排队，常量排在所有非常量注册之前。
///
/// ```
/// use di_abstractions::{Module, Unit, Value};
///
/// let module = Module::new("app", ["core"])
///     .value("greeting", Value::new("hello".to_string()))
///     .factory("shout", Unit::annotated(["greeting"], |args| {
///         let greeting: std::sync::Arc<String> = args.extract(0)?;
///         Ok(Value::new(greeting.to_uppercase()))
///     }));
///
/// assert_eq!(module.requires(), ["core"]);
/// assert_eq!(module.invoke_queue().len(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct Module {
    name: String,
    requires: Vec<String>,
    invoke_queue: Vec<Registration>,
    constant_count: usize,
    config_blocks: Vec<Unit>,
    run_blocks: Vec<Unit>,
}

impl Module {
    /// 创建模块
    pub fn new<I, S>(name: impl Into<String>, requires: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            requires: requires.into_iter().map(Into::into).collect(),
            invoke_queue: Vec::new(),
            constant_count: 0,
            config_blocks: Vec::new(),
            run_blocks: Vec::new(),
        }
    }

    /// 追加一条注册调用
    pub fn register(mut self, registration: Registration) -> Self {
        if matches!(registration, Registration::Constant { .. }) {
            self.invoke_queue.insert(self.constant_count, registration);
            self.constant_count += 1;
        } else {
            self.invoke_queue.push(registration);
        }
        self
    }

    /// 注册提供者
    pub fn provider(self, name: impl Into<String>, spec: impl Into<ProviderSpec>) -> Self {
        self.register(Registration::Provider {
            name: name.into(),
            spec: spec.into(),
        })
    }

    /// 注册工厂
    pub fn factory(self, name: impl Into<String>, factory: Unit) -> Self {
        self.register(Registration::Factory {
            name: name.into(),
            factory,
        })
    }

    /// 注册服务构造单元
    pub fn service(self, name: impl Into<String>, constructor: Unit) -> Self {
        self.register(Registration::Service {
            name: name.into(),
            constructor,
        })
    }

    /// 注册值
    pub fn value(self, name: impl Into<String>, value: Value) -> Self {
        self.register(Registration::Value {
            name: name.into(),
            value,
        })
    }

    /// 注册常量
    pub fn constant(self, name: impl Into<String>, value: Value) -> Self {
        self.register(Registration::Constant {
            name: name.into(),
            value,
        })
    }

    /// 注册装饰器
    pub fn decorator(self, name: impl Into<String>, decorator: Unit) -> Self {
        self.register(Registration::Decorator {
            name: name.into(),
            decorator,
        })
    }

    /// 添加配置块，在提供者作用域中执行
    pub fn config(mut self, block: Unit) -> Self {
        self.config_blocks.push(block);
        self
    }

    /// 添加运行块，在注入器创建完成前于实例作用域中执行
    pub fn run(mut self, block: Unit) -> Self {
        self.run_blocks.push(block);
        self
    }

    /// 模块名
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 依赖的模块名
    pub fn requires(&self) -> &[String] {
        &self.requires
    }

    /// 注册调用队列
    pub fn invoke_queue(&self) -> &[Registration] {
        &self.invoke_queue
    }

    /// 配置块
    pub fn config_blocks(&self) -> &[Unit] {
        &self.config_blocks
    }

    /// 运行块
    pub fn run_blocks(&self) -> &[Unit] {
        &self.run_blocks
    }
}

/// 注入器启动时的模块条目
#[derive(Debug, Clone)]
pub enum ModuleRef {
    /// 按名称在模块注册表中查找
    Named(String),
    /// 内联的配置单元，在提供者作用域中调用
    Inline(Unit),
}

impl ModuleRef {
    /// 模块名，内联模块没有名称
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Named(name) => Some(name),
            Self::Inline(_) => None,
        }
    }
}

impl From<&str> for ModuleRef {
    fn from(name: &str) -> Self {
        Self::Named(name.to_string())
    }
}

impl From<String> for ModuleRef {
    fn from(name: String) -> Self {
        Self::Named(name)
    }
}

impl From<&String> for ModuleRef {
    fn from(name: &String) -> Self {
        Self::Named(name.clone())
    }
}

impl From<Unit> for ModuleRef {
    fn from(unit: Unit) -> Self {
        Self::Inline(unit)
    }
}
