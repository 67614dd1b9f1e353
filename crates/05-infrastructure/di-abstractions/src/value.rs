//! 注入值
//!
//! 注入器缓存、局部变量与参数中流动的统一值类型，以及它与具体 Rust 类型之间的转换。

use crate::provider::ProviderHandle;
use crate::unit::Unit;
use infrastructure_common::{DependencyError, DependencyResult};
use std::any::{type_name, Any};
use std::fmt;
use std::sync::Arc;

/// 注入值
///
/// `Undefined` 表示显式的“无值”；实例的身份即其 `Arc` 的指针身份。
#[derive(Clone, Default)]
pub enum Value {
    /// 无值
    #[default]
    Undefined,
    /// 任意共享实例
    Instance(Arc<dyn Any + Send + Sync>),
    /// 可调用单元
    Unit(Unit),
    /// 已注册的提供者
    Provider(ProviderHandle),
}

impl Value {
    /// 将任意值包装为共享实例
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self::Instance(Arc::new(value))
    }

    /// 使用已有的 `Arc` 作为实例，保留其身份
    pub fn from_arc<T: Any + Send + Sync>(value: Arc<T>) -> Self {
        Self::Instance(value)
    }

    /// 是否为无值
    pub fn is_undefined(&self) -> bool {
        matches!(self, Self::Undefined)
    }

    /// 值的种类名称，用于诊断信息
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Undefined => "undefined",
            Self::Instance(_) => "instance",
            Self::Unit(_) => "unit",
            Self::Provider(_) => "provider",
        }
    }

    /// 向下转型为具体类型
    ///
    /// 对提供者值，转型的是提供者自身的状态对象。
    pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        match self {
            Self::Instance(instance) => instance.clone().downcast::<T>().ok(),
            Self::Provider(provider) => provider.downcast::<T>(),
            Self::Undefined | Self::Unit(_) => None,
        }
    }

    /// 借用内部实例
    pub fn downcast_ref<T: Any + Send + Sync>(&self) -> Option<&T> {
        match self {
            Self::Instance(instance) => instance.as_ref().downcast_ref::<T>(),
            _ => None,
        }
    }

    /// 借用可调用单元
    pub fn as_unit(&self) -> Option<&Unit> {
        match self {
            Self::Unit(unit) => Some(unit),
            _ => None,
        }
    }

    /// 借用提供者句柄
    pub fn as_provider(&self) -> Option<&ProviderHandle> {
        match self {
            Self::Provider(provider) => Some(provider),
            _ => None,
        }
    }

    /// 转换为可调用单元，失败时报告 `InvalidUnitKind`
    pub fn into_unit(self, name: &str) -> DependencyResult<Unit> {
        match self {
            Self::Unit(unit) => Ok(unit),
            other => Err(DependencyError::InvalidUnitKind {
                name: name.to_string(),
                found: other.kind().to_string(),
            }),
        }
    }

    /// 引用身份比较
    pub fn ptr_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Self::Undefined, Self::Undefined) => true,
            (Self::Instance(a), Self::Instance(b)) => Arc::ptr_eq(a, b),
            (Self::Unit(a), Self::Unit(b)) => a.ptr_eq(b),
            (Self::Provider(a), Self::Provider(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Undefined => f.write_str("Undefined"),
            Self::Instance(instance) => write!(f, "Instance({:p})", Arc::as_ptr(instance)),
            Self::Unit(unit) => f.debug_tuple("Unit").field(unit).finish(),
            Self::Provider(provider) => f.debug_tuple("Provider").field(provider).finish(),
        }
    }
}

impl From<Unit> for Value {
    fn from(unit: Unit) -> Self {
        Self::Unit(unit)
    }
}

impl From<ProviderHandle> for Value {
    fn from(provider: ProviderHandle) -> Self {
        Self::Provider(provider)
    }
}

/// 从注入值提取参数
pub trait FromValue: Sized {
    /// 转换，`token` 用于错误信息
    fn from_value(value: &Value, token: &str) -> DependencyResult<Self>;
}

impl FromValue for Value {
    fn from_value(value: &Value, _token: &str) -> DependencyResult<Self> {
        Ok(value.clone())
    }
}

impl<T: Any + Send + Sync> FromValue for Arc<T> {
    fn from_value(value: &Value, token: &str) -> DependencyResult<Self> {
        value
            .downcast::<T>()
            .ok_or_else(|| DependencyError::TypeMismatch {
                token: token.to_string(),
                expected: type_name::<T>().to_string(),
                found: value.kind().to_string(),
            })
    }
}

impl<T: Any + Send + Sync> FromValue for Option<Arc<T>> {
    fn from_value(value: &Value, token: &str) -> DependencyResult<Self> {
        if value.is_undefined() {
            Ok(None)
        } else {
            Arc::<T>::from_value(value, token).map(Some)
        }
    }
}

impl FromValue for Unit {
    fn from_value(value: &Value, token: &str) -> DependencyResult<Self> {
        value.clone().into_unit(token)
    }
}

impl FromValue for ProviderHandle {
    fn from_value(value: &Value, token: &str) -> DependencyResult<Self> {
        value
            .as_provider()
            .cloned()
            .ok_or_else(|| DependencyError::TypeMismatch {
                token: token.to_string(),
                expected: "provider".to_string(),
                found: value.kind().to_string(),
            })
    }
}

/// 将可调用单元的返回值转换为注入值
pub trait IntoValue {
    /// 执行转换
    fn into_value(self) -> DependencyResult<Value>;
}

impl IntoValue for Value {
    fn into_value(self) -> DependencyResult<Value> {
        Ok(self)
    }
}

impl IntoValue for () {
    fn into_value(self) -> DependencyResult<Value> {
        Ok(Value::Undefined)
    }
}

impl IntoValue for Unit {
    fn into_value(self) -> DependencyResult<Value> {
        Ok(Value::Unit(self))
    }
}

impl IntoValue for ProviderHandle {
    fn into_value(self) -> DependencyResult<Value> {
        Ok(Value::Provider(self))
    }
}

impl IntoValue for &'static str {
    fn into_value(self) -> DependencyResult<Value> {
        Ok(Value::new(self.to_string()))
    }
}

impl<T: Any + Send + Sync> IntoValue for Arc<T> {
    fn into_value(self) -> DependencyResult<Value> {
        Ok(Value::Instance(self))
    }
}

impl<T: IntoValue> IntoValue for Option<T> {
    fn into_value(self) -> DependencyResult<Value> {
        self.map_or(Ok(Value::Undefined), IntoValue::into_value)
    }
}

impl<T, E> IntoValue for Result<T, E>
where
    T: IntoValue,
    E: Into<DependencyError>,
{
    fn into_value(self) -> DependencyResult<Value> {
        self.map_err(Into::into)?.into_value()
    }
}

macro_rules! impl_into_value_for_plain {
    ($($ty:ty),* $(,)?) => {
        $(
            impl IntoValue for $ty {
                fn into_value(self) -> DependencyResult<Value> {
                    Ok(Value::new(self))
                }
            }
        )*
    };
}

impl_into_value_for_plain!(String, bool, i32, i64, u32, u64, usize, f64);
