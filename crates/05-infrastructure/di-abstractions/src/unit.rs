//! 可调用单元
//!
//! 注入器能够调用或构造的一切都表示为 [`Unit`]：函数体、构造体以及它们的依赖声明。

use crate::annotate::parse_signature;
use crate::value::{FromValue, Value};
use infrastructure_common::{DependencyError, DependencyResult};
use once_cell::sync::OnceCell;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// 按令牌提供的局部覆盖值
pub type Locals = HashMap<String, Value>;

type FunctionBody = dyn Fn(Args) -> DependencyResult<Value> + Send + Sync;
type ConstructorBody = dyn Fn(Args) -> DependencyResult<Construction> + Send + Sync;

#[derive(Clone)]
enum Body {
    Function(Arc<FunctionBody>),
    Constructor(Arc<ConstructorBody>),
}

/// 依赖声明
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Annotation {
    /// 显式令牌列表（数组形式或附加的令牌列表）
    Explicit(Vec<String>),
    /// 仅有参数签名文本，需要推断（严格模式下不允许）
    Inferred {
        /// 逗号分隔的参数列表
        signature: String,
    },
}

/// 构造结果
///
/// 构造体可以返回新实例，也可以显式返回一个替代值。
#[derive(Debug, Clone)]
pub enum Construction {
    /// 新构造的实例
    Constructed(Value),
    /// 构造体显式返回的替代值
    Replaced {
        /// 构造出的实例
        instance: Value,
        /// 替代值
        replacement: Value,
    },
}

impl Construction {
    /// 决定最终结果：替代值非 `Undefined` 时取替代值，否则取实例
    pub fn resolve(self) -> Value {
        match self {
            Self::Constructed(instance) => instance,
            Self::Replaced {
                instance,
                replacement,
            } => {
                if replacement.is_undefined() {
                    instance
                } else {
                    replacement
                }
            }
        }
    }
}

struct UnitInner {
    name: Option<String>,
    annotation: Annotation,
    inferred: OnceCell<Vec<String>>,
    body: Body,
}

/// 可调用单元
///
/// 克隆开销很小，克隆体与原单元共享身份。
#[derive(Clone)]
pub struct Unit {
    inner: Arc<UnitInner>,
}

impl Unit {
    fn from_parts(name: Option<String>, annotation: Annotation, body: Body) -> Self {
        Self {
            inner: Arc::new(UnitInner {
                name,
                annotation,
                inferred: OnceCell::new(),
                body,
            }),
        }
    }

    /// 无依赖的函数单元
    pub fn function<F>(body: F) -> Self
    where
        F: Fn(Args) -> DependencyResult<Value> + Send + Sync + 'static,
    {
        Self::annotated(Vec::<String>::new(), body)
    }

    /// 带显式令牌的函数单元（数组形式）
    pub fn annotated<I, S, F>(tokens: I, body: F) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: Fn(Args) -> DependencyResult<Value> + Send + Sync + 'static,
    {
        Self::from_parts(
            None,
            Annotation::Explicit(tokens.into_iter().map(Into::into).collect()),
            Body::Function(Arc::new(body)),
        )
    }

    /// 依赖从参数签名推断的函数单元
    pub fn inferred<F>(signature: impl Into<String>, body: F) -> Self
    where
        F: Fn(Args) -> DependencyResult<Value> + Send + Sync + 'static,
    {
        Self::from_parts(
            None,
            Annotation::Inferred {
                signature: signature.into(),
            },
            Body::Function(Arc::new(body)),
        )
    }

    /// 带显式令牌的构造单元
    pub fn constructor<I, S, F>(tokens: I, body: F) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: Fn(Args) -> DependencyResult<Construction> + Send + Sync + 'static,
    {
        Self::from_parts(
            None,
            Annotation::Explicit(tokens.into_iter().map(Into::into).collect()),
            Body::Constructor(Arc::new(body)),
        )
    }

    /// 依赖从参数签名推断的构造单元
    pub fn inferred_constructor<F>(signature: impl Into<String>, body: F) -> Self
    where
        F: Fn(Args) -> DependencyResult<Construction> + Send + Sync + 'static,
    {
        Self::from_parts(
            None,
            Annotation::Inferred {
                signature: signature.into(),
            },
            Body::Constructor(Arc::new(body)),
        )
    }

    /// 数组形式 `[tokenA, tokenB, unit]`
    ///
    /// 最后一个元素必须是单元，其余元素必须是字符串令牌；结果使用数组中的令牌。
    pub fn from_array(mut items: Vec<Value>) -> DependencyResult<Self> {
        let last = items.pop().unwrap_or_default();
        let unit = last.into_unit("fn")?;

        let tokens = items
            .iter()
            .map(|item| {
                item.downcast::<String>()
                    .map(|token| String::clone(&token))
                    .ok_or_else(|| DependencyError::InvalidToken {
                        found: item.kind().to_string(),
                    })
            })
            .collect::<DependencyResult<Vec<_>>>()?;

        Ok(unit.with_annotation(Annotation::Explicit(tokens)))
    }

    /// 设置名称，用于诊断信息
    pub fn named(self, name: impl Into<String>) -> Self {
        Self::from_parts(
            Some(name.into()),
            self.inner.annotation.clone(),
            self.inner.body.clone(),
        )
    }

    fn with_annotation(self, annotation: Annotation) -> Self {
        Self::from_parts(self.inner.name.clone(), annotation, self.inner.body.clone())
    }

    /// 单元名称
    pub fn name(&self) -> Option<&str> {
        self.inner.name.as_deref()
    }

    /// 依赖声明
    pub fn annotation(&self) -> &Annotation {
        &self.inner.annotation
    }

    /// 是否为构造单元
    pub fn is_constructor(&self) -> bool {
        matches!(self.inner.body, Body::Constructor(_))
    }

    /// 推断得到的令牌，只解析一次
    pub(crate) fn inferred_tokens(&self, signature: &str) -> &[String] {
        self.inner.inferred.get_or_init(|| parse_signature(signature))
    }

    /// 以函数方式调用；构造单元返回其决定后的结果
    pub fn call(&self, args: Args) -> DependencyResult<Value> {
        match &self.inner.body {
            Body::Function(body) => body(args),
            Body::Constructor(body) => body(args).map(Construction::resolve),
        }
    }

    /// 以构造方式调用；函数单元的返回值视为构造出的实例
    pub fn construct(&self, args: Args) -> DependencyResult<Construction> {
        match &self.inner.body {
            Body::Function(body) => body(args).map(Construction::Constructed),
            Body::Constructor(body) => body(args),
        }
    }

    /// 引用身份比较
    pub fn ptr_eq(&self, other: &Unit) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// 身份标识，在单元存活期间唯一
    pub fn identity(&self) -> usize {
        Arc::as_ptr(&self.inner) as usize
    }
}

impl fmt::Debug for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Unit")
            .field("name", &self.inner.name)
            .field("annotation", &self.inner.annotation)
            .field("constructor", &self.is_constructor())
            .finish()
    }
}

static UNDEFINED: Value = Value::Undefined;

/// 调用参数
///
/// 按声明顺序排列的已解析依赖，以及可选的接收者（例如提供者自身）。
#[derive(Debug, Clone, Default)]
pub struct Args {
    receiver: Option<Value>,
    tokens: Vec<String>,
    values: Vec<Value>,
}

impl Args {
    /// 创建参数
    pub fn new(receiver: Option<Value>, tokens: Vec<String>, values: Vec<Value>) -> Self {
        Self {
            receiver,
            tokens,
            values,
        }
    }

    /// 接收者
    pub fn receiver(&self) -> Option<&Value> {
        self.receiver.as_ref()
    }

    /// 将接收者转型为具体类型
    pub fn receiver_as<T: Any + Send + Sync>(&self) -> DependencyResult<Arc<T>> {
        Arc::<T>::from_value(self.receiver().unwrap_or(&UNDEFINED), "this")
    }

    /// 第 `index` 个参数，越界时为 `Undefined`
    pub fn value(&self, index: usize) -> &Value {
        self.values.get(index).unwrap_or(&UNDEFINED)
    }

    /// 第 `index` 个参数对应的令牌
    pub fn token(&self, index: usize) -> &str {
        self.tokens.get(index).map_or("", String::as_str)
    }

    /// 提取并转换第 `index` 个参数
    pub fn extract<T: FromValue>(&self, index: usize) -> DependencyResult<T> {
        T::from_value(self.value(index), self.token(index))
    }

    /// 已解析的令牌
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// 参数个数
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// 是否没有参数
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
