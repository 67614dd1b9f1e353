//! 解析器抽象接口
//!
//! 注入器对外暴露的解析能力：取服务、调用单元、构造单元、检查存在性与解析注解。

use crate::unit::{Locals, Unit};
use crate::value::{FromValue, Value};
use infrastructure_common::DependencyResult;
use std::any::Any;
use std::sync::Arc;

/// 解析器 trait
pub trait Resolver {
    /// 按令牌取得服务；`caller` 仅用于诊断信息
    fn get(&self, token: &str, caller: Option<&str>) -> DependencyResult<Value>;

    /// 解析依赖后调用单元，返回值原样返回
    fn invoke(
        &self,
        unit: &Unit,
        receiver: Option<Value>,
        locals: Option<&Locals>,
        caller: Option<&str>,
    ) -> DependencyResult<Value>;

    /// 解析依赖后构造单元
    fn instantiate(
        &self,
        unit: &Unit,
        locals: Option<&Locals>,
        caller: Option<&str>,
    ) -> DependencyResult<Value>;

    /// 令牌是否可解析，不触发构造
    fn has(&self, token: &str) -> bool;

    /// 解析单元的依赖令牌
    fn annotate(
        &self,
        unit: &Unit,
        strict: bool,
        name_hint: Option<&str>,
    ) -> DependencyResult<Vec<String>> {
        crate::annotate::annotate(unit, strict, name_hint)
    }

    /// 取得服务并转型为具体类型
    fn get_as<T: Any + Send + Sync>(&self, token: &str) -> DependencyResult<Arc<T>>
    where
        Self: Sized,
    {
        let value = self.get(token, None)?;
        Arc::<T>::from_value(&value, token)
    }
}
