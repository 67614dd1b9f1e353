//! 依赖注解解析
//!
//! 确定一个可调用单元需要哪些依赖令牌，以及它们的位置顺序。

use crate::unit::{Annotation, Unit};
use infrastructure_common::{strip_underscore_decoration, DependencyError, DependencyResult};
use once_cell::sync::Lazy;
use regex::Regex;

static STRIP_COMMENTS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)(//.*$)|(/\*[\s\S]*?\*/)").expect("注释匹配正则表达式无效")
});

static WHITESPACE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("空白匹配正则表达式无效"));

/// 解析单元的依赖令牌列表
///
/// 显式声明原样返回。推断声明在首次解析后缓存在单元上；
/// 严格模式下，非空的推断声明会被拒绝。
///
/// 严格模式在每次调用时都会检查，即使令牌已经缓存：同一个单元可能被
/// 严格与非严格的注入器共用，一个注入器的解析结果不影响另一个。
pub fn annotate(unit: &Unit, strict: bool, name_hint: Option<&str>) -> DependencyResult<Vec<String>> {
    match unit.annotation() {
        Annotation::Explicit(tokens) => Ok(tokens.clone()),
        Annotation::Inferred { signature } => {
            let tokens = unit.inferred_tokens(signature);
            if tokens.is_empty() {
                return Ok(Vec::new());
            }
            if strict {
                let name = name_hint
                    .filter(|hint| !hint.is_empty())
                    .map(str::to_string)
                    .or_else(|| unit.name().map(str::to_string))
                    .unwrap_or_else(|| anonymous_name(signature));
                return Err(DependencyError::StrictModeViolation { name });
            }
            Ok(tokens.to_vec())
        }
    }
}

/// 将参数签名解析为令牌：去除注释、按逗号拆分、去除成对下划线修饰
pub fn parse_signature(signature: &str) -> Vec<String> {
    STRIP_COMMENTS
        .replace_all(signature, "")
        .split(',')
        .map(strip_underscore_decoration)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

/// 匿名单元的占位名称，形如 `fn(a, b)`
fn anonymous_name(signature: &str) -> String {
    let stripped = STRIP_COMMENTS.replace_all(signature, "");
    let collapsed = WHITESPACE.replace_all(stripped.trim(), " ");
    format!("fn({collapsed})")
}
