//! 约定规范定义
//!
//! 注入令牌的命名约定：提供者后缀、保留令牌以及参数名修饰规则

/// 提供者令牌后缀
pub const PROVIDER_SUFFIX: &str = "Provider";

/// 注入器自身的保留令牌，在两个缓存作用域中都可解析
pub const INJECTOR_TOKEN: &str = "$injector";

/// 提供者注册器的保留令牌，仅在提供者作用域中可解析
pub const PROVIDE_TOKEN: &str = "$provide";

/// 装饰器中被装饰实例的局部令牌
pub const DELEGATE_TOKEN: &str = "$delegate";

/// 不允许作为提供者名称的保留字
pub const RESERVED_SERVICE_NAME: &str = "service";

/// 由服务令牌得到对应的提供者令牌
///
/// ```
/// use infrastructure_common::provider_token;
/// assert_eq!(provider_token("log"), "logProvider");
/// ```
pub fn provider_token(name: &str) -> String {
    format!("{name}{PROVIDER_SUFFIX}")
}

/// 去除参数名两侧成对的单个下划线修饰
///
/// `_name_` 视为 `name`，只有一侧带下划线时保持原样。
pub fn strip_underscore_decoration(raw: &str) -> &str {
    let name = raw.trim();
    if name.len() > 2 && name.starts_with('_') && name.ends_with('_') {
        &name[1..name.len() - 1]
    } else {
        name
    }
}

/// 检查令牌是否为合法的服务名
pub fn is_valid_token(token: &str) -> bool {
    !token.is_empty() && !token.chars().any(char::is_whitespace)
}
