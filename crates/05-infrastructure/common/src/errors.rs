//! 错误类型定义

use thiserror::Error;

/// 配置错误类型
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("配置文件不存在: {path}")]
    FileNotFound { path: String },

    #[error("配置解析失败: {source}")]
    ParseError {
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// 依赖注入错误类型
///
/// 覆盖注入器在注解、注册、模块加载与解析过程中可能出现的全部失败。
#[derive(Error, Debug)]
pub enum DependencyError {
    #[error("未知的提供者: {}", chain.join(" <- "))]
    UnknownProvider { token: String, chain: Vec<String> },

    #[error("模块不存在: {name}")]
    UnknownModule { name: String },

    #[error("无效的注入令牌: 期望字符串形式的服务名, 实际为 {found}")]
    InvalidToken { found: String },

    #[error("参数 '{name}' 不是可调用单元, 实际为 {found}")]
    InvalidUnitKind { name: String, found: String },

    #[error("检测到循环依赖: {}", chain.join(" <- "))]
    CircularDependency { token: String, chain: Vec<String> },

    #[error("{name} 未使用显式依赖声明, 无法在严格模式下调用")]
    StrictModeViolation { name: String },

    #[error("提供者 '{name}' 必须定义 $get 工厂方法")]
    MissingGetFactory { name: String },

    #[error("提供者 '{name}' 的 $get 工厂方法必须返回一个值")]
    FactoryReturnedUndefined { name: String },

    #[error("'{name}' 不是有效的 {kind} 名称")]
    NameCollision { name: String, kind: String },

    #[error("模块 {} 实例化失败: {source}", module.as_deref().unwrap_or("<inline>"))]
    ModuleLoadFailure {
        module: Option<String>,
        source: Box<DependencyError>,
    },

    #[error("类型不匹配: {token} 期望 {expected}, 实际为 {found}")]
    TypeMismatch {
        token: String,
        expected: String,
        found: String,
    },

    #[error("注入器已释放")]
    InjectorReleased,

    #[error("组件创建失败: {message}")]
    CreationFailed { message: String },
}

impl DependencyError {
    /// 创建自定义的组件创建失败错误
    pub fn custom(message: impl Into<String>) -> Self {
        Self::CreationFailed {
            message: message.into(),
        }
    }

    /// 包装模块加载失败
    pub fn module_load_failure(module: Option<&str>, source: DependencyError) -> Self {
        Self::ModuleLoadFailure {
            module: module.map(str::to_string),
            source: Box::new(source),
        }
    }

    /// 剥离所有模块加载包装，返回最内层的原始错误
    pub fn root_cause(&self) -> &DependencyError {
        let mut current = self;
        while let Self::ModuleLoadFailure { source, .. } = current {
            current = source.as_ref();
        }
        current
    }

    /// 由外到内列出失败经过的模块（内联模块记为 `None`）
    pub fn module_trail(&self) -> Vec<Option<&str>> {
        let mut trail = Vec::new();
        let mut current = self;
        while let Self::ModuleLoadFailure { module, source } = current {
            trail.push(module.as_deref());
            current = source.as_ref();
        }
        trail
    }
}

/// 基础设施错误类型
#[derive(Error, Debug)]
pub enum InfrastructureError {
    #[error("配置错误: {source}")]
    ConfigError {
        #[from]
        source: ConfigError,
    },

    #[error("依赖注入错误: {source}")]
    DependencyError {
        #[from]
        source: DependencyError,
    },

    #[error("基础设施启动失败: {message}")]
    BootstrapFailed { message: String },
}

/// 配置结果类型别名
pub type ConfigResult<T> = Result<T, ConfigError>;

/// 依赖注入结果类型别名
pub type DependencyResult<T> = Result<T, DependencyError>;

/// 基础设施结果类型别名
pub type InfrastructureResult<T> = Result<T, InfrastructureError>;
