//! 注入器配置
//!
//! 选项由 `config` 分层合并：TOML/JSON 文件中的 `injector` 节，以及形如
//! `<PREFIX>_INJECTOR__STRICT_DI`、`<PREFIX>_INJECTOR__MODULES` 的环境变量。
//! 后添加的来源覆盖先添加的来源，显式设置的值覆盖全部来源。

use crate::errors::{ConfigError, ConfigResult};
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, error};

/// 注入器选项所在的配置节
pub const OPTIONS_SECTION: &str = "injector";

/// 注入器选项
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InjectorOptions {
    /// 是否启用严格模式（禁止依赖推断）
    pub strict_di: bool,
    /// 启动时按顺序加载的模块名称
    pub modules: Vec<String>,
}

impl InjectorOptions {
    /// 创建默认选项
    pub fn new() -> Self {
        Self::default()
    }

    /// 从 TOML 文本解析
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        OptionsLoader::new().add_str(content, FileFormat::Toml).load()
    }

    /// 从 JSON 文本解析
    pub fn from_json_str(content: &str) -> ConfigResult<Self> {
        OptionsLoader::new().add_str(content, FileFormat::Json).load()
    }

    /// 从文件加载，格式由扩展名决定
    pub fn from_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        OptionsLoader::new().add_file(path)?.load()
    }

    /// 从带前缀的环境变量加载
    pub fn from_env(prefix: &str) -> ConfigResult<Self> {
        OptionsLoader::new().add_env(prefix).load()
    }
}

/// 分层的选项加载器
#[derive(Debug, Clone)]
pub struct OptionsLoader {
    builder: ConfigBuilder<DefaultState>,
    strict_di: Option<bool>,
    modules: Option<Vec<String>>,
}

impl Default for OptionsLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl OptionsLoader {
    /// 创建空的加载器
    pub fn new() -> Self {
        Self {
            builder: Config::builder(),
            strict_di: None,
            modules: None,
        }
    }

    /// 添加配置文件来源
    pub fn add_file<P: AsRef<Path>>(mut self, path: P) -> ConfigResult<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(ConfigError::FileNotFound {
                path: path.display().to_string(),
            });
        }

        debug!("添加注入器配置文件: {}", path.display());
        self.builder = self.builder.add_source(File::from(path).required(true));
        Ok(self)
    }

    /// 添加文本来源
    pub fn add_str(mut self, content: &str, format: FileFormat) -> Self {
        self.builder = self.builder.add_source(File::from_str(content, format));
        self
    }

    /// 添加环境变量来源
    ///
    /// 模块列表以逗号分隔，布尔值按 `true`/`false`/数字解析。
    pub fn add_env(mut self, prefix: &str) -> Self {
        debug!("添加环境变量配置源，前缀: {}", prefix);
        self.builder = self.builder.add_source(
            Environment::with_prefix(prefix)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key(&format!("{OPTIONS_SECTION}.modules")),
        );
        self
    }

    /// 显式设置严格模式
    pub fn set_strict_di(mut self, enabled: bool) -> Self {
        self.strict_di = Some(enabled);
        self
    }

    /// 显式设置模块列表
    pub fn set_modules(mut self, modules: Vec<String>) -> Self {
        self.modules = Some(modules);
        self
    }

    /// 合并全部来源并绑定到 [`InjectorOptions`]
    pub fn load(&self) -> ConfigResult<InjectorOptions> {
        let mut builder = self.builder.clone();
        if let Some(strict_di) = self.strict_di {
            builder = builder
                .set_override(format!("{OPTIONS_SECTION}.strict_di"), strict_di)
                .map_err(parse_error)?;
        }
        if let Some(modules) = &self.modules {
            builder = builder
                .set_override(format!("{OPTIONS_SECTION}.modules"), modules.clone())
                .map_err(parse_error)?;
        }

        let settings = builder.build().map_err(parse_error)?;
        match settings.get::<InjectorOptions>(OPTIONS_SECTION) {
            Ok(options) => Ok(options),
            Err(config::ConfigError::NotFound(_)) => Ok(InjectorOptions::default()),
            Err(e) => Err(parse_error(e)),
        }
    }
}

fn parse_error(e: config::ConfigError) -> ConfigError {
    error!("注入器配置解析失败: {}", e);
    ConfigError::ParseError {
        source: Box::new(e),
    }
}
