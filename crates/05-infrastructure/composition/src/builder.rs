//! 注入器构建器

use di_abstractions::{ModuleCatalog, ModuleRef, ModuleRegistry};
use di_impl::{create_injector_with, Injector};
use infrastructure_common::{InfrastructureError, InjectorOptions, OptionsLoader};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// 注入器构建器
///
/// 使用建造者模式汇总模块列表、注入器选项与日志配置，最终创建 [`Injector`]
pub struct InjectorBuilder {
    /// 显式添加的模块
    modules: Vec<ModuleRef>,
    /// 模块注册表，未设置时使用全局目录
    registry: Option<Arc<dyn ModuleRegistry>>,
    /// 分层的注入器选项来源
    options: OptionsLoader,
    /// 是否启用日志初始化
    logging_enabled: bool,
    /// 日志配置
    logging_config: LoggingConfig,
}

impl InjectorBuilder {
    /// 创建新的注入器构建器
    pub fn new() -> Self {
        Self {
            modules: Vec::new(),
            registry: None,
            options: OptionsLoader::new(),
            logging_enabled: false, // 默认不启用日志初始化
            logging_config: LoggingConfig::default(),
        }
    }

    /// 添加模块（名称或内联配置单元）
    pub fn add_module(mut self, module: impl Into<ModuleRef>) -> Self {
        let module = module.into();
        debug!("添加模块: {:?}", module.name());
        self.modules.push(module);
        self
    }

    /// 批量添加模块
    pub fn add_modules<I>(mut self, modules: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<ModuleRef>,
    {
        self.modules.extend(modules.into_iter().map(Into::into));
        self
    }

    /// 使用指定的模块注册表
    pub fn with_registry<R: ModuleRegistry + 'static>(mut self, registry: R) -> Self {
        self.registry = Some(Arc::new(registry));
        self
    }

    /// 启用或禁用严格模式，覆盖全部选项来源
    pub fn strict_di(mut self, enabled: bool) -> Self {
        self.options = self.options.set_strict_di(enabled);
        self
    }

    /// 使用给定选项覆盖全部选项来源
    pub fn with_options(mut self, options: InjectorOptions) -> Self {
        self.options = self
            .options
            .set_strict_di(options.strict_di)
            .set_modules(options.modules);
        self
    }

    /// 添加选项文件（TOML 或 JSON），后添加的文件优先
    pub fn add_options_file<P: AsRef<Path>>(
        mut self,
        path: P,
    ) -> Result<Self, InfrastructureError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(InfrastructureError::BootstrapFailed {
                message: format!("配置文件不存在: {}", path.display()),
            });
        }

        info!("添加注入器配置文件: {}", path.display());
        self.options = self.options.add_file(path)?;
        Ok(self)
    }

    /// 添加带前缀的环境变量来源
    pub fn add_options_env(mut self, prefix: &str) -> Self {
        info!("添加环境变量配置源，前缀: {}", prefix);
        self.options = self.options.add_env(prefix);
        self
    }

    /// 配置日志
    pub fn with_logging(mut self, config: LoggingConfig) -> Self {
        self.logging_config = config;
        self.logging_enabled = true;
        self
    }

    /// 合并全部来源后的选项
    pub fn options(&self) -> Result<InjectorOptions, InfrastructureError> {
        Ok(self.options.load()?)
    }

    /// 构建注入器
    ///
    /// 先加载选项中列出的模块，再加载显式添加的模块
    pub fn build(self) -> Result<Injector, InfrastructureError> {
        // 只有在明确配置了日志时才初始化日志，避免测试中重复初始化
        if self.logging_enabled {
            self.initialize_logging()?;
        }

        info!("开始构建注入器");

        let options = self.options.load()?;
        let mut modules: Vec<ModuleRef> = options
            .modules
            .iter()
            .map(ModuleRef::from)
            .collect();
        modules.extend(self.modules);

        let registry: &dyn ModuleRegistry = match &self.registry {
            Some(registry) => registry.as_ref(),
            None => ModuleCatalog::global(),
        };
        let injector = create_injector_with(registry, modules, options.strict_di)?;

        info!(injector = %injector.id(), "注入器构建完成");
        Ok(injector)
    }

    /// 初始化日志系统
    fn initialize_logging(&self) -> Result<(), InfrastructureError> {
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(self.logging_config.level)
            .with_target(self.logging_config.show_target)
            .with_thread_ids(self.logging_config.show_thread_ids)
            .with_file(self.logging_config.show_file)
            .with_line_number(self.logging_config.show_line_number);

        if self.logging_config.json_format {
            subscriber.json().try_init()
        } else {
            subscriber.try_init()
        }
        .map_err(|e| InfrastructureError::BootstrapFailed {
            message: format!("日志初始化失败: {}", e),
        })?;

        info!("日志系统初始化完成");
        Ok(())
    }
}

impl Default for InjectorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// 日志配置
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// 日志级别
    pub level: tracing::Level,
    /// 是否显示目标
    pub show_target: bool,
    /// 是否显示线程ID
    pub show_thread_ids: bool,
    /// 是否显示文件名
    pub show_file: bool,
    /// 是否显示行号
    pub show_line_number: bool,
    /// 是否使用 JSON 格式
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: tracing::Level::INFO,
            show_target: true,
            show_thread_ids: false,
            show_file: false,
            show_line_number: false,
            json_format: false,
        }
    }
}

impl LoggingConfig {
    /// 开发环境：DEBUG 级别，显示源码位置
    pub fn development() -> Self {
        Self {
            level: tracing::Level::DEBUG,
            show_target: true,
            show_thread_ids: true,
            show_file: true,
            show_line_number: true,
            json_format: false,
        }
    }

    /// 生产环境：INFO 级别，JSON 输出
    pub fn production() -> Self {
        Self {
            level: tracing::Level::INFO,
            show_target: false,
            show_thread_ids: false,
            show_file: false,
            show_line_number: false,
            json_format: true,
        }
    }

    /// 指定日志级别
    pub fn with_level(mut self, level: tracing::Level) -> Self {
        self.level = level;
        self
    }
}
