//! # 示例应用程序
//!
//! 演示如何声明模块、在配置期调整提供者，并通过注入器解析服务

use clap::Parser;
use di_abstractions::{Module, Provider, ProviderSpec, Resolver, Unit, Value};
use di_macros::{injectable, module};
use infrastructure_composition::{InjectorBuilder, LoggingConfig};
use parking_lot::Mutex;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

/// 命令行参数
#[derive(Parser, Debug)]
#[command(name = "example-app")]
#[command(about = "Lorn ADSP 注入器示例应用")]
struct Args {
    /// 注入器配置文件路径（TOML 或 JSON）
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// 环境变量前缀
    #[arg(long, default_value = "ADSP")]
    env_prefix: String,

    /// 启用严格模式
    #[arg(long)]
    strict: bool,

    /// 日志级别
    #[arg(long, default_value = "info")]
    log_level: String,

    /// 要问候的名字
    #[arg(default_value = "world")]
    name: String,
}

/// 问候语提供者，配置期可修改
pub struct SalutationProvider {
    salutation: Mutex<String>,
}

impl Provider for SalutationProvider {
    fn get(&self) -> Option<Unit> {
        Some(Unit::function(|args| {
            let this = args.receiver_as::<SalutationProvider>()?;
            let salutation = this.salutation.lock().clone();
            Ok(Value::new(salutation))
        }))
    }
}

/// 问候服务
pub struct Greeter {
    salutation: String,
}

impl Greeter {
    pub fn greet(&self, name: &str) -> String {
        format!("{}, {}", self.salutation, name)
    }
}

#[injectable(tokens = ["salutationProvider"])]
fn configure_salutation(provider: Arc<SalutationProvider>) {
    *provider.salutation.lock() = "Hello".to_string();
}

#[injectable(tokens = ["salutation"])]
fn greeter(salutation: Arc<String>) -> Arc<Greeter> {
    Arc::new(Greeter {
        salutation: salutation.to_string(),
    })
}

#[injectable(tokens = ["$delegate"])]
fn exclaim(greeter: Arc<Greeter>) -> Arc<Greeter> {
    Arc::new(Greeter {
        salutation: format!("{}!", greeter.salutation),
    })
}

#[module(name = "greeting")]
fn greeting_module(module: Module) -> Module {
    module
        .provider(
            "salutation",
            ProviderSpec::object(SalutationProvider {
                salutation: Mutex::new("Hi".to_string()),
            }),
        )
        .factory("greeter", greeter_unit())
        .config(configure_salutation_unit())
}

#[module(name = "app", requires = ["greeting"])]
fn app_module(module: Module) -> Module {
    module
        .decorator("greeter", exclaim_unit())
        .run(Unit::function(|_| {
            info!("应用模块已就绪");
            Ok(Value::Undefined)
        }))
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut builder = InjectorBuilder::new()
        .with_logging(LoggingConfig::development().with_level(parse_log_level(&args.log_level)));
    if let Some(path) = &args.config {
        builder = builder.add_options_file(path)?;
    }
    // 环境变量覆盖配置文件
    builder = builder.add_options_env(&args.env_prefix);
    if args.strict {
        builder = builder.strict_di(true);
    }

    let injector = builder.add_module("app").build()?;
    info!(injector = %injector.id(), "已加载模块: {:?}", injector.loaded_modules());

    match injector.get_as::<Greeter>("greeter") {
        Ok(greeter) => {
            println!("{}", greeter.greet(&args.name));
            Ok(())
        }
        Err(e) => {
            error!("解析 greeter 失败: {}", e);
            Err(e.into())
        }
    }
}

fn parse_log_level(level: &str) -> tracing::Level {
    match level.to_lowercase().as_str() {
        "trace" => tracing::Level::TRACE,
        "debug" => tracing::Level::DEBUG,
        "info" => tracing::Level::INFO,
        "warn" => tracing::Level::WARN,
        "error" => tracing::Level::ERROR,
        _ => tracing::Level::INFO,
    }
}
