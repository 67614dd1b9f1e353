//! Centralized integration tests for di-impl crate
use di_abstractions::{
    Construction, Locals, Module, ModuleCatalog, ModuleRef, ProviderHandle, Resolver, Unit,
    Value,
};
use di_impl::{create_injector_with, Injector, InjectorRef, Provide};
use infrastructure_common::DependencyError;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;

type Journal = Arc<Mutex<Vec<String>>>;

fn no_requires() -> Vec<String> {
    Vec::new()
}

/// 记录一条日志的配置/运行块
fn record(journal: &Journal, entry: &str) -> Unit {
    let journal = journal.clone();
    let entry = entry.to_string();
    Unit::function(move |_| {
        journal.lock().push(entry.clone());
        Ok(Value::Undefined)
    })
}

fn greeting_catalog() -> ModuleCatalog {
    let catalog = ModuleCatalog::new();
    catalog.register(
        Module::new("greeting", no_requires())
            .value("greeting", Value::new("hello".to_string()))
            .factory(
                "shout",
                Unit::annotated(["greeting"], |args| {
                    let greeting: Arc<String> = args.extract(0)?;
                    Ok(Value::new(greeting.to_uppercase()))
                }),
            ),
    );
    catalog
}

#[test]
fn test_greeting_and_shout() -> anyhow::Result<()> {
    let injector = create_injector_with(&greeting_catalog(), ["greeting"], false)?;
    assert_eq!(*injector.get_as::<String>("greeting")?, "hello");
    assert_eq!(*injector.get_as::<String>("shout")?, "HELLO");
    Ok(())
}

#[test]
fn test_factory_runs_once_per_injector() -> anyhow::Result<()> {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let catalog = ModuleCatalog::new();
    catalog.register(Module::new("app", no_requires()).factory(
        "session",
        Unit::function(move |_| {
            let id = counter.fetch_add(1, Ordering::SeqCst);
            Ok(Value::new(id))
        }),
    ));

    let injector = create_injector_with(&catalog, ["app"], false)?;
    let first = injector.get("session", None)?;
    let second = injector.get("session", None)?;
    assert!(first.ptr_eq(&second));
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    // 另一个注入器拥有独立的缓存
    let other = create_injector_with(&catalog, ["app"], false)?;
    let third = other.get("session", None)?;
    assert!(!first.ptr_eq(&third));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_ne!(injector.id(), other.id());
    Ok(())
}

#[test]
fn test_modules_load_once() -> anyhow::Result<()> {
    let journal: Journal = Arc::default();
    let catalog = ModuleCatalog::new();
    // 重放两次会触发常量重名错误
    catalog.register(
        Module::new("base", no_requires())
            .constant("version", Value::new(1_u32))
            .config(record(&journal, "config:base"))
            .run(record(&journal, "run:base")),
    );
    catalog.register(Module::new("left", ["base"]).config(record(&journal, "config:left")));
    catalog.register(Module::new("right", ["base"]).config(record(&journal, "config:right")));

    let injector = create_injector_with(&catalog, ["base", "left", "right", "base"], false)?;
    assert_eq!(
        *journal.lock(),
        vec!["config:base", "config:left", "config:right", "run:base"]
    );
    assert_eq!(
        injector.loaded_modules(),
        vec!["base".to_string(), "left".to_string(), "right".to_string()]
    );
    Ok(())
}

#[test]
fn test_requires_load_first_and_run_blocks_follow() -> anyhow::Result<()> {
    let journal: Journal = Arc::default();
    let catalog = ModuleCatalog::new();
    catalog.register(
        Module::new("core", no_requires())
            .config(record(&journal, "config:core"))
            .run(record(&journal, "run:core")),
    );
    catalog.register(
        Module::new("app", ["core"])
            .run(record(&journal, "run:app"))
            .config(record(&journal, "config:app")),
    );

    create_injector_with(&catalog, ["app"], false)?;
    assert_eq!(
        *journal.lock(),
        vec!["config:core", "config:app", "run:core", "run:app"]
    );
    Ok(())
}

#[test]
fn test_circular_dependency() {
    let catalog = ModuleCatalog::new();
    catalog.register(
        Module::new("cycle", no_requires())
            .factory("X", Unit::annotated(["Y"], |args| Ok(args.value(0).clone())))
            .factory("Y", Unit::annotated(["X"], |args| Ok(args.value(0).clone()))),
    );
    let injector = create_injector_with(&catalog, ["cycle"], false).unwrap();

    let error = injector.get("X", None).unwrap_err();
    match &error {
        DependencyError::CircularDependency { token, chain } => {
            assert_eq!(token, "X");
            assert_eq!(chain, &vec!["X", "Y", "X"]);
        }
        other => panic!("意外的错误: {other}"),
    }
    assert!(error.to_string().contains("X <- Y <- X"));

    // 失败后槽位被回退，再次解析得到同样的错误而不是别的状态
    assert!(matches!(
        injector.get("Y", None),
        Err(DependencyError::CircularDependency { .. })
    ));
}

#[test]
fn test_retry_after_failure() -> anyhow::Result<()> {
    let attempts = Arc::new(AtomicUsize::new(0));
    let counter = attempts.clone();
    let catalog = ModuleCatalog::new();
    catalog.register(Module::new("flaky", no_requires()).factory(
        "connection",
        Unit::function(move |_| {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(DependencyError::custom("首次连接失败"))
            } else {
                Ok(Value::new("connected".to_string()))
            }
        }),
    ));

    let injector = create_injector_with(&catalog, ["flaky"], false)?;
    assert!(matches!(
        injector.get("connection", None),
        Err(DependencyError::CreationFailed { .. })
    ));
    assert_eq!(*injector.get_as::<String>("connection")?, "connected");
    assert_eq!(attempts.load(Ordering::SeqCst), 2);
    Ok(())
}

#[test]
fn test_panicking_factory_can_be_retried() -> anyhow::Result<()> {
    let attempts = Arc::new(AtomicUsize::new(0));
    let counter = attempts.clone();
    let catalog = ModuleCatalog::new();
    catalog.register(Module::new("flaky", no_requires()).factory(
        "flaky",
        Unit::function(move |_| {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                panic!("首次构造 panic");
            }
            Ok(Value::new("recovered".to_string()))
        }),
    ));

    let injector = create_injector_with(&catalog, ["flaky"], false)?;
    let first = catch_unwind(AssertUnwindSafe(|| injector.get("flaky", None)));
    assert!(first.is_err());

    // 其他线程也不会看到残留的构造中标记
    let other = injector.clone();
    let value = thread::spawn(move || other.get("flaky", None))
        .join()
        .expect("解析线程不应 panic")?;
    assert_eq!(*value.downcast::<String>().unwrap(), "recovered");
    assert!(injector.get("flaky", None)?.ptr_eq(&value));
    assert_eq!(attempts.load(Ordering::SeqCst), 2);
    Ok(())
}

#[test]
fn test_unknown_provider_reports_path() {
    let catalog = ModuleCatalog::new();
    catalog.register(Module::new("app", no_requires()).factory(
        "report",
        Unit::annotated(["database"], |args| Ok(args.value(0).clone())),
    ));
    let injector = create_injector_with(&catalog, ["app"], false).unwrap();

    let error = injector.get("report", None).unwrap_err();
    match &error {
        DependencyError::UnknownProvider { token, chain } => {
            assert_eq!(token, "databaseProvider");
            assert_eq!(chain, &vec!["databaseProvider", "database", "report"]);
        }
        other => panic!("意外的错误: {other}"),
    }
    assert!(error
        .to_string()
        .contains("databaseProvider <- database <- report"));
}

#[test]
fn test_decorators_compose_in_order() -> anyhow::Result<()> {
    let catalog = ModuleCatalog::new();
    catalog.register(
        Module::new("math", no_requires())
            .value("number", Value::new(1_i64))
            .decorator(
                "number",
                Unit::annotated(["$delegate"], |args| {
                    let number: Arc<i64> = args.extract(0)?;
                    Ok(Value::new(*number * 2))
                }),
            ),
    );
    catalog.register(Module::new("more-math", ["math"]).decorator(
        "number",
        Unit::annotated(["$delegate"], |args| {
            let number: Arc<i64> = args.extract(0)?;
            Ok(Value::new(*number + 1))
        }),
    ));

    let injector = create_injector_with(&catalog, ["more-math"], false)?;
    assert_eq!(*injector.get_as::<i64>("number")?, 3);
    Ok(())
}

#[test]
fn test_constants_are_hoisted_and_visible_in_config() -> anyhow::Result<()> {
    let seen: Arc<Mutex<Option<String>>> = Arc::default();
    let slot = seen.clone();
    let catalog = ModuleCatalog::new();
    catalog.register(
        Module::new("api", no_requires())
            // 提供者在常量之前声明，依靠常量提前注册才能构造
            .provider(
                "client",
                Unit::constructor(["baseUrl"], |args| {
                    let base: Arc<String> = args.extract(0)?;
                    let get = Unit::function(move |_| Ok(Value::new(format!("{base}/v1"))));
                    Ok(Construction::Constructed(Value::Provider(
                        ProviderHandle::from_get(get),
                    )))
                }),
            )
            .constant("baseUrl", Value::new("https://api".to_string()))
            .config(Unit::annotated(["baseUrl"], move |args| {
                let base: Arc<String> = args.extract(0)?;
                *slot.lock() = Some(base.to_string());
                Ok(Value::Undefined)
            })),
    );

    let injector = create_injector_with(&catalog, ["api"], false)?;
    assert_eq!(seen.lock().as_deref(), Some("https://api"));
    assert_eq!(*injector.get_as::<String>("client")?, "https://api/v1");
    assert_eq!(*injector.get_as::<String>("baseUrl")?, "https://api");
    Ok(())
}

#[test]
fn test_config_blocks_cannot_see_instances() {
    let catalog = greeting_catalog();
    catalog.register(Module::new("eager", ["greeting"]).config(Unit::annotated(
        ["greeting"],
        |args| Ok(args.value(0).clone()),
    )));

    let error = create_injector_with(&catalog, ["eager"], false).unwrap_err();
    assert_eq!(error.module_trail(), vec![Some("eager")]);
    assert!(matches!(
        error.root_cause(),
        DependencyError::UnknownProvider { token, .. } if token == "greeting"
    ));
}

#[test]
fn test_run_blocks_cannot_see_providers() {
    let catalog = greeting_catalog();
    catalog.register(Module::new("late", ["greeting"]).run(Unit::annotated(
        ["greetingProvider"],
        |args| Ok(args.value(0).clone()),
    )));

    let error = create_injector_with(&catalog, ["late"], false).unwrap_err();
    assert!(matches!(
        error,
        DependencyError::UnknownProvider { ref token, .. } if token == "greetingProviderProvider"
    ));
}

#[test]
fn test_unknown_module_is_wrapped() {
    let catalog = ModuleCatalog::new();
    catalog.register(Module::new("app", ["missing"]));

    let error = create_injector_with(&catalog, ["app"], false).unwrap_err();
    assert_eq!(error.module_trail(), vec![Some("app"), Some("missing")]);
    assert!(matches!(
        error.root_cause(),
        DependencyError::UnknownModule { name } if name == "missing"
    ));
    assert!(error.to_string().contains("app"));
}

#[test]
fn test_inline_module_failure_has_no_name() {
    let catalog = ModuleCatalog::new();
    let inline = Unit::function(|_| Err(DependencyError::custom("内联模块失败")));

    let error = create_injector_with(&catalog, [inline], false).unwrap_err();
    assert_eq!(error.module_trail(), vec![None::<&str>]);
    assert!(matches!(
        error.root_cause(),
        DependencyError::CreationFailed { .. }
    ));
}

#[test]
fn test_inline_module_returns_run_block() -> anyhow::Result<()> {
    let journal: Journal = Arc::default();
    let catalog = greeting_catalog();
    catalog.register(Module::new("named", ["greeting"]).run(record(&journal, "run:named")));

    let inline_journal = journal.clone();
    let inline = Unit::annotated(["$provide"], move |args| {
        let provide: Arc<Provide> = args.extract(0)?;
        provide.value("farewell", Value::new("bye".to_string()))?;
        let journal = inline_journal.clone();
        // 返回的单元在实例作用域中作为运行块执行
        Ok(Value::Unit(Unit::annotated(
            ["shout", "farewell"],
            move |args| {
                let shout: Arc<String> = args.extract(0)?;
                let farewell: Arc<String> = args.extract(1)?;
                journal.lock().push(format!("run:inline:{shout}:{farewell}"));
                Ok(Value::Undefined)
            },
        )))
    });

    let modules = vec![ModuleRef::from("named"), ModuleRef::from(inline)];
    let injector = create_injector_with(&catalog, modules, false)?;
    assert_eq!(
        *journal.lock(),
        vec!["run:named".to_string(), "run:inline:HELLO:bye".to_string()]
    );
    assert_eq!(*injector.get_as::<String>("farewell")?, "bye");
    Ok(())
}

#[test]
fn test_inline_module_returning_non_unit_fails() {
    let inline = Unit::function(|_| Ok(Value::new(7_i32)));

    let error = create_injector_with(&ModuleCatalog::new(), [inline], false).unwrap_err();
    assert!(matches!(
        error,
        DependencyError::InvalidUnitKind { ref found, .. } if found == "instance"
    ));
}

#[test]
fn test_inline_module_loads_once_per_injector() -> anyhow::Result<()> {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let inline = Unit::function(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(Value::Undefined)
    });

    let catalog = ModuleCatalog::new();
    create_injector_with(&catalog, [inline.clone(), inline.clone()], false)?;
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    // 同一个单元在新注入器中重新加载
    create_injector_with(&catalog, [inline], false)?;
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    Ok(())
}

#[test]
fn test_array_form_inline_module() -> anyhow::Result<()> {
    let journal: Journal = Arc::default();
    let run_journal = journal.clone();
    let run_block = Unit::from_array(vec![
        Value::new("region".to_string()),
        Value::Unit(Unit::function(move |args| {
            let region: Arc<String> = args.extract(0)?;
            run_journal.lock().push(format!("run:{region}"));
            Ok(Value::Undefined)
        })),
    ])?;
    let inline = Unit::from_array(vec![
        Value::new("$provide".to_string()),
        Value::Unit(Unit::function(move |args| {
            let provide: Arc<Provide> = args.extract(0)?;
            provide.constant("region", Value::new("eu".to_string()))?;
            Ok(Value::Unit(run_block.clone()))
        })),
    ])?;

    let injector = create_injector_with(&ModuleCatalog::new(), [inline], false)?;
    assert_eq!(*journal.lock(), vec!["run:eu".to_string()]);
    assert_eq!(*injector.get_as::<String>("region")?, "eu");
    Ok(())
}

#[test]
fn test_strict_mode() -> anyhow::Result<()> {
    let catalog = ModuleCatalog::new();
    catalog.register(
        Module::new("app", no_requires())
            .value("greeting", Value::new("hi".to_string()))
            .factory(
                "explicit",
                Unit::annotated(["greeting"], |args| Ok(args.value(0).clone())),
            )
            .factory(
                "inferred",
                Unit::inferred("greeting", |args| Ok(args.value(0).clone())),
            )
            .factory(
                "noDeps",
                Unit::inferred("", |_| Ok(Value::new("free".to_string()))),
            ),
    );

    let injector = create_injector_with(&catalog, ["app"], true)?;
    assert!(injector.is_strict());
    assert_eq!(*injector.get_as::<String>("explicit")?, "hi");
    assert_eq!(*injector.get_as::<String>("noDeps")?, "free");
    assert!(matches!(
        injector.get("inferred", None),
        Err(DependencyError::StrictModeViolation { ref name }) if name == "inferred"
    ));

    // 非严格模式下同一模块可以推断
    let relaxed = create_injector_with(&catalog, ["app"], false)?;
    assert_eq!(*relaxed.get_as::<String>("inferred")?, "hi");
    Ok(())
}

#[test]
fn test_inferred_signature_parsing() -> anyhow::Result<()> {
    let injector = create_injector_with(&greeting_catalog(), ["greeting"], false)?;
    let unit = Unit::inferred(
        "_greeting_, /* 注释 */ shout // 结尾注释",
        |args| {
            let greeting: Arc<String> = args.extract(0)?;
            let shout: Arc<String> = args.extract(1)?;
            Ok(Value::new(format!("{greeting}/{shout}")))
        },
    );

    let result = injector.invoke(&unit, None, None, None)?;
    assert_eq!(*result.downcast::<String>().unwrap(), "hello/HELLO");
    Ok(())
}

#[test]
fn test_locals_override_registered_services() -> anyhow::Result<()> {
    let injector = create_injector_with(&greeting_catalog(), ["greeting"], false)?;
    let unit = Unit::annotated(["greeting", "shout"], |args| {
        let greeting: Arc<String> = args.extract(0)?;
        let shout: Arc<String> = args.extract(1)?;
        Ok(Value::new(format!("{greeting} {shout}")))
    });

    let mut locals = Locals::new();
    locals.insert("greeting".to_string(), Value::new("bonjour".to_string()));
    let result = injector.invoke(&unit, None, Some(&locals), None)?;
    assert_eq!(*result.downcast::<String>().unwrap(), "bonjour HELLO");
    Ok(())
}

#[test]
fn test_invoke_passes_receiver() -> anyhow::Result<()> {
    struct Counter {
        step: usize,
    }

    let injector = create_injector_with(&ModuleCatalog::new(), Vec::<String>::new(), false)?;
    let unit = Unit::function(|args| {
        let counter = args.receiver_as::<Counter>()?;
        Ok(Value::new(counter.step * 10))
    });

    let result = injector.invoke(&unit, Some(Value::new(Counter { step: 4 })), None, None)?;
    assert_eq!(*result.downcast::<usize>().unwrap(), 40);
    Ok(())
}

#[test]
fn test_instantiate_with_replacement() -> anyhow::Result<()> {
    #[derive(Debug, PartialEq)]
    struct Widget(&'static str);

    let injector = create_injector_with(&ModuleCatalog::new(), Vec::<String>::new(), false)?;

    let plain = Unit::constructor(Vec::<String>::new(), |_| {
        Ok(Construction::Constructed(Value::new(Widget("plain"))))
    });
    let replaced = Unit::constructor(Vec::<String>::new(), |_| {
        Ok(Construction::Replaced {
            instance: Value::new(Widget("instance")),
            replacement: Value::new(Widget("replacement")),
        })
    });
    let ignored = Unit::constructor(Vec::<String>::new(), |_| {
        Ok(Construction::Replaced {
            instance: Value::new(Widget("instance")),
            replacement: Value::Undefined,
        })
    });

    let widget = |unit: &Unit| -> anyhow::Result<Arc<Widget>> {
        let value = injector.instantiate(unit, None, None)?;
        Ok(value.downcast::<Widget>().unwrap())
    };
    assert_eq!(*widget(&plain)?, Widget("plain"));
    assert_eq!(*widget(&replaced)?, Widget("replacement"));
    assert_eq!(*widget(&ignored)?, Widget("instance"));
    Ok(())
}

#[test]
fn test_has_does_not_instantiate() -> anyhow::Result<()> {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let catalog = ModuleCatalog::new();
    catalog.register(Module::new("app", no_requires()).factory(
        "expensive",
        Unit::function(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Value::new(()))
        }),
    ));

    let injector = create_injector_with(&catalog, ["app"], false)?;
    assert!(injector.has("expensive"));
    assert!(injector.has("$injector"));
    assert!(!injector.has("missing"));
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    let providers = injector.provider_injector();
    assert!(providers.has("expensiveProvider"));
    assert!(providers.has("$provide"));
    Ok(())
}

#[test]
fn test_injector_is_injectable() -> anyhow::Result<()> {
    let catalog = greeting_catalog();
    catalog.register(Module::new("lazy", ["greeting"]).factory(
        "lazyShout",
        Unit::annotated(["$injector"], |args| {
            let injector: Arc<InjectorRef> = args.extract(0)?;
            let shout = injector.get_as::<String>("shout")?;
            Ok(Value::new(format!("{shout}!")))
        }),
    ));

    let injector = create_injector_with(&catalog, ["lazy"], false)?;
    assert_eq!(*injector.get_as::<String>("lazyShout")?, "HELLO!");

    let handle = injector.get_as::<InjectorRef>("$injector")?;
    assert_eq!(handle.scope(), di_impl::CacheScope::Instance);
    Ok(())
}

#[test]
fn test_provide_in_config_block() -> anyhow::Result<()> {
    let catalog = ModuleCatalog::new();
    catalog.register(Module::new("dynamic", no_requires()).config(Unit::annotated(
        ["$provide", "$injector"],
        |args| {
            let provide: Arc<Provide> = args.extract(0)?;
            let injector: Arc<InjectorRef> = args.extract(1)?;
            provide.constant("mode", Value::new("dynamic".to_string()))?;
            assert!(injector.has("mode"));
            Ok(Value::Undefined)
        },
    )));

    let injector = create_injector_with(&catalog, ["dynamic"], false)?;
    assert_eq!(*injector.get_as::<String>("mode")?, "dynamic");
    Ok(())
}

#[test]
fn test_type_mismatch() {
    let injector = create_injector_with(&greeting_catalog(), ["greeting"], false).unwrap();
    assert!(matches!(
        injector.get_as::<u64>("greeting"),
        Err(DependencyError::TypeMismatch { ref token, .. }) if token == "greeting"
    ));
}

#[test]
fn test_concurrent_resolution() -> anyhow::Result<()> {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let catalog = ModuleCatalog::new();
    catalog.register(Module::new("shared", no_requires()).factory(
        "pool",
        Unit::function(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            thread::yield_now();
            Ok(Value::new(vec![1_u8, 2, 3]))
        }),
    ));

    let injector: Injector = create_injector_with(&catalog, ["shared"], false)?;
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let injector = injector.clone();
            thread::spawn(move || injector.get("pool", None))
        })
        .collect();

    let values = handles
        .into_iter()
        .map(|handle| handle.join().expect("解析线程不应 panic"))
        .collect::<Result<Vec<_>, _>>()?;
    assert!(values.windows(2).all(|pair| pair[0].ptr_eq(&pair[1])));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    Ok(())
}
