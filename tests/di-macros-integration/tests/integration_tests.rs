//! Centralized integration tests for di-macros crate

use di_abstractions::{Annotation, Module, Resolver, Value};
use di_impl::{create_injector, create_injector_with, InjectorRef};
use di_macros::{injectable, module};
use infrastructure_common::DependencyError;
use std::sync::Arc;

#[derive(Debug)]
pub struct Greeter {
    greeting: String,
    punctuation: String,
}

impl Greeter {
    pub fn greet(&self, name: &str) -> String {
        format!("{}, {}{}", self.greeting, name, self.punctuation)
    }
}

#[injectable]
fn shout(greeting: Arc<String>) -> String {
    greeting.to_uppercase()
}

#[injectable(tokens = ["greeting", "punctuation"], name = "politeGreeting")]
fn polite(text: Arc<String>, mark: Arc<String>) -> String {
    format!("{text}{mark}")
}

#[injectable(constructor, tokens = ["greeting", "punctuation"])]
pub fn greeter(greeting: Arc<String>, punctuation: Arc<String>) -> Arc<Greeter> {
    Arc::new(Greeter {
        greeting: greeting.to_string(),
        punctuation: punctuation.to_string(),
    })
}

#[injectable(tokens = ["greeting"])]
fn checked(greeting: Arc<String>) -> Result<String, DependencyError> {
    if greeting.is_empty() {
        Err(DependencyError::custom("问候语为空"))
    } else {
        Ok(format!("{greeting}?"))
    }
}

#[injectable(tokens = ["$injector"])]
fn lazy_shout(injector: Arc<InjectorRef>) -> Result<String, DependencyError> {
    let shout = injector.get_as::<String>("shout")?;
    Ok(format!("{shout}!"))
}

#[injectable]
fn nothing() {}

#[module(name = "macro-greeting")]
fn greeting_module(module: Module) -> Module {
    module
        .value("greeting", Value::new("hello".to_string()))
        .constant("punctuation", Value::new("!".to_string()))
        .factory("shout", shout_unit())
        .factory("polite", polite_unit())
        .service("greeter", greeter_unit())
        .factory("checked", checked_unit())
}

#[module(requires = ["macro-greeting"])]
fn macro_app(module: Module) -> Module {
    module.factory("lazyShout", lazy_shout_unit())
}

#[test]
fn test_generated_units_carry_annotations() {
    let unit = shout_unit();
    assert_eq!(unit.name(), Some("shout"));
    assert!(matches!(
        unit.annotation(),
        Annotation::Inferred { signature } if signature == "greeting"
    ));

    let unit = polite_unit();
    assert_eq!(unit.name(), Some("politeGreeting"));
    assert!(matches!(
        unit.annotation(),
        Annotation::Explicit(tokens) if tokens == &vec!["greeting", "punctuation"]
    ));

    assert!(greeter_unit().is_constructor());
    assert!(!nothing_unit().is_constructor());
}

#[test]
fn test_modules_are_registered_at_startup() -> anyhow::Result<()> {
    let injector = create_injector(["macro_app"], false)?;

    assert_eq!(*injector.get_as::<String>("shout")?, "HELLO");
    assert_eq!(*injector.get_as::<String>("polite")?, "hello!");
    assert_eq!(*injector.get_as::<String>("checked")?, "hello?");
    assert_eq!(*injector.get_as::<String>("lazyShout")?, "HELLO!");
    assert_eq!(
        injector.get_as::<Greeter>("greeter")?.greet("world"),
        "hello, world!"
    );
    assert_eq!(
        injector.loaded_modules(),
        vec!["macro-greeting".to_string(), "macro_app".to_string()]
    );
    Ok(())
}

#[test]
fn test_strict_mode_rejects_inferred_units() -> anyhow::Result<()> {
    let injector = create_injector(["macro-greeting"], true)?;

    assert_eq!(*injector.get_as::<String>("polite")?, "hello!");
    assert!(matches!(
        injector.get("shout", None),
        Err(DependencyError::StrictModeViolation { ref name }) if name == "shout"
    ));
    Ok(())
}

#[test]
fn test_unit_errors_propagate() -> anyhow::Result<()> {
    let catalog = di_abstractions::ModuleCatalog::new();
    catalog.register(
        Module::new("empty", Vec::<String>::new())
            .value("greeting", Value::new(String::new()))
            .factory("checked", checked_unit()),
    );

    let injector = create_injector_with(&catalog, ["empty"], false)?;
    assert!(matches!(
        injector.get("checked", None),
        Err(DependencyError::CreationFailed { .. })
    ));
    Ok(())
}

#[test]
fn test_unit_returning_unit_type_is_undefined() -> anyhow::Result<()> {
    let injector = create_injector_with(
        &di_abstractions::ModuleCatalog::new(),
        Vec::<String>::new(),
        true,
    )?;
    let result = injector.invoke(&nothing_unit(), None, None, None)?;
    assert!(result.is_undefined());
    Ok(())
}
