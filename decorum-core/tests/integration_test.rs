// These tests share the process-wide extractor table, so they run serially
// and start from a reset.

use decorum_core::extractors::{self, factory};
use decorum_core::params::{body, next, query_param, request, request_param, response};
use decorum_core::routes::{controller, get};
use decorum_core::{
    ClassDef, DecoratorProcessor, Error, ExtractionKind, Instance, Result, Value, route_args,
};
use serial_test::serial;

struct Ctrl;

fn register_constant(kind: ExtractionKind, value: &'static str) {
    DecoratorProcessor::register_processor_function(kind, extractors::constant(Value::from(value)));
}

fn register_all() {
    register_constant(ExtractionKind::Next, "val1");
    register_constant(ExtractionKind::RequestParam, "val2");
    register_constant(ExtractionKind::RequestBody, "val3");
    register_constant(ExtractionKind::QueryParam, "val4");
    register_constant(ExtractionKind::Response, "val5");
    register_constant(ExtractionKind::Request, "val6");
}

fn declare_all_params(class: ClassDef<Ctrl>, method: &str) -> Result<ClassDef<Ctrl>> {
    class
        .param(method, 0, next())?
        .param(method, 1, request_param("reqparam", vec![])?)?
        .param(method, 2, body())?
        .param(method, 3, query_param("queryparam", vec![])?)?
        .param(method, 4, response())?
        .param(method, 5, request())
}

fn assert_all(_this: &Ctrl, args: decorum_core::Args) -> Result<Value> {
    let expected = ["val1", "val2", "val3", "val4", "val5", "val6"];
    for (index, want) in expected.iter().enumerate() {
        assert_eq!(args.arg::<String>(index)?, *want);
    }
    Ok(Value::from("returnvalue"))
}

fn raw() -> Vec<Value> {
    ["1", "2", "3", "4", "5", "6"].into_iter().map(Value::from).collect()
}

#[test]
#[serial]
fn test_parameter_decorators_in_conjunction() -> Result<()> {
    DecoratorProcessor::reset();
    register_all();

    let class = ClassDef::<Ctrl>::new("Ctrl").method("test", assert_all);
    let class = declare_all_params(class, "test")?.build();

    let ctrl = class.instantiate(Ctrl)?;
    let out = ctrl.call("test", &raw())?;
    assert_eq!(out.downcast::<String>()?, "returnvalue");
    Ok(())
}

#[test]
#[serial]
fn test_parameter_and_route_decorators_in_conjunction() -> Result<()> {
    DecoratorProcessor::reset();
    register_all();

    let class = ClassDef::<Ctrl>::new("Ctrl")
        .method("test_func", assert_all)
        .route("test_func", get(route_args![])?)?;
    let class = declare_all_params(class, "test_func")?
        .controller(controller(route_args![])?)?
        .build();

    let ctrl = class.instantiate(Ctrl)?;
    assert_eq!(ctrl.routes().unwrap()[0].fn_name, "test_func");

    // the bound callable keeps its instance when detached
    let detached = ctrl.method("test_func").unwrap();
    let out = detached(&raw())?;
    assert_eq!(out.downcast::<String>()?, "returnvalue");
    Ok(())
}

#[test]
#[serial]
fn test_reset_clears_registrations() -> Result<()> {
    DecoratorProcessor::reset();
    register_constant(ExtractionKind::RequestBody, "body");

    let class = ClassDef::<Ctrl>::new("Ctrl")
        .method("create", |_this, args| args.arg::<String>(0).map(Value::from))
        .param("create", 0, body())?
        .build();
    let ctrl = class.instantiate(Ctrl)?;
    assert_eq!(ctrl.call("create", &[])?.downcast::<String>()?, "body");

    extractors::reset();
    let err = ctrl.call("create", &[]).unwrap_err();
    assert_eq!(err, Error::UnresolvedExtraction("__body__".into()));
    assert!(extractors::ExtractorRegistry::global().is_empty());
    Ok(())
}

#[test]
#[serial]
fn test_declaration_order_independent_of_registration() -> Result<()> {
    DecoratorProcessor::reset();

    // declared and constructed before anything is registered
    let class = ClassDef::<Ctrl>::new("Ctrl")
        .method("show", |_this, args| args.arg::<String>(0).map(Value::from))
        .param("show", 0, request_param("id", vec![])?)?
        .build();
    let mut ctrl = Instance::new(class, Ctrl);
    DecoratorProcessor::apply_decorators(&mut ctrl)?;

    extractors::register(
        ExtractionKind::RequestParam,
        factory(|static_args| {
            let key = static_args[0].downcast::<String>()?;
            Ok(extractors::extractor(move |raw| {
                Ok(Value::from(format!("{}={}", key, raw.len())))
            }))
        }),
    );

    let out = ctrl.call("show", &[Value::unit(), Value::unit(), Value::unit()])?;
    assert_eq!(out.downcast::<String>()?, "id=3");
    Ok(())
}

#[test]
#[serial]
fn test_return_values_pass_through() -> Result<()> {
    DecoratorProcessor::reset();
    register_constant(ExtractionKind::Next, "next");

    let class = ClassDef::<Ctrl>::new("Ctrl")
        .method("unit", |_this, _args| Ok(Value::unit()))
        .param("unit", 0, next())?
        .method("falsy", |_this, _args| Ok(Value::from(false)))
        .param("falsy", 0, next())?
        .method("zero", |_this, _args| Ok(Value::from(0_i64)))
        .param("zero", 0, next())?
        .build();
    let ctrl = class.instantiate(Ctrl)?;

    assert!(ctrl.call("unit", &[])?.is_unit());
    assert!(!ctrl.call("falsy", &[])?.downcast::<bool>()?);
    assert_eq!(ctrl.call("zero", &[])?.downcast::<i64>()?, 0);
    Ok(())
}
