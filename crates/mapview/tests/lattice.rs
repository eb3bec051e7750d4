//! Integration tests for interface lattice reduction over derived types.
#![allow(missing_docs, dead_code)]

use mapview::lattice::{maximal_interfaces, reduce};
use mapview::{MapViewError, TypeName, Value, ViewContext, ViewType, MAP_HOLDER};
use serde_json::json;

#[derive(ViewType)]
struct Named {
    name: Option<String>,
}

#[derive(ViewType)]
#[mapview(extends(Named))]
struct Employee {
    salary: Option<i64>,
}

#[derive(ViewType)]
#[mapview(extends(Named))]
struct Customer {
    discount: Option<f64>,
}

#[derive(ViewType)]
#[mapview(extends(Employee, Customer))]
struct StaffCustomer {
    badge: Option<String>,
}

#[derive(ViewType)]
struct Auditable {}

fn present(value: Value) -> Value {
    Value::Optional(Some(Box::new(value)))
}

fn names(list: &[&str]) -> Vec<TypeName> {
    list.iter().map(|name| TypeName::new(name)).collect()
}

#[test]
fn test_diamond_reduces_to_most_specific() {
    let ctx = ViewContext::new();
    ctx.register::<StaffCustomer>();

    let reduced = reduce(
        ctx.registry(),
        &names(&["Customer", "Employee", "StaffCustomer", "Named"]),
        &[],
    )
    .unwrap();
    assert_eq!(reduced.as_str(), StaffCustomer::NAME);
}

#[test]
fn test_unrelated_interfaces_are_ambiguous() {
    let ctx = ViewContext::new();
    ctx.register::<StaffCustomer>().register::<Auditable>();

    let err = reduce(
        ctx.registry(),
        &names(&["Named", "Employee", "Auditable"]),
        &[],
    )
    .unwrap_err();
    assert_eq!(
        err,
        MapViewError::ambiguous(vec!["Employee".to_string(), "Auditable".to_string()])
    );

    let maximal = maximal_interfaces(
        ctx.registry(),
        &names(&["Named", "Employee", "Auditable"]),
        &names(&["Auditable"]),
    );
    assert_eq!(maximal, names(&["Employee"]));
}

#[test]
fn test_view_real_interface() {
    let ctx = ViewContext::new();
    let view = ctx
        .builder::<StaffCustomer>()
        .with_json(json!({"name": "Ann", "salary": 10, "badge": "b-1"}))
        .unwrap()
        .build_as::<StaffCustomer>()
        .unwrap();

    let interfaces = view.interfaces();
    assert!(interfaces.iter().any(|i| i.as_str() == MAP_HOLDER));
    assert!(interfaces.iter().any(|i| i.as_str() == "Named"));
    assert_eq!(view.real_interface().unwrap().as_str(), "StaffCustomer");

    assert_eq!(view.badge().unwrap(), Some(Some("b-1".to_string())));
    assert_eq!(view.get("salary").unwrap(), present(Value::Int(10)));
    assert!(view.conforms_to("Customer"));
    assert!(!view.conforms_to("Auditable"));
}

#[test]
fn test_adapt_to_supertype() {
    let ctx = ViewContext::new();
    let view = ctx
        .builder::<StaffCustomer>()
        .with_json(json!({"name": "Ann", "discount": 0.5}))
        .unwrap()
        .build_as::<StaffCustomer>()
        .unwrap();

    let customer = view.adapt::<Customer>().unwrap();
    assert_eq!(customer.discount().unwrap(), Some(Some(0.5)));
    assert_eq!(customer.real_interface().unwrap().as_str(), "Customer");
    assert_eq!(customer.get("name").unwrap(), present(Value::from("Ann")));
}
