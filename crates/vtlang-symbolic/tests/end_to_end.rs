//! End-to-end scenarios: topology JSON + assertion program → outcome.

use vtlang_symbolic::{
    build_model, check, CheckConfig, CompileError, Formula, Outcome, SymbolicError, SymbolicModel,
    Tag, Val,
};
use vtlang_syntax::parse;
use vtlang_topology::Topology;

const TOPOLOGY: &str = r#"{
    "node_types": [
        { "name": "tosca.nodes.Root",
          "properties": [ { "name": "description", "required": false } ] },
        { "name": "Compute", "derived_from": "tosca.nodes.Root",
          "properties": [ { "name": "cpus", "type": "integer" } ] },
        { "name": "GpuCompute", "derived_from": "Compute" },
        { "name": "Database", "derived_from": "tosca.nodes.Root",
          "properties": [ { "name": "password", "type": "string" },
                          { "name": "port", "type": "integer" } ] },
        { "name": "WebApp", "derived_from": "tosca.nodes.Root",
          "properties": [ { "name": "password", "type": "string" },
                          { "name": "url" } ] }
    ],
    "capability_types": [ { "name": "Endpoint" } ],
    "nodes": [
        { "name": "db1", "type": "Database",
          "properties": { "password": "plaintext123", "port": 5432 } },
        { "name": "app", "type": "WebApp",
          "properties": { "password": { "get_input": "app_password" },
                          "url": { "concat": [ "http://", { "get_attribute": [ "vm", "public_address" ] } ] } } },
        { "name": "gpu", "type": "GpuCompute", "properties": { "cpus": 8 } }
    ]
}"#;

fn model() -> SymbolicModel {
    build_model(&Topology::from_json_str(TOPOLOGY).unwrap()).unwrap()
}

fn run(source: &str) -> Outcome {
    let mut model = model();
    model.compile(&parse(source).unwrap()).unwrap();
    check(&model, CheckConfig::default())
}

fn compile_error(source: &str) -> CompileError {
    let mut model = model();
    match model.compile(&parse(source).unwrap()) {
        Err(SymbolicError::Compile { error, .. }) => error,
        other => panic!("expected compile error, got {:?}", other),
    }
}

fn witness_node(outcome: &Outcome, var: &str) -> Option<String> {
    match outcome {
        Outcome::Sat { witness } => witness.get(var).and_then(|b| b.node.clone()),
        other => panic!("expected sat, got {:?}", other),
    }
}

#[test]
fn test_plaintext_password_witness() {
    let outcome = run("$n: Node\nassert $n.password == \"plaintext123\"");
    assert_eq!(witness_node(&outcome, "n").as_deref(), Some("db1"));
}

#[test]
fn test_type_equality_is_exact() {
    let outcome = run("$n: Node\nassert type($n) == Compute");
    assert_eq!(outcome, Outcome::Unsat);

    let outcome = run("$n: Node\nassert type($n) == GpuCompute");
    assert_eq!(witness_node(&outcome, "n").as_deref(), Some("gpu"));
}

#[test]
fn test_subtype_includes_descendants() {
    let outcome = run("$n: Node\nassert type($n) <: Compute");
    assert_eq!(witness_node(&outcome, "n").as_deref(), Some("gpu"));

    let outcome = run("$n: Node\nassert type($n) <: `tosca.nodes.Root`\nassert $n.port == 5432");
    assert_eq!(witness_node(&outcome, "n").as_deref(), Some("db1"));

    assert_eq!(run("assert Compute <: GpuCompute"), Outcome::Unsat);
}

#[test]
fn test_inequality_of_two_absent_values_is_false() {
    // Neither node has a value for `description`.
    assert_eq!(run("assert db1.description != gpu.description"), Outcome::Unsat);
    // Present on one side only.
    assert!(run("assert db1.port != gpu.port").is_sat());
    // Both present and different.
    assert!(run("assert db1.password != app.password").is_sat());
}

#[test]
fn test_equality_of_two_absent_values_is_false() {
    assert_eq!(run("assert db1.description == gpu.description"), Outcome::Unsat);
}

#[test]
fn test_variable_not_bound_to_none_when_guarded() {
    let outcome = run("$a: Node\n$b: Node\nassert $a != $b\nassert type($b) == Database");
    assert_eq!(witness_node(&outcome, "b").as_deref(), Some("db1"));
    assert_ne!(witness_node(&outcome, "a").as_deref(), Some("db1"));
}

#[test]
fn test_node_compared_to_node_type_is_mismatch() {
    for source in [
        "assert db1 == Database",
        "assert Database != db1",
        "$n: Node\nassert $n == Compute",
    ] {
        assert!(
            matches!(compile_error(source), CompileError::TypeMismatch { .. }),
            "{source}"
        );
    }
    assert!(matches!(
        compile_error("assert db1.port == type(db1)"),
        CompileError::TypeMismatch {
            expected: Tag::Val,
            found: Tag::NodeType,
            ..
        }
    ));
}

#[test]
fn test_nested_function_argument_strings() {
    let model = model();
    let domain = model.domain();
    assert!(domain.string("public_address").is_some());
    assert!(domain.string("vm").is_some());
    assert!(domain.string("app_password").is_some());
    assert!(domain.function("get_attribute").is_some());
    assert!(run("assert app.url != app.password").is_sat());
}

#[test]
fn test_grounding_entails_concrete_values() {
    let model = model();
    let d = model.domain();
    let db1 = d.node("db1").unwrap();
    let port = d.property("port").unwrap();
    assert_eq!(model.relations().node_prop(db1, port), Some(&Val::Int(5432)));
    assert!(model
        .constraints()
        .iter()
        .any(|c| c.formula == Formula::node_prop_is(db1, port, Val::Int(5432))));

    assert!(run("assert db1.port == 5432").is_sat());
    assert_eq!(run("assert db1.port != 5432"), Outcome::Unsat);
    assert_eq!(run("assert db1.port == 5433"), Outcome::Unsat);
}

#[test]
fn test_string_only_in_assertion_is_rejected() {
    assert!(matches!(
        compile_error("$n: Node\nassert $n.password == \"hunter2\""),
        CompileError::UndeclaredString { ref value, .. } if value == "hunter2"
    ));
}

#[test]
fn test_failed_program_contributes_nothing() {
    let mut model = model();
    let before = model.constraints().to_vec();
    let program = parse("$n: Node\nassert $n.port == 1\nassert $n.port.inner == 2").unwrap();
    assert!(model.compile(&program).is_err());
    assert_eq!(model.constraints(), &before[..]);
    assert!(model.vars().is_empty());
    assert!(check(&model, CheckConfig::default()).is_sat());
}

#[test]
fn test_programs_accumulate() {
    let mut model = model();
    model
        .compile(&parse("$n: Node\nassert type($n) == Database").unwrap())
        .unwrap();
    model
        .compile(&parse("$m: Node\nassert $m.cpus == 8").unwrap())
        .unwrap();
    let outcome = check(&model, CheckConfig::default());
    assert_eq!(witness_node(&outcome, "n").as_deref(), Some("db1"));
    assert_eq!(witness_node(&outcome, "m").as_deref(), Some("gpu"));
}
