//! SMT-LIB 2 rendering of a symbolic model.
//!
//! The script is Z3's own rendering of the encoded solver state, framed by
//! a logic declaration and the `(check-sat)`/`(get-model)` commands so it can
//! be fed to any SMT-LIB 2 solver that supports datatypes.

use crate::encoder::Encoding;
use crate::error::SymbolicResult;
use crate::model::SymbolicModel;

/// Render the model as an SMT-LIB 2 script ending in `(get-model)`.
pub fn to_smtlib(model: &SymbolicModel) -> SymbolicResult<String> {
    let encoding = Encoding::new(model, None)?;
    let body = encoding.solver().to_string();
    let mut script = String::with_capacity(body.len() + 48);
    script.push_str("(set-logic ALL)\n");
    script.push_str(&body);
    if !body.ends_with('\n') {
        script.push('\n');
    }
    script.push_str("(check-sat)\n(get-model)\n");
    Ok(script)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::build_model;
    use crate::error::SymbolicError;
    use vtlang_syntax::parse;
    use vtlang_topology::{Topology, Value};

    const TOPOLOGY: &str = r#"{
        "node_types": [
            { "name": "Root" },
            { "name": "Database", "derived_from": "Root",
              "properties": [ { "name": "password" }, { "name": "port" },
                              { "name": "ratio", "required": false } ] }
        ],
        "nodes": [
            { "name": "db1", "type": "Database",
              "properties": { "password": { "get_input": ["db", ["pw"]] },
                              "port": -5, "ratio": 2 } }
        ]
    }"#;

    fn render(source: &str) -> String {
        let mut model = build_model(&Topology::from_json_str(TOPOLOGY).unwrap()).unwrap();
        model.compile(&parse(source).unwrap()).unwrap();
        to_smtlib(&model).unwrap()
    }

    #[test]
    fn test_script_frame() {
        let smt = render("$n: Node\nassert type($n) <: Root");
        assert!(smt.starts_with("(set-logic ALL)\n"));
        assert!(smt.ends_with("(check-sat)\n(get-model)\n"));
    }

    #[test]
    fn test_declarations() {
        let smt = render("$n: Node\nassert type($n) <: Root");
        for needle in [
            "declare-datatypes",
            "node!db1",
            "node_none",
            "type!Database",
            "type_none",
            "ss_0_db",
            "ss_1_pw",
            "func!get_input",
            "List_Val",
            "node_prop",
            "derives_from",
            "var!n!0",
        ] {
            assert!(smt.contains(needle), "missing {needle} in:\n{smt}");
        }
    }

    #[test]
    fn test_every_constraint_is_asserted() {
        let mut model = build_model(&Topology::from_json_str(TOPOLOGY).unwrap()).unwrap();
        model.compile(&parse("$n: Node\nassert $n.port == -5").unwrap()).unwrap();
        let smt = to_smtlib(&model).unwrap();
        assert!(smt.matches("(assert").count() >= model.constraints().len());
    }

    #[test]
    fn test_float_value_renders() {
        let mut topo = Topology::from_json_str(TOPOLOGY).unwrap();
        topo.nodes[0].properties.insert("ratio".into(), Value::Float(-0.5));
        let smt = to_smtlib(&build_model(&topo).unwrap()).unwrap();
        assert!(smt.contains("float"));
    }

    #[test]
    fn test_unquotable_names_rejected() {
        let mut topo = Topology::from_json_str(TOPOLOGY).unwrap();
        topo.nodes[0].name = "bad|name".into();
        let err = to_smtlib(&build_model(&topo).unwrap()).unwrap_err();
        assert!(matches!(err, SymbolicError::Smt(_)));
    }
}
