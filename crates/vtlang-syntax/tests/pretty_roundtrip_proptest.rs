//! Printing a parsed program and parsing it again yields the same program text.

use proptest::prelude::*;
use vtlang_syntax::{parse, pretty_print};

fn quote(s: &str) -> String {
    let mut out = String::from("\"");
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            _ => out.push(c),
        }
    }
    out.push('"');
    out
}

fn access_strategy() -> impl Strategy<Value = String> {
    let root = prop_oneof![
        "[a-z][a-z0-9]{0,5}".prop_map(|v| format!("${v}")),
        "[A-Za-z][A-Za-z0-9_.-]{0,12}".prop_map(|n| format!("`{n}`")),
    ];
    (root, prop::collection::vec("[a-z][a-z_]{0,6}", 0..2))
        .prop_map(|(root, members)| {
            members
                .iter()
                .fold(root, |acc, member| format!("{acc}.{member}"))
        })
}

fn ref_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        access_strategy(),
        access_strategy().prop_map(|r| format!("type({r})")),
        (-10_000i64..10_000).prop_map(|n| n.to_string()),
        "[ -~]{0,10}".prop_map(|s| quote(&s)),
    ]
}

fn statement_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-z][a-z0-9]{0,5}".prop_map(|v| format!("${v}: Node")),
        (
            ref_strategy(),
            prop::sample::select(vec!["==", "!=", "<:"]),
            ref_strategy()
        )
            .prop_map(|(l, op, r)| format!("assert {l} {op} {r}")),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        .. ProptestConfig::default()
    })]

    #[test]
    fn parser_pretty_roundtrip(statements in prop::collection::vec(statement_strategy(), 0..6)) {
        let source = statements.join(";\n");
        let first = pretty_print(&parse(&source).expect("generated program should parse"));
        let second = pretty_print(&parse(&first).expect("printed program should parse"));
        prop_assert_eq!(first, second);
    }
}
