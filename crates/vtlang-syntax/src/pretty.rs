//! Pretty printer for the vtlang AST.

use crate::ast::*;
use crate::token::TokenKind;
use std::fmt::Write;

/// Pretty print a program to a string, one statement per line.
pub fn pretty_print(program: &Program) -> String {
    let mut output = String::new();
    for stmt in &program.statements {
        print_statement(&mut output, stmt);
        output.push('\n');
    }
    output
}

/// Pretty print a reference to a string.
pub fn pretty_print_ref(r: &Ref) -> String {
    let mut output = String::new();
    print_ref(&mut output, r);
    output
}

fn print_statement(out: &mut String, stmt: &Statement) {
    match stmt {
        Statement::NodeDecl(d) => {
            let _ = write!(out, "${}: Node", d.var.name);
        }
        Statement::Assert(a) => {
            out.push_str("assert ");
            print_bool_expr(out, &a.expr);
        }
    }
}

fn print_bool_expr(out: &mut String, expr: &BoolExpr) {
    print_ref(out, &expr.lhs);
    let _ = write!(out, " {} ", expr.op.symbol());
    print_ref(out, &expr.rhs);
}

fn print_ref(out: &mut String, r: &Ref) {
    match &r.kind {
        RefKind::TypeOf(inner) => {
            out.push_str("type(");
            print_ref(out, inner);
            out.push(')');
        }
        RefKind::Access { root, members } => {
            match root {
                AccessRoot::Ident(id) => print_ident(out, &id.name),
                AccessRoot::Var(id) => {
                    let _ = write!(out, "${}", id.name);
                }
            }
            for member in members {
                out.push('.');
                print_ident(out, &member.name);
            }
        }
        RefKind::Int(n) => {
            let _ = write!(out, "{}", n);
        }
        RefKind::Str(s) => print_string(out, s),
    }
}

/// Names the lexer would not read back as a single identifier get backticks.
fn print_ident(out: &mut String, name: &str) {
    let mut chars = name.chars();
    let simple = chars
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_')
        && chars.all(|c| c.is_alphanumeric() || c == '_' || c == '-')
        && TokenKind::keyword(name).is_none();
    if simple {
        out.push_str(name);
    } else {
        let _ = write!(out, "`{}`", name);
    }
}

fn print_string(out: &mut String, s: &str) {
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c => out.push(c),
        }
    }
    out.push('"');
}
