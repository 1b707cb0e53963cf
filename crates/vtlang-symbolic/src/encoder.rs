//! Z3 encoding of a symbolic model.
//!
//! The five enumerated sorts become Z3 enumeration sorts, `Val` and
//! `List_Val` are created together as mutually recursive datatypes, and
//! `node_type`, `node_prop` and `derives_from` are uninterpreted functions
//! pinned down by the grounding constraints. Member names carry a sort
//! prefix (`node!db1`) so identical names in different sorts stay distinct.

use crate::domain::{EnumSort, NodeSym, StrSym, SymbolicDomain};
use crate::error::{SymbolicError, SymbolicResult};
use crate::model::SymbolicModel;
use crate::term::{Formula, ListVal, NodeTerm, Term, TypeTerm, Val, ValTerm};
use std::collections::HashMap;
use tracing::debug;
use z3::ast::{Ast, Bool, Dynamic, Int, Real};
use z3::datatype_builder::create_datatypes;
use z3::{DatatypeAccessor, DatatypeBuilder, DatatypeSort, FuncDecl, Solver, Sort, Symbol};

// Constructor positions in the `Val` and `List_Val` datatypes.
const VAL_INT: usize = 0;
const VAL_FLOAT: usize = 1;
const VAL_STR: usize = 2;
const VAL_LIST: usize = 3;
const VAL_FUNC: usize = 4;
const VAL_NONE: usize = 5;
const LIST_NIL: usize = 0;
const LIST_CONS: usize = 1;

/// An enumeration sort with one constant per member, indexed like the
/// corresponding [`EnumSort`].
struct Z3Enum {
    sort: Sort,
    consts: Vec<Dynamic>,
}

impl Z3Enum {
    /// `names` are the constructor names of the real members; `sentinel` is
    /// appended when the sort is nullable or would otherwise be empty.
    fn new(name: &str, names: Vec<String>, sentinel: &str, nullable: bool) -> Self {
        let mut symbols: Vec<Symbol> = names.into_iter().map(Symbol::String).collect();
        if nullable || symbols.is_empty() {
            symbols.push(Symbol::String(sentinel.to_string()));
        }
        let (sort, ctors, _testers) = Sort::enumeration(Symbol::String(name.to_string()), &symbols);
        let consts = ctors.iter().map(|ctor| ctor.apply(&[])).collect();
        Self { sort, consts }
    }

    fn get(&self, index: usize, what: &str) -> SymbolicResult<&Dynamic> {
        self.consts
            .get(index)
            .ok_or_else(|| SymbolicError::Internal(format!("unknown {what} #{index}")))
    }
}

/// A symbolic model asserted into a Z3 solver.
pub struct Encoding {
    solver: Solver,
    nodes: Z3Enum,
    node_types: Z3Enum,
    properties: Z3Enum,
    strings: Z3Enum,
    functions: Z3Enum,
    val: DatatypeSort,
    list: DatatypeSort,
    node_type: FuncDecl,
    node_prop: FuncDecl,
    derives_from: FuncDecl,
    vars: Vec<Dynamic>,
    node_by_name: HashMap<String, NodeSym>,
}

impl Encoding {
    /// Declare the sorts and functions of `model` and assert every
    /// constraint, groundings first.
    pub fn new(model: &SymbolicModel, timeout_ms: Option<u64>) -> SymbolicResult<Self> {
        let domain = model.domain();
        let solver = Solver::new();
        crate::apply_solver_timeout(&solver, timeout_ms);

        let node_names = prefixed("node", domain.node_sort())?;
        let node_by_name = node_names
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), NodeSym(i as u32)))
            .chain(std::iter::once(("node_none".to_string(), domain.node_none())))
            .collect();
        let nodes = Z3Enum::new(domain.node_sort().name(), node_names, "node_none", true);
        let node_types = Z3Enum::new(
            domain.node_type_sort().name(),
            prefixed("type", domain.node_type_sort())?,
            "type_none",
            true,
        );
        let properties = Z3Enum::new(
            domain.property_sort().name(),
            prefixed("prop", domain.property_sort())?,
            "prop_empty",
            false,
        );
        let strings = Z3Enum::new(
            domain.string_sort().name(),
            string_symbols(domain)?,
            "str_empty",
            false,
        );
        let functions = Z3Enum::new(
            domain.function_sort().name(),
            prefixed("func", domain.function_sort())?,
            "func_empty",
            false,
        );

        let (val, list) = val_datatypes(&strings.sort, &functions.sort)?;
        let node_type = FuncDecl::new("node_type", &[&nodes.sort], &node_types.sort);
        let node_prop = FuncDecl::new("node_prop", &[&nodes.sort, &properties.sort], &val.sort);
        let derives_from = FuncDecl::new(
            "derives_from",
            &[&node_types.sort, &node_types.sort],
            &Sort::bool(),
        );

        let vars = model
            .vars()
            .iter()
            .enumerate()
            .map(|(i, decl)| {
                let name = quoted_name("var", &format!("{}!{i}", decl.name))?;
                Ok(Dynamic::new_const(Symbol::String(name), &nodes.sort))
            })
            .collect::<SymbolicResult<Vec<_>>>()?;

        let encoding = Self {
            solver,
            nodes,
            node_types,
            properties,
            strings,
            functions,
            val,
            list,
            node_type,
            node_prop,
            derives_from,
            vars,
            node_by_name,
        };

        for constraint in model.constraints() {
            let encoded = encoding.formula(&constraint.formula)?;
            encoding.solver.assert(&encoded);
        }
        debug!(
            vars = encoding.vars.len(),
            constraints = model.constraints().len(),
            "encoded model into Z3"
        );
        Ok(encoding)
    }

    pub fn solver(&self) -> &Solver {
        &self.solver
    }

    /// Z3 constants of the declared variables, in declaration order.
    pub fn vars(&self) -> &[Dynamic] {
        &self.vars
    }

    /// The Node-sort member a model value denotes.
    pub fn node_of(&self, value: &Dynamic) -> Option<NodeSym> {
        self.node_by_name.get(&value.decl().name()).copied()
    }

    fn formula(&self, formula: &Formula) -> SymbolicResult<Bool> {
        match formula {
            Formula::Eq(l, r) => self.eq(l, r),
            Formula::Not(f) => Ok(self.formula(f)?.not()),
            Formula::And(fs) if fs.is_empty() => Ok(Bool::from_bool(true)),
            Formula::And(fs) => {
                let conjuncts = fs
                    .iter()
                    .map(|f| self.formula(f))
                    .collect::<SymbolicResult<Vec<_>>>()?;
                Ok(Bool::and(&conjuncts))
            }
            Formula::DerivesFrom(sub, sup) => {
                let (a, b) = (self.type_term(sub)?, self.type_term(sup)?);
                self.derives_from
                    .apply(&[&a, &b])
                    .as_bool()
                    .ok_or_else(|| SymbolicError::Z3("derives_from is not Boolean".into()))
            }
        }
    }

    fn eq(&self, l: &Term, r: &Term) -> SymbolicResult<Bool> {
        if l.tag() != r.tag() {
            return Ok(Bool::from_bool(false));
        }
        let (l, r) = (self.term(l)?, self.term(r)?);
        Ok(l.eq(&r))
    }

    fn term(&self, term: &Term) -> SymbolicResult<Dynamic> {
        match term {
            Term::Node(n) => self.node_term(n),
            Term::Type(t) => self.type_term(t),
            Term::Val(ValTerm::Lit(v)) => self.val(v),
            Term::Val(ValTerm::Prop(n, p)) => {
                let node = self.node_term(n)?;
                let prop = self.properties.get(p.index(), "property")?;
                Ok(self.node_prop.apply(&[&node, prop]))
            }
        }
    }

    fn node_term(&self, term: &NodeTerm) -> SymbolicResult<Dynamic> {
        match term {
            NodeTerm::Const(n) => self.nodes.get(n.index(), "node").cloned(),
            NodeTerm::Var(id) => self
                .vars
                .get(id.index())
                .cloned()
                .ok_or_else(|| SymbolicError::Internal(format!("undeclared variable #{}", id.0))),
        }
    }

    fn type_term(&self, term: &TypeTerm) -> SymbolicResult<Dynamic> {
        match term {
            TypeTerm::Const(t) => self.node_types.get(t.index(), "node type").cloned(),
            TypeTerm::TypeOf(n) => {
                let node = self.node_term(n)?;
                Ok(self.node_type.apply(&[&node]))
            }
        }
    }

    fn val(&self, val: &Val) -> SymbolicResult<Dynamic> {
        let ctor = |i: usize| &self.val.variants[i].constructor;
        Ok(match val {
            Val::Int(n) => ctor(VAL_INT).apply(&[&Int::from_i64(*n)]),
            Val::Float(x) => ctor(VAL_FLOAT).apply(&[&real(*x)?]),
            Val::Str(s) => ctor(VAL_STR).apply(&[self.strings.get(s.index(), "string")?]),
            Val::List(items) => ctor(VAL_LIST).apply(&[&self.list(items)?]),
            Val::Func(f, args) => {
                let name = self.functions.get(f.index(), "function")?;
                ctor(VAL_FUNC).apply(&[name, &self.list(args)?])
            }
            Val::None => ctor(VAL_NONE).apply(&[]),
        })
    }

    fn list(&self, list: &ListVal) -> SymbolicResult<Dynamic> {
        let items: Vec<&Val> = list.iter().collect();
        let mut tail = self.list.variants[LIST_NIL].constructor.apply(&[]);
        for item in items.into_iter().rev() {
            let head = self.val(item)?;
            tail = self.list.variants[LIST_CONS]
                .constructor
                .apply(&[&head, &tail]);
        }
        Ok(tail)
    }
}

/// `Val` and `List_Val`, created in one call since each refers to the other.
fn val_datatypes(strings: &Sort, functions: &Sort) -> SymbolicResult<(DatatypeSort, DatatypeSort)> {
    let val = DatatypeBuilder::new("Val")
        .variant("int", vec![("int_val", DatatypeAccessor::Sort(Sort::int()))])
        .variant("float", vec![("float_val", DatatypeAccessor::Sort(Sort::real()))])
        .variant("str", vec![("str_val", DatatypeAccessor::Sort(strings.clone()))])
        .variant("list", vec![("list_val", DatatypeAccessor::Datatype("List_Val".into()))])
        .variant(
            "func",
            vec![
                ("func_name", DatatypeAccessor::Sort(functions.clone())),
                ("func_args", DatatypeAccessor::Datatype("List_Val".into())),
            ],
        )
        .variant("none", vec![]);
    let list = DatatypeBuilder::new("List_Val")
        .variant("nil", vec![])
        .variant(
            "cons",
            vec![
                ("car", DatatypeAccessor::Datatype("Val".into())),
                ("cdr", DatatypeAccessor::Datatype("List_Val".into())),
            ],
        );
    let mut sorts = create_datatypes(vec![val, list]).into_iter();
    match (sorts.next(), sorts.next()) {
        (Some(val), Some(list)) => Ok((val, list)),
        _ => Err(SymbolicError::Z3("Val/List_Val datatypes were not created".into())),
    }
}

/// Exact rational for a finite float, from its shortest decimal form.
fn real(x: f64) -> SymbolicResult<Real> {
    if !x.is_finite() {
        return Err(SymbolicError::Smt(format!("non-finite float {x}")));
    }
    let text = x.abs().to_string();
    let (whole, frac) = text.split_once('.').unwrap_or((text.as_str(), ""));
    let too_wide = || SymbolicError::Smt(format!("float {x} has no exact 64-bit rational form"));
    let num: i64 = format!("{whole}{frac}").parse().map_err(|_| too_wide())?;
    let den = 10i64
        .checked_pow(frac.len() as u32)
        .ok_or_else(too_wide)?;
    let num = if x.is_sign_negative() { -num } else { num };
    let ratio = &Real::from_int(&Int::from_i64(num)) / &Real::from_int(&Int::from_i64(den));
    Ok(ratio.simplify())
}

fn prefixed(prefix: &str, sort: &EnumSort) -> SymbolicResult<Vec<String>> {
    sort.members()
        .iter()
        .map(|member| quoted_name(prefix, member))
        .collect()
}

fn string_symbols(domain: &SymbolicDomain) -> SymbolicResult<Vec<String>> {
    domain
        .string_sort()
        .ids()
        .map(|i| {
            domain
                .string_symbol(crate::domain::StrSym(i))
                .map(str::to_string)
                .ok_or_else(|| SymbolicError::Internal(format!("no symbol for string #{i}")))
        })
        .collect()
}

/// `prefix!name`, rejecting names SMT-LIB cannot print as a quoted symbol.
fn quoted_name(prefix: &str, name: &str) -> SymbolicResult<String> {
    if name.contains('|') || name.contains('\\') {
        return Err(SymbolicError::Smt(format!(
            "name {name:?} cannot be written as a quoted symbol"
        )));
    }
    Ok(format!("{prefix}!{name}"))
}
