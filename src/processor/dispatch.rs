//! Lowering of integer dispatch tables to branch structures.
//!
//! Case values that are exactly `1..N` become a binary search over nested
//! helper blocks, O(log N) comparisons per dispatch. Any other set becomes one
//! guarded branch per case, kept in source order.

use std::collections::HashSet;

use tracing::trace;

use crate::error::{CompileError, ErrorKind, Result};
use crate::model::{Location, Token};
use crate::processor::callable::Callable;
use crate::processor::datapack::{BlockId, DataPack};
use crate::processor::lexer::parse_object;
use crate::processor::score::ScoreRef;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Dense,
    Sparse,
}

/// Result of lowering one table.
#[derive(Debug, Clone, PartialEq)]
pub enum Dispatch {
    /// Call into the root of the search tree.
    Tree(String),
    /// Independent guarded branches, one per case.
    Branches(Vec<String>),
}

impl Dispatch {
    pub fn into_lines(self) -> Vec<String> {
        match self {
            Dispatch::Tree(call) => vec![call],
            Dispatch::Branches(lines) => lines,
        }
    }
}

pub fn strategy(cases: &[(u32, Callable)]) -> Strategy {
    if cases.is_empty() {
        return Strategy::Sparse;
    }
    let mut values: Vec<u32> = cases.iter().map(|(v, _)| *v).collect();
    values.sort_unstable();
    let dense = values
        .iter()
        .enumerate()
        .all(|(i, v)| usize::try_from(*v).is_ok_and(|v| v == i + 1));
    if dense { Strategy::Dense } else { Strategy::Sparse }
}

/// Parses `{1: () => {...}, 2: some.func}` keeping source order.
pub fn parse_func_map(token: &Token, namespace: &str) -> Result<Vec<(u32, Callable)>> {
    let entries = parse_object(token)?;
    if entries.is_empty() {
        return Err(CompileError::value("Function map cannot be empty", token));
    }

    let mut seen = HashSet::new();
    let mut cases = Vec::with_capacity(entries.len());
    for (key, value) in entries {
        let case = key.parse::<u32>().ok().filter(|n| *n > 0).ok_or_else(|| {
            CompileError::value(
                format!("Expected positive integer as key in function map, got '{key}'"),
                &value,
            )
        })?;
        if !seen.insert(case) {
            return Err(CompileError::value(
                format!("Duplicate key '{case}' in function map"),
                &value,
            ));
        }
        cases.push((case, Callable::from_token(&value, namespace)?));
    }
    Ok(cases)
}

/// Lowers `cases` keyed on `register`, allocating blocks under `feature`.
pub fn lower(
    pack: &mut DataPack,
    feature: &str,
    register: &ScoreRef,
    cases: &[(u32, Callable)],
    location: Location,
) -> Result<Dispatch> {
    if register.is_integer() {
        return Err(CompileError::new(
            ErrorKind::Value,
            "Cannot dispatch on an integer constant",
            location,
        ));
    }

    match strategy(cases) {
        Strategy::Dense => {
            trace!(feature, cases = cases.len(), "dense dispatch");
            let mut sorted: Vec<&(u32, Callable)> = cases.iter().collect();
            sorted.sort_by_key(|(v, _)| *v);
            let mut bodies = Vec::with_capacity(sorted.len());
            for (_, callable) in sorted {
                bodies.push(callable.body(pack)?);
            }

            let root = pack.allocate_block_id(feature);
            let mut tree = Tree {
                pack,
                feature,
                register,
                bodies,
            };
            tree.build(1, cases.len(), root);
            Ok(Dispatch::Tree(pack_call(tree.pack, feature, root)))
        }
        Strategy::Sparse => {
            trace!(feature, cases = cases.len(), "sparse dispatch");
            let mut lines = Vec::with_capacity(cases.len());
            for (value, callable) in cases {
                lines.push(guarded_branch(pack, feature, register, *value, callable)?);
            }
            Ok(Dispatch::Branches(lines))
        }
    }
}

/// `execute if score <register> matches <value> run <call>`
pub fn guarded_branch(
    pack: &mut DataPack,
    feature: &str,
    register: &ScoreRef,
    value: u32,
    callable: &Callable,
) -> Result<String> {
    let call = callable.call(pack, feature)?;
    Ok(format!("execute if score {register} matches {value} run {call}"))
}

fn pack_call(pack: &DataPack, feature: &str, id: u32) -> String {
    pack.call_function(feature, &BlockId::Index(id))
}

fn range(lo: usize, hi: usize) -> String {
    if lo == hi {
        lo.to_string()
    } else {
        format!("{lo}..{hi}")
    }
}

struct Tree<'a> {
    pack: &'a mut DataPack,
    feature: &'a str,
    register: &'a ScoreRef,
    /// Case bodies; index `n - 1` belongs to case `n`.
    bodies: Vec<Vec<String>>,
}

impl Tree<'_> {
    fn build(&mut self, lo: usize, hi: usize, id: u32) {
        if lo == hi {
            let body = std::mem::take(&mut self.bodies[lo - 1]);
            self.pack
                .add_private_function(self.feature, body, Some(BlockId::Index(id)));
            return;
        }

        let less = self.pack.allocate_block_id(self.feature);
        let more = self.pack.allocate_block_id(self.feature);
        let upper_lo = lo + (hi - lo + 1) / 2;
        let lower_hi = upper_lo - 1;

        let register = self.register;
        let lines = vec![
            format!(
                "execute if score {register} matches {} run {}",
                range(lo, lower_hi),
                pack_call(self.pack, self.feature, less)
            ),
            format!(
                "execute if score {register} matches {} run {}",
                range(upper_lo, hi),
                pack_call(self.pack, self.feature, more)
            ),
        ];
        self.pack
            .add_private_function(self.feature, lines, Some(BlockId::Index(id)));

        self.build(lo, lower_hi, less);
        self.build(upper_lo, hi, more);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::BodyLine;
    use crate::processor::lexer::single_token;

    fn named(n: u32) -> (u32, Callable) {
        (n, Callable::Named(format!("ns:case{n}")))
    }

    fn values_of(values: &[u32]) -> Vec<(u32, Callable)> {
        values.iter().map(|v| named(*v)).collect()
    }

    #[test]
    fn test_strategy_selection() {
        let test_cases = vec![
            (vec![1], Strategy::Dense),
            (vec![1, 2, 3], Strategy::Dense),
            (vec![3, 1, 2], Strategy::Dense),
            (vec![2, 3], Strategy::Sparse),
            (vec![1, 3], Strategy::Sparse),
            (vec![1, 2, 4, 5], Strategy::Sparse),
            (vec![], Strategy::Sparse),
        ];
        for (values, expected) in test_cases {
            assert_eq!(strategy(&values_of(&values)), expected, "values: {values:?}");
        }
    }

    #[test]
    fn test_dense_tree_layout() {
        let mut pack = DataPack::new("ns");
        let reg = ScoreRef::objective("obj", "@s");
        let out = lower(&mut pack, "feat", &reg, &values_of(&[2, 1, 3]), Location::default())
            .unwrap();

        assert_eq!(out, Dispatch::Tree("function ns:__private__/feat/0".into()));
        assert_eq!(
            pack.block("feat", 0u32).unwrap(),
            [
                "execute if score @s obj matches 1 run function ns:__private__/feat/1",
                "execute if score @s obj matches 2..3 run function ns:__private__/feat/2",
            ]
        );
        assert_eq!(pack.block("feat", 1u32).unwrap(), ["function ns:case1"]);
        assert_eq!(
            pack.block("feat", 2u32).unwrap(),
            [
                "execute if score @s obj matches 2 run function ns:__private__/feat/3",
                "execute if score @s obj matches 3 run function ns:__private__/feat/4",
            ]
        );
        assert_eq!(pack.block("feat", 3u32).unwrap(), ["function ns:case2"]);
        assert_eq!(pack.block("feat", 4u32).unwrap(), ["function ns:case3"]);
    }

    #[test]
    fn test_dense_leaf_count() {
        let mut pack = DataPack::new("ns");
        let reg = ScoreRef::variable("$x");
        let values: Vec<u32> = (1..=9).collect();
        lower(&mut pack, "feat", &reg, &values_of(&values), Location::default()).unwrap();
        // 9 leaves + 8 inner nodes
        assert_eq!(pack.blocks().len(), 17);
        let leaves = pack
            .blocks()
            .values()
            .filter(|lines| lines.len() == 1)
            .count();
        assert_eq!(leaves, 9);
    }

    #[test]
    fn test_sparse_keeps_source_order() {
        let mut pack = DataPack::new("ns");
        let reg = ScoreRef::objective("obj", "@s");
        let cases = vec![
            named(5),
            (
                2,
                Callable::Inline {
                    lines: vec![BodyLine {
                        text: "say two".into(),
                        location: Location::default(),
                    }],
                },
            ),
        ];
        let out = lower(&mut pack, "feat", &reg, &cases, Location::default()).unwrap();
        assert_eq!(
            out.into_lines(),
            vec![
                "execute if score @s obj matches 5 run function ns:case5".to_string(),
                "execute if score @s obj matches 2 run function ns:__private__/feat/0".into(),
            ]
        );
        assert_eq!(pack.block("feat", 0u32).unwrap(), ["say two"]);
    }

    #[test]
    fn test_integer_register_rejected() {
        let mut pack = DataPack::new("ns");
        let err = lower(
            &mut pack,
            "feat",
            &ScoreRef::Integer(3),
            &values_of(&[1]),
            Location::default(),
        )
        .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Value);
    }

    #[test]
    fn test_parse_func_map() {
        let tok = single_token("{2: () => {say b;}, 1: lib.first}", Location::new(1, 1)).unwrap();
        let cases = parse_func_map(&tok, "ns").unwrap();
        assert_eq!(cases[0].0, 2);
        assert!(matches!(cases[0].1, Callable::Inline { .. }));
        assert_eq!(cases[1], (1, Callable::Named("ns:lib/first".into())));
    }

    #[test]
    fn test_parse_func_map_errors() {
        let test_cases = vec!["{}", "{0: a}", "{x: a}", "{1: a, 1: b}", "{1: \"text\"}"];
        for src in test_cases {
            let tok = single_token(src, Location::new(1, 1)).unwrap();
            let err = parse_func_map(&tok, "ns").unwrap_err();
            assert_eq!(err.kind, ErrorKind::Value, "source: {src}");
        }
    }
}
