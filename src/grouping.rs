//! Precedence grouping of flat operand/operator sequences.
//!
//! The grammar recognises `a + b * c ^ d` as a flat alternation of operands
//! and operators; [`group`] folds that sequence into a tree using a table of
//! precedence tiers and a per-operator associativity. It knows nothing
//! about expressions: callers supply a `build` function that combines two
//! operands and an operator into a new operand.

use std::fmt::Debug;
use std::iter::Peekable;
use std::vec::IntoIter;

use crate::error::GroupingError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Associativity {
    LeftToRight,
    RightToLeft,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Item<T, O> {
    Operand(T),
    Operator(O),
}

/// Fold `items` into a single operand.
///
/// `precedence` lists tiers from tightest to loosest binding. `items` must
/// alternate operand, operator, operand, ... and contain at least two
/// operands.
///
/// ```
/// use trellis::grouping::{Associativity, Item, group};
/// use trellis::error::GroupingError;
///
/// let items = vec![
///     Item::Operand("a".to_string()),
///     Item::Operator('+'),
///     Item::Operand("b".to_string()),
///     Item::Operator('*'),
///     Item::Operand("c".to_string()),
/// ];
/// let tiers: &[&[char]] = &[&['*'], &['+']];
/// let grouped = group(
///     items,
///     tiers,
///     |_| Associativity::LeftToRight,
///     |l, r, op| Ok::<_, GroupingError>(format!("({l} {op} {r})")),
/// )
/// .unwrap();
/// assert_eq!(grouped, "(a + (b * c))");
/// ```
pub fn group<T, O, E>(
    items: Vec<Item<T, O>>,
    precedence: &[&[O]],
    associativity: impl Fn(O) -> Associativity,
    mut build: impl FnMut(T, T, O) -> Result<T, E>,
) -> Result<T, E>
where
    O: Copy + PartialEq + Debug,
    E: From<GroupingError>,
{
    let total = items.len();
    let mut items = items.into_iter().enumerate();

    let first = match items.next() {
        Some((_, Item::Operand(operand))) => operand,
        Some((position, Item::Operator(_))) => {
            return Err(malformed(position, "an operand").into());
        }
        None => return Err(GroupingError::InsufficientOperands { found: 0 }.into()),
    };

    let mut rest = Vec::with_capacity(total / 2);
    while let Some((position, item)) = items.next() {
        let Item::Operator(operator) = item else {
            return Err(malformed(position, "an operator").into());
        };
        let strength = binding_strength(operator, precedence)?;
        match items.next() {
            Some((_, Item::Operand(operand))) => rest.push((operator, strength, operand)),
            Some((position, Item::Operator(_))) => {
                return Err(malformed(position, "an operand").into());
            }
            None => return Err(malformed(total, "an operand after the last operator").into()),
        }
    }
    if rest.is_empty() {
        return Err(GroupingError::InsufficientOperands { found: 1 }.into());
    }

    let mut stream = rest.into_iter().peekable();
    let grouped = climb(first, 0, &mut stream, &associativity, &mut build)?;
    log::trace!("grouped {} operands", total / 2 + 1);
    Ok(grouped)
}

/// Precedence climbing over `(operator, strength, right operand)` triples.
fn climb<T, O, E>(
    mut left: T,
    minimum: usize,
    stream: &mut Peekable<IntoIter<(O, usize, T)>>,
    associativity: &impl Fn(O) -> Associativity,
    build: &mut impl FnMut(T, T, O) -> Result<T, E>,
) -> Result<T, E>
where
    O: Copy,
{
    while let Some(&(_, strength, _)) = stream.peek() {
        if strength < minimum {
            break;
        }
        let Some((operator, strength, mut right)) = stream.next() else {
            break;
        };
        while let Some(&(next, next_strength, _)) = stream.peek() {
            if next_strength > strength {
                right = climb(right, strength + 1, stream, associativity, build)?;
            } else if next_strength == strength
                && associativity(next) == Associativity::RightToLeft
            {
                right = climb(right, strength, stream, associativity, build)?;
            } else {
                break;
            }
        }
        left = build(left, right, operator)?;
    }
    Ok(left)
}

/// Tighter tiers get larger strengths.
fn binding_strength<O: PartialEq + Debug>(
    operator: O,
    precedence: &[&[O]],
) -> Result<usize, GroupingError> {
    precedence
        .iter()
        .position(|tier| tier.contains(&operator))
        .map(|tier| precedence.len() - tier)
        .ok_or_else(|| GroupingError::UnrankedOperator {
            operator: format!("{operator:?}"),
        })
}

fn malformed(position: usize, expected: &'static str) -> GroupingError {
    GroupingError::MalformedOperatorSequence { position, expected }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TIERS: &[&[char]] = &[&['^'], &['*', '/'], &['+', '-']];

    fn assoc(op: char) -> Associativity {
        if op == '^' {
            Associativity::RightToLeft
        } else {
            Associativity::LeftToRight
        }
    }

    fn render(text: &str) -> Result<String, GroupingError> {
        let items = text
            .split_whitespace()
            .map(|token| match token {
                "^" | "*" | "/" | "+" | "-" => Item::Operator(token.chars().next().unwrap()),
                other => Item::Operand(other.to_string()),
            })
            .collect();
        group(items, TIERS, assoc, |l, r, op| Ok(format!("({l} {op} {r})")))
    }

    #[test]
    fn right_associative_operators_nest_to_the_right() {
        assert_eq!(render("4 ^ -1 ^ 2 ^ 5").unwrap(), "(4 ^ (-1 ^ (2 ^ 5)))");
    }

    #[test]
    fn left_associative_operators_fold_to_the_left() {
        assert_eq!(render("a - b + c - d").unwrap(), "(((a - b) + c) - d)");
    }

    #[test]
    fn tighter_tiers_bind_first() {
        assert_eq!(
            render("a + b * c ^ d - e").unwrap(),
            "((a + (b * (c ^ d))) - e)"
        );
        assert_eq!(render("a ^ b * c").unwrap(), "((a ^ b) * c)");
    }

    #[test]
    fn rejects_broken_alternation() {
        assert_eq!(
            render("a + + b"),
            Err(GroupingError::MalformedOperatorSequence {
                position: 2,
                expected: "an operand"
            })
        );
        assert!(matches!(
            render("a b"),
            Err(GroupingError::MalformedOperatorSequence { position: 1, .. })
        ));
        assert!(matches!(
            render("a +"),
            Err(GroupingError::MalformedOperatorSequence { position: 2, .. })
        ));
    }

    #[test]
    fn needs_two_operands() {
        assert_eq!(render("a"), Err(GroupingError::InsufficientOperands { found: 1 }));
        assert_eq!(render(""), Err(GroupingError::InsufficientOperands { found: 0 }));
    }
}
