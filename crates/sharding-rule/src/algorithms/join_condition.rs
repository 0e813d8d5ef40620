//! # Join Condition Analysis
//!
//! Decomposes WHERE/ON trees into top-level AND groups and collects the
//! tables connected by `column = column` predicates on sharding columns.
//!
//! A predicate tree with more than one AND group (an OR at the top) is
//! rejected outright; the caller then treats the join as not fully bound.

use std::collections::HashSet;

use crate::domain::{canonical, ColumnRef, Expression, StatementContext};
use crate::ports::SchemaResolver;

/// Split `expression` into disjunctive AND groups.
///
/// `a AND (b OR c)` yields `[[a, b], [a, c]]`; a leaf yields `[[leaf]]`.
pub fn extract_and_groups(expression: &Expression) -> Vec<Vec<&Expression>> {
    match expression {
        Expression::Binary {
            left,
            operator,
            right,
        } if is_and(operator) => {
            let lefts = extract_and_groups(left);
            let rights = extract_and_groups(right);
            let mut groups = Vec::with_capacity(lefts.len() * rights.len());
            for l in &lefts {
                for r in &rights {
                    let mut group = l.clone();
                    group.extend(r.iter().copied());
                    groups.push(group);
                }
            }
            groups
        }
        Expression::Binary {
            left,
            operator,
            right,
        } if is_or(operator) => {
            let mut groups = extract_and_groups(left);
            groups.extend(extract_and_groups(right));
            groups
        }
        _ => vec![vec![expression]],
    }
}

/// Both sides of a `column = column` predicate.
pub fn column_equality(expression: &Expression) -> Option<(&ColumnRef, &ColumnRef)> {
    match expression {
        Expression::Binary {
            left,
            operator,
            right,
        } if operator.trim() == "=" => match (left.as_ref(), right.as_ref()) {
            (Expression::Column(l), Expression::Column(r)) => Some((l, r)),
            _ => None,
        },
        _ => None,
    }
}

/// Canonical names of tables joined through qualifying column equalities.
///
/// `qualifies(table, column)` decides whether `column` is a sharding column
/// of `table` in the dimension being checked. Returns `None` when any
/// segment has an OR at the top level.
pub fn joined_tables<F>(
    statement: &StatementContext,
    schema: &dyn SchemaResolver,
    qualifies: F,
) -> Option<HashSet<String>>
where
    F: Fn(&str, &str) -> bool,
{
    let mut tables = HashSet::new();
    for segment in &statement.where_segments {
        let groups = extract_and_groups(segment);
        if groups.len() > 1 {
            return None;
        }
        for predicate in groups.into_iter().flatten() {
            let Some((left, right)) = column_equality(predicate) else {
                continue;
            };
            let (Some(left_table), Some(right_table)) = (
                schema.owning_table(left, statement),
                schema.owning_table(right, statement),
            ) else {
                continue;
            };
            if qualifies(&left_table, &left.name) && qualifies(&right_table, &right.name) {
                tables.insert(canonical(&left_table));
                tables.insert(canonical(&right_table));
            }
        }
    }
    Some(tables)
}

fn is_and(operator: &str) -> bool {
    let operator = operator.trim();
    operator.eq_ignore_ascii_case("and") || operator == "&&"
}

fn is_or(operator: &str) -> bool {
    let operator = operator.trim();
    operator.eq_ignore_ascii_case("or") || operator == "||"
}
