//! # Naming Pattern Derivation
//!
//! Infers the `(prefix, min suffix width, padding)` descriptor of a family
//! of physical names. Binding congruence compares suffixes relative to these
//! prefixes, so two tables with different roots (`t_order_3`,
//! `t_order_item_3`) still line up.

use crate::domain::{NamingPattern, DEFAULT_PADDING_CHAR};

/// Pattern for a family of data-source names (`ds_0`, `ds_1`, ...).
///
/// Returns `None` for an empty family.
pub fn derive_data_source_pattern<'a, I>(names: I) -> Option<NamingPattern>
where
    I: IntoIterator<Item = &'a str>,
{
    let names: Vec<&str> = names.into_iter().collect();
    let root = common_prefix(&names)?;
    let prefix = strip_numeric_suffix(root).to_string();
    Some(build(prefix, &names))
}

/// Pattern for a family of physical table names of `logic_table`.
///
/// When every name starts with the logic table name, that root is kept
/// verbatim and only the remainder loses its numeric tail, so logic names
/// that themselves end in digits survive.
pub fn derive_table_pattern<'a, I>(logic_table: &str, names: I) -> Option<NamingPattern>
where
    I: IntoIterator<Item = &'a str>,
{
    let names: Vec<&str> = names.into_iter().collect();
    let root_len = logic_table.len();
    let rooted = !names.is_empty()
        && names
            .iter()
            .all(|name| starts_with_ignore_case(name, logic_table));

    let prefix = if rooted {
        let rests: Vec<&str> = names.iter().map(|name| &name[root_len..]).collect();
        let rest_root = common_prefix(&rests)?;
        format!("{}{}", &names[0][..root_len], strip_numeric_suffix(rest_root))
    } else {
        strip_numeric_suffix(common_prefix(&names)?).to_string()
    };
    Some(build(prefix, &names))
}

fn build(prefix: String, names: &[&str]) -> NamingPattern {
    let min_suffix_width = names
        .iter()
        .map(|name| name.len().saturating_sub(prefix.len()))
        .min()
        .unwrap_or(1);
    NamingPattern::new(prefix, min_suffix_width, DEFAULT_PADDING_CHAR)
}

/// Longest case-insensitive common prefix, spelled as in the first name.
fn common_prefix<'a>(names: &[&'a str]) -> Option<&'a str> {
    let first = *names.first()?;
    let mut len = first.len();
    for name in &names[1..] {
        len = first
            .char_indices()
            .zip(name.chars())
            .take_while(|((_, a), b)| a.eq_ignore_ascii_case(b))
            .last()
            .map(|((idx, ch), _)| idx + ch.len_utf8())
            .unwrap_or(0)
            .min(len);
    }
    Some(&first[..len])
}

fn strip_numeric_suffix(name: &str) -> &str {
    name.trim_end_matches(|c: char| c.is_ascii_digit())
}

fn starts_with_ignore_case(name: &str, root: &str) -> bool {
    name.len() >= root.len()
        && name.is_char_boundary(root.len())
        && name[..root.len()].eq_ignore_ascii_case(root)
}
