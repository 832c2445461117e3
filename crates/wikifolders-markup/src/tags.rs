//! Primitive string rewrites
//!
//! Two operations, both returning a new string and a replacement count:
//! - [`replace_occurrences`]: literal, case-sensitive, non-overlapping
//! - [`replace_tag_pair`]: delimiter pairs, tolerant of unmatched tags
//!
//! Pairing rules for [`replace_tag_pair`]:
//! - identical start and end delimiters pair sequentially (1st with 2nd,
//!   3rd with 4th, ...), so they never nest
//! - distinct delimiters pair like brackets; an end closes the most
//!   recent open start, so same-kind pairs may nest
//! - an unmatched start or end stays in the output verbatim

use regex::{Captures, Regex};
use tracing::warn;

/// Result of a rewrite pass.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Rewrite {
    /// The rewritten text.
    pub text: String,
    /// Number of literal occurrences or delimiter pairs replaced.
    pub replacements: usize,
    /// Number of delimiters left in place because they had no partner.
    pub unmatched: usize,
}

impl Rewrite {
    fn unchanged(input: &str) -> Self {
        Self {
            text: input.to_string(),
            replacements: 0,
            unmatched: 0,
        }
    }

    /// Whether the pass replaced anything.
    pub fn changed(&self) -> bool {
        self.replacements > 0
    }
}

/// Replace every occurrence of `target` with `replacement`, scanning left to right.
///
/// An empty `target` matches nothing.
pub fn replace_occurrences(input: &str, target: &str, replacement: &str) -> Rewrite {
    if target.is_empty() {
        return Rewrite::unchanged(input);
    }

    let replacements = input.matches(target).count();
    if replacements == 0 {
        return Rewrite::unchanged(input);
    }

    Rewrite {
        text: input.replace(target, replacement),
        replacements,
        unmatched: 0,
    }
}

/// Replace matched `old_start`/`old_end` pairs with `new_start`/`new_end`.
///
/// Empty delimiters match nothing.
pub fn replace_tag_pair(
    input: &str,
    old_start: &str,
    old_end: &str,
    new_start: &str,
    new_end: &str,
) -> Rewrite {
    if old_start.is_empty() || old_end.is_empty() {
        return Rewrite::unchanged(input);
    }
    if old_start == old_end {
        replace_sequential_pairs(input, old_start, new_start, new_end)
    } else {
        replace_nested_pairs(input, old_start, old_end, new_start, new_end)
    }
}

/// Identical delimiters: the leftmost delimiter pairs with the next one.
fn replace_sequential_pairs(
    input: &str,
    delimiter: &str,
    new_start: &str,
    new_end: &str,
) -> Rewrite {
    let escaped = regex::escape(delimiter);
    let pattern = match Regex::new(&format!("(?s){escaped}(.*?){escaped}")) {
        Ok(pattern) => pattern,
        Err(e) => {
            warn!("Cannot build pattern for {:?}: {}", delimiter, e);
            return Rewrite {
                text: input.to_string(),
                replacements: 0,
                unmatched: input.matches(delimiter).count(),
            };
        }
    };

    let mut replacements = 0;
    let mut tail = 0;
    let text = pattern.replace_all(input, |caps: &Captures<'_>| {
        replacements += 1;
        tail = caps.get(0).map_or(tail, |m| m.end());
        format!("{new_start}{}{new_end}", &caps[1])
    });

    // Only a trailing delimiter can lack a partner
    let unmatched = input[tail..].matches(delimiter).count();
    Rewrite {
        text: text.into_owned(),
        replacements,
        unmatched,
    }
}

/// Distinct delimiters: an end closes the most recent open start.
fn replace_nested_pairs(
    input: &str,
    old_start: &str,
    old_end: &str,
    new_start: &str,
    new_end: &str,
) -> Rewrite {
    let mut open: Vec<usize> = Vec::new();
    let mut pairs: Vec<(usize, usize)> = Vec::new();
    let mut stray_ends = 0;
    let mut pos = 0;

    while pos < input.len() {
        let rest = &input[pos..];
        if !open.is_empty() && rest.starts_with(old_end) {
            if let Some(start) = open.pop() {
                pairs.push((start, pos));
            }
            pos += old_end.len();
        } else if rest.starts_with(old_start) {
            open.push(pos);
            pos += old_start.len();
        } else if rest.starts_with(old_end) {
            stray_ends += 1;
            pos += old_end.len();
        } else {
            pos += rest.chars().next().map_or(1, char::len_utf8);
        }
    }

    let unmatched = open.len() + stray_ends;
    if pairs.is_empty() {
        return Rewrite {
            text: input.to_string(),
            replacements: 0,
            unmatched,
        };
    }

    // (offset, length of the delimiter being replaced, replacement)
    let mut edits: Vec<(usize, usize, &str)> = Vec::with_capacity(pairs.len() * 2);
    for &(start, end) in &pairs {
        edits.push((start, old_start.len(), new_start));
        edits.push((end, old_end.len(), new_end));
    }
    edits.sort_unstable_by_key(|&(offset, _, _)| offset);

    let grow = pairs.len() * (new_start.len() + new_end.len());
    let mut text = String::with_capacity(input.len() + grow);
    let mut cursor = 0;
    for (offset, len, replacement) in edits {
        text.push_str(&input[cursor..offset]);
        text.push_str(replacement);
        cursor = offset + len;
    }
    text.push_str(&input[cursor..]);

    Rewrite {
        text,
        replacements: pairs.len(),
        unmatched,
    }
}
