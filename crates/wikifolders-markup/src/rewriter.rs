//! Bidirectional markup <-> HTML rewriting
//!
//! [`RULES`] is applied in order by [`to_html`] and inverted in reverse
//! order by [`to_markup`]. Longer delimiters come before their prefixes
//! (`===` before `==`, `'''` before `''`) so a short rule never splits a
//! long delimiter.
//!
//! Text outside the delimiter vocabulary is never escaped, which keeps
//! hand-written HTML intact in both directions and makes [`to_html`]
//! idempotent on its own output.

use crate::tags::{replace_occurrences, replace_tag_pair, Rewrite};
use tracing::{debug, trace};

/// A (start, end) substitution between a markup delimiter pair and an HTML tag pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagPair {
    /// Markup opening delimiter.
    pub markup_start: &'static str,
    /// Markup closing delimiter.
    pub markup_end: &'static str,
    /// HTML opening tag.
    pub html_start: &'static str,
    /// HTML closing tag.
    pub html_end: &'static str,
}

/// One step of the rewrite table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    /// Delimited span, e.g. `'''bold'''`.
    Pair(TagPair),
    /// Literal token, e.g. a line break.
    Literal {
        /// Markup form.
        markup: &'static str,
        /// HTML form.
        html: &'static str,
    },
}

const fn pair(
    markup_start: &'static str,
    markup_end: &'static str,
    html_start: &'static str,
    html_end: &'static str,
) -> Rule {
    Rule::Pair(TagPair {
        markup_start,
        markup_end,
        html_start,
        html_end,
    })
}

/// The fixed tag vocabulary, in `to_html` order.
pub const RULES: &[Rule] = &[
    pair("===", "===", "<h3>", "</h3>"),
    pair("==", "==", "<h2>", "</h2>"),
    pair("'''", "'''", "<b>", "</b>"),
    pair("''", "''", "<i>", "</i>"),
    pair("__", "__", "<u>", "</u>"),
    pair("~~", "~~", "<s>", "</s>"),
    pair("{{", "}}", "<tt>", "</tt>"),
    Rule::Literal {
        markup: "----",
        html: "<hr/>",
    },
    Rule::Literal {
        markup: "\n",
        html: "<br/>",
    },
];

impl Rule {
    fn forward(&self, input: &str) -> Rewrite {
        match self {
            Rule::Pair(p) => {
                replace_tag_pair(input, p.markup_start, p.markup_end, p.html_start, p.html_end)
            }
            Rule::Literal { markup, html } => replace_occurrences(input, markup, html),
        }
    }

    fn inverse(&self, input: &str) -> Rewrite {
        match self {
            Rule::Pair(p) => {
                replace_tag_pair(input, p.html_start, p.html_end, p.markup_start, p.markup_end)
            }
            Rule::Literal { markup, html } => replace_occurrences(input, html, markup),
        }
    }
}

/// Convert stored markup to HTML.
pub fn to_html(markup: &str) -> String {
    to_html_counted(markup).text
}

/// Convert stored markup to HTML, keeping replacement and unmatched totals.
pub fn to_html_counted(markup: &str) -> Rewrite {
    apply(markup, RULES.iter(), Rule::forward, "to_html")
}

/// Recover markup from HTML produced by [`to_html`]. Unknown HTML passes through.
pub fn to_markup(html: &str) -> String {
    to_markup_counted(html).text
}

/// Recover markup from HTML, keeping replacement and unmatched totals.
pub fn to_markup_counted(html: &str) -> Rewrite {
    apply(html, RULES.iter().rev(), Rule::inverse, "to_markup")
}

fn apply<'a>(
    input: &str,
    rules: impl Iterator<Item = &'a Rule>,
    step: fn(&Rule, &str) -> Rewrite,
    direction: &'static str,
) -> Rewrite {
    let mut total = Rewrite {
        text: input.to_string(),
        replacements: 0,
        unmatched: 0,
    };

    for rule in rules {
        let pass = step(rule, &total.text);
        trace!(?rule, replaced = pass.replacements, "{} pass", direction);
        total.replacements += pass.replacements;
        total.unmatched += pass.unmatched;
        if pass.changed() {
            total.text = pass.text;
        }
    }

    if total.unmatched > 0 {
        debug!(
            unmatched = total.unmatched,
            "{}: leaving unmatched delimiters as literal text", direction
        );
    }

    total
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_each_construct() {
        assert_eq!(to_html("'''b'''"), "<b>b</b>");
        assert_eq!(to_html("''i''"), "<i>i</i>");
        assert_eq!(to_html("==Title=="), "<h2>Title</h2>");
        assert_eq!(to_html("===Sub==="), "<h3>Sub</h3>");
        assert_eq!(to_html("__u__ ~~s~~"), "<u>u</u> <s>s</s>");
        assert_eq!(to_html("{{code}}"), "<tt>code</tt>");
        assert_eq!(to_html("a\n----\nb"), "a<br/><hr/><br/>b");
    }

    #[test]
    fn long_delimiters_are_not_split_by_prefix_rules() {
        // `'''` must win over `''`, `===` over `==`
        assert_eq!(to_html("'''x''' ''y''"), "<b>x</b> <i>y</i>");
        assert_eq!(to_html("===x=== ==y=="), "<h3>x</h3> <h2>y</h2>");
    }

    #[test]
    fn unmatched_bold_keeps_literal_text() {
        let rewrite = to_html_counted("'''never closed");
        assert_eq!(rewrite.text, "'''never closed");
        assert_eq!(rewrite.replacements, 0);
        assert!(rewrite.unmatched > 0);
    }

    #[test]
    fn inline_html_passes_through_both_ways() {
        let html = r#"<font color="red">hot</font>"#;
        assert_eq!(to_html(html), html);
        assert_eq!(to_markup(html), html);
    }

    #[test]
    fn to_markup_restores_markup() {
        let markup = "==Notes==\n'''Due:''' friday\n''draft''";
        assert_eq!(to_markup(&to_html(markup)), markup);
    }

    #[test]
    fn plain_text_is_untouched() {
        let rewrite = to_html_counted("just words");
        assert_eq!(rewrite.text, "just words");
        assert!(!rewrite.changed());
    }

    #[test]
    fn converting_html_again_is_a_no_op() {
        let html = to_html("'''a''' ''b'' {{c}}\n");
        assert_eq!(to_html(&html), html);
    }
}
