//! Post-action condition evaluation.
//!
//! A rendered `when` expression is evaluated with deliberately small truth
//! rules: the literal token `true`/`false`, or a single `==` comparison.
//! Anything else evaluates to `false` — a malformed expression skips the
//! action rather than failing the run.

use crate::util::strip_quotes;

/// Evaluate a rendered `when` expression.
///
/// Rules, in order:
/// 1. The trimmed expression `true` / `false` (case-insensitive) resolves
///    directly.
/// 2. Otherwise the expression is split on the *first* `==`; both sides are
///    trimmed and stripped of surrounding quotes, and the result is a
///    case-insensitive equality check.
/// 3. Any other shape is `false`.
pub fn evaluate(expr: &str) -> bool {
    let trimmed = expr.trim();
    if trimmed.eq_ignore_ascii_case("true") {
        return true;
    }
    if trimmed.eq_ignore_ascii_case("false") {
        return false;
    }
    match trimmed.split_once("==") {
        Some((lhs, rhs)) => strip_quotes(lhs).eq_ignore_ascii_case(strip_quotes(rhs)),
        None => false,
    }
}
