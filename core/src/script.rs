//! Reading JSONP script bodies without a script engine.
//!
//! A conforming endpoint serves a single call expression
//! `<callee>(<json>)`, optionally preceded by the `/**/` guard comment and
//! followed by `;`. `parse_invocation` recognises that shape and decodes the
//! argument with `serde_json`. Anything else is treated as a script that
//! does not call back.

use log::debug;
use serde_json::Value;

/// A callback call found in a script body.
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    /// Dotted callee path, e.g. `fetchp._callbacks._k3j9x0a1b`.
    pub callee: String,
    /// The decoded argument; `None` for an empty argument list.
    pub argument: Option<Value>,
}

/// Parse `source` as one callback invocation.
pub fn parse_invocation(source: &str) -> Option<Invocation> {
    let mut s = source.trim();
    if let Some(rest) = s.strip_prefix("/**/") {
        s = rest.trim_start();
    }
    s = s.trim_end_matches(|c: char| c == ';' || c.is_whitespace());

    let s = s.strip_suffix(')')?;
    let open = s.find('(')?;
    let callee = s[..open].trim();
    if !is_callee_path(callee) {
        debug!("script callee {callee:?} is not a dotted identifier");
        return None;
    }

    let arg = s[open + 1..].trim();
    let argument = if arg.is_empty() {
        None
    } else {
        match serde_json::from_str(arg) {
            Ok(v) => Some(v),
            Err(e) => {
                debug!("script argument for {callee} is not JSON: {e}");
                return None;
            }
        }
    };

    Some(Invocation {
        callee: callee.to_string(),
        argument,
    })
}

/// Render the script a conforming endpoint serves for `callee` and `payload`.
pub fn render_invocation(callee: &str, payload: &Value) -> String {
    format!("/**/{callee}({payload});")
}

pub(crate) fn is_callee_path(path: &str) -> bool {
    !path.is_empty() && path.split('.').all(is_identifier)
}

fn is_identifier(segment: &str) -> bool {
    let mut chars = segment.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_plain_call() {
        let inv = parse_invocation(r#"fetchp._callbacks._abc123xyz({"a":1})"#).unwrap();
        assert_eq!(inv.callee, "fetchp._callbacks._abc123xyz");
        assert_eq!(inv.argument, Some(json!({"a": 1})));
    }

    #[test]
    fn accepts_guard_comment_semicolon_and_whitespace() {
        let inv = parse_invocation("\n/**/ cb ( [1, \"two\", null] ) ;\n").unwrap();
        assert_eq!(inv.callee, "cb");
        assert_eq!(inv.argument, Some(json!([1, "two", null])));
    }

    #[test]
    fn empty_argument_list() {
        let inv = parse_invocation("cb()").unwrap();
        assert_eq!(inv.argument, None);
    }

    #[test]
    fn argument_may_contain_parentheses() {
        let inv = parse_invocation(r#"cb({"s":"(x)"})"#).unwrap();
        assert_eq!(inv.argument, Some(json!({"s": "(x)"})));
    }

    #[test]
    fn rejects_non_calls() {
        assert!(parse_invocation("").is_none());
        assert!(parse_invocation("var x = 1;").is_none());
        assert!(parse_invocation("alert(1); cb({})").is_none());
        assert!(parse_invocation("1cb({})").is_none());
        assert!(parse_invocation("cb({'a': 1})").is_none());
    }

    #[test]
    fn render_is_parseable() {
        let script = render_invocation("ns.cb", &json!({"k": "v"}));
        assert_eq!(script, r#"/**/ns.cb({"k":"v"});"#);
        let inv = parse_invocation(&script).unwrap();
        assert_eq!(inv.callee, "ns.cb");
    }
}
