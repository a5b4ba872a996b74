//! Safe `{placeholder}` substitution for configured command templates.

use std::collections::HashMap;

use aosd_common::ToolError;

/// Substitute `{name}` placeholders from `values`.
///
/// Only known placeholders are substituted; a placeholder with no value is
/// an `invalid_request` error. Literal `{{`/`}}` escape to single braces.
pub fn format_template(
    template: &str,
    values: &HashMap<&str, String>,
) -> Result<String, ToolError> {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                out.push('{');
            },
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                out.push('}');
            },
            '{' => {
                let mut name = String::new();
                let mut closed = false;
                for c in chars.by_ref() {
                    if c == '}' {
                        closed = true;
                        break;
                    }
                    name.push(c);
                }
                if !closed {
                    return Err(ToolError::InvalidRequest(format!(
                        "invalid template: unclosed placeholder '{{{name}'"
                    )));
                }
                match values.get(name.as_str()) {
                    Some(value) => out.push_str(value),
                    None => {
                        return Err(ToolError::InvalidRequest(format!(
                            "missing required template value: {name}"
                        )));
                    },
                }
            },
            _ => out.push(ch),
        }
    }

    Ok(out)
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    fn values() -> HashMap<&'static str, String> {
        HashMap::from([
            ("destination", "10.0.0.1".to_string()),
            ("count", "5".to_string()),
        ])
    }

    #[test]
    fn substitutes_known_placeholders() {
        let cmd = format_template("ping {destination} count {count}", &values()).expect("ok");
        assert_eq!(cmd, "ping 10.0.0.1 count 5");
    }

    #[test]
    fn unused_values_are_fine() {
        let cmd = format_template("traceroute {destination}", &values()).expect("ok");
        assert_eq!(cmd, "traceroute 10.0.0.1");
    }

    #[test]
    fn missing_value_is_invalid_request() {
        let err = format_template("ping {target}", &values()).expect_err("missing");
        assert_eq!(err.code(), "invalid_request");
    }

    #[test]
    fn unclosed_placeholder_is_invalid() {
        assert!(format_template("ping {destination", &values()).is_err());
    }

    #[test]
    fn double_braces_escape() {
        let cmd = format_template("show {{literal}}", &values()).expect("ok");
        assert_eq!(cmd, "show {literal}");
    }
}
