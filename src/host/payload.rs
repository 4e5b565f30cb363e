//! Encoding of Lua chunks for embedding in an AppleScript invocation.
//!
//! AppleScript is the only scriptable channel into the automation host, and
//! it carries a single string result with no separate error channel. The
//! template below converts any caught AppleScript error into an ordinary
//! string prefixed with [`ERROR_SENTINEL`]; the bridge turns that prefix
//! back into a typed error.

/// Prefix marking a host-reported failure in an otherwise plain-text reply.
/// Prefix match only: a reply containing the token mid-string is data.
pub const ERROR_SENTINEL: &str = "HAMMERSPOON_ERROR:";

/// Escape a Lua chunk so it can sit inside a double-quoted AppleScript
/// literal. Backslash must be handled before the characters whose escapes
/// introduce new backslashes; the single pass below never re-escapes its
/// own output. Total over any input, including the empty string.
pub fn escape(script: &str) -> String {
    let mut out = String::with_capacity(script.len());
    for ch in script.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            _ => out.push(ch),
        }
    }
    out
}

/// Render the outer AppleScript invocation for one Lua chunk.
pub fn applescript_for(host_app: &str, script: &str) -> String {
    format!(
        "try\n\
         \ttell application \"{host_app}\" to execute lua code \"{code}\"\n\
         on error errMsg\n\
         \treturn \"{sentinel} \" & errMsg\n\
         end try",
        code = escape(script),
        sentinel = ERROR_SENTINEL,
    )
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    /// Inverse of [`escape`], used to check the round-trip property.
    fn unescape(escaped: &str) -> String {
        let mut out = String::with_capacity(escaped.len());
        let mut chars = escaped.chars();
        while let Some(ch) = chars.next() {
            if ch != '\\' {
                out.push(ch);
                continue;
            }
            match chars.next() {
                Some('\\') => out.push('\\'),
                Some('"') => out.push('"'),
                Some('n') => out.push('\n'),
                Some('r') => out.push('\r'),
                Some('t') => out.push('\t'),
                Some(other) => {
                    out.push('\\');
                    out.push(other);
                }
                None => out.push('\\'),
            }
        }
        out
    }

    #[test]
    fn escape_is_total_and_round_trips() {
        let cases = [
            "",
            "print(\"hello\")",
            "a\\b",
            "\\n",
            "\\\\\"",
            "line1\nline2\r\n\tindented",
            "adjacent\\\\\\\"\"\n\t\r",
            "local s = \"tab\\there\"",
        ];
        for case in cases {
            assert_eq!(unescape(&escape(case)), case, "round-trip failed for {case:?}");
        }
    }

    #[test]
    fn escape_handles_each_special_character() {
        assert_eq!(escape("\\"), "\\\\");
        assert_eq!(escape("\""), "\\\"");
        assert_eq!(escape("\n"), "\\n");
        assert_eq!(escape("\r"), "\\r");
        assert_eq!(escape("\t"), "\\t");
        assert_eq!(escape("plain"), "plain");
    }

    #[test]
    fn escape_does_not_reescape_earlier_output() {
        // A literal backslash followed by a literal n must not collapse
        // into a newline escape.
        assert_eq!(escape("\\n"), "\\\\n");
        assert_eq!(unescape(&escape("\\n")), "\\n");
    }

    #[test]
    fn template_targets_host_and_carries_sentinel() {
        let src = applescript_for("Hammerspoon", "return 1");
        assert!(src.contains("tell application \"Hammerspoon\" to execute lua code \"return 1\""));
        assert!(src.starts_with("try\n"));
        assert!(src.contains(&format!("return \"{ERROR_SENTINEL} \" & errMsg")));
        assert!(src.ends_with("end try"));
    }

    #[test]
    fn template_embeds_escaped_payload() {
        let src = applescript_for("Hammerspoon", "print(\"hi\")\n");
        assert!(src.contains("execute lua code \"print(\\\"hi\\\")\\n\""));
    }
}
