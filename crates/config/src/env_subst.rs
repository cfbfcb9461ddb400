/// Replace `${ENV_VAR}` and `${ENV_VAR:-fallback}` placeholders in a raw config string.
///
/// Unset variables without a fallback are left as-is so the parse error (if
/// any) points at the placeholder.
pub fn substitute_env(input: &str) -> String {
    substitute_with(input, |name| std::env::var(name).ok())
}

fn substitute_with(input: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut result = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("${") {
        result.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            // Unterminated: emit the remainder literally.
            result.push_str(&rest[start..]);
            return result;
        };
        let body = &after[..end];
        let (name, fallback) = match body.split_once(":-") {
            Some((name, fallback)) => (name, Some(fallback)),
            None => (body, None),
        };

        match (lookup(name), fallback) {
            (Some(val), _) => result.push_str(&val),
            (_, Some(fallback)) => result.push_str(fallback),
            _ => {
                result.push_str("${");
                result.push_str(body);
                result.push('}');
            },
        }
        rest = &after[end + 1..];
    }

    result.push_str(rest);
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fake(name: &str) -> Option<String> {
        (name == "TABULA_TEST_PORT").then(|| "4000".to_string())
    }

    #[test]
    fn substitutes_known_var() {
        assert_eq!(
            substitute_with("port = ${TABULA_TEST_PORT}", fake),
            "port = 4000"
        );
    }

    #[test]
    fn leaves_unknown_var() {
        assert_eq!(
            substitute_with("${TABULA_NONEXISTENT_XYZ}", fake),
            "${TABULA_NONEXISTENT_XYZ}"
        );
    }

    #[test]
    fn uses_fallback_when_unset() {
        assert_eq!(
            substitute_with("bind = \"${TABULA_BIND:-0.0.0.0}\"", fake),
            "bind = \"0.0.0.0\""
        );
        assert_eq!(substitute_with("${TABULA_TEST_PORT:-1}", fake), "4000");
    }

    #[test]
    fn unterminated_is_literal() {
        assert_eq!(substitute_with("a ${OOPS", fake), "a ${OOPS");
    }

    #[test]
    fn reads_process_environment() {
        let path = std::env::var("PATH").unwrap_or_default();
        assert_eq!(substitute_env("${PATH}"), path);
    }

    #[test]
    fn no_placeholders() {
        assert_eq!(substitute_env("plain text"), "plain text");
    }
}
