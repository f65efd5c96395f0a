//! Case conversion for schema name components
//!
//! Dots are kept as-is so dotted namespaces convert segment by segment.

use std::sync::OnceLock;

use regex::Regex;

/// `HTTPServer` -> `HTTP_Server`
fn acronym_boundary() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"([A-Z]+)([A-Z][a-z])").expect("valid acronym regex"))
}

/// `userRegistered` -> `user_Registered`
fn word_boundary() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"([a-z\d])([A-Z])").expect("valid word regex"))
}

/// Existing separators (`-`, `_`, whitespace)
fn separators() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[-_\s]+").expect("valid separator regex"))
}

fn delimit(input: &str, separator: &str) -> String {
    let marked = acronym_boundary().replace_all(input, "${1}_${2}");
    let marked = word_boundary().replace_all(&marked, "${1}_${2}");
    separators()
        .replace_all(&marked, separator)
        .to_lowercase()
}

/// `KurrentDB.UserRegistered` -> `kurrent-db.user-registered`
pub fn to_kebab_case(input: &str) -> String {
    delimit(input, "-")
}

/// `KurrentDB.UserRegistered` -> `kurrent_db.user_registered`
pub fn to_snake_case(input: &str) -> String {
    delimit(input, "_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kebab_case() {
        assert_eq!(to_kebab_case("UserRegistered"), "user-registered");
        assert_eq!(to_kebab_case("KurrentDB"), "kurrent-db");
        assert_eq!(to_kebab_case("HTTPServer"), "http-server");
        assert_eq!(to_kebab_case("user"), "user");
        assert_eq!(to_kebab_case("already-kebab"), "already-kebab");
    }

    #[test]
    fn test_snake_case() {
        assert_eq!(to_snake_case("UserRegistered"), "user_registered");
        assert_eq!(to_snake_case("userV2Registered"), "user_v2_registered");
        assert_eq!(to_snake_case("some-mixed name"), "some_mixed_name");
    }

    #[test]
    fn test_dots_are_preserved() {
        assert_eq!(
            to_kebab_case("KurrentDB.Client.Tests.Schema"),
            "kurrent-db.client.tests.schema"
        );
        assert_eq!(to_snake_case("identity.user"), "identity.user");
    }
}
