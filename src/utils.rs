//!
//! Utility functions shared across the crate.
//!
//! - [`replace_handlebars_with_env`] - Template substitution for environment variables
//! - [`title_case`] - Word-wise title casing used to name resources
//! - [`is_url`] / [`is_file`] - Classify OpenAPI document locations
//!

use {
    regex::{Captures, Regex},
    std::{env, path::Path, sync::LazyLock},
};

/// Regular expression pattern for matching handlebars-style environment variable references.
/// Matches patterns like `{{ VAR_NAME }}` with optional whitespace around the variable name.
/// Variable names must be uppercase letters, digits, or underscores (standard env var naming).
static HANDLEBAR_REGEXP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{\s*([A-Z0-9_]+)\s*\}\}").unwrap());

///
/// Replaces all occurrences of `{{ VAR_NAME }}` in the input string with the
/// value of the corresponding environment variable. Missing variables are
/// replaced with an empty string and a warning is logged.
///
pub fn replace_handlebars_with_env(input: &str) -> String {
    HANDLEBAR_REGEXP
        .replace_all(input, |caps: &Captures| {
            let var_name = &caps[1];
            env::var(var_name).unwrap_or_else(|_| {
                tracing::warn!(
                    variable = %var_name,
                    "Environment variable not found, substituting with empty string"
                );
                String::new()
            })
        })
        .to_string()
}

/// Title-cases a string word by word.
///
/// The first letter of every run of letters is upper-cased and the rest of the
/// run lower-cased; any non-letter (digit, `-`, `_`) starts a new run.
///
/// ```
/// use axum_openapi_plus::title_case;
///
/// assert_eq!(title_case("pet-toys"), "Pet-Toys");
/// assert_eq!(title_case("v2api"), "V2Api");
/// assert_eq!(title_case("PETS"), "Pets");
/// ```
pub fn title_case(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut in_word = false;
    for ch in input.chars() {
        if ch.is_alphabetic() {
            if in_word {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(ch);
            in_word = false;
        }
    }
    out
}

/// Returns true when `location` is an absolute URL with a scheme and a host.
///
/// ```
/// use axum_openapi_plus::is_url;
///
/// assert!(is_url("https://www.google.de"));
/// assert!(!is_url("https:/www.google.de"));
/// assert!(!is_url("specs/openapi.yaml"));
/// ```
pub fn is_url(location: &str) -> bool {
    match location.split_once("://") {
        Some((scheme, rest)) if !scheme.is_empty() && !rest.is_empty() => url::Url::parse(location)
            .map(|url| url.host().is_some())
            .unwrap_or(false),
        _ => false,
    }
}

/// Returns true when `location` names an existing regular file.
pub fn is_file(location: impl AsRef<Path>) -> bool {
    location.as_ref().is_file()
}
