//! Command-template placeholder substitution (spec §4.1 step 4).
//!
//! Pure function of `(command_template, time_limit, test_file_name,
//! code_file_name)` — the spec's testable law is exactly this: same
//! inputs always produce identical argv.

use crate::models::run::placeholders;

/// Substitute `$TIME_LIMIT`/`$TEST_FILE`/`$MAIN_FILE` into a command
/// template, cloning it into a fresh argv.
///
/// Tokens exactly equal to a placeholder are replaced wholesale. Tokens
/// that merely *contain* `$TIME_LIMIT` as a substring (e.g. compound
/// tokens like `"timeout $TIME_LIMIT cmd"`) get the first occurrence
/// replaced textually; `$TEST_FILE`/`$MAIN_FILE` are not substring-matched.
pub fn substitute(
    command_template: &[String],
    time_limit: &str,
    test_file_name: &str,
    code_file_name: &str,
) -> Vec<String> {
    command_template
        .iter()
        .map(|token| substitute_token(token, time_limit, test_file_name, code_file_name))
        .collect()
}

fn substitute_token(token: &str, time_limit: &str, test_file_name: &str, code_file_name: &str) -> String {
    if token == placeholders::TIME_LIMIT {
        return time_limit.to_string();
    }
    if token == placeholders::TEST_FILE {
        return test_file_name.to_string();
    }
    if token == placeholders::MAIN_FILE {
        return code_file_name.to_string();
    }
    if token.contains(placeholders::TIME_LIMIT) {
        return token.replacen(placeholders::TIME_LIMIT, time_limit, 1);
    }
    token.to_string()
}
