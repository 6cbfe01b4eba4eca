//! Path template expansion
//!
//! A path template is a `/`-separated string that may contain placeholders of
//! the form `${job.<key>}`. Expansion substitutes each placeholder from an
//! [`ExecutionContext`] and then normalizes separators, so the result can be
//! used directly as a blob key prefix.
//!
//! ```rust
//! use execlog_store::{ExecutionContext, expand::expand_path};
//!
//! let context = ExecutionContext::new().with_execid("42").with_project("ops");
//! assert_eq!(expand_path("/logs/${job.project}//${job.execid}", &context), "logs/ops/42");
//! ```

use crate::context::ExecutionContext;

/// Path separator used in blob keys
pub const SEPARATOR: char = '/';

/// Placeholder for the execution id, which makes every expanded path unique
pub const EXECID_PLACEHOLDER: &str = "${job.execid}";

/// Template used when no path is configured
pub const DEFAULT_PATH_FORMAT: &str = "project/${job.project}/${job.execid}";

/// The only placeholder namespace interpreted here
const JOB_NAMESPACE: &str = "job";

const PLACEHOLDER_OPEN: &str = "${";
const PLACEHOLDER_CLOSE: char = '}';

/// Expand a path template against the given context
///
/// Placeholders whose key is absent from the context expand to nothing, and
/// the separators around them are collapsed. Placeholders outside the `job`
/// namespace and unterminated `${` sequences are kept verbatim.
pub fn expand_path(format: &str, context: &ExecutionContext) -> String {
    let substituted = substitute(format.trim_start_matches(SEPARATOR), context);
    normalize(&substituted)
}

/// Replace `${job.<key>}` placeholders with context values
fn substitute(input: &str, context: &ExecutionContext) -> String {
    let mut result = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find(PLACEHOLDER_OPEN) {
        result.push_str(&rest[..start]);
        let candidate = &rest[start..];

        match parse_job_placeholder(candidate) {
            Some((key, consumed)) => {
                result.push_str(context.get(key).unwrap_or(""));
                rest = &candidate[consumed..];
            }
            None => {
                // Not ours: emit the opener and keep scanning after it
                result.push_str(PLACEHOLDER_OPEN);
                rest = &candidate[PLACEHOLDER_OPEN.len()..];
            }
        }
    }

    result.push_str(rest);
    result
}

/// Parse a `${job.<key>}` token at the start of `input`
///
/// Returns the key and the number of bytes the token spans.
fn parse_job_placeholder(input: &str) -> Option<(&str, usize)> {
    let body = input.strip_prefix(PLACEHOLDER_OPEN)?;
    let end = body.find(PLACEHOLDER_CLOSE)?;
    let inner = &body[..end];

    if inner.contains(PLACEHOLDER_OPEN) {
        return None;
    }

    let (namespace, key) = inner.split_once('.')?;
    if namespace != JOB_NAMESPACE || key.is_empty() {
        return None;
    }

    Some((key, PLACEHOLDER_OPEN.len() + end + 1))
}

/// Collapse runs of separators and drop any leading separator
fn normalize(path: &str) -> String {
    let mut result = String::with_capacity(path.len());
    let mut previous_was_separator = true;

    for c in path.chars() {
        if c == SEPARATOR {
            if !previous_was_separator {
                result.push(c);
            }
            previous_was_separator = true;
        } else {
            result.push(c);
            previous_was_separator = false;
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_context() -> ExecutionContext {
        ExecutionContext::new()
            .with_execid("testexecid")
            .with_project("testproject")
            .with_url("http://rundeck:4440/execution/9/show")
            .with_server_url("http://rundeck:4440")
            .with_server_uuid("123")
    }

    #[test]
    fn test_leading_slash_is_removed() {
        assert_eq!(expand_path("/foo", &test_context()), "foo");
        assert_eq!(expand_path("///foo", &test_context()), "foo");
    }

    #[test]
    fn test_repeated_slashes_collapsed() {
        assert_eq!(
            expand_path("/foo//bar///test", &test_context()),
            "foo/bar/test"
        );
    }

    #[test]
    fn test_expand_execid() {
        assert_eq!(
            expand_path("foo/${job.execid}/bar", &test_context()),
            "foo/testexecid/bar"
        );
    }

    #[test]
    fn test_expand_project() {
        assert_eq!(
            expand_path("foo/${job.project}/bar", &test_context()),
            "foo/testproject/bar"
        );
    }

    #[test]
    fn test_missing_key_removes_segment() {
        assert_eq!(expand_path("foo/${job.id}/bar", &test_context()), "foo/bar");
    }

    #[test]
    fn test_expand_job_id() {
        let context = test_context().with_id("testjobid");
        assert_eq!(
            expand_path("foo/${job.id}/bar", &context),
            "foo/testjobid/bar"
        );
    }

    #[test]
    fn test_expand_group_and_name() {
        let context = test_context().with_group("ops/nightly").with_name("backup");
        assert_eq!(
            expand_path("${job.group}/${job.name}/${job.execid}", &context),
            "ops/nightly/backup/testexecid"
        );

        // Ungrouped job
        assert_eq!(
            expand_path("${job.group}/${job.name}/${job.execid}", &test_context()),
            "testexecid"
        );
    }

    #[test]
    fn test_repeated_placeholder() {
        assert_eq!(
            expand_path("${job.execid}/${job.execid}", &test_context()),
            "testexecid/testexecid"
        );
    }

    #[test]
    fn test_other_namespace_passes_through() {
        assert_eq!(
            expand_path("logs/${option.env}/${job.execid}", &test_context()),
            "logs/${option.env}/testexecid"
        );
    }

    #[test]
    fn test_malformed_placeholders_pass_through() {
        let context = test_context();

        assert_eq!(expand_path("logs/${job.execid", &context), "logs/${job.execid");
        assert_eq!(expand_path("logs/${job}/x", &context), "logs/${job}/x");
        assert_eq!(expand_path("logs/${job.}/x", &context), "logs/${job.}/x");
        assert_eq!(expand_path("a$b{c}", &context), "a$b{c}");
    }

    #[test]
    fn test_nested_opener_still_expands_inner_placeholder() {
        assert_eq!(
            expand_path("logs/${x ${job.execid}", &test_context()),
            "logs/${x testexecid"
        );
    }

    #[test]
    fn test_empty_format() {
        assert_eq!(expand_path("", &test_context()), "");
        assert_eq!(expand_path("///", &test_context()), "");
    }

    #[test]
    fn test_substituted_leading_separator_is_removed() {
        let context = test_context().with_group("/ops");
        assert_eq!(
            expand_path("${job.group}/${job.execid}", &context),
            "ops/testexecid"
        );
    }

    #[test]
    fn test_default_format() {
        assert_eq!(
            expand_path(DEFAULT_PATH_FORMAT, &test_context()),
            "project/testproject/testexecid"
        );
    }

    #[test]
    fn test_never_leading_or_doubled_separator() {
        let contexts = [
            ExecutionContext::new(),
            test_context(),
            test_context().with_execid("").with_group("//a//b//"),
            test_context().with_name("/").with_id("x/"),
        ];
        let formats = [
            "",
            "/",
            "//a//",
            "${job.execid}/",
            "/${job.group}/${job.name}/${job.id}/${job.execid}",
            "${job.id}//${job.group}///end",
            "a/${job.missing}/${job.name}//b",
            DEFAULT_PATH_FORMAT,
        ];

        for context in &contexts {
            for format in formats {
                let expanded = expand_path(format, context);
                assert!(
                    !expanded.starts_with(SEPARATOR),
                    "{format:?} expanded to {expanded:?}"
                );
                assert!(
                    !expanded.contains("//"),
                    "{format:?} expanded to {expanded:?}"
                );
            }
        }
    }
}
