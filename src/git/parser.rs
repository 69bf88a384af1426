use crate::types::Commit;
use regex::Regex;
use std::sync::LazyLock;

/// Separator between fields of one history line
pub const FIELD_SEPARATOR: char = '|';

/// Branch reported when the refs field names none
pub const DEFAULT_BRANCH: &str = "main";

static ORIGIN_BRANCH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"origin/([^,\s()]+)").expect("origin branch pattern is valid")
});

/// Parse one `id|author|date|message|refs` line into a commit
///
/// Returns `None` for lines with fewer than four fields or an empty id.
/// The refs field may be empty or missing. A subject that itself contains the
/// separator is recovered by treating the last field as refs and everything
/// between date and refs as the message.
pub fn parse_commit_line(line: &str) -> Option<Commit> {
    let fields: Vec<&str> = line.split(FIELD_SEPARATOR).collect();
    if fields.len() < 4 {
        return None;
    }

    let id = fields[0].trim();
    if id.is_empty() {
        return None;
    }

    let (message, refs) = if fields.len() <= 5 {
        (fields[3].trim().to_string(), fields.get(4).copied().unwrap_or(""))
    } else {
        let last = fields.len() - 1;
        (fields[3..last].join("|").trim().to_string(), fields[last])
    };

    Some(Commit {
        id: id.to_string(),
        author: fields[1].trim().to_string(),
        date: fields[2].trim().to_string(),
        message,
        branch: extract_branch(refs.trim()),
    })
}

/// Pick a branch name out of a ref decoration such as
/// `HEAD -> main, origin/main, tag: v1.0`
///
/// An `origin/<name>` ref wins; otherwise the first named ref is used; if
/// there is none the result is [`DEFAULT_BRANCH`]. When a commit is the tip
/// of several branches the first match is taken.
pub fn extract_branch(refs: &str) -> String {
    if let Some(captures) = ORIGIN_BRANCH.captures(refs) {
        return strip_ref_prefix(&captures[1]).to_string();
    }

    refs.split([',', '(', ')'])
        .map(str::trim)
        .map(|token| token.strip_prefix("HEAD -> ").unwrap_or(token))
        .find(|token| !token.is_empty() && *token != "HEAD" && !token.starts_with("tag: "))
        .map(|token| strip_ref_prefix(token).to_string())
        .unwrap_or_else(|| DEFAULT_BRANCH.to_string())
}

fn strip_ref_prefix(token: &str) -> &str {
    token
        .strip_prefix("refs/heads/")
        .or_else(|| token.strip_prefix("refs/remotes/origin/"))
        .unwrap_or(token)
}
