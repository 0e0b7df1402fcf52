//! Resource naming convention
//!
//! Server group names follow `app[-stack[-detail...]][-vNNN]`. The cluster is
//! the name with the push sequence stripped.

use serde::Serialize;

/// Components decoded from a server group name
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Names {
    pub app: String,
    pub cluster: String,
    pub stack: Option<String>,
    pub detail: Option<String>,
    pub sequence: Option<u32>,
}

/// Decompose a resource name into application, cluster, stack and detail.
pub fn parse_resource_name(name: &str) -> Names {
    let (cluster, sequence) = split_sequence(name);

    let mut parts = cluster.splitn(3, '-');
    let app = parts.next().unwrap_or_default().to_string();
    let stack = parts.next().filter(|s| !s.is_empty()).map(str::to_string);
    let detail = parts.next().filter(|s| !s.is_empty()).map(str::to_string);

    Names {
        app,
        cluster: cluster.to_string(),
        stack,
        detail,
        sequence,
    }
}

/// Strip a trailing `-vNNN` push sequence.
fn split_sequence(name: &str) -> (&str, Option<u32>) {
    if let Some((head, tail)) = name.rsplit_once('-')
        && let Some(digits) = tail.strip_prefix('v')
        && digits.len() == 3
        && digits.bytes().all(|b| b.is_ascii_digit())
    {
        return (head, digits.parse().ok());
    }
    (name, None)
}
