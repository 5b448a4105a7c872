//! The uniform MCP response envelope every endpoint returns (spec §4.7):
//! `{data, status, continuation, actions?}`.

use serde::Serialize;
use serde_json::Value;

/// Default token budget when a request doesn't specify `max_tokens`.
pub const DEFAULT_MAX_TOKENS: usize = 2000;

#[derive(Debug, Clone, Serialize)]
pub struct Envelope {
    pub data: Value,
    pub status: Status,
    pub continuation: Continuation,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<Action>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Status {
    pub code: StatusCode,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusCode {
    Success,
    PartialSuccess,
    Error,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Continuation {
    pub has_more: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Action {
    pub id: String,
    pub description: String,
}

impl Action {
    #[must_use]
    pub fn increase_limit() -> Self {
        Self {
            id: "INCREASE_LIMIT".to_string(),
            description: "Retry with a larger max_tokens to receive the full item.".to_string(),
        }
    }

    #[must_use]
    pub fn continue_fetching() -> Self {
        Self {
            id: "CONTINUE".to_string(),
            description: "More items are available; pass the continuation token to fetch them."
                .to_string(),
        }
    }
}

impl Envelope {
    /// Build a successful envelope from a `Serialize` payload.
    #[must_use]
    pub fn success(data: impl Serialize) -> Self {
        Self {
            data: serde_json::to_value(data).unwrap_or(Value::Null),
            status: Status {
                code: StatusCode::Success,
                message: "ok".to_string(),
            },
            continuation: Continuation::default(),
            actions: Vec::new(),
        }
    }

    /// Mark this envelope as a partial success because the one item
    /// returned alone exceeds the caller's token budget.
    #[must_use]
    pub fn token_limit_exceeded_but_included(mut self) -> Self {
        self.status = Status {
            code: StatusCode::PartialSuccess,
            message: "TOKEN_LIMIT_EXCEEDED_BUT_INCLUDED".to_string(),
        };
        self.actions.push(Action::increase_limit());
        self
    }

    /// Record that more items remain beyond what was returned.
    #[must_use]
    pub fn with_more(mut self, token: String) -> Self {
        self.continuation = Continuation {
            has_more: true,
            token: Some(token),
        };
        self.actions.push(Action::continue_fetching());
        self
    }

    /// Build an error envelope. `data` is `null`; `message` should describe
    /// the failure and `status_token` is the machine-readable error kind.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            data: Value::Null,
            status: Status {
                code: StatusCode::Error,
                message: message.into(),
            },
            continuation: Continuation::default(),
            actions: Vec::new(),
        }
    }
}

/// Greedily includes `items` (assumed already ranked/ordered) until the
/// running token total would exceed `max_tokens`. Always includes at least
/// the first item, even if it alone exceeds the budget — the caller is
/// expected to mark that case via [`Envelope::token_limit_exceeded_but_included`].
///
/// Returns the included items, whether any were left out, and the total
/// estimated token count of what's included.
pub fn paginate<T>(items: Vec<T>, max_tokens: usize, token_cost: impl Fn(&T) -> usize) -> (Vec<T>, bool, usize) {
    let (included, has_more, total, _next_cursor) = paginate_from(items, 0, max_tokens, token_cost);
    (included, has_more, total)
}

/// As [`paginate`], but starts after the first `skip` items — the resume
/// point named by an incoming continuation token's `cursor`.
///
/// Returns the included items, whether any remain beyond them, the total
/// estimated token count of what's included, and the cursor a follow-up
/// continuation token should carry (`skip` plus however many were included).
pub fn paginate_from<T>(
    items: Vec<T>,
    skip: usize,
    max_tokens: usize,
    token_cost: impl Fn(&T) -> usize,
) -> (Vec<T>, bool, usize, usize) {
    let remaining_count = items.len().saturating_sub(skip);
    let mut included = Vec::new();
    let mut total = 0usize;
    let mut has_more = false;

    for (index, item) in items.into_iter().skip(skip).enumerate() {
        let cost = token_cost(&item);
        if index == 0 {
            total += cost;
            included.push(item);
            continue;
        }
        if total + cost > max_tokens {
            has_more = true;
            break;
        }
        total += cost;
        included.push(item);
    }

    if included.len() < remaining_count {
        has_more = true;
    }

    let next_cursor = skip + included.len();
    (included, has_more, total, next_cursor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paginate_always_includes_first_item() {
        let (included, has_more, total) = paginate(vec![5000usize], 100, |n| *n);
        assert_eq!(included, vec![5000]);
        assert!(!has_more);
        assert_eq!(total, 5000);
    }

    #[test]
    fn paginate_stops_before_exceeding_budget() {
        let (included, has_more, total) = paginate(vec![10, 10, 10, 10], 25, |n| *n);
        assert_eq!(included, vec![10, 10]);
        assert!(has_more);
        assert_eq!(total, 20);
    }

    #[test]
    fn success_envelope_has_ok_status() {
        let envelope = Envelope::success(serde_json::json!({"a": 1}));
        assert_eq!(envelope.status.code, StatusCode::Success);
        assert!(!envelope.continuation.has_more);
    }

    #[test]
    fn paginate_from_resumes_at_the_given_cursor() {
        let items = vec![10, 10, 10, 10, 10];
        let (first, has_more, _, cursor) = paginate_from(items.clone(), 0, 25, |n| *n);
        assert_eq!(first, vec![10, 10]);
        assert!(has_more);

        let (second, has_more, _, cursor) = paginate_from(items, cursor, 25, |n| *n);
        assert_eq!(second, vec![10, 10]);
        assert!(has_more);
        assert_eq!(cursor, 4);
    }

    #[test]
    fn paginate_from_reports_no_more_once_the_tail_is_consumed() {
        let (included, has_more, _, cursor) = paginate_from(vec![1, 2, 3], 2, 100, |n| *n);
        assert_eq!(included, vec![3]);
        assert!(!has_more);
        assert_eq!(cursor, 3);
    }
}
