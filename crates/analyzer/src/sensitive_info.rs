//! Regex-based sensitive-entity detection with an optional caller-supplied
//! override evaluated over a context window around each candidate match.

use std::sync::OnceLock;

use portcullis_primitives::EntityKind;
use regex::Regex;

use crate::SensitiveInfoQuery;
use crate::SensitiveInfoResult;

struct Candidate {
    kind: EntityKind,
    start: usize,
    end: usize,
}

fn email_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").unwrap())
}

fn phone_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\+?\d{1,3}[-.\s]?\(?\d{2,4}\)?[-.\s]?\d{3,4}[-.\s]?\d{3,4}").unwrap())
}

fn credit_card_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b(?:\d[ -]?){13,16}\b").unwrap())
}

fn ip_address_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b(?:[0-9]{1,3}\.){3}[0-9]{1,3}\b").unwrap())
}

fn scan_candidates(body: &str) -> Vec<Candidate> {
    let mut found = Vec::new();
    for m in email_re().find_iter(body) {
        found.push(Candidate {
            kind: EntityKind::Email,
            start: m.start(),
            end: m.end(),
        });
    }
    for m in ip_address_re().find_iter(body) {
        found.push(Candidate {
            kind: EntityKind::IpAddress,
            start: m.start(),
            end: m.end(),
        });
    }
    for m in credit_card_re().find_iter(body) {
        found.push(Candidate {
            kind: EntityKind::CreditCardNumber,
            start: m.start(),
            end: m.end(),
        });
    }
    for m in phone_re().find_iter(body) {
        // A phone-shaped match that's also already a credit-card match
        // (a bare run of digits) is ambiguous; prefer the credit-card
        // classification made above and skip the duplicate.
        if found
            .iter()
            .any(|c| c.kind == EntityKind::CreditCardNumber && c.start <= m.start() && m.end() <= c.end())
        {
            continue;
        }
        found.push(Candidate {
            kind: EntityKind::PhoneNumber,
            start: m.start(),
            end: m.end(),
        });
    }
    found
}

fn clamp_to_char_boundary(s: &str, mut idx: usize, step_back: bool) -> usize {
    idx = idx.min(s.len());
    while idx > 0 && idx < s.len() && !s.is_char_boundary(idx) {
        if step_back {
            idx -= 1;
        } else {
            idx += 1;
        }
    }
    idx
}

fn context_window(body: &str, start: usize, end: usize, window_size: u32) -> String {
    let radius = (window_size as usize).saturating_mul(16).max(16);
    let from = clamp_to_char_boundary(body, start.saturating_sub(radius), true);
    let to = clamp_to_char_boundary(body, (end + radius).min(body.len()), false);
    body[from..to].to_string()
}

pub(crate) fn detect(body: &str, query: &SensitiveInfoQuery) -> SensitiveInfoResult {
    let candidates = scan_candidates(body);

    let mut kinds: Vec<EntityKind> = Vec::new();
    for candidate in &candidates {
        let resolved = match &query.custom_detect {
            Some(custom) => {
                let window = context_window(body, candidate.start, candidate.end, query.context_window_size);
                custom(&window)
            }
            None => vec![candidate.kind],
        };
        for kind in resolved {
            if !kinds.contains(&kind) {
                kinds.push(kind);
            }
        }
    }

    if let Some(deny) = &query.deny {
        let denied = kinds.into_iter().filter(|k| deny.contains(k)).collect();
        SensitiveInfoResult {
            allowed: vec![],
            denied,
        }
    } else if let Some(allow) = &query.allow {
        let (allowed, denied) = kinds.into_iter().partition(|k| allow.contains(k));
        SensitiveInfoResult { allowed, denied }
    } else {
        SensitiveInfoResult {
            allowed: vec![],
            denied: kinds,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(allow: Option<Vec<EntityKind>>, deny: Option<Vec<EntityKind>>) -> SensitiveInfoQuery {
        SensitiveInfoQuery {
            allow,
            deny,
            context_window_size: 1,
            custom_detect: None,
        }
    }

    #[test]
    fn detects_email_by_default_as_denied() {
        let result = detect("contact me at a@example.com please", &query(None, None));
        assert_eq!(result.denied, vec![EntityKind::Email]);
        assert!(result.allowed.is_empty());
    }

    #[test]
    fn deny_list_scopes_to_named_kinds() {
        let result = detect(
            "ip is 10.0.0.1 and email a@example.com",
            &query(None, Some(vec![EntityKind::IpAddress])),
        );
        assert_eq!(result.denied, vec![EntityKind::IpAddress]);
    }

    #[test]
    fn allow_list_splits_allowed_and_denied() {
        let result = detect(
            "ip is 10.0.0.1 and email a@example.com",
            &query(Some(vec![EntityKind::Email]), None),
        );
        assert_eq!(result.allowed, vec![EntityKind::Email]);
        assert_eq!(result.denied, vec![EntityKind::IpAddress]);
    }

    #[test]
    fn custom_detect_can_veto_a_match() {
        let q = SensitiveInfoQuery {
            allow: None,
            deny: None,
            context_window_size: 1,
            custom_detect: Some(std::sync::Arc::new(|_window: &str| Vec::new())),
        };
        let result = detect("a@example.com", &q);
        assert!(result.denied.is_empty());
    }

    #[test]
    fn no_match_yields_empty_result() {
        let result = detect("nothing sensitive here", &query(None, None));
        assert_eq!(result, SensitiveInfoResult::default());
    }
}
