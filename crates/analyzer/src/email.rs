//! Syntax and domain-shape email validation. No DNS lookups — this stays
//! local and side-effect-free, per the Analyzer interface's contract.

use portcullis_primitives::EmailReason;

use crate::{EmailCheck, EmailValidationOptions, EmailValidity};

const DISPOSABLE_DOMAINS: &[&str] = &[
    "mailinator.com",
    "10minutemail.com",
    "guerrillamail.com",
    "tempmail.com",
    "yopmail.com",
];

const FREE_PROVIDER_DOMAINS: &[&str] = &[
    "gmail.com",
    "yahoo.com",
    "hotmail.com",
    "outlook.com",
    "aol.com",
];

fn split_local_and_domain(email: &str) -> Option<(&str, &str)> {
    // Reject whitespace and require exactly one '@' with non-empty sides.
    if email.is_empty() || email.chars().any(char::is_whitespace) {
        return None;
    }
    let mut parts = email.rsplitn(2, '@');
    let domain = parts.next()?;
    let local = parts.next()?;
    if local.is_empty() || domain.is_empty() || email.matches('@').count() != 1 {
        return None;
    }
    Some((local, domain))
}

fn is_domain_literal(domain: &str) -> bool {
    domain.starts_with('[') && domain.ends_with(']')
}

fn has_top_level_domain(domain: &str) -> bool {
    match domain.rsplit_once('.') {
        Some((_, tld)) => !tld.is_empty() && tld.chars().all(|c| c.is_ascii_alphabetic()),
        None => false,
    }
}

pub(crate) fn validate(email: &str, opts: &EmailValidationOptions) -> EmailCheck {
    // Structural defects always disqualify; `block` only scopes the
    // *classification* reasons (disposable/free), which are opt-in.
    let mut invalid = Vec::new();
    let mut classified = Vec::new();

    let Some((_, domain)) = split_local_and_domain(email) else {
        return EmailCheck {
            validity: EmailValidity::Invalid,
            blocked: vec![EmailReason::Invalid],
        };
    };

    if is_domain_literal(domain) {
        if !opts.allow_domain_literal {
            invalid.push(EmailReason::Invalid);
        }
    } else if opts.require_top_level_domain && !has_top_level_domain(domain) {
        invalid.push(EmailReason::Invalid);
    }

    let domain_lower = domain.to_ascii_lowercase();
    if DISPOSABLE_DOMAINS.contains(&domain_lower.as_str()) {
        classified.push(EmailReason::Disposable);
    }
    if FREE_PROVIDER_DOMAINS.contains(&domain_lower.as_str()) {
        classified.push(EmailReason::Free);
    }
    classified.retain(|reason| opts.block.contains(reason));

    let mut blocked = invalid;
    blocked.extend(classified);

    let validity = if blocked.is_empty() {
        EmailValidity::Valid
    } else {
        EmailValidity::Invalid
    };

    EmailCheck { validity, blocked }
}
