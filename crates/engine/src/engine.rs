//! The decision engine (spec.md §4.H): the hard core that orchestrates
//! fingerprinting, the block cache, local rule evaluation, and the
//! remote fallback.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use portcullis_analyzer::{Analyzer, LocalAnalyzer, Projection};
use portcullis_primitives::{BlockCache, Conclusion, Decision, Reason, RuleResult, RuleState};
use portcullis_rules::{LocalRuleContext, Rule, RuleKind};

use crate::client::Client;
use crate::logger::Logger;
use crate::request::{AdapterContext, Context, RequestDetails};

/// Rule lists longer than this make `protect` return an ERROR decision
/// without evaluating anything (spec.md §3 invariant).
const MAX_RULES: usize = 10;

fn now_epoch_seconds() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Resolve one configured characteristic name to a value drawn from
/// `details`. Well-known names (spec.md §6) map to intrinsic request
/// fields; anything else is a user-defined key looked up in `extra`.
/// A characteristic with no resolvable value contributes an empty
/// string rather than failing `protect` — keeping with §7's invariant
/// that only construction ever throws (see DESIGN.md).
fn resolve_characteristic(name: &str, details: &RequestDetails) -> String {
    if let Some(header_name) = extract_bracketed(name, "http.request.headers[") {
        return details
            .headers
            .get(&header_name)
            .unwrap_or_default()
            .to_string();
    }
    if let Some(cookie_name) = extract_bracketed(name, "http.request.cookie[") {
        return details
            .cookies
            .as_deref()
            .and_then(|raw| find_in_pairs(raw, ';', '=', &cookie_name))
            .unwrap_or_default();
    }
    if let Some(arg_name) = extract_bracketed(name, "http.request.uri.args[") {
        return details
            .query
            .as_deref()
            .and_then(|raw| find_in_pairs(raw, '&', '=', &arg_name))
            .unwrap_or_default();
    }
    match name {
        "ip.src" => details.ip.clone().unwrap_or_default(),
        "http.host" => details.host.clone().unwrap_or_default(),
        "http.method" => details.method.clone().unwrap_or_default(),
        "http.request.uri.path" => details.path.clone().unwrap_or_default(),
        _ => details.extra.get(name).cloned().unwrap_or_default(),
    }
}

fn extract_bracketed(name: &str, prefix: &str) -> Option<String> {
    let rest = name.strip_prefix(prefix)?;
    let inner = rest.strip_suffix(']')?;
    Some(inner.trim_matches('"').to_string())
}

fn find_in_pairs(raw: &str, entry_sep: char, kv_sep: char, key: &str) -> Option<String> {
    raw.split(entry_sep).find_map(|entry| {
        let (k, v) = entry.trim().split_once(kv_sep)?;
        (k == key).then(|| v.to_string())
    })
}

/// Construction parameters for [`Engine::new`]. `client` and `log` are
/// mandatory fields in the type itself, so the "fails if client or log
/// is absent" check from spec.md §6 is enforced by the type system
/// rather than at runtime (see DESIGN.md).
pub struct EngineConfig {
    pub key: String,
    pub rules: Vec<Rule>,
    pub characteristics: Vec<String>,
    pub client: Arc<dyn Client>,
    pub log: Arc<dyn Logger>,
    pub analyzer: Arc<dyn Analyzer>,
    pub runtime: String,
}

impl EngineConfig {
    pub fn new(key: impl Into<String>, client: Arc<dyn Client>, log: Arc<dyn Logger>) -> Self {
        Self {
            key: key.into(),
            rules: Vec::new(),
            characteristics: Vec::new(),
            client,
            log,
            analyzer: Arc::new(LocalAnalyzer::new()),
            runtime: "rust".to_string(),
        }
    }

    pub fn rules(mut self, rules: Vec<Rule>) -> Self {
        self.rules = rules;
        self
    }

    pub fn characteristics(mut self, characteristics: Vec<String>) -> Self {
        self.characteristics = characteristics;
        self
    }

    pub fn analyzer(mut self, analyzer: Arc<dyn Analyzer>) -> Self {
        self.analyzer = analyzer;
        self
    }
}

struct EngineInner {
    key: String,
    rules: Vec<Rule>,
    characteristics: Vec<String>,
    client: Arc<dyn Client>,
    log: Arc<dyn Logger>,
    analyzer: Arc<dyn Analyzer>,
    cache: Arc<BlockCache>,
    runtime: String,
}

/// The decision engine (spec.md §4.H). Cheap to clone: everything
/// behind it is `Arc`-shared, including the block cache, so a
/// `with_rule` view observes the parent's blocks (spec.md §9).
#[derive(Clone)]
pub struct Engine {
    inner: Arc<EngineInner>,
}

fn sorted_by_priority(mut rules: Vec<Rule>) -> Vec<Rule> {
    rules.sort_by_key(|r| r.priority);
    rules
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            inner: Arc::new(EngineInner {
                key: config.key,
                rules: sorted_by_priority(config.rules),
                characteristics: config.characteristics,
                client: config.client,
                log: config.log,
                analyzer: config.analyzer,
                cache: Arc::new(BlockCache::new()),
                runtime: config.runtime,
            }),
        }
    }

    pub fn rules(&self) -> &[Rule] {
        &self.inner.rules
    }

    /// Returns a new engine view whose rule list is `self.rules() ++
    /// rule`, re-sorted by priority (stable). The cache, client, and
    /// logger are shared, not duplicated.
    pub fn with_rule(&self, rule: Rule) -> Engine {
        let mut rules = self.inner.rules.clone();
        rules.push(rule);
        Engine {
            inner: Arc::new(EngineInner {
                key: self.inner.key.clone(),
                rules: sorted_by_priority(rules),
                characteristics: self.inner.characteristics.clone(),
                client: self.inner.client.clone(),
                log: self.inner.log.clone(),
                analyzer: self.inner.analyzer.clone(),
                cache: self.inner.cache.clone(),
                runtime: self.inner.runtime.clone(),
            }),
        }
    }

    async fn build_context(
        &self,
        details: &RequestDetails,
        adapter: Arc<dyn AdapterContext>,
    ) -> Context {
        let resolved: Vec<(String, String)> = self
            .inner
            .characteristics
            .iter()
            .map(|name| (name.clone(), resolve_characteristic(name, details)))
            .collect();
        let projection = Projection {
            key: self.inner.key.clone(),
            // Always folded in, regardless of whether "ip.src" is also
            // a configured characteristic (spec.md Glossary: "Fingerprint
            // — ... IP plus configured characteristics").
            ip: details.ip.clone(),
            characteristics: resolved,
        };
        let fingerprint = self.inner.analyzer.generate_fingerprint(&projection).await;
        Context {
            key: self.inner.key.clone(),
            fingerprint,
            characteristics: self.inner.characteristics.clone(),
            runtime: self.inner.runtime.clone(),
            log: self.inner.log.clone(),
            adapter,
        }
    }

    /// Implements spec.md §4.H step by step.
    pub async fn protect(
        &self,
        adapter: Arc<dyn AdapterContext>,
        request: Option<RequestDetails>,
    ) -> Decision {
        let details = request.unwrap_or_default();
        let ctx = self.build_context(&details, adapter).await;

        if self.inner.rules.len() > MAX_RULES {
            let decision = Decision::error("Only 10 rules may be specified", Vec::new());
            self.inner.client.report(&ctx, &details, &decision, &[]).await;
            return decision;
        }

        let effective_rules: Vec<Rule> = self
            .inner
            .rules
            .iter()
            .map(|r| r.with_injected_characteristics(&self.inner.characteristics))
            .collect();

        let mut results: Vec<RuleResult> = effective_rules
            .iter()
            .map(|r| RuleResult::not_run(r.id()))
            .collect();

        if effective_rules.is_empty() {
            ctx.log
                .warn("no rules configured, deferring entirely to the remote client");
            return match self
                .inner
                .client
                .decide(&ctx, &details, &effective_rules)
                .await
            {
                Ok(decision) => decision,
                Err(err) => {
                    let decision = Decision::error(err.to_string(), results);
                    self.inner
                        .client
                        .report(&ctx, &details, &decision, &effective_rules)
                        .await;
                    decision
                }
            };
        }

        if let Some(cached_reason) = self.inner.cache.get(&ctx.fingerprint) {
            let ttl = self.inner.cache.ttl(&ctx.fingerprint);
            let decision = Decision::deny(ttl, cached_reason, results);
            self.inner
                .client
                .report(&ctx, &details, &decision, &effective_rules)
                .await;
            return decision;
        }

        for (idx, rule) in effective_rules.iter().enumerate() {
            let Some(local) = rule.as_local() else {
                continue;
            };

            let body_owned = if matches!(rule.kind, RuleKind::SensitiveInfo(_)) {
                ctx.get_body().await
            } else {
                None
            };
            let local_ctx = LocalRuleContext {
                email: details.email.as_deref(),
                user_agent: details.headers.get("user-agent"),
                body: body_owned.as_deref(),
            };

            if let Err(err) = local.validate(local_ctx).await {
                results[idx] = error_result(rule.id(), &err.to_string());
                continue;
            }

            let outcome = match local.protect(self.inner.analyzer.as_ref(), local_ctx).await {
                Ok(outcome) => outcome,
                Err(err) => {
                    results[idx] = error_result(rule.id(), &err.to_string());
                    continue;
                }
            };

            results[idx] = RuleResult {
                rule_id: rule.id().to_string(),
                ttl: outcome.ttl,
                state: RuleState::Run,
                conclusion: outcome.conclusion,
                reason: outcome.reason.clone(),
            };

            if outcome.conclusion == Conclusion::Deny {
                let decision = Decision::deny(outcome.ttl, outcome.reason.clone(), results.clone());
                self.inner
                    .client
                    .report(&ctx, &details, &decision, &effective_rules)
                    .await;

                if !rule.mode.is_dry_run() {
                    if outcome.ttl > 0 {
                        self.inner.cache.set(
                            ctx.fingerprint.clone(),
                            outcome.reason,
                            now_epoch_seconds() + outcome.ttl as u64,
                        );
                    }
                    return decision;
                }
                ctx.log.warn(&format!(
                    "rule {} denied in DRY_RUN mode, overriding to continue",
                    rule.id()
                ));
            }
        }

        match self
            .inner
            .client
            .decide(&ctx, &details, &effective_rules)
            .await
        {
            Ok(decision) => {
                if decision.is_denied() && decision.ttl > 0 {
                    self.inner.cache.set(
                        ctx.fingerprint.clone(),
                        decision.reason.clone(),
                        now_epoch_seconds() + decision.ttl as u64,
                    );
                }
                decision
            }
            Err(err) => {
                let decision = Decision::error(err.to_string(), results);
                self.inner
                    .client
                    .report(&ctx, &details, &decision, &effective_rules)
                    .await;
                decision
            }
        }
    }
}

fn error_result(rule_id: &str, message: &str) -> RuleResult {
    RuleResult {
        rule_id: rule_id.to_string(),
        ttl: 0,
        state: RuleState::Run,
        conclusion: Conclusion::Error,
        reason: Reason::Error {
            message: message.to_string(),
        },
    }
}
