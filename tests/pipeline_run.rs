//! End-to-end pipeline runs against a scripted command channel.

use std::cell::RefCell;
use std::time::Duration;

use serde_json::json;

use flightcheck::pipeline;
use flightcheck::report;
use flightcheck::stage::{ExecOutput, RemoteExecutor, StageStatus};
use flightcheck::target::TargetConfig;

/// Replays canned responses: the first rule whose pattern appears in the
/// command supplies stdout. Records every command it sees.
struct ScriptedExecutor {
    rules: Vec<(&'static str, String)>,
    calls: RefCell<Vec<(String, Duration)>>,
}

impl ScriptedExecutor {
    fn new(rules: Vec<(&'static str, String)>) -> Self {
        Self {
            rules,
            calls: RefCell::new(Vec::new()),
        }
    }

    fn override_rule(mut self, pattern: &'static str, response: &str) -> Self {
        for rule in &mut self.rules {
            if rule.0 == pattern {
                rule.1 = response.to_string();
            }
        }
        self
    }

    fn commands(&self) -> Vec<String> {
        self.calls.borrow().iter().map(|(c, _)| c.clone()).collect()
    }

    fn timeout_for(&self, pattern: &str) -> Option<Duration> {
        self.calls
            .borrow()
            .iter()
            .find(|(c, _)| c.contains(pattern))
            .map(|(_, t)| *t)
    }
}

impl RemoteExecutor for ScriptedExecutor {
    fn execute(&self, command: &str, timeout: Duration) -> ExecOutput {
        self.calls
            .borrow_mut()
            .push((command.to_string(), timeout));

        let stdout = self
            .rules
            .iter()
            .find(|(pattern, _)| command.contains(pattern))
            .map(|(_, response)| response.clone())
            .unwrap_or_default();

        ExecOutput {
            stdout,
            stderr: String::new(),
        }
    }
}

fn generated_article(content_len: usize) -> String {
    // intro + section + conclusion joined by two newlines
    let intro = "a".repeat(content_len / 3);
    let section = "b".repeat(content_len / 3);
    let conclusion = "c".repeat(content_len - 2 * (content_len / 3) - 2);
    json!({"data": {"article": {
        "id": "art-55",
        "title": "Generated",
        "status": "draft",
        "content_draft": {"content": {
            "introduction": {"plain_text": intro},
            "sections": [{"plain_text": section}],
            "conclusion": {"plain_text": conclusion}
        }}
    }}})
    .to_string()
}

// Rule order matters: generate-outline must precede the generate prefix it
// contains.
fn success_rules() -> Vec<(&'static str, String)> {
    vec![
        ("/api/auth/register", "{}".to_string()),
        (
            "/api/auth/login",
            json!({"token": "jwt-abc"}).to_string(),
        ),
        (
            "/api/projects",
            json!({"data": {"id": "proj-123"}}).to_string(),
        ),
        (
            "/api/research/analyze-keyword",
            json!({"data": {"relatedKeywords": ["k1", "k2"]}}).to_string(),
        ),
        (
            "/api/articles/generate-outline",
            json!({"data": {"title": "T", "sections": [{"heading": "h1"}, {"heading": "h2"}]}})
                .to_string(),
        ),
        ("cat > ", String::new()),
        ("/api/articles/generate", generated_article(2400)),
        (
            "quality-check",
            json!({"data": {"score": 88, "passed": true}}).to_string(),
        ),
        (
            "api/articles?project_id",
            json!({"data": [{"id": "art-55"}]}).to_string(),
        ),
        ("tail -n", "ERR sample line".to_string()),
        ("rm -f", String::new()),
    ]
}

fn target() -> TargetConfig {
    serde_json::from_str(r#"{"host": "203.0.113.9", "user": "root"}"#).unwrap()
}

fn statuses(results: &[flightcheck::stage::StageResult]) -> Vec<(String, StageStatus)> {
    results
        .iter()
        .map(|r| (r.stage.clone(), r.status))
        .collect()
}

#[test]
fn all_stages_pass_on_canned_success() {
    let executor = ScriptedExecutor::new(success_rules());
    let outcome = pipeline::run(&target(), &executor);
    let report = report::aggregate(&outcome.results);

    assert_eq!(report.pass_count, 7);
    assert_eq!(report.total_count, 7);
    assert!(report.all_passed);

    let commands = executor.commands();
    assert!(commands.iter().any(|c| c.contains("/api/auth/register")));
    assert!(commands.iter().any(|c| c.contains("/api/auth/login")));
    assert!(commands
        .iter()
        .any(|c| c.contains("/api/articles/art-55/quality-check")));
}

#[test]
fn stage_timeouts_match_specs() {
    let executor = ScriptedExecutor::new(success_rules());
    pipeline::run(&target(), &executor);

    assert_eq!(
        executor.timeout_for("/api/articles/generate -H"),
        Some(Duration::from_secs(310))
    );
    assert_eq!(
        executor.timeout_for("/api/auth/login"),
        Some(Duration::from_secs(180))
    );
}

#[test]
fn missing_token_degrades_but_never_skips() {
    let executor = ScriptedExecutor::new(success_rules()).override_rule("/api/auth/login", "{}");
    let outcome = pipeline::run(&target(), &executor);
    let report = report::aggregate(&outcome.results);

    // Auth fails; everything else still runs and passes.
    assert_eq!(report.pass_count, 6);
    assert_eq!(report.total_count, 7);
    assert!(!outcome
        .results
        .iter()
        .any(|r| r.status == StageStatus::Skipped));

    let commands = executor.commands();
    let keyword_cmd = commands
        .iter()
        .find(|c| c.contains("analyze-keyword"))
        .unwrap();
    assert!(!keyword_cmd.contains("Authorization"));
    assert!(commands.iter().any(|c| c.contains("api/articles?project_id")));
}

#[test]
fn bearer_token_attached_when_available() {
    let executor = ScriptedExecutor::new(success_rules());
    pipeline::run(&target(), &executor);

    let keyword_cmd = executor
        .commands()
        .into_iter()
        .find(|c| c.contains("analyze-keyword"))
        .unwrap();
    assert!(keyword_cmd.contains("Authorization: Bearer jwt-abc"));
}

#[test]
fn failed_project_creation_uses_fallback_id() {
    let executor = ScriptedExecutor::new(success_rules())
        .override_rule("/api/projects", r#"{"error": "db down"}"#);
    let outcome = pipeline::run(&target(), &executor);
    let report = report::aggregate(&outcome.results);

    assert_eq!(report.pass_count, 6);
    assert_eq!(report.total_count, 7);

    let fallback = target().fallback_project_id;
    let commands = executor.commands();
    let outline_cmd = commands
        .iter()
        .find(|c| c.contains("generate-outline"))
        .unwrap();
    assert!(outline_cmd.contains(&fallback));
    let list_cmd = commands
        .iter()
        .find(|c| c.contains("api/articles?project_id"))
        .unwrap();
    assert!(list_cmd.contains(&fallback));
}

#[test]
fn malformed_keyword_response_fails_only_that_stage() {
    let executor = ScriptedExecutor::new(success_rules())
        .override_rule("/api/research/analyze-keyword", "<html>502 Bad Gateway</html>");
    let outcome = pipeline::run(&target(), &executor);
    let report = report::aggregate(&outcome.results);

    assert_eq!(report.pass_count, 6);
    assert_eq!(report.total_count, 7);
    assert_eq!(
        statuses(&outcome.results)
            .iter()
            .find(|(id, _)| id == "keyword")
            .unwrap()
            .1,
        StageStatus::Failed
    );
    assert!(executor
        .commands()
        .iter()
        .any(|c| c.contains("generate-outline")));
}

#[test]
fn failed_outline_defaults_payload_to_empty_object() {
    let executor = ScriptedExecutor::new(success_rules())
        .override_rule("/api/articles/generate-outline", r#"{"error": "model overloaded"}"#);
    pipeline::run(&target(), &executor);

    let payload_cmd = executor
        .commands()
        .into_iter()
        .find(|c| c.starts_with("cat > "))
        .unwrap();
    assert!(payload_cmd.contains(r#""outline":{}"#));
}

#[test]
fn short_article_fails_and_quality_is_skipped() {
    let short = json!({"data": {"article": {"id": "art-55", "content_draft": "x".repeat(50)}}});
    let executor = ScriptedExecutor::new(success_rules())
        .override_rule("/api/articles/generate", &short.to_string());
    let outcome = pipeline::run(&target(), &executor);
    let report = report::aggregate(&outcome.results);

    assert_eq!(report.pass_count, 5);
    assert_eq!(report.total_count, 6);
    assert_eq!(
        statuses(&outcome.results)
            .iter()
            .find(|(id, _)| id == "quality")
            .unwrap()
            .1,
        StageStatus::Skipped
    );
    assert!(!executor
        .commands()
        .iter()
        .any(|c| c.contains("quality-check")));
}

#[test]
fn long_article_passes_threshold() {
    let long = json!({"data": {"article": {"id": "art-55", "content_draft": "x".repeat(150)}}});
    let executor = ScriptedExecutor::new(success_rules())
        .override_rule("/api/articles/generate", &long.to_string());
    let outcome = pipeline::run(&target(), &executor);
    let report = report::aggregate(&outcome.results);

    assert_eq!(report.pass_count, 7);
    assert_eq!(report.total_count, 7);
}

#[test]
fn epilogue_tails_error_log_and_cleans_up() {
    let mut target = target();
    target.error_log_path = Some("/var/log/svc/error.log".to_string());

    let executor = ScriptedExecutor::new(success_rules());
    let outcome = pipeline::run(&target, &executor);

    let log = outcome.service_log.expect("service log captured");
    assert_eq!(log.content, "ERR sample line");
    assert_eq!(log.path, "/var/log/svc/error.log");

    assert!(executor
        .commands()
        .iter()
        .any(|c| c.contains("rm -f '/tmp/flightcheck_payload.json'")));
}
