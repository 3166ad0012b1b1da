use std::time::Duration;

use serde::Serialize;
use serde_json::{json, Value};

use crate::article;
use crate::normalize;
use crate::pipeline::PipelineContext;
use crate::target::TargetConfig;
use crate::utils::shell;

/// Minimum generated-content length (in characters) for the article stage
/// to count as a pass. Anything shorter is a stub or an error page.
pub const MIN_ARTICLE_CHARS: usize = 100;

const TOKEN_PATHS: &[&[&str]] = &[&["token"], &["data", "token"]];
const ID_PATHS: &[&[&str]] = &[&["id"], &["data", "id"]];

/// Captured output of one remote command.
#[derive(Debug, Clone, Default)]
pub struct ExecOutput {
    pub stdout: String,
    pub stderr: String,
}

/// The remote command channel the pipeline runs on. Production uses
/// `ssh::SshClient`; tests script it.
pub trait RemoteExecutor {
    fn execute(&self, command: &str, timeout: Duration) -> ExecOutput;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    Succeeded,
    Failed,
    Skipped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageKind {
    Auth,
    CreateProject,
    AnalyzeKeyword,
    GenerateOutline,
    GenerateArticle,
    QualityCheck,
    ListArticles,
}

#[derive(Debug, Clone, Copy)]
pub struct StageSpec {
    pub id: &'static str,
    pub name: &'static str,
    pub timeout: Duration,
    pub kind: StageKind,
    /// Stages whose produced values this stage reads. Soft: a missing value
    /// degrades the request, it does not block it.
    pub needs: &'static [&'static str],
}

/// The fixed stage sequence. Order matters: later stages consume values the
/// orchestrator harvested from earlier ones.
pub const STAGES: [StageSpec; 7] = [
    StageSpec {
        id: "auth",
        name: "Register & Login",
        timeout: Duration::from_secs(180),
        kind: StageKind::Auth,
        needs: &[],
    },
    StageSpec {
        id: "project",
        name: "Create Project",
        timeout: Duration::from_secs(180),
        kind: StageKind::CreateProject,
        needs: &["auth"],
    },
    StageSpec {
        id: "keyword",
        name: "Keyword Analysis",
        timeout: Duration::from_secs(180),
        kind: StageKind::AnalyzeKeyword,
        needs: &["auth"],
    },
    StageSpec {
        id: "outline",
        name: "Outline Generation",
        timeout: Duration::from_secs(130),
        kind: StageKind::GenerateOutline,
        needs: &["project"],
    },
    StageSpec {
        id: "article",
        name: "Article Generation",
        timeout: Duration::from_secs(310),
        kind: StageKind::GenerateArticle,
        needs: &["project", "outline"],
    },
    StageSpec {
        id: "quality",
        name: "Quality Check",
        timeout: Duration::from_secs(130),
        kind: StageKind::QualityCheck,
        needs: &["article"],
    },
    StageSpec {
        id: "list",
        name: "Article List",
        timeout: Duration::from_secs(180),
        kind: StageKind::ListArticles,
        needs: &["auth", "project"],
    },
];

/// Commands for one stage: zero or more setup commands whose output is
/// ignored (account registration, payload upload), then the request whose
/// response is judged.
#[derive(Debug, Clone)]
pub struct StagePlan {
    pub setup: Vec<String>,
    pub request: String,
}

#[derive(Debug, Clone)]
pub struct StageResult {
    pub stage: String,
    pub name: String,
    pub status: StageStatus,
    pub raw_output: String,
    pub parsed: Option<Value>,
    pub error_text: Option<String>,
}

impl StageResult {
    pub fn succeeded(&self) -> bool {
        self.status == StageStatus::Succeeded
    }

    pub fn skipped(spec: &StageSpec) -> Self {
        Self {
            stage: spec.id.to_string(),
            name: spec.name.to_string(),
            status: StageStatus::Skipped,
            raw_output: String::new(),
            parsed: None,
            error_text: None,
        }
    }
}

impl StageKind {
    pub fn plan(&self, ctx: &PipelineContext, target: &TargetConfig) -> StagePlan {
        let base = target.base_url.as_str();
        let auth = auth_header(ctx);

        match self {
            StageKind::Auth => StagePlan {
                setup: vec![curl_post_json(
                    base,
                    "/api/auth/register",
                    "",
                    &json!({"email": ctx.email, "password": ctx.password, "name": "Pipeline Probe"}),
                    None,
                )],
                request: curl_post_json(
                    base,
                    "/api/auth/login",
                    "",
                    &json!({"email": ctx.email, "password": ctx.password}),
                    None,
                ),
            },
            StageKind::CreateProject => StagePlan {
                setup: Vec::new(),
                request: curl_post_json(
                    base,
                    "/api/projects",
                    &auth,
                    &json!({"name": "Pipeline Probe Project", "description": "End-to-end verification run"}),
                    None,
                ),
            },
            StageKind::AnalyzeKeyword => StagePlan {
                setup: Vec::new(),
                request: curl_post_json(
                    base,
                    "/api/research/analyze-keyword",
                    &auth,
                    &json!({"keyword": ctx.keyword}),
                    None,
                ),
            },
            StageKind::GenerateOutline => StagePlan {
                setup: Vec::new(),
                request: curl_post_json(
                    base,
                    "/api/articles/generate-outline",
                    "",
                    &json!({"keyword": ctx.keyword, "projectId": ctx.project_id()}),
                    Some(120),
                ),
            },
            StageKind::GenerateArticle => StagePlan {
                setup: vec![upload_payload_command(ctx, target)],
                request: format!(
                    "curl -s -m 300 -X POST {}/api/articles/generate -H 'Content-Type: application/json' -d @{}",
                    base,
                    shell::quote_path(&target.payload_path)
                ),
            },
            StageKind::QualityCheck => StagePlan {
                setup: Vec::new(),
                request: curl_post_json(
                    base,
                    &format!(
                        "/api/articles/{}/quality-check",
                        ctx.article_id.as_deref().unwrap_or_default()
                    ),
                    &auth,
                    &json!({}),
                    Some(120),
                ),
            },
            StageKind::ListArticles => {
                let url = format!("{}/api/articles?project_id={}", base, ctx.project_id());
                StagePlan {
                    setup: Vec::new(),
                    request: format!("curl -s {} {}", shell::quote_arg(&url), auth)
                        .trim_end()
                        .to_string(),
                }
            }
        }
    }

    fn predicate(&self, parsed: Option<&Value>) -> bool {
        match self {
            StageKind::Auth => parsed
                .and_then(|v| normalize::lookup_str(v, TOKEN_PATHS))
                .is_some_and(|token| !token.is_empty()),
            StageKind::CreateProject => parsed
                .and_then(|v| normalize::lookup_id(v, ID_PATHS))
                .is_some(),
            StageKind::AnalyzeKeyword | StageKind::GenerateOutline => {
                parsed.is_some_and(|v| !normalize::has_error_field(v))
            }
            StageKind::GenerateArticle => parsed
                .map(article::article_value)
                .map(article::extract)
                .is_some_and(|a| !a.content_text.is_empty() && a.char_count > MIN_ARTICLE_CHARS),
            StageKind::QualityCheck | StageKind::ListArticles => {
                parsed.is_some_and(|v| !normalize::text_contains_error(v))
            }
        }
    }
}

/// Run one stage to completion. Never fails the caller: transport problems,
/// undecodable bodies, and service-reported errors all land in the result's
/// status.
pub fn run(
    spec: &StageSpec,
    ctx: &PipelineContext,
    target: &TargetConfig,
    executor: &dyn RemoteExecutor,
) -> StageResult {
    let plan = spec.kind.plan(ctx, target);

    for command in &plan.setup {
        executor.execute(command, spec.timeout);
    }

    let output = executor.execute(&plan.request, spec.timeout);
    let parsed = normalize::parse(&output.stdout).into_json();

    let status = if spec.kind.predicate(parsed.as_ref()) {
        StageStatus::Succeeded
    } else {
        StageStatus::Failed
    };

    StageResult {
        stage: spec.id.to_string(),
        name: spec.name.to_string(),
        status,
        raw_output: output.stdout,
        parsed,
        error_text: (!output.stderr.is_empty()).then(|| output.stderr),
    }
}

pub fn token_from(parsed: &Value) -> Option<String> {
    normalize::lookup_str(parsed, TOKEN_PATHS)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

pub fn project_id_from(parsed: &Value) -> Option<String> {
    normalize::lookup_id(parsed, ID_PATHS)
}

fn auth_header(ctx: &PipelineContext) -> String {
    match &ctx.auth_token {
        Some(token) => format!(
            "-H {} ",
            shell::quote_arg(&format!("Authorization: Bearer {}", token))
        ),
        None => String::new(),
    }
}

fn curl_post_json(
    base: &str,
    path: &str,
    auth: &str,
    body: &Value,
    max_time: Option<u32>,
) -> String {
    let mut command = String::from("curl -s ");
    if let Some(secs) = max_time {
        command.push_str(&format!("-m {} ", secs));
    }
    command.push_str(&format!("-X POST {}{} ", base, path));
    command.push_str(auth);
    command.push_str("-H 'Content-Type: application/json' ");
    command.push_str(&format!("-d {}", shell::quote_arg(&body.to_string())));
    command
}

/// Write the generation payload to the target's temp path. A quoted heredoc
/// avoids escaping the JSON (and its CJK content) through the remote shell.
fn upload_payload_command(ctx: &PipelineContext, target: &TargetConfig) -> String {
    let payload = json!({
        "keyword": ctx.keyword,
        "projectId": ctx.project_id(),
        "outline": ctx.outline.clone().unwrap_or_else(|| json!({})),
        "contentBrief": {
            "keyword": ctx.keyword,
            "contentType": "blog",
            "audience": "一般大眾",
            "tone": "professional",
            "targetWordCount": 2000
        }
    });

    format!(
        "cat > {} << 'EOFPAYLOAD'\n{}\nEOFPAYLOAD",
        shell::quote_path(&target.payload_path),
        payload
    )
}
