use std::time::Duration;

use serde_json::Value;
use uuid::Uuid;

use crate::logs;
use crate::stage::{self, RemoteExecutor, StageKind, StageResult, StageSpec, StageStatus, STAGES};
use crate::target::TargetConfig;
use crate::utils::shell;

const CLEANUP_TIMEOUT: Duration = Duration::from_secs(30);

/// Values produced by earlier stages and consumed by later ones. Only the
/// orchestrator writes this; stages read it when rendering their requests.
#[derive(Debug, Clone)]
pub struct PipelineContext {
    pub email: String,
    pub password: String,
    pub auth_token: Option<String>,
    pub project_id: Option<String>,
    pub keyword: String,
    pub outline: Option<Value>,
    pub article_id: Option<String>,
}

impl PipelineContext {
    pub fn new(keyword: &str) -> Self {
        let run_id = Uuid::new_v4().simple().to_string();
        Self {
            email: format!("probe_{}@flightcheck.test", &run_id[..8]),
            password: "Probe1234!".to_string(),
            auth_token: None,
            project_id: None,
            keyword: keyword.to_string(),
            outline: None,
            article_id: None,
        }
    }

    /// Project id for request rendering. Empty before the project stage has
    /// run; afterwards always set (real or fallback).
    pub fn project_id(&self) -> &str {
        self.project_id.as_deref().unwrap_or_default()
    }
}

#[derive(Debug)]
pub struct PipelineOutcome {
    pub results: Vec<StageResult>,
    pub service_log: Option<logs::LogContent>,
}

/// Drive the full stage sequence against one target.
///
/// Dependencies are soft: a failed stage never halts the run, later stages
/// degrade (empty auth header, fallback project id, empty outline). The one
/// hard precondition is the quality check, which is skipped outright when no
/// article id exists. Always returns a complete outcome.
pub fn run(target: &TargetConfig, executor: &dyn RemoteExecutor) -> PipelineOutcome {
    let mut ctx = PipelineContext::new(&target.keyword);
    let mut results = Vec::with_capacity(STAGES.len());

    for spec in &STAGES {
        if spec.kind == StageKind::QualityCheck && ctx.article_id.is_none() {
            log_status!("stage", "{}: skipped (no article id)", spec.name);
            results.push(StageResult::skipped(spec));
            continue;
        }

        log_status!("stage", "Running {} ...", spec.name);
        let result = stage::run(spec, &ctx, target, executor);
        log_status!(
            "stage",
            "{}: {}",
            spec.name,
            match result.status {
                StageStatus::Succeeded => "passed",
                StageStatus::Failed => "FAILED",
                StageStatus::Skipped => "skipped",
            }
        );

        harvest(&mut ctx, target, spec, &result);
        results.push(result);
    }

    let service_log = target
        .error_log_path
        .as_deref()
        .and_then(|path| logs::show(executor, path, 10).ok());

    // Best effort; a leftover payload file only wastes a few KB of /tmp.
    executor.execute(
        &format!("rm -f {}", shell::quote_path(&target.payload_path)),
        CLEANUP_TIMEOUT,
    );

    PipelineOutcome {
        results,
        service_log,
    }
}

/// Move stage-produced values into the context. Values are written only when
/// the producing stage succeeded; the project id additionally falls back to
/// the configured fixed id so later stages always have one.
fn harvest(ctx: &mut PipelineContext, target: &TargetConfig, spec: &StageSpec, result: &StageResult) {
    match spec.kind {
        StageKind::Auth => {
            if result.succeeded() {
                ctx.auth_token = result.parsed.as_ref().and_then(|v| stage::token_from(v));
            }
        }
        StageKind::CreateProject => {
            let created = result
                .parsed
                .as_ref()
                .filter(|_| result.succeeded())
                .and_then(|v| stage::project_id_from(v));
            ctx.project_id = match created {
                Some(id) => Some(id),
                None => {
                    log_status!("stage", "Using fallback project id {}", target.fallback_project_id);
                    Some(target.fallback_project_id.clone())
                }
            };
        }
        StageKind::GenerateOutline => {
            if result.succeeded() {
                ctx.outline = result.parsed.as_ref().and_then(|v| v.get("data")).cloned();
            }
        }
        StageKind::GenerateArticle => {
            if result.succeeded() {
                ctx.article_id = result
                    .parsed
                    .as_ref()
                    .map(crate::article::article_value)
                    .and_then(|a| crate::article::extract(a).id);
            }
        }
        StageKind::AnalyzeKeyword | StageKind::QualityCheck | StageKind::ListArticles => {}
    }
}
