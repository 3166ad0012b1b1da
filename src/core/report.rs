use serde::Serialize;

use crate::stage::{StageResult, StageStatus};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StageReportLine {
    pub stage: String,
    pub name: String,
    pub status: StageStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_text: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineReport {
    pub stages: Vec<StageReportLine>,
    pub pass_count: usize,
    pub total_count: usize,
    pub all_passed: bool,
}

/// Collapse stage results into the final report. Pure: skipped stages are
/// listed but excluded from `total_count`.
pub fn aggregate(results: &[StageResult]) -> PipelineReport {
    let stages: Vec<StageReportLine> = results
        .iter()
        .map(|r| StageReportLine {
            stage: r.stage.clone(),
            name: r.name.clone(),
            status: r.status,
            error_text: r.error_text.clone(),
        })
        .collect();

    let pass_count = results.iter().filter(|r| r.succeeded()).count();
    let total_count = results
        .iter()
        .filter(|r| r.status != StageStatus::Skipped)
        .count();

    PipelineReport {
        stages,
        pass_count,
        total_count,
        all_passed: pass_count == total_count,
    }
}

/// Human-readable summary block, one line per stage plus the tally.
pub fn render(report: &PipelineReport) -> Vec<String> {
    let mut lines = Vec::with_capacity(report.stages.len() + 1);
    for line in &report.stages {
        let marker = match line.status {
            StageStatus::Succeeded => "ok",
            StageStatus::Failed => "FAILED",
            StageStatus::Skipped => "skipped",
        };
        lines.push(format!("{:<20} {}", line.name, marker));
    }
    lines.push(format!(
        "Total: {}/{} passed",
        report.pass_count, report.total_count
    ));
    lines
}
