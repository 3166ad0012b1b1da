use clap::Args;
use serde::Serialize;

use flightcheck::stage::STAGES;

use crate::commands::CmdResult;

#[derive(Args)]
pub struct StagesArgs {}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StageInfo {
    pub id: String,
    pub name: String,
    pub timeout_secs: u64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub needs: Vec<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StagesOutput {
    pub command: String,
    pub stages: Vec<StageInfo>,
}

pub fn run(_args: StagesArgs) -> CmdResult<StagesOutput> {
    let stages = STAGES
        .iter()
        .map(|spec| StageInfo {
            id: spec.id.to_string(),
            name: spec.name.to_string(),
            timeout_secs: spec.timeout.as_secs(),
            needs: spec.needs.iter().map(|n| n.to_string()).collect(),
        })
        .collect();

    Ok((
        StagesOutput {
            command: "stages".to_string(),
            stages,
        },
        0,
    ))
}
