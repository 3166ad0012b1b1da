pub type CmdResult<T> = flightcheck::Result<(T, i32)>;

pub mod logs;
pub mod run;
pub mod stages;
pub mod target;

/// Dispatch a command to its handler and map result to JSON.
macro_rules! dispatch {
    ($args:expr, $module:ident) => {
        crate::output::map_cmd_result_to_json($module::run($args))
    };
}

pub(crate) fn run_json(command: crate::Commands) -> (flightcheck::Result<serde_json::Value>, i32) {
    match command {
        crate::Commands::Run(args) => dispatch!(args, run),
        crate::Commands::Stages(args) => dispatch!(args, stages),
        crate::Commands::Target(args) => dispatch!(args, target),
        crate::Commands::Logs(args) => dispatch!(args, logs),
    }
}
