//! 对单个膝关节 CT 运行完整流程: 分割, 派生变体, 定位胫骨最低点, 写出结果.

mod result;
mod runner;

use log::{error, LevelFilter};
use simple_logger::SimpleLogger;
use std::process::ExitCode;

fn main() -> ExitCode {
    if let Err(e) = SimpleLogger::new().with_level(LevelFilter::Info).env().init() {
        eprintln!("Logger initialization error: {e}");
    }

    let result = match runner::run() {
        Ok(r) => r,
        Err(e) => {
            match e.stage() {
                Some(stage) => error!("Knee pipeline aborted at stage `{stage}`: {e}"),
                None => error!("Knee pipeline aborted: {e}"),
            }
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = result.analyze() {
        error!("Failed to print summary: {e}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
