//! CLI entry point for the transfer tool.

use std::process::ExitCode;

mod app;
mod cli;

/// Process outcome mapped to an exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ProcessExit {
    /// Every transfer completed.
    Success,
    /// Setup failed before any transfer ran.
    Failure,
    /// Some transfers were abandoned after exhausting retries.
    Partial,
    /// The user stopped the session.
    Interrupted,
}

impl ProcessExit {
    pub(crate) fn code(self) -> i32 {
        match self {
            Self::Success => 0,
            Self::Failure => 1,
            Self::Partial => 2,
            Self::Interrupted => 130,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let exit = match app::runtime::run_transfer().await {
        Ok(exit) => exit,
        Err(error) => {
            eprintln!("error: {error:#}");
            ProcessExit::Failure
        }
    };
    ExitCode::from(u8::try_from(exit.code()).unwrap_or(1))
}
