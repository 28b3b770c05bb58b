//! OS signals mapped onto session control: Ctrl-C stops, SIGUSR1/SIGUSR2 pause and resume.

use tokio::task::JoinHandle;
use tracing::{info, warn};
use transfer_core::ControlSignals;

use crate::ProcessExit;

/// Spawns the listener. Abort the handle once the session is over.
pub(crate) fn spawn_signal_listener(signals: ControlSignals) -> JoinHandle<()> {
    tokio::spawn(async move {
        listen(&signals).await;
        // A second Ctrl-C while draining quits immediately.
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("second interrupt; exiting without waiting for workers");
            std::process::exit(ProcessExit::Interrupted.code());
        }
    })
}

#[cfg(unix)]
async fn listen(signals: &ControlSignals) {
    use tokio::signal::unix::{SignalKind, signal};

    let (mut pause, mut resume) = match (
        signal(SignalKind::user_defined1()),
        signal(SignalKind::user_defined2()),
    ) {
        (Ok(pause), Ok(resume)) => (pause, resume),
        (Err(e), _) | (_, Err(e)) => {
            warn!(error = %e, "pause/resume signals unavailable");
            wait_for_interrupt(signals).await;
            return;
        }
    };

    loop {
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                on_interrupt(result, signals);
                return;
            }
            Some(()) = pause.recv() => signals.pause(),
            Some(()) = resume.recv() => signals.resume(),
        }
    }
}

#[cfg(not(unix))]
async fn listen(signals: &ControlSignals) {
    wait_for_interrupt(signals).await;
}

async fn wait_for_interrupt(signals: &ControlSignals) {
    on_interrupt(tokio::signal::ctrl_c().await, signals);
}

fn on_interrupt(result: std::io::Result<()>, signals: &ControlSignals) {
    match result {
        Ok(()) => {
            info!("interrupt received; stopping after the current chunk");
            signals.stop();
        }
        Err(e) => warn!(error = %e, "failed to listen for Ctrl-C"),
    }
}
