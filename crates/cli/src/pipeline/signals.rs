//! Process signals: Ctrl+C/SIGTERM stop, SIGHUP reload

use tracing::{error, info};

use crate::error::CliError;

/// Resolves on Ctrl+C or SIGTERM
///
/// A handler that fails to install is logged and never fires.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!(signal = "SIGINT", "Stopping in response to signal"),
        _ = terminate => info!(signal = "SIGTERM", "Stopping in response to signal"),
    }
}

/// SIGHUP stream; never fires off unix
pub struct ReloadSignal {
    #[cfg(unix)]
    stream: tokio::signal::unix::Signal,
}

#[cfg(unix)]
impl ReloadSignal {
    pub fn install() -> Result<Self, CliError> {
        use tokio::signal::unix::{signal, SignalKind};

        let stream = signal(SignalKind::hangup()).map_err(|e| CliError::signal("SIGHUP", e))?;
        Ok(Self { stream })
    }

    pub async fn recv(&mut self) -> Option<()> {
        self.stream.recv().await
    }
}

#[cfg(not(unix))]
impl ReloadSignal {
    pub fn install() -> Result<Self, CliError> {
        Ok(Self {})
    }

    pub async fn recv(&mut self) -> Option<()> {
        std::future::pending().await
    }
}
