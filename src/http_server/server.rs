use crate::utils::errors::{AuthError, AuthResult};
use axum::Router;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// How long in-flight requests get to finish once shutdown is requested.
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// The local listener for one authorization attempt. The serve loop runs on
/// its own task until [`CallbackServer::shutdown`] is awaited.
pub struct CallbackServer {
    local_addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
    handle: JoinHandle<std::io::Result<()>>,
    finished: bool,
}

impl CallbackServer {
    pub async fn bind(addr: &str, router: Router) -> AuthResult<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| AuthError::Listener(format!("unable to listen on {}: {}", addr, e)))?;
        let local_addr = listener.local_addr()?;

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let handle = tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
        });

        info!("callback server listening on {}", local_addr);
        Ok(Self {
            local_addr,
            shutdown_tx: Some(shutdown_tx),
            handle,
            finished: false,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Resolves only if the serve loop stops on its own, which is always a
    /// failure while the attempt is in progress.
    pub async fn failed(&mut self) -> AuthError {
        let result = (&mut self.handle).await;
        self.finished = true;
        match result {
            Ok(Ok(())) => AuthError::Listener("callback server stopped unexpectedly".to_string()),
            Ok(Err(e)) => AuthError::Listener(e.to_string()),
            Err(e) => AuthError::Listener(format!("callback server task failed: {}", e)),
        }
    }

    /// Stops accepting connections and waits for the serve task to exit.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if self.finished {
            return;
        }

        match tokio::time::timeout(SHUTDOWN_GRACE, &mut self.handle).await {
            Ok(Ok(Ok(()))) => debug!("callback server stopped"),
            Ok(Ok(Err(e))) => warn!("callback server stopped with error: {}", e),
            Ok(Err(e)) => warn!("callback server task failed: {}", e),
            Err(_) => {
                warn!("callback server did not stop in time, aborting");
                self.handle.abort();
                let _ = (&mut self.handle).await;
            }
        }
    }
}

impl Drop for CallbackServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
