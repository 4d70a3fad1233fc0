use std::future::Future;
use std::io;
use tokio::sync::oneshot;
use tracing::{info, warn};

/// Resolves when `rx` is signalled. A dropped sender means no shutdown will
/// ever be requested, so the future stays pending instead.
pub async fn wait_for_shutdown(rx: oneshot::Receiver<()>) {
    if rx.await.is_err() {
        std::future::pending::<()>().await;
    }
}

/// Install the Ctrl-C handler immediately and hand back the future the
/// monitor waits on. Must be called from within the tokio runtime.
///
/// The handler is live from this call on, so an interrupt that lands while a
/// cycle is running is held until that cycle has finished.
pub fn interrupt_shutdown() -> impl Future<Output = ()> + Send + 'static {
    let (tx, rx) = oneshot::channel();
    match listen_for_interrupt() {
        Ok(mut interrupts) => {
            tokio::spawn(async move {
                if interrupts.recv().await.is_some() {
                    info!("shutdown requested; stopping after the current cycle");
                    let _ = tx.send(());
                }
            });
        }
        Err(e) => {
            warn!(error = %e, "could not install Ctrl-C handler; running until the duration ends");
            drop(tx);
        }
    }
    wait_for_shutdown(rx)
}

#[cfg(unix)]
fn listen_for_interrupt() -> io::Result<tokio::signal::unix::Signal> {
    tokio::signal::unix::signal(tokio::signal::unix::SignalKind::interrupt())
}

#[cfg(windows)]
fn listen_for_interrupt() -> io::Result<tokio::signal::windows::CtrlC> {
    tokio::signal::windows::ctrl_c()
}
