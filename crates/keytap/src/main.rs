//! keytap entry point.
//!
//! ```text
//! main()
//!  └─ load config            -- defaults when the file is missing
//!  └─ key_queue()            -- bounded, never blocks the hook
//!  └─ start_capture()        -- hook thread: install, message loop, uninstall
//!  └─ print_keys()           -- one rendered code per line on stdout
//!  └─ Ctrl-C                 -- drain, post WM_QUIT, join the hook thread
//! ```
//!
//! Diagnostics go to stderr so stdout carries nothing but key codes.

use anyhow::Context;
use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::EnvFilter;

use keytap::application::capture::{start_capture, CaptureOptions};
use keytap::application::print_keys::print_keys;
use keytap::infrastructure::hook::platform_hook_api;
use keytap::infrastructure::storage::config;
use keytap_core::key_queue;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing file yields defaults; an unreadable or malformed one is fatal.
    let cfg = config::load_config().context("failed to load configuration")?;
    cfg.validate().context("invalid configuration")?;

    // Level is overridden by `RUST_LOG`.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&cfg.general.log_level)),
        )
        .init();

    info!("keytap starting");

    // ── Key queue and hook thread ─────────────────────────────────────────────
    let (sender, mut receiver) = key_queue(cfg.capture.queue_capacity, cfg.capture.overflow)?;
    let api = platform_hook_api()?;
    let options = CaptureOptions {
        include_system_keys: cfg.capture.include_system_keys,
    };
    let capture =
        start_capture(api, sender, options).context("failed to install keyboard hook")?;

    // ── Ctrl-C handler ────────────────────────────────────────────────────────
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown signal received");
            let _ = shutdown_tx.send(true);
        }
    });

    info!(
        capacity = receiver.capacity(),
        policy = ?receiver.policy(),
        "capturing key presses.  Press Ctrl-C to exit."
    );

    let mut stdout = std::io::stdout().lock();
    let printed = print_keys(&mut receiver, &mut stdout, cfg.output.format, shutdown_rx)
        .await
        .context("failed to write key codes")?;

    // ── Teardown ──────────────────────────────────────────────────────────────
    tokio::task::spawn_blocking(move || capture.stop())
        .await
        .context("hook thread join task failed")?
        .context("keyboard hook did not shut down cleanly")?;

    let stats = receiver.stats();
    info!(printed, dropped = stats.dropped, "keytap stopped");
    Ok(())
}
