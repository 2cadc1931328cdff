//! Consumer loop: prints captured key codes.

use std::io::{self, Write};

use keytap_core::{KeyCode, KeyReceiver, OutputFormat};
use tokio::sync::watch;
use tracing::debug;

/// Receives key codes and writes one rendered code per line to `out`.
///
/// Runs until `shutdown` turns `true` (or its sender is dropped), or until the
/// key queue closes.  Codes already queued at shutdown are still written.
/// Returns the number of codes written.
///
/// # Errors
///
/// Any I/O error from `out`.
pub async fn print_keys<W: Write>(
    rx: &mut KeyReceiver,
    out: &mut W,
    format: OutputFormat,
    mut shutdown: watch::Receiver<bool>,
) -> io::Result<u64> {
    let mut printed: u64 = 0;

    loop {
        if *shutdown.borrow_and_update() {
            debug!("shutdown requested, draining key queue");
            break;
        }

        tokio::select! {
            biased;

            code = rx.recv() => match code {
                Some(code) => {
                    write_key(out, code, format)?;
                    printed += 1;
                }
                None => {
                    debug!("key queue closed");
                    return Ok(printed);
                }
            },
            changed = shutdown.changed() => {
                if changed.is_err() {
                    debug!("shutdown sender dropped, draining key queue");
                    break;
                }
            }
        }
    }

    while let Some(code) = rx.try_recv() {
        write_key(out, code, format)?;
        printed += 1;
    }

    Ok(printed)
}

fn write_key<W: Write>(out: &mut W, code: KeyCode, format: OutputFormat) -> io::Result<()> {
    writeln!(out, "{}", code.render(format))?;
    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use keytap_core::{key_queue, OverflowPolicy};

    fn output(buf: Vec<u8>) -> String {
        String::from_utf8(buf).expect("utf-8 output")
    }

    #[tokio::test]
    async fn test_prints_quoted_codes_in_order_until_queue_closes() {
        // Arrange
        let (tx, mut rx) = key_queue(8, OverflowPolicy::DropNewest).unwrap();
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        tx.push(KeyCode::new(0x42));
        tx.push(KeyCode::new(0x43));
        tx.push(KeyCode::from_vk(0x100));
        drop(tx);
        let mut buf = Vec::new();

        // Act
        let printed = print_keys(&mut rx, &mut buf, OutputFormat::Quoted, shutdown_rx)
            .await
            .unwrap();

        // Assert
        assert_eq!(printed, 3);
        assert_eq!(output(buf), "'B'\n'C'\n'\\x00'\n");
    }

    #[tokio::test]
    async fn test_decimal_format() {
        let (tx, mut rx) = key_queue(8, OverflowPolicy::DropNewest).unwrap();
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        tx.push(KeyCode::new(66));
        tx.push(KeyCode::new(67));
        drop(tx);
        let mut buf = Vec::new();

        print_keys(&mut rx, &mut buf, OutputFormat::Decimal, shutdown_rx)
            .await
            .unwrap();

        assert_eq!(output(buf), "66\n67\n");
    }

    #[tokio::test]
    async fn test_shutdown_drains_already_queued_codes() {
        // Arrange: sender stays alive, so only the shutdown signal ends the loop.
        let (tx, mut rx) = key_queue(8, OverflowPolicy::DropNewest).unwrap();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        tx.push(KeyCode::new(b'A'));
        tx.push(KeyCode::new(b'B'));
        shutdown_tx.send(true).unwrap();
        let mut buf = Vec::new();

        // Act
        let printed = print_keys(&mut rx, &mut buf, OutputFormat::Quoted, shutdown_rx)
            .await
            .unwrap();

        // Assert
        assert_eq!(printed, 2);
        assert_eq!(output(buf), "'A'\n'B'\n");
        drop(tx);
    }

    #[tokio::test]
    async fn test_shutdown_while_waiting_returns() {
        // Arrange
        let (_tx, mut rx) = key_queue(8, OverflowPolicy::DropNewest).unwrap();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let trigger = tokio::spawn(async move {
            tokio::task::yield_now().await;
            shutdown_tx.send(true).unwrap();
            shutdown_tx
        });
        let mut buf = Vec::new();

        // Act
        let printed = print_keys(&mut rx, &mut buf, OutputFormat::Quoted, shutdown_rx)
            .await
            .unwrap();

        // Assert
        assert_eq!(printed, 0);
        assert!(buf.is_empty());
        trigger.await.unwrap();
    }

    #[tokio::test]
    async fn test_dropped_shutdown_sender_ends_loop() {
        let (_tx, mut rx) = key_queue(8, OverflowPolicy::DropNewest).unwrap();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        drop(shutdown_tx);
        let mut buf = Vec::new();

        let printed = print_keys(&mut rx, &mut buf, OutputFormat::Quoted, shutdown_rx)
            .await
            .unwrap();

        assert_eq!(printed, 0);
    }

    #[tokio::test]
    async fn test_write_error_is_returned() {
        struct FailingWriter;
        impl Write for FailingWriter {
            fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
                Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
            }
            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        let (tx, mut rx) = key_queue(8, OverflowPolicy::DropNewest).unwrap();
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        tx.push(KeyCode::new(b'A'));

        let result = print_keys(&mut rx, &mut FailingWriter, OutputFormat::Quoted, shutdown_rx).await;

        assert_eq!(result.unwrap_err().kind(), io::ErrorKind::BrokenPipe);
    }
}
