//! # Kiosk Terminal
//!
//! Line-oriented register for a kiosk with a keyboard-wedge barcode scanner.
//!
//! ## Module Organization
//! ```text
//! kiosk_terminal/
//! ├── lib.rs          ◄─── Logging setup & register loop
//! ├── config.rs       ◄─── kiosk.toml + KIOSK_* environment
//! ├── commands.rs     ◄─── Input line ──► Command
//! ├── register.rs     ◄─── Cart, scan state, Command ──► Refresh
//! ├── render.rs       ◄─── Refresh ──► text
//! └── error.rs        ◄─── Error shown to the cashier
//! ```
//!
//! ## One Line Through the Register
//! ```text
//! stdin ──► commands::parse ──► Register::dispatch ──► Renderer::render ──► stdout
//!                 │                     │
//!                 └──── TerminalError ──┴──────────────────────────────► "✗ message"
//! ```

pub mod commands;
pub mod config;
pub mod error;
pub mod register;
pub mod render;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use register::{Refresh, Register, ScanState};
use render::Renderer;

/// Initializes the tracing subscriber.
///
/// Logs go to stderr so they never interleave with the register output.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=kiosk=trace` - Show trace for kiosk crates only
/// - Default: `info,kiosk=debug,sqlx=warn`
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,kiosk=debug,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Reads commands until `quit` or end of input.
///
/// Command errors are printed and the loop goes on; only I/O errors end it.
pub async fn run<R, W>(
    register: &mut Register,
    renderer: &Renderer<'_>,
    input: R,
    mut output: W,
) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = input.lines();

    loop {
        output.write_all(prompt(register.state()).as_bytes()).await?;
        output.flush().await?;

        let Some(line) = lines.next_line().await? else {
            debug!("End of input");
            break;
        };

        let text = match commands::parse(&line) {
            Ok(None) => continue,
            Ok(Some(command)) => match register.dispatch(command).await {
                Ok(Refresh::Quit) => {
                    output.write_all(b"Bye\n").await?;
                    break;
                }
                Ok(refresh) => renderer.render(&refresh),
                Err(e) => format!("✗ {}", e),
            },
            Err(e) => format!("✗ {}", e),
        };

        output.write_all(text.as_bytes()).await?;
        output.write_all(b"\n").await?;
    }

    if !register.cart().is_empty() {
        info!(lines = register.cart().line_count(), "Register closed with an open cart");
    }
    output.flush().await
}

fn prompt(state: &ScanState) -> &'static str {
    match state {
        ScanState::ConfirmingQuantity(_) => "qty> ",
        _ => "scan> ",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TerminalConfig;
    use kiosk_core::{Category, Money, Product, Session};
    use kiosk_db::{Database, DbConfig};

    #[tokio::test]
    async fn test_scan_quantity_checkout_session() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.products()
            .insert(&Product::new("123", "Agua 500ml", Money::from_cents(1000), 5, Category::Beverages))
            .await
            .unwrap();

        let config = TerminalConfig::default();
        let renderer = Renderer::new(&config);
        let mut register = Register::new(db.clone(), Session::new("user-1", "Ana"), &config);

        let input: &[u8] = b"123\n4\nbogus command here\n\ncheckout\nquit\nnever read\n";
        let mut output = Vec::new();
        run(&mut register, &renderer, input, &mut output).await.unwrap();

        let text = String::from_utf8(output).unwrap();
        assert!(text.contains("Quantity (1-5)?"));
        assert!(text.contains("qty> "));
        assert!(text.contains("✗ Unknown command 'bogus'"));
        assert!(text.contains("TOTAL $40.00"));
        assert!(text.ends_with("Bye\n"));

        let stored = db.products().find_by_barcode("123").await.unwrap().unwrap();
        assert_eq!(stored.stock, 1);
        assert!(register.cart().is_empty());
    }
}
