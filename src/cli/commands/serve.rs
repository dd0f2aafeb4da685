use std::net::SocketAddr;

use crate::cli::context::Context;
use crate::cli::output;
use crate::core::errors::{Result, SealError};
use crate::http::{self, AppState};

/// Execute the `sealdrop serve` command.
///
/// Runs the HTTP API until Ctrl-C.
pub fn execute(ctx: &Context, listen: Option<SocketAddr>) -> Result<()> {
    let addr = listen.unwrap_or(ctx.config.server.listen_addr);
    let state = AppState::from_context(ctx)?;

    if !state.engine_available() {
        output::warning("No OpenPGP engine available; encrypt and decrypt will fail");
    }
    output::success(&format!(
        "Listening on http://{addr} (user header: {})",
        ctx.config.server.user_header
    ));

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| SealError::storage(format!("cannot start runtime: {e}")))?;
    runtime.block_on(http::serve(addr, state))
}
