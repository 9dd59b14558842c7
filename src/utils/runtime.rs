use std::future::Future;

use anyhow::Result;

/// Everything the logger does happens on one thread: user commands, ticks and exports.
pub fn single_thread_runtime() -> Result<tokio::runtime::Runtime> {
    Ok(tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?)
}

/// Runs `future` to completion on a [single_thread_runtime]. Blocking work still pending once it
/// completes is abandoned instead of waited for. Stdin is read on the blocking pool, and that read
/// only returns on the next line, so waiting would keep the process alive after Ctrl-C.
pub fn run_single_threaded<F: Future>(future: F) -> Result<F::Output> {
    let runtime = single_thread_runtime()?;
    let output = runtime.block_on(future);
    runtime.shutdown_background();
    Ok(output)
}
