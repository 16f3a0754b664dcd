//! Fatal path for a provably inconsistent index.
//!
//! Duplicate primary keys mean every position the index hands out may be
//! wrong. The process is stopped instead of serving positions from it.

use std::fmt;

/// Log the corruption and abort the process.
#[cold]
#[inline(never)]
pub(crate) fn corruption(detail: fmt::Arguments<'_>) -> ! {
    tracing::error!("flat traversal index corrupted: {detail}");
    // The subscriber may be buffered or absent; stderr is the last word.
    eprintln!("flat traversal index corrupted: {detail}");
    std::process::abort()
}

/// Set in a child test process that should take the fatal path itself.
#[cfg(test)]
pub(crate) const ABORT_CHILD_ENV: &str = "FLATVIEW_ABORT_CHILD";

#[cfg(test)]
pub(crate) fn is_abort_child() -> bool {
    std::env::var_os(ABORT_CHILD_ENV).is_some()
}

/// Run one test of this binary in a child process and collect its output.
#[cfg(test)]
pub(crate) fn run_abort_child(test: &str) -> std::process::Output {
    let exe = std::env::current_exe().unwrap();
    std::process::Command::new(exe)
        .args([test, "--exact", "--nocapture", "--test-threads=1"])
        .env(ABORT_CHILD_ENV, "1")
        .output()
        .unwrap()
}
