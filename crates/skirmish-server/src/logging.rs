// logging.rs — Hand-rolled console logging in the style of
// myq2-common/src/common.rs's com_printf/com_dprintf: no logging crate,
// just two functions that are the entire logging surface of the server.

use std::sync::atomic::{AtomicBool, Ordering};

static VERBOSE: AtomicBool = AtomicBool::new(false);

/// Enables `log_debug` output. Set once at startup from `ServerConfig`.
pub fn set_verbose(verbose: bool) {
    VERBOSE.store(verbose, Ordering::Relaxed);
}

/// Always-on diagnostic output.
pub fn log_info(msg: &str) {
    println!("{msg}");
}

/// Developer-only diagnostic output, gated on `--verbose`.
pub fn log_debug(msg: &str) {
    if VERBOSE.load(Ordering::Relaxed) {
        println!("[debug] {msg}");
    }
}
