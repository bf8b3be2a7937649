//! Launches user code as a separate app process on a random local port.
//!
//! The launch is fire-and-forget: no port probing, no readiness check, no
//! timeout. The session keeps a single handle and may terminate it later.

mod process;

pub use process::{
    AppProcess, ChildApp, CodeLauncher, DEFAULT_SAMPLE, LaunchError, LauncherConfig,
    SubprocessLauncher, app_url, pick_port, wrap_script,
};
