use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::ops::RangeInclusive;
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};

use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Program shown in the editor when no prompt template is set.
pub const DEFAULT_SAMPLE: &str = "import streamlit as st
import matplotlib.pyplot as plt
import numpy as np

# Simple example
def main():
    st.title('My Streamlit App')
    x = np.linspace(0, 10, 100)
    y = np.sin(x)

    fig, ax = plt.subplots()
    ax.plot(x, y)
    ax.set_title('Sine Wave')
    st.pyplot(fig)

if __name__ == '__main__':
    main()";

const SCRIPT_PREAMBLE: &str = "import streamlit as st
import matplotlib.pyplot as plt
import numpy as np
";

#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("could not write app script: {0}")]
    Script(#[source] io::Error),
    #[error("could not start `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },
    #[error("could not stop app on port {port}: {source}")]
    Terminate {
        port: u16,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LauncherConfig {
    /// Interpreter invoked as `<interpreter> -m streamlit run <script>`.
    pub interpreter: String,
    pub port_min: u16,
    pub port_max: u16,
    pub open_browser: bool,
    /// Overrides the platform opener (`xdg-open`, `open`, `start`).
    pub browser_command: Option<String>,
    /// Where app scripts are written; the system temp dir when unset.
    pub script_dir: Option<PathBuf>,
}

impl Default for LauncherConfig {
    fn default() -> Self {
        Self {
            interpreter: "python3".to_string(),
            port_min: 8502,
            port_max: 9000,
            open_browser: true,
            browser_command: None,
            script_dir: None,
        }
    }
}

impl LauncherConfig {
    pub fn port_range(&self) -> RangeInclusive<u16> {
        self.port_min..=self.port_max
    }
}

/// A running launched app.
pub trait AppProcess: Send + fmt::Debug {
    fn port(&self) -> u16;
    fn terminate(&mut self) -> Result<(), LaunchError>;
}

/// Starts code as an app process.
pub trait CodeLauncher: Send {
    fn launch(&mut self, code: &str, port: u16) -> Result<Box<dyn AppProcess>, LaunchError>;
}

/// Uniform pick; no check that the port is actually free.
pub fn pick_port(range: RangeInclusive<u16>, rng: &mut impl Rng) -> u16 {
    if range.is_empty() {
        return *range.start();
    }
    rng.gen_range(range)
}

pub fn app_url(port: u16) -> String {
    format!("http://localhost:{port}")
}

/// Standard imports, the user code, then a title naming the port.
pub fn wrap_script(code: &str, port: u16) -> String {
    format!(
        "{SCRIPT_PREAMBLE}\n{code}\n\nif __name__ == '__main__':\n    st.title('ALMA Execution - Port {port}')\n"
    )
}

/// Runs scripts through the configured interpreter's `streamlit` module.
#[derive(Debug, Clone, Default)]
pub struct SubprocessLauncher {
    config: LauncherConfig,
}

impl SubprocessLauncher {
    pub fn new(config: LauncherConfig) -> Self {
        Self { config }
    }

    fn write_script(&self, code: &str, port: u16) -> Result<PathBuf, LaunchError> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("alma_app_").suffix(".py");
        let mut file = match self.config.script_dir.as_ref() {
            Some(dir) => builder.tempfile_in(dir),
            None => builder.tempfile(),
        }
        .map_err(LaunchError::Script)?;

        file.write_all(wrap_script(code, port).as_bytes())
            .map_err(LaunchError::Script)?;
        let (_, path) = file.keep().map_err(|err| LaunchError::Script(err.error))?;
        Ok(path)
    }

    fn open_browser(&self, url: &str) -> io::Result<()> {
        let mut command = match self.config.browser_command.as_deref() {
            Some(custom) => Command::new(custom),
            None => platform_opener(),
        };
        command
            .arg(url)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map(|_| ())
    }
}

impl CodeLauncher for SubprocessLauncher {
    fn launch(&mut self, code: &str, port: u16) -> Result<Box<dyn AppProcess>, LaunchError> {
        let script = self.write_script(code, port)?;
        let interpreter = self.config.interpreter.clone();

        let spawned = Command::new(&interpreter)
            .args(["-m", "streamlit", "run"])
            .arg(&script)
            .arg("--server.port")
            .arg(port.to_string())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();

        let child = match spawned {
            Ok(child) => child,
            Err(source) => {
                fs::remove_file(&script).ok();
                return Err(LaunchError::Spawn {
                    command: interpreter,
                    source,
                });
            }
        };

        if self.config.open_browser {
            // The app is reported as launched whether or not a browser shows up.
            self.open_browser(&app_url(port)).ok();
        }

        Ok(Box::new(ChildApp {
            child,
            port,
            script,
            stopped: false,
        }))
    }
}

#[cfg(target_os = "macos")]
fn platform_opener() -> Command {
    Command::new("open")
}

#[cfg(target_os = "windows")]
fn platform_opener() -> Command {
    let mut command = Command::new("cmd");
    command.args(["/C", "start", ""]);
    command
}

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
fn platform_opener() -> Command {
    Command::new("xdg-open")
}

/// OS process spawned by [`SubprocessLauncher`]. Killed when dropped.
#[derive(Debug)]
pub struct ChildApp {
    child: Child,
    port: u16,
    script: PathBuf,
    stopped: bool,
}

impl ChildApp {
    pub fn script_path(&self) -> &std::path::Path {
        &self.script
    }

    fn stop(&mut self) -> io::Result<()> {
        if self.stopped {
            return Ok(());
        }
        if self.child.try_wait()?.is_none() {
            self.child.kill()?;
        }
        self.child.wait()?;
        self.stopped = true;
        fs::remove_file(&self.script).ok();
        Ok(())
    }
}

impl AppProcess for ChildApp {
    fn port(&self) -> u16 {
        self.port
    }

    fn terminate(&mut self) -> Result<(), LaunchError> {
        let port = self.port;
        self.stop()
            .map_err(|source| LaunchError::Terminate { port, source })
    }
}

impl Drop for ChildApp {
    fn drop(&mut self) {
        self.stop().ok();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn ports_stay_in_range() {
        let mut rng = StdRng::seed_from_u64(5);
        let config = LauncherConfig::default();
        for _ in 0..1_000 {
            let port = pick_port(config.port_range(), &mut rng);
            assert!((8502..=9000).contains(&port));
        }
    }

    #[test]
    fn wrapped_script_has_preamble_code_and_trailer() {
        let script = wrap_script("print('hi')", 8600);
        assert!(script.starts_with("import streamlit as st\n"));
        assert!(script.contains("\nprint('hi')\n"));
        assert!(script.ends_with("    st.title('ALMA Execution - Port 8600')\n"));
    }

    #[test]
    fn missing_interpreter_is_a_spawn_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut launcher = SubprocessLauncher::new(LauncherConfig {
            interpreter: "alma-no-such-interpreter".into(),
            open_browser: false,
            script_dir: Some(dir.path().to_path_buf()),
            ..LauncherConfig::default()
        });

        let err = launcher.launch("x = 1", 8700).unwrap_err();
        assert!(matches!(err, LaunchError::Spawn { .. }));
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[cfg(unix)]
    #[test]
    fn launch_writes_script_and_terminate_cleans_up() {
        let dir = tempfile::tempdir().unwrap();
        let mut launcher = SubprocessLauncher::new(LauncherConfig {
            interpreter: "true".into(),
            open_browser: false,
            script_dir: Some(dir.path().to_path_buf()),
            ..LauncherConfig::default()
        });

        let mut app = launcher.launch("x = 1", 8701).unwrap();
        assert_eq!(app.port(), 8701);

        let scripts: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(scripts.len(), 1);
        let path = scripts[0].as_ref().unwrap().path();
        let body = fs::read_to_string(&path).unwrap();
        assert!(body.contains("x = 1"));

        app.terminate().unwrap();
        app.terminate().unwrap();
        assert!(!path.exists());
    }
}
