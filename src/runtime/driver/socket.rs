use std::io::{BufRead, BufReader, Write};
use std::net::{SocketAddr, TcpListener, TcpStream, ToSocketAddrs};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::app::Action;
use crate::error::AlmaError;
use crate::logging::{LogLevel, Logger, event_with_fields, json_kv};
use crate::render::Size;
use crate::rerun::{FlushOutcome, RedrawOutcome, ViewRenderer};
use crate::runtime::{AlmaRuntime, RuntimeEvent};
use crate::session::{Notice, SessionState};
use crate::view::PageSnapshot;

const LOG_TARGET: &str = "alma::socket";

pub type DriverResult<T> = std::result::Result<T, SocketDriverError>;

#[derive(Debug, Error)]
pub enum SocketDriverError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("encode error: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("runtime error: {0}")]
    Runtime(#[from] AlmaError),
}

/// One inbound line from a socket client: a bare [`Action`] object, or one of
/// the transport-level messages in [`Control`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Inbound {
    Action(Action),
    Control(Control),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Control {
    /// A text command, parsed exactly like a line typed into the terminal.
    Command { line: String },
    Resize { width: u16, height: u16 },
    Tick { ms: u64 },
    Paste { data: String },
}

impl Inbound {
    pub fn decode(line: &str) -> DriverResult<Self> {
        serde_json::from_str(line).map_err(|err| SocketDriverError::Decode(err.to_string()))
    }

    fn into_event(self) -> RuntimeEvent {
        match self {
            Inbound::Action(action) => RuntimeEvent::Action(action),
            Inbound::Control(Control::Command { line }) => RuntimeEvent::Command(line),
            Inbound::Control(Control::Resize { width, height }) => {
                RuntimeEvent::Resize(Size::new(width, height))
            }
            Inbound::Control(Control::Tick { ms }) => RuntimeEvent::Tick {
                elapsed: Duration::from_millis(ms),
            },
            Inbound::Control(Control::Paste { data }) => RuntimeEvent::Paste(data),
        }
    }
}

/// Line-delimited JSON transport. Each connection gets a fresh session and
/// receives one page snapshot per redraw.
pub struct SocketDriver {
    listener: TcpListener,
    runtime: AlmaRuntime,
    logger: Option<Logger>,
    max_sessions: Option<usize>,
}

impl SocketDriver {
    pub fn bind<A>(addr: A, runtime: AlmaRuntime) -> DriverResult<Self>
    where
        A: ToSocketAddrs,
    {
        let listener = TcpListener::bind(addr)?;
        let logger = runtime.config().logger.clone();
        Ok(Self {
            listener,
            runtime,
            logger,
            max_sessions: None,
        })
    }

    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Stop accepting after `limit` sessions have finished.
    pub fn with_max_sessions(mut self, limit: Option<usize>) -> Self {
        self.max_sessions = limit;
        self
    }

    pub fn local_addr(&self) -> DriverResult<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    pub fn runtime(&self) -> &AlmaRuntime {
        &self.runtime
    }

    /// Serve clients one after another. A failing connection is logged and
    /// does not stop the listener.
    pub fn run(mut self) -> DriverResult<AlmaRuntime> {
        let mut served = 0usize;
        self.log(
            LogLevel::Info,
            "socket_listening",
            [json_kv("addr", self.local_addr()?.to_string())],
        );

        while self.max_sessions.is_none_or(|limit| served < limit) {
            let (stream, peer) = self.listener.accept()?;
            stream.set_nodelay(true).ok();
            served += 1;
            self.log(
                LogLevel::Info,
                "session_opened",
                [json_kv("peer", peer.to_string())],
            );
            let result = self.serve(stream);
            let session_id = self.runtime.session().state.session_id.to_string();
            self.runtime.reset_session();
            match result {
                Ok(()) => self.log(
                    LogLevel::Info,
                    "session_closed",
                    [json_kv("peer", peer.to_string()), json_kv("session_id", session_id)],
                ),
                Err(err) => self.log(
                    LogLevel::Error,
                    "session_failed",
                    [json_kv("peer", peer.to_string()), json_kv("error", err.to_string())],
                ),
            }
        }
        Ok(self.runtime)
    }

    /// Drive one connected client until it disconnects or quits.
    pub fn serve(&mut self, stream: TcpStream) -> DriverResult<()> {
        self.runtime.reset_session();
        let mut writer = stream.try_clone()?;
        self.runtime.session_mut().request_refresh("session started");
        publish(&mut self.runtime, &mut writer)?;

        let inbound = BufReader::new(stream);
        for line in inbound.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match Inbound::decode(&line) {
                Ok(message) => self.runtime.dispatch(message.into_event())?,
                Err(err) => {
                    let ctx = self.runtime.session_mut();
                    ctx.state.notices.clear();
                    ctx.state.notify(Notice::warning(err.to_string()));
                    ctx.request_refresh("message rejected");
                    self.log(
                        LogLevel::Warn,
                        "message_rejected",
                        [json_kv("error", err.to_string())],
                    );
                }
            }
            publish(&mut self.runtime, &mut writer)?;
            if self.runtime.should_exit() {
                break;
            }
        }
        Ok(())
    }

    fn log<I>(&self, level: LogLevel, message: &str, fields: I)
    where
        I: IntoIterator<Item = (String, serde_json::Value)>,
    {
        if let Some(logger) = self.logger.as_ref() {
            let _ = logger.log_event(event_with_fields(level, LOG_TARGET, message, fields));
        }
    }
}

/// Flush a pending refresh as a single JSON line.
fn publish(runtime: &mut AlmaRuntime, writer: &mut impl Write) -> DriverResult<FlushOutcome> {
    let mut view = SnapshotView {
        state: &mut runtime.ctx.state,
        writer,
        error: None,
    };
    let outcome = runtime.ctx.rerun.flush(&mut view);
    if let Some(err) = view.error.take() {
        return Err(err);
    }
    Ok(outcome)
}

struct SnapshotView<'a, W: Write> {
    state: &'a mut SessionState,
    writer: &'a mut W,
    error: Option<SocketDriverError>,
}

impl<W: Write> SnapshotView<'_, W> {
    fn write_snapshot(&mut self, reason: Option<&str>) -> DriverResult<()> {
        let snapshot = PageSnapshot::capture(&mut *self.state, reason);
        let encoded = serde_json::to_string(&snapshot)?;
        self.writer.write_all(encoded.as_bytes())?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }
}

impl<W: Write> ViewRenderer for SnapshotView<'_, W> {
    fn redraw(&mut self, reason: Option<&str>) -> RedrawOutcome {
        if let Err(err) = self.write_snapshot(reason) {
            self.error = Some(err);
        }
        RedrawOutcome::Resumed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::AlmaApp;
    use crate::launcher::{AppProcess, CodeLauncher, LaunchError};
    use crate::runtime::RuntimeConfig;
    use serde_json::Value;
    use std::thread;

    struct NoLaunch;

    impl CodeLauncher for NoLaunch {
        fn launch(&mut self, _code: &str, _port: u16) -> Result<Box<dyn AppProcess>, LaunchError> {
            Err(LaunchError::Script(std::io::Error::other("disabled in tests")))
        }
    }

    fn driver() -> SocketDriver {
        let config = RuntimeConfig {
            rng_seed: Some(3),
            ..RuntimeConfig::default()
        };
        let runtime = AlmaRuntime::new(AlmaApp::new(NoLaunch), config, Size::new(80, 24));
        SocketDriver::bind("127.0.0.1:0", runtime).unwrap()
    }

    #[test]
    fn decodes_commands_and_actions() {
        let command = Inbound::decode(r#"{"type":"command","line":"help"}"#).unwrap();
        assert_eq!(
            command,
            Inbound::Control(Control::Command {
                line: "help".into()
            })
        );

        let action = Inbound::decode(r#"{"type":"create_entity","name":"Bot","code":""}"#).unwrap();
        assert_eq!(
            action,
            Inbound::Action(Action::CreateEntity {
                name: "Bot".into(),
                code: String::new(),
            })
        );

        let register = Inbound::decode(r#"{"type":"register","name":"Ada"}"#).unwrap();
        assert!(matches!(register, Inbound::Action(Action::Register { level: 50, .. })));

        assert!(matches!(
            Inbound::decode(r#"{"type":"warp"}"#),
            Err(SocketDriverError::Decode(_))
        ));
    }

    #[test]
    fn client_session_streams_snapshots() {
        let driver = driver().with_max_sessions(Some(1));
        let addr = driver.local_addr().unwrap();
        let server = thread::spawn(move || driver.run());

        let stream = TcpStream::connect(addr).unwrap();
        let mut writer = stream.try_clone().unwrap();
        let mut reader = BufReader::new(stream);
        let mut next = || {
            let mut line = String::new();
            reader.read_line(&mut line).unwrap();
            serde_json::from_str::<Value>(&line).unwrap()
        };

        let first = next();
        assert_eq!(first["mode"], "registration");
        assert_eq!(first["reason"], "session started");

        writeln!(writer, r#"{{"type":"command","line":"register Ada 70"}}"#).unwrap();
        let registered = next();
        assert_eq!(registered["user"]["name"], "Ada");
        assert_eq!(registered["mode"], "tutorial");

        writeln!(writer, "not json").unwrap();
        let rejected = next();
        assert_eq!(rejected["notices"][0]["level"], "warning");
        assert_eq!(rejected["user"]["name"], "Ada");

        writeln!(writer, r#"{{"type":"create_entity","name":"Bot","code":""}}"#).unwrap();
        let created = next();
        assert_eq!(created["entities"][0]["name"], "Bot");

        writeln!(writer, r#"{{"type":"quit"}}"#).unwrap();
        drop(writer);
        drop(reader);

        let runtime = server.join().unwrap().unwrap();
        assert!(runtime.session().state.user.is_none());
    }
}
