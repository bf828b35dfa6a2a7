use std::{io, sync::Arc};

use log::{error, info, warn};
use serde::Serialize;
use tokio::sync::Mutex;

use crate::{
    command::Command,
    config::BridgeConfig,
    connection::{ConnectionFlag, ConnectionManager},
    journal::Journal,
    link::{Connector, DeviceConnector},
    retry::{ReadTiming, RetryPolicy},
    setpoint::Setpoint,
    transport::CommandTransport,
};

/// Read-only snapshot for health displays
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct BridgeStatus{
    pub connected: bool,
    pub device_path: String,
    pub target: i32,
    pub minimum: i32,
    pub maximum: i32,
}

/// What happened to one execute
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct ExecuteReport{
    pub setpoint: Setpoint,
    pub command: String,
    pub sent: bool,
    pub response: Option<String>,
}

impl ExecuteReport{
    /// The device answered the command
    pub fn confirmed(&self) -> bool {
        self.sent && self.response.is_some()
    }
}

#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ReplyStatus{
    Success,
    Error,
}

/// What happened to one free-form command
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct CustomReply{
    pub status: ReplyStatus,
    pub message: String,
    pub response: Option<String>,
}

impl CustomReply{
    fn error(message: &str) -> CustomReply {
        Self{
            status: ReplyStatus::Error,
            message: message.into(),
            response: None,
        }
    }
}

/// The command bridge.
///
/// Owns the setpoints and the transport to the device. Every device cycle (open, write,
/// read, invalidate) runs under one lock, so concurrent callers never interleave bytes on the
/// handle. Setpoint changes take a separate lock and never wait behind device I/O.
pub struct Bridge{
    setpoint: Mutex<Setpoint>,
    transport: Mutex<CommandTransport>,
    connected: ConnectionFlag,
    device: String,
    journal: Option<Journal>,
}

/// Assembles a [Bridge]
pub struct BridgeBuilder{
    connector: Arc<dyn Connector>,
    policy: RetryPolicy,
    timing: ReadTiming,
    journal: Option<Journal>,
    setpoint: Setpoint,
}

impl BridgeBuilder{
    pub fn policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }
    pub fn timing(mut self, timing: ReadTiming) -> Self {
        self.timing = timing;
        self
    }
    pub fn journal(mut self, journal: Journal) -> Self {
        self.journal = Some(journal);
        self
    }
    pub fn setpoint(mut self, setpoint: Setpoint) -> Self {
        self.setpoint = setpoint;
        self
    }

    /// Builds the bridge and tries to connect once. Staying disconnected is fine;
    /// sends will keep trying to open the device.
    pub async fn build(self) -> Arc<Bridge> {
        let device = self.connector.describe();
        let mut connection = ConnectionManager::new(self.connector);
        let connected = connection.flag();
        if !connection.ensure_open().await{
            warn!("Starting without a connection to {}", device);
        }
        Arc::new(Bridge{
            setpoint: Mutex::new(self.setpoint),
            transport: Mutex::new(CommandTransport::new(connection, self.policy, self.timing)),
            connected,
            device,
            journal: self.journal,
        })
    }
}

impl Bridge{
    pub fn builder(connector: Arc<dyn Connector>) -> BridgeBuilder {
        BridgeBuilder{
            connector,
            policy: RetryPolicy::default(),
            timing: ReadTiming::default(),
            journal: None,
            setpoint: Setpoint::default(),
        }
    }

    /// A bridge on the configured device file, journaling to the configured paths
    pub async fn from_config(cfg: &BridgeConfig) -> Arc<Bridge> {
        Self::configured(cfg).await.build().await
    }

    /// Builder preloaded from the config, for callers that need to tweak it before connecting
    pub async fn configured(cfg: &BridgeConfig) -> BridgeBuilder {
        let policy = RetryPolicy::default().attempts(cfg.attempts).backoff(cfg.backoff());
        let timing = ReadTiming{
            grace: cfg.grace(),
            pre_read: cfg.pre_read(),
            poll: cfg.poll(),
        };
        let builder = Self::builder(Arc::new(DeviceConnector::new(&cfg.device)))
            .policy(policy)
            .timing(timing);
        match Journal::open(&cfg.history, &cfg.state).await{
            Ok(journal) => builder.journal(journal),
            Err(e) => {
                error!("Could not open history {}: {}", cfg.history.display(), e);
                builder
            }
        }
    }

    async fn adjust(&self, what: &str, step: fn(&mut Setpoint)) -> Setpoint {
        let mut sp = self.setpoint.lock().await;
        step(&mut *sp);
        info!("{} -> {}", what, *sp);
        *sp
    }

    pub async fn increment_target(&self) -> Setpoint {
        self.adjust("Increment TARGET", Setpoint::increment_target).await
    }
    pub async fn decrement_target(&self) -> Setpoint {
        self.adjust("Decrement TARGET", Setpoint::decrement_target).await
    }
    pub async fn increment_minimum(&self) -> Setpoint {
        self.adjust("Increment MINIMO", Setpoint::increment_minimum).await
    }
    pub async fn decrement_minimum(&self) -> Setpoint {
        self.adjust("Decrement MINIMO", Setpoint::decrement_minimum).await
    }
    pub async fn increment_maximum(&self) -> Setpoint {
        self.adjust("Increment MAXIMO", Setpoint::increment_maximum).await
    }
    pub async fn decrement_maximum(&self) -> Setpoint {
        self.adjust("Decrement MAXIMO", Setpoint::decrement_maximum).await
    }

    pub async fn setpoint(&self) -> Setpoint {
        *self.setpoint.lock().await
    }

    /// Pushes the current setpoints to the device.
    ///
    /// The journal is written whether or not the send goes through, and the setpoints are
    /// never rolled back on failure.
    pub async fn execute(&self) -> ExecuteReport {
        let mut transport = self.transport.lock().await;
        let sp = self.setpoint().await;

        if let Some(journal) = &self.journal{
            if let Err(e) = journal.record(&sp).await{
                error!("Could not write history {}: {}", journal.history_path().display(), e);
            }
        }

        let command = Command::from(sp);
        let exchange = transport.exchange(&command).await;
        drop(transport);

        if exchange.sent{
            info!("Command sent: {}", command);
        }
        else{
            error!("Command not sent: {}", command);
        }
        info!("EXECUTE -> {}", sp);

        ExecuteReport{
            setpoint: sp,
            command: command.wire(),
            sent: exchange.sent,
            response: exchange.response,
        }
    }

    /// Pushes operator text as is
    pub async fn send_custom(&self, text: &str) -> CustomReply {
        let command = match Command::custom(text){
            Ok(c) => c,
            Err(_) => return CustomReply::error("Empty command"),
        };
        let exchange = self.transport.lock().await.exchange(&command).await;
        if !exchange.sent{
            return CustomReply::error("Failed to send command");
        }
        info!("Custom command sent: {}", command);
        CustomReply{
            status: ReplyStatus::Success,
            message: format!("Command '{}' sent", command),
            response: exchange.response,
        }
    }

    pub async fn status(&self) -> BridgeStatus {
        let sp = self.setpoint().await;
        BridgeStatus{
            connected: self.connected.get(),
            device_path: self.device.clone(),
            target: sp.target(),
            minimum: sp.minimum(),
            maximum: sp.maximum(),
        }
    }

    /// Text of the last connection failure, if the link is currently broken
    pub async fn last_error(&self) -> Option<String> {
        let transport = self.transport.lock().await;
        transport.connection().last_error().map(str::to_string)
    }

    /// Contents of the execute history
    pub async fn history(&self) -> io::Result<String> {
        match &self.journal{
            Some(journal) => journal.history().await,
            None => Err(io::Error::new(io::ErrorKind::NotFound, "no history configured")),
        }
    }

    pub fn device_path(&self) -> &str {
        &self.device
    }

    /// Releases the device handle. Waits for any cycle in flight.
    pub async fn close(&self){
        self.transport.lock().await.connection_mut().close();
    }
}
