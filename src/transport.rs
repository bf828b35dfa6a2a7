use std::io;

use log::{debug, error, info, warn};
use tokio::time::{sleep, timeout};

use crate::{
    command::Command,
    config::READ_BUFFER_SIZE,
    connection::ConnectionManager,
    link::LinkError,
    retry::{ReadTiming, RetryPolicy},
};

/// The outcome of one send + receive cycle
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Exchange{
    pub sent: bool,
    pub response: Option<String>,
}

/// Turns commands into bytes on the wire.
///
/// Writes go through the [ConnectionManager], are retried according to the [RetryPolicy],
/// and a reply is read within the bounds of the [ReadTiming].
pub struct CommandTransport{
    connection: ConnectionManager,
    policy: RetryPolicy,
    timing: ReadTiming,
}

impl CommandTransport{
    pub fn new(connection: ConnectionManager, policy: RetryPolicy, timing: ReadTiming) -> CommandTransport {
        Self{
            connection,
            policy,
            timing,
        }
    }

    /// Writes the encoded command, retrying up to the policy's attempt count.
    /// True once one write went through completely.
    pub async fn send(&mut self, command: &Command) -> bool {
        let line = command.encode();
        let max = self.policy.max_attempts();

        for attempt in 1..=max{
            if !self.connection.ensure_open().await{
                warn!("Retrying send of {} ({}/{}): device unavailable", command, attempt, max);
                self.policy.pause_after(attempt).await;
                continue;
            }
            match self.write(line.as_bytes()).await{
                Ok(()) => {
                    info!("Sent {} ({} bytes) on attempt {}/{}", command, line.len(), attempt, max);
                    return true;
                }
                Err(e) => {
                    warn!("Retrying send of {} ({}/{}): {}", command, attempt, max, e);
                    self.connection.invalidate(&e);
                    self.policy.pause_after(attempt).await;
                }
            }
        }

        error!("Could not send {} after {} attempts", command, max);
        false
    }

    async fn write(&mut self, data: &[u8]) -> Result<(), LinkError> {
        let write_timeout = self.policy.write_timeout_time();
        let link = match self.connection.link(){
            Some(link) => link,
            None => return Err(LinkError::Write(io::Error::new(io::ErrorKind::NotConnected, "no handle"))),
        };
        let result = timeout(write_timeout, link.write_all(data)).await;
        match result{
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(LinkError::Write(e)),
            Err(_) => Err(LinkError::Write(io::Error::new(io::ErrorKind::TimedOut, "write did not complete"))),
        }
    }

    /// Waits for the device to answer and reads at most one buffer of reply.
    ///
    /// After the pre-read delay the handle gets one readiness check bounded by the poll window.
    /// A check that times out consumes nothing, so the next send writes straight away.
    /// A missing reply is normal; the device does not acknowledge every command.
    pub async fn receive(&mut self) -> Option<String> {
        sleep(self.timing.pre_read).await;

        let poll = self.timing.poll;
        let link = match self.connection.link(){
            Some(link) => link,
            None => {
                debug!("No handle to read a reply from");
                return None;
            }
        };
        let mut buf = vec![0u8; READ_BUFFER_SIZE];
        let result = timeout(poll, link.read(&mut buf)).await;

        match result{
            Ok(Ok(n)) => {
                let reply = decode_reply(&buf[..n]);
                if let Some(reply) = &reply{
                    info!("Device responded: {}", reply);
                }
                reply
            }
            Ok(Err(e)) => {
                let e = LinkError::Read(e);
                warn!("Could not read reply: {}", e);
                self.connection.invalidate(&e);
                None
            }
            Err(_) => {
                debug!("No reply within {:?}", poll);
                None
            }
        }
    }

    /// Send, give the device a moment, then try to read its reply.
    /// The reply is informational and never changes connection state on its own.
    pub async fn exchange(&mut self, command: &Command) -> Exchange {
        if !self.send(command).await{
            return Exchange{sent: false, response: None};
        }
        sleep(self.timing.grace).await;
        let response = self.receive().await;
        if response.is_none(){
            info!("No confirmation received for {}", command);
        }
        Exchange{sent: true, response}
    }

    pub fn connection(&self) -> &ConnectionManager {
        &self.connection
    }
    pub fn connection_mut(&mut self) -> &mut ConnectionManager {
        &mut self.connection
    }
}

/// Lossy text decode of a reply. Undecodable bytes are dropped, whitespace trimmed.
pub fn decode_reply(bytes: &[u8]) -> Option<String> {
    let text = String::from_utf8_lossy(bytes).replace(char::REPLACEMENT_CHARACTER, "");
    let text = text.trim();
    if text.is_empty(){
        return None;
    }
    Some(text.to_string())
}
