#![allow(dead_code)]
use std::{
    collections::VecDeque,
    io,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
};

use async_trait::async_trait;
use setpoint_bridge::link::{Connector, Link};
use tokio::time::Duration;

/// How the fake device misbehaves
#[derive(Default)]
pub struct Script{
    /// Opens that fail before one succeeds
    pub fail_opens: usize,
    /// Writes that fail before one succeeds
    pub fail_writes: usize,
    /// Writes never complete
    pub hang_writes: bool,
    /// Reads never complete
    pub hang_reads: bool,
    /// Reads fail
    pub fail_reads: bool,
    /// Split every write in two with a pause in between
    pub split_writes: Option<Duration>,
    /// Queued replies, one per read
    pub replies: VecDeque<Vec<u8>>,
}

/// Everything the fake device saw
#[derive(Default)]
pub struct Wire{
    pub script: Mutex<Script>,
    pub opens: AtomicUsize,
    pub writes: AtomicUsize,
    pub reads: AtomicUsize,
    pub bytes: Mutex<Vec<u8>>,
}

impl Wire{
    pub fn new(script: Script) -> Arc<Wire> {
        Arc::new(Self{
            script: Mutex::new(script),
            ..Default::default()
        })
    }
    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.bytes.lock().unwrap()).to_string()
    }
    pub fn reply(&self, reply: &str){
        self.script.lock().unwrap().replies.push_back(reply.as_bytes().to_vec());
    }
}

pub struct FakeConnector{
    pub wire: Arc<Wire>,
}

impl FakeConnector{
    pub fn new(script: Script) -> (Arc<FakeConnector>, Arc<Wire>) {
        let wire = Wire::new(script);
        (Arc::new(Self{wire: wire.clone()}), wire)
    }
}

#[async_trait]
impl Connector for FakeConnector{
    async fn open(&self) -> io::Result<Box<dyn Link>> {
        self.wire.opens.fetch_add(1, Ordering::SeqCst);
        let mut script = self.wire.script.lock().unwrap();
        if script.fail_opens > 0{
            script.fail_opens -= 1;
            return Err(io::Error::new(io::ErrorKind::NotFound, "no such device"));
        }
        Ok(Box::new(FakeLink{wire: self.wire.clone()}))
    }
    fn describe(&self) -> String {
        "/dev/fake_uart".into()
    }
}

pub struct FakeLink{
    wire: Arc<Wire>,
}

#[async_trait]
impl Link for FakeLink{
    async fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        self.wire.writes.fetch_add(1, Ordering::SeqCst);
        let (hang, split) = {
            let mut script = self.wire.script.lock().unwrap();
            if script.fail_writes > 0{
                script.fail_writes -= 1;
                return Err(io::Error::new(io::ErrorKind::BrokenPipe, "link dropped"));
            }
            (script.hang_writes, script.split_writes)
        };
        if hang{
            std::future::pending::<()>().await;
        }
        match split{
            Some(pause) => {
                let half = data.len() / 2;
                self.wire.bytes.lock().unwrap().extend_from_slice(&data[..half]);
                tokio::time::sleep(pause).await;
                self.wire.bytes.lock().unwrap().extend_from_slice(&data[half..]);
            }
            None => self.wire.bytes.lock().unwrap().extend_from_slice(data),
        }
        Ok(())
    }

    async fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.wire.reads.fetch_add(1, Ordering::SeqCst);
        let (hang, fail, reply) = {
            let mut script = self.wire.script.lock().unwrap();
            (script.hang_reads, script.fail_reads, script.replies.pop_front())
        };
        if hang{
            std::future::pending::<()>().await;
        }
        if fail{
            return Err(io::Error::new(io::ErrorKind::Other, "read error"));
        }
        match reply{
            Some(reply) => {
                let n = reply.len().min(buf.len());
                buf[..n].copy_from_slice(&reply[..n]);
                Ok(n)
            }
            None => Ok(0),
        }
    }
}
