use std::{
    fmt,
    fs::{File, OpenOptions},
    io::{self, Read, Write},
    os::unix::fs::OpenOptionsExt,
    path::PathBuf,
};

use async_trait::async_trait;
use tokio::io::unix::AsyncFd;

/// What went wrong while talking to the device
#[derive(Debug)]
pub enum LinkError{
    /// The device file could not be opened
    Unavailable(io::Error),
    /// The handle rejected the write or the write never completed
    Write(io::Error),
    /// The handle failed while reading a reply
    Read(io::Error),
}

impl fmt::Display for LinkError{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self{
            LinkError::Unavailable(e) => write!(f, "device unavailable: {}", e),
            LinkError::Write(e) => write!(f, "write failed: {}", e),
            LinkError::Read(e) => write!(f, "read failed: {}", e),
        }
    }
}

impl std::error::Error for LinkError{
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self{
            LinkError::Unavailable(e) | LinkError::Write(e) | LinkError::Read(e) => Some(e),
        }
    }
}

/// An open duplex byte channel to the microcontroller
#[async_trait]
pub trait Link: Send{
    /// Writes every byte of `data` or fails
    async fn write_all(&mut self, data: &[u8]) -> io::Result<()>;
    /// Waits until the device has data, then reads once into `buf`. Zero means end of stream.
    ///
    /// Must be cancel safe: dropping the future before data arrives consumes nothing and
    /// leaves the handle free for the next write.
    async fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;
}

/// Produces fresh links. The connection manager calls this every time it has no handle.
#[async_trait]
pub trait Connector: Send + Sync{
    async fn open(&self) -> io::Result<Box<dyn Link>>;
    /// Human readable location of the device, shown in status snapshots
    fn describe(&self) -> String;
}

/// Opens the character device exposed by the uart driver.
///
/// The device is opened non-blocking and registered with the reactor, so it has to be
/// pollable (a character device or a fifo). Regular files are refused.
#[derive(Clone, Debug)]
pub struct DeviceConnector{
    path: PathBuf,
}

impl DeviceConnector{
    pub fn new(path: impl Into<PathBuf>) -> DeviceConnector {
        Self{
            path: path.into(),
        }
    }
}

#[async_trait]
impl Connector for DeviceConnector{
    async fn open(&self) -> io::Result<Box<dyn Link>> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(libc::O_NONBLOCK | libc::O_NOCTTY)
            .open(&self.path)?;
        Ok(Box::new(DeviceLink{fd: AsyncFd::new(file)?}))
    }
    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// A non-blocking read-write handle on the device
pub struct DeviceLink{
    fd: AsyncFd<File>,
}

#[async_trait]
impl Link for DeviceLink{
    async fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        let mut rest = data;
        while !rest.is_empty(){
            let mut guard = self.fd.writable_mut().await?;
            match guard.try_io(|fd| fd.get_mut().write(rest)){
                Ok(Ok(0)) => return Err(io::ErrorKind::WriteZero.into()),
                Ok(Ok(n)) => rest = &rest[n..],
                Ok(Err(e)) => return Err(e),
                Err(_would_block) => continue,
            }
        }
        Ok(())
    }
    async fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        loop{
            let mut guard = self.fd.readable_mut().await?;
            match guard.try_io(|fd| fd.get_mut().read(buf)){
                Ok(result) => return result,
                Err(_would_block) => continue,
            }
        }
    }
}
