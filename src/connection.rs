use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use log::{debug, error, info};

use crate::link::{Connector, Link, LinkError};

/// Read-only view of whether the manager currently holds a handle.
///
/// Cloned out to status readers so they never wait behind device I/O.
#[derive(Clone, Default, Debug)]
pub struct ConnectionFlag(Arc<AtomicBool>);

impl ConnectionFlag{
    pub fn get(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
    fn set(&self, connected: bool){
        self.0.store(connected, Ordering::Release);
    }
}

/// Owns the handle to the device.
///
/// Two states: no handle (disconnected) and a live handle (connected).
/// Any I/O failure drops the handle and the next [ConnectionManager::ensure_open] reopens it.
/// The manager never retries on its own; that is the transport's job.
pub struct ConnectionManager{
    connector: Arc<dyn Connector>,
    handle: Option<Box<dyn Link>>,
    flag: ConnectionFlag,
    last_error: Option<String>,
}

impl ConnectionManager{
    pub fn new(connector: Arc<dyn Connector>) -> ConnectionManager {
        Self{
            connector,
            handle: None,
            flag: ConnectionFlag::default(),
            last_error: None,
        }
    }

    /// Opens the device if no handle is held. True iff a handle is held afterwards.
    pub async fn ensure_open(&mut self) -> bool {
        if self.handle.is_some(){
            return true;
        }
        match self.connector.open().await{
            Ok(link) => {
                info!("Connected to uart driver at {}", self.connector.describe());
                self.handle = Some(link);
                self.last_error = None;
                self.flag.set(true);
                true
            }
            Err(e) => {
                let e = LinkError::Unavailable(e);
                error!("Could not connect to uart driver at {}: {}", self.connector.describe(), e);
                self.last_error = Some(e.to_string());
                false
            }
        }
    }

    /// Drops the handle after an I/O failure
    pub fn invalidate(&mut self, cause: &LinkError){
        if self.handle.take().is_some(){
            debug!("Dropping handle on {} after: {}", self.connector.describe(), cause);
        }
        self.last_error = Some(cause.to_string());
        self.flag.set(false);
    }

    /// Releases the handle if one is held
    pub fn close(&mut self){
        if self.handle.take().is_some(){
            info!("Closed connection to uart driver at {}", self.connector.describe());
        }
        self.flag.set(false);
    }

    pub fn is_connected(&self) -> bool {
        self.handle.is_some()
    }

    /// The live handle, if any
    pub fn link(&mut self) -> Option<&mut (dyn Link + 'static)> {
        self.handle.as_deref_mut()
    }

    pub fn flag(&self) -> ConnectionFlag {
        self.flag.clone()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn describe(&self) -> String {
        self.connector.describe()
    }
}

impl Drop for ConnectionManager{
    fn drop(&mut self){
        self.close();
    }
}

#[cfg(test)]
mod tests{
    use std::{io, sync::atomic::AtomicUsize};

    use async_trait::async_trait;

    use super::*;

    struct NullLink;

    #[async_trait]
    impl Link for NullLink{
        async fn write_all(&mut self, _data: &[u8]) -> io::Result<()> {
            Ok(())
        }
        async fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Ok(0)
        }
    }

    /// Fails the first `fail_first` opens
    struct FlakyConnector{
        fail_first: usize,
        opens: AtomicUsize,
    }

    #[async_trait]
    impl Connector for FlakyConnector{
        async fn open(&self) -> io::Result<Box<dyn Link>> {
            let n = self.opens.fetch_add(1, Ordering::SeqCst);
            if n < self.fail_first{
                return Err(io::Error::new(io::ErrorKind::NotFound, "no driver"));
            }
            Ok(Box::new(NullLink))
        }
        fn describe(&self) -> String {
            "flaky".into()
        }
    }

    fn manager(fail_first: usize) -> (ConnectionManager, Arc<FlakyConnector>) {
        let connector = Arc::new(FlakyConnector{fail_first, opens: AtomicUsize::new(0)});
        (ConnectionManager::new(connector.clone()), connector)
    }

    #[tokio::test]
    async fn starts_disconnected_and_opens_lazily(){
        let (mut mgr, connector) = manager(0);
        assert!(!mgr.is_connected());
        assert!(!mgr.flag().get());
        assert!(mgr.ensure_open().await);
        assert!(mgr.ensure_open().await);
        assert_eq!(connector.opens.load(Ordering::SeqCst), 1);
        assert!(mgr.flag().get());
    }

    #[tokio::test]
    async fn open_failure_is_not_retried(){
        let (mut mgr, connector) = manager(1);
        assert!(!mgr.ensure_open().await);
        assert_eq!(connector.opens.load(Ordering::SeqCst), 1);
        assert_eq!(mgr.last_error(), Some("device unavailable: no driver"));
        assert!(mgr.ensure_open().await);
        assert_eq!(mgr.last_error(), None);
    }

    #[tokio::test]
    async fn invalidate_forces_reopen(){
        let (mut mgr, connector) = manager(0);
        assert!(mgr.ensure_open().await);
        mgr.invalidate(&LinkError::Write(io::Error::new(io::ErrorKind::BrokenPipe, "gone")));
        assert!(!mgr.is_connected());
        assert!(!mgr.flag().get());
        assert!(mgr.link().is_none());
        assert!(mgr.ensure_open().await);
        assert_eq!(connector.opens.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn close_releases_handle(){
        let (mut mgr, _) = manager(0);
        let flag = mgr.flag();
        mgr.ensure_open().await;
        mgr.close();
        assert!(!mgr.is_connected());
        assert!(!flag.get());
    }
}
