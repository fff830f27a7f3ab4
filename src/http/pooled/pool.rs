use crossbeam_channel::{Receiver, Sender};
use http::Request;
use hyper::body::Incoming;
use hyper::client::conn::http1::{self, SendRequest};
use hyper_util::rt::TokioIo;
use tokio::sync::{Semaphore, SemaphorePermit};
use tokio_native_tls::TlsConnector;
use tracing::debug;

use crate::error::{DialError, RequestError};
use crate::http::body::PooledBody;
use crate::http::dial::{BoxedIo, DialTarget, Dialer};

type ConnSender = SendRequest<PooledBody>;

/// Connections to a single host.
///
/// `slots` caps how many connections exist at once; idle ones wait in a
/// lock-free queue that grows as connections are returned.
pub(super) struct HostPool {
    dialer: Dialer,
    tls: Option<TlsConnector>,
    target: DialTarget,
    slots: Semaphore,
    idle_tx: Sender<ConnSender>,
    idle_rx: Receiver<ConnSender>,
    keep_alive: bool,
}

impl HostPool {
    pub(super) fn new(
        dialer: Dialer,
        tls: Option<TlsConnector>,
        target: DialTarget,
        max_conns: usize,
        keep_alive: bool,
    ) -> Self {
        let (idle_tx, idle_rx) = crossbeam_channel::unbounded();
        Self {
            dialer,
            tls,
            target,
            slots: Semaphore::new(max_conns.min(Semaphore::MAX_PERMITS)),
            idle_tx,
            idle_rx,
            keep_alive,
        }
    }

    /// Takes a slot, then reuses an idle connection or dials a new one.
    pub(super) async fn acquire(&self) -> Result<PooledConn<'_>, RequestError> {
        let permit = self
            .slots
            .acquire()
            .await
            .map_err(|source| RequestError::PoolClosed { source })?;

        while let Ok(mut sender) = self.idle_rx.try_recv() {
            if sender.is_closed() {
                continue;
            }
            if sender.ready().await.is_ok() {
                return Ok(PooledConn::new(self, sender, permit));
            }
        }

        let sender = self.connect().await?;
        Ok(PooledConn::new(self, sender, permit))
    }

    async fn connect(&self) -> Result<ConnSender, DialError> {
        let io = self.dialer.dial(&self.target).await?;
        let io: BoxedIo = match self.tls.as_ref() {
            Some(connector) => Box::new(connector.connect(&self.target.host, io).await.map_err(
                |source| DialError::Tls {
                    host: self.target.host.clone(),
                    source,
                },
            )?),
            None => io,
        };

        let (sender, connection) = http1::Builder::new()
            .title_case_headers(true)
            .handshake(TokioIo::new(io))
            .await
            .map_err(|source| DialError::Handshake { source })?;
        let authority = self.target.authority.clone();
        tokio::spawn(async move {
            if let Err(err) = connection.await {
                debug!("Pooled connection to {} closed: {}", authority, err);
            }
        });
        Ok(sender)
    }

    fn release(&self, sender: ConnSender) {
        if !self.keep_alive || sender.is_closed() {
            return;
        }
        // Both ends live in `self`, so the queue is never disconnected.
        let _queued = self.idle_tx.send(sender);
    }
}

/// A connection checked out of the pool, holding one slot.
///
/// Dropping it closes the connection and frees the slot, which is what every
/// early exit does. [`PooledConn::release`] returns it to the idle queue
/// instead.
pub(super) struct PooledConn<'pool> {
    pool: &'pool HostPool,
    sender: ConnSender,
    permit: SemaphorePermit<'pool>,
}

impl<'pool> PooledConn<'pool> {
    const fn new(
        pool: &'pool HostPool,
        sender: ConnSender,
        permit: SemaphorePermit<'pool>,
    ) -> Self {
        Self {
            pool,
            sender,
            permit,
        }
    }

    pub(super) async fn send(
        &mut self,
        request: Request<PooledBody>,
    ) -> Result<http::Response<Incoming>, hyper::Error> {
        self.sender.send_request(request).await
    }

    /// Call once the response has been fully read.
    pub(super) fn release(self) {
        let Self {
            pool,
            sender,
            permit,
        } = self;
        pool.release(sender);
        // The slot is freed after the connection is queued, so the next
        // waiter finds it idle.
        drop(permit);
    }
}
