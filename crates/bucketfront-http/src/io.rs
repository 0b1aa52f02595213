//! Connection I/O with idle deadlines.
//!
//! [`DeadlineIo`] fails a read or write that makes no progress for longer
//! than its timeout. Deadlines measure stalls, not total transfer time, so a
//! large object streamed at a steady pace is never cut off.

use std::io;
use std::pin::Pin;
use std::task::{Context, Poll, ready};
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::time::{Sleep, sleep};

/// Read and write idle timeouts for a client connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionTimeouts {
    /// Longest wait for the client to send the next bytes.
    pub read: Duration,
    /// Longest wait for the client to accept more response bytes.
    pub write: Duration,
}

impl Default for ConnectionTimeouts {
    fn default() -> Self {
        Self {
            read: Duration::from_secs(30),
            write: Duration::from_secs(30),
        }
    }
}

/// An I/O stream whose pending reads and writes time out.
#[derive(Debug)]
pub struct DeadlineIo<T> {
    inner: T,
    timeouts: ConnectionTimeouts,
    read_deadline: Option<Pin<Box<Sleep>>>,
    write_deadline: Option<Pin<Box<Sleep>>>,
}

impl<T> DeadlineIo<T> {
    /// Wrap `inner` with the given timeouts.
    #[must_use]
    pub fn new(inner: T, timeouts: ConnectionTimeouts) -> Self {
        Self {
            inner,
            timeouts,
            read_deadline: None,
            write_deadline: None,
        }
    }

    /// The wrapped stream.
    #[must_use]
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Unwrap the stream.
    #[must_use]
    pub fn into_inner(self) -> T {
        self.inner
    }
}

fn poll_deadline(
    deadline: &mut Option<Pin<Box<Sleep>>>,
    timeout: Duration,
    cx: &mut Context<'_>,
    what: &str,
) -> Poll<io::Error> {
    let timer = deadline.get_or_insert_with(|| Box::pin(sleep(timeout)));
    ready!(timer.as_mut().poll(cx));
    *deadline = None;
    Poll::Ready(io::Error::new(
        io::ErrorKind::TimedOut,
        format!("{what} timed out after {timeout:?}"),
    ))
}

impl<T: AsyncRead + Unpin> AsyncRead for DeadlineIo<T> {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        match Pin::new(&mut this.inner).poll_read(cx, buf) {
            Poll::Ready(result) => {
                this.read_deadline = None;
                Poll::Ready(result)
            }
            Poll::Pending => {
                let timeout = this.timeouts.read;
                poll_deadline(&mut this.read_deadline, timeout, cx, "read").map(Err)
            }
        }
    }
}

impl<T: AsyncWrite + Unpin> DeadlineIo<T> {
    fn track_write<R>(
        &mut self,
        cx: &mut Context<'_>,
        poll: Poll<io::Result<R>>,
    ) -> Poll<io::Result<R>> {
        match poll {
            Poll::Ready(result) => {
                self.write_deadline = None;
                // A client draining a long response is not idle.
                if result.is_ok() {
                    self.read_deadline = None;
                }
                Poll::Ready(result)
            }
            Poll::Pending => {
                let timeout = self.timeouts.write;
                poll_deadline(&mut self.write_deadline, timeout, cx, "write").map(Err)
            }
        }
    }
}

impl<T: AsyncWrite + Unpin> AsyncWrite for DeadlineIo<T> {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        let this = self.get_mut();
        let poll = Pin::new(&mut this.inner).poll_write(cx, buf);
        this.track_write(cx, poll)
    }

    fn poll_write_vectored(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        bufs: &[io::IoSlice<'_>],
    ) -> Poll<io::Result<usize>> {
        let this = self.get_mut();
        let poll = Pin::new(&mut this.inner).poll_write_vectored(cx, bufs);
        this.track_write(cx, poll)
    }

    fn is_write_vectored(&self) -> bool {
        self.inner.is_write_vectored()
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        let poll = Pin::new(&mut this.inner).poll_flush(cx);
        this.track_write(cx, poll)
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().inner).poll_shutdown(cx)
    }
}
