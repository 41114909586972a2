//! Connection wrapper handed to behaviors.
//!
//! Wraps any bidirectional byte stream into the line-oriented interface the
//! behaviors work against: buffered line reads with end-of-stream detection,
//! and flushed writes so each write is observable to the peer as it happens.
//!
//! The accept loop builds one from a `TcpStream`; tests drive behaviors over
//! `tokio::io::duplex` pipes.

use tokio::io::{
    AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, ReadHalf, WriteHalf,
};

/// Any stream a behavior can be driven over.
pub trait Stream: AsyncRead + AsyncWrite + Send + Unpin {}

impl<T: AsyncRead + AsyncWrite + Send + Unpin> Stream for T {}

/// A single client connection.
///
/// Dropping the connection closes the underlying stream.
pub struct Connection {
    reader: BufReader<ReadHalf<Box<dyn Stream>>>,
    writer: WriteHalf<Box<dyn Stream>>,
}

impl Connection {
    /// Wrap a stream for behavior handling.
    pub fn new(stream: impl Stream + 'static) -> Self {
        let boxed: Box<dyn Stream> = Box::new(stream);
        let (reader, writer) = tokio::io::split(boxed);

        Connection {
            reader: BufReader::new(reader),
            writer,
        }
    }

    /// Read one line from the peer.
    ///
    /// Returns `None` at end of stream. The line terminator is stripped.
    pub async fn read_line(&mut self) -> std::io::Result<Option<String>> {
        let mut line = String::new();

        let n = self.reader.read_line(&mut line).await?;
        if n == 0 {
            // EOF
            return Ok(None);
        }

        while line.ends_with('\n') || line.ends_with('\r') {
            line.pop();
        }
        Ok(Some(line))
    }

    /// Write a string to the peer and flush it out.
    pub async fn write_str(&mut self, s: &str) -> std::io::Result<()> {
        self.write_bytes(s.as_bytes()).await
    }

    /// Write raw bytes to the peer and flush them out.
    ///
    /// Each call is a single write event from the peer's point of view.
    pub async fn write_bytes(&mut self, bytes: &[u8]) -> std::io::Result<()> {
        self.writer.write_all(bytes).await?;
        self.writer.flush().await
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted stream for driving behaviors in tests: serves a fixed input
    //! and records every write call as a separate chunk.

    use super::*;
    use crate::behavior::{Behavior, Options};
    use std::pin::Pin;
    use std::sync::{Arc, Mutex};
    use std::task::{Context, Poll};
    use tokio::io::ReadBuf;

    pub(crate) struct ScriptedStream {
        input: Vec<u8>,
        pos: usize,
        writes: Arc<Mutex<Vec<Vec<u8>>>>,
    }

    impl ScriptedStream {
        pub(crate) fn new(input: &str) -> (Self, Arc<Mutex<Vec<Vec<u8>>>>) {
            let writes = Arc::new(Mutex::new(Vec::new()));
            let stream = ScriptedStream {
                input: input.as_bytes().to_vec(),
                pos: 0,
                writes: Arc::clone(&writes),
            };
            (stream, writes)
        }
    }

    impl AsyncRead for ScriptedStream {
        fn poll_read(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &mut ReadBuf<'_>,
        ) -> Poll<std::io::Result<()>> {
            let this = self.get_mut();
            let remaining = &this.input[this.pos..];
            if remaining.is_empty() {
                // EOF
                return Poll::Ready(Ok(()));
            }
            let n = remaining.len().min(buf.remaining());
            buf.put_slice(&remaining[..n]);
            this.pos += n;
            Poll::Ready(Ok(()))
        }
    }

    impl AsyncWrite for ScriptedStream {
        fn poll_write(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            data: &[u8],
        ) -> Poll<std::io::Result<usize>> {
            self.writes.lock().unwrap().push(data.to_vec());
            Poll::Ready(Ok(data.len()))
        }

        fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
            Poll::Ready(Ok(()))
        }

        fn poll_shutdown(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
        ) -> Poll<std::io::Result<()>> {
            Poll::Ready(Ok(()))
        }
    }

    /// Run a behavior over a scripted stream, returning the recorded write
    /// chunks (one entry per write call).
    pub(crate) async fn drive(
        behavior: &dyn Behavior,
        options: &Options,
        input: &str,
    ) -> Vec<Vec<u8>> {
        let (stream, writes) = ScriptedStream::new(input);
        let mut conn = Connection::new(stream);
        behavior.handle(&mut conn, options).await.unwrap();
        drop(conn);

        let chunks = writes.lock().unwrap().clone();
        chunks
    }

    /// Like [`drive`], but flattens the chunks into one byte string.
    pub(crate) async fn drive_collect(
        behavior: &dyn Behavior,
        options: &Options,
        input: &str,
    ) -> Vec<u8> {
        drive(behavior, options, input).await.concat()
    }
}
