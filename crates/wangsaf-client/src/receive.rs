//! Background receive loop.
//!
//! One loop per connection. It reads until cancelled, until the peer closes,
//! or until a read fails, decoding records and delivering them through the
//! connection's gate. The loop never touches the write half; on peer close
//! or failure it asks the session to tear the connection down.

use std::{io, sync::Arc};

use tokio::io::{AsyncReadExt, ReadHalf};
use tokio_util::sync::CancellationToken;
use wangsaf_proto::{PendingBuffer, Record};

use crate::{
    event::{DeliveryGate, SessionEvent},
    session::{Cause, Shared},
    transport::ByteStream,
};

/// Why the loop stopped reading.
#[derive(Debug)]
enum Exit {
    Cancelled,
    PeerClosed,
    Failed(io::Error),
}

pub(crate) struct ReceiveLoop<S: ByteStream> {
    reader: ReadHalf<S>,
    pending: PendingBuffer,
    shared: Arc<Shared<S>>,
    gate: DeliveryGate,
    cancel: CancellationToken,
    generation: u64,
    chunk_size: usize,
}

impl<S: ByteStream> ReceiveLoop<S> {
    pub(crate) fn new(
        reader: ReadHalf<S>,
        shared: Arc<Shared<S>>,
        gate: DeliveryGate,
        cancel: CancellationToken,
        generation: u64,
    ) -> Self {
        let pending = PendingBuffer::with_max_line(shared.config.max_line_length);
        let chunk_size = shared.config.read_buffer_size.max(1);
        Self { reader, pending, shared, gate, cancel, generation, chunk_size }
    }

    /// Read until the connection ends, then request teardown if the loop was
    /// not cancelled.
    pub(crate) async fn run(mut self) {
        let generation = self.generation;
        tracing::debug!(generation, "receive loop started");

        match self.pump().await {
            Exit::Cancelled => {
                tracing::debug!(generation, "receive loop cancelled");
            },
            Exit::PeerClosed => {
                tracing::info!(generation, "server closed the connection");
                self.shared.shut_down(generation, Cause::PeerClosed).await;
            },
            Exit::Failed(error) => {
                tracing::warn!(generation, %error, "receive failed");
                self.shared.shut_down(generation, Cause::ReadFailed(error.to_string())).await;
            },
        }
    }

    async fn pump(&mut self) -> Exit {
        let mut chunk = vec![0u8; self.chunk_size];

        loop {
            let read = tokio::select! {
                biased;
                () = self.cancel.cancelled() => return Exit::Cancelled,
                read = self.reader.read(&mut chunk) => read,
            };

            match read {
                Ok(0) => {
                    // The peer may close without terminating its last record.
                    if let Some(record) = self.pending.finish() {
                        self.dispatch(record);
                    }
                    return Exit::PeerClosed;
                },
                Ok(n) => {
                    self.pending.extend(&chunk[..n]);
                    for record in self.pending.drain_records() {
                        self.dispatch(record);
                    }
                },
                // Errors caused by our own teardown are not failures.
                Err(_) if self.cancel.is_cancelled() => return Exit::Cancelled,
                Err(error) => return Exit::Failed(error),
            }
        }
    }

    fn dispatch(&self, record: Record) {
        let tag = record.tag();
        match SessionEvent::from_record(record) {
            Some(event) => {
                if !self.gate.deliver(event) {
                    tracing::trace!(tag, "record after teardown dropped");
                }
            },
            None => tracing::trace!(tag, "record ignored"),
        }
    }
}
