//! Dedicated OSC send thread.
//!
//! Batches are encoded on the calling thread and pushed to a bounded channel.
//! A single sender thread drains the channel and performs `socket.send_to()`
//! packet by packet, so batches reach the server whole and in queue order.
//! Play calls only wait when the queue is full.

use std::io;
use std::net::{SocketAddr, UdpSocket};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, SendError, Sender, TrySendError};

/// One play request's worth of pre-encoded OSC packets.
pub struct OscSendEntry {
    pub packets: Vec<Vec<u8>>,
}

/// Channel capacity for the OSC send queue.
const SEND_QUEUE_CAPACITY: usize = 512;

/// Create the sender channel pair and spawn the sender thread.
///
/// Returns `(Sender, queue_depth, JoinHandle)`.
pub fn spawn_osc_sender(
    socket: UdpSocket,
    server_addr: SocketAddr,
) -> io::Result<(Sender<OscSendEntry>, Arc<AtomicUsize>, JoinHandle<()>)> {
    let (tx, rx) = crossbeam_channel::bounded::<OscSendEntry>(SEND_QUEUE_CAPACITY);
    let queue_depth = Arc::new(AtomicUsize::new(0));
    let depth_clone = Arc::clone(&queue_depth);

    let handle = thread::Builder::new()
        .name("osc-sender".into())
        .spawn(move || {
            sender_loop(socket, server_addr, rx, depth_clone);
        })?;

    Ok((tx, queue_depth, handle))
}

fn sender_loop(
    socket: UdpSocket,
    server_addr: SocketAddr,
    rx: Receiver<OscSendEntry>,
    queue_depth: Arc<AtomicUsize>,
) {
    while let Ok(entry) = rx.recv() {
        for packet in &entry.packets {
            if let Err(e) = socket.send_to(packet, server_addr) {
                log::warn!(target: "timbre::osc", "send to {} failed: {}", server_addr, e);
            }
        }
        // Depth counts batches not yet on the wire.
        queue_depth.fetch_sub(1, Ordering::AcqRel);
    }
}

/// Push an encoded batch to the sender thread, waiting for room when the
/// queue is full so batches never overtake each other.
/// Returns the batch back if the sender thread is gone (caller should send
/// it directly).
pub fn queue_batch(
    tx: &Sender<OscSendEntry>,
    queue_depth: &AtomicUsize,
    packets: Vec<Vec<u8>>,
) -> Result<(), Vec<Vec<u8>>> {
    queue_depth.fetch_add(1, Ordering::AcqRel);
    match tx.try_send(OscSendEntry { packets }) {
        Ok(()) => Ok(()),
        Err(TrySendError::Full(entry)) => {
            log::warn!(target: "timbre::osc", "OSC send queue full, waiting for the sender thread");
            tx.send(entry).map_err(|SendError(entry)| {
                queue_depth.fetch_sub(1, Ordering::AcqRel);
                entry.packets
            })
        }
        Err(TrySendError::Disconnected(entry)) => {
            queue_depth.fetch_sub(1, Ordering::AcqRel);
            Err(entry.packets)
        }
    }
}
