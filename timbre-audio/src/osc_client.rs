use std::io;
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::Sender;
use rosc::{OscMessage, OscPacket, OscType};
use timbre_types::{ControlMessage, RawArg};

use crate::osc_sender::{queue_batch, spawn_osc_sender, OscSendEntry};

/// Convert `RawArg` to `rosc::OscType`.
fn raw_to_osc(arg: RawArg) -> OscType {
    match arg {
        RawArg::Int(v) => OscType::Int(v),
        RawArg::Float(v) => OscType::Float(v),
        RawArg::Str(v) => OscType::String(v),
    }
}

/// Encode one control message as a standalone OSC packet.
pub fn encode_message(message: ControlMessage) -> io::Result<Vec<u8>> {
    let packet = OscPacket::Message(OscMessage {
        addr: message.addr,
        args: message.args.into_iter().map(raw_to_osc).collect(),
    });
    rosc::encoder::encode(&packet)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e.to_string()))
}

/// UDP client for a SuperCollider server.
pub struct OscClient {
    socket: UdpSocket,
    server_addr: SocketAddr,
    queue: Option<(Sender<OscSendEntry>, Arc<AtomicUsize>)>,
    _send_thread: Option<JoinHandle<()>>,
    /// One reply waiter at a time owns the socket's receive side.
    replies: Mutex<()>,
}

/// Largest reply datagram read back from the server.
const REPLY_BUFFER: usize = 1536;

impl OscClient {
    pub fn new(server_addr: &str) -> io::Result<Self> {
        let server_addr = server_addr.to_socket_addrs()?.next().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("could not resolve {}", server_addr),
            )
        })?;
        let socket = UdpSocket::bind("0.0.0.0:0")?;

        // Queued sends go through the sender thread; if it cannot be spawned,
        // everything is sent directly.
        let (queue, handle) = match socket
            .try_clone()
            .and_then(|s| spawn_osc_sender(s, server_addr))
        {
            Ok((tx, depth, handle)) => (Some((tx, depth)), Some(handle)),
            Err(e) => {
                log::warn!(target: "timbre::osc", "osc sender thread unavailable: {}", e);
                (None, None)
            }
        };

        Ok(Self {
            socket,
            server_addr,
            queue,
            _send_thread: handle,
            replies: Mutex::new(()),
        })
    }

    pub fn server_addr(&self) -> SocketAddr {
        self.server_addr
    }

    /// Block until every queued batch has been written to the socket, or
    /// `timeout` passes. Returns whether the queue drained.
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        let Some((_, ref depth)) = self.queue else {
            return true;
        };
        let deadline = Instant::now() + timeout;
        while depth.load(Ordering::Acquire) > 0 {
            if Instant::now() >= deadline {
                return false;
            }
            thread::sleep(Duration::from_millis(1));
        }
        true
    }

    /// Send `message` (again every `retry`) until the server answers with a
    /// message accepted by `accept`, or `timeout` passes. The request goes
    /// through the send queue, so it follows everything sent before it.
    pub fn request<F>(
        &self,
        message: ControlMessage,
        timeout: Duration,
        retry: Duration,
        accept: F,
    ) -> io::Result<OscMessage>
    where
        F: Fn(&OscMessage) -> bool,
    {
        let _waiter = self.replies.lock().unwrap_or_else(|e| e.into_inner());
        let deadline = Instant::now() + timeout;
        let mut buf = [0u8; REPLY_BUFFER];
        while Instant::now() < deadline {
            self.send_batch(vec![message.clone()])?;
            let resend_at = (Instant::now() + retry).min(deadline);
            loop {
                let wait = resend_at.saturating_duration_since(Instant::now());
                if wait.is_zero() {
                    break;
                }
                self.socket.set_read_timeout(Some(wait))?;
                match self.socket.recv(&mut buf) {
                    Ok(n) => {
                        if let Ok((_, OscPacket::Message(reply))) = rosc::decoder::decode_udp(&buf[..n]) {
                            if accept(&reply) {
                                return Ok(reply);
                            }
                            log::trace!(target: "timbre::osc", "ignoring reply {}", reply.addr);
                        }
                    }
                    // Nothing yet, or the server's port is not open yet.
                    Err(e) if matches!(
                        e.kind(),
                        io::ErrorKind::WouldBlock
                            | io::ErrorKind::TimedOut
                            | io::ErrorKind::ConnectionRefused
                            | io::ErrorKind::ConnectionReset
                    ) => break,
                    Err(e) => return Err(e),
                }
            }
        }
        Err(io::Error::new(
            io::ErrorKind::TimedOut,
            format!("no reply to {} from {} within {:?}", message.addr, self.server_addr, timeout),
        ))
    }

    /// Encode and deliver `messages` in order.
    pub fn send_batch(&self, messages: Vec<ControlMessage>) -> io::Result<()> {
        let packets = messages
            .into_iter()
            .map(encode_message)
            .collect::<io::Result<Vec<_>>>()?;

        let packets = match self.queue {
            Some((ref tx, ref depth)) => match queue_batch(tx, depth, packets) {
                Ok(()) => return Ok(()),
                Err(packets) => packets,
            },
            None => packets,
        };
        for packet in &packets {
            self.socket.send_to(packet, self.server_addr)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use timbre_types::message::build_n_set_message;

    #[test]
    fn encoded_message_decodes() {
        let bytes = encode_message(build_n_set_message(5, "freq", 440.0)).unwrap();
        let (_, packet) = rosc::decoder::decode_udp(&bytes).unwrap();
        match packet {
            OscPacket::Message(msg) => {
                assert_eq!(msg.addr, "/n_set");
                assert_eq!(
                    msg.args,
                    vec![
                        OscType::Int(5),
                        OscType::String("freq".into()),
                        OscType::Float(440.0)
                    ]
                );
            }
            other => panic!("expected message, got {:?}", other),
        }
    }

    #[test]
    fn batch_reaches_server_in_order() {
        let server = UdpSocket::bind("127.0.0.1:0").unwrap();
        server.set_read_timeout(Some(Duration::from_secs(2))).unwrap();
        let addr = server.local_addr().unwrap().to_string();

        let client = OscClient::new(&addr).unwrap();
        client
            .send_batch(vec![
                build_n_set_message(2, "freq", 1.0),
                build_n_set_message(2, "mul", 0.5),
            ])
            .unwrap();

        let mut buf = [0u8; 256];
        let mut names = Vec::new();
        for _ in 0..2 {
            let n = server.recv(&mut buf).unwrap();
            if let (_, OscPacket::Message(msg)) = rosc::decoder::decode_udp(&buf[..n]).unwrap() {
                names.push(msg.args[1].clone());
            }
        }
        assert_eq!(
            names,
            vec![OscType::String("freq".into()), OscType::String("mul".into())]
        );
    }

    #[test]
    fn wait_idle_returns_once_queue_drains() {
        let server = UdpSocket::bind("127.0.0.1:0").unwrap();
        let client = OscClient::new(&server.local_addr().unwrap().to_string()).unwrap();
        client
            .send_batch(vec![build_n_set_message(3, "freq", 2.0)])
            .unwrap();
        assert!(client.wait_idle(Duration::from_secs(2)));
    }

    #[test]
    fn request_retries_until_answered() {
        let server = UdpSocket::bind("127.0.0.1:0").unwrap();
        server.set_read_timeout(Some(Duration::from_secs(2))).unwrap();
        let addr = server.local_addr().unwrap().to_string();
        let answer = thread::spawn(move || {
            let mut buf = [0u8; 256];
            // Drop the first request, as a server still booting would.
            server.recv_from(&mut buf).unwrap();
            let (_, from) = server.recv_from(&mut buf).unwrap();
            let reply = OscPacket::Message(OscMessage {
                addr: "/status.reply".into(),
                args: vec![OscType::Int(1)],
            });
            server
                .send_to(&rosc::encoder::encode(&reply).unwrap(), from)
                .unwrap();
        });

        let client = OscClient::new(&addr).unwrap();
        let reply = client
            .request(
                timbre_types::message::build_status_message(),
                Duration::from_secs(2),
                Duration::from_millis(50),
                |m| m.addr == "/status.reply",
            )
            .unwrap();
        assert_eq!(reply.args, vec![OscType::Int(1)]);
        answer.join().unwrap();
    }

    #[test]
    fn request_to_silent_server_times_out() {
        let server = UdpSocket::bind("127.0.0.1:0").unwrap();
        let client = OscClient::new(&server.local_addr().unwrap().to_string()).unwrap();
        let err = client
            .request(
                timbre_types::message::build_status_message(),
                Duration::from_millis(200),
                Duration::from_millis(50),
                |_| true,
            )
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::TimedOut);
    }

    #[test]
    fn unresolvable_address_is_an_error() {
        assert!(OscClient::new("not an address").is_err());
    }
}
