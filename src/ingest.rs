//! OSC/UDP ingestion gateway.
//!
//! Listens for OSC packets (the framing a Muse headset relays through Mind
//! Monitor), filters them to the configured EEG address, and forwards one
//! scalar per message into the window buffer. Everything else is dropped
//! silently: foreign addresses, missing or non-numeric arguments, and
//! non-finite values never reach the buffer. Decode errors are logged at
//! debug and never terminate the task; only the shutdown signal does.

use crate::buffer::WindowBuffer;
use crate::config::OscConfig;
use crate::core::Sample;
use crate::error::AppResult;
use rosc::{OscMessage, OscPacket, OscType};
use std::sync::Arc;
use tokio::net::UdpSocket;
use tokio::sync::watch;
use tracing::{debug, info, trace, warn};

pub struct OscGateway {
    socket: UdpSocket,
    buffer: Arc<WindowBuffer>,
    eeg_address: String,
    channel_index: usize,
    shutdown: watch::Receiver<bool>,
}

impl OscGateway {
    /// Bind the listen socket. A busy or unroutable address is a startup
    /// error.
    pub async fn bind(
        config: &OscConfig,
        buffer: Arc<WindowBuffer>,
        shutdown: watch::Receiver<bool>,
    ) -> AppResult<Self> {
        let socket = UdpSocket::bind(config.listen_addr).await?;
        info!(addr = %config.listen_addr, eeg_address = %config.eeg_address, "OSC gateway listening");
        Ok(Self {
            socket,
            buffer,
            eeg_address: config.eeg_address.clone(),
            channel_index: config.channel_index,
            shutdown,
        })
    }

    /// Local socket address, useful when bound to port 0.
    pub fn local_addr(&self) -> AppResult<std::net::SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    /// Receive datagrams until shutdown.
    pub async fn run(mut self) {
        let mut buf = vec![0u8; rosc::decoder::MTU];
        loop {
            tokio::select! {
                received = self.socket.recv_from(&mut buf) => match received {
                    Ok((len, _peer)) => self.handle_datagram(&buf[..len]),
                    Err(err) => warn!(%err, "UDP receive failed"),
                },
                _ = self.shutdown.changed() => {
                    if *self.shutdown.borrow() {
                        break;
                    }
                }
            }
        }
        info!("OSC gateway stopped");
    }

    fn handle_datagram(&self, bytes: &[u8]) {
        match rosc::decoder::decode_udp(bytes) {
            Ok((_, packet)) => self.handle_packet(packet),
            Err(err) => debug!(?err, "undecodable OSC datagram dropped"),
        }
    }

    fn handle_packet(&self, packet: OscPacket) {
        match packet {
            OscPacket::Message(message) => self.handle_message(message),
            OscPacket::Bundle(bundle) => {
                for inner in bundle.content {
                    self.handle_packet(inner);
                }
            }
        }
    }

    fn handle_message(&self, message: OscMessage) {
        match extract_sample(&message, &self.eeg_address, self.channel_index) {
            Some(value) => self.buffer.push(Sample::now(value)),
            None => trace!(addr = %message.addr, "OSC message ignored"),
        }
    }
}

/// Pull the configured scalar out of an EEG message.
///
/// Returns `None` for foreign addresses, missing arguments, non-numeric
/// argument types, and non-finite values.
pub fn extract_sample(message: &OscMessage, eeg_address: &str, channel_index: usize) -> Option<f64> {
    if message.addr != eeg_address {
        return None;
    }
    let value = match message.args.get(channel_index)? {
        OscType::Float(v) => f64::from(*v),
        OscType::Double(v) => *v,
        OscType::Int(v) => f64::from(*v),
        OscType::Long(v) => *v as f64,
        _ => return None,
    };
    value.is_finite().then_some(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn eeg_message(args: Vec<OscType>) -> OscMessage {
        OscMessage {
            addr: "/muse/eeg".to_string(),
            args,
        }
    }

    #[test]
    fn extracts_first_float_argument() {
        let message = eeg_message(vec![OscType::Float(812.5), OscType::Float(799.0)]);
        assert_eq!(extract_sample(&message, "/muse/eeg", 0), Some(812.5));
        assert_eq!(extract_sample(&message, "/muse/eeg", 1), Some(799.0));
    }

    #[test]
    fn ignores_foreign_addresses() {
        let message = OscMessage {
            addr: "/muse/acc".to_string(),
            args: vec![OscType::Float(1.0)],
        };
        assert_eq!(extract_sample(&message, "/muse/eeg", 0), None);
    }

    #[test]
    fn ignores_non_numeric_and_missing_arguments() {
        let message = eeg_message(vec![OscType::String("oops".to_string())]);
        assert_eq!(extract_sample(&message, "/muse/eeg", 0), None);

        let message = eeg_message(vec![]);
        assert_eq!(extract_sample(&message, "/muse/eeg", 0), None);
    }

    #[test]
    fn ignores_non_finite_values() {
        let message = eeg_message(vec![OscType::Double(f64::NAN)]);
        assert_eq!(extract_sample(&message, "/muse/eeg", 0), None);
        let message = eeg_message(vec![OscType::Float(f32::INFINITY)]);
        assert_eq!(extract_sample(&message, "/muse/eeg", 0), None);
    }

    #[test]
    fn accepts_integer_payloads() {
        let message = eeg_message(vec![OscType::Int(820)]);
        assert_eq!(extract_sample(&message, "/muse/eeg", 0), Some(820.0));
    }

    #[tokio::test]
    async fn delivers_datagrams_into_the_buffer() {
        let (buffer, _rx) = WindowBuffer::new(1024);
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        let config = OscConfig {
            listen_addr: "127.0.0.1:0".parse().expect("addr"),
            eeg_address: "/muse/eeg".to_string(),
            channel_index: 0,
        };
        let gateway = OscGateway::bind(&config, Arc::clone(&buffer), shutdown_rx)
            .await
            .expect("bind");
        let addr = gateway.local_addr().expect("local addr");
        let handle = tokio::spawn(gateway.run());

        let sender = std::net::UdpSocket::bind("127.0.0.1:0").expect("sender socket");
        let packet = OscPacket::Message(eeg_message(vec![OscType::Float(812.5)]));
        let bytes = rosc::encoder::encode(&packet).expect("encode");
        for _ in 0..10 {
            sender.send_to(&bytes, addr).expect("send");
        }
        // Interleave garbage and a foreign address; neither may count.
        sender.send_to(b"not osc at all", addr).expect("send");
        let foreign = OscPacket::Message(OscMessage {
            addr: "/muse/gyro".to_string(),
            args: vec![OscType::Float(1.0)],
        });
        sender
            .send_to(&rosc::encoder::encode(&foreign).expect("encode"), addr)
            .expect("send");

        // Wait for delivery rather than sleeping a fixed interval.
        let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
        while buffer.buffered_len() < 10 && tokio::time::Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(buffer.buffered_len(), 10);
        handle.abort();
    }
}
