//! End-to-end pipeline tests: OSC datagrams in, commands out.

use async_trait::async_trait;
use blinkctl::app::App;
use blinkctl::command::Command;
use blinkctl::config::{
    AcquisitionConfig, ActuatorConfig, ApplicationConfig, Config, DetectorConfig, FilterConfig,
    OscConfig, PipelineConfig,
};
use blinkctl::dispatch::CommandSink;
use blinkctl::error::{AppResult, BlinkError};
use std::f64::consts::TAU;
use std::net::{SocketAddr, UdpSocket};
use std::sync::{Arc, Mutex};
use std::time::Duration;

const FS: f64 = 256.0;
const WINDOW_LEN: usize = 256;

struct RecordingSink {
    sent: Mutex<Vec<Command>>,
    fail: bool,
}

impl RecordingSink {
    fn new(fail: bool) -> Arc<Self> {
        Arc::new(Self {
            sent: Mutex::new(Vec::new()),
            fail,
        })
    }

    fn sent(&self) -> Vec<Command> {
        self.sent.lock().expect("sink lock").clone()
    }
}

#[async_trait]
impl CommandSink for RecordingSink {
    async fn send(&self, command: Command) -> AppResult<()> {
        self.sent.lock().expect("sink lock").push(command);
        if self.fail {
            Err(BlinkError::DispatchStatus(503))
        } else {
            Ok(())
        }
    }
}

fn test_config() -> Config {
    Config {
        application: ApplicationConfig {
            name: "blinkctl test".to_string(),
            log_level: "warn".to_string(),
        },
        acquisition: AcquisitionConfig {
            sampling_rate_hz: FS,
            window_secs: WINDOW_LEN as f64 / FS,
        },
        filter: FilterConfig {
            lowcut_hz: 1.0,
            highcut_hz: 15.0,
            order: 4,
        },
        detector: DetectorConfig {
            valley_threshold: 100.0,
            peak_threshold: 30.0,
            min_spacing: 32,
            strict_pairing: false,
        },
        pipeline: PipelineConfig {
            cooldown: Duration::from_millis(50),
        },
        osc: OscConfig {
            listen_addr: "127.0.0.1:0".parse().expect("addr"),
            eeg_address: "/muse/eeg".to_string(),
            channel_index: 0,
        },
        actuator: ActuatorConfig {
            base_url: "http://127.0.0.1:1".to_string(),
            request_timeout: Duration::from_millis(100),
        },
    }
}

/// One blink: an inverted 5 Hz cycle, valley first then rebound peak.
fn add_blink(values: &mut [f64], start: usize) {
    for i in 0..52 {
        let phase = TAU * 5.0 * i as f64 / FS;
        values[start + i] = -300.0 * phase.sin();
    }
}

/// A window's worth of signal containing `blinks` well-separated blinks.
fn blink_window(blinks: usize) -> Vec<f64> {
    let mut values = vec![0.0; WINDOW_LEN];
    for b in 0..blinks {
        add_blink(&mut values, 50 + b * 100);
    }
    values
}

/// Send one scalar per OSC message, throttled so loopback never drops.
fn send_samples(sender: &UdpSocket, target: SocketAddr, values: &[f64]) {
    for (i, &value) in values.iter().enumerate() {
        let packet = rosc::OscPacket::Message(rosc::OscMessage {
            addr: "/muse/eeg".to_string(),
            args: vec![rosc::OscType::Float(value as f32)],
        });
        let bytes = rosc::encoder::encode(&packet).expect("encode");
        sender.send_to(&bytes, target).expect("send");
        if i % 16 == 15 {
            std::thread::sleep(Duration::from_millis(1));
        }
    }
}

async fn wait_for<F: Fn() -> bool>(condition: F, timeout: Duration) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    condition()
}

#[tokio::test(flavor = "multi_thread")]
async fn double_blink_window_dispatches_right_and_keeps_leftovers() {
    let sink = RecordingSink::new(false);
    let app = App::start_with_sink(&test_config(), sink.clone())
        .await
        .expect("start app");
    let target = app.osc_addr();
    let sender = UdpSocket::bind("127.0.0.1:0").expect("sender socket");

    // A full double-blink window plus 40 trailing samples.
    let mut values = blink_window(2);
    values.extend(std::iter::repeat(0.0).take(40));
    send_samples(&sender, target, &values);

    assert!(
        wait_for(|| sink.sent() == vec![Command::Right], Duration::from_secs(5)).await,
        "expected exactly one 'right' dispatch, got {:?}",
        sink.sent()
    );

    // Leftover samples stay buffered for the next window.
    assert!(
        wait_for(|| app.buffered_len() == 40, Duration::from_secs(2)).await,
        "expected 40 leftover samples, got {}",
        app.buffered_len()
    );

    // No further command appears once the pass has cooled down.
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(sink.sent(), vec![Command::Right]);

    app.shutdown().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn flat_stream_dispatches_nothing() {
    let sink = RecordingSink::new(false);
    let app = App::start_with_sink(&test_config(), sink.clone())
        .await
        .expect("start app");
    let sender = UdpSocket::bind("127.0.0.1:0").expect("sender socket");

    send_samples(&sender, app.osc_addr(), &vec![0.0; WINDOW_LEN]);

    // The pass must run (it consumes the window) without any dispatch.
    assert!(
        wait_for(|| app.buffered_len() == 0, Duration::from_secs(5)).await,
        "window never consumed"
    );
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert!(sink.sent().is_empty(), "flat signal must not dispatch");

    app.shutdown().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn dispatch_failure_does_not_block_the_next_window() {
    let sink = RecordingSink::new(true);
    let app = App::start_with_sink(&test_config(), sink.clone())
        .await
        .expect("start app");
    let target = app.osc_addr();
    let sender = UdpSocket::bind("127.0.0.1:0").expect("sender socket");

    send_samples(&sender, target, &blink_window(1));
    assert!(
        wait_for(|| sink.sent().len() == 1, Duration::from_secs(5)).await,
        "first dispatch missing"
    );

    // The failed dispatch and the cooldown must both clear the gate.
    send_samples(&sender, target, &blink_window(1));
    assert!(
        wait_for(|| sink.sent().len() == 2, Duration::from_secs(5)).await,
        "second window never processed after failed dispatch"
    );
    assert_eq!(sink.sent(), vec![Command::Left, Command::Left]);

    app.shutdown().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn mixed_osc_traffic_only_counts_eeg_samples() {
    let sink = RecordingSink::new(false);
    let app = App::start_with_sink(&test_config(), sink.clone())
        .await
        .expect("start app");
    let target = app.osc_addr();
    let sender = UdpSocket::bind("127.0.0.1:0").expect("sender socket");

    // Half a window of EEG, then foreign traffic that must not fill it.
    send_samples(&sender, target, &vec![0.0; WINDOW_LEN / 2]);
    for _ in 0..WINDOW_LEN {
        let packet = rosc::OscPacket::Message(rosc::OscMessage {
            addr: "/muse/acc".to_string(),
            args: vec![rosc::OscType::Float(1.0)],
        });
        sender
            .send_to(&rosc::encoder::encode(&packet).expect("encode"), target)
            .expect("send");
    }

    assert!(
        wait_for(|| app.buffered_len() == WINDOW_LEN / 2, Duration::from_secs(2)).await,
        "EEG samples missing, got {}",
        app.buffered_len()
    );
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(
        app.buffered_len(),
        WINDOW_LEN / 2,
        "foreign OSC traffic leaked into the buffer"
    );

    app.shutdown().await;
}
