//! Meshtastic radio over a serial port.

use std::io::{self, Read, Write};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use mesh_common::Destination;
use prost::Message;
use serialport::{ClearBuffer, DataBits, FlowControl, Parity, SerialPort, StopBits};

use super::framing::{encode_frame, FrameDecoder, START2};
use super::proto::{from_radio, FromRadio, MeshPacket, ToRadio};
use super::{MeshRadio, RadioError};
use crate::config::DeviceConfig;

/// Largest text payload the firmware accepts in a single packet.
pub const MAX_TEXT_PAYLOAD: usize = 233;

/// Bytes of START2 sent to wake a sleeping radio before the first frame.
const WAKE_LEN: usize = 32;
const READ_TIMEOUT: Duration = Duration::from_millis(100);
const SETTLE_DELAY: Duration = Duration::from_millis(100);
/// Pause after a read that returned nothing without timing out.
const IDLE_POLL: Duration = Duration::from_millis(10);

/// Writable half of the serial link, shared by all senders.
type PortSlot = Arc<Mutex<Option<Box<dyn Write + Send>>>>;

/// Per-packet settings stamped on outgoing text.
#[derive(Debug, Clone, Copy)]
struct PacketSettings {
    hop_limit: u32,
    channel: u32,
}

/// Meshtastic radio attached to a serial port.
///
/// The port sits behind a mutex so concurrent sends are written one frame at
/// a time. Blocking port I/O runs on the tokio blocking pool.
pub struct SerialRadio {
    path: String,
    port: PortSlot,
    my_node_num: Option<u32>,
    settings: PacketSettings,
}

impl SerialRadio {
    /// Open the port and complete the config handshake.
    pub async fn open(config: &DeviceConfig) -> Result<Self, RadioError> {
        let config = config.clone();
        tokio::task::spawn_blocking(move || Self::open_blocking(&config))
            .await
            .map_err(|e| RadioError::TaskFailed(e.to_string()))?
    }

    fn open_blocking(config: &DeviceConfig) -> Result<Self, RadioError> {
        let mut port = serialport::new(&config.path, config.baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(READ_TIMEOUT)
            .open()?;

        tracing::debug!("Opened serial port {} at {} baud", config.path, config.baud_rate);

        // Some ESP32 boards hold the radio in reset until these are set.
        if let Err(e) = port.write_data_terminal_ready(true) {
            tracing::debug!("Could not assert DTR on {}: {}", config.path, e);
        }
        if let Err(e) = port.write_request_to_send(true) {
            tracing::debug!("Could not assert RTS on {}: {}", config.path, e);
        }
        std::thread::sleep(SETTLE_DELAY);

        port.write_all(&[START2; WAKE_LEN])?;
        port.flush()?;
        std::thread::sleep(SETTLE_DELAY);
        port.clear(ClearBuffer::Input)?;

        let request_id = nonzero_id();
        let timeout = Duration::from_secs(config.handshake_timeout_secs);
        let my_node_num = handshake(&mut *port, request_id, timeout)?;

        match my_node_num {
            Some(num) => tracing::info!("Radio on {} is node !{:08x}", config.path, num),
            None => tracing::warn!("Radio on {} did not report its node number", config.path),
        }

        Ok(Self::with_port(
            &config.path,
            Box::new(port),
            my_node_num,
            PacketSettings {
                hop_limit: config.hop_limit,
                channel: config.channel,
            },
        ))
    }

    fn with_port(
        path: &str,
        port: Box<dyn Write + Send>,
        my_node_num: Option<u32>,
        settings: PacketSettings,
    ) -> Self {
        Self {
            path: path.to_string(),
            port: Arc::new(Mutex::new(Some(port))),
            my_node_num,
            settings,
        }
    }

    /// Run `op` against the port slot on the blocking pool, under the lock.
    async fn with_slot<F>(&self, op: F) -> Result<(), RadioError>
    where
        F: FnOnce(&mut Option<Box<dyn Write + Send>>) -> Result<(), RadioError> + Send + 'static,
    {
        let port = Arc::clone(&self.port);
        tokio::task::spawn_blocking(move || {
            let mut guard = port
                .lock()
                .map_err(|_| RadioError::TaskFailed("serial port lock poisoned".to_string()))?;
            op(&mut guard)
        })
        .await
        .map_err(|e| RadioError::TaskFailed(e.to_string()))?
    }
}

#[async_trait]
impl MeshRadio for SerialRadio {
    fn describe(&self) -> String {
        format!("serial:{}", self.path)
    }

    async fn send_text(&self, text: &str, destination: &str) -> Result<(), RadioError> {
        let destination: Destination = destination.parse()?;
        let packet = text_packet(
            text,
            destination,
            self.my_node_num,
            self.settings,
            nonzero_id(),
        )?;
        tracing::debug!(
            to = %destination,
            id = packet.id,
            bytes = text.len(),
            "Sending text packet"
        );
        let frame = encode_frame(&ToRadio::packet(packet))?;
        self.with_slot(move |slot| write_locked(slot, &frame)).await
    }

    async fn close(&self) -> Result<(), RadioError> {
        self.with_slot(|slot| close_locked(slot)).await
    }
}

/// Write one frame to an open port.
fn write_locked<W>(slot: &mut Option<Box<W>>, frame: &[u8]) -> Result<(), RadioError>
where
    W: Write + ?Sized,
{
    let port = slot.as_mut().ok_or(RadioError::Closed)?;
    port.write_all(frame)?;
    port.flush()?;
    Ok(())
}

/// Send the disconnect frame and drop the port. A second close is a no-op.
fn close_locked<W>(slot: &mut Option<Box<W>>) -> Result<(), RadioError>
where
    W: Write + ?Sized,
{
    // Dropping the port closes it, even if the disconnect write fails.
    let Some(mut port) = slot.take() else {
        return Ok(());
    };
    let frame = encode_frame(&ToRadio::disconnect())?;
    port.write_all(&frame)?;
    port.flush()?;
    Ok(())
}

/// Build the packet for one text message.
fn text_packet(
    text: &str,
    destination: Destination,
    my_node_num: Option<u32>,
    settings: PacketSettings,
    id: u32,
) -> Result<MeshPacket, RadioError> {
    if text.len() > MAX_TEXT_PAYLOAD {
        return Err(RadioError::PayloadTooLarge {
            len: text.len(),
            max: MAX_TEXT_PAYLOAD,
        });
    }

    let to = destination
        .node_num(my_node_num)
        .ok_or(RadioError::LocalNodeUnknown)?;

    Ok(MeshPacket::text(
        to,
        settings.channel,
        settings.hop_limit,
        id,
        text,
    ))
}

/// Request a config dump and wait for it to finish.
///
/// Returns the local node number if the radio reported one along the way.
fn handshake<P>(port: &mut P, request_id: u32, timeout: Duration) -> Result<Option<u32>, RadioError>
where
    P: Read + Write + ?Sized,
{
    port.write_all(&encode_frame(&ToRadio::want_config(request_id))?)?;
    port.flush()?;

    let deadline = Instant::now() + timeout;
    let mut decoder = FrameDecoder::new();
    let mut buf = [0u8; 512];
    let mut my_node_num = None;

    while Instant::now() < deadline {
        let n = match port.read(&mut buf) {
            Ok(0) => {
                std::thread::sleep(IDLE_POLL);
                continue;
            }
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::TimedOut => continue,
            Err(e) => return Err(e.into()),
        };
        decoder.push(&buf[..n]);

        while let Some(frame) = decoder.next_frame() {
            let msg = match FromRadio::decode(frame.as_slice()) {
                Ok(msg) => msg,
                Err(e) => {
                    tracing::trace!("Skipping undecodable frame: {}", e);
                    continue;
                }
            };
            match msg.payload_variant {
                Some(from_radio::PayloadVariant::MyInfo(info)) => {
                    my_node_num = Some(info.my_node_num);
                }
                Some(from_radio::PayloadVariant::ConfigCompleteId(id)) if id == request_id => {
                    return Ok(my_node_num);
                }
                _ => {}
            }
        }
    }

    Err(RadioError::HandshakeTimeout(timeout))
}

/// Random id for config requests and packets. Zero means "unset" to the firmware.
fn nonzero_id() -> u32 {
    loop {
        let id: u32 = rand::random();
        if id != 0 {
            return id;
        }
    }
}
