//! Hardware MIDI input.
//!
//! midir delivers messages on its own callback thread; raw triples cross to
//! the event loop over an rtrb ring so decoding stays on one thread (the
//! router). Absence of hardware, or denial of access, is not an error the
//! user sees — the app silently stays in keyboard/pointer mode.
//!
//! midir has no hot-plug callback, so the event loop calls [`MidiInputHandler::watch`]
//! periodically: a keyboard plugged in after launch connects, and unplugging
//! the connected one drops the connection and clears the port name.

use log::{info, warn};
use midir::{MidiInput, MidiInputConnection};
use rtrb::{Consumer, RingBuffer};
use thiserror::Error;

const CLIENT_NAME: &str = "maestro-midi-in";
const RING_CAPACITY: usize = 256;

/// Raw hardware triple, decoded later by the input router.
#[derive(Debug, Clone, Copy)]
pub struct RawMidi {
    pub status: u8,
    pub note: u8,
    pub velocity: u8,
}

#[derive(Debug, Error)]
pub enum MidiError {
    #[error("failed to initialize MIDI input: {0}")]
    Init(String),
    #[error("failed to connect to MIDI port: {0}")]
    Connect(String),
}

/// What a hardware poll found.
pub enum PortEvent {
    Unchanged,
    /// A port appeared and we connected to it.
    Connected(Consumer<RawMidi>),
    /// Our port vanished; the connection was dropped.
    Disconnected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PortPlan {
    Keep,
    Drop,
    Connect,
}

/// Decide what a poll should do, given the connected port (if any) and the
/// ports the hardware currently enumerates.
fn plan(connected: Option<&str>, available: &[String]) -> PortPlan {
    match connected {
        Some(name) if available.iter().any(|n| n == name) => PortPlan::Keep,
        Some(_) => PortPlan::Drop,
        None if available.is_empty() => PortPlan::Keep,
        None => PortPlan::Connect,
    }
}

/// Owns the (at most one) hardware connection.
///
/// Teardown is idempotent: dropping the connection unregisters the callback,
/// and `disconnect` can be called any number of times.
pub struct MidiInputHandler {
    connection: Option<MidiInputConnection<()>>,
    port_name: Option<String>,
}

impl Default for MidiInputHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl MidiInputHandler {
    pub fn new() -> Self {
        Self {
            connection: None,
            port_name: None,
        }
    }

    /// Connect to the first available input port.
    ///
    /// Returns the port name and the consuming end of the event ring, or
    /// `None` when no hardware is present.
    pub fn connect_first(&mut self) -> Result<Option<Consumer<RawMidi>>, MidiError> {
        self.disconnect();

        let midi_in = MidiInput::new(CLIENT_NAME).map_err(|e| MidiError::Init(e.to_string()))?;
        let ports = midi_in.ports();
        let Some(port) = ports.first() else {
            info!("no MIDI input ports available; keyboard mode only");
            return Ok(None);
        };

        let name = midi_in
            .port_name(port)
            .unwrap_or_else(|_| "External Keyboard".to_string());

        let (mut producer, consumer) = RingBuffer::<RawMidi>::new(RING_CAPACITY);
        let connection = midi_in
            .connect(
                port,
                "maestro-read-input",
                move |_stamp, message, _| {
                    if message.len() >= 3 {
                        // A full ring means the event loop stalled; dropping
                        // an event beats blocking the driver thread.
                        let _ = producer.push(RawMidi {
                            status: message[0],
                            note: message[1],
                            velocity: message[2],
                        });
                    }
                },
                (),
            )
            .map_err(|e| MidiError::Connect(e.to_string()))?;

        info!("connected to MIDI input '{name}'");
        self.connection = Some(connection);
        self.port_name = Some(name);
        Ok(Some(consumer))
    }

    /// Like [`Self::connect_first`] but degrades every failure to `None`.
    pub fn try_connect(&mut self) -> Option<Consumer<RawMidi>> {
        match self.connect_first() {
            Ok(consumer) => consumer,
            Err(e) => {
                warn!("MIDI unavailable: {e}");
                None
            }
        }
    }

    /// Re-check the hardware: reconnect if a port appeared, drop the
    /// connection if ours vanished. Cheap enough to call every few seconds.
    pub fn watch(&mut self) -> PortEvent {
        match plan(self.port_name.as_deref(), &Self::port_names()) {
            PortPlan::Keep => PortEvent::Unchanged,
            PortPlan::Drop => {
                self.disconnect();
                PortEvent::Disconnected
            }
            PortPlan::Connect => match self.try_connect() {
                Some(consumer) => PortEvent::Connected(consumer),
                None => PortEvent::Unchanged,
            },
        }
    }

    fn port_names() -> Vec<String> {
        let Ok(midi_in) = MidiInput::new(CLIENT_NAME) else {
            return Vec::new();
        };
        midi_in
            .ports()
            .iter()
            .filter_map(|p| midi_in.port_name(p).ok())
            .collect()
    }

    pub fn disconnect(&mut self) {
        if self.connection.take().is_some() {
            info!("disconnected MIDI input");
        }
        self.port_name = None;
    }

    /// Connected port name, or `None` while unconnected.
    pub fn port_name(&self) -> Option<&str> {
        self.port_name.as_deref()
    }
}

impl Drop for MidiInputHandler {
    fn drop(&mut self) {
        self.disconnect();
    }
}
