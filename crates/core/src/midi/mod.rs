//! Control Change decoding.
//!
//! Packet boundaries come from the input backend. Each packet carries at most
//! one message; anything that is not a complete Control Change is dropped
//! without complaint because live MIDI streams interleave clock, note and
//! sysex traffic that this application has no use for.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{MidiVizError, Result};

const STATUS_MASK: u8 = 0xF0;
const CHANNEL_MASK: u8 = 0x0F;
const DATA_MASK: u8 = 0x7F;
const CONTROL_CHANGE: u8 = 0xB0;
const NOTE_OFF: u8 = 0x80;
const PITCH_BEND: u8 = 0xE0;

/// Which status bytes are read as controller messages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusFilter {
    /// Only `0xBn` Control Change packets.
    #[default]
    ControlChange,
    /// Any three byte channel voice packet (`0x8n..=0xEn`) is read as
    /// `(channel, controller, value)`. Matches controllers that are
    /// configured to send notes on their faders.
    AnyChannelVoice,
}

impl StatusFilter {
    pub fn accepts(self, status: u8) -> bool {
        let kind = status & STATUS_MASK;
        match self {
            Self::ControlChange => kind == CONTROL_CHANGE,
            Self::AnyChannelVoice => (NOTE_OFF..=PITCH_BEND).contains(&kind),
        }
    }
}

/// A decoded Control Change message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawEvent {
    /// MIDI channel, `0..=15`.
    pub channel: u8,
    /// Controller number, `0..=127`.
    pub controller: u8,
    /// Controller value, `0..=127`.
    pub value: u8,
}

impl RawEvent {
    pub fn new(channel: u8, controller: u8, value: u8) -> Self {
        Self {
            channel: channel & CHANNEL_MASK,
            controller: controller & DATA_MASK,
            value: value & DATA_MASK,
        }
    }
}

impl fmt::Display for RawEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ch={} cc={} val={}",
            self.channel, self.controller, self.value
        )
    }
}

/// Decodes a single packet. Returns `None` for short packets and for any
/// status other than Control Change.
pub fn decode_packet(packet: &[u8]) -> Option<RawEvent> {
    decode_packet_with(packet, StatusFilter::ControlChange)
}

pub fn decode_packet_with(packet: &[u8], filter: StatusFilter) -> Option<RawEvent> {
    match packet {
        [status, controller, value, ..] if filter.accepts(*status) => {
            Some(RawEvent::new(status & CHANNEL_MASK, *controller, *value))
        }
        _ => None,
    }
}

/// Lazily decodes every packet of a packet list, skipping the ones that are
/// not Control Change.
pub fn decode_packets<'a, I>(packets: I) -> impl Iterator<Item = RawEvent> + 'a
where
    I: IntoIterator<Item = &'a [u8]>,
    I::IntoIter: 'a,
{
    decode_packets_with(packets, StatusFilter::ControlChange)
}

pub fn decode_packets_with<'a, I>(
    packets: I,
    filter: StatusFilter,
) -> impl Iterator<Item = RawEvent> + 'a
where
    I: IntoIterator<Item = &'a [u8]>,
    I::IntoIter: 'a,
{
    packets
        .into_iter()
        .filter_map(move |packet| decode_packet_with(packet, filter))
}

/// Owned list of raw packets, as delivered by a backend in one batch or read
/// back from a capture file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PacketList {
    packets: Vec<Vec<u8>>,
}

impl PacketList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, packet: impl Into<Vec<u8>>) {
        self.packets.push(packet.into());
    }

    pub fn len(&self) -> usize {
        self.packets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packets.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &[u8]> + '_ {
        self.packets.iter().map(Vec::as_slice)
    }

    /// Decoded Control Change events in packet order.
    pub fn events(&self) -> impl Iterator<Item = RawEvent> + '_ {
        decode_packets(self.iter())
    }

    /// Parses a capture written as one packet per line of whitespace
    /// separated hex bytes, e.g. `B1 0D 7F`. Blank lines and `#` comments are
    /// skipped. Lines are numbered from 1 in errors.
    pub fn parse_hex_lines(text: &str) -> Result<Self> {
        let mut list = Self::new();
        for (index, line) in text.lines().enumerate() {
            let line = match line.split_once('#') {
                Some((content, _)) => content,
                None => line,
            }
            .trim();
            if line.is_empty() {
                continue;
            }

            let packet = line
                .split_whitespace()
                .map(|token| {
                    let digits = token
                        .strip_prefix("0x")
                        .or_else(|| token.strip_prefix("0X"))
                        .unwrap_or(token);
                    u8::from_str_radix(digits, 16).map_err(|err| {
                        MidiVizError::parse(
                            index + 1,
                            format!("`{token}` is not a hex byte: {err}"),
                        )
                    })
                })
                .collect::<Result<Vec<u8>>>()?;
            list.push(packet);
        }
        Ok(list)
    }
}

impl<P: Into<Vec<u8>>> FromIterator<P> for PacketList {
    fn from_iter<T: IntoIterator<Item = P>>(iter: T) -> Self {
        Self {
            packets: iter.into_iter().map(Into::into).collect(),
        }
    }
}
