//! Core library for the MIDI Visualiser application.
//!
//! Control Change packets arrive on a MIDI backend thread, get decoded
//! ([`midi`]), mapped onto render parameters ([`mapping`]) and written as a
//! whole into a shared [`ParameterStore`]. Once per frame the render thread
//! snapshots that store and copies it into the uniform buffer ([`render`]).
//! Neither thread waits on the other for more than a four-float copy.

pub mod config;
pub mod error;
pub mod input;
pub mod mapping;
pub mod midi;
pub mod params;
pub mod render;
pub mod timeline;

pub use config::{AppConfig, MidiConfig, RenderConfig};
pub use error::{MidiVizError, Result};
pub use input::{ControlInput, InputStats};
pub use mapping::{apply_event, normalize, ParameterTarget, ParameterUpdate};
pub use midi::{decode_packet, decode_packets, PacketList, RawEvent, StatusFilter};
pub use params::{ParameterSet, ParameterStore};
pub use render::{
    FramePresenter, FramePublisher, FrameStatus, FrameUniforms, HostUniformBuffer, RenderLoop,
    UniformBuffer,
};
pub use timeline::{FrameClock, FrameTick};
