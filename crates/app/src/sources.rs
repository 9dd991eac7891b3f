use std::sync::Arc;

use midi_visualiser_core::{
    ControlInput, InputStats, MidiConfig, MidiVizError, ParameterStore, Result,
};
use midir::{Ignore, MidiInput, MidiInputConnection, MidiInputPort};

/// Lists the names of every MIDI input port currently visible.
pub fn port_names(client_name: &str) -> Result<Vec<String>> {
    let midi_in = open_client(client_name)?;
    Ok(midi_in
        .ports()
        .iter()
        .map(|port| {
            midi_in
                .port_name(port)
                .unwrap_or_else(|_| "<unknown>".to_string())
        })
        .collect())
}

/// Live connections to every selected MIDI source. All of them write into
/// the same store, so several devices act as one logical input.
pub struct MidiSources {
    connections: Vec<(String, MidiInputConnection<ControlInput>)>,
}

impl MidiSources {
    /// Connects each port accepted by `config` to `store`. Ports that fail to
    /// connect are logged and skipped.
    pub fn connect(config: &MidiConfig, store: &Arc<ParameterStore>) -> Result<Self> {
        let listing = open_client(&config.client_name)?;
        let candidates: Vec<(String, MidiInputPort)> = listing
            .ports()
            .into_iter()
            .filter_map(|port| {
                let name = listing.port_name(&port).ok()?;
                config.accepts_port(&name).then_some((name, port))
            })
            .collect();

        if candidates.is_empty() {
            tracing::warn!(
                filter = ?config.port_filter,
                "no matching MIDI input ports; running without control input"
            );
        }

        let mut connections = Vec::with_capacity(candidates.len());
        for (name, port) in candidates {
            // connecting consumes the client, so each source gets its own
            let midi_in = open_client(&config.client_name)?;
            let input = ControlInput::new(store).with_filter(config.status_filter);
            let connection = midi_in.connect(
                &port,
                &config.port_name,
                |_stamp, message, input: &mut ControlInput| input.handle_packet(message),
                input,
            );
            match connection {
                Ok(connection) => {
                    tracing::info!(port = %name, "connected MIDI input");
                    connections.push((name, connection));
                }
                Err(err) => tracing::warn!(port = %name, %err, "failed to connect MIDI input"),
            }
        }

        Ok(Self { connections })
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    /// Closes every connection and returns the per-port counters. After this
    /// returns no callback can touch the store any more.
    pub fn close(self) -> Vec<(String, InputStats)> {
        self.connections
            .into_iter()
            .map(|(name, connection)| {
                let (_client, input) = connection.close();
                (name, input.stats())
            })
            .collect()
    }
}

fn open_client(client_name: &str) -> Result<MidiInput> {
    let mut midi_in = MidiInput::new(client_name)
        .map_err(|err| MidiVizError::msg(format!("failed to open MIDI client: {err}")))?;
    // only channel messages are interesting; keep clock and sysex out of the callback
    midi_in.ignore(Ignore::All);
    Ok(midi_in)
}
