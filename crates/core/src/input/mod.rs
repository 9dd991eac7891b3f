use std::sync::{Arc, Weak};

use crate::mapping::apply_event;
use crate::midi::{decode_packet_with, StatusFilter};
use crate::ParameterStore;

/// Running counters for one input registration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputStats {
    /// Packets handed to [`ControlInput::handle_packet`].
    pub packets: u64,
    /// Packets that decoded into a controller event.
    pub events: u64,
    /// Events that changed the shared parameters.
    pub applied: u64,
    /// Packets dropped because the store was already gone.
    pub ignored: u64,
}

/// Consumer registered with a MIDI source.
///
/// The registration only holds a weak reference to the shared store, so the
/// source never keeps the render side alive. Once the store has been dropped
/// every further packet is ignored. Any number of registrations may share
/// one store; each event only replaces the field it targets.
#[derive(Debug, Clone)]
pub struct ControlInput {
    store: Weak<ParameterStore>,
    filter: StatusFilter,
    stats: InputStats,
}

impl ControlInput {
    pub fn new(store: &Arc<ParameterStore>) -> Self {
        Self {
            store: Arc::downgrade(store),
            filter: StatusFilter::default(),
            stats: InputStats::default(),
        }
    }

    pub fn with_filter(mut self, filter: StatusFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Handles one packet from the source. Never fails: malformed packets,
    /// unmapped controllers and a torn-down store are all silently ignored.
    pub fn handle_packet(&mut self, bytes: &[u8]) {
        self.stats.packets += 1;

        let Some(event) = decode_packet_with(bytes, self.filter) else {
            tracing::trace!(len = bytes.len(), "dropping non control change packet");
            return;
        };
        self.stats.events += 1;

        let Some(store) = self.store.upgrade() else {
            self.stats.ignored += 1;
            return;
        };

        match apply_event(&event, &store) {
            Some(update) => {
                self.stats.applied += 1;
                tracing::trace!(
                    %event,
                    target = %update.target,
                    value = update.value,
                    "applied controller event"
                );
            }
            None => tracing::trace!(%event, "unmapped controller"),
        }
    }

    /// Handles every packet of a packet list in order.
    pub fn handle_packets<'a, I>(&mut self, packets: I)
    where
        I: IntoIterator<Item = &'a [u8]>,
    {
        for packet in packets {
            self.handle_packet(packet);
        }
    }

    pub fn stats(&self) -> InputStats {
        self.stats
    }

    pub fn is_attached(&self) -> bool {
        self.store.strong_count() > 0
    }
}
