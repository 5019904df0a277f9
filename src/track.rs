//! Track: an instrument preset plus live modulation settings (spec §3).

use bitflags::bitflags;

bitflags! {
    /// The WASM-4 `tone` flags byte, as owned by a track.
    ///
    /// Bit layout: channel index (bits 0-1), note mode (bits 2-3), pan
    /// (bits 4-5). Bit 6 is forced on only at emission time (spec §4.2), not
    /// stored here.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Flags: u8 {
        /// Low bit of the channel-index field.
        const CHANNEL_0 = 0b0000_0001;
        /// High bit of the channel-index field.
        const CHANNEL_1 = 0b0000_0010;
        /// Low bit of the note-mode field.
        const MODE_0 = 0b0000_0100;
        /// High bit of the note-mode field.
        const MODE_1 = 0b0000_1000;
        /// Low bit of the pan field.
        const PAN_0 = 0b0001_0000;
        /// High bit of the pan field.
        const PAN_1 = 0b0010_0000;
        /// Forced on at emission time to flag the extended encoding.
        const EXTENDED = 0b0100_0000;
    }
}

const CHANNEL_MASK: u8 = 0b0000_0011;
const PAN_MASK: u8 = 0b0011_0000;

impl Flags {
    /// The channel index (0..=3) this track targets, from bits 0-1.
    pub fn channel(self) -> u8 {
        self.bits() & CHANNEL_MASK
    }

    /// Rewrite only the pan bits (4-5), leaving channel/mode/other bits
    /// untouched. `pan` must be 0..=2 (spec §4.1 `SET_PAN`).
    pub fn with_pan(self, pan: u8) -> Self {
        let bits = (self.bits() & !PAN_MASK) | (pan << 4);
        Flags::from_bits_truncate(bits)
    }
}

/// An instrument preset and its current modulation settings (spec §3,
/// "Track"). 16 instances exist in a [`crate::runtime::Runtime`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Track {
    /// Channel/mode/pan flags; bits 0-1 select which channel this track
    /// drives.
    pub flags: Flags,
    /// Amplitude scalar, 0..255.
    pub volume: u8,
    /// Amplitude scalar, 0..127.
    pub velocity: u8,
    /// Attack ticks.
    pub a: u8,
    /// Decay ticks.
    pub d: u8,
    /// Sustain amplitude, 0..255.
    pub s: u8,
    /// Release ticks.
    pub r: u8,
    /// Pitch envelope start offset, in semitones.
    pub pe_offset: i8,
    /// Pitch envelope ramp-to-zero duration, in ticks.
    pub pe_duration: u8,
    /// Ticks per arpeggio step; 0 disables arpeggio.
    pub arp_rate: u8,
    /// Ticks to glide from the previous key to a new one.
    pub portamento: u8,
    /// Vibrato LFO rate.
    pub vib_speed: u8,
    /// Vibrato amplitude, in 1/4-semitone units.
    pub vib_depth: u8,
}

impl Default for Track {
    fn default() -> Self {
        Track {
            flags: Flags::empty(),
            volume: 255,
            velocity: 127,
            a: 0,
            d: 0,
            s: 255,
            r: 0,
            pe_offset: 0,
            pe_duration: 0,
            arp_rate: 0,
            portamento: 0,
            vib_speed: 0,
            vib_depth: 0,
        }
    }
}
