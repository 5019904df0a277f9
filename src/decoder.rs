//! Event decoder: pure classification of a single opcode byte.
//!
//! Opcode ranges overlap only if resolved bottom-up; this module replicates
//! the top-down classification order mandated by spec §4.1 and §9 ("the
//! listed order... is load-bearing") rather than pre-building a 256-entry
//! lookup table, since the range checks below already compile to the
//! equivalent branch-free comparisons for a `const`-sized opcode space.

/// Number of single-byte short-delay opcodes (`0x02..0x34`).
const SHORT_DELTA_COUNT: u16 = 50;
/// Number of single-byte short-delay-with-notes-off opcodes (`0x34..0x66`).
const SHORT_DELTA_NOTES_OFF_COUNT: u16 = 50;
/// Number of single-byte note-on opcodes (`0x66..0xE6`), one per MIDI key.
const NOTE_ON_COUNT: u16 = 128;
/// Number of single-byte pan-select opcodes (`0xE9..0xEC`).
const SET_PAN_COUNT: u16 = 3;

const LONG_DELTA: u8 = 0x00;
const LONG_DELTA_NOTES_OFF: u8 = 0x01;
const SHORT_DELTA_START: u8 = 0x02;
const SHORT_DELTA_NOTES_OFF_START: u8 = 0x34;
const NOTE_ON_START: u8 = 0x66;
const NOTES_OFF: u8 = 0xE6;

/// The single-byte `NOTES_OFF` opcode (spec §4.1), exposed so
/// [`crate::player::Player`] can synthesize one when a
/// `*_NOTES_OFF` delay completes (spec §4.4).
pub const NOTES_OFF_OPCODE: u8 = NOTES_OFF;
const SET_FLAGS: u8 = 0xE7;
const SET_VOLUME: u8 = 0xE8;
const SET_PAN_START: u8 = 0xE9;
const SET_VELOCITY: u8 = 0xEC;
const SET_ADSR: u8 = 0xED;
const SET_A: u8 = 0xEE;
const SET_D: u8 = 0xEF;
const SET_S: u8 = 0xF0;
const SET_R: u8 = 0xF1;
const SET_PITCH_ENV: u8 = 0xF2;
const SET_ARP_RATE: u8 = 0xF3;
const SET_PORTAMENTO: u8 = 0xF4;
const SET_VIBRATO: u8 = 0xF5;

/// A control event that mutates track or channel state (everything except
/// the delay opcodes, which are only meaningful to the score player).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// Begin holding `key` (MIDI 0..127) on the addressed track's channel.
    NoteOn {
        /// MIDI key number, 0..127.
        key: u8,
    },
    /// Release all currently held keys on the addressed track's channel.
    NotesOff,
    /// Overwrite the track's entire flags byte.
    SetFlags(u8),
    /// Overwrite the track's amplitude scalar (0..255).
    SetVolume(u8),
    /// Overwrite only the pan bits (4-5) of the track's flags, value 0..2.
    SetPan(u8),
    /// Overwrite the track's velocity scalar (0..127).
    SetVelocity(u8),
    /// Overwrite all four ADSR fields at once.
    SetAdsr {
        /// Attack ticks.
        a: u8,
        /// Decay ticks.
        d: u8,
        /// Sustain amplitude.
        s: u8,
        /// Release ticks.
        r: u8,
    },
    /// Overwrite the attack-ticks field only.
    SetA(u8),
    /// Overwrite the decay-ticks field only.
    SetD(u8),
    /// Overwrite the sustain-amplitude field only.
    SetS(u8),
    /// Overwrite the release-ticks field only.
    SetR(u8),
    /// Overwrite the pitch envelope start offset and ramp duration.
    SetPitchEnv {
        /// Signed semitone offset the pitch envelope starts from.
        offset: i8,
        /// Ticks to ramp back to zero.
        duration: u8,
    },
    /// Overwrite the arpeggio step rate (0 disables arpeggio).
    SetArpRate(u8),
    /// Overwrite the portamento glide duration in ticks.
    SetPortamento(u8),
    /// Overwrite the vibrato LFO rate and depth.
    SetVibrato {
        /// LFO speed.
        speed: u8,
        /// LFO depth in 1/4-semitone units.
        depth: u8,
    },
}

/// Classification of one decoded opcode byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// A delay opcode. Only the score player acts on these; feeding one to
    /// the runtime directly is a documented no-op (spec §4.1).
    Delay {
        /// Ticks to wait before the next event in the stream fires.
        ticks: u32,
        /// Whether completing this delay implicitly fires a `NotesOff`.
        notes_off: bool,
    },
    /// A control event to apply to the addressed track/channel.
    Control(Event),
    /// Opcode byte `0xF6..=0xFF`: undefined, reserved. Stream corruption.
    Unknown,
}

/// The result of classifying one opcode byte: how many bytes it occupies in
/// the stream, and what it means.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodedEvent {
    /// Number of bytes this opcode (including its payload) occupies.
    pub size: u8,
    /// What the opcode means.
    pub kind: EventKind,
}

fn u16be(data: &[u8]) -> u16 {
    (u16::from(data[0]) << 8) | u16::from(data[1])
}

/// Classify the opcode at the start of `data`, returning its size and
/// decoded meaning. `data` must have enough bytes for the opcode's declared
/// payload; callers that walk a validated score (see [`crate::score`])
/// always satisfy this by construction.
///
/// Ranges are tested in the exact order of spec §4.1's table — sub-ranges
/// are disjoint only when resolved top-down.
pub fn decode_event(data: &[u8]) -> DecodedEvent {
    let cmd = data[0];

    if cmd == LONG_DELTA {
        let ticks = u32::from(u16be(&data[1..3])) + u32::from(SHORT_DELTA_COUNT) + 1;
        return DecodedEvent {
            size: 3,
            kind: EventKind::Delay {
                ticks,
                notes_off: false,
            },
        };
    }
    if cmd == LONG_DELTA_NOTES_OFF {
        let ticks = u32::from(u16be(&data[1..3])) + u32::from(SHORT_DELTA_NOTES_OFF_COUNT) + 1;
        return DecodedEvent {
            size: 3,
            kind: EventKind::Delay {
                ticks,
                notes_off: true,
            },
        };
    }
    if cmd < SHORT_DELTA_START + SHORT_DELTA_COUNT as u8 {
        let ticks = u32::from(cmd - SHORT_DELTA_START) + 1;
        return DecodedEvent {
            size: 1,
            kind: EventKind::Delay {
                ticks,
                notes_off: false,
            },
        };
    }
    if cmd < SHORT_DELTA_NOTES_OFF_START + SHORT_DELTA_NOTES_OFF_COUNT as u8 {
        let ticks = u32::from(cmd - SHORT_DELTA_NOTES_OFF_START) + 1;
        return DecodedEvent {
            size: 1,
            kind: EventKind::Delay {
                ticks,
                notes_off: true,
            },
        };
    }
    if cmd < NOTE_ON_START + NOTE_ON_COUNT as u8 {
        return DecodedEvent {
            size: 1,
            kind: EventKind::Control(Event::NoteOn {
                key: cmd - NOTE_ON_START,
            }),
        };
    }
    if cmd == NOTES_OFF {
        return DecodedEvent {
            size: 1,
            kind: EventKind::Control(Event::NotesOff),
        };
    }
    if cmd == SET_FLAGS {
        return DecodedEvent {
            size: 2,
            kind: EventKind::Control(Event::SetFlags(data[1])),
        };
    }
    if cmd == SET_VOLUME {
        return DecodedEvent {
            size: 2,
            kind: EventKind::Control(Event::SetVolume(data[1])),
        };
    }
    if cmd < SET_PAN_START + SET_PAN_COUNT as u8 {
        return DecodedEvent {
            size: 1,
            kind: EventKind::Control(Event::SetPan(cmd - SET_PAN_START)),
        };
    }
    if cmd == SET_VELOCITY {
        return DecodedEvent {
            size: 2,
            kind: EventKind::Control(Event::SetVelocity(data[1])),
        };
    }
    if cmd == SET_ADSR {
        return DecodedEvent {
            size: 5,
            kind: EventKind::Control(Event::SetAdsr {
                a: data[1],
                d: data[2],
                s: data[3],
                r: data[4],
            }),
        };
    }
    if cmd == SET_A {
        return DecodedEvent {
            size: 2,
            kind: EventKind::Control(Event::SetA(data[1])),
        };
    }
    if cmd == SET_D {
        return DecodedEvent {
            size: 2,
            kind: EventKind::Control(Event::SetD(data[1])),
        };
    }
    if cmd == SET_S {
        return DecodedEvent {
            size: 2,
            kind: EventKind::Control(Event::SetS(data[1])),
        };
    }
    if cmd == SET_R {
        return DecodedEvent {
            size: 2,
            kind: EventKind::Control(Event::SetR(data[1])),
        };
    }
    if cmd == SET_PITCH_ENV {
        return DecodedEvent {
            size: 3,
            kind: EventKind::Control(Event::SetPitchEnv {
                offset: data[1] as i8,
                duration: data[2],
            }),
        };
    }
    if cmd == SET_ARP_RATE {
        return DecodedEvent {
            size: 2,
            kind: EventKind::Control(Event::SetArpRate(data[1])),
        };
    }
    if cmd == SET_PORTAMENTO {
        return DecodedEvent {
            size: 2,
            kind: EventKind::Control(Event::SetPortamento(data[1])),
        };
    }
    if cmd == SET_VIBRATO {
        return DecodedEvent {
            size: 3,
            kind: EventKind::Control(Event::SetVibrato {
                speed: data[1],
                depth: data[2],
            }),
        };
    }

    // 0xF6..=0xFF: reserved, undefined.
    DecodedEvent {
        size: 0,
        kind: EventKind::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Pad a single-byte opcode with enough trailing zero payload bytes that
    /// any 5-byte-max opcode can safely read past `data[0]`.
    fn padded(cmd: u8) -> [u8; 6] {
        [cmd, 0, 0, 0, 0, 0]
    }

    #[test]
    fn size_table_covers_all_256_opcodes() {
        for cmd in 0u16..=255 {
            let cmd = cmd as u8;
            let data = padded(cmd);
            let decoded = decode_event(&data);
            let expected_size = match cmd {
                0x00 | 0x01 => 3,
                0x02..=0x33 => 1,
                0x34..=0x65 => 1,
                0x66..=0xE5 => 1,
                0xE6 => 1,
                0xE7 | 0xE8 => 2,
                0xE9..=0xEB => 1,
                0xEC => 2,
                0xED => 5,
                0xEE..=0xF1 => 2,
                0xF2 => 3,
                0xF3 | 0xF4 => 2,
                0xF5 => 3,
                0xF6..=0xFF => 0,
            };
            assert_eq!(decoded.size, expected_size, "cmd=0x{cmd:02X}");
        }
    }

    #[test]
    fn unknown_opcodes_return_unknown() {
        for cmd in 0xF6u16..=0xFF {
            let data = padded(cmd as u8);
            let decoded = decode_event(&data);
            assert_eq!(decoded.kind, EventKind::Unknown);
            assert_eq!(decoded.size, 0);
        }
    }

    #[test]
    fn note_on_range_maps_to_midi_keys() {
        assert_eq!(
            decode_event(&padded(0x66)).kind,
            EventKind::Control(Event::NoteOn { key: 0 })
        );
        assert_eq!(
            decode_event(&padded(0xE5)).kind,
            EventKind::Control(Event::NoteOn { key: 127 })
        );
    }

    #[test]
    fn short_delta_ticks_are_one_based() {
        let EventKind::Delay { ticks, notes_off } = decode_event(&padded(0x02)).kind else {
            panic!("expected delay")
        };
        assert_eq!(ticks, 1);
        assert!(!notes_off);

        let EventKind::Delay { ticks, .. } = decode_event(&padded(0x33)).kind else {
            panic!("expected delay")
        };
        assert_eq!(ticks, 50);
    }

    #[test]
    fn short_delta_notes_off_ticks_are_one_based() {
        let EventKind::Delay { ticks, notes_off } = decode_event(&padded(0x34)).kind else {
            panic!("expected delay")
        };
        assert_eq!(ticks, 1);
        assert!(notes_off);
    }

    #[test]
    fn long_delta_matches_short_delta_at_the_boundary() {
        // A SHORT_DELTA of N ticks (N <= 50) and a LONG_DELTA carrying
        // (N - 50 - 1) must agree for N > 50 (spec §8 round-trip property).
        let n: u32 = 75;
        let long_payload = (n - SHORT_DELTA_COUNT as u32 - 1) as u16;
        let mut data = [LONG_DELTA, 0, 0, 0, 0, 0];
        data[1] = (long_payload >> 8) as u8;
        data[2] = (long_payload & 0xFF) as u8;
        let EventKind::Delay { ticks, .. } = decode_event(&data).kind else {
            panic!("expected delay")
        };
        assert_eq!(ticks, n);
    }

    #[test]
    fn set_pan_writes_only_pan_selector() {
        for (cmd, expected) in [(0xE9u8, 0u8), (0xEAu8, 1u8), (0xEBu8, 2u8)] {
            assert_eq!(
                decode_event(&padded(cmd)).kind,
                EventKind::Control(Event::SetPan(expected))
            );
        }
    }

    #[test]
    fn set_adsr_reads_four_payload_bytes() {
        let data = [0xED, 10, 20, 30, 40, 0];
        assert_eq!(
            decode_event(&data).kind,
            EventKind::Control(Event::SetAdsr {
                a: 10,
                d: 20,
                s: 30,
                r: 40
            })
        );
    }

    #[test]
    fn set_pitch_env_offset_is_signed() {
        let data = [0xF2, 0xFF, 10, 0, 0, 0]; // -1 semitone offset
        assert_eq!(
            decode_event(&data).kind,
            EventKind::Control(Event::SetPitchEnv {
                offset: -1,
                duration: 10
            })
        );
    }
}
