//! Synthesis runtime: owns tracks and channels, consumes decoded events, and
//! computes one tone call per active channel per tick (spec §4.2, §4.3).

use crate::channel::{current_key_index, Channel};
use crate::decoder::{decode_event, Event, EventKind};
use crate::tone::{ToneCall, ToneSink};
use crate::track::{Flags, Track};

/// Number of instrument preset slots.
pub const TRACK_COUNT: usize = 16;
/// Number of oscillator channels.
pub const CHANNEL_COUNT: usize = 4;

/// Owns all per-track instrument parameters and per-channel live note state,
/// and drives per-tick synthesis (spec §3, §4.2, §4.3).
#[derive(Debug, Clone, Copy)]
pub struct Runtime {
    /// The 16 instrument presets, indexed by track id.
    pub tracks: [Track; TRACK_COUNT],
    /// The 4 oscillator channels.
    pub channels: [Channel; CHANNEL_COUNT],
}

impl Default for Runtime {
    fn default() -> Self {
        Runtime {
            tracks: [Track::default(); TRACK_COUNT],
            channels: [Channel::default(); CHANNEL_COUNT],
        }
    }
}

impl Runtime {
    /// Create a freshly initialized runtime (spec §5: `runtime_init`).
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one decoded event to the track addressed by `track_i`, returning
    /// the number of bytes the opcode at the start of `data` occupies so a
    /// caller can advance by exactly that many bytes (spec §4.1).
    ///
    /// Delay opcodes are only meaningful to [`crate::player::Player`];
    /// feeding one here is a documented no-op that still reports its size.
    pub fn feed_event(&mut self, track_i: u8, data: &[u8]) -> u8 {
        let decoded = decode_event(data);
        if let EventKind::Control(event) = decoded.kind {
            self.apply_event(track_i, event);
        }
        decoded.size
    }

    fn apply_event(&mut self, track_i: u8, event: Event) {
        // NoteOn/NotesOff address a channel derived from the track's
        // current flags, so the track borrow must not outlive that lookup
        // (channels and tracks are disjoint fields, but a `&mut Track` held
        // across a `self.channels` access would still conflict).
        match event {
            Event::NoteOn { key } => {
                let ch = self.tracks[track_i as usize].flags.channel();
                self.channels[ch as usize].note_on(track_i, key);
                return;
            }
            Event::NotesOff => {
                let track = self.tracks[track_i as usize];
                let ch = track.flags.channel();
                self.channels[ch as usize].notes_off(track.arp_rate);
                return;
            }
            _ => {}
        }

        let track = &mut self.tracks[track_i as usize];
        match event {
            Event::NoteOn { .. } | Event::NotesOff => unreachable!("handled above"),
            Event::SetFlags(bits) => track.flags = Flags::from_bits_truncate(bits),
            Event::SetVolume(v) => track.volume = v,
            Event::SetPan(pan) => track.flags = track.flags.with_pan(pan),
            Event::SetVelocity(v) => track.velocity = v,
            Event::SetAdsr { a, d, s, r } => {
                track.a = a;
                track.d = d;
                track.s = s;
                track.r = r;
            }
            Event::SetA(a) => track.a = a,
            Event::SetD(d) => track.d = d,
            Event::SetS(s) => track.s = s,
            Event::SetR(r) => track.r = r,
            Event::SetPitchEnv { offset, duration } => {
                track.pe_offset = offset;
                track.pe_duration = duration;
            }
            Event::SetArpRate(rate) => track.arp_rate = rate,
            Event::SetPortamento(ticks) => track.portamento = ticks,
            Event::SetVibrato { speed, depth } => {
                track.vib_speed = speed;
                track.vib_depth = depth;
            }
        }
    }

    /// Advance every active channel by one tick, emitting at most one
    /// [`ToneCall`] per channel to `sink` (spec §4.2).
    pub fn tick<S: ToneSink>(&mut self, sink: &mut S) {
        let tracks = self.tracks; // Track is Copy; avoids a borrow conflict with channels below.
        for channel in self.channels.iter_mut() {
            let Some(track_i) = channel.active_track_i else {
                continue;
            };
            let track = &tracks[track_i as usize];
            let flags_byte = track.flags.bits() | 0x40;

            let vel_undiv = i32::from(track.volume) * i32::from(track.velocity);
            let peak_amp = (100 * vel_undiv) / (255 * 127);
            let sus_amp = (100 * vel_undiv * i32::from(track.s)) / (255 * 127 * 255);

            if channel.active_key_count > 0 {
                let n = channel.active_key_count;
                let key_i = current_key_index(channel.first_trigger_ticks, track.arp_rate, n);
                let prev_key_i = (key_i + n - 1) % n;
                let key = channel.note_keys[key_i as usize];
                let prev_key = channel.note_keys[prev_key_i as usize];

                let key_ticks: i32 = if track.arp_rate > 0 && n >= 2 {
                    i32::from(channel.first_trigger_ticks % u16::from(track.arp_rate))
                } else {
                    i32::from(channel.first_trigger_ticks)
                };
                let porta_ticks: i32 = if track.arp_rate > 0 {
                    key_ticks
                } else {
                    i32::from(channel.last_trigger_ticks)
                };

                let a = i32::from(track.a);
                let (from_vol, to_vol) = if key_ticks < a {
                    (
                        ramp(key_ticks, a, 0, peak_amp),
                        ramp(key_ticks + 1, a, 0, peak_amp),
                    )
                } else {
                    let d = i32::from(track.d);
                    (
                        ramp(key_ticks - a, d, peak_amp, sus_amp),
                        ramp(key_ticks + 1 - a, d, peak_amp, sus_amp),
                    )
                };

                let portamento = i32::from(track.portamento);
                let from_key = i32::from(prev_key) << 8;
                let to_key = i32::from(key) << 8;
                let porta_from = ramp(porta_ticks, portamento, from_key, to_key);
                let porta_to = ramp(porta_ticks + 1, portamento, from_key, to_key);

                let pe_from_val = i32::from(track.pe_offset) << 8;
                let pe_duration = i32::from(track.pe_duration);
                let pe_from = ramp(key_ticks, pe_duration, pe_from_val, 0);
                let pe_to = ramp(key_ticks + 1, pe_duration, pe_from_val, 0);

                let vib_step = u32::from(track.vib_speed) << 6;
                let vib_peak = i32::from(track.vib_depth) << 2;
                let vib_phase_from = 0x3FFFu32.wrapping_add((porta_ticks as u32).wrapping_mul(vib_step)) & 0xFFFF;
                let vib_phase_to =
                    0x3FFFu32.wrapping_add(((porta_ticks + 1) as u32).wrapping_mul(vib_step)) & 0xFFFF;
                let vib_from = triangle(vib_phase_from, vib_peak);
                let vib_to = triangle(vib_phase_to, vib_peak);

                let from_pitch = porta_from + pe_from + vib_from;
                let to_pitch = porta_to + pe_to + vib_to;
                let frequency = swap16(from_pitch) | (swap16(to_pitch) << 16);

                if from_vol != 0 {
                    sink.tone(ToneCall {
                        frequency,
                        duration: 1 << 16,
                        volume: (to_vol as u32) | ((from_vol as u32) << 8),
                        flags: flags_byte,
                    });
                } else if to_vol != 0 {
                    sink.tone(ToneCall {
                        frequency,
                        duration: 1 << 24,
                        volume: (to_vol as u32) | ((to_vol as u32) << 8),
                        flags: flags_byte,
                    });
                }
            } else if channel.first_trigger_ticks == 0 {
                let key = channel.note_keys[0];
                sink.tone(ToneCall {
                    frequency: u32::from(key),
                    duration: u32::from(track.r) << 8,
                    volume: sus_amp as u32,
                    flags: flags_byte,
                });
            }

            channel.advance_ticks();
        }
    }
}

/// Linear ramp from `from` to `to` over `duration` ticks, evaluated at `t`
/// (spec §4.2 "Volume ramp"). Integer truncation matches C's `/` exactly
/// (both truncate toward zero).
fn ramp(t: i32, duration: i32, from: i32, to: i32) -> i32 {
    if duration == 0 || t >= duration {
        to
    } else if t <= 0 {
        from
    } else {
        from + (to - from) * t / duration
    }
}

/// Triangle LFO: `phase` is 0..=0xFFFF, `peak` is the amplitude at the
/// extremes (spec §4.2 "Vibrato").
fn triangle(phase: u32, peak: i32) -> i32 {
    if phase < 0x7FFF {
        (2 * peak * phase as i32) / 0x7FFF - peak
    } else {
        (2 * peak * (0xFFFF - phase) as i32) / 0x7FFF - peak
    }
}

/// Swap the high and low bytes of a 16-bit value carried in an `i32`,
/// masked to 16 bits (spec §4.2 "Frequency parameter").
fn swap16(x: i32) -> u32 {
    let x = x as u32;
    ((x >> 8) | (x << 8)) & 0xFFFF
}
