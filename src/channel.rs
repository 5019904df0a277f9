//! Channel: the live state of one WASM-4 oscillator (spec §3, "Channel").

/// Maximum number of simultaneously held keys on a channel.
pub const MAX_KEYS: usize = 8;

/// The live state of one of the four WASM-4 oscillator slots.
///
/// At most one track owns a channel at a time (spec §3 invariant). Feeding a
/// `NOTE_ON` whose track addresses a different channel than the track
/// currently owns reassigns ownership and resets the held-key set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Channel {
    /// Which track currently owns this channel, or `None` if untouched
    /// since init (sentinel `0xff` in the reference implementation).
    pub active_track_i: Option<u8>,
    /// Number of simultaneously held keys, 0..=8. 0 means "in release or
    /// silent".
    pub active_key_count: u8,
    /// MIDI-key stack. While holding, position 0 is oldest and position
    /// `active_key_count - 1` is newest. Once all keys release,
    /// `note_keys[0]` holds the last-released key.
    pub note_keys: [u8; MAX_KEYS],
    /// Ticks elapsed since the current key set began (the 0-keys -> >=1-key
    /// transition), or ticks in the release phase. Saturates at `u16::MAX`.
    pub first_trigger_ticks: u16,
    /// Ticks elapsed since the most recently added key. Saturates at
    /// `u8::MAX`.
    pub last_trigger_ticks: u8,
}

impl Default for Channel {
    fn default() -> Self {
        Channel {
            active_track_i: None,
            active_key_count: 0,
            note_keys: [0; MAX_KEYS],
            first_trigger_ticks: 0,
            last_trigger_ticks: 0,
        }
    }
}

impl Channel {
    /// Push `key`, reassigning ownership to `track_i` first if needed, and
    /// discarding the oldest held key on overflow (spec §4.3 `NOTE_ON`).
    pub fn note_on(&mut self, track_i: u8, key: u8) {
        if self.active_track_i != Some(track_i) {
            self.active_track_i = Some(track_i);
            self.active_key_count = 0;
        }
        if self.active_key_count as usize == MAX_KEYS {
            self.note_keys.copy_within(1.., 0);
            self.active_key_count -= 1;
        }
        if self.active_key_count == 0 {
            self.first_trigger_ticks = 0;
        }
        self.note_keys[self.active_key_count as usize] = key;
        self.active_key_count += 1;
        self.last_trigger_ticks = 0;
    }

    /// Release all held keys, preserving the currently-sounding key (per
    /// `arp_rate`) as `note_keys[0]` for the release phase (spec §4.3
    /// `NOTES_OFF`). `arp_rate` is read from the owning track.
    pub fn notes_off(&mut self, arp_rate: u8) {
        if self.active_key_count > 0 {
            let key_i = current_key_index(self.first_trigger_ticks, arp_rate, self.active_key_count);
            let key = self.note_keys[key_i as usize];
            self.note_keys[0] = key;
            self.active_key_count = 0;
            self.first_trigger_ticks = 0;
        }
    }

    /// Advance the saturating tick counters by one (spec §4.2 "Tick
    /// advance").
    pub fn advance_ticks(&mut self) {
        self.first_trigger_ticks = self.first_trigger_ticks.saturating_add(1);
        self.last_trigger_ticks = self.last_trigger_ticks.saturating_add(1);
    }
}

/// The index into `note_keys` of the currently sounding key, per spec §4.2
/// "Key selection": arpeggiated if `arp_rate > 0`, else the newest key.
pub fn current_key_index(first_trigger_ticks: u16, arp_rate: u8, active_key_count: u8) -> u8 {
    debug_assert!(active_key_count > 0);
    if arp_rate > 0 {
        (first_trigger_ticks / u16::from(arp_rate) % u16::from(active_key_count)) as u8
    } else {
        active_key_count - 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn note_on_resets_ownership_on_track_switch() {
        let mut ch = Channel::default();
        ch.note_on(2, 60);
        ch.note_on(2, 64);
        assert_eq!(ch.active_key_count, 2);

        ch.note_on(5, 67);
        assert_eq!(ch.active_track_i, Some(5));
        assert_eq!(ch.active_key_count, 1);
        assert_eq!(ch.note_keys[0], 67);
    }

    #[test]
    fn note_on_overflow_discards_oldest() {
        let mut ch = Channel::default();
        for key in 60..69 {
            ch.note_on(0, key);
        }
        assert_eq!(ch.active_key_count, 8);
        assert_eq!(ch.note_keys, [61, 62, 63, 64, 65, 66, 67, 68]);
    }

    #[test]
    fn notes_off_preserves_sounding_key_and_resets_counters() {
        let mut ch = Channel::default();
        ch.note_on(0, 60);
        ch.note_on(0, 64);
        ch.note_on(0, 67);
        ch.first_trigger_ticks = 42;

        ch.notes_off(0); // no arpeggio: newest key (67) is sounding
        assert_eq!(ch.active_key_count, 0);
        assert_eq!(ch.first_trigger_ticks, 0);
        assert_eq!(ch.note_keys[0], 67);
    }

    #[test]
    fn saturation_after_70000_ticks() {
        let mut ch = Channel::default();
        ch.note_on(0, 60); // resets counters, but we then simulate held ticks
        for _ in 0..70_000 {
            ch.advance_ticks();
        }
        assert_eq!(ch.first_trigger_ticks, u16::MAX);
        assert_eq!(ch.last_trigger_ticks, u8::MAX);
    }

    #[test]
    fn active_key_count_never_exceeds_max() {
        let mut ch = Channel::default();
        for key in 0..200u16 {
            ch.note_on(0, (key % 128) as u8);
            assert!(ch.active_key_count as usize <= MAX_KEYS);
        }
    }
}
