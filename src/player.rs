//! Score player: walks a packed score's per-track cursors and dispatches
//! decoded events into the synthesis runtime at the correct ticks (spec
//! §4.4).

use crate::decoder::{decode_event, EventKind, NOTES_OFF_OPCODE};
use crate::runtime::{Runtime, TRACK_COUNT};
use crate::score::Score;

/// One track's playback position within a [`Score`] (spec §3 "Player
/// track"). `outer_cursor == 0` / `inner_cursor == 0` are "needs init"
/// sentinels — offset 0 is reserved by the header, so a real cursor
/// position never collides with them (spec §9 "sentinel-free cursors").
#[derive(Debug, Clone, Copy, Default)]
struct PlayerTrack {
    /// Byte offset into the track body selecting the next pattern id.
    outer_cursor: u16,
    /// Byte offset into the current pattern body selecting the next event.
    inner_cursor: u16,
    /// Ticks remaining until the in-progress delay completes; 0 means no
    /// delay is in progress.
    delay: u16,
}

/// Walks a packed score's tracks and dispatches events into a [`Runtime`]
/// at the ticks the stream specifies (spec §4.4).
///
/// Holds only the per-track cursors; the score bytes themselves are borrowed
/// fresh on each [`Player::tick`] call, matching the reference
/// implementation's non-owning `p->data` pointer.
#[derive(Debug, Clone)]
pub struct Player {
    tracks: [PlayerTrack; TRACK_COUNT],
}

impl Default for Player {
    fn default() -> Self {
        Player {
            tracks: [PlayerTrack::default(); TRACK_COUNT],
        }
    }
}

impl Player {
    /// Create a freshly initialized player (spec §5: `player_init`). All
    /// cursors start at the "needs init" sentinel.
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance every track by one tick against `score`, feeding any events
    /// reached this tick into `runtime`, and return the number of tracks
    /// whose cursor has not yet reached its track end (spec §4.4 "Tick
    /// algorithm"). A return of 0 signals end-of-song.
    ///
    /// The player must run before `runtime.tick()` within one host tick so
    /// that events decoded this tick affect this tick's synthesis (spec
    /// §5).
    pub fn tick(&mut self, score: &Score<'_>, runtime: &mut Runtime) -> usize {
        let data = score.data();
        let mut active_tracks = 0;

        for track_i in 0..score.track_count() {
            let (track_start, track_end) = score.track_bounds(track_i);
            let pt = &mut self.tracks[track_i];

            if pt.outer_cursor == 0 {
                pt.outer_cursor = track_start;
            }
            if pt.outer_cursor < track_end {
                active_tracks += 1;
            }

            while pt.outer_cursor < track_end {
                let pattern_id = data[pt.outer_cursor as usize] as usize;
                let (pattern_start, pattern_end) = score.pattern_bounds(pattern_id);

                if pt.inner_cursor >= pattern_end {
                    pt.inner_cursor = 0;
                    pt.outer_cursor += 1;
                    continue;
                }
                if pt.inner_cursor == 0 {
                    pt.inner_cursor = pattern_start;
                }

                let cmd_data = &data[pt.inner_cursor as usize..];
                let decoded = decode_event(cmd_data);

                match decoded.kind {
                    EventKind::Delay { ticks, notes_off } => {
                        if pt.delay == 0 {
                            pt.delay = ticks as u16;
                        } else {
                            pt.delay -= 1;
                            if pt.delay == 0 {
                                pt.inner_cursor += u16::from(decoded.size);
                                if notes_off {
                                    runtime.feed_event(track_i as u8, &[NOTES_OFF_OPCODE]);
                                }
                                continue;
                            }
                        }
                        break;
                    }
                    EventKind::Unknown => {
                        // Stream corruption (spec §9, REDESIGN FLAG): treat
                        // this track as ended for this tick rather than
                        // inheriting the reference implementation's
                        // zero-size infinite loop.
                        break;
                    }
                    EventKind::Control(_) => {
                        let size = runtime.feed_event(track_i as u8, cmd_data);
                        pt.inner_cursor += u16::from(size);
                        continue;
                    }
                }
            }
        }

        active_tracks
    }
}
