//! A tick-driven music playback engine for the WASM-4 fantasy console's
//! four-oscillator `tone` sink.
//!
//! The engine has two layers, driven once per host audio frame (60 Hz):
//!
//! - [`Player`] walks a packed binary score (patterns referenced from
//!   tracks, variable-length delta-encoded delays) and dispatches decoded
//!   events into the synthesis runtime at the correct ticks.
//! - [`Runtime`] owns 16 instrument presets and 4 live oscillator channels,
//!   consumes those events, and computes the WASM-4 `tone` parameters for
//!   each active channel every tick: amplitude envelope, pitch envelope,
//!   portamento, vibrato, and arpeggio.
//!
//! All arithmetic is integer-only and reproduces the WASM-4 `tone` ABI
//! bit-exactly; there is no floating point anywhere in the tick path.
//!
//! # Quick start
//! ```
//! use wasm4_tone_engine::{Runtime, ToneCall};
//!
//! let mut rt = Runtime::new();
//! rt.feed_event(0, &[0xE8, 255]); // SET_VOLUME 255
//! rt.feed_event(0, &[0xED, 0, 0, 255, 0]); // SET_ADSR a=0 d=0 s=255 r=0
//! rt.feed_event(0, &[0xEC, 127]); // SET_VELOCITY 127
//! rt.feed_event(0, &[0x66 + 69]); // NOTE_ON key=69 (A4)
//!
//! let mut calls: Vec<ToneCall> = Vec::new();
//! rt.tick(&mut |call: ToneCall| calls.push(call));
//! assert_eq!(calls.len(), 1);
//! ```
//!
//! # Driving a score
//! ```
//! use wasm4_tone_engine::{Player, Runtime, Score};
//!
//! // header{size,P=1,T=1}, pattern[0]@8, track[0]@9
//! let data: &[u8] = &[0, 10, 1, 1, 0, 8, 0, 9, 0x66 + 60, 0];
//! let score = Score::parse(data).unwrap();
//! let mut player = Player::new();
//! let mut rt = Runtime::new();
//!
//! // Per host tick: the player runs first, then the runtime.
//! let active_tracks = player.tick(&score, &mut rt);
//! rt.tick(&mut |_call| {});
//! assert_eq!(active_tracks, 1);
//! ```

#![warn(missing_docs)]

pub mod channel;
pub mod decoder;
pub mod error;
pub mod player;
pub mod runtime;
pub mod score;
pub mod tone;
pub mod track;

pub use channel::Channel;
pub use decoder::{decode_event, DecodedEvent, Event, EventKind};
pub use error::{Result, ScoreError};
pub use player::Player;
pub use runtime::Runtime;
pub use score::Score;
pub use tone::{ToneCall, ToneSink};
pub use track::{Flags, Track};
