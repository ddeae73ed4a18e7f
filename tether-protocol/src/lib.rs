//! Tether Companion-Link Protocol
//!
//! This crate implements the text protocol spoken between the board and
//! its companion device over a byte-oriented serial channel. The format is
//! a compact JSON-like object per frame, cheap enough to emit and parse on
//! a part with a few kilobytes of RAM.
//!
//! # Protocol Overview
//!
//! Outbound frames are written incrementally, never buffered whole:
//!
//! ```text
//! {'Service':'<name>','Id':<id>,'<key>':<value>,...}
//! ```
//!
//! Text values are single-quoted with `'` and `\` backslash-escaped,
//! arrays of objects are wrapped `[{`...`}]`, and the two-byte frame `{}`
//! is a keep-alive probe. Inbound frames are brace-balanced objects with
//! the recognized keys `Type`, `Tag`, `Id`/`Pid`, `ResultId`, `Result`,
//! `Action` and `Value`; anything else is peripheral cargo.
//!
//! Frames carry no length prefix or checksum — framing is recovered by
//! counting brace depth ([`FrameAssembler`]) and a damaged frame simply
//! fails to parse and is discarded.

#![no_std]
#![deny(unsafe_code)]

pub mod event;
pub mod field;
pub mod frame;
pub mod hash;
pub mod json;
pub mod writer;

pub use event::{EventClass, ShieldEvent, SystemCommand, MAX_EVENT_TEXT, SYSTEM_EVENT};
pub use field::{Field, Value};
pub use frame::{FrameAssembler, DEFAULT_FRAME_CAPACITY};
pub use json::ObjectView;
pub use writer::{ChannelState, Messenger, KEEPALIVE, SYSTEM_SERVICE};
