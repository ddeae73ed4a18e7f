//! Outbound message encoding
//!
//! Messages are written incrementally to the serial link as fields are
//! appended; nothing is buffered beyond one numeric rendering, so a frame
//! can be arbitrarily long without costing RAM. A transport error aborts
//! the message in place — partially written frames are not retried or
//! rolled back, the companion discards whatever fails to parse.

use core::fmt::Write as _;

use heapless::String;
use tether_hal::{Clock, SerialLink};

use crate::field::{Field, Value, TEMPLATE_SENTINEL};

// Wire fragments, shared with the companion-side parser.
const MESSAGE_SERVICE_START: &str = "{'Service':'";
const MESSAGE_SERVICE_TO_ID: &str = "','Id':";
const QUOTE: &str = "'";
const SEPARATOR: &str = ",'";
const PAIR_SEPARATOR: &str = "':";
const MESSAGE_END: &str = "}";
const ARRAY_START: &str = "[{";
const ARRAY_END: &str = "}]";
const TRUE: &str = "true";
const FALSE: &str = "false";

/// Keep-alive probe frame
pub const KEEPALIVE: &str = "{}";

/// Service name for connection-lifecycle messages
pub const SYSTEM_SERVICE: &str = "SYSTEM";

// Wire keys understood by both sides.
pub const KEY_ACTION: &str = "Action";
pub const KEY_TYPE: &str = "Type";
pub const KEY_LEN: &str = "Len";

// Lifecycle actions.
pub const ACTION_PONG: &str = "PONG";
pub const ACTION_START: &str = "START";

/// Encoder and correlator state that outlives a single message
#[derive(Debug, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChannelState {
    /// Next outbound message id; positive 16-bit space, wrapping to 1.
    /// Zero and negative values are reserved error sentinels and are
    /// never assigned.
    pub next_id: i16,
    /// An array was just opened; the next separator is a bare quote
    pub array_started: bool,
    /// Timestamp of the last flush, used for idle-probe pacing
    pub last_activity_ms: u32,
}

impl ChannelState {
    pub const fn new() -> Self {
        Self {
            next_id: 1,
            array_started: false,
            last_activity_ms: 0,
        }
    }

    /// Claim the next message id
    pub fn take_id(&mut self) -> i16 {
        let id = self.next_id;
        self.next_id = match self.next_id.checked_add(1) {
            Some(next) if next > 0 => next,
            _ => 1,
        };
        id
    }
}

impl Default for ChannelState {
    fn default() -> Self {
        Self::new()
    }
}

/// Incremental message encoder over a borrowed serial link
///
/// A `Messenger` is constructed on the fly from the engine's link, clock
/// and [`ChannelState`]; event callbacks receive one so they can send
/// messages from inside dispatch.
pub struct Messenger<'m, L: SerialLink, C: Clock> {
    link: &'m mut L,
    clock: &'m C,
    state: &'m mut ChannelState,
}

impl<'m, L: SerialLink, C: Clock> Messenger<'m, L, C> {
    pub fn new(link: &'m mut L, clock: &'m C, state: &'m mut ChannelState) -> Self {
        Self { link, clock, state }
    }

    /// Write the message preamble `{'Service':'<name>','Id':<id>` and
    /// return the assigned id
    pub fn begin_message(&mut self, service: &str) -> Result<i16, L::Error> {
        let id = self.state.take_id();
        self.state.array_started = false;
        self.put(MESSAGE_SERVICE_START)?;
        self.put(service)?;
        self.put(MESSAGE_SERVICE_TO_ID)?;
        self.put_display(id)?;
        Ok(id)
    }

    /// Append one field to the open message
    pub fn write_field(&mut self, field: &Field<'_>) -> Result<(), L::Error> {
        match field.value {
            Value::None => return Ok(()),
            Value::ArrayEnd => return self.put(ARRAY_END),
            _ => {}
        }
        if self.state.array_started {
            self.put(QUOTE)?;
            self.state.array_started = false;
        } else {
            self.put(SEPARATOR)?;
        }
        self.put(field.key)?;
        self.put(PAIR_SEPARATOR)?;
        if field.as_text {
            self.put(QUOTE)?;
        }
        self.render_value(&field.value, field.encoded)?;
        if field.as_text {
            self.put(QUOTE)?;
        }
        Ok(())
    }

    /// Close the frame, flush the port, and stamp the probe clock
    pub fn end_message(&mut self) -> Result<(), L::Error> {
        self.put(MESSAGE_END)?;
        self.link.flush()?;
        self.state.last_activity_ms = self.clock.now_ms();
        Ok(())
    }

    /// Encode and transmit one whole message
    pub fn send(&mut self, service: &str, fields: &[Field<'_>]) -> Result<i16, L::Error> {
        let id = self.begin_message(service)?;
        for field in fields {
            self.write_field(field)?;
        }
        self.end_message()?;
        Ok(id)
    }

    /// Encode and transmit fields plus a trailing `Type` discriminator,
    /// the shape peripheral-bound commands use
    pub fn send_typed(
        &mut self,
        service: &str,
        fields: &[Field<'_>],
        discriminator: char,
    ) -> Result<i16, L::Error> {
        let id = self.begin_message(service)?;
        for field in fields {
            self.write_field(field)?;
        }
        self.write_field(&Field::character(KEY_TYPE, discriminator))?;
        self.end_message()?;
        Ok(id)
    }

    /// Answer a system PING
    pub fn send_pong(&mut self) -> Result<i16, L::Error> {
        self.send(
            SYSTEM_SERVICE,
            &[
                Field::constant(KEY_ACTION, ACTION_PONG),
                Field::text(KEY_TYPE, "!"),
            ],
        )
    }

    /// Write text to the channel with no framing at all
    pub fn write_raw(&mut self, text: &str) -> Result<(), L::Error> {
        self.put(text)
    }

    fn render_value(&mut self, value: &Value<'_>, encoded: bool) -> Result<(), L::Error> {
        match *value {
            Value::None | Value::ArrayEnd => Ok(()),
            Value::Template(template) => {
                self.render_template(template, 0, false)?;
                Ok(())
            }
            Value::Str(text) => self.put_escaped(text, encoded),
            Value::Int(v) => self.put_display(v),
            Value::Uint(v) => self.put_display(v),
            Value::Long(v) => self.put_display(v),
            Value::Double(v) => {
                let mut rendered: String<24> = String::new();
                let _ = write!(rendered, "{v:.4}");
                self.put(&rendered)
            }
            Value::Bool(v) => self.put(if v { TRUE } else { FALSE }),
            Value::Char(v) => {
                let mut encoded_char = [0u8; 4];
                self.put(v.encode_utf8(&mut encoded_char))
            }
            Value::ArrayStart => {
                self.put(ARRAY_START)?;
                self.state.array_started = true;
                Ok(())
            }
            Value::Format { template, values } => self.render_format(template, values),
        }
    }

    /// Copy template text, escaping quotes
    ///
    /// In sentinel mode rendering stops immediately past the first `~` at
    /// or after `from`; the return value is the offset to resume from, or
    /// zero once the template is exhausted.
    fn render_template(
        &mut self,
        template: &str,
        from: usize,
        stop_at_sentinel: bool,
    ) -> Result<usize, L::Error> {
        let bytes = template.as_bytes();
        let mut i = from.min(bytes.len());
        while i < bytes.len() {
            let byte = bytes[i];
            i += 1;
            if stop_at_sentinel && byte == TEMPLATE_SENTINEL {
                return Ok(i);
            }
            if byte == b'\'' {
                self.put("\\")?;
            }
            self.link.write(&[byte])?;
        }
        Ok(0)
    }

    /// Alternate template segments with nested values until the template
    /// runs out (or the values do)
    fn render_format(&mut self, template: &str, values: &[Value<'_>]) -> Result<(), L::Error> {
        let mut position = 0;
        let mut next_value = 0;
        loop {
            position = self.render_template(template, position, true)?;
            if position == 0 {
                break;
            }
            let Some(value) = values.get(next_value) else {
                break;
            };
            next_value += 1;
            self.render_value(value, false)?;
        }
        Ok(())
    }

    fn put(&mut self, text: &str) -> Result<(), L::Error> {
        self.link.write(text.as_bytes())
    }

    fn put_escaped(&mut self, text: &str, encoded: bool) -> Result<(), L::Error> {
        if encoded {
            return self.put(text);
        }
        for &byte in text.as_bytes() {
            if byte == b'\'' || byte == b'\\' {
                self.put("\\")?;
            }
            self.link.write(&[byte])?;
        }
        Ok(())
    }

    fn put_display(&mut self, value: impl core::fmt::Display) -> Result<(), L::Error> {
        let mut rendered: String<24> = String::new();
        let _ = write!(rendered, "{value}");
        self.put(&rendered)
    }
}
