//! The Tether engine
//!
//! One value owns every piece of protocol state: the serial link, the
//! outbound channel state, the frame assembler, the peripheral registry
//! and the most recent decoded event. There are no globals and no locks;
//! the application calls [`Tether::poll`] from its main loop and all
//! dispatch happens inside that call.
//!
//! Blocking waits are busy-polling loops bounded by a deadline. While a
//! caller waits for a specific response the engine keeps dispatching
//! unrelated events, so callbacks must tolerate running in the middle of
//! someone else's `wait_for`.

use tether_hal::{Clock, SerialLink};
use tether_protocol::{
    json,
    writer::{self, ChannelState, Messenger},
    EventClass, Field, FrameAssembler, ShieldEvent, SystemCommand, DEFAULT_FRAME_CAPACITY,
    KEEPALIVE, SYSTEM_EVENT,
};

use crate::config::DriverConfig;
use crate::handler::EventSink;
use crate::peripheral::{Peripheral, PeripheralRegistry, RegistryFull, MAX_PERIPHERALS};

/// Result filter matching any `result_id` in [`Tether::wait_for`]
pub const RESULT_ANY: i64 = -1;

/// Companion-link protocol engine
///
/// `N` is the inbound frame capacity in bytes, `P` the peripheral
/// registry capacity.
pub struct Tether<
    'a,
    L: SerialLink,
    C: Clock,
    const N: usize = DEFAULT_FRAME_CAPACITY,
    const P: usize = MAX_PERIPHERALS,
> {
    link: L,
    clock: C,
    channel: ChannelState,
    rx: FrameAssembler<N>,
    registry: PeripheralRegistry<'a, P>,
    sink: Option<&'a mut dyn EventSink<L, C>>,
    config: DriverConfig,
    recent: ShieldEvent,
}

impl<'a, L, C, const N: usize, const P: usize> Tether<'a, L, C, N, P>
where
    L: SerialLink,
    C: Clock,
{
    pub fn new(link: L, clock: C) -> Self {
        Self::with_config(link, clock, DriverConfig::default())
    }

    pub fn with_config(link: L, clock: C, config: DriverConfig) -> Self {
        let mut channel = ChannelState::new();
        channel.last_activity_ms = clock.now_ms();
        Self {
            link,
            clock,
            channel,
            rx: FrameAssembler::new(),
            registry: PeripheralRegistry::new(),
            sink: None,
            config,
            recent: ShieldEvent::new(),
        }
    }

    /// Install the lifecycle/observer callbacks
    pub fn set_sink(&mut self, sink: &'a mut dyn EventSink<L, C>) {
        self.sink = Some(sink);
    }

    /// Add a peripheral to the dispatch registry
    pub fn register(&mut self, peripheral: &'a mut dyn Peripheral) -> Result<(), RegistryFull> {
        self.registry.register(peripheral)
    }

    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut DriverConfig {
        &mut self.config
    }

    /// Direct access to the transport (port setup, test injection)
    pub fn link_mut(&mut self) -> &mut L {
        &mut self.link
    }

    /// The last event decoded by [`poll`](Self::poll)
    pub fn recent_event(&self) -> &ShieldEvent {
        &self.recent
    }

    /// The last decoded event reported an error result
    pub fn has_error(&self) -> bool {
        self.recent.is_error()
    }

    /// Encoder over the link for hand-rolled messages
    pub fn messenger(&mut self) -> Messenger<'_, L, C> {
        Messenger::new(&mut self.link, &self.clock, &mut self.channel)
    }

    /// Start the conversation
    ///
    /// Flushes the port, announces this side's receive window on the
    /// system service, then runs the connect and refresh callbacks.
    pub fn begin(&mut self) -> Result<(), L::Error> {
        self.link.flush()?;
        self.channel.last_activity_ms = self.clock.now_ms();
        self.messenger().send(
            writer::SYSTEM_SERVICE,
            &[
                Field::constant(writer::KEY_ACTION, writer::ACTION_START),
                Field::text(writer::KEY_TYPE, "!"),
                Field::int(writer::KEY_LEN, N as i32),
            ],
        )?;
        let Self {
            link,
            clock,
            channel,
            sink,
            recent,
            ..
        } = self;
        if let Some(sink) = sink.as_deref_mut() {
            let mut messenger = Messenger::new(link, clock, channel);
            sink.on_connect(&mut messenger, recent);
            sink.on_refresh(&mut messenger, recent);
        }
        Ok(())
    }

    /// Encode and transmit one message, returning its correlation id
    pub fn send(&mut self, service: &str, fields: &[Field<'_>]) -> Result<i16, L::Error> {
        self.messenger().send(service, fields)
    }

    /// [`send`](Self::send) plus a trailing `Type` discriminator
    pub fn send_typed(
        &mut self,
        service: &str,
        fields: &[Field<'_>],
        discriminator: char,
    ) -> Result<i16, L::Error> {
        self.messenger().send_typed(service, fields, discriminator)
    }

    /// Write text to the channel with no framing at all
    pub fn write_raw(&mut self, text: &str) -> Result<(), L::Error> {
        self.messenger().write_raw(text)
    }

    /// Pump the link once
    ///
    /// Sends the idle probe when due, then drains currently available
    /// bytes into the frame assembler. At most one completed frame is
    /// decoded and dispatched per call; poll again for more. Returns true
    /// when an event was decoded and dispatched.
    pub fn poll(&mut self) -> bool {
        if self.link.available() == 0
            && self.clock.since(self.channel.last_activity_ms) >= self.config.probe_interval_ms
        {
            let _ = self.link.write(KEEPALIVE.as_bytes());
            self.channel.last_activity_ms = self.clock.now_ms();
        }

        let mut dispatched = false;
        let mut had_data = false;
        while self.link.available() > 0 {
            let Some(byte) = self.link.read() else {
                break;
            };
            had_data = true;
            if self.rx.feed(byte) {
                dispatched = self.dispatch_frame();
                self.rx.reset();
                break;
            }
        }

        if had_data {
            // Next probe becomes eligible probe_grace_ms after the last
            // processed byte, not a full interval later.
            let backoff = self
                .config
                .probe_interval_ms
                .saturating_sub(self.config.probe_grace_ms);
            self.channel.last_activity_ms = self.clock.now_ms().wrapping_sub(backoff);
        }

        dispatched
    }

    /// Drain every event currently deliverable; true if there were any
    pub fn check_events(&mut self) -> bool {
        let mut any = false;
        while self.poll() {
            any = true;
        }
        any
    }

    /// Wait for the response to message `id`
    ///
    /// Non-positive ids are pre-existing error codes and are returned
    /// unchanged without waiting. Otherwise the engine busy-polls —
    /// dispatching unrelated events along the way — until an event
    /// arrives whose id matches and whose `result_id` matches
    /// `result_filter` ([`RESULT_ANY`] matches anything), returning `id`;
    /// or until `timeout_ms` elapses, returning 0.
    pub fn wait_for(&mut self, id: i16, timeout_ms: u32, result_filter: i64) -> i16 {
        if id <= 0 {
            return id;
        }
        let started = self.clock.now_ms();
        while self.clock.since(started) < timeout_ms {
            if self.poll()
                && self.recent.id == i32::from(id)
                && (result_filter == RESULT_ANY || self.recent.result_id == result_filter)
            {
                return id;
            }
        }
        0
    }

    /// Conditionally wait for a response
    ///
    /// Delegates to [`wait_for`](Self::wait_for) only when both the
    /// auto-block policy and the caller ask for it; otherwise the id is
    /// returned unchanged (fire and forget).
    pub fn block(&mut self, id: i16, blocking: bool, timeout_ms: u32, result_filter: i64) -> i16 {
        if self.config.auto_block && blocking {
            self.wait_for(id, timeout_ms, result_filter)
        } else {
            id
        }
    }

    /// Decode and route the completed frame held by the assembler
    fn dispatch_frame(&mut self) -> bool {
        let Self {
            link,
            clock,
            channel,
            rx,
            registry,
            sink,
            recent,
            ..
        } = self;
        let Some(object) = json::parse(rx.frame()) else {
            return false;
        };
        let mut event = ShieldEvent::decode(&object);
        match event.discriminator {
            Some(SYSTEM_EVENT) => {
                let mut messenger = Messenger::new(link, clock, channel);
                let mut refresh = false;
                match SystemCommand::from_hash(event.result_hash) {
                    Some(SystemCommand::Ping) => {
                        let _ = messenger.send_pong();
                    }
                    Some(SystemCommand::Refresh) => refresh = true,
                    Some(SystemCommand::Connect) => {
                        refresh = true;
                        if let Some(sink) = sink.as_deref_mut() {
                            sink.on_connect(&mut messenger, &event);
                        }
                    }
                    Some(SystemCommand::Suspend) => {
                        if let Some(sink) = sink.as_deref_mut() {
                            sink.on_suspend(&mut messenger, &event);
                        }
                    }
                    Some(SystemCommand::Resume) => {
                        refresh = true;
                        if let Some(sink) = sink.as_deref_mut() {
                            sink.on_resume(&mut messenger, &event);
                        }
                    }
                    None => {}
                }
                if refresh {
                    if let Some(sink) = sink.as_deref_mut() {
                        sink.on_refresh(&mut messenger, &event);
                    }
                }
            }
            Some(discriminator) => {
                if let Some((slot, peripheral)) = registry.find_mut(discriminator) {
                    peripheral.decode(&object, &mut event);
                    if event.class == EventClass::Sensor {
                        event.peripheral = Some(slot);
                    }
                }
            }
            None => {}
        }
        if let Some(sink) = sink.as_deref_mut() {
            let mut messenger = Messenger::new(link, clock, channel);
            sink.on_event(&mut messenger, &event);
        }
        *recent = event;
        true
    }
}
