//! Peripheral capability and registry
//!
//! A peripheral is a handler for companion events of one type
//! discriminator ('A' for accelerometer, 'L' for light, and so on —
//! whatever the deployment defines). The engine never knows concrete
//! peripheral types; it dispatches through this trait.

use heapless::Vec;
use tether_protocol::{ObjectView, ShieldEvent};

/// Default registry capacity, matching the reference companion setup
pub const MAX_PERIPHERALS: usize = 10;

/// Handler for companion events of one type discriminator
pub trait Peripheral {
    /// One-character event type this peripheral consumes
    fn discriminator(&self) -> char;

    /// Reinterpret a dispatched frame
    ///
    /// `cargo` is the raw parsed object, so implementations can read keys
    /// the core does not know about. They may replace any field of
    /// `event`, and mark it [`tether_protocol::EventClass::Sensor`] to
    /// have the dispatcher attach their registry slot as a
    /// back-reference.
    fn decode(&mut self, cargo: &ObjectView<'_>, event: &mut ShieldEvent);
}

/// Registry is at capacity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RegistryFull;

/// Insertion-ordered, fixed-capacity peripheral collection
///
/// Lookup is a first-match linear scan; the bound is small enough that
/// nothing fancier is warranted.
pub struct PeripheralRegistry<'p, const P: usize = MAX_PERIPHERALS> {
    slots: Vec<&'p mut dyn Peripheral, P>,
}

impl<'p, const P: usize> PeripheralRegistry<'p, P> {
    pub const fn new() -> Self {
        Self { slots: Vec::new() }
    }

    /// Add a peripheral; insertion order is dispatch order
    pub fn register(&mut self, peripheral: &'p mut dyn Peripheral) -> Result<(), RegistryFull> {
        self.slots.push(peripheral).map_err(|_| RegistryFull)
    }

    /// First peripheral whose discriminator matches, with its slot index
    pub fn find_mut(
        &mut self,
        discriminator: char,
    ) -> Option<(usize, &mut (dyn Peripheral + 'p))> {
        self.slots
            .iter_mut()
            .enumerate()
            .find(|(_, peripheral)| peripheral.discriminator() == discriminator)
            .map(|(slot, peripheral)| (slot, &mut **peripheral))
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

impl<'p, const P: usize> Default for PeripheralRegistry<'p, P> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tether_protocol::json;

    struct Probe {
        discriminator: char,
        hits: usize,
    }

    impl Probe {
        fn new(discriminator: char) -> Self {
            Self {
                discriminator,
                hits: 0,
            }
        }
    }

    impl Peripheral for Probe {
        fn discriminator(&self) -> char {
            self.discriminator
        }

        fn decode(&mut self, _cargo: &ObjectView<'_>, _event: &mut ShieldEvent) {
            self.hits += 1;
        }
    }

    #[test]
    fn test_register_until_full() {
        let mut first = Probe::new('A');
        let mut second = Probe::new('B');
        let mut third = Probe::new('C');
        let mut registry: PeripheralRegistry<'_, 2> = PeripheralRegistry::new();
        assert_eq!(registry.register(&mut first), Ok(()));
        assert_eq!(registry.register(&mut second), Ok(()));
        assert_eq!(registry.register(&mut third), Err(RegistryFull));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_first_match_wins() {
        let mut first = Probe::new('T');
        let mut shadow = Probe::new('T');
        let mut registry: PeripheralRegistry<'_, 4> = PeripheralRegistry::new();
        registry.register(&mut first).unwrap();
        registry.register(&mut shadow).unwrap();

        let object = json::parse(b"{'Type':'T'}").unwrap();
        let mut event = ShieldEvent::new();
        let (slot, peripheral) = registry.find_mut('T').expect("match");
        assert_eq!(slot, 0);
        peripheral.decode(&object, &mut event);

        drop(registry);
        assert_eq!(first.hits, 1);
        assert_eq!(shadow.hits, 0);
    }

    #[test]
    fn test_no_match() {
        let mut only = Probe::new('A');
        let mut registry: PeripheralRegistry<'_, 4> = PeripheralRegistry::new();
        registry.register(&mut only).unwrap();
        assert!(registry.find_mut('Z').is_none());
    }
}
