//! Board-agnostic protocol engine for the Tether companion link
//!
//! This crate contains everything between the transport traits and the
//! application:
//!
//! - The [`Tether`] engine: polling, frame dispatch, request correlation
//! - The [`Peripheral`] capability and its bounded registry
//! - The [`EventSink`] lifecycle/observer callbacks
//! - Driver configuration
//!
//! Everything is synchronous and cooperative: the engine mutates its
//! state only inside the caller's `poll`/`send` calls, so it needs no
//! locks and can be constructed fresh per test case.

#![no_std]
#![deny(unsafe_code)]

pub mod config;
pub mod driver;
pub mod handler;
pub mod peripheral;

pub use config::DriverConfig;
pub use driver::{Tether, RESULT_ANY};
pub use handler::EventSink;
pub use peripheral::{Peripheral, PeripheralRegistry, RegistryFull, MAX_PERIPHERALS};
