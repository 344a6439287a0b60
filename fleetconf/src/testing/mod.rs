//! Hand-rolled fakes and fixtures for exercising the engine without a
//! network. Used by the crate's own tests and usable by downstream test
//! suites.

pub mod fixtures;
mod mocks;

pub use mocks::{DeviceScript, FakeTransport};
