//! Real-time change-event distribution

pub mod hub;

pub use hub::EventHub;
