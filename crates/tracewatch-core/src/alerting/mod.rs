//! Alert forwarding to an Alertmanager-compatible webhook receiver

mod notifier;

pub use notifier::Alertmanager;
