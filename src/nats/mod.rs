//! NATS transport collaborator
//!
//! Inbound: audio frame messages and control signals published by client
//! front-ends. Outbound: dispatcher events on a per-client subject. The core
//! never talks to clients directly; everything goes through these subjects.

mod client;
mod messages;

pub use client::{NatsDispatcher, NatsTransport};
pub use messages::{AudioFrameMessage, ControlAction, ControlMessage};
