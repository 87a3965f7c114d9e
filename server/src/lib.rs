//! Tempo — per-channel slowmode policy and cooldown engine.
//!
//! The engine decides, for each inbound message, whether its author is
//! bound by the channel's slowmode rule (owner/user/role overrides, then
//! permission defaults), tracks per-user cooldowns inside the channel's
//! stored record, and keeps that store consistent with the platform's
//! live server/channel set via sanitization sweeps. The platform gateway
//! and command parsing are external collaborators: they hand the engine
//! snapshots ([`engine::events::GatewayEvent`]) and receive delete
//! instructions ([`engine::events::Action`]) back.

pub mod config;
pub mod db;
pub mod engine;
pub mod error;
