pub mod checker;
pub mod events;
pub mod member;
pub mod permissions;
pub mod platform;
pub mod slowmode;
pub mod slowmode_engine;
pub mod subject;
pub mod sweeper;
