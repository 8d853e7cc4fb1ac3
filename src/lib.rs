//! celebration-bot - A daily notifier for birthdays and other roster events.
//!
//! The bot reads a roster (Google Sheets or CSV), finds the people whose
//! events fall on today's date, renders a poster for each of them and sends
//! it through Telegram, personally and/or to a group chat.

pub mod config;
pub mod error;
pub mod event;
pub mod logging;
pub mod messenger;
pub mod notifier;
pub mod poster;
pub mod roster;
