//! Reusable dashboard widgets

mod status_card;

pub use status_card::{CardStatus, StatusCard};
