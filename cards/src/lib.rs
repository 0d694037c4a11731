pub mod errors;
pub mod gist;
pub mod pin;
pub mod render;
pub mod stats;
pub mod top_langs;
pub mod wakatime;

mod common;

#[cfg(test)]
mod testutils;

pub use errors::CardError;
pub use gist::GistCard;
pub use pin::PinCard;
pub use stats::StatsCard;
pub use top_langs::TopLangsCard;
pub use wakatime::WakaTimeCard;
