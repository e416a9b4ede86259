pub mod runtime;

pub use runtime::{DiscordOutbound, DiscordRuntime};
