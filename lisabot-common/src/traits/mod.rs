pub mod platform_traits;
pub mod recorder_traits;
