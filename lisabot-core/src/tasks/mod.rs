pub mod model_refresh;

pub use model_refresh::{run_refresh_cycle, spawn_model_refresh_task, MIN_REFRESH_INTERVAL};
