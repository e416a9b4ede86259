pub mod activity;

pub use activity::{ActivityCounter, EchoOutcome, EchoTracker, PreviousMessage};
