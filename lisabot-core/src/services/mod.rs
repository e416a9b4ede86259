pub mod activation;
pub mod composer;
pub mod dispatcher;
pub mod mention_service;
pub mod message_service;
pub mod trigger_service;

pub use activation::ActivationGate;
pub use composer::{resolve_emojis, OutboundAction, ResponseComposer};
pub use dispatcher::MessageDispatcher;
pub use mention_service::{Addressing, LikertResponder, MentionDetector};
pub use message_service::MessagePipeline;
pub use trigger_service::{Trigger, TriggerTable};
