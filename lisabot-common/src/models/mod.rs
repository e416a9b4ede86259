pub mod corpus;
pub mod emoji;
pub mod message;
