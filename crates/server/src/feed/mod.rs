//! Feed request pipeline: short memo in front of the refresh orchestrator.

pub mod memo;
pub mod service;

pub use memo::FeedMemo;
pub use service::FeedService;
