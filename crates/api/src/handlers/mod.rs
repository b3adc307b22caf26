pub mod audit;
pub mod automation;
pub mod event;
pub mod review_queue;
pub mod template;
