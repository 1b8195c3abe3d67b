pub mod actors;
pub mod inventory;
pub mod queues;
