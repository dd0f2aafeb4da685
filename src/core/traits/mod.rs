pub mod audit;
pub mod engine;
pub mod session;
pub mod storage;
pub mod stores;
