pub mod audit;
pub mod engine;
pub mod storage;
pub mod stores;
