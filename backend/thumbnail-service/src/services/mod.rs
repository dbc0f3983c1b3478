pub mod retry_queue;
pub mod storage;
pub mod thumbnail;
