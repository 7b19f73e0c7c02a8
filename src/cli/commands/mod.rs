pub mod export;
pub mod hebrew;
pub mod import;
pub mod yahrzeit;
