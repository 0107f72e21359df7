// Adapters layer: concrete implementations for external systems (http, storage, observers).

pub mod http;
pub mod observer;
pub mod storage;
