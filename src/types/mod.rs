pub mod async_await;
pub mod base;
