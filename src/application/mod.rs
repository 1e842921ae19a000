//! Application layer: Use cases orchestrating domain and ports.

mod screening;

pub use screening::ScreeningService;
