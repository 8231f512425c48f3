pub mod app;
pub mod local;

pub use app::*;
pub use local::*;
