pub mod config;
pub mod descriptor;
pub mod error;
pub mod gateway;
pub mod interpreter;
pub mod local_store;
pub mod notifications;
pub mod persistence;
pub mod response;
pub mod selection;
pub mod store;
pub mod url;

pub use descriptor::*;
pub use error::*;
pub use selection::*;
pub use store::*;
