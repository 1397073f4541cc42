pub mod config;
pub mod logging;

pub mod archiver;
pub mod fetch;
pub mod model;
pub mod reaper;
pub mod storage;
pub mod store;
pub mod url_model;
pub mod validate;
