pub mod config;
pub mod logging;

pub mod catalog;
pub mod context;
pub mod control;
pub mod ledger;
pub mod model;
pub mod probe;
pub mod progress;
pub mod scheduler;
pub mod selection;
pub mod session;
pub mod storage;
pub mod transfer;
pub mod url_model;
