pub mod bridge;
pub mod bus;
pub mod controller;
pub mod demo;
pub mod error;
pub mod history;
pub mod input;
pub mod logging;
pub mod parser;
pub mod paths;
pub mod protocol;
pub mod registry;
pub mod settings;
pub mod state;
pub mod transcript;
pub mod transport;
