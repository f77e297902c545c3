pub mod config;
pub mod convert;
pub mod document;
pub mod preview;
