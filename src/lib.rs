pub mod app;
pub mod config;
pub mod download;
pub mod error;
pub mod fs_util;
pub mod output;
