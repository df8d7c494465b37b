pub mod api;
pub mod config;
pub mod error;
pub mod gui;
pub mod live;
pub mod models;
pub mod notify;
pub mod storage;
pub mod websocket;
