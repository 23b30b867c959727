// src/lib.rs

//! Travelog travel diary client library

pub mod api;
pub mod app;
pub mod controllers;
pub mod environment;
pub mod error;
pub mod http;
pub mod models;
pub mod notify;
pub mod resource;
pub mod session;
pub mod storage;
pub mod utils;

pub use app::TravelogApp;
