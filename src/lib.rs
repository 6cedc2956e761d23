//! EcoPark - Parking reservation backend with gamified green rewards
//!
//! This library provides the HTTP API, persistence and services behind the
//! EcoPark server binary.

pub mod api;
pub mod config;
pub mod db;
pub mod models;
pub mod services;
