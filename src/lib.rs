//! Terminal chat client for product-assistant backends.
//!
//! A [`controller::ChatController`] owns the conversation [`session::Session`],
//! posts each message with the full history to the backend's `/chat` endpoint
//! and hands the reply to the [`render::Renderer`], which turns the product
//! list into display-ready links.

pub mod client;
pub mod commands;
pub mod config;
pub mod controller;
pub mod logging;
pub mod render;
pub mod session;
pub mod ui;
