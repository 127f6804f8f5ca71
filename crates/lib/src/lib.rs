//! Unsplash Chatbot for Zoom — relays chatbot commands to a completion API and posts the
//! reply back through the Zoom chat API. Also serves the app's listing pages and handles
//! deauthorization compliance.

pub mod config;
pub mod gateway;
pub mod llm;
pub mod relay;
pub mod zoom;
