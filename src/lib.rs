pub mod assistant;
pub mod banner;
pub mod config;
pub mod consts;
pub mod engine;
pub mod error;
pub mod events;
pub mod jobs;
pub mod news;
pub mod prompts;
pub mod session;
pub mod spinner;
pub mod tools;
pub mod web;
