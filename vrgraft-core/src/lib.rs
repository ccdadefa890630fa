#![warn(clippy::pedantic)]

pub mod canvas;
pub mod capture;
pub mod classifier;
pub mod color;
pub mod config;
pub mod events;
pub mod grabber;
pub mod host;
pub mod id;
pub mod interpreter;
pub mod layers;
pub mod neutralizer;
pub mod session;
pub mod sim;
pub mod surfaces;
pub mod synthesizer;
pub mod util;
pub mod viewpoint;

pub use id::GraftID;
pub use session::Session;
