mod client;
mod message;

pub use client::{ChatClient, ChatModel};
pub use message::{Message, Role};
