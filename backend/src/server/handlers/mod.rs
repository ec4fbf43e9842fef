pub mod assets;
pub mod chat;
