pub mod codec;
pub mod websocket;
