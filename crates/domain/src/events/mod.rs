//! 线上事件定义
//!
//! 客户端入站事件与服务端推送事件。

pub mod client_event;
pub mod server_event;

// 重新导出事件类型
pub use client_event::*;
pub use server_event::*;
