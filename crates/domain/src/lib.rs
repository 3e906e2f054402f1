//! 聊天室核心领域模型
//!
//! 包含身份、消息、线上事件与掷骰规则，不依赖任何 I/O。

pub mod dice;
pub mod entities;
pub mod errors;
pub mod events;
pub mod value_objects;

// 重新导出常用类型
pub use dice::DiceSpec;
pub use entities::*;
pub use errors::*;
pub use events::*;
pub use value_objects::*;
