//! 应用层实现。
//!
//! 围绕领域模型的用例：在线目录、消息存储、消息投递和连接会话，
//! 以及对外部适配器（键值存储、连接中心、随机数、时钟、文本渲染）的抽象。

pub mod broadcaster;
pub mod chatbot;
pub mod clock;
pub mod context;
pub mod error;
pub mod heartbeat;
pub mod local_broadcast;
pub mod message_store;
pub mod notifier;
pub mod presence;
pub mod random;
pub mod render;
pub mod session;
pub mod store;

pub use broadcaster::ConnectionHub;
pub use chatbot::{DefaultSentences, Sentences};
pub use clock::{Clock, DisplayClock, FixedClock, SystemClock};
pub use context::{ChatContext, ChatDependencies, ChatSettings};
pub use error::{ApplicationError, StoreError};
pub use heartbeat::spawn_heartbeat;
pub use local_broadcast::LocalConnectionHub;
pub use message_store::MessageStore;
pub use notifier::{Delivery, Notifier, PrivateCopies, SystemMessageOptions};
pub use presence::PresenceDirectory;
pub use random::{random_int, RandomRange, Randomizer, ScriptedRandomizer, ThreadRandomizer};
pub use render::{EscapingRenderer, TextRenderer};
pub use session::{admit, Admission, ChatSession, ConnectionState};
pub use store::{memory::MemoryKeyValueStore, KeyValueStore};
