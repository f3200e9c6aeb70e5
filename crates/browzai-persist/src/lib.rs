pub mod dbs;
pub mod error;
pub mod memory;
pub mod store;

pub use error::{Result, StoreError};
pub use memory::InMemoryConversationStore;
pub use store::ConversationStore;

#[cfg(feature = "mongodb")]
pub use dbs::mongo::MongoConversationStore;
