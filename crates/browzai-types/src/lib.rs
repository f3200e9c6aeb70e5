pub mod context;
pub mod conversation;
pub mod message;

pub use context::{ContextError, RequestContext, User};
pub use conversation::{title_from_prompt, Conversation, ConversationWithMessages};
pub use message::{
    Message, MessageId, Role, TransientId, TRANSIENT_ASSISTANT_PREFIX, TRANSIENT_USER_PREFIX,
};
