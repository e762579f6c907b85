pub mod avatar;
pub mod interview;
pub mod providers;

// Re-export commonly used types for convenience
pub use avatar::{
    AvatarCallbacks, AvatarError, AvatarHandle, AvatarResult, AvatarSession, AvatarSessionConfig,
    SessionDependencies, SessionStatus,
};
pub use interview::{ChatContext, build_chat_messages};
