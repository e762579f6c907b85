//! Tests for the avatar session and its components.

mod helpers;

mod chat_turns;
mod degradation;
