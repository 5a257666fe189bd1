//! Everything the bot writes: chat message content and the dialog log.
//!
//! # Submodules
//!
//! - [`messages`]: fixed texts, article formatting (Telegram HTML) and keyboards
//! - [`dialog_log`]: per-user append-only log of inbound and outbound messages
//!
//! # Dialog Log Layout
//!
//! ```text
//! log_dir/
//! ├── 1234567.jsonl   # one DialogEntry per line
//! └── 7654321.jsonl
//! ```

pub mod dialog_log;
pub mod messages;
