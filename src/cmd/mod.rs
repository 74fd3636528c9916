//! CLI command implementations.
//!
//! Each submodule owns one or more related `Commands` variants:
//!
//! | Module    | Commands handled                      |
//! |-----------|---------------------------------------|
//! | `boards`  | `Boards`, `Board`, `Task`, `Column`   |
//! | `webhook` | `Webhook`                             |
//! | `config`  | `Config`                              |

pub mod boards;
pub mod config;
pub mod webhook;

pub use boards::{cmd_board, cmd_boards, cmd_column, cmd_task};
pub use config::cmd_config;
pub use webhook::cmd_webhook;
