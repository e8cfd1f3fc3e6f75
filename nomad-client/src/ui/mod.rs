//! Terminal UI.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                         session.rs                           │
//! │  raw mode ─── EventStream + Msg channel ─── Navigator ─── draw│
//! └──────────────────────────────┬───────────────────────────────┘
//!                                │
//!                                ▼
//! ┌──────────────────────────────────────────────────────────────┐
//! │   page.rs  (rows, filter, input)  ───  viewport.rs (scroll)   │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - `session` - terminal setup and the main event loop
//! - `draw` - renders title, body, status and help rows
//! - `page` / `viewport` - per-page row buffer, selection and scrolling
//! - `components` - the help bar
//! - `events` - key encoding and scroll handling
//! - `layout` - screen split shared by renderer and navigator

pub mod colors;
pub mod components;
pub mod draw;
pub mod events;
pub mod input;
pub mod layout;
pub mod page;
pub mod session;
pub mod viewport;

pub use session::{restore_terminal, run};
