//! Ordered storyboard collections with debounced autosave.
//!
//! A storyboard is an ordered list of frames; a project keeps an ordered list
//! of shots and a kanban board of tasks. Editing happens against a local
//! buffer that renders immediately, while writes to the REST backend are
//! debounced per item and flushed when the user leaves the page.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`collection`] | Local buffer, per-item debounced saves, optimistic reorder |
//! | [`item`] | Frame and shot records, partial update patches |
//! | [`order`] | Dense-order maintenance (move, insert, remove) |
//! | [`remote`] | Persistence trait and its HTTP implementation |
//! | [`sketch`] | Drawing-surface seam and a stroke-based implementation |
//! | [`media`] | Background image upload validation |
//! | [`tasks`] | Project kanban board |
//! | [`session`] | One open project; flush-on-leave |
//! | [`config`] | Environment-driven configuration |
//! | [`error`] | Shared error-code trait |

pub mod collection;
pub mod config;
pub mod error;
pub mod item;
pub mod media;
pub mod order;
pub mod remote;
pub mod session;
pub mod sketch;
pub mod tasks;
