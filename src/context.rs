// SPDX-License-Identifier: MIT OR Apache-2.0

//! Indentation-based logging contexts.
//!
//! A [`Context`] is the common entrypoint for everything an automated routine
//! reports.  It tracks a nesting depth (`log_position`) and emits each log
//! line indented by `depth * indent_width` spaces, so the trace of a failed
//! run reads like an outline of what the routine was doing.
//!
//! # Subcontexts
//!
//! [`Context::subcontext`] logs a message at the current depth and returns an
//! unentered [`Subcontext`].  Entering it increments the depth; exiting
//! restores the depth it saw on entry:
//!
//! ```rust
//! use automation_entities::{Context, InMemoryLogger};
//! use std::sync::Arc;
//!
//! let logger = Arc::new(InMemoryLogger::new());
//! let ctx = Context::builder().logger(logger.clone()).build();
//!
//! let mut sub = ctx.subcontext("sub context");
//! sub.enter().unwrap();
//! sub.log("subcontext message").unwrap();
//! sub.exit().unwrap();
//!
//! assert_eq!(logger.drain_logs(), "sub context\n    subcontext message");
//! assert_eq!(ctx.log_position(), 0);
//! ```
//!
//! A subcontext is one-shot: `Created -> Active -> Closed`.  Entering twice,
//! or logging/exiting outside the active state, is a usage error.
//!
//! # Scoped use
//!
//! Most code never calls `enter`/`exit` by hand.  [`Subcontext::run`] and
//! [`Subcontext::entered`] give a [`SubcontextGuard`] whose drop restores the
//! depth, so the depth is back where it was even when the wrapped code
//! returns early with `?` or panics:
//!
//! ```rust
//! use automation_entities::{Context, InMemoryLogger};
//! use std::sync::Arc;
//!
//! let logger = Arc::new(InMemoryLogger::new());
//! let ctx = Context::builder().logger(logger.clone()).build();
//!
//! let out = ctx.subcontext("outer").run(|outer| {
//!     outer.log("one level down");
//!     ctx.scope("inner").log("two levels down");
//!     42
//! });
//! assert_eq!(out.unwrap(), 42);
//! assert_eq!(
//!     logger.drain_logs(),
//!     "outer\n    one level down\n    inner\n        two levels down"
//! );
//! ```
//!
//! # Threading
//!
//! The depth is plain single-threaded state, so `Context` is neither `Send`
//! nor `Sync`.  Each thread that runs a routine builds its own context, or
//! uses the thread's [`Context::background`] instance.

mod context_impl;
mod subcontext;


pub use context_impl::{Context, ContextBuilder, DEFAULT_INDENT_WIDTH};
pub use subcontext::{Subcontext, SubcontextGuard, SubcontextState};
