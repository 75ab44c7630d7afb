// SPDX-License-Identifier: MIT OR Apache-2.0

//! Entities: named things a routine interacts with.
//!
//! Every interaction with an entity is bracketed in the context's log:
//!
//! ```text
//! MyEntity:
//!     <<< what was asked
//!         details of the request
//!     >>> what came back
//!         details of the result
//! ```
//!
//! [`Entity::interaction`] opens the outer block, [`Entity::request`] and
//! [`Entity::result`] open the inner ones.

use crate::context::{Context, Subcontext};
use crate::error::Result;
use crate::sys::Duration;
use std::fmt::Debug;

/// Label prefix of a request block.
pub const REQUEST_DELIMITER: &str = "<<<";

/// Label prefix of a result block.
pub const RESULT_DELIMITER: &str = ">>>";

/// Something that can be interacted with for automation purposes.
///
/// Implementors supply a context and a display name; the provided methods
/// open the trace blocks every interaction is logged in.
///
/// # Examples
///
/// ```rust
/// use automation_entities::{Context, Entity, InMemoryLogger, NamedEntity};
/// use std::sync::Arc;
///
/// let logger = Arc::new(InMemoryLogger::new());
/// let ctx = Context::builder().logger(logger.clone()).build();
/// let printer = NamedEntity::new(ctx, "Printer");
///
/// printer.interaction().run(|_| {
///     printer.request(Some("print page 1")).run(|_| {}).unwrap();
///     printer.result(None).run(|r| r.log("ok")).unwrap();
/// }).unwrap();
///
/// assert_eq!(
///     logger.drain_logs(),
///     "Printer:\n    <<< print page 1\n    >>>\n        ok"
/// );
/// ```
pub trait Entity {
    fn context(&self) -> &Context;

    fn name(&self) -> &str;

    /// Logs `"<name>:"` and returns the subcontext grouping one interaction.
    fn interaction(&self) -> Subcontext {
        self.context().subcontext(format!("{}:", self.name()))
    }

    /// Logs `"<<<"` or `"<<< <message>"` and returns the request block.
    fn request(&self, message: Option<&str>) -> SubInteraction {
        SubInteraction::new(self.context(), self.name(), REQUEST_DELIMITER, message)
    }

    /// Logs `">>>"` or `">>> <message>"` and returns the result block.
    fn result(&self, message: Option<&str>) -> SubInteraction {
        SubInteraction::new(self.context(), self.name(), RESULT_DELIMITER, message)
    }

    /// Blocks for `duration` on the context's clock, logged as an
    /// interaction.
    fn sleep(&self, duration: Duration) -> Result<()> {
        let _interaction = self.interaction().entered()?;
        self.request(Some(format!("sleep {}", duration.as_secs_f64()).as_str()));
        self.context().clock().sleep(duration);
        Ok(())
    }
}

/// The plain entity: a context and a name, nothing else.
///
/// Useful on its own for tracing ad-hoc steps, and as a field in richer
/// entities that compose it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedEntity {
    context: Context,
    name: String,
}

impl NamedEntity {
    pub fn new(context: Context, name: impl Into<String>) -> Self {
        NamedEntity {
            context,
            name: name.into(),
        }
    }
}

impl Entity for NamedEntity {
    fn context(&self) -> &Context {
        &self.context
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// A request or result block of an interaction.
///
/// The label is logged as soon as the block is created; entering it nests
/// subsequent lines beneath the label.  Entering and exiting follow the
/// rules of the wrapped [`Subcontext`].
#[derive(Debug)]
pub struct SubInteraction {
    context: Context,
    entity: String,
    delimiter: &'static str,
    message: Option<String>,
    subcontext: Subcontext,
}

impl SubInteraction {
    pub fn new(
        context: &Context,
        entity: &str,
        delimiter: &'static str,
        message: Option<&str>,
    ) -> Self {
        let label = match message {
            Some(message) if !message.is_empty() => format!("{delimiter} {message}"),
            _ => delimiter.to_string(),
        };
        SubInteraction {
            context: context.clone(),
            entity: entity.to_string(),
            delimiter,
            message: message.map(str::to_string),
            subcontext: context.subcontext(label),
        }
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    /// Name of the entity this block belongs to.
    pub fn entity(&self) -> &str {
        &self.entity
    }

    pub fn delimiter(&self) -> &'static str {
        self.delimiter
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn subcontext(&self) -> &Subcontext {
        &self.subcontext
    }

    pub fn enter(&mut self) -> Result<()> {
        self.subcontext.enter()
    }

    pub fn exit(&mut self) -> Result<()> {
        self.subcontext.exit()
    }

    /// Logs `message` at the context's current depth.
    ///
    /// Unlike [`Subcontext::log`] this works whether or not the block has
    /// been entered.
    pub fn log(&self, message: impl AsRef<str>) {
        self.context.log(message);
    }

    /// Runs `f` inside this block.  The depth is restored even if `f`
    /// unwinds.
    pub fn run<R>(mut self, f: impl FnOnce(&SubInteraction) -> R) -> Result<R> {
        self.enter()?;
        let ret = f(&self);
        self.exit()?;
        Ok(ret)
    }
}

impl Debug for dyn Entity + '_ {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Entity")
            .field("name", &self.name())
            .finish_non_exhaustive()
    }
}
