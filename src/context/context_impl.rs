// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core Context implementation.

use crate::config::{Config, ConfigMap};
use crate::error::{Error, Result};
use crate::log_record::LogRecord;
use crate::logger::Logger;
use crate::retry::{Clock, SystemClock, TryTimeout};
use crate::stderror_logger::StdErrorLogger;
use std::cell::{Cell, OnceCell, Ref, RefCell, RefMut};
use std::fmt::Debug;
use std::hash::{Hash, Hasher};
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::Arc;

use super::subcontext::{Subcontext, SubcontextGuard};

/// Number of spaces each nesting level adds in front of a log line.
pub const DEFAULT_INDENT_WIDTH: usize = 4;

pub(crate) struct ContextInner {
    log_position: Cell<usize>,
    indent_width: usize,
    logger: Arc<dyn Logger>,
    clock: Rc<dyn Clock>,
    config: RefCell<Config>,
}

/// The logging context of one automated routine.
///
/// `Context` is a cheap handle: clones share the same depth, logger, clock
/// and configuration, which is how many entities report into one trace.
/// Equality and hashing are by identity, not by state.
///
/// # Examples
///
/// ```rust
/// use automation_entities::{Context, InMemoryLogger};
/// use std::sync::Arc;
///
/// let logger = Arc::new(InMemoryLogger::new());
/// let ctx = Context::builder().logger(logger.clone()).indent_width(2).build();
///
/// let guard = ctx.scope("step 1");
/// guard.log("detail");
/// drop(guard);
///
/// assert_eq!(logger.drain_logs(), "step 1\n  detail");
/// ```
#[derive(Clone)]
pub struct Context {
    pub(crate) inner: Rc<ContextInner>,
}

impl PartialEq for Context {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Context {}

impl Hash for Context {
    fn hash<H: Hasher>(&self, state: &mut H) {
        Rc::as_ptr(&self.inner).hash(state);
    }
}

impl Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("log_position", &self.inner.log_position.get())
            .field("indent_width", &self.inner.indent_width)
            .field("logger", &self.inner.logger)
            .finish_non_exhaustive()
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

thread_local! {
    static BACKGROUND: OnceCell<Context> = const { OnceCell::new() };
}

impl Context {
    /// Creates a context that logs to stderr, sleeps on the system clock and
    /// starts with an empty configuration.
    pub fn new() -> Context {
        ContextBuilder::new().build()
    }

    pub fn builder() -> ContextBuilder {
        ContextBuilder::new()
    }

    /// Returns this thread's default context.
    ///
    /// The context is created on first use with [`Context::new`] and lives as
    /// long as the thread.  It exists for small scripts that don't want to
    /// pass a context around; anything larger should build its own.
    ///
    /// ```rust
    /// use automation_entities::Context;
    ///
    /// assert_eq!(Context::background(), Context::background());
    /// assert_ne!(Context::background(), Context::new());
    /// ```
    pub fn background() -> Context {
        BACKGROUND.with(|once| once.get_or_init(Context::new).clone())
    }

    /// Current nesting depth.
    #[inline]
    pub fn log_position(&self) -> usize {
        self.inner.log_position.get()
    }

    #[inline]
    pub(crate) fn set_log_position(&self, position: usize) {
        self.inner.log_position.set(position);
    }

    #[inline]
    pub fn indent_width(&self) -> usize {
        self.inner.indent_width
    }

    pub fn logger(&self) -> &Arc<dyn Logger> {
        &self.inner.logger
    }

    /// The clock entities sleep on and the retry engine measures with.
    pub fn clock(&self) -> &Rc<dyn Clock> {
        &self.inner.clock
    }

    /// Logs `message` indented by `log_position * indent_width` spaces.
    pub fn log(&self, message: impl AsRef<str>) {
        let mut record = LogRecord::new();
        record.log_owned(" ".repeat(self.log_position() * self.indent_width()));
        record.log(message.as_ref());
        self.inner.logger.finish_log_record(record);
    }

    /// Logs `message` at the current depth and returns an unentered
    /// [`Subcontext`] for the block it introduces.
    pub fn subcontext(&self, message: impl AsRef<str>) -> Subcontext {
        self.log(message);
        Subcontext::new(self.clone())
    }

    /// Logs `message` and enters a new subcontext in one step.
    ///
    /// Equivalent to `subcontext(message).entered()`, which can't fail on a
    /// freshly created subcontext.
    pub fn scope(&self, message: impl AsRef<str>) -> SubcontextGuard {
        self.log(message);
        SubcontextGuard::activate(Subcontext::new(self.clone()))
    }

    /// A [`TryTimeout`] with default policy that measures and sleeps on this
    /// context's clock.
    pub fn try_timeout<'a>(&self) -> TryTimeout<'a> {
        TryTimeout::new().clock(self.inner.clock.clone())
    }

    pub fn config(&self) -> Ref<'_, Config> {
        self.inner.config.borrow()
    }

    /// Mutable access to the configuration.
    ///
    /// Fails while a guard returned by [`config`](Self::config) is alive.
    pub fn config_mut(&self) -> Result<RefMut<'_, Config>> {
        self.inner
            .config
            .try_borrow_mut()
            .map_err(|_| Error::Usage("configuration is borrowed"))
    }

    /// Points the configuration at `filepath`, merging in whatever the file
    /// already holds and writing the merged result back.
    pub fn set_config_file(&self, filepath: impl Into<PathBuf>) -> Result<()> {
        self.config_mut()?.set_filepath(filepath)
    }

    /// Asks the sink to write out anything it has buffered.
    pub fn flush(&self) {
        self.inner.logger.prepare_to_die();
    }
}

/// Builder for [`Context`].
///
/// ```rust
/// use automation_entities::{Context, InMemoryLogger};
/// use serde_json::json;
/// use std::sync::Arc;
///
/// let defaults = json!({"base_url": "https://example.com"});
/// let ctx = Context::builder()
///     .logger(Arc::new(InMemoryLogger::new()))
///     .config_defaults(defaults.as_object().unwrap().clone())
///     .build();
///
/// assert_eq!(ctx.config()["base_url"], "https://example.com");
/// ```
pub struct ContextBuilder {
    logger: Option<Arc<dyn Logger>>,
    clock: Option<Rc<dyn Clock>>,
    indent_width: usize,
    config_defaults: Option<ConfigMap>,
}

impl Default for ContextBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for ContextBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContextBuilder")
            .field("logger", &self.logger)
            .field("indent_width", &self.indent_width)
            .field("config_defaults", &self.config_defaults)
            .finish_non_exhaustive()
    }
}

impl ContextBuilder {
    pub fn new() -> Self {
        Self {
            logger: None,
            clock: None,
            indent_width: DEFAULT_INDENT_WIDTH,
            config_defaults: None,
        }
    }

    pub fn logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn clock(mut self, clock: Rc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn indent_width(mut self, indent_width: usize) -> Self {
        self.indent_width = indent_width;
        self
    }

    pub fn config_defaults(mut self, defaults: ConfigMap) -> Self {
        self.config_defaults = Some(defaults);
        self
    }

    pub fn build(self) -> Context {
        let config = match self.config_defaults {
            Some(defaults) => Config::with_defaults(defaults),
            None => Config::new(),
        };
        Context {
            inner: Rc::new(ContextInner {
                log_position: Cell::new(0),
                indent_width: self.indent_width,
                logger: self
                    .logger
                    .unwrap_or_else(|| Arc::new(StdErrorLogger::new())),
                clock: self.clock.unwrap_or_else(|| Rc::new(SystemClock)),
                config: RefCell::new(config),
            }),
        }
    }
}
