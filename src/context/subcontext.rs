// SPDX-License-Identifier: MIT OR Apache-2.0

//! One level of nested logging.

use crate::error::{Error, Result};

use super::context_impl::Context;

/// Where a [`Subcontext`] is in its one-shot lifecycle.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum SubcontextState {
    /// Created by [`Context::subcontext`], not entered yet.
    Created,
    /// Entered; logging is allowed and the context's depth is raised.
    Active,
    /// Exited; the context's depth has been restored.
    Closed,
}

/// A position one level down the context stack.
///
/// Created by [`Context::subcontext`], which has already logged the
/// subcontext's message.  Entering records the context's depth and raises it
/// by one; exiting puts the recorded depth back.  An active subcontext that is
/// dropped without exiting restores the depth as well.
#[derive(Debug)]
pub struct Subcontext {
    context: Context,
    /// Depth to restore on exit.  `Some` exactly while active.
    log_position: Option<usize>,
    already_entered: bool,
}

impl Subcontext {
    pub(crate) fn new(context: Context) -> Self {
        Subcontext {
            context,
            log_position: None,
            already_entered: false,
        }
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    pub fn state(&self) -> SubcontextState {
        if !self.already_entered {
            SubcontextState::Created
        } else if self.is_active() {
            SubcontextState::Active
        } else {
            SubcontextState::Closed
        }
    }

    pub fn is_active(&self) -> bool {
        self.log_position.is_some()
    }

    /// Raises the context's depth by one.
    ///
    /// Fails if this subcontext has been entered before, even if it has since
    /// been exited.
    pub fn enter(&mut self) -> Result<()> {
        if self.already_entered {
            return Err(Error::Usage("a subcontext may only be entered once"));
        }
        self.activate();
        Ok(())
    }

    fn activate(&mut self) {
        let position = self.context.log_position();
        self.log_position = Some(position);
        self.already_entered = true;
        self.context.set_log_position(position + 1);
    }

    /// Restores the depth recorded by [`enter`](Self::enter).
    pub fn exit(&mut self) -> Result<()> {
        match self.log_position.take() {
            Some(position) => {
                self.context.set_log_position(position);
                Ok(())
            }
            None => Err(Error::Usage(
                "exit must only be called in conjunction with enter",
            )),
        }
    }

    /// Logs `message` inside this subcontext.  Only valid while active.
    pub fn log(&self, message: impl AsRef<str>) -> Result<()> {
        if self.log_position.is_none() {
            return Err(Error::Usage(
                "log must only be called in conjunction with enter",
            ));
        }
        self.context.log(message);
        Ok(())
    }

    /// Enters this subcontext and returns a guard that exits it on drop.
    pub fn entered(mut self) -> Result<SubcontextGuard> {
        self.enter()?;
        Ok(SubcontextGuard { inner: self })
    }

    /// Runs `f` inside this subcontext.
    ///
    /// The depth is restored when `f` returns or unwinds.  Errors `f` produces
    /// are part of `R` and pass through untouched; the outer `Result` only
    /// reports misuse of the subcontext itself.
    pub fn run<R>(self, f: impl FnOnce(&SubcontextGuard) -> R) -> Result<R> {
        let guard = self.entered()?;
        Ok(f(&guard))
    }
}

impl Drop for Subcontext {
    fn drop(&mut self) {
        if let Some(position) = self.log_position.take() {
            self.context.set_log_position(position);
        }
    }
}

/// An entered [`Subcontext`] that exits when dropped.
///
/// Because the guard only exists while the subcontext is active, logging
/// through it can't fail.
#[derive(Debug)]
#[must_use = "the subcontext exits as soon as the guard is dropped"]
pub struct SubcontextGuard {
    inner: Subcontext,
}

impl SubcontextGuard {
    pub(crate) fn activate(mut inner: Subcontext) -> Self {
        inner.activate();
        SubcontextGuard { inner }
    }

    pub fn context(&self) -> &Context {
        &self.inner.context
    }

    pub fn log(&self, message: impl AsRef<str>) {
        self.inner.context.log(message);
    }

    /// Exits now rather than at the end of the enclosing scope.
    pub fn exit(self) {
        drop(self);
    }
}
