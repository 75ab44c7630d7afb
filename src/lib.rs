//SPDX-License-Identifier: MIT OR Apache-2.0
/*!
# automation_entities

automation_entities traces automated routines, such as browser scripts or API
smoke tests, so that a failed run can be debugged from its log alone, without
reproducing it.

# The idea

Everything a routine interacts with is an [`Entity`]: a browser session, a
page element, a REST API.  Every interaction with an entity is bracketed in
an indented log:

```text
WebBrowser https://example.com:
    <<< open https://example.com
WebBrowser https://example.com:
    <<< refresh
    >>>
        Title: Example Domain
        Header: Example Domain
```

Indentation comes from the [`Context`], which tracks how deeply nested the
current interaction is.  A [`Subcontext`] is one level of nesting; whatever
happens inside it, including an early return or a panic, the depth is
restored when it ends.

# The API

```rust
use automation_entities::{Context, Entity, InMemoryLogger, NamedEntity, describe};
use std::sync::Arc;

struct Calculator {
    entity: NamedEntity,
}

impl Entity for Calculator {
    fn context(&self) -> &Context { self.entity.context() }
    fn name(&self) -> &str { self.entity.name() }
}

impl Calculator {
    #[describe]
    fn add(&self, a: i32, b: i32) -> i32 {
        self.result(None).run(|r| r.log("carrying the one")).unwrap();
        a + b
    }
}

let logger = Arc::new(InMemoryLogger::new());
let ctx = Context::builder().logger(logger.clone()).build();
let calculator = Calculator { entity: NamedEntity::new(ctx, "Calculator") };

assert_eq!(calculator.add(2, 3), 5);
assert_eq!(
    logger.drain_logs(),
    "Calculator::add(2, 3):\n    >>>\n        carrying the one\n    Return: 5"
);
```

Polling ("wait until the page shows a header") goes through the retry engine
in [`retry`], configuration through the JSON-backed [`Config`], and secrets
are kept out of the log with [`SecretString`].

# Threads

A [`Context`] belongs to one thread.  Nesting depth is plain shared state, so
the type is deliberately not `Send`; each thread builds its own context, or
uses its own [`Context::background`].
*/

pub mod config;
pub mod context;
pub mod describe;
mod entity;
mod error;
mod inmemory_logger;
mod log_record;
mod logger;
pub mod retry;
pub mod secret;
mod stderror_logger;
mod sys;

pub mod browser;
pub mod rest;

pub use config::{Config, ConfigMap, patch_map};
pub use context::{Context, ContextBuilder, Subcontext, SubcontextGuard, SubcontextState};
pub use entity::{Entity, NamedEntity, REQUEST_DELIMITER, RESULT_DELIMITER, SubInteraction};
pub use error::{Error, Result, RetryError};
pub use inmemory_logger::InMemoryLogger;
pub use log_record::LogRecord;
pub use logger::Logger;
pub use retry::{Clock, SystemClock, TryTimeout, try_timeout};
pub use secret::{Hidden, SECRET_STRING_DISPLAY, SecretString};
pub use stderror_logger::StdErrorLogger;

/// Traces every call of an [`Entity`] method.
///
/// The method body runs inside a subcontext labeled
/// `Type::method(<args>):`, where every named parameter is rendered with
/// `Debug`, and the return value is logged as `Return: <value>` before it
/// is handed back.  Long renderings are cut to 100 characters.  See
/// [`describe::describe`] for the non-macro form.
///
/// Parameters whose type doesn't implement `Debug` can't be traced; wrap them
/// in a type that does, or trace the call by hand.
pub use automation_entities_proc::describe;

#[doc(hidden)]
pub mod hidden {
    pub use crate::describe::{Args, describe_call, qualname};
    use crate::context::Context;
    use crate::entity::Entity;

    /// The context an entity method traces into.
    pub fn entity_context<E: Entity + ?Sized>(entity: &E) -> Context {
        entity.context().clone()
    }
}

extern crate self as automation_entities;

pub use sys::{Duration, SystemTime};
