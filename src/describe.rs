// SPDX-License-Identifier: MIT OR Apache-2.0

//! Call tracing for entity methods.
//!
//! [`describe()`] wraps one call: it logs the qualified method name with the
//! rendered arguments, runs the call one level deeper, logs the rendered
//! return value and hands it back.  The [`#[describe]`](macro@crate::describe)
//! attribute generates the same wrapping for a whole method.
//!
//! ```rust
//! use automation_entities::{Context, InMemoryLogger, NamedEntity};
//! use automation_entities::describe::{describe, Args};
//! use std::sync::Arc;
//!
//! let logger = Arc::new(InMemoryLogger::new());
//! let printer = NamedEntity::new(Context::builder().logger(logger.clone()).build(), "Printer");
//!
//! let pages = describe(&printer, "Printer::print", Args::new().arg(&"report").kwarg("copies", &2), || 4);
//! assert_eq!(pages, 4);
//! assert_eq!(logger.drain_logs(), "Printer::print(\"report\", copies=2):\n    Return: 4");
//! ```

use crate::context::Context;
use crate::entity::Entity;
use std::fmt::Debug;

/// Renderings longer than this are truncated.
pub const MAX_RENDER_LEN: usize = 100;

/// Marker appended to truncated renderings.
pub const TRUNCATION_MARKER: &str = "...";

/// Shortens `text` to [`MAX_RENDER_LEN`] characters, replacing the tail with
/// [`TRUNCATION_MARKER`] when it doesn't fit.
pub fn truncate(text: String) -> String {
    if text.chars().count() <= MAX_RENDER_LEN {
        return text;
    }
    let keep = MAX_RENDER_LEN - TRUNCATION_MARKER.len();
    let mut truncated: String = text.chars().take(keep).collect();
    truncated.push_str(TRUNCATION_MARKER);
    truncated
}

/// Rendered arguments of a traced call.
///
/// Positional arguments render as their `Debug` form, keyword arguments as
/// `name=<Debug>`, all joined by `", "`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Args {
    tokens: Vec<String>,
}

impl Args {
    pub fn new() -> Self {
        Args::default()
    }

    pub fn arg<T: Debug + ?Sized>(mut self, value: &T) -> Self {
        self.tokens.push(format!("{value:?}"));
        self
    }

    pub fn kwarg<T: Debug + ?Sized>(mut self, name: &str, value: &T) -> Self {
        self.tokens.push(format!("{name}={value:?}"));
        self
    }

    /// The joined argument list, before truncation.
    pub fn render(&self) -> String {
        self.tokens.join(", ")
    }
}

/// Traces `f` as a call of `qualname` on `entity`.
///
/// Logs `"<qualname>(<args>):"`, runs `f` one level deeper, logs
/// `"Return: <Debug of the value>"` and returns the value.  Both renderings
/// go through [`truncate`].  If `f` unwinds, the depth is restored and no
/// return line is logged.
///
/// ```rust
/// use automation_entities::describe::{Args, describe};
/// use automation_entities::{Context, InMemoryLogger, NamedEntity};
/// use std::sync::Arc;
///
/// let logger = Arc::new(InMemoryLogger::new());
/// let ctx = Context::builder().logger(logger.clone()).build();
/// let api = NamedEntity::new(ctx, "Api");
/// let id = describe(&api, "Api::lookup", Args::new().arg("alice"), || 7);
/// assert_eq!(id, 7);
/// assert_eq!(logger.drain_logs(), "Api::lookup(\"alice\"):\n    Return: 7");
/// ```
///
/// Only entities can be traced:
///
/// ```compile_fail
/// use automation_entities::describe::{Args, describe};
///
/// struct Plain;
/// describe(&Plain, "Plain::lookup", Args::new(), || 7);
/// ```
pub fn describe<E, R, F>(entity: &E, qualname: &str, args: Args, f: F) -> R
where
    E: Entity + ?Sized,
    R: Debug,
    F: FnOnce() -> R,
{
    describe_call(entity.context(), qualname, args.render(), f)
}

#[doc(hidden)]
pub fn describe_call<R: Debug>(
    context: &Context,
    qualname: &str,
    args: String,
    f: impl FnOnce() -> R,
) -> R {
    let guard = context.scope(format!("{qualname}({}):", truncate(args)));
    let ret = f();
    guard.log(format!("Return: {}", truncate(format!("{ret:?}"))));
    ret
}

/// `Type::method` for the type `T`, without module path or generic
/// arguments.
#[doc(hidden)]
pub fn qualname<T: ?Sized>(method: &str) -> String {
    let full = std::any::type_name::<T>();
    let base = match full.find('<') {
        Some(index) => &full[..index],
        None => full,
    };
    let short = base.rsplit("::").next().unwrap_or(base);
    format!("{short}::{method}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::NamedEntity;
    use crate::error::Error;
    use crate::inmemory_logger::InMemoryLogger;
    use std::sync::Arc;

    struct MyEntity {
        inner: NamedEntity,
    }

    impl Entity for MyEntity {
        fn context(&self) -> &Context {
            self.inner.context()
        }

        fn name(&self) -> &str {
            self.inner.name()
        }
    }

    impl MyEntity {
        fn my_func(&self, a: &str, b: &str, c: Option<&str>, d: Option<&str>) -> String {
            let args = match (c, d) {
                (None, None) => Args::new().arg(a).arg(b),
                _ => Args::new()
                    .arg(a)
                    .arg(b)
                    .kwarg("c", &c.unwrap_or("default_c"))
                    .kwarg("d", &d.unwrap_or("default_d")),
            };
            describe(self, "MyEntity::my_func", args, || {
                format!(
                    "{a}, {b}, {}, {}",
                    c.unwrap_or("default_c"),
                    d.unwrap_or("default_d")
                )
            })
        }
    }

    fn entity() -> (MyEntity, Arc<InMemoryLogger>) {
        let logger = Arc::new(InMemoryLogger::new());
        let ctx = Context::builder().logger(logger.clone()).build();
        let inner = NamedEntity::new(ctx, "MyEntityName");
        (MyEntity { inner }, logger)
    }

    #[test]
    fn simple() {
        let (entity, logger) = entity();
        let ret = entity.my_func("a", "b", None, None);
        assert_eq!(ret, "a, b, default_c, default_d");
        assert_eq!(
            logger.lines(),
            vec![
                "MyEntity::my_func(\"a\", \"b\"):",
                "    Return: \"a, b, default_c, default_d\"",
            ]
        );
    }

    #[test]
    fn kwargs() {
        let (entity, logger) = entity();
        entity.my_func("a", "b", Some("cval"), Some("dval"));
        assert_eq!(
            logger.lines(),
            vec![
                "MyEntity::my_func(\"a\", \"b\", c=\"cval\", d=\"dval\"):",
                "    Return: \"a, b, cval, dval\"",
            ]
        );
    }

    #[test]
    fn too_long() {
        let (entity, logger) = entity();
        let a = "a".repeat(60);
        let b = "b".repeat(60);
        entity.my_func(&a, &b, None, None);

        let lines = logger.lines();
        let expected_args = format!("\"{a}\", \"{}...", "b".repeat(32));
        assert_eq!(expected_args.chars().count(), 100);
        assert_eq!(lines[0], format!("MyEntity::my_func({expected_args}):"));
        let expected_ret = format!("\"{a}, {}...", "b".repeat(34));
        assert_eq!(lines[1], format!("    Return: {expected_ret}"));
    }

    #[test]
    fn truncation_law() {
        assert_eq!(truncate(String::new()), "");
        assert_eq!(truncate("x".repeat(100)), "x".repeat(100));
        assert_eq!(truncate("x".repeat(101)), format!("{}...", "x".repeat(97)));
        assert_eq!(truncate("é".repeat(150)).chars().count(), 100);
    }

    #[test]
    fn errors_are_returned_and_logged() {
        let (entity, logger) = entity();
        let ret: Result<u8, Error> = describe(&entity, "MyEntity::fail", Args::new(), || {
            Err(Error::TryAgain)
        });
        assert!(matches!(ret, Err(Error::TryAgain)));
        assert_eq!(logger.drain_logs(), "MyEntity::fail():\n    Return: Err(TryAgain)");
        assert_eq!(entity.context().log_position(), 0);
    }

    #[test]
    fn panics_restore_depth() {
        let (entity, logger) = entity();
        let ret = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            describe(&entity, "MyEntity::explode", Args::new(), || -> () {
                panic!("boom")
            })
        }));
        assert!(ret.is_err());
        assert_eq!(entity.context().log_position(), 0);
        assert_eq!(logger.drain_logs(), "MyEntity::explode():");
    }

    #[test]
    fn nested_calls_indent() {
        let (entity, logger) = entity();
        describe(&entity, "MyEntity::outer", Args::new(), || {
            describe(&entity, "MyEntity::inner", Args::new().arg(&1), || ())
        });
        assert_eq!(
            logger.lines(),
            vec![
                "MyEntity::outer():",
                "    MyEntity::inner(1):",
                "        Return: ()",
                "    Return: ()",
            ]
        );
    }

    #[allow(dead_code)]
    struct Wrapper<T>(T);

    #[test]
    fn qualname_is_short() {
        assert_eq!(qualname::<MyEntity>("my_func"), "MyEntity::my_func");
        assert_eq!(
            qualname::<Wrapper<Vec<MyEntity>>>("unwrap"),
            "Wrapper::unwrap"
        );
    }
}
