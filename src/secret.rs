// SPDX-License-Identifier: MIT OR Apache-2.0

//! Values that must never reach a log line in clear text.
//!
//! Entity methods render their arguments with [`Debug`] when tracing a call.
//! A [`SecretString`] (or any value wrapped in [`Hidden`]) renders as a fixed
//! mask instead, so passwords and tokens can flow through traced methods.
//!
//! ```rust
//! use automation_entities::secret::{SecretString, SECRET_STRING_DISPLAY};
//!
//! let password = SecretString::from("hunter2");
//! assert_eq!(format!("{password:?}"), SECRET_STRING_DISPLAY);
//! assert_eq!(password, "hunter2");
//! ```

use std::borrow::Borrow;
use std::fmt::{Debug, Display};
use std::ops::Deref;

/// How every secret renders, whatever its content or length.
pub const SECRET_STRING_DISPLAY: &str = "\"**********\"";

/// A string whose `Debug` and `Display` forms are always
/// [`SECRET_STRING_DISPLAY`].
///
/// Everything else behaves like the underlying string.
#[derive(Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SecretString(String);

impl SecretString {
    pub fn new(value: impl Into<String>) -> Self {
        SecretString(value.into())
    }

    /// The clear text.  Keep the result out of log lines.
    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl Debug for SecretString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(SECRET_STRING_DISPLAY)
    }
}

impl Display for SecretString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(SECRET_STRING_DISPLAY)
    }
}

impl Deref for SecretString {
    type Target = str;
    fn deref(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for SecretString {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for SecretString {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<String> for SecretString {
    fn from(value: String) -> Self {
        SecretString(value)
    }
}

impl From<&str> for SecretString {
    fn from(value: &str) -> Self {
        SecretString(value.to_owned())
    }
}

impl PartialEq<str> for SecretString {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for SecretString {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl PartialEq<String> for SecretString {
    fn eq(&self, other: &String) -> bool {
        &self.0 == other
    }
}

impl PartialEq<SecretString> for str {
    fn eq(&self, other: &SecretString) -> bool {
        self == other.0
    }
}

impl PartialEq<SecretString> for &str {
    fn eq(&self, other: &SecretString) -> bool {
        *self == other.0
    }
}

impl PartialEq<SecretString> for String {
    fn eq(&self, other: &SecretString) -> bool {
        *self == other.0
    }
}

/// Masks the `Debug` form of any value.
///
/// This is the per-call way to hide an argument that isn't a secret type,
/// e.g. text typed into a password field.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Hidden<T>(pub T);

impl<T> Debug for Hidden<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(SECRET_STRING_DISPLAY)
    }
}

impl<T> Deref for Hidden<T> {
    type Target = T;
    fn deref(&self) -> &T {
        &self.0
    }
}

/// `Debug` rendering of `value`, or the mask when `hidden` is set.
pub fn render_masked<T: Debug + ?Sized>(value: &T, hidden: bool) -> String {
    if hidden {
        SECRET_STRING_DISPLAY.to_string()
    } else {
        format!("{value:?}")
    }
}
