// Decorator targets and shape checks shared by every annotation kind

use crate::logging::trace;
use crate::metadata::ClassMetadata;
use crate::{Error, Result};
use std::fmt;

/// The place a decorator is declared on.
///
/// Mirrors the shapes a decorator can observe: the class itself, a plain
/// (non-callable) member, a method, or one parameter position of a method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target<'a> {
    Class,
    Property(&'a str),
    Method(&'a str),
    Parameter { method: &'a str, index: usize },
}

impl fmt::Display for Target<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Class => write!(f, "class"),
            Target::Property(name) => write!(f, "property `{}`", name),
            Target::Method(name) => write!(f, "method `{}`", name),
            Target::Parameter { method, index } => {
                write!(f, "parameter {} of method `{}`", index, method)
            }
        }
    }
}

/// Something that records metadata on a class when declared on a target.
pub trait Decorator {
    /// Label used in diagnostics, e.g. `@Body()`
    fn label(&self) -> String;

    /// Validate the target shape and record metadata.
    fn apply(self, meta: &mut ClassMetadata, target: Target<'_>) -> Result<()>;
}

/// Accept only a parameter position of a declared method.
pub(crate) fn expect_parameter<'a>(
    meta: &ClassMetadata,
    target: Target<'a>,
    label: &str,
) -> Result<(&'a str, usize)> {
    trace!(decorator = label, site = %target, "Checking parameter target");
    match target {
        Target::Parameter { method, index } if meta.has_method(method) => Ok((method, index)),
        _ => Err(Error::declaration(format!(
            "{} must only be declared on a method parameter",
            label
        ))),
    }
}

/// Accept only a declared method.
pub(crate) fn expect_method<'a>(
    meta: &ClassMetadata,
    target: Target<'a>,
    label: &str,
) -> Result<&'a str> {
    trace!(decorator = label, site = %target, "Checking method target");
    match target {
        Target::Method(method) if meta.has_method(method) => Ok(method),
        _ => Err(Error::declaration(format!(
            "{} must only be declared on a class method",
            label
        ))),
    }
}

/// Accept only the class itself.
pub(crate) fn expect_class(target: Target<'_>, label: &str) -> Result<()> {
    match target {
        Target::Class => Ok(()),
        _ => Err(Error::declaration(format!(
            "{} must only be declared on a class",
            label
        ))),
    }
}
