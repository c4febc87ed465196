//! Dispatch on plain (non-carrier) values.
//!
//! Lookup order is fixed: the value's tag discriminant if it has one, then an exact
//! literal key, then its kind (a type name such as `"number"` or `"string"`), then the
//! fallback. A value that matches none of them is a contract violation.

use std::fmt;

use crate::defect::Defect;
use crate::meta::Tag;
use crate::tagged::Tagged;

/// A plain value that can be dispatched by [`match_value`].
pub trait Matchable {
    /// The `_tag` discriminant, when the value carries one.
    fn discriminant(&self) -> Option<&str> {
        None
    }

    /// A type name used for kind-keyed arms.
    fn kind(&self) -> &'static str;
}

macro_rules! impl_matchable {
    ($kind:literal => $($t:ty),+) => {
        $(
            impl Matchable for $t {
                fn kind(&self) -> &'static str {
                    $kind
                }
            }
        )+
    };
}

impl_matchable!("number" => i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64);
impl_matchable!("string" => String, &str, char);
impl_matchable!("boolean" => bool);
impl_matchable!("null" => ());

impl<T: Matchable> Matchable for Option<T> {
    fn discriminant(&self) -> Option<&str> {
        self.as_ref().and_then(|value| value.discriminant())
    }

    fn kind(&self) -> &'static str {
        match self {
            Some(value) => value.kind(),
            None => "null",
        }
    }
}

impl Matchable for Defect {
    fn discriminant(&self) -> Option<&str> {
        Some(self.tag())
    }

    fn kind(&self) -> &'static str {
        "Defect"
    }
}

#[cfg(feature = "serde")]
impl Matchable for serde_json::Value {
    fn discriminant(&self) -> Option<&str> {
        self.as_object()
            .and_then(|object| object.get("_tag"))
            .and_then(serde_json::Value::as_str)
    }

    fn kind(&self) -> &'static str {
        match self {
            serde_json::Value::Null => "null",
            serde_json::Value::Bool(_) => "boolean",
            serde_json::Value::Number(_) => "number",
            serde_json::Value::String(_) => "string",
            serde_json::Value::Array(_) => "array",
            serde_json::Value::Object(_) => "object",
        }
    }
}

type Arm<V, R> = Box<dyn FnOnce(V) -> R>;

/// Arms for a plain-value match.
pub struct Cases<V, R> {
    tags: Vec<(Tag, Arm<V, R>)>,
    literals: Vec<(V, Arm<V, R>)>,
    kinds: Vec<(&'static str, Arm<V, R>)>,
    fallback: Option<Arm<V, R>>,
}

impl<V, R> fmt::Debug for Cases<V, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cases")
            .field("tags", &self.tags.iter().map(|(t, _)| *t).collect::<Vec<_>>())
            .field("literals", &self.literals.len())
            .field("kinds", &self.kinds.iter().map(|(k, _)| *k).collect::<Vec<_>>())
            .field("fallback", &self.fallback.is_some())
            .finish()
    }
}

impl<V, R> Default for Cases<V, R> {
    fn default() -> Self {
        Cases {
            tags: Vec::new(),
            literals: Vec::new(),
            kinds: Vec::new(),
            fallback: None,
        }
    }
}

impl<V: Matchable + PartialEq, R> Cases<V, R> {
    /// No arms yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm for values whose discriminant is `tag`.
    pub fn tag<F>(mut self, tag: Tag, f: F) -> Self
    where
        F: FnOnce(V) -> R + 'static,
    {
        self.tags.push((tag, Box::new(f)));
        self
    }

    /// Arm for values equal to `literal`.
    pub fn literal<F>(mut self, literal: V, f: F) -> Self
    where
        F: FnOnce(V) -> R + 'static,
    {
        self.literals.push((literal, Box::new(f)));
        self
    }

    /// Arm for values whose [`Matchable::kind`] is `kind`.
    pub fn kind<F>(mut self, kind: &'static str, f: F) -> Self
    where
        F: FnOnce(V) -> R + 'static,
    {
        self.kinds.push((kind, Box::new(f)));
        self
    }

    /// Arm for anything else.
    pub fn fallback<F>(mut self, f: F) -> Self
    where
        F: FnOnce(V) -> R + 'static,
    {
        self.fallback = Some(Box::new(f));
        self
    }

    fn select(self, value: &V) -> Option<Arm<V, R>> {
        let Cases {
            tags,
            literals,
            kinds,
            fallback,
        } = self;

        if let Some(discriminant) = value.discriminant() {
            if let Some((_, arm)) = tags.into_iter().find(|(tag, _)| *tag == discriminant) {
                return Some(arm);
            }
        }
        if let Some((_, arm)) = literals.into_iter().find(|(literal, _)| literal == value) {
            return Some(arm);
        }
        let kind = value.kind();
        if let Some((_, arm)) = kinds.into_iter().find(|(k, _)| *k == kind) {
            return Some(arm);
        }
        fallback
    }
}

/// A plain value awaiting its arms. Created by [`match_value`].
#[derive(Debug)]
pub struct ValueMatch<V> {
    value: V,
}

impl<V: Matchable + PartialEq> ValueMatch<V> {
    /// Dispatch the value.
    ///
    /// # Panics
    ///
    /// When no arm matches and there is no fallback.
    pub fn with<R>(self, cases: Cases<V, R>) -> R {
        match cases.select(&self.value) {
            Some(arm) => arm(self.value),
            None => panic!("unhandled match value of kind `{}`", self.value.kind()),
        }
    }
}

/// Begin dispatching a plain value.
///
/// # Example
///
/// ```
/// use confluence::{match_value, Cases};
///
/// let describe = |n: i32| {
///     match_value(n).with(
///         Cases::new()
///             .literal(0, |_| "zero".to_string())
///             .kind("number", |n| format!("number {}", n)),
///     )
/// };
///
/// assert_eq!(describe(0), "zero");
/// assert_eq!(describe(7), "number 7");
/// ```
pub fn match_value<V>(value: V) -> ValueMatch<V> {
    ValueMatch { value }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defect::Cause;

    #[derive(Debug, Clone, PartialEq)]
    enum Shape {
        Circle(f64),
        Square(f64),
    }

    impl Matchable for Shape {
        fn discriminant(&self) -> Option<&str> {
            Some(match self {
                Shape::Circle(_) => "Circle",
                Shape::Square(_) => "Square",
            })
        }

        fn kind(&self) -> &'static str {
            "Shape"
        }
    }

    #[test]
    fn test_tag_first() {
        let out = match_value(Shape::Circle(1.0)).with(
            Cases::new()
                .literal(Shape::Circle(1.0), |_| "literal")
                .tag("Circle", |_| "tag"),
        );
        assert_eq!(out, "tag");
    }

    #[test]
    fn test_literal_before_kind() {
        let out = match_value("yes").with(
            Cases::new()
                .kind("string", |_| "kind")
                .literal("yes", |_| "literal"),
        );
        assert_eq!(out, "literal");
    }

    #[test]
    fn test_kind_before_fallback() {
        let out = match_value(Shape::Square(2.0)).with(
            Cases::new()
                .tag("Circle", |_| 0.0)
                .kind("Shape", |s| match s {
                    Shape::Square(side) => side * side,
                    Shape::Circle(_) => -1.0,
                })
                .fallback(|_| -2.0),
        );
        assert_eq!(out, 4.0);
    }

    #[test]
    fn test_fallback() {
        let out = match_value(true).with(Cases::new().kind("number", |_| 1).fallback(|_| 2));
        assert_eq!(out, 2);
    }

    #[test]
    #[should_panic(expected = "unhandled match value of kind `boolean`")]
    fn test_unhandled_panics() {
        let _ = match_value(false).with(Cases::new().kind("number", |_| 1));
    }

    #[test]
    fn test_option_none_is_null() {
        let out = match_value(None::<i32>).with(
            Cases::new()
                .kind("null", |_| "nothing")
                .kind("number", |_| "something"),
        );
        assert_eq!(out, "nothing");
    }

    #[test]
    fn test_defect_dispatches_by_tag() {
        let defect = Defect::UnknownException {
            cause: Cause::new("boom"),
        };
        let out = match_value(defect).with(
            Cases::new()
                .tag("PromiseRejected", |_| "rejected")
                .tag("UnknownException", |_| "thrown"),
        );
        assert_eq!(out, "thrown");
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_json_object_dispatches_by_tag() {
        use serde_json::json;

        let area = |shape: serde_json::Value| {
            match_value(shape).with(
                Cases::new()
                    .tag("Circle", |v: serde_json::Value| {
                        let r = v["radius"].as_f64().unwrap_or(0.0);
                        format!("circle {}", r * r)
                    })
                    .kind("object", |_| "object".to_string())
                    .fallback(|_| "other".to_string()),
            )
        };

        assert_eq!(area(json!({"_tag": "Circle", "radius": 2.0})), "circle 4");
        assert_eq!(area(json!({"_tag": "Square"})), "object");
        assert_eq!(area(json!({"radius": 1.0})), "object");
        assert_eq!(area(json!([1, 2])), "other");
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_json_scalars_dispatch_by_literal_then_kind() {
        use serde_json::json;

        let describe = |value: serde_json::Value| {
            match_value(value).with(
                Cases::new()
                    .literal(json!(0), |_| "zero")
                    .kind("number", |_| "number")
                    .kind("string", |_| "string")
                    .kind("null", |_| "null"),
            )
        };

        assert_eq!(describe(json!(0)), "zero");
        assert_eq!(describe(json!(3.5)), "number");
        assert_eq!(describe(json!("Circle")), "string");
        assert_eq!(describe(serde_json::Value::Null), "null");
    }
}
