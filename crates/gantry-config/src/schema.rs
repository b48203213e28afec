//! Schema framework for decoding config trees.
//!
//! Decoding happens in two passes:
//!
//! 1. [`OptInGate`] - an open-record check that the namespace section carries
//!    `<flag> = "true"`. Anything else in the section is ignored. A failed
//!    gate is not an error; the instance simply did not opt in.
//! 2. [`decode_section`] - a closed-record decode of the whole section into a
//!    typed [`Record`]. Every violation is collected; decoding does not stop
//!    at the first one.
//!
//! # Writing a record
//!
//! Read every field from the [`ObjectDecoder`] *before* applying `?`, so that
//! all fields are checked and marked as known:
//!
//! ```
//! use gantry_config::schema::{ObjectDecoder, Record};
//!
//! struct Hooks {
//!     pre: Option<String>,
//!     post: Option<String>,
//! }
//!
//! impl Record for Hooks {
//!     fn from_object(object: &mut ObjectDecoder<'_>) -> Option<Self> {
//!         let pre = object.optional("pre");
//!         let post = object.optional("post");
//!         Some(Self { pre: pre?, post: post? })
//!     }
//! }
//! ```

use std::num::NonZeroU32;
use std::time::Duration;

use gantry_core::{ConfigNode, ConfigTree, Namespace, FLAG_ON, SEPARATOR};

use crate::error::{DecodeError, Violation, ViolationKind};

/// Collects violations while a tree is being decoded.
#[derive(Debug)]
pub struct DecodeContext {
    path: Vec<String>,
    violations: Vec<Violation>,
}

impl DecodeContext {
    /// Starts a context rooted at `root` (normally the namespace token).
    pub fn new(root: impl Into<String>) -> Self {
        Self {
            path: vec![root.into()],
            violations: Vec::new(),
        }
    }

    /// Dotted path of the node being decoded.
    pub fn path(&self) -> String {
        self.path.join(&SEPARATOR.to_string())
    }

    /// Records a violation at the current path.
    pub fn report(&mut self, kind: ViolationKind) {
        let path = self.path();
        self.violations.push(Violation::new(path, kind));
    }

    /// Runs `decode` one level deeper, under `segment`.
    pub fn nested<T>(&mut self, segment: &str, decode: impl FnOnce(&mut Self) -> T) -> T {
        self.path.push(segment.to_string());
        let value = decode(self);
        self.path.pop();
        value
    }

    /// Whether any violation has been recorded.
    pub fn has_violations(&self) -> bool {
        !self.violations.is_empty()
    }

    /// Turns the decoded value and collected violations into a result.
    pub fn finish<T>(mut self, value: Option<T>) -> Result<T, DecodeError> {
        match value {
            Some(value) if self.violations.is_empty() => Ok(value),
            _ => {
                if self.violations.is_empty() {
                    // A decoder returned nothing without saying why.
                    self.report(ViolationKind::InvalidValue {
                        expected: "a decodable section".to_string(),
                        found: "undecodable input".to_string(),
                    });
                }
                Err(DecodeError::new(self.violations))
            }
        }
    }
}

/// A type that can be decoded from a single tree node.
///
/// Implementations report problems through the context and return `None`
/// whenever they did.
pub trait FromTree: Sized {
    /// Decodes `node`, recording violations in `ctx`.
    fn from_node(node: &ConfigNode, ctx: &mut DecodeContext) -> Option<Self>;
}

/// A closed record: a section whose fields are all declared.
///
/// Keys not read through the [`ObjectDecoder`] (and not
/// [tolerated](ObjectDecoder::tolerate_role)) are reported as unexpected.
pub trait Record: Sized {
    /// Reads the record's fields.
    fn from_object(object: &mut ObjectDecoder<'_>) -> Option<Self>;
}

impl<T: Record> FromTree for T {
    fn from_node(node: &ConfigNode, ctx: &mut DecodeContext) -> Option<Self> {
        match node {
            ConfigNode::Tree(tree) => decode_object(tree, ctx),
            ConfigNode::Value(_) => {
                ctx.report(ViolationKind::WrongShape {
                    expected: "object",
                    found: node.kind(),
                });
                None
            }
        }
    }
}

fn decode_object<T: Record>(tree: &ConfigTree, ctx: &mut DecodeContext) -> Option<T> {
    let mut object = ObjectDecoder::new(tree, ctx);
    let value = T::from_object(&mut object);
    let closed = object.finish();
    value.filter(|_| closed)
}

/// Field access for one section, tracking which keys the schema declares.
#[derive(Debug)]
pub struct ObjectDecoder<'a> {
    tree: &'a ConfigTree,
    ctx: &'a mut DecodeContext,
    known: Vec<&'a str>,
}

impl<'a> ObjectDecoder<'a> {
    fn new(tree: &'a ConfigTree, ctx: &'a mut DecodeContext) -> Self {
        Self {
            tree,
            ctx,
            known: Vec::new(),
        }
    }

    /// A field that must be present.
    pub fn required<T: FromTree>(&mut self, field: &'a str) -> Option<T> {
        self.known.push(field);
        let tree = self.tree;
        match tree.get(field) {
            Some(node) => self.ctx.nested(field, |ctx| T::from_node(node, ctx)),
            None => {
                self.ctx
                    .nested(field, |ctx| ctx.report(ViolationKind::Missing));
                None
            }
        }
    }

    /// A field that may be absent. `Some(None)` means absent, `None` invalid.
    pub fn optional<T: FromTree>(&mut self, field: &'a str) -> Option<Option<T>> {
        self.known.push(field);
        let tree = self.tree;
        match tree.get(field) {
            Some(node) => self
                .ctx
                .nested(field, |ctx| T::from_node(node, ctx))
                .map(Some),
            None => Some(None),
        }
    }

    /// A field that falls back to `default` when absent.
    pub fn optional_or<T: FromTree>(&mut self, field: &'a str, default: T) -> Option<T> {
        self.optional(field).map(|value| value.unwrap_or(default))
    }

    /// A required field whose value must equal `expected` exactly.
    pub fn literal(&mut self, field: &'a str, expected: &str) -> Option<()> {
        let value: String = self.required(field)?;
        if value == expected {
            Some(())
        } else {
            self.ctx.nested(field, |ctx| {
                ctx.report(ViolationKind::InvalidValue {
                    expected: format!("{expected:?}"),
                    found: format!("{value:?}"),
                });
            });
            None
        }
    }

    /// Admits the keys of another role sharing this section.
    ///
    /// The role's `flag` is always admitted. Its other `fields` are admitted
    /// only while `flag` is exactly `"true"`; otherwise they stay unexpected.
    pub fn tolerate_role(&mut self, flag: &'a str, fields: &[&'a str]) {
        self.known.push(flag);
        let opted_in = matches!(self.tree.get(flag), Some(ConfigNode::Value(value)) if value == FLAG_ON);
        if opted_in {
            self.known.extend_from_slice(fields);
        }
    }

    /// Reports undeclared keys. Returns `false` if there were any.
    fn finish(mut self) -> bool {
        let unexpected: Vec<&str> = self
            .tree
            .keys()
            .filter(|key| !self.known.contains(key))
            .collect();
        for key in &unexpected {
            self.ctx
                .nested(key, |ctx| ctx.report(ViolationKind::Unexpected));
        }
        unexpected.is_empty()
    }
}

fn scalar<'n>(node: &'n ConfigNode, ctx: &mut DecodeContext, expected: &'static str) -> Option<&'n str> {
    match node {
        ConfigNode::Value(value) => Some(value.as_str()),
        ConfigNode::Tree(_) => {
            ctx.report(ViolationKind::WrongShape {
                expected,
                found: node.kind(),
            });
            None
        }
    }
}

fn invalid(ctx: &mut DecodeContext, expected: impl Into<String>, found: &str) {
    ctx.report(ViolationKind::InvalidValue {
        expected: expected.into(),
        found: format!("{found:?}"),
    });
}

/// Decodes a scalar that must be one of a fixed set of strings.
///
/// Used by the `FromTree` impls of unit enums.
pub fn decode_choice<T: Copy>(
    node: &ConfigNode,
    ctx: &mut DecodeContext,
    choices: &[(&str, T)],
) -> Option<T> {
    let value = scalar(node, ctx, "string")?;
    let found = choices
        .iter()
        .find(|(name, _)| *name == value)
        .map(|(_, choice)| *choice);
    if found.is_none() {
        let names: Vec<String> = choices.iter().map(|(name, _)| format!("{name:?}")).collect();
        invalid(ctx, format!("one of {}", names.join(", ")), value);
    }
    found
}

impl FromTree for String {
    fn from_node(node: &ConfigNode, ctx: &mut DecodeContext) -> Option<Self> {
        scalar(node, ctx, "string").map(str::to_string)
    }
}

fn parse_decimal(value: &str) -> Option<u64> {
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    value.parse().ok()
}

impl FromTree for u64 {
    fn from_node(node: &ConfigNode, ctx: &mut DecodeContext) -> Option<Self> {
        let value = scalar(node, ctx, "string")?;
        let parsed = parse_decimal(value);
        if parsed.is_none() {
            invalid(ctx, "an unsigned integer", value);
        }
        parsed
    }
}

impl FromTree for u32 {
    fn from_node(node: &ConfigNode, ctx: &mut DecodeContext) -> Option<Self> {
        let value = scalar(node, ctx, "string")?;
        let parsed = parse_decimal(value).and_then(|n| u32::try_from(n).ok());
        if parsed.is_none() {
            invalid(ctx, "an unsigned 32-bit integer", value);
        }
        parsed
    }
}

impl FromTree for NonZeroU32 {
    fn from_node(node: &ConfigNode, ctx: &mut DecodeContext) -> Option<Self> {
        let value = scalar(node, ctx, "string")?;
        let parsed = parse_decimal(value)
            .and_then(|n| u32::try_from(n).ok())
            .and_then(NonZeroU32::new);
        if parsed.is_none() {
            invalid(ctx, "a positive 32-bit integer", value);
        }
        parsed
    }
}

impl FromTree for bool {
    fn from_node(node: &ConfigNode, ctx: &mut DecodeContext) -> Option<Self> {
        decode_choice(node, ctx, &[("true", true), ("false", false)])
    }
}

/// Parses `300`, `300s`, `5m`, `2h` or `1d`.
pub fn parse_duration(value: &str) -> Option<Duration> {
    let (digits, unit) = match value.find(|c: char| !c.is_ascii_digit()) {
        Some(split) => value.split_at(split),
        None => (value, "s"),
    };
    let amount = parse_decimal(digits)?;
    let multiplier = match unit {
        "s" => 1,
        "m" => 60,
        "h" => 60 * 60,
        "d" => 24 * 60 * 60,
        _ => return None,
    };
    amount.checked_mul(multiplier).map(Duration::from_secs)
}

impl FromTree for Duration {
    fn from_node(node: &ConfigNode, ctx: &mut DecodeContext) -> Option<Self> {
        let value = scalar(node, ctx, "string")?;
        let parsed = parse_duration(value);
        if parsed.is_none() {
            invalid(ctx, "a duration such as 300, 30s, 5m, 1h or 1d", value);
        }
        parsed
    }
}

/// Open-record check on the namespace section.
///
/// Passes when `<namespace>.<flag>` is a scalar equal to `"true"`, whatever
/// else the section holds. There is no case folding and no boolean coercion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptInGate {
    flag: &'static str,
}

impl OptInGate {
    /// Gate on `<namespace>.enable`.
    pub const ENABLE: Self = Self {
        flag: gantry_core::ENABLE_FLAG,
    };

    /// Gate on `<namespace>.self`.
    pub const SELF: Self = Self {
        flag: gantry_core::SELF_FLAG,
    };

    /// The flag this gate checks.
    pub fn flag(&self) -> &'static str {
        self.flag
    }

    /// Returns the namespace section if the flag is on.
    pub fn narrow<'t>(&self, namespace: &Namespace, tree: &'t ConfigTree) -> Option<&'t ConfigTree> {
        let section = tree.get(namespace.as_str())?.as_tree()?;
        let flag = section.get(self.flag)?.as_value()?;
        (flag == FLAG_ON).then_some(section)
    }
}

/// Closed-record decode of a namespace section into `T`.
///
/// Violation paths start with the namespace token.
pub fn decode_section<T: Record>(namespace: &Namespace, section: &ConfigTree) -> Result<T, DecodeError> {
    let mut ctx = DecodeContext::new(namespace.as_str());
    let value = decode_object(section, &mut ctx);
    ctx.finish(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gantry_core::tree_from_labels;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Colour {
        Red,
        Blue,
    }

    impl FromTree for Colour {
        fn from_node(node: &ConfigNode, ctx: &mut DecodeContext) -> Option<Self> {
            decode_choice(node, ctx, &[("red", Self::Red), ("blue", Self::Blue)])
        }
    }

    #[derive(Debug, PartialEq)]
    struct Inner {
        size: u64,
    }

    impl Record for Inner {
        fn from_object(object: &mut ObjectDecoder<'_>) -> Option<Self> {
            let size = object.required("size");
            Some(Self { size: size? })
        }
    }

    #[derive(Debug, PartialEq)]
    struct Sample {
        name: String,
        colour: Colour,
        inner: Option<Inner>,
        wait: Duration,
    }

    impl Record for Sample {
        fn from_object(object: &mut ObjectDecoder<'_>) -> Option<Self> {
            let flag = object.literal("enable", "true");
            object.tolerate_role("self", &["self", "every"]);
            let name = object.required("name");
            let colour = object.optional_or("colour", Colour::Red);
            let inner = object.optional("inner");
            let wait = object.optional_or("wait", Duration::from_secs(10));
            flag?;
            Some(Self {
                name: name?,
                colour: colour?,
                inner: inner?,
                wait: wait?,
            })
        }
    }

    fn decode(labels: &[(&str, &str)]) -> Result<Sample, DecodeError> {
        let ns = Namespace::default();
        let tree = tree_from_labels(&ns, labels.iter().copied());
        let section = tree.get("gantry").and_then(ConfigNode::as_tree).cloned().unwrap_or_default();
        decode_section(&ns, &section)
    }

    #[test]
    fn test_decode_valid_record() {
        let sample = decode(&[
            ("gantry.enable", "true"),
            ("gantry.self", "true"),
            ("gantry.name", "web"),
            ("gantry.colour", "blue"),
            ("gantry.inner.size", "42"),
            ("gantry.wait", "5m"),
        ])
        .unwrap();

        assert_eq!(
            sample,
            Sample {
                name: "web".to_string(),
                colour: Colour::Blue,
                inner: Some(Inner { size: 42 }),
                wait: Duration::from_secs(300),
            }
        );
    }

    #[test]
    fn test_defaults_apply_when_absent() {
        let sample = decode(&[("gantry.enable", "true"), ("gantry.name", "web")]).unwrap();
        assert_eq!(sample.colour, Colour::Red);
        assert_eq!(sample.inner, None);
        assert_eq!(sample.wait, Duration::from_secs(10));
    }

    #[test]
    fn test_all_violations_are_reported() {
        let err = decode(&[
            ("gantry.enable", "true"),
            ("gantry.colour", "green"),
            ("gantry.inner.size", "big"),
            ("gantry.inner.extra", "x"),
            ("gantry.wait.unit", "s"),
            ("gantry.typo", "1"),
        ])
        .unwrap_err();

        let paths: Vec<&str> = err.paths().collect();
        assert_eq!(
            paths,
            [
                "gantry.name",
                "gantry.colour",
                "gantry.inner.size",
                "gantry.inner.extra",
                "gantry.wait",
                "gantry.typo",
            ]
        );
        assert_eq!(err.at("gantry.name").unwrap().kind, ViolationKind::Missing);
        assert_eq!(
            err.at("gantry.colour").unwrap().kind,
            ViolationKind::InvalidValue {
                expected: "one of \"red\", \"blue\"".to_string(),
                found: "\"green\"".to_string(),
            }
        );
        assert_eq!(
            err.at("gantry.wait").unwrap().kind,
            ViolationKind::WrongShape {
                expected: "string",
                found: "object",
            }
        );
        assert_eq!(err.at("gantry.typo").unwrap().kind, ViolationKind::Unexpected);
    }

    #[test]
    fn test_role_keys_need_the_role_flag() {
        let sample = decode(&[
            ("gantry.enable", "true"),
            ("gantry.self", "true"),
            ("gantry.name", "web"),
            ("gantry.every", "anything"),
        ])
        .unwrap();
        assert_eq!(sample.name, "web");

        for flag in [None, Some("false"), Some("yes")] {
            let mut labels = vec![
                ("gantry.enable", "true"),
                ("gantry.name", "web"),
                ("gantry.every", "anything"),
            ];
            if let Some(flag) = flag {
                labels.push(("gantry.self", flag));
            }
            let err = decode(&labels).unwrap_err();
            assert_eq!(
                err.violations(),
                [Violation::new("gantry.every", ViolationKind::Unexpected)]
            );
        }
    }

    #[test]
    fn test_section_given_as_scalar() {
        let err = decode(&[
            ("gantry.enable", "true"),
            ("gantry.name", "web"),
            ("gantry.inner", "42"),
        ])
        .unwrap_err();
        assert_eq!(
            err.violations(),
            [Violation::new(
                "gantry.inner",
                ViolationKind::WrongShape {
                    expected: "object",
                    found: "string",
                }
            )]
        );
    }

    #[test]
    fn test_literal_mismatch() {
        let err = decode(&[("gantry.enable", "TRUE"), ("gantry.name", "web")]).unwrap_err();
        assert_eq!(
            err.at("gantry.enable").unwrap().kind,
            ViolationKind::InvalidValue {
                expected: "\"true\"".to_string(),
                found: "\"TRUE\"".to_string(),
            }
        );
    }

    #[test]
    fn test_integer_parsing_is_strict() {
        let mut ctx = DecodeContext::new("gantry");
        assert_eq!(u64::from_node(&ConfigNode::from("17"), &mut ctx), Some(17));
        assert_eq!(u64::from_node(&ConfigNode::from("+17"), &mut ctx), None);
        assert_eq!(u64::from_node(&ConfigNode::from(" 17"), &mut ctx), None);
        assert_eq!(u64::from_node(&ConfigNode::from(""), &mut ctx), None);
        assert_eq!(u32::from_node(&ConfigNode::from("4294967296"), &mut ctx), None);
        assert_eq!(NonZeroU32::from_node(&ConfigNode::from("0"), &mut ctx), None);
        assert!(ctx.has_violations());
    }

    #[test]
    fn test_bool_is_exact() {
        let mut ctx = DecodeContext::new("gantry");
        assert_eq!(bool::from_node(&ConfigNode::from("false"), &mut ctx), Some(false));
        assert_eq!(bool::from_node(&ConfigNode::from("1"), &mut ctx), None);
        assert_eq!(bool::from_node(&ConfigNode::from("True"), &mut ctx), None);
    }

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("300"), Some(Duration::from_secs(300)));
        assert_eq!(parse_duration("30s"), Some(Duration::from_secs(30)));
        assert_eq!(parse_duration("5m"), Some(Duration::from_secs(300)));
        assert_eq!(parse_duration("2h"), Some(Duration::from_secs(7200)));
        assert_eq!(parse_duration("1d"), Some(Duration::from_secs(86_400)));
        assert_eq!(parse_duration("5 m"), None);
        assert_eq!(parse_duration("m"), None);
        assert_eq!(parse_duration("1w"), None);
        assert_eq!(parse_duration(""), None);
    }

    #[test]
    fn test_gate_accepts_only_exact_true() {
        let ns = Namespace::default();
        for (value, expected) in [("true", true), ("TRUE", false), ("1", false), ("", false)] {
            let tree = tree_from_labels(&ns, [("gantry.enable", value), ("gantry.other", "x")]);
            assert_eq!(OptInGate::ENABLE.narrow(&ns, &tree).is_some(), expected, "{value:?}");
        }
    }

    #[test]
    fn test_gate_rejects_missing_or_nested_flag() {
        let ns = Namespace::default();
        let absent = tree_from_labels(&ns, [("gantry.update.policy", "minor")]);
        assert!(OptInGate::ENABLE.narrow(&ns, &absent).is_none());

        let nested = tree_from_labels(&ns, [("gantry.enable.really", "true")]);
        assert!(OptInGate::ENABLE.narrow(&ns, &nested).is_none());

        let empty = ConfigTree::new();
        assert!(OptInGate::SELF.narrow(&ns, &empty).is_none());
    }

    #[test]
    fn test_gate_returns_whole_section() {
        let ns = Namespace::default();
        let tree = tree_from_labels(&ns, [("gantry.self", "true"), ("gantry.interval", "60")]);
        let section = OptInGate::SELF.narrow(&ns, &tree).unwrap();
        assert_eq!(section.len(), 2);
        assert_eq!(OptInGate::SELF.flag(), "self");
    }
}
