//! Canonical command frame, argument and reply types.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// One command argument as issued by a client binding or declared by an expectation.
///
/// Key/value pair arguments (`MSET`, `HSET`, ...) are always carried as [`Arg::Map`], whether
/// the caller supplied a mapping or a flattened pair list. The wire protocol flattens both
/// shapes identically, so matchers compare them through [`Arg::canonical`].
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    /// UTF-8 text (also the carrier of regular expressions under pattern matching).
    Str(String),
    /// Binary-safe payload.
    Bytes(Vec<u8>),
    /// Signed integer.
    Int(i64),
    /// Floating point number.
    Float(f64),
    /// Boolean, rendered as `1`/`0` the way clients put it on the wire.
    Bool(bool),
    /// Ordered key/value pairs.
    Map(Vec<(Arg, Arg)>),
}

impl Arg {
    /// Builds a pair argument from any key/value iterator.
    pub fn map<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<Arg>,
        V: Into<Arg>,
    {
        Self::Map(
            pairs
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }

    /// Groups a flattened `key value key value ...` list into pair arguments.
    ///
    /// The first element of the returned list is the [`Arg::Map`]; a trailing unpaired element
    /// is kept as a second positional argument so arity mistakes still show up in matching.
    pub fn pairs_from_flat<I, A>(items: I) -> Vec<Self>
    where
        I: IntoIterator<Item = A>,
        A: Into<Arg>,
    {
        let mut pairs = Vec::new();
        let mut pending_key: Option<Arg> = None;
        for item in items {
            match pending_key.take() {
                Some(key) => pairs.push((key, item.into())),
                None => pending_key = Some(item.into()),
            }
        }
        let mut args = vec![Self::Map(pairs)];
        args.extend(pending_key);
        args
    }

    /// Returns an order-independent form of this argument.
    ///
    /// Map pairs are sorted by rendered key, then rendered value; nested maps are canonicalized
    /// first. All other variants are returned unchanged.
    #[must_use]
    pub fn canonical(&self) -> Self {
        match self {
            Self::Map(pairs) => {
                let mut sorted: Vec<(Arg, Arg)> = pairs
                    .iter()
                    .map(|(key, value)| (key.canonical(), value.canonical()))
                    .collect();
                sorted.sort_by_cached_key(|(key, value)| (key.to_string(), value.to_string()));
                Self::Map(sorted)
            }
            other => other.clone(),
        }
    }

    /// Short variant label used in diagnostics.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Str(_) => "string",
            Self::Bytes(_) => "bytes",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Bool(_) => "bool",
            Self::Map(_) => "map",
        }
    }
}

impl fmt::Display for Arg {
    /// Renders the textual wire form. Maps render as their flattened canonical pair list.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(value) => f.write_str(value),
            Self::Bytes(value) => f.write_str(&String::from_utf8_lossy(value)),
            Self::Int(value) => write!(f, "{value}"),
            Self::Float(value) => write!(f, "{value}"),
            Self::Bool(value) => f.write_str(if *value { "1" } else { "0" }),
            Self::Map(_) => {
                let Self::Map(pairs) = self.canonical() else {
                    return Ok(());
                };
                let mut first = true;
                for (key, value) in pairs {
                    if !first {
                        f.write_str(" ")?;
                    }
                    first = false;
                    write!(f, "{key} {value}")?;
                }
                Ok(())
            }
        }
    }
}

impl From<&str> for Arg {
    fn from(value: &str) -> Self {
        Self::Str(value.to_owned())
    }
}

impl From<String> for Arg {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<&String> for Arg {
    fn from(value: &String) -> Self {
        Self::Str(value.clone())
    }
}

impl From<Vec<u8>> for Arg {
    fn from(value: Vec<u8>) -> Self {
        Self::Bytes(value)
    }
}

impl From<&[u8]> for Arg {
    fn from(value: &[u8]) -> Self {
        Self::Bytes(value.to_vec())
    }
}

impl From<i64> for Arg {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for Arg {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<u32> for Arg {
    fn from(value: u32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<u64> for Arg {
    fn from(value: u64) -> Self {
        i64::try_from(value).map_or_else(|_| Self::Str(value.to_string()), Self::Int)
    }
}

impl From<usize> for Arg {
    fn from(value: usize) -> Self {
        i64::try_from(value).map_or_else(|_| Self::Str(value.to_string()), Self::Int)
    }
}

impl From<f64> for Arg {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for Arg {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl<K, V, S> From<HashMap<K, V, S>> for Arg
where
    K: Into<Arg>,
    V: Into<Arg>,
{
    fn from(value: HashMap<K, V, S>) -> Self {
        Self::map(value)
    }
}

impl<K, V> From<BTreeMap<K, V>> for Arg
where
    K: Into<Arg>,
    V: Into<Arg>,
{
    fn from(value: BTreeMap<K, V>) -> Self {
        Self::map(value)
    }
}

/// Command payload passed from client bindings into the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandFrame {
    /// Command name as issued (bindings use lowercase, e.g. `get`, `multi`).
    pub name: String,
    /// Ordered arguments, not including the command name.
    pub args: Vec<Arg>,
}

impl CommandFrame {
    /// Creates a command frame from a command name and argument list.
    #[must_use]
    pub fn new(name: impl Into<String>, args: Vec<Arg>) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }

    /// Returns whether both frames name the same command, ignoring ASCII case.
    #[must_use]
    pub fn same_command(&self, other: &Self) -> bool {
        self.name.eq_ignore_ascii_case(&other.name)
    }

    /// Full argument vector with the command name in position zero.
    #[must_use]
    pub fn full_args(&self) -> Vec<Arg> {
        let mut args = Vec::with_capacity(self.args.len() + 1);
        args.push(Arg::Str(self.name.clone()));
        args.extend(self.args.iter().cloned());
        args
    }
}

impl fmt::Display for CommandFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Canonical reply payload configured on an expectation.
///
/// The enum is protocol-neutral; typed client results convert from it.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Reply {
    /// `+OK` style status replies.
    SimpleString(String),
    /// Binary-safe bulk payload.
    BulkString(Vec<u8>),
    /// Integer reply.
    Integer(i64),
    /// Double reply.
    Double(f64),
    /// Boolean reply.
    Boolean(bool),
    /// Array reply.
    Array(Vec<Reply>),
    /// Map reply, in declaration order.
    Map(Vec<(Reply, Reply)>),
    /// Null reply.
    #[default]
    Null,
}

impl Reply {
    /// Short variant label used in diagnostics.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SimpleString(_) => "simple string",
            Self::BulkString(_) => "bulk string",
            Self::Integer(_) => "integer",
            Self::Double(_) => "double",
            Self::Boolean(_) => "boolean",
            Self::Array(_) => "array",
            Self::Map(_) => "map",
            Self::Null => "null",
        }
    }

    /// Shorthand for a status reply.
    #[must_use]
    pub fn ok() -> Self {
        Self::SimpleString("OK".to_owned())
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SimpleString(value) => f.write_str(value),
            Self::BulkString(value) => write!(f, "{:?}", String::from_utf8_lossy(value)),
            Self::Integer(value) => write!(f, "(integer) {value}"),
            Self::Double(value) => write!(f, "(double) {value}"),
            Self::Boolean(value) => write!(f, "(boolean) {value}"),
            Self::Array(items) => {
                f.write_str("[")?;
                for (index, item) in items.iter().enumerate() {
                    if index > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Self::Map(pairs) => {
                f.write_str("{")?;
                for (index, (key, value)) in pairs.iter().enumerate() {
                    if index > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key}: {value}")?;
                }
                f.write_str("}")
            }
            Self::Null => f.write_str("(nil)"),
        }
    }
}
