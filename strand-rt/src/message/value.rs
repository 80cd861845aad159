//! Dynamically typed message tuples.
//!
//! A [`Message`] is an immutable ordered tuple of [`MsgValue`]s. The value
//! space is a closed tagged sum (atoms, scalars, strings, addresses and the
//! built-in system payloads) with an opaque [`MsgValue::Blob`] escape hatch
//! for arbitrary user types. Patterns match on the tuple shape (arity and
//! per-element type tags) and on atom constants in prefix position.
//!
//! Construction goes through [`IntoMessage`], implemented for plain values
//! and for tuples up to five elements, so call sites read naturally:
//!
//! ```rust
//! use strand_rt::message::{atom, IntoMessage, Message};
//!
//! let m = (atom("add"), 2i64, 3i64).into_message();
//! assert_eq!(m.len(), 3);
//! assert_eq!(m.value::<i64>(1), Some(2));
//! ```

// Layer 1: Standard library imports
use std::any::{Any, TypeId};
use std::fmt::{self, Debug, Display};
use std::sync::Arc;

// Layer 2: Third-party crate imports
// (none)

// Layer 3: Internal module imports
use super::system::{DownMsg, ExitMsg, SyncTimeoutMsg};
use crate::actor::Address;

/// Interned constant usable as a matchable message prefix.
///
/// Atoms compare by their textual value, so two `atom("get")` constants
/// created in different modules are equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Atom(&'static str);

impl Atom {
    /// The atom's textual value.
    pub const fn as_str(&self) -> &'static str {
        self.0
    }
}

impl Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}'", self.0)
    }
}

/// Shorthand constructor for [`Atom`].
pub const fn atom(name: &'static str) -> Atom {
    Atom(name)
}

/// One element of a message tuple.
#[derive(Clone)]
pub enum MsgValue {
    /// Matchable constant.
    Atom(Atom),
    /// Boolean.
    Bool(bool),
    /// Signed integer.
    I64(i64),
    /// Unsigned integer.
    U64(u64),
    /// Floating point number.
    F64(f64),
    /// Owned string.
    Str(String),
    /// Actor address.
    Addr(Address),
    /// Exit notification (system payload).
    Exit(ExitMsg),
    /// Down notification (system payload).
    Down(DownMsg),
    /// Sync-request timeout marker (system payload).
    SyncTimeout,
    /// Opaque user payload, matched by its concrete type.
    Blob(Arc<dyn Any + Send + Sync>),
}

impl MsgValue {
    /// Wrap an arbitrary user value as an opaque blob element.
    pub fn blob<T: Any + Send + Sync>(value: T) -> Self {
        Self::Blob(Arc::new(value))
    }

    /// The type tag used for pattern matching.
    pub fn tag(&self) -> TypeTag {
        match self {
            Self::Atom(_) => TypeTag::Atom,
            Self::Bool(_) => TypeTag::Bool,
            Self::I64(_) => TypeTag::I64,
            Self::U64(_) => TypeTag::U64,
            Self::F64(_) => TypeTag::F64,
            Self::Str(_) => TypeTag::Str,
            Self::Addr(_) => TypeTag::Addr,
            Self::Exit(_) => TypeTag::Exit,
            Self::Down(_) => TypeTag::Down,
            Self::SyncTimeout => TypeTag::SyncTimeout,
            Self::Blob(value) => TypeTag::Blob((**value).type_id()),
        }
    }
}

impl Debug for MsgValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Atom(a) => write!(f, "{a}"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::I64(v) => write!(f, "{v}i64"),
            Self::U64(v) => write!(f, "{v}u64"),
            Self::F64(v) => write!(f, "{v}f64"),
            Self::Str(v) => write!(f, "{v:?}"),
            Self::Addr(a) => write!(f, "addr({})", a.id()),
            Self::Exit(m) => write!(f, "exit({})", m.reason),
            Self::Down(m) => write!(f, "down({})", m.reason),
            Self::SyncTimeout => write!(f, "sync_timeout"),
            Self::Blob(_) => write!(f, "<blob>"),
        }
    }
}

impl PartialEq for MsgValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Atom(a), Self::Atom(b)) => a == b,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::I64(a), Self::I64(b)) => a == b,
            (Self::U64(a), Self::U64(b)) => a == b,
            (Self::F64(a), Self::F64(b)) => a == b,
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::Addr(a), Self::Addr(b)) => a == b,
            (Self::Exit(a), Self::Exit(b)) => a == b,
            (Self::Down(a), Self::Down(b)) => a == b,
            (Self::SyncTimeout, Self::SyncTimeout) => true,
            // Blobs compare by identity only.
            (Self::Blob(a), Self::Blob(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// Discriminator for pattern matching, mirroring the [`MsgValue`] variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeTag {
    /// Any atom (value checked separately for prefix constants).
    Atom,
    /// Boolean element.
    Bool,
    /// Signed integer element.
    I64,
    /// Unsigned integer element.
    U64,
    /// Floating point element.
    F64,
    /// String element.
    Str,
    /// Address element.
    Addr,
    /// Exit notification element.
    Exit,
    /// Down notification element.
    Down,
    /// Sync timeout marker element.
    SyncTimeout,
    /// Opaque payload of the given concrete type.
    Blob(TypeId),
}

/// Immutable ordered tuple of dynamically typed values.
///
/// Cloning is cheap (the element slice is shared); mutation is impossible
/// after construction. Whoever holds the containing envelope owns delivery,
/// not the payload bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    values: Arc<[MsgValue]>,
}

impl Message {
    /// The empty tuple, used for unit replies.
    pub fn empty() -> Self {
        Self {
            values: Arc::from(Vec::new()),
        }
    }

    /// Build a message from already-wrapped values.
    pub fn from_values(values: Vec<MsgValue>) -> Self {
        Self {
            values: Arc::from(values),
        }
    }

    /// Number of tuple elements.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the tuple has no elements.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The raw elements.
    pub fn values(&self) -> &[MsgValue] {
        &self.values
    }

    /// Element at `index`, if present.
    pub fn get(&self, index: usize) -> Option<&MsgValue> {
        self.values.get(index)
    }

    /// Typed extraction of the element at `index`.
    ///
    /// ```rust
    /// use strand_rt::message::IntoMessage;
    ///
    /// let m = ("pi", 3.14f64).into_message();
    /// assert_eq!(m.value::<String>(0).as_deref(), Some("pi"));
    /// assert_eq!(m.value::<f64>(1), Some(3.14));
    /// assert_eq!(m.value::<i64>(1), None);
    /// ```
    pub fn value<T: Extract>(&self, index: usize) -> Option<T> {
        self.values.get(index).and_then(T::extract)
    }

    /// Whether the first element is the given atom constant.
    pub fn starts_with(&self, prefix: Atom) -> bool {
        matches!(self.values.first(), Some(MsgValue::Atom(a)) if *a == prefix)
    }
}

/// Conversion of one Rust value into a message tuple element.
pub trait IntoMsgValue {
    /// Wrap `self` as a [`MsgValue`].
    fn into_msg_value(self) -> MsgValue;
}

impl IntoMsgValue for MsgValue {
    fn into_msg_value(self) -> MsgValue {
        self
    }
}

impl IntoMsgValue for Atom {
    fn into_msg_value(self) -> MsgValue {
        MsgValue::Atom(self)
    }
}

impl IntoMsgValue for bool {
    fn into_msg_value(self) -> MsgValue {
        MsgValue::Bool(self)
    }
}

impl IntoMsgValue for i64 {
    fn into_msg_value(self) -> MsgValue {
        MsgValue::I64(self)
    }
}

impl IntoMsgValue for i32 {
    fn into_msg_value(self) -> MsgValue {
        MsgValue::I64(i64::from(self))
    }
}

impl IntoMsgValue for u64 {
    fn into_msg_value(self) -> MsgValue {
        MsgValue::U64(self)
    }
}

impl IntoMsgValue for u32 {
    fn into_msg_value(self) -> MsgValue {
        MsgValue::U64(u64::from(self))
    }
}

impl IntoMsgValue for f64 {
    fn into_msg_value(self) -> MsgValue {
        MsgValue::F64(self)
    }
}

impl IntoMsgValue for &str {
    fn into_msg_value(self) -> MsgValue {
        MsgValue::Str(self.to_owned())
    }
}

impl IntoMsgValue for String {
    fn into_msg_value(self) -> MsgValue {
        MsgValue::Str(self)
    }
}

impl IntoMsgValue for Address {
    fn into_msg_value(self) -> MsgValue {
        MsgValue::Addr(self)
    }
}

impl IntoMsgValue for ExitMsg {
    fn into_msg_value(self) -> MsgValue {
        MsgValue::Exit(self)
    }
}

impl IntoMsgValue for DownMsg {
    fn into_msg_value(self) -> MsgValue {
        MsgValue::Down(self)
    }
}

impl IntoMsgValue for SyncTimeoutMsg {
    fn into_msg_value(self) -> MsgValue {
        MsgValue::SyncTimeout
    }
}

/// Conversion of a Rust value or tuple into a [`Message`].
pub trait IntoMessage {
    /// Build the message tuple.
    fn into_message(self) -> Message;
}

impl IntoMessage for Message {
    fn into_message(self) -> Message {
        self
    }
}

impl IntoMessage for () {
    fn into_message(self) -> Message {
        Message::empty()
    }
}

macro_rules! impl_into_message_leaf {
    ($($ty:ty),* $(,)?) => {
        $(
            impl IntoMessage for $ty {
                fn into_message(self) -> Message {
                    Message::from_values(vec![self.into_msg_value()])
                }
            }
        )*
    };
}

impl_into_message_leaf!(
    Atom,
    bool,
    i64,
    i32,
    u64,
    u32,
    f64,
    &str,
    String,
    Address,
    ExitMsg,
    DownMsg,
    SyncTimeoutMsg,
    MsgValue,
);

macro_rules! impl_into_message_tuple {
    ($($name:ident),+) => {
        impl<$($name: IntoMsgValue),+> IntoMessage for ($($name,)+) {
            fn into_message(self) -> Message {
                #[allow(non_snake_case)]
                let ($($name,)+) = self;
                Message::from_values(vec![$($name.into_msg_value()),+])
            }
        }
    };
}

impl_into_message_tuple!(A);
impl_into_message_tuple!(A, B);
impl_into_message_tuple!(A, B, C);
impl_into_message_tuple!(A, B, C, D);
impl_into_message_tuple!(A, B, C, D, E);

/// Typed extraction of one tuple element, the inverse of [`IntoMsgValue`].
///
/// Implementations exist for the closed value set and for `Arc<T>` to pull
/// user payloads back out of [`MsgValue::Blob`] elements. Extracted types
/// are `'static` because they flow into stored behavior clauses.
pub trait Extract: Sized + 'static {
    /// The tag a pattern must carry to select this type.
    fn type_tag() -> TypeTag;

    /// Extract a value of this type, if the element holds one.
    fn extract(value: &MsgValue) -> Option<Self>;
}

impl Extract for Atom {
    fn type_tag() -> TypeTag {
        TypeTag::Atom
    }

    fn extract(value: &MsgValue) -> Option<Self> {
        match value {
            MsgValue::Atom(a) => Some(*a),
            _ => None,
        }
    }
}

impl Extract for bool {
    fn type_tag() -> TypeTag {
        TypeTag::Bool
    }

    fn extract(value: &MsgValue) -> Option<Self> {
        match value {
            MsgValue::Bool(v) => Some(*v),
            _ => None,
        }
    }
}

impl Extract for i64 {
    fn type_tag() -> TypeTag {
        TypeTag::I64
    }

    fn extract(value: &MsgValue) -> Option<Self> {
        match value {
            MsgValue::I64(v) => Some(*v),
            _ => None,
        }
    }
}

impl Extract for u64 {
    fn type_tag() -> TypeTag {
        TypeTag::U64
    }

    fn extract(value: &MsgValue) -> Option<Self> {
        match value {
            MsgValue::U64(v) => Some(*v),
            _ => None,
        }
    }
}

impl Extract for f64 {
    fn type_tag() -> TypeTag {
        TypeTag::F64
    }

    fn extract(value: &MsgValue) -> Option<Self> {
        match value {
            MsgValue::F64(v) => Some(*v),
            _ => None,
        }
    }
}

impl Extract for String {
    fn type_tag() -> TypeTag {
        TypeTag::Str
    }

    fn extract(value: &MsgValue) -> Option<Self> {
        match value {
            MsgValue::Str(v) => Some(v.clone()),
            _ => None,
        }
    }
}

impl Extract for Address {
    fn type_tag() -> TypeTag {
        TypeTag::Addr
    }

    fn extract(value: &MsgValue) -> Option<Self> {
        match value {
            MsgValue::Addr(a) => Some(a.clone()),
            _ => None,
        }
    }
}

impl Extract for ExitMsg {
    fn type_tag() -> TypeTag {
        TypeTag::Exit
    }

    fn extract(value: &MsgValue) -> Option<Self> {
        match value {
            MsgValue::Exit(m) => Some(m.clone()),
            _ => None,
        }
    }
}

impl Extract for DownMsg {
    fn type_tag() -> TypeTag {
        TypeTag::Down
    }

    fn extract(value: &MsgValue) -> Option<Self> {
        match value {
            MsgValue::Down(m) => Some(m.clone()),
            _ => None,
        }
    }
}

impl Extract for SyncTimeoutMsg {
    fn type_tag() -> TypeTag {
        TypeTag::SyncTimeout
    }

    fn extract(value: &MsgValue) -> Option<Self> {
        match value {
            MsgValue::SyncTimeout => Some(SyncTimeoutMsg),
            _ => None,
        }
    }
}

impl<T: Any + Send + Sync> Extract for Arc<T> {
    fn type_tag() -> TypeTag {
        TypeTag::Blob(TypeId::of::<T>())
    }

    fn extract(value: &MsgValue) -> Option<Self> {
        match value {
            MsgValue::Blob(blob) => Arc::clone(blob).downcast::<T>().ok(),
            _ => None,
        }
    }
}
