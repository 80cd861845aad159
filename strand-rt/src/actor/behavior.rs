//! Behaviors: ordered pattern/handler clauses with an optional timeout.
//!
//! A behavior is what a receive combinator matches incoming envelopes
//! against. Patterns describe a tuple shape (arity plus per-element type
//! tags), optionally pinned to atom constants in prefix position. The first
//! clause whose pattern matches wins; a behavior with a timeout clause
//! bounds how long a dequeue blocks.
//!
//! ```rust,ignore
//! let behavior = Behavior::new()
//!     .on(|ctx: &mut ReceiveContext<'_>, x: i64| ctx.reply(x + 1))
//!     .on_atom(atom("stop"), |ctx| ctx.quit(ExitReason::NORMAL))
//!     .after(Duration::from_millis(100), |_ctx| {});
//! ```

// Layer 1: Standard library imports
use std::fmt;
use std::time::Duration;

// Layer 2: Third-party crate imports
// (none)

// Layer 3: Internal module imports
use super::context::ReceiveContext;
use crate::message::{Atom, Extract, Message, MsgValue, TypeTag};

/// Matcher for one tuple element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Matcher {
    /// Element must carry this type tag.
    Tag(TypeTag),
    /// Element must be exactly this atom constant.
    AtomIs(Atom),
    /// Element may be anything.
    Any,
}

impl Matcher {
    fn matches(&self, value: &MsgValue) -> bool {
        match self {
            Self::Tag(tag) => value.tag() == *tag,
            Self::AtomIs(atom) => matches!(value, MsgValue::Atom(a) if a == atom),
            Self::Any => true,
        }
    }
}

enum PatternKind {
    /// Fixed arity, one matcher per element.
    Shape(Vec<Matcher>),
    /// Matches every message.
    Any,
}

/// Shape predicate over message tuples.
pub struct Pattern {
    kind: PatternKind,
}

impl Pattern {
    /// A pattern matching any message whatsoever.
    pub fn any() -> Self {
        Self {
            kind: PatternKind::Any,
        }
    }

    /// A pattern over an explicit matcher list (arity must equal exactly).
    pub fn shape(matchers: Vec<Matcher>) -> Self {
        Self {
            kind: PatternKind::Shape(matchers),
        }
    }

    /// Whether the message fits this pattern.
    pub fn matches(&self, message: &Message) -> bool {
        match &self.kind {
            PatternKind::Any => true,
            PatternKind::Shape(matchers) => {
                matchers.len() == message.len()
                    && matchers
                        .iter()
                        .zip(message.values())
                        .all(|(matcher, value)| matcher.matches(value))
            }
        }
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            PatternKind::Any => write!(f, "Pattern(any)"),
            PatternKind::Shape(matchers) => write!(f, "Pattern({matchers:?})"),
        }
    }
}

pub(crate) type HandlerFn = Box<dyn FnMut(&mut ReceiveContext<'_>) + Send + 'static>;

struct Clause {
    pattern: Pattern,
    handler: HandlerFn,
}

struct TimeoutClause {
    duration: Duration,
    action: HandlerFn,
}

/// Ordered list of pattern/handler clauses plus an optional timeout.
///
/// Built once, then driven repeatedly by the receive combinators; loops
/// deliberately reuse one behavior instead of rebuilding it per iteration.
#[derive(Default)]
pub struct Behavior {
    clauses: Vec<Clause>,
    timeout: Option<TimeoutClause>,
}

impl Behavior {
    /// An empty behavior; add clauses with the `on*` builders.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a raw clause from an explicit pattern.
    ///
    /// The handler reads the matched message through the context.
    pub fn with<F>(mut self, pattern: Pattern, mut f: F) -> Self
    where
        F: FnMut(&mut ReceiveContext<'_>) + Send + 'static,
    {
        self.clauses.push(Clause {
            pattern,
            handler: Box::new(move |ctx| f(ctx)),
        });
        self
    }

    /// Clause matching a one-element tuple of type `A`.
    pub fn on<A, F>(self, mut f: F) -> Self
    where
        A: Extract,
        F: FnMut(&mut ReceiveContext<'_>, A) + Send + 'static,
    {
        let pattern = Pattern::shape(vec![Matcher::Tag(A::type_tag())]);
        self.with(pattern, move |ctx| {
            if let Some(a) = ctx.message_value::<A>(0) {
                f(ctx, a);
            }
        })
    }

    /// Clause matching a two-element tuple `(A, B)`.
    pub fn on2<A, B, F>(self, mut f: F) -> Self
    where
        A: Extract,
        B: Extract,
        F: FnMut(&mut ReceiveContext<'_>, A, B) + Send + 'static,
    {
        let pattern = Pattern::shape(vec![Matcher::Tag(A::type_tag()), Matcher::Tag(B::type_tag())]);
        self.with(pattern, move |ctx| {
            if let (Some(a), Some(b)) = (ctx.message_value::<A>(0), ctx.message_value::<B>(1)) {
                f(ctx, a, b);
            }
        })
    }

    /// Clause matching a three-element tuple `(A, B, C)`.
    pub fn on3<A, B, C, F>(self, mut f: F) -> Self
    where
        A: Extract,
        B: Extract,
        C: Extract,
        F: FnMut(&mut ReceiveContext<'_>, A, B, C) + Send + 'static,
    {
        let pattern = Pattern::shape(vec![
            Matcher::Tag(A::type_tag()),
            Matcher::Tag(B::type_tag()),
            Matcher::Tag(C::type_tag()),
        ]);
        self.with(pattern, move |ctx| {
            if let (Some(a), Some(b), Some(c)) = (
                ctx.message_value::<A>(0),
                ctx.message_value::<B>(1),
                ctx.message_value::<C>(2),
            ) {
                f(ctx, a, b, c);
            }
        })
    }

    /// Clause matching exactly the one-element tuple `(atom,)`.
    pub fn on_atom<F>(self, atom: Atom, mut f: F) -> Self
    where
        F: FnMut(&mut ReceiveContext<'_>) + Send + 'static,
    {
        let pattern = Pattern::shape(vec![Matcher::AtomIs(atom)]);
        self.with(pattern, move |ctx| f(ctx))
    }

    /// Clause matching `(atom, A)`.
    pub fn on_atom1<A, F>(self, atom: Atom, mut f: F) -> Self
    where
        A: Extract,
        F: FnMut(&mut ReceiveContext<'_>, A) + Send + 'static,
    {
        let pattern = Pattern::shape(vec![Matcher::AtomIs(atom), Matcher::Tag(A::type_tag())]);
        self.with(pattern, move |ctx| {
            if let Some(a) = ctx.message_value::<A>(1) {
                f(ctx, a);
            }
        })
    }

    /// Clause matching `(atom, A, B)`.
    pub fn on_atom2<A, B, F>(self, atom: Atom, mut f: F) -> Self
    where
        A: Extract,
        B: Extract,
        F: FnMut(&mut ReceiveContext<'_>, A, B) + Send + 'static,
    {
        let pattern = Pattern::shape(vec![
            Matcher::AtomIs(atom),
            Matcher::Tag(A::type_tag()),
            Matcher::Tag(B::type_tag()),
        ]);
        self.with(pattern, move |ctx| {
            if let (Some(a), Some(b)) = (ctx.message_value::<A>(1), ctx.message_value::<B>(2)) {
                f(ctx, a, b);
            }
        })
    }

    /// Trailing clause matching every message.
    pub fn catch_all<F>(self, mut f: F) -> Self
    where
        F: FnMut(&mut ReceiveContext<'_>, Message) + Send + 'static,
    {
        self.with(Pattern::any(), move |ctx| {
            if let Some(message) = ctx.message_snapshot() {
                f(ctx, message);
            }
        })
    }

    /// Timeout clause: when no matching envelope arrived within `duration`
    /// since the dequeue started, run `action` instead. The last `after`
    /// call wins.
    pub fn after<F>(mut self, duration: Duration, mut f: F) -> Self
    where
        F: FnMut(&mut ReceiveContext<'_>) + Send + 'static,
    {
        self.timeout = Some(TimeoutClause {
            duration,
            action: Box::new(move |ctx| f(ctx)),
        });
        self
    }

    /// Number of clauses (the timeout clause not included).
    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    /// Whether no clauses have been added.
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Duration of the timeout clause, if one is set.
    pub fn timeout_duration(&self) -> Option<Duration> {
        self.timeout.as_ref().map(|t| t.duration)
    }

    /// Index of the first clause matching the message.
    pub(crate) fn first_match(&self, message: &Message) -> Option<usize> {
        self.clauses
            .iter()
            .position(|clause| clause.pattern.matches(message))
    }

    /// Run the handler of the clause at `index`.
    pub(crate) fn invoke_clause(&mut self, index: usize, ctx: &mut ReceiveContext<'_>) {
        if let Some(clause) = self.clauses.get_mut(index) {
            (clause.handler)(ctx);
        }
    }

    /// Run the timeout action, if any.
    pub(crate) fn invoke_timeout(&mut self, ctx: &mut ReceiveContext<'_>) {
        if let Some(timeout) = self.timeout.as_mut() {
            (timeout.action)(ctx);
        }
    }
}

impl fmt::Debug for Behavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Behavior")
            .field("clauses", &self.clauses.len())
            .field("timeout", &self.timeout_duration())
            .finish()
    }
}
