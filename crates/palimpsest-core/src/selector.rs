//! Mount selectors.
//!
//! Callers address the content mount inside a diagram cell with a selector
//! string written in a small CSS subset:
//!
//! - type selectors (`rect`, `foreignObject`) and the universal selector `*`
//! - class selectors (`.outer`)
//! - id selectors (`#legend`)
//! - attribute selectors (`[data-kind]`, `[data-kind='box']`, `[data-kind="box"]`)
//! - the descendant combinator (whitespace)
//!
//! Selector lists, other combinators and pseudo-classes are rejected with a
//! [`SelectorError`] pointing at the offending position.
//!
//! # Example
//!
//! ```
//! # use palimpsest_core::selector::Selector;
//! let selector = Selector::parse("g.cell rect[data-role='mount']").unwrap();
//! assert_eq!(selector.to_string(), "g.cell rect[data-role='mount']");
//!
//! let err = Selector::parse("g > rect").unwrap_err();
//! assert_eq!(err.offset(), 2);
//! ```

use std::{fmt, str::FromStr};

use thiserror::Error;
use winnow::{
    Parser as _,
    combinator::{alt, delimited, opt, preceded, repeat},
    error::{ContextError, ErrMode},
    token::take_while,
};

use crate::{
    element::ElementLike,
    tree::{DiagramTree, NodeId},
};

type IResult<O> = std::result::Result<O, ErrMode<ContextError>>;

/// Error returned when a selector string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid selector `{selector}` at offset {offset}: {reason}")]
pub struct SelectorError {
    selector: String,
    offset: usize,
    reason: &'static str,
}

impl SelectorError {
    fn new(selector: &str, offset: usize, reason: &'static str) -> Self {
        Self {
            selector: selector.to_string(),
            offset,
            reason,
        }
    }

    /// Returns the selector text that failed to parse.
    pub fn selector(&self) -> &str {
        &self.selector
    }

    /// Returns the byte offset into the selector where parsing stopped.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Returns a short description of what went wrong.
    pub fn reason(&self) -> &'static str {
        self.reason
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Filter {
    Class(String),
    Id(String),
    Attribute { name: String, value: Option<String> },
}

impl Filter {
    fn matches(&self, element: &impl ElementLike) -> bool {
        match self {
            Filter::Class(class) => element.has_class(class),
            Filter::Id(id) => element.attribute("id") == Some(id.as_str()),
            Filter::Attribute { name, value } => match (element.attribute(name), value) {
                (Some(actual), Some(expected)) => actual == expected,
                (Some(_), None) => true,
                (None, _) => false,
            },
        }
    }
}

/// One compound selector: an optional type plus any number of filters.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Compound {
    tag: Option<String>,
    filters: Vec<Filter>,
}

impl Compound {
    fn matches(&self, element: &impl ElementLike) -> bool {
        if self.tag.as_deref().is_some_and(|tag| tag != element.name()) {
            return false;
        }
        self.filters.iter().all(|filter| filter.matches(element))
    }
}

/// A parsed mount selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    source: String,
    compounds: Vec<Compound>,
}

impl Selector {
    /// Parses a selector string.
    ///
    /// # Errors
    ///
    /// Returns [`SelectorError`] if the text is empty or uses syntax outside
    /// the supported subset.
    pub fn parse(source: &str) -> Result<Self, SelectorError> {
        if source.trim().is_empty() {
            return Err(SelectorError::new(source, 0, "selector is empty"));
        }

        let mut input = source;
        let result = selector_body.parse_next(&mut input);
        let offset = source.len() - input.len();

        match result {
            Ok(compounds) if input.is_empty() => Ok(Self {
                source: source.trim().to_string(),
                compounds,
            }),
            Ok(_) => Err(SelectorError::new(source, offset, unexpected_reason(input))),
            Err(_) => Err(SelectorError::new(
                source,
                offset,
                "expected a type, class, id or attribute selector",
            )),
        }
    }

    /// Returns `true` if the node matches this selector, taking the node's
    /// ancestors anywhere in the tree into account.
    pub fn matches(&self, tree: &DiagramTree, id: NodeId) -> bool {
        let Some((last, rest)) = self.compounds.split_last() else {
            return false;
        };
        if !tree.element(id).is_some_and(|element| last.matches(&element)) {
            return false;
        }

        let mut ancestors = tree.ancestors(id);
        'compounds: for compound in rest.iter().rev() {
            for ancestor in ancestors.by_ref() {
                if tree
                    .element(ancestor)
                    .is_some_and(|element| compound.matches(&element))
                {
                    continue 'compounds;
                }
            }
            return false;
        }
        true
    }

    /// Returns the first descendant of `scope`, in document order, matching
    /// this selector.
    pub fn select_first(&self, tree: &DiagramTree, scope: NodeId) -> Option<NodeId> {
        tree.descendants(scope).find(|&id| self.matches(tree, id))
    }

    /// Returns every descendant of `scope` matching this selector, in
    /// document order.
    pub fn select_all(&self, tree: &DiagramTree, scope: NodeId) -> Vec<NodeId> {
        tree.descendants(scope)
            .filter(|&id| self.matches(tree, id))
            .collect()
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl FromStr for Selector {
    type Err = SelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn unexpected_reason(rest: &str) -> &'static str {
    match rest.chars().next() {
        Some(',') => "selector lists are not supported",
        Some('>' | '+' | '~') => "only the descendant combinator is supported",
        Some(':') => "pseudo-classes are not supported",
        Some('[') => "malformed attribute selector",
        Some('.' | '#') => "expected a name",
        _ => "unexpected character",
    }
}

fn ws0(input: &mut &str) -> IResult<()> {
    take_while(0.., |c: char| c.is_whitespace())
        .void()
        .parse_next(input)
}

fn ws1(input: &mut &str) -> IResult<()> {
    take_while(1.., |c: char| c.is_whitespace())
        .void()
        .parse_next(input)
}

fn ident<'s>(input: &mut &'s str) -> IResult<&'s str> {
    take_while(1.., |c: char| c.is_alphanumeric() || c == '-' || c == '_').parse_next(input)
}

fn attribute_name<'s>(input: &mut &'s str) -> IResult<&'s str> {
    take_while(1.., |c: char| {
        c.is_alphanumeric() || c == '-' || c == '_' || c == ':'
    })
    .parse_next(input)
}

fn attribute_value<'s>(input: &mut &'s str) -> IResult<&'s str> {
    alt((
        delimited('\'', take_while(0.., |c: char| c != '\''), '\''),
        delimited('"', take_while(0.., |c: char| c != '"'), '"'),
        ident,
    ))
    .parse_next(input)
}

fn attribute_filter(input: &mut &str) -> IResult<Filter> {
    delimited(
        ('[', ws0),
        (
            attribute_name,
            ws0,
            opt(preceded(('=', ws0), attribute_value)),
            ws0,
        ),
        ']',
    )
    .map(|(name, (), value, ())| Filter::Attribute {
        name: name.to_string(),
        value: value.map(str::to_string),
    })
    .parse_next(input)
}

fn filter(input: &mut &str) -> IResult<Filter> {
    alt((
        preceded('.', ident).map(|class: &str| Filter::Class(class.to_string())),
        preceded('#', ident).map(|id: &str| Filter::Id(id.to_string())),
        attribute_filter,
    ))
    .parse_next(input)
}

fn compound(input: &mut &str) -> IResult<Compound> {
    let tag: Option<Option<&str>> = opt(alt((ident.map(Some), '*'.value(None)))).parse_next(input)?;
    let filters: Vec<Filter> = repeat(0.., filter).parse_next(input)?;

    if tag.is_none() && filters.is_empty() {
        return Err(ErrMode::Backtrack(ContextError::new()));
    }

    Ok(Compound {
        tag: tag.flatten().map(str::to_string),
        filters,
    })
}

fn selector_body(input: &mut &str) -> IResult<Vec<Compound>> {
    ws0(input)?;
    let first = compound(input)?;
    let rest: Vec<Compound> = repeat(0.., preceded(ws1, compound)).parse_next(input)?;
    ws0(input)?;

    let mut compounds = Vec::with_capacity(rest.len() + 1);
    compounds.push(first);
    compounds.extend(rest);
    Ok(compounds)
}
