//! Raw heading-path parser.
//!
//! # Responsibility
//! - Tokenize textual paths such as `/a.b:c,d.$`.
//! - Lower tokens into one or more candidate tethers.
//!
//! # Invariants
//! - A leading `/` anchors at the root; the first heading is a direct child.
//! - A relative path starting with a heading yields two candidates, in this
//!   order: a child of the selected node, then a descendant of the root.
//! - Headings are validated with the same rule the stores enforce.

use crate::error::{PathError, PathResult};
use crate::model::node::{is_valid_heading, NodeId};
use crate::store::GraphStore;
use crate::view::{
    abs_root, ancestor, attr, child, desc, parent, selected, Anchor, FetchSet, Link, Tether,
};
use std::fmt::{Display, Formatter};

/// One lexical element of a raw path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Leading `/`.
    Root,
    Heading(String),
    /// `.`: direct child.
    Forward,
    /// `,`: parent, or nearest ancestor when a heading follows.
    Backward,
    /// `:`: descendant search.
    Descend,
    /// `$`: attribute root.
    Attr,
}

impl Display for Token {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Root => f.write_str("/"),
            Self::Heading(heading) => f.write_str(heading),
            Self::Forward => f.write_str("."),
            Self::Backward => f.write_str(","),
            Self::Descend => f.write_str(":"),
            Self::Attr => f.write_str("$"),
        }
    }
}

/// Splits `raw` into tokens.
pub fn tokenize(raw: &str) -> PathResult<Vec<Token>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(PathError::uncategorized("path is empty"));
    }

    let mut tokens = Vec::new();
    let mut heading = String::new();
    for (offset, ch) in trimmed.char_indices() {
        let token = match ch {
            '/' if offset == 0 => Token::Root,
            '.' => Token::Forward,
            ',' => Token::Backward,
            ':' => Token::Descend,
            '$' => Token::Attr,
            _ if is_valid_heading(ch.encode_utf8(&mut [0; 4])) => {
                heading.push(ch);
                continue;
            }
            _ => {
                return Err(PathError::uncategorized("unexpected character in path")
                    .with_breadcrumb("offset", offset)
                    .with_breadcrumb("char", ch));
            }
        };
        if !heading.is_empty() {
            tokens.push(Token::Heading(std::mem::take(&mut heading)));
        }
        tokens.push(token);
    }
    if !heading.is_empty() {
        tokens.push(Token::Heading(heading));
    }
    Ok(tokens)
}

/// Lowers tokens into candidate tethers, most specific first.
pub fn lower(tokens: &[Token]) -> PathResult<Vec<Tether>> {
    let (absolute, rest) = match tokens {
        [Token::Root, rest @ ..] => (true, rest),
        _ => (false, tokens),
    };

    let mut links: Vec<Link> = Vec::new();
    let mut leading = None;
    let mut index = 0;
    match rest.first() {
        Some(Token::Heading(heading)) if absolute => {
            links.push(child().with(heading.as_str()));
            index = 1;
        }
        Some(Token::Heading(heading)) => {
            leading = Some(heading.as_str());
            index = 1;
        }
        Some(Token::Attr) => {
            links.push(attr());
            index = 1;
        }
        _ => {}
    }

    while index < rest.len() {
        let (link, consumed) = match (&rest[index], rest.get(index + 1)) {
            (Token::Forward, Some(Token::Heading(heading))) => (child().with(heading.as_str()), 2),
            (Token::Forward, Some(Token::Attr)) => (attr(), 2),
            (Token::Descend, Some(Token::Heading(heading))) => (desc().with(heading.as_str()), 2),
            (Token::Backward, Some(Token::Heading(heading))) => {
                (ancestor().with(heading.as_str()), 2)
            }
            (Token::Backward, _) => (parent(), 1),
            (token, _) => {
                return Err(PathError::uncategorized("unexpected token in path")
                    .with_breadcrumb("index", index)
                    .with_breadcrumb("token", token));
            }
        };
        links.push(link);
        index += consumed;
    }

    let build = |anchor: Anchor, head: Option<Link>| {
        head.into_iter()
            .chain(links.iter().cloned())
            .fold(Tether::new(anchor), |tether, link| tether | link)
    };
    Ok(match (absolute, leading) {
        (true, _) => vec![build(abs_root(), None)],
        (false, Some(heading)) => vec![
            build(selected(), Some(child().with(heading))),
            build(abs_root(), Some(desc().with(heading))),
        ],
        (false, None) => vec![build(selected(), None)],
    })
}

fn usable_candidates(selected: Option<NodeId>, raw: &str) -> PathResult<Vec<Tether>> {
    let candidates = lower(&tokenize(raw)?)?
        .into_iter()
        .filter(|tether| selected.is_some() || *tether.anchor() != Anchor::Selected)
        .collect::<Vec<_>>();
    if candidates.is_empty() {
        return Err(PathError::not_found("relative path needs a selected node")
            .with_breadcrumb("path", raw));
    }
    Ok(candidates)
}

/// Resolves `raw` against every candidate and returns the union of matches
/// in candidate order. Callers disambiguate multi-match results.
pub fn decide_path(
    store: &dyn GraphStore,
    selected: Option<NodeId>,
    raw: &str,
) -> PathResult<Vec<NodeId>> {
    let mut matches = FetchSet::new();
    for candidate in usable_candidates(selected, raw)? {
        matches.extend(candidate.evaluate_fetch(store, selected)?);
    }
    Ok(matches.into_ids())
}

/// Picks the tether `raw` should be created through: the first usable
/// candidate.
pub fn creation_tether(selected: Option<NodeId>, raw: &str) -> PathResult<Tether> {
    usable_candidates(selected, raw)?
        .into_iter()
        .next()
        .ok_or_else(|| PathError::not_found("path has no candidate").with_breadcrumb("path", raw))
}
