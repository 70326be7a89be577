//! Route pattern table.
//!
//! An ordered list of address templates. Resolution walks the list top to
//! bottom and the first structural match wins, so a pattern that accepts a
//! superset of a later pattern's addresses would hide it. [`RouteTable::new`]
//! rejects such tables up front.

use std::collections::HashSet;
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::codec::{EncodedSegment, encode};
use crate::config::{
    DISK_SEGMENT, FILES_SEGMENT, LANDING_SEGMENT, LOGIN_SEGMENT, PARTITIONS_SEGMENT,
    ROOT_INTERNAL_PATH, VIEW_SEGMENT, params, routes,
};

// ============================================================================
// Pattern Types
// ============================================================================

/// One position in a route template.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Segment {
    /// Must equal the address segment exactly.
    Literal(&'static str),
    /// Captures exactly one non-empty segment.
    Param(&'static str),
    /// Captures every remaining segment, joined with `/`.
    ///
    /// The separator before the tail must be present. With `allow_empty`
    /// the tail itself may be the empty string.
    CatchAll {
        name: &'static str,
        allow_empty: bool,
    },
}

impl Segment {
    fn is_catch_all(&self) -> bool {
        matches!(self, Self::CatchAll { .. })
    }

    fn param_name(&self) -> Option<&'static str> {
        match self {
            Self::Literal(_) => None,
            Self::Param(name) | Self::CatchAll { name, .. } => Some(*name),
        }
    }
}

/// Semantic destination of a matched address.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetKind {
    DiskList,
    Auth,
    Landing,
    Partitions,
    Directory,
    FileView,
}

/// Rewrites an under-specified address onto another route by supplying a
/// default for the parameter it is missing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RedirectRule {
    /// Name of the route the canonical address belongs to.
    pub target: &'static str,
    /// Parameter filled in with `default`.
    pub param: &'static str,
    /// Raw (unencoded) default value.
    pub default: &'static str,
}

/// What a route does once matched.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RouteAction {
    Target(TargetKind),
    Redirect(RedirectRule),
}

/// A raw, still-encoded parameter captured by a structural match.
pub type Capture = (&'static str, String);

/// A named address template bound to an action.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RoutePattern {
    name: &'static str,
    segments: Vec<Segment>,
    action: RouteAction,
}

impl RoutePattern {
    pub fn new(name: &'static str, segments: Vec<Segment>, action: RouteAction) -> Self {
        Self {
            name,
            segments,
            action,
        }
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    #[inline]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    #[inline]
    pub fn action(&self) -> &RouteAction {
        &self.action
    }

    fn has_catch_all(&self) -> bool {
        self.segments.iter().any(Segment::is_catch_all)
    }

    fn binds(&self, param: &str) -> bool {
        self.segments.iter().any(|s| s.param_name() == Some(param))
    }

    /// Structurally match split address segments.
    ///
    /// Returns the captured parameters, still encoded. Patterns without a
    /// catch-all accept one trailing empty segment (`/login/`).
    pub fn captures(&self, segments: &[&str]) -> Option<Vec<Capture>> {
        let segments = match segments.split_last() {
            Some((&"", rest))
                if !self.has_catch_all() && rest.len() == self.segments.len() =>
            {
                rest
            }
            _ => segments,
        };

        let mut captures = Vec::new();
        for (i, pattern) in self.segments.iter().enumerate() {
            match pattern {
                Segment::Literal(literal) => {
                    if segments.get(i)? != literal {
                        return None;
                    }
                }
                Segment::Param(name) => {
                    let value = segments.get(i)?;
                    if value.is_empty() {
                        return None;
                    }
                    captures.push((*name, value.to_string()));
                }
                Segment::CatchAll { name, allow_empty } => {
                    if i >= segments.len() {
                        return None;
                    }
                    let tail = segments[i..].join("/");
                    if tail.is_empty() && !allow_empty {
                        return None;
                    }
                    captures.push((*name, tail));
                    return Some(captures);
                }
            }
        }

        (segments.len() == self.segments.len()).then_some(captures)
    }

    /// Build an address for this route from encoded parameter values.
    ///
    /// Returns `None` if a parameter the template needs is missing.
    pub fn href(&self, params: &[(&str, &EncodedSegment)]) -> Option<String> {
        let lookup = |name: &str| {
            params
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| value.as_str())
        };

        let mut parts = Vec::with_capacity(self.segments.len());
        for segment in &self.segments {
            match segment {
                Segment::Literal(literal) => parts.push(*literal),
                Segment::Param(name) => {
                    let value = lookup(name)?;
                    if value.is_empty() {
                        return None;
                    }
                    parts.push(value);
                }
                Segment::CatchAll { name, allow_empty } => {
                    let value = lookup(name)?;
                    if value.is_empty() && !allow_empty {
                        return None;
                    }
                    parts.push(value);
                }
            }
        }
        Some(format!("/{}", parts.join("/")))
    }
}

// ============================================================================
// Shadowing
// ============================================================================

/// True when every address matched by `later` is also matched by `earlier`.
fn subsumes(earlier: &[Segment], later: &[Segment]) -> bool {
    match (earlier.split_first(), later.split_first()) {
        (None, None) => true,
        (None, Some(_)) | (Some(_), None) => false,
        (Some((Segment::CatchAll { allow_empty, .. }, _)), Some(_)) => {
            *allow_empty || tail_never_empty(later)
        }
        (Some((Segment::Literal(a), rest_a)), Some((Segment::Literal(b), rest_b))) => {
            a == b && subsumes(rest_a, rest_b)
        }
        (Some((Segment::Param(_), rest_a)), Some((Segment::Literal(b), rest_b))) => {
            !b.is_empty() && subsumes(rest_a, rest_b)
        }
        (Some((Segment::Param(_), rest_a)), Some((Segment::Param(_), rest_b))) => {
            subsumes(rest_a, rest_b)
        }
        _ => false,
    }
}

fn tail_never_empty(tail: &[Segment]) -> bool {
    if tail.len() > 1 {
        return true;
    }
    match tail.first() {
        Some(Segment::Literal(literal)) => !literal.is_empty(),
        Some(Segment::Param(_)) => true,
        Some(Segment::CatchAll { allow_empty, .. }) => !allow_empty,
        None => false,
    }
}

// ============================================================================
// RouteTable
// ============================================================================

/// Route table construction errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TableError {
    #[error("route name '{0}' is used more than once")]
    DuplicateName(&'static str),

    #[error("route '{0}' has a catch-all before its last segment")]
    CatchAllNotLast(&'static str),

    #[error("route '{later}' can never match: '{earlier}' accepts every address it does")]
    Shadowed {
        earlier: &'static str,
        later: &'static str,
    },

    #[error("redirect on route '{route}' points at '{target}', which is not a target route binding the parameter")]
    InvalidRedirect {
        route: &'static str,
        target: &'static str,
    },
}

/// Ordered, validated list of route patterns.
#[derive(Clone, Debug)]
pub struct RouteTable {
    patterns: Vec<RoutePattern>,
}

static STANDARD: LazyLock<RouteTable> = LazyLock::new(RouteTable::standard);

impl RouteTable {
    /// Build a table, checking names, catch-all placement, redirect targets
    /// and specific-before-general ordering.
    pub fn new(patterns: Vec<RoutePattern>) -> Result<Self, TableError> {
        let mut names = HashSet::new();
        for pattern in &patterns {
            if !names.insert(pattern.name) {
                return Err(TableError::DuplicateName(pattern.name));
            }
            if let Some(pos) = pattern.segments.iter().position(Segment::is_catch_all)
                && pos + 1 != pattern.segments.len()
            {
                return Err(TableError::CatchAllNotLast(pattern.name));
            }
        }

        for (i, earlier) in patterns.iter().enumerate() {
            for later in &patterns[i + 1..] {
                if subsumes(&earlier.segments, &later.segments) {
                    return Err(TableError::Shadowed {
                        earlier: earlier.name,
                        later: later.name,
                    });
                }
            }
        }

        let table = Self { patterns };
        for pattern in &table.patterns {
            if let RouteAction::Redirect(rule) = &pattern.action {
                let valid = table.get(rule.target).is_some_and(|target| {
                    matches!(target.action, RouteAction::Target(_)) && target.binds(rule.param)
                });
                if !valid {
                    return Err(TableError::InvalidRedirect {
                        route: pattern.name,
                        target: rule.target,
                    });
                }
            }
        }

        Ok(table)
    }

    /// The application's route table.
    pub fn standard() -> Self {
        use RouteAction::Target;
        use Segment::{CatchAll, Literal, Param};

        let patterns = vec![
            RoutePattern::new(routes::ROOT, vec![], Target(TargetKind::DiskList)),
            RoutePattern::new(
                routes::LOGIN,
                vec![Literal(LOGIN_SEGMENT)],
                Target(TargetKind::Auth),
            ),
            RoutePattern::new(
                routes::DISK,
                vec![Literal(DISK_SEGMENT)],
                Target(TargetKind::DiskList),
            ),
            RoutePattern::new(
                routes::LANDING,
                vec![Literal(LANDING_SEGMENT)],
                Target(TargetKind::Landing),
            ),
            RoutePattern::new(
                routes::PARTITIONS,
                vec![Literal(PARTITIONS_SEGMENT), Param(params::DISK_PATH)],
                Target(TargetKind::Partitions),
            ),
            RoutePattern::new(
                routes::FILES,
                vec![
                    Literal(FILES_SEGMENT),
                    Param(params::MOUNT_ID),
                    CatchAll {
                        name: params::INTERNAL_PATH,
                        allow_empty: true,
                    },
                ],
                Target(TargetKind::Directory),
            ),
            RoutePattern::new(
                routes::VIEW,
                vec![
                    Literal(VIEW_SEGMENT),
                    Param(params::MOUNT_ID),
                    CatchAll {
                        name: params::FILE_PATH,
                        allow_empty: false,
                    },
                ],
                Target(TargetKind::FileView),
            ),
            RoutePattern::new(
                routes::FILES_BARE,
                vec![Literal(FILES_SEGMENT), Param(params::MOUNT_ID)],
                RouteAction::Redirect(RedirectRule {
                    target: routes::FILES,
                    param: params::INTERNAL_PATH,
                    default: ROOT_INTERNAL_PATH,
                }),
            ),
        ];

        Self { patterns }
    }

    /// Shared instance of [`RouteTable::standard`].
    pub fn standard_ref() -> &'static Self {
        &STANDARD
    }

    /// Look up a route by name.
    pub fn get(&self, name: &str) -> Option<&RoutePattern> {
        self.patterns.iter().find(|p| p.name == name)
    }

    /// Routes in evaluation order.
    pub fn iter(&self) -> impl Iterator<Item = &RoutePattern> {
        self.patterns.iter()
    }

    /// First route that structurally matches, with its captures.
    pub fn first_match(&self, segments: &[&str]) -> Option<(&RoutePattern, Vec<Capture>)> {
        self.patterns
            .iter()
            .find_map(|p| p.captures(segments).map(|caps| (p, caps)))
    }
}

/// Encoded default value for a redirect rule.
pub(crate) fn redirect_default(rule: &RedirectRule) -> EncodedSegment {
    encode(rule.default)
}

// ============================================================================
// Tests
// ============================================================================
