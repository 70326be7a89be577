//! Address resolution.
//!
//! Turns a requested address into either a navigation [`Target`] or a
//! [`ResolutionOutcome::Redirect`] to its canonical form. A single call never
//! follows a redirect; [`Resolver::resolve_canonical`] does that with an
//! explicit bound and loop detection.

use thiserror::Error;
use tracing::{debug, info};

use crate::codec::{DecodeError, EncodedSegment, decode, encode};
use crate::table::{RouteAction, RouteTable, TargetKind, redirect_default};

// ============================================================================
// Errors
// ============================================================================

/// Resolution failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("no route matches '{address}'")]
    NoMatch { address: String },

    #[error("parameter '{param}' is malformed: {source}")]
    Decode {
        param: &'static str,
        #[source]
        source: DecodeError,
    },

    #[error("redirect loop at '{address}'")]
    RedirectLoop { address: String, chain: Vec<String> },

    #[error("more than {limit} redirects")]
    TooManyRedirects { limit: usize, chain: Vec<String> },

    #[error("route '{route}' did not bind parameter '{param}'")]
    MissingParam {
        route: &'static str,
        param: &'static str,
    },
}

// ============================================================================
// Outcomes
// ============================================================================

/// Decoded route parameters, in template order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Params(Vec<(&'static str, String)>);

impl Params {
    /// Decoded value of a parameter.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.0.iter().map(|(key, value)| (*key, value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A concrete navigation destination.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Target {
    /// Name of the matched route.
    pub route: &'static str,
    pub kind: TargetKind,
    pub params: Params,
}

impl Target {
    /// Decoded parameter, or [`ResolveError::MissingParam`].
    pub fn require(&self, param: &'static str) -> Result<&str, ResolveError> {
        self.params.get(param).ok_or(ResolveError::MissingParam {
            route: self.route,
            param,
        })
    }
}

/// Result of resolving one address.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResolutionOutcome {
    Target(Target),
    /// The address is valid but not canonical; resolve `canonical_address`.
    Redirect { canonical_address: String },
}

/// Result of following redirects to a target.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Resolved {
    pub target: Target,
    /// Address the target was finally reached at.
    pub address: String,
    /// Addresses that redirected, in order.
    pub redirects: Vec<String>,
}

// ============================================================================
// Resolver
// ============================================================================

/// Drop query string and fragment, then split into segments.
///
/// Both `""` and `"/"` yield no segments.
pub fn split_address(address: &str) -> Vec<&str> {
    let path = address
        .split(['?', '#'])
        .next()
        .unwrap_or_default();
    let path = path.strip_prefix('/').unwrap_or(path);
    if path.is_empty() {
        Vec::new()
    } else {
        path.split('/').collect()
    }
}

/// Resolves addresses against a [`RouteTable`].
#[derive(Clone, Copy, Debug)]
pub struct Resolver<'t> {
    table: &'t RouteTable,
}

impl Default for Resolver<'static> {
    fn default() -> Self {
        Self::new(RouteTable::standard_ref())
    }
}

impl<'t> Resolver<'t> {
    pub fn new(table: &'t RouteTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &'t RouteTable {
        self.table
    }

    /// Resolve one address without following redirects.
    pub fn resolve(&self, address: &str) -> Result<ResolutionOutcome, ResolveError> {
        let segments = split_address(address);
        let Some((pattern, captures)) = self.table.first_match(&segments) else {
            return Err(ResolveError::NoMatch {
                address: address.to_string(),
            });
        };

        let mut params = Vec::with_capacity(captures.len());
        for (param, raw) in captures {
            let value = decode(&raw).map_err(|source| ResolveError::Decode { param, source })?;
            params.push((param, value));
        }

        match pattern.action() {
            RouteAction::Target(kind) => {
                debug!(address, route = pattern.name(), "address resolved");
                Ok(ResolutionOutcome::Target(Target {
                    route: pattern.name(),
                    kind: *kind,
                    params: Params(params),
                }))
            }
            RouteAction::Redirect(rule) => {
                let target = self.table.get(rule.target).ok_or(ResolveError::NoMatch {
                    address: address.to_string(),
                })?;

                // Re-encode decoded values so the canonical address has one spelling.
                let mut encoded: Vec<(&str, EncodedSegment)> = params
                    .iter()
                    .map(|(param, value)| (*param, encode(value)))
                    .collect();
                if !encoded.iter().any(|(param, _)| *param == rule.param) {
                    encoded.push((rule.param, redirect_default(rule)));
                }
                let refs: Vec<(&str, &EncodedSegment)> =
                    encoded.iter().map(|(param, value)| (*param, value)).collect();

                let canonical_address = target.href(&refs).ok_or(ResolveError::MissingParam {
                    route: target.name(),
                    param: rule.param,
                })?;
                info!(
                    address,
                    canonical = %canonical_address,
                    route = pattern.name(),
                    "redirecting"
                );
                Ok(ResolutionOutcome::Redirect { canonical_address })
            }
        }
    }

    /// Resolve an address, re-submitting redirects until a target is reached.
    ///
    /// Fails with [`ResolveError::RedirectLoop`] when a redirect points back
    /// at an address already visited, and with
    /// [`ResolveError::TooManyRedirects`] after `max_redirects` hops.
    pub fn resolve_canonical(
        &self,
        address: &str,
        max_redirects: usize,
    ) -> Result<Resolved, ResolveError> {
        let mut current = address.to_string();
        let mut chain: Vec<String> = Vec::new();

        loop {
            match self.resolve(&current)? {
                ResolutionOutcome::Target(target) => {
                    return Ok(Resolved {
                        target,
                        address: current,
                        redirects: chain,
                    });
                }
                ResolutionOutcome::Redirect { canonical_address } => {
                    chain.push(current);
                    if chain.contains(&canonical_address) {
                        return Err(ResolveError::RedirectLoop {
                            address: canonical_address,
                            chain,
                        });
                    }
                    if chain.len() > max_redirects {
                        return Err(ResolveError::TooManyRedirects {
                            limit: max_redirects,
                            chain,
                        });
                    }
                    current = canonical_address;
                }
            }
        }
    }
}

/// Resolve against the standard table.
pub fn resolve(address: &str) -> Result<ResolutionOutcome, ResolveError> {
    Resolver::default().resolve(address)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::DecodeErrorKind;
    use crate::config::params;
    use crate::table::{RedirectRule, RoutePattern, Segment};

    fn target(address: &str) -> Target {
        match resolve(address).unwrap() {
            ResolutionOutcome::Target(target) => target,
            other => panic!("expected target for {address}, got {other:?}"),
        }
    }

    #[test]
    fn test_split_address() {
        assert!(split_address("").is_empty());
        assert!(split_address("/").is_empty());
        assert_eq!(split_address("/login"), vec!["login"]);
        assert_eq!(split_address("/FilesPage/m1/"), vec!["FilesPage", "m1", ""]);
        assert_eq!(split_address("/disk?x=1#top"), vec!["disk"]);
        assert_eq!(split_address("login"), vec!["login"]);
    }

    #[test]
    fn test_static_routes() {
        let root = target("/");
        assert_eq!((root.route, root.kind), ("root", TargetKind::DiskList));
        assert!(root.params.is_empty());
        assert_eq!(target("/login").kind, TargetKind::Auth);
        assert_eq!(target("/login/").kind, TargetKind::Auth);
        assert_eq!(target("/disk").kind, TargetKind::DiskList);
        assert_eq!(target("/loged").kind, TargetKind::Landing);
    }

    #[test]
    fn test_pattern_priority() {
        let t = target("/FilesPage/m1/sub/dir");
        assert_eq!(t.kind, TargetKind::Directory);
        assert_eq!(t.route, "files");
        assert_eq!(t.params.get(params::MOUNT_ID), Some("m1"));
        assert_eq!(t.params.get(params::INTERNAL_PATH), Some("sub/dir"));
    }

    #[test]
    fn test_default_substitution() {
        assert_eq!(
            resolve("/FilesPage/m1").unwrap(),
            ResolutionOutcome::Redirect {
                canonical_address: "/FilesPage/m1/%2F".to_string()
            }
        );
        let t = target("/FilesPage/m1/%2F");
        assert_eq!(t.kind, TargetKind::Directory);
        assert_eq!(t.params.get(params::MOUNT_ID), Some("m1"));
        assert_eq!(t.params.get(params::INTERNAL_PATH), Some("/"));
    }

    #[test]
    fn test_redirect_reencodes_mount() {
        assert_eq!(
            resolve("/FilesPage/a%2fb").unwrap(),
            ResolutionOutcome::Redirect {
                canonical_address: "/FilesPage/a%2Fb/%2F".to_string()
            }
        );
    }

    #[test]
    fn test_canonicalization_idempotent() {
        for address in ["/FilesPage/m1", "/FilesPage/disk%201", "/FilesPage/x/"] {
            if let ResolutionOutcome::Redirect { canonical_address } = resolve(address).unwrap() {
                assert!(matches!(
                    resolve(&canonical_address).unwrap(),
                    ResolutionOutcome::Target(_)
                ));
            }
        }
    }

    #[test]
    fn test_catch_all_emptiness() {
        assert_eq!(
            resolve("/view/m1/").unwrap_err(),
            ResolveError::NoMatch {
                address: "/view/m1/".to_string()
            }
        );
        assert!(matches!(
            resolve("/view/m1").unwrap_err(),
            ResolveError::NoMatch { .. }
        ));
        let dir = target("/FilesPage/m1/");
        assert_eq!(dir.params.get(params::INTERNAL_PATH), Some(""));
    }

    #[test]
    fn test_file_view() {
        let t = target("/view/m1/%2Fhome%2Fuser.txt");
        assert_eq!(t.kind, TargetKind::FileView);
        assert_eq!(t.params.get(params::FILE_PATH), Some("/home/user.txt"));
    }

    #[test]
    fn test_unknown_address() {
        assert_eq!(
            resolve("/nonexistent/path").unwrap_err(),
            ResolveError::NoMatch {
                address: "/nonexistent/path".to_string()
            }
        );
        assert!(resolve("/partitions").is_err());
        assert!(resolve("/filespage/m1/%2F").is_err());
    }

    #[test]
    fn test_parameter_isolation() {
        let t = target("/partitions/disk%2F0");
        assert_eq!(t.kind, TargetKind::Partitions);
        assert_eq!(t.params.get(params::DISK_PATH), Some("disk/0"));
        assert!(resolve("/partitions/disk/0").is_err());
    }

    #[test]
    fn test_decode_error_propagates() {
        let err = resolve("/partitions/disk%2").unwrap_err();
        assert!(matches!(
            err,
            ResolveError::Decode {
                param: params::DISK_PATH,
                source: DecodeError {
                    kind: DecodeErrorKind::InvalidEscape,
                    ..
                }
            }
        ));
        assert!(matches!(
            resolve("/FilesPage/m1/%ZZ").unwrap_err(),
            ResolveError::Decode {
                param: params::INTERNAL_PATH,
                ..
            }
        ));
    }

    #[test]
    fn test_resolve_canonical_follows_redirect() {
        let resolved = Resolver::default()
            .resolve_canonical("/FilesPage/m1", 8)
            .unwrap();
        assert_eq!(resolved.address, "/FilesPage/m1/%2F");
        assert_eq!(resolved.redirects, vec!["/FilesPage/m1".to_string()]);
        assert_eq!(resolved.target.params.get(params::INTERNAL_PATH), Some("/"));

        let direct = Resolver::default().resolve_canonical("/disk", 8).unwrap();
        assert!(direct.redirects.is_empty());
    }

    #[test]
    fn test_resolve_canonical_limit() {
        let err = Resolver::default()
            .resolve_canonical("/FilesPage/m1", 0)
            .unwrap_err();
        assert!(matches!(err, ResolveError::TooManyRedirects { limit: 0, .. }));
    }

    #[test]
    fn test_redirect_loop_detected() {
        // Passes the table checks, but "/a/<x>" redirects to "<y>/<x>" with
        // y = "a", which is the same address again.
        let table = RouteTable::new(vec![
            RoutePattern::new(
                "short",
                vec![Segment::Literal("a"), Segment::Param("x")],
                RouteAction::Redirect(RedirectRule {
                    target: "pair",
                    param: "y",
                    default: "a",
                }),
            ),
            RoutePattern::new(
                "pair",
                vec![Segment::Param("y"), Segment::Param("x")],
                RouteAction::Target(TargetKind::Auth),
            ),
        ])
        .unwrap();
        let resolver = Resolver::new(&table);

        let err = resolver.resolve_canonical("/a/z", 8).unwrap_err();
        assert_eq!(
            err,
            ResolveError::RedirectLoop {
                address: "/a/z".to_string(),
                chain: vec!["/a/z".to_string()],
            }
        );

        let resolved = resolver.resolve_canonical("/b/z", 8).unwrap();
        assert_eq!(resolved.target.params.get("y"), Some("b"));
    }
}
