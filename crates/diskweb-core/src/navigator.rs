//! Navigation state.
//!
//! The [`Navigator`] is the single owner of "where the user is". It resolves
//! requested addresses (following redirects up to a bound), applies the
//! authentication gate, and keeps a browser-style back/forward history.
//! A failed navigation never changes the current screen.
//!
//! ```text
//! Unauthenticated ─sign_in─▶ Authenticated(DiskList)
//!                                 │
//!                                 ▼
//!                       Authenticated(Partitions[disk])
//!                                 │
//!                                 ▼
//!                  Authenticated(Directory[mount, path]) ◀─▶ Authenticated(FileView[mount, path])
//! ```

use std::mem;

use thiserror::Error;
use tracing::{debug, warn};

use crate::address::{MountId, StorageAddress, join_path};
use crate::codec::encode;
use crate::config::{LANDING_SEGMENT, LOGIN_SEGMENT, MAX_REDIRECTS, params, routes};
use crate::resolver::{ResolveError, Resolver, Target};
use crate::table::{RouteTable, TargetKind};

// ============================================================================
// Screen
// ============================================================================

/// What the application shows for a resolved target.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Screen {
    /// Credential entry.
    Login,
    /// Post-login landing page.
    Landing,
    /// A position in the storage hierarchy.
    Storage(StorageAddress),
}

impl Screen {
    /// Canonical address of this screen.
    pub fn to_address(&self) -> String {
        match self {
            Self::Login => format!("/{}", LOGIN_SEGMENT),
            Self::Landing => format!("/{}", LANDING_SEGMENT),
            Self::Storage(address) => address.to_address(),
        }
    }

    /// Only the login screen is reachable without a session.
    #[inline]
    pub fn requires_auth(&self) -> bool {
        !matches!(self, Self::Login)
    }

    pub fn storage(&self) -> Option<&StorageAddress> {
        match self {
            Self::Storage(address) => Some(address),
            _ => None,
        }
    }
}

impl TryFrom<&Target> for Screen {
    type Error = ResolveError;

    fn try_from(target: &Target) -> Result<Self, Self::Error> {
        Ok(match target.kind {
            TargetKind::Auth => Self::Login,
            TargetKind::Landing => Self::Landing,
            TargetKind::DiskList if target.route == routes::ROOT => {
                Self::Storage(StorageAddress::Root)
            }
            TargetKind::DiskList => Self::Storage(StorageAddress::Disk { selected: None }),
            TargetKind::Partitions => {
                Self::Storage(StorageAddress::partitions(target.require(params::DISK_PATH)?))
            }
            TargetKind::Directory => Self::Storage(StorageAddress::directory(
                target.require(params::MOUNT_ID)?,
                target.require(params::INTERNAL_PATH)?,
            )),
            TargetKind::FileView => Self::Storage(StorageAddress::file(
                target.require(params::MOUNT_ID)?,
                target.require(params::FILE_PATH)?,
            )),
        })
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Navigation failures. The current screen is left as it was.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NavigationError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error("sign in to open '{address}'")]
    AuthRequired { address: String },

    #[error("already at the top")]
    NoParent,

    #[error("no {0} history")]
    HistoryEmpty(&'static str),

    #[error("'{operation}' is not available on this screen")]
    InvalidContext { operation: &'static str },

    #[error("invalid entry name '{0}'")]
    InvalidName(String),
}

// ============================================================================
// Navigator
// ============================================================================

/// Authentication-derived view of the navigator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NavState<'a> {
    Unauthenticated,
    Authenticated(&'a Screen),
}

/// A completed navigation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Navigation {
    pub screen: Screen,
    /// Canonical address of `screen`.
    pub address: String,
    /// True when `address` differs from the requested address, either by a
    /// redirect or by re-encoding.
    pub redirected: bool,
}

impl Navigation {
    fn to(screen: &Screen) -> Self {
        Self {
            address: screen.to_address(),
            screen: screen.clone(),
            redirected: false,
        }
    }
}

/// Owner of the current screen and navigation history.
#[derive(Clone, Debug)]
pub struct Navigator {
    table: &'static RouteTable,
    current: Screen,
    authenticated: bool,
    back: Vec<Screen>,
    forward: Vec<Screen>,
    max_redirects: usize,
}

impl Default for Navigator {
    fn default() -> Self {
        Self::new()
    }
}

impl Navigator {
    /// Signed out, on the login screen.
    pub fn new() -> Self {
        Self::with_table(RouteTable::standard_ref())
    }

    pub fn with_table(table: &'static RouteTable) -> Self {
        Self {
            table,
            current: Screen::Login,
            authenticated: false,
            back: Vec::new(),
            forward: Vec::new(),
            max_redirects: MAX_REDIRECTS,
        }
    }

    pub fn with_max_redirects(mut self, max_redirects: usize) -> Self {
        self.max_redirects = max_redirects;
        self
    }

    #[inline]
    pub fn current(&self) -> &Screen {
        &self.current
    }

    pub fn current_address(&self) -> String {
        self.current.to_address()
    }

    #[inline]
    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    pub fn state(&self) -> NavState<'_> {
        if self.authenticated {
            NavState::Authenticated(&self.current)
        } else {
            NavState::Unauthenticated
        }
    }

    pub fn can_go_back(&self) -> bool {
        !self.back.is_empty()
    }

    pub fn can_go_forward(&self) -> bool {
        !self.forward.is_empty()
    }

    // ------------------------------------------------------------------------
    // Session
    // ------------------------------------------------------------------------

    /// Called once the authentication collaborator accepts the user.
    pub fn sign_in(&mut self) -> Navigation {
        self.authenticated = true;
        self.back.clear();
        self.forward.clear();
        self.current = Screen::Storage(StorageAddress::Root);
        Navigation::to(&self.current)
    }

    pub fn sign_out(&mut self) -> Navigation {
        self.authenticated = false;
        self.back.clear();
        self.forward.clear();
        self.current = Screen::Login;
        Navigation::to(&self.current)
    }

    // ------------------------------------------------------------------------
    // Navigation
    // ------------------------------------------------------------------------

    /// Resolve `address` and move there.
    pub fn navigate(&mut self, address: &str) -> Result<Navigation, NavigationError> {
        let result = self.try_navigate(address);
        if let Err(e) = &result {
            warn!(address, error = %e, "navigation failed");
        }
        result
    }

    fn try_navigate(&mut self, address: &str) -> Result<Navigation, NavigationError> {
        let resolved = Resolver::new(self.table).resolve_canonical(address, self.max_redirects)?;
        let screen = Screen::try_from(&resolved.target)?;

        let canonical = screen.to_address();

        if screen.requires_auth() && !self.authenticated {
            return Err(NavigationError::AuthRequired { address: canonical });
        }

        debug!(from = %self.current.to_address(), to = %canonical, "navigating");
        let redirected = !resolved.redirects.is_empty() || canonical != address;
        self.enter_screen(screen.clone());
        Ok(Navigation {
            screen,
            address: canonical,
            redirected,
        })
    }

    /// Follow a move the browser already made to `address`.
    ///
    /// When `address` names the adjacent back or forward entry the navigator
    /// steps its own history so both stay aligned. Anything else is a fresh
    /// [`navigate`](Self::navigate).
    pub fn follow_history(&mut self, address: &str) -> Result<Navigation, NavigationError> {
        let resolved = Resolver::new(self.table)
            .resolve_canonical(address, self.max_redirects)
            .inspect_err(|e| warn!(address, error = %e, "history entry failed"))?;
        let screen = Screen::try_from(&resolved.target)?;

        let mut navigation = if self.back.last() == Some(&screen) {
            self.back()?
        } else if self.forward.last() == Some(&screen) {
            self.forward()?
        } else {
            return self.navigate(address);
        };
        navigation.redirected = navigation.address != address;
        Ok(navigation)
    }

    /// Move to a storage position.
    pub fn open(&mut self, address: &StorageAddress) -> Result<Navigation, NavigationError> {
        self.navigate(&address.to_address())
    }

    pub fn back(&mut self) -> Result<Navigation, NavigationError> {
        let previous = self.back.pop().ok_or(NavigationError::HistoryEmpty("back"))?;
        let current = mem::replace(&mut self.current, previous);
        self.forward.push(current);
        Ok(Navigation::to(&self.current))
    }

    pub fn forward(&mut self) -> Result<Navigation, NavigationError> {
        let next = self
            .forward
            .pop()
            .ok_or(NavigationError::HistoryEmpty("forward"))?;
        let current = mem::replace(&mut self.current, next);
        self.back.push(current);
        Ok(Navigation::to(&self.current))
    }

    /// Go one level up the storage hierarchy.
    pub fn up(&mut self) -> Result<Navigation, NavigationError> {
        let parent = self
            .current
            .storage()
            .and_then(StorageAddress::parent)
            .ok_or(NavigationError::NoParent)?;

        // A disk selection is in-memory only and would be lost in an address.
        if let StorageAddress::Disk { .. } = parent {
            if !self.authenticated {
                return Err(NavigationError::AuthRequired {
                    address: parent.to_address(),
                });
            }
            self.enter_screen(Screen::Storage(parent));
            return Ok(Navigation::to(&self.current));
        }
        self.open(&parent)
    }

    /// Open a subdirectory of the current directory.
    pub fn enter(&mut self, name: &str) -> Result<Navigation, NavigationError> {
        let child = self.child_path("enter", name)?;
        let mount_id = self.current_mount("enter")?;
        self.open(&StorageAddress::directory(mount_id, &child))
    }

    /// Open a file in the current directory.
    pub fn view_file(&mut self, name: &str) -> Result<Navigation, NavigationError> {
        let child = self.child_path("view_file", name)?;
        let mount_id = self.current_mount("view_file")?;
        self.open(&StorageAddress::file(mount_id, &child))
    }

    /// Highlight a disk on the disk list.
    pub fn select_disk(&mut self, disk_path: &str) -> Result<(), NavigationError> {
        match &self.current {
            Screen::Storage(StorageAddress::Root | StorageAddress::Disk { .. }) => {
                if disk_path.is_empty() {
                    return Err(NavigationError::InvalidName(disk_path.to_string()));
                }
                self.current = Screen::Storage(StorageAddress::Disk {
                    selected: Some(encode(disk_path)),
                });
                Ok(())
            }
            _ => Err(NavigationError::InvalidContext {
                operation: "select_disk",
            }),
        }
    }

    /// Open the partition list of the selected disk.
    pub fn open_partitions(&mut self) -> Result<Navigation, NavigationError> {
        let Screen::Storage(StorageAddress::Disk {
            selected: Some(disk_path),
        }) = &self.current
        else {
            return Err(NavigationError::InvalidContext {
                operation: "open_partitions",
            });
        };
        let target = StorageAddress::Partitions {
            disk_path: disk_path.clone(),
        };
        self.open(&target)
    }

    fn enter_screen(&mut self, screen: Screen) {
        if screen == self.current {
            return;
        }
        let previous = mem::replace(&mut self.current, screen);
        self.back.push(previous);
        self.forward.clear();
    }

    fn current_directory(&self, operation: &'static str) -> Result<String, NavigationError> {
        match &self.current {
            Screen::Storage(StorageAddress::Directory { internal_path, .. }) => {
                Ok(internal_path.decode())
            }
            _ => Err(NavigationError::InvalidContext { operation }),
        }
    }

    fn current_mount(&self, operation: &'static str) -> Result<MountId, NavigationError> {
        self.current
            .storage()
            .and_then(StorageAddress::mount_id)
            .cloned()
            .ok_or(NavigationError::InvalidContext { operation })
    }

    fn child_path(&self, operation: &'static str, name: &str) -> Result<String, NavigationError> {
        let dir = self.current_directory(operation)?;
        let trimmed = name.trim_matches('/');
        if trimmed.is_empty() || trimmed == "." || trimmed == ".." {
            return Err(NavigationError::InvalidName(name.to_string()));
        }
        Ok(join_path(&dir, trimmed))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn signed_in() -> Navigator {
        let mut nav = Navigator::new();
        nav.sign_in();
        nav
    }

    fn storage(nav: &Navigator) -> &StorageAddress {
        nav.current().storage().unwrap()
    }

    #[test]
    fn test_initial_state() {
        let nav = Navigator::new();
        assert_eq!(nav.state(), NavState::Unauthenticated);
        assert_eq!(nav.current(), &Screen::Login);
        assert_eq!(nav.current_address(), "/login");
    }

    #[test]
    fn test_auth_gate() {
        let mut nav = Navigator::new();
        assert_eq!(
            nav.navigate("/FilesPage/m1").unwrap_err(),
            NavigationError::AuthRequired {
                address: "/FilesPage/m1/%2F".to_string()
            }
        );
        assert!(matches!(
            nav.navigate("/").unwrap_err(),
            NavigationError::AuthRequired { .. }
        ));
        assert_eq!(nav.current(), &Screen::Login);
        assert!(nav.navigate("/login").is_ok());
    }

    #[test]
    fn test_sign_in_lands_on_disk_list() {
        let mut nav = Navigator::new();
        let nav_result = nav.sign_in();
        assert_eq!(nav_result.address, "/");
        assert_eq!(
            nav.state(),
            NavState::Authenticated(&Screen::Storage(StorageAddress::Root))
        );
    }

    #[test]
    fn test_drill_down() {
        let mut nav = signed_in();
        nav.select_disk("/tmp/d1.mia").unwrap();
        let partitions = nav.open_partitions().unwrap();
        assert_eq!(partitions.address, "/partitions/%2Ftmp%2Fd1.mia");

        let dir = nav.navigate("/FilesPage/341A").unwrap();
        assert!(dir.redirected);
        assert_eq!(dir.address, "/FilesPage/341A/%2F");
        assert_eq!(storage(&nav), &StorageAddress::mount_root("341A"));

        nav.enter("home").unwrap();
        assert_eq!(storage(&nav), &StorageAddress::directory("341A", "/home"));

        let file = nav.view_file("users.txt").unwrap();
        assert_eq!(file.address, "/view/341A/%2Fhome%2Fusers.txt");
        assert!(!file.redirected);
    }

    #[test]
    fn test_navigation_reports_canonical_spelling() {
        let mut nav = signed_in();

        let nested = nav.navigate("/FilesPage/m1/sub/dir").unwrap();
        assert_eq!(nested.address, "/FilesPage/m1/sub%2Fdir");
        assert!(nested.redirected);
        assert_eq!(nested.address, nav.current_address());

        let lower = nav.navigate("/FilesPage/m1/%2fhome").unwrap();
        assert_eq!(lower.address, "/FilesPage/m1/%2Fhome");
        assert!(lower.redirected);
        assert_eq!(storage(&nav), &StorageAddress::directory("m1", "/home"));

        assert_eq!(nav.back().unwrap().address, "/FilesPage/m1/sub%2Fdir");

        let exact = nav.navigate("/FilesPage/m1/%2Fhome").unwrap();
        assert!(!exact.redirected);
    }

    #[test]
    fn test_custom_table_root_route() {
        use crate::table::{RouteAction, RoutePattern, Segment};

        let table = RouteTable::new(vec![
            RoutePattern::new(routes::ROOT, vec![], RouteAction::Target(TargetKind::DiskList)),
            RoutePattern::new(
                "disks",
                vec![Segment::Literal("disks")],
                RouteAction::Target(TargetKind::DiskList),
            ),
        ])
        .unwrap();
        let mut nav = Navigator::with_table(Box::leak(Box::new(table)));
        nav.sign_in();

        nav.navigate("/disks").unwrap();
        assert_eq!(storage(&nav), &StorageAddress::Disk { selected: None });
        nav.navigate("/").unwrap();
        assert_eq!(storage(&nav), &StorageAddress::Root);
    }

    #[test]
    fn test_failed_navigation_keeps_screen() {
        let mut nav = signed_in();
        nav.open(&StorageAddress::mount_root("m1")).unwrap();
        let before = nav.current().clone();

        assert!(matches!(
            nav.navigate("/nonexistent/path").unwrap_err(),
            NavigationError::Resolve(ResolveError::NoMatch { .. })
        ));
        assert!(matches!(
            nav.navigate("/view/m1/%E0").unwrap_err(),
            NavigationError::Resolve(ResolveError::Decode { .. })
        ));
        assert_eq!(nav.current(), &before);
    }

    #[test]
    fn test_redirect_bound() {
        let mut nav = signed_in().with_max_redirects(0);
        assert!(matches!(
            nav.navigate("/FilesPage/m1").unwrap_err(),
            NavigationError::Resolve(ResolveError::TooManyRedirects { .. })
        ));
    }

    #[test]
    fn test_back_and_forward() {
        let mut nav = signed_in();
        nav.navigate("/FilesPage/m1/%2F").unwrap();
        nav.navigate("/view/m1/%2Fa.txt").unwrap();

        assert_eq!(nav.back().unwrap().address, "/FilesPage/m1/%2F");
        assert_eq!(nav.back().unwrap().address, "/");
        assert_eq!(
            nav.back().unwrap_err(),
            NavigationError::HistoryEmpty("back")
        );
        assert_eq!(nav.forward().unwrap().address, "/FilesPage/m1/%2F");

        // A fresh navigation drops the forward stack.
        nav.navigate("/disk").unwrap();
        assert!(!nav.can_go_forward());
        assert!(nav.can_go_back());
    }

    #[test]
    fn test_follow_history_steps_adjacent_entries() {
        let mut nav = signed_in();
        nav.navigate("/FilesPage/m1/%2F").unwrap();
        nav.navigate("/view/m1/%2Fa.txt").unwrap();

        let back = nav.follow_history("/FilesPage/m1/%2F").unwrap();
        assert!(!back.redirected);
        assert!(nav.can_go_forward());
        assert_eq!(storage(&nav), &StorageAddress::mount_root("m1"));

        let forward = nav.follow_history("/view/m1/%2fa.txt").unwrap();
        assert_eq!(forward.address, "/view/m1/%2Fa.txt");
        assert!(forward.redirected);
        assert!(!nav.can_go_forward());

        // Not adjacent: a fresh navigation that drops the forward stack.
        nav.follow_history("/").unwrap();
        nav.follow_history("/disk").unwrap();
        assert!(!nav.can_go_forward());
        assert_eq!(nav.back().unwrap().address, "/");
    }

    #[test]
    fn test_follow_history_keeps_auth_gate() {
        let mut nav = signed_in();
        nav.navigate("/disk").unwrap();
        nav.sign_out();
        assert!(matches!(
            nav.follow_history("/disk").unwrap_err(),
            NavigationError::AuthRequired { .. }
        ));
        assert_eq!(nav.current(), &Screen::Login);
    }

    #[test]
    fn test_same_screen_is_not_pushed() {
        let mut nav = signed_in();
        nav.navigate("/FilesPage/m1").unwrap();
        nav.navigate("/FilesPage/m1/%2F").unwrap();
        nav.back().unwrap();
        assert!(!nav.can_go_back());
    }

    #[test]
    fn test_up() {
        let mut nav = signed_in();
        nav.open(&StorageAddress::file("m1", "/home/a.txt")).unwrap();

        nav.up().unwrap();
        assert_eq!(storage(&nav), &StorageAddress::directory("m1", "/home"));
        nav.up().unwrap();
        assert_eq!(storage(&nav), &StorageAddress::mount_root("m1"));
        nav.up().unwrap();
        assert_eq!(storage(&nav), &StorageAddress::Root);
        assert_eq!(nav.up().unwrap_err(), NavigationError::NoParent);
    }

    #[test]
    fn test_up_from_partitions_keeps_selection() {
        let mut nav = signed_in();
        nav.open(&StorageAddress::partitions("/tmp/d1.mia")).unwrap();
        nav.up().unwrap();
        assert_eq!(
            storage(&nav),
            &StorageAddress::Disk {
                selected: Some(encode("/tmp/d1.mia"))
            }
        );
        assert_eq!(
            nav.open_partitions().unwrap().address,
            "/partitions/%2Ftmp%2Fd1.mia"
        );
    }

    #[test]
    fn test_context_errors() {
        let mut nav = signed_in();
        assert_eq!(
            nav.enter("home").unwrap_err(),
            NavigationError::InvalidContext { operation: "enter" }
        );
        assert_eq!(
            nav.open_partitions().unwrap_err(),
            NavigationError::InvalidContext {
                operation: "open_partitions"
            }
        );
        nav.open(&StorageAddress::mount_root("m1")).unwrap();
        assert_eq!(
            nav.enter("..").unwrap_err(),
            NavigationError::InvalidName("..".to_string())
        );
        assert!(matches!(
            nav.select_disk("d1").unwrap_err(),
            NavigationError::InvalidContext { .. }
        ));
    }

    #[test]
    fn test_sign_out_clears_history() {
        let mut nav = signed_in();
        nav.navigate("/disk").unwrap();
        let out = nav.sign_out();
        assert_eq!(out.screen, Screen::Login);
        assert!(!nav.can_go_back());
        assert_eq!(nav.state(), NavState::Unauthenticated);
    }

    #[test]
    fn test_screen_from_target_round_trip() {
        let resolver = Resolver::default();
        for address in [
            StorageAddress::Root,
            StorageAddress::Disk { selected: None },
            StorageAddress::partitions("disk/0"),
            StorageAddress::mount_root("m 1"),
            StorageAddress::directory("m1", "/a%b/c"),
            StorageAddress::file("m1", "/etc/users.txt"),
        ] {
            let resolved = resolver.resolve_canonical(&address.to_address(), 8).unwrap();
            assert_eq!(
                Screen::try_from(&resolved.target).unwrap(),
                Screen::Storage(address)
            );
        }
    }

    proptest! {
        #[test]
        fn prop_rendered_addresses_resolve_back(
            mount in "[^/]{1,12}",
            path in "(/[^/]{0,8}){0,4}",
        ) {
            let resolver = Resolver::default();
            let dir = StorageAddress::directory(mount.as_str(), &path);
            let resolved = resolver.resolve_canonical(&dir.to_address(), MAX_REDIRECTS).unwrap();
            prop_assert_eq!(Screen::try_from(&resolved.target).unwrap(), Screen::Storage(dir));

            if !path.is_empty() {
                let file = StorageAddress::file(mount.as_str(), &path);
                let resolved = resolver
                    .resolve_canonical(&file.to_address(), MAX_REDIRECTS)
                    .unwrap();
                prop_assert_eq!(Screen::try_from(&resolved.target).unwrap(), Screen::Storage(file));
            }
        }
    }
}
