//! Application router component.
//!
//! Binds the [`Navigator`] to the browser history.
//!
//! # Architecture
//!
//! - **The navigator owns navigation state**: components never edit the
//!   current screen directly, they go through [`NavContext`]
//! - **URL follows the navigator**: in-app moves push the canonical address,
//!   redirects replace the entry that was requested
//! - **popstate events**: browser back/forward step the navigator's own
//!   history when they land on an adjacent entry, otherwise the new pathname
//!   is resolved as a fresh navigation

use leptos::ev;
use leptos::prelude::*;
#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::Closure;

use diskweb_core::{BackendCommand, Navigation, NavigationError, Navigator, Screen, StorageAddress};

use crate::config::APP_NAME;
use crate::utils::history;

// ============================================================================
// Navigation Context
// ============================================================================

/// How a navigation result is written back to the URL.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum UrlSync {
    /// In-app navigation: push the canonical address.
    Push,
    /// The browser already moved: only fix up redirected addresses.
    FromBrowser,
}

/// Shared navigation state, provided at the router.
#[derive(Clone, Copy)]
pub struct NavContext {
    /// The single owner of the current screen.
    pub navigator: RwSignal<Navigator>,
    /// Last navigation failure, cleared on the next success.
    pub error: RwSignal<Option<String>>,
}

impl NavContext {
    pub fn new() -> Self {
        Self {
            navigator: RwSignal::new(Navigator::new()),
            error: RwSignal::new(None),
        }
    }

    fn apply(
        &self,
        sync: UrlSync,
        op: impl FnOnce(&mut Navigator) -> Result<Navigation, NavigationError>,
    ) {
        let mut result = None;
        self.navigator.update(|nav| result = Some(op(nav)));
        let Some(result) = result else {
            return;
        };

        match (result, sync) {
            (Ok(navigation), UrlSync::Push) => {
                self.error.set(None);
                history::push_address(&navigation.address);
            }
            (Ok(navigation), UrlSync::FromBrowser) => {
                self.error.set(None);
                if navigation.redirected {
                    history::replace_address(&navigation.address);
                }
            }
            // Signed out and the browser asked for a protected page: stay on
            // the current screen and show its address instead.
            (Err(NavigationError::AuthRequired { .. }), UrlSync::FromBrowser) => {
                let address = self.navigator.with(Navigator::current_address);
                history::replace_address(&address);
            }
            (Err(e), _) => {
                web_sys::console::warn_1(&format!("navigation failed: {}", e).into());
                self.error.set(Some(e.to_string()));
            }
        }
    }

    /// Resolve whatever the address bar currently shows.
    pub fn sync_from_browser(&self) {
        let address = history::current_address();
        self.apply(UrlSync::FromBrowser, |nav| nav.follow_history(&address));
    }

    pub fn open(&self, address: StorageAddress) {
        self.apply(UrlSync::Push, |nav| nav.open(&address));
    }

    pub fn up(&self) {
        self.apply(UrlSync::Push, Navigator::up);
    }

    pub fn enter(&self, name: &str) {
        self.apply(UrlSync::Push, |nav| nav.enter(name));
    }

    pub fn view_file(&self, name: &str) {
        self.apply(UrlSync::Push, |nav| nav.view_file(name));
    }

    /// Highlight a disk. The address stays `/disk`.
    pub fn select_disk(&self, disk_path: &str) {
        let mut result = Ok(());
        self.navigator.update(|nav| result = nav.select_disk(disk_path));
        match result {
            Ok(()) => self.error.set(None),
            Err(e) => self.error.set(Some(e.to_string())),
        }
    }

    pub fn open_partitions(&self) {
        self.apply(UrlSync::Push, Navigator::open_partitions);
    }

    /// Stand-in for the authentication collaborator's success callback.
    pub fn sign_in(&self) {
        self.apply(UrlSync::Push, |nav| Ok(nav.sign_in()));
    }

    pub fn sign_out(&self) {
        self.apply(UrlSync::Push, |nav| Ok(nav.sign_out()));
    }
}

impl Default for NavContext {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Main Router
// ============================================================================

/// Main application router.
///
/// - `/`, `/disk` → disk list
/// - `/partitions/<disk>` → partitions of a disk
/// - `/FilesPage/<mount>/<path>` → directory listing
/// - `/view/<mount>/<path>` → file view
#[component]
pub fn AppRouter() -> impl IntoView {
    let ctx = NavContext::new();
    provide_context(ctx);

    ctx.sync_from_browser();

    #[cfg(target_arch = "wasm32")]
    {
        use wasm_bindgen::JsCast;
        let closure = Closure::wrap(Box::new(move || {
            ctx.sync_from_browser();
        }) as Box<dyn Fn()>);

        if let Some(window) = web_sys::window() {
            let _ = window
                .add_event_listener_with_callback("popstate", closure.as_ref().unchecked_ref());
        }

        // Keep the closure alive for the lifetime of the app
        closure.forget();
    }

    view! {
        <header>
            <strong>{APP_NAME}</strong>
            <Show when=move || ctx.navigator.with(Navigator::is_authenticated)>
                <button on:click=move |_| ctx.sign_out()>"Sign out"</button>
            </Show>
        </header>
        <Show when=move || ctx.error.with(Option::is_some)>
            <p class="error">{move || ctx.error.get().unwrap_or_default()}</p>
        </Show>
        <main>{move || screen_view(ctx)}</main>
    }
}

// ============================================================================
// Screens
// ============================================================================

fn screen_view(ctx: NavContext) -> AnyView {
    let screen = ctx.navigator.with(|nav| nav.current().clone());

    match screen {
        Screen::Login => view! {
            <section>
                <h1>"Sign in"</h1>
                <button on:click=move |_| ctx.sign_in()>"Continue"</button>
            </section>
        }
        .into_any(),
        Screen::Landing => view! {
            <section>
                <h1>"Welcome"</h1>
                <button on:click=move |_| ctx.open(StorageAddress::Root)>"Browse disks"</button>
            </section>
        }
        .into_any(),
        Screen::Storage(address) => storage_view(ctx, address),
    }
}

fn storage_view(ctx: NavContext, address: StorageAddress) -> AnyView {
    let trail = address
        .trail()
        .into_iter()
        .map(|step| {
            let label = step.label();
            view! { <button on:click=move |_| ctx.open(step.clone())>{label}</button> }
        })
        .collect_view();

    // What the listing collaborator will be asked for.
    let request = match BackendCommand::for_screen(&Screen::Storage(address.clone())) {
        Ok(Some(command)) => serde_json::to_string(&command.to_request()).unwrap_or_default(),
        Ok(None) => String::new(),
        Err(e) => e.to_string(),
    };

    let entry = match &address {
        StorageAddress::Root | StorageAddress::Disk { .. } => Some(view! {
            <EntryInput
                placeholder="disk image path"
                on_submit=move |path: String| ctx.select_disk(&path)
            />
        }
        .into_any()),
        StorageAddress::Directory { .. } => Some(view! {
            <EntryInput
                placeholder="subdirectory"
                on_submit=move |name: String| ctx.enter(&name)
            />
            <EntryInput
                placeholder="file"
                on_submit=move |name: String| ctx.view_file(&name)
            />
        }
        .into_any()),
        _ => None,
    };

    let selected = match &address {
        StorageAddress::Disk {
            selected: Some(disk),
        } => Some(disk.decode()),
        _ => None,
    };

    view! {
        <nav class="trail">{trail}</nav>
        <h2>{address.label()}</h2>
        <code>{request}</code>
        {entry}
        {selected.map(|disk| view! {
            <button on:click=move |_| ctx.open_partitions()>
                {format!("Partitions of {}", disk)}
            </button>
        })}
        <button on:click=move |_| ctx.up()>"Up"</button>
    }
    .into_any()
}

/// Single-line text field that reports its value on Enter.
#[component]
fn EntryInput(
    placeholder: &'static str,
    #[prop(into)] on_submit: Callback<String>,
) -> impl IntoView {
    let (value, set_value) = signal(String::new());

    let handle_keydown = move |ev: ev::KeyboardEvent| {
        if ev.key() == "Enter" {
            on_submit.run(value.get());
            set_value.set(String::new());
        }
    };

    view! {
        <input
            type="text"
            placeholder=placeholder
            autocomplete="off"
            spellcheck="false"
            prop:value=value
            on:input=move |ev| set_value.set(event_target_value(&ev))
            on:keydown=handle_keydown
        />
    }
}
