//! Composition root for the theme/auth page.
//!
//! # Responsibility
//! - Nest the theme and auth providers in the configured order.
//! - Mount the `app_content` consumer inside the innermost provider and the
//!   `home` consumer inside `app_content`.
//! - Route UI events to the consumer that raises them.
//!
//! # Invariants
//! - The root owns no domain state; every value lives in a provider.
//! - Views only change through provider publishes.

use crate::config::{ConfigError, DomainSlot, RootConfig};
use crate::domain::auth::{Auth, AuthState};
use crate::domain::theme::{Theme, ThemeMode};
use crate::scope::{Handle, ScopeError, ScopeId, ScopeTree};
use log::{debug, info};
use serde::Serialize;
use std::cell::RefCell;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::rc::Rc;
use std::str::FromStr;

pub const APP_CONTENT_COMPONENT: &str = "app_content";
pub const HOME_COMPONENT: &str = "home";

/// Consumer that raises an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsumerSite {
    AppContent,
    Home,
}

impl ConsumerSite {
    pub fn component_name(self) -> &'static str {
        match self {
            Self::AppContent => APP_CONTENT_COMPONENT,
            Self::Home => HOME_COMPONENT,
        }
    }
}

/// User interaction replayed against the root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEvent {
    ToggleTheme(ConsumerSite),
    Login,
    Logout,
}

impl Display for AppEvent {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ToggleTheme(ConsumerSite::AppContent) => f.write_str("toggle-theme"),
            Self::ToggleTheme(ConsumerSite::Home) => f.write_str("toggle-theme@home"),
            Self::Login => f.write_str("login"),
            Self::Logout => f.write_str("logout"),
        }
    }
}

impl FromStr for AppEvent {
    type Err = ParseAppEventError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "toggle-theme" | "toggle-theme@app" => Ok(Self::ToggleTheme(ConsumerSite::AppContent)),
            "toggle-theme@home" => Ok(Self::ToggleTheme(ConsumerSite::Home)),
            "login" => Ok(Self::Login),
            "logout" => Ok(Self::Logout),
            other => Err(ParseAppEventError(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseAppEventError(pub String);

impl Display for ParseAppEventError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "unknown event `{}`; expected toggle-theme|toggle-theme@home|login|logout",
            self.0
        )
    }
}

impl Error for ParseAppEventError {}

/// Last frame rendered by `app_content`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ContentView {
    pub theme: ThemeMode,
    pub renders: u32,
}

impl ContentView {
    /// CSS class list of the page container.
    pub fn class_name(&self) -> String {
        format!("App {}", self.theme)
    }
}

/// Last frame rendered by `home`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct HomeView {
    pub theme: ThemeMode,
    pub is_logged_in: bool,
    pub renders: u32,
}

/// Serializable state of both consumers; `None` once unmounted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppSnapshot {
    pub content: Option<ContentView>,
    pub home: Option<HomeView>,
}

/// Composition root errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    Config(ConfigError),
    Scope(ScopeError),
    /// Event targets a consumer that is no longer mounted.
    ConsumerUnmounted(ConsumerSite),
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(err) => write!(f, "{err}"),
            Self::Scope(err) => write!(f, "{err}"),
            Self::ConsumerUnmounted(site) => {
                write!(f, "consumer is not mounted: {}", site.component_name())
            }
        }
    }
}

impl Error for AppError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
            Self::Scope(err) => Some(err),
            Self::ConsumerUnmounted(_) => None,
        }
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<ScopeError> for AppError {
    fn from(value: ScopeError) -> Self {
        Self::Scope(value)
    }
}

struct ContentConsumer {
    scope: ScopeId,
    view: Rc<RefCell<ContentView>>,
    theme: Handle<Theme>,
}

struct HomeConsumer {
    scope: ScopeId,
    view: Rc<RefCell<HomeView>>,
    theme: Handle<Theme>,
    auth: Handle<Auth>,
}

/// Mounted page: providers, consumers, and their last rendered views.
pub struct AppRoot {
    tree: ScopeTree,
    theme_provider: ScopeId,
    auth_provider: ScopeId,
    content: Option<ContentConsumer>,
    home: Option<HomeConsumer>,
}

impl AppRoot {
    /// Builds the provider chain and mounts both consumers.
    pub fn mount(config: &RootConfig) -> Result<Self, AppError> {
        config.validate()?;

        let mut tree = ScopeTree::new();
        let mut innermost = tree.root();
        let mut theme_provider = None;
        let mut auth_provider = None;
        for slot in &config.provider_order {
            innermost = match slot {
                DomainSlot::Theme => {
                    let scope = tree.mount_provider_with::<Theme>(innermost, config.theme)?;
                    theme_provider = Some(scope);
                    scope
                }
                DomainSlot::Auth => {
                    let scope = tree.mount_provider_with::<Auth>(innermost, config.auth)?;
                    auth_provider = Some(scope);
                    scope
                }
            };
        }
        let missing = |slot: DomainSlot| {
            ConfigError::InvalidProviderOrder(format!("`{}` is not mounted", slot.as_str()))
        };
        let theme_provider = theme_provider.ok_or_else(|| missing(DomainSlot::Theme))?;
        let auth_provider = auth_provider.ok_or_else(|| missing(DomainSlot::Auth))?;

        let content = mount_content(&mut tree, innermost)?;
        let home = mount_home(&mut tree, content.scope)?;
        info!(
            "event=app_mount module=app status=ok order={:?} theme={} logged_in={}",
            config.provider_order, config.theme, config.auth.is_logged_in
        );

        Ok(Self {
            tree,
            theme_provider,
            auth_provider,
            content: Some(content),
            home: Some(home),
        })
    }

    /// Applies one event from the consumer that raises it.
    pub fn handle_event(&self, event: AppEvent) -> Result<(), AppError> {
        debug!("event=app_event module=app name={event}");
        match event {
            AppEvent::ToggleTheme(ConsumerSite::AppContent) => {
                self.content_consumer()?.theme.toggle_theme();
            }
            AppEvent::ToggleTheme(ConsumerSite::Home) => {
                self.home_consumer()?.theme.toggle_theme();
            }
            AppEvent::Login => self.home_consumer()?.auth.login(),
            AppEvent::Logout => self.home_consumer()?.auth.logout(),
        }
        Ok(())
    }

    /// Unmounts one consumer. Unmounting `app_content` also unmounts `home`.
    pub fn unmount(&mut self, site: ConsumerSite) -> Result<(), AppError> {
        let scope = match site {
            ConsumerSite::AppContent => self.content.as_ref().map(|consumer| consumer.scope),
            ConsumerSite::Home => self.home.as_ref().map(|consumer| consumer.scope),
        }
        .ok_or(AppError::ConsumerUnmounted(site))?;

        self.tree.unmount(scope)?;
        if site == ConsumerSite::AppContent {
            self.content = None;
        }
        self.home = None;
        Ok(())
    }

    pub fn content_view(&self) -> Option<ContentView> {
        self.content.as_ref().map(|consumer| *consumer.view.borrow())
    }

    pub fn home_view(&self) -> Option<HomeView> {
        self.home.as_ref().map(|consumer| *consumer.view.borrow())
    }

    pub fn snapshot(&self) -> AppSnapshot {
        AppSnapshot {
            content: self.content_view(),
            home: self.home_view(),
        }
    }

    /// Text frame of the mounted consumers.
    pub fn render_lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        if let Some(content) = self.content_view() {
            lines.push(format!("[{}] Current Theme: {}", content.class_name(), content.theme));
        }
        if let Some(home) = self.home_view() {
            let auth = if home.is_logged_in {
                "logged in"
            } else {
                "logged out"
            };
            lines.push(format!("[home {}] {}", home.theme, auth));
        }
        lines
    }

    pub fn theme_provider(&self) -> ScopeId {
        self.theme_provider
    }

    pub fn auth_provider(&self) -> ScopeId {
        self.auth_provider
    }

    pub fn content_scope(&self) -> Option<ScopeId> {
        self.content.as_ref().map(|consumer| consumer.scope)
    }

    pub fn home_scope(&self) -> Option<ScopeId> {
        self.home.as_ref().map(|consumer| consumer.scope)
    }

    pub fn tree(&self) -> &ScopeTree {
        &self.tree
    }

    fn content_consumer(&self) -> Result<&ContentConsumer, AppError> {
        self.content
            .as_ref()
            .ok_or(AppError::ConsumerUnmounted(ConsumerSite::AppContent))
    }

    fn home_consumer(&self) -> Result<&HomeConsumer, AppError> {
        self.home
            .as_ref()
            .ok_or(AppError::ConsumerUnmounted(ConsumerSite::Home))
    }
}

fn mount_content(tree: &mut ScopeTree, parent: ScopeId) -> Result<ContentConsumer, ScopeError> {
    let scope = tree.mount_component(parent, APP_CONTENT_COMPONENT)?;
    let view = Rc::new(RefCell::new(ContentView::default()));

    let sink = Rc::clone(&view);
    let theme = tree.use_domain::<Theme, _>(scope, move |mode: &ThemeMode| {
        let mut view = sink.borrow_mut();
        view.theme = *mode;
        view.renders += 1;
    })?;
    *view.borrow_mut() = ContentView {
        theme: theme.theme(),
        renders: 1,
    };

    Ok(ContentConsumer { scope, view, theme })
}

fn mount_home(tree: &mut ScopeTree, parent: ScopeId) -> Result<HomeConsumer, ScopeError> {
    let scope = tree.mount_component(parent, HOME_COMPONENT)?;
    let view = Rc::new(RefCell::new(HomeView::default()));

    let sink = Rc::clone(&view);
    let theme = tree.use_domain::<Theme, _>(scope, move |mode: &ThemeMode| {
        let mut view = sink.borrow_mut();
        view.theme = *mode;
        view.renders += 1;
    })?;
    let sink = Rc::clone(&view);
    let auth = tree.use_domain::<Auth, _>(scope, move |state: &AuthState| {
        let mut view = sink.borrow_mut();
        view.is_logged_in = state.is_logged_in;
        view.renders += 1;
    })?;
    *view.borrow_mut() = HomeView {
        theme: theme.theme(),
        is_logged_in: auth.is_logged_in(),
        renders: 1,
    };

    Ok(HomeConsumer {
        scope,
        view,
        theme,
        auth,
    })
}
