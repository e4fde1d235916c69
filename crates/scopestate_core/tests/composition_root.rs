use scopestate_core::{
    AppError, AppEvent, AppRoot, Auth, AuthState, ConsumerSite, DomainSlot, RootConfig,
    ScopeError, Theme, ThemeMode,
};

fn mount_default() -> AppRoot {
    AppRoot::mount(&RootConfig::default()).expect("default root should mount")
}

#[test]
fn theme_and_auth_flow_reaches_home() {
    let app = mount_default();
    let home = app.home_view().expect("home mounted");
    assert_eq!(home.theme, ThemeMode::Light);
    assert!(!home.is_logged_in);

    app.handle_event(AppEvent::ToggleTheme(ConsumerSite::AppContent))
        .expect("toggle theme");
    let home = app.home_view().expect("home mounted");
    assert_eq!(home.theme, ThemeMode::Dark);

    app.handle_event(AppEvent::Login).expect("login");
    assert!(app.home_view().expect("home mounted").is_logged_in);

    app.handle_event(AppEvent::Logout).expect("logout");
    let home = app.home_view().expect("home mounted");
    assert!(!home.is_logged_in);
    assert_eq!(home.theme, ThemeMode::Dark);
    assert_eq!(
        app.content_view().expect("content mounted").theme,
        ThemeMode::Dark
    );
}

#[test]
fn toggle_from_home_updates_app_content() {
    let app = mount_default();
    app.handle_event(AppEvent::ToggleTheme(ConsumerSite::Home))
        .expect("toggle from home");

    let content = app.content_view().expect("content mounted");
    assert_eq!(content.theme, ThemeMode::Dark);
    assert_eq!(content.class_name(), "App dark");
    assert_eq!(content.renders, 2);
}

#[test]
fn consumers_rerender_only_for_domains_they_use() {
    let app = mount_default();
    app.handle_event(AppEvent::Login).expect("login");

    assert_eq!(app.content_view().expect("content").renders, 1);
    assert_eq!(app.home_view().expect("home").renders, 2);

    app.handle_event(AppEvent::Login).expect("repeated login");
    assert_eq!(app.home_view().expect("home").renders, 2);
}

#[test]
fn configured_initial_values_are_applied() {
    let config = RootConfig::from_json_str(r#"{"theme":"dark","auth":{"is_logged_in":true}}"#)
        .expect("config should parse");
    let app = AppRoot::mount(&config).expect("root should mount");
    let home = app.home_view().expect("home mounted");
    assert_eq!(home.theme, ThemeMode::Dark);
    assert!(home.is_logged_in);
}

#[test]
fn provider_order_does_not_change_behavior() {
    let reversed = RootConfig {
        provider_order: vec![DomainSlot::Auth, DomainSlot::Theme],
        ..RootConfig::default()
    };
    let app = AppRoot::mount(&reversed).expect("reversed root should mount");
    assert_eq!(app.tree().parent(app.theme_provider()), Some(app.auth_provider()));

    let events = [
        AppEvent::ToggleTheme(ConsumerSite::AppContent),
        AppEvent::Login,
        AppEvent::ToggleTheme(ConsumerSite::Home),
    ];
    let default_app = mount_default();
    for event in events {
        app.handle_event(event).expect("reversed event");
        default_app.handle_event(event).expect("default event");
    }
    assert_eq!(app.snapshot(), default_app.snapshot());
}

#[test]
fn providers_resolve_from_consumer_scopes() {
    let app = mount_default();
    let home = app.home_scope().expect("home scope");
    let theme = app.tree().resolve::<Theme>(home).expect("theme resolves");
    let auth = app.tree().resolve::<Auth>(home).expect("auth resolves");
    assert_eq!(theme.provider_scope(), app.theme_provider());
    assert_eq!(auth.provider_scope(), app.auth_provider());
    assert_eq!(auth.value(), AuthState::logged_out());
    assert_eq!(app.tree().component_name(home), Some("home"));
}

#[test]
fn events_for_unmounted_consumers_fail() {
    let mut app = mount_default();
    app.unmount(ConsumerSite::Home).expect("unmount home");
    assert!(app.home_view().is_none());

    let err = app
        .handle_event(AppEvent::Login)
        .expect_err("login is raised from home");
    assert_eq!(err, AppError::ConsumerUnmounted(ConsumerSite::Home));

    app.handle_event(AppEvent::ToggleTheme(ConsumerSite::AppContent))
        .expect("app content still mounted");
    assert_eq!(app.content_view().expect("content").theme, ThemeMode::Dark);

    app.unmount(ConsumerSite::AppContent)
        .expect("unmount app content");
    assert_eq!(app.snapshot().content, None);
    let err = app
        .unmount(ConsumerSite::AppContent)
        .expect_err("double unmount must fail");
    assert_eq!(err, AppError::ConsumerUnmounted(ConsumerSite::AppContent));
}

#[test]
fn unmounting_home_revokes_its_registrations() {
    let mut app = mount_default();
    let content = app.content_scope().expect("content scope");
    let theme = app.tree().resolve::<Theme>(content).expect("theme resolves");
    let auth = app.tree().resolve::<Auth>(content).expect("auth resolves");
    assert_eq!(theme.subscriber_count(), 2);
    assert_eq!(auth.subscriber_count(), 1);

    app.unmount(ConsumerSite::Home).expect("unmount home");
    assert_eq!(theme.subscriber_count(), 1);
    assert_eq!(auth.subscriber_count(), 0);
}

#[test]
fn consumer_outside_provider_reports_missing_provider() {
    let app = mount_default();
    let err = app
        .tree()
        .resolve::<Auth>(app.theme_provider())
        .expect_err("theme provider sits above auth provider");
    assert!(matches!(
        err,
        ScopeError::MissingProvider { domain: "auth", .. }
    ));
}

#[test]
fn snapshot_serializes_views() {
    let app = mount_default();
    app.handle_event(AppEvent::Login).expect("login");
    let value = serde_json::to_value(app.snapshot()).expect("snapshot serializes");
    assert_eq!(value["home"]["is_logged_in"], serde_json::Value::Bool(true));
    assert_eq!(value["content"]["theme"], "light");
}

#[test]
fn render_lines_describe_mounted_consumers() {
    let app = mount_default();
    app.handle_event(AppEvent::ToggleTheme(ConsumerSite::AppContent))
        .expect("toggle theme");
    let lines = app.render_lines();
    assert_eq!(
        lines,
        vec![
            "[App dark] Current Theme: dark".to_string(),
            "[home dark] logged out".to_string(),
        ]
    );
}

#[test]
fn invalid_provider_order_is_rejected_at_mount() {
    let config = RootConfig {
        provider_order: vec![DomainSlot::Theme],
        ..RootConfig::default()
    };
    let err = AppRoot::mount(&config).err().expect("mount must fail");
    assert!(matches!(err, AppError::Config(_)));
}
