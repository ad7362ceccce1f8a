//! Best practice checks against a typical tenancy project layout

use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tenant_schemas::prelude::*;
use tenant_schemas::{audit_with, ensure_no_critical};
use tenant_schemas_config::ConfigManager;

const INSTALL_ORDER_HINT: &str = "This is necessary to overwrite built-in django management \
                                  commands with their schema-aware implementations.";

fn shared_apps() -> Vec<&'static str> {
    vec![
        "tenant_schemas",
        "customers",
        "django.contrib.auth",
        "django.contrib.contenttypes",
        "django.contrib.sessions",
        "django.contrib.messages",
        "django.contrib.staticfiles",
    ]
}

fn installed_apps() -> Vec<&'static str> {
    vec![
        "tenant_schemas",
        "dts_test_app",
        "customers",
        "django.contrib.auth",
        "django.contrib.contenttypes",
        "django.contrib.sessions",
        "django.contrib.messages",
        "django.contrib.staticfiles",
    ]
}

fn project_settings() -> TenancySettings {
    TenancySettings::default()
        .with_shared_apps(shared_apps())
        .with_tenant_apps(["dts_test_app"])
        .with_installed_apps(installed_apps())
        .with_tenant_model("customers.Client")
        .with_database_routers(["tenant_schemas.routers.TenantSyncRouter"])
}

async fn run(settings: &TenancySettings) -> Vec<Finding> {
    run_with_store(settings, &InMemoryTenantStore::new()).await
}

async fn run_with_store(settings: &TenancySettings, store: &dyn TenantStore) -> Vec<Finding> {
    let registry = AppRegistry::from_installed_apps(&settings.installed_apps).unwrap();
    audit(&registry, settings, store).await.unwrap()
}

fn hint_list(items: &[&str]) -> Hint {
    Hint::List(items.iter().map(|s| s.to_string()).collect())
}

struct FailingStore;

#[async_trait]
impl TenantStore for FailingStore {
    async fn schema_names(&self) -> Result<Vec<String>, TenantError> {
        Err(TenantError::Storage("connection refused".to_string()))
    }

    async fn find_by_schema(&self, _schema_name: &str) -> Result<Option<Tenant>, TenantError> {
        Err(TenantError::Storage("connection refused".to_string()))
    }

    async fn find_by_domain(&self, _domain_url: &str) -> Result<Option<Tenant>, TenantError> {
        Err(TenantError::Storage("connection refused".to_string()))
    }
}

#[derive(Default)]
struct CountingStore {
    inner: InMemoryTenantStore,
    queries: AtomicUsize,
}

#[async_trait]
impl TenantStore for CountingStore {
    async fn schema_names(&self) -> Result<Vec<String>, TenantError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        self.inner.schema_names().await
    }

    async fn find_by_schema(&self, schema_name: &str) -> Result<Option<Tenant>, TenantError> {
        self.inner.find_by_schema(schema_name).await
    }

    async fn find_by_domain(&self, domain_url: &str) -> Result<Option<Tenant>, TenantError> {
        self.inner.find_by_domain(domain_url).await
    }
}

#[tokio::test]
async fn test_valid_project_has_no_findings() {
    assert_eq!(run(&project_settings()).await, vec![]);
}

#[tokio::test]
async fn test_unset_tenant_apps() {
    let mut settings = project_settings();
    settings.tenant_apps = None;

    assert_eq!(
        run(&settings).await,
        vec![Finding::critical("TENANT_APPS setting not set")]
    );
}

#[tokio::test]
async fn test_unset_tenant_model() {
    let mut settings = project_settings();
    settings.tenant_model = None;

    assert_eq!(
        run(&settings).await,
        vec![Finding::critical("TENANT_MODEL setting not set")]
    );
}

#[tokio::test]
async fn test_unset_shared_apps() {
    let mut settings = project_settings();
    settings.shared_apps = None;

    assert_eq!(
        run(&settings).await,
        vec![Finding::critical("SHARED_APPS setting not set")]
    );
}

#[tokio::test]
async fn test_presence_checks_are_reported_together() {
    let settings = TenancySettings::default().with_installed_apps(installed_apps());

    assert_eq!(
        run(&settings).await,
        vec![
            Finding::critical("TENANT_APPS setting not set"),
            Finding::critical("TENANT_MODEL setting not set"),
            Finding::critical("SHARED_APPS setting not set"),
            Finding::critical(
                "DATABASE_ROUTERS setting must contain 'tenant_schemas.routers.TenantSyncRouter'."
            ),
        ]
    );
}

#[tokio::test]
async fn test_database_routers() {
    let settings = project_settings().with_database_routers(Vec::<String>::new());

    assert_eq!(
        run(&settings).await,
        vec![Finding::critical(
            "DATABASE_ROUTERS setting must contain 'tenant_schemas.routers.TenantSyncRouter'."
        )]
    );
}

#[tokio::test]
async fn test_database_routers_skips_remaining_rules() {
    let settings = project_settings()
        .with_database_routers(["myproject.routers.Primary"])
        .with_tenant_apps(Vec::<String>::new())
        .with_pg_extra_search_paths(["public"]);

    let findings = run(&settings).await;
    assert_eq!(findings.len(), 1);
    assert!(findings[0].message.starts_with("DATABASE_ROUTERS"));
}

#[tokio::test]
async fn test_tenant_schemas_before_django_installed_apps() {
    let settings = project_settings().with_installed_apps([
        "dts_test_app",
        "customers",
        "django.contrib.auth",
        "django.contrib.contenttypes",
        "tenant_schemas",
        "django.contrib.sessions",
        "django.contrib.messages",
        "django.contrib.staticfiles",
    ]);

    assert_eq!(
        run(&settings).await,
        vec![
            Finding::warning(
                "You should put 'tenant_schemas' before any django core applications in \
                 INSTALLED_APPS."
            )
            .with_obj("django.conf.settings")
            .with_hint(INSTALL_ORDER_HINT)
        ]
    );
}

#[tokio::test]
async fn test_tenant_schemas_after_custom_apps_in_installed_apps() {
    let settings = project_settings().with_installed_apps([
        "dts_test_app",
        "customers",
        "tenant_schemas",
        "django.contrib.auth",
        "django.contrib.contenttypes",
        "django.contrib.sessions",
        "django.contrib.messages",
        "django.contrib.staticfiles",
    ]);

    assert_eq!(run(&settings).await, vec![]);
}

#[tokio::test]
async fn test_tenant_apps_empty() {
    let settings = project_settings().with_tenant_apps(Vec::<String>::new());

    let expected = vec![
        Finding::error("TENANT_APPS is empty.").with_hint("Maybe you don't need this app?"),
        Finding::error(
            "You have INSTALLED_APPS that are not in either of TENANT_APPS or SHARED_APPS",
        )
        .with_hint(hint_list(&["dts_test_app"])),
    ];

    assert_eq!(run(&settings).await, expected);
    // Same inputs, same answer.
    assert_eq!(run(&settings).await, expected);
}

#[tokio::test]
async fn test_public_schema_on_extra_search_paths() {
    let store = InMemoryTenantStore::new();
    store.create(Tenant::new("demo1", "demo1.example.com")).unwrap();
    store.create(Tenant::new("demo2", "demo2.example.com")).unwrap();

    let settings = project_settings().with_pg_extra_search_paths(["public", "demo1", "demo2"]);

    assert_eq!(
        run_with_store(&settings, &store).await,
        vec![
            Finding::critical("public can not be included on PG_EXTRA_SEARCH_PATHS."),
            Finding::critical(
                "Do not include tenant schemas (demo1, demo2) on PG_EXTRA_SEARCH_PATHS."
            ),
        ]
    );
}

#[tokio::test]
async fn test_tenant_schemas_listed_in_search_path_order() {
    let store = InMemoryTenantStore::new();
    store.create(Tenant::new("demo1", "demo1.example.com")).unwrap();
    store.create(Tenant::new("demo2", "demo2.example.com")).unwrap();

    let settings = project_settings().with_pg_extra_search_paths(["demo2", "extensions", "demo1"]);

    assert_eq!(
        run_with_store(&settings, &store).await,
        vec![Finding::critical(
            "Do not include tenant schemas (demo2, demo1) on PG_EXTRA_SEARCH_PATHS."
        )]
    );
}

#[tokio::test]
async fn test_custom_public_schema_name() {
    let settings = project_settings()
        .with_public_schema_name("shared")
        .with_pg_extra_search_paths(["shared", "public"]);

    assert_eq!(
        run(&settings).await,
        vec![Finding::critical(
            "shared can not be included on PG_EXTRA_SEARCH_PATHS."
        )]
    );
}

#[tokio::test]
async fn test_shared_apps_empty() {
    let settings = project_settings()
        .with_shared_apps(Vec::<String>::new())
        .with_tenant_apps(["dts_test_app", "django.contrib.contenttypes"])
        .with_installed_apps([
            "tenant_schemas",
            "dts_test_app",
            "django.contrib.contenttypes",
        ]);

    assert_eq!(
        run(&settings).await,
        vec![
            Finding::warning("SHARED_APPS is empty."),
            Finding::error(
                "You have INSTALLED_APPS that are not in either of TENANT_APPS or SHARED_APPS",
            )
            .with_hint(hint_list(&["tenant_schemas"])),
        ]
    );
}

#[tokio::test]
async fn test_tenant_app_missing_from_install_apps() {
    let settings = project_settings().with_tenant_apps(["dts_test_app", "django.contrib.flatpages"]);

    assert_eq!(
        run(&settings).await,
        vec![
            Finding::error("You have TENANT_APPS that are not in INSTALLED_APPS")
                .with_hint(hint_list(&["django.contrib.flatpages"]))
        ]
    );
}

#[tokio::test]
async fn test_shared_app_missing_from_install_apps() {
    let mut shared = shared_apps();
    shared.push("django.contrib.flatpages");
    let settings = project_settings().with_shared_apps(shared);

    assert_eq!(
        run(&settings).await,
        vec![
            Finding::error("You have SHARED_APPS that are not in INSTALLED_APPS")
                .with_hint(hint_list(&["django.contrib.flatpages"]))
        ]
    );
}

#[tokio::test]
async fn test_installed_app_missing_from_shared_and_tenant_apps() {
    let mut installed = installed_apps();
    installed.push("django.contrib.humanize");
    let settings = project_settings().with_installed_apps(installed);

    assert_eq!(
        run(&settings).await,
        vec![
            Finding::error(
                "You have INSTALLED_APPS that are not in either of TENANT_APPS or SHARED_APPS",
            )
            .with_hint(hint_list(&["django.contrib.humanize"]))
        ]
    );
}

#[tokio::test]
async fn test_rules_report_in_fixed_order() {
    let store = InMemoryTenantStore::new();
    store.create(Tenant::new("demo1", "demo1.example.com")).unwrap();

    let settings = project_settings()
        .with_tenant_apps(Vec::<String>::new())
        .with_shared_apps(["tenant_schemas", "django.contrib.sites"])
        .with_installed_apps(["django.contrib.auth", "tenant_schemas", "customers"])
        .with_pg_extra_search_paths(["demo1"]);

    let severities: Vec<Severity> = run_with_store(&settings, &store)
        .await
        .into_iter()
        .map(|f| f.severity)
        .collect();

    assert_eq!(
        severities,
        vec![
            Severity::Warning,  // install order
            Severity::Error,    // TENANT_APPS empty
            Severity::Error,    // uncovered installed apps
            Severity::Error,    // shared app not installed
            Severity::Critical, // tenant schema on search path
        ]
    );
}

#[tokio::test]
async fn test_repeated_audits_are_equal() {
    let store = InMemoryTenantStore::new();
    store.create(Tenant::new("demo1", "demo1.example.com")).unwrap();

    let settings = project_settings()
        .with_shared_apps(Vec::<String>::new())
        .with_pg_extra_search_paths(["public", "demo1"]);

    let first = run_with_store(&settings, &store).await;
    let second = run_with_store(&settings, &store).await;
    assert!(!first.is_empty());
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_storage_failure_propagates() {
    let settings = project_settings().with_pg_extra_search_paths(["extensions"]);
    let registry = AppRegistry::from_installed_apps(&settings.installed_apps).unwrap();

    let result = audit(&registry, &settings, &FailingStore).await;
    assert!(matches!(result, Err(TenantError::Storage(_))));
}

#[tokio::test]
async fn test_store_not_queried_without_extra_search_paths() {
    let store = CountingStore::default();
    let settings = project_settings();
    run_with_store(&settings, &store).await;
    assert_eq!(store.queries.load(Ordering::SeqCst), 0);

    let settings = settings.with_pg_extra_search_paths(["extensions"]);
    run_with_store(&settings, &store).await;
    assert_eq!(store.queries.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_custom_core_apps() {
    let settings = project_settings()
        .with_shared_apps(["wagtail.core", "tenant_schemas", "customers"])
        .with_installed_apps(["wagtail.core", "tenant_schemas", "customers", "dts_test_app"]);
    let registry = AppRegistry::from_installed_apps(&settings.installed_apps).unwrap();
    let store = InMemoryTenantStore::new();

    let findings = audit(&registry, &settings, &store).await.unwrap();
    assert!(findings.is_empty());

    let options = AuditOptions::new().with_core_app("wagtail.core");
    let findings = audit_with(&registry, &settings, &store, &options).await.unwrap();
    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0].severity, Severity::Warning);
}

#[tokio::test]
async fn test_auditor_startup_check() {
    let store = Arc::new(InMemoryTenantStore::new());
    let auditor = Auditor::new(store);

    let settings = project_settings().with_shared_apps(Vec::<String>::new());
    let registry = AppRegistry::from_installed_apps(&settings.installed_apps).unwrap();
    let findings = auditor.check_startup(&registry, &settings).await.unwrap();
    assert!(findings.iter().all(|f| !f.is_critical()));

    let settings = project_settings().with_pg_extra_search_paths(["public"]);
    let result = auditor.check_startup(&registry, &settings).await;
    assert!(matches!(result, Err(TenantError::CriticalFindings(1))));
}

#[tokio::test]
async fn test_settings_from_config_bag() {
    let config = ConfigManager::new();
    config.set("SHARED_APPS", shared_apps()).unwrap();
    config.set("TENANT_APPS", "dts_test_app").unwrap();
    config.set("INSTALLED_APPS", installed_apps()).unwrap();
    config.set("TENANT_MODEL", "customers.Client").unwrap();
    config
        .set("DATABASE_ROUTERS", "tenant_schemas.routers.TenantSyncRouter")
        .unwrap();

    let settings = TenancySettings::from_config(&config).unwrap();
    assert_eq!(settings, project_settings());
    assert!(ensure_no_critical(&run(&settings).await).is_ok());

    config.unset("TENANT_MODEL");
    let settings = TenancySettings::from_config(&config).unwrap();
    assert_eq!(
        run(&settings).await,
        vec![Finding::critical("TENANT_MODEL setting not set")]
    );
}
