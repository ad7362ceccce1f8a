//! Best Practice Checks
//!
//! Audits the declared tenancy configuration before the host starts
//! serving requests. Each rule inspects the app registry snapshot and the
//! [`TenancySettings`]; one rule also reads tenant schema names from the
//! [`TenantStore`].
//!
//! Findings come back in a fixed rule order, not sorted by severity:
//!
//! 1. required settings are present and the schema-aware router is listed
//! 2. the tenancy package is installed before framework core apps
//! 3. `TENANT_APPS` is not empty
//! 4. `SHARED_APPS` is not empty
//! 5. every installed app is a tenant or shared app
//! 6. every tenant app is installed
//! 7. every shared app is installed
//! 8. neither public nor tenant schemas are on `PG_EXTRA_SEARCH_PATHS`
//!
//! When any rule 1 check fails the remaining rules are skipped.
//!
//! # Usage
//!
//! ```rust,ignore
//! let registry = AppRegistry::from_installed_apps(&settings.installed_apps)?;
//! let findings = audit(&registry, &settings, store.as_ref()).await?;
//! ensure_no_critical(&findings)?;
//! ```

use crate::registry::AppRegistry;
use crate::settings::{DATABASE_ROUTERS, PG_EXTRA_SEARCH_PATHS, TenancySettings};
use crate::store::{TenantError, TenantStore};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use tenant_schemas_log::{debug, error, warn};

const TARGET: &str = "tenant_schemas::checks";

/// Name under which the tenancy package is installed.
pub const TENANCY_PACKAGE: &str = "tenant_schemas";

/// Router that keeps migrations inside the right schemas.
pub const SYNC_ROUTER: &str = "tenant_schemas.routers.TenantSyncRouter";

/// Object reported on findings about the global settings.
pub const SETTINGS_OBJ: &str = "django.conf.settings";

/// Framework apps that ship their own management commands.
pub const DEFAULT_CORE_APPS: &[&str] = &[
    "django.contrib.admin",
    "django.contrib.admindocs",
    "django.contrib.auth",
    "django.contrib.contenttypes",
    "django.contrib.flatpages",
    "django.contrib.gis",
    "django.contrib.humanize",
    "django.contrib.messages",
    "django.contrib.postgres",
    "django.contrib.redirects",
    "django.contrib.sessions",
    "django.contrib.sitemaps",
    "django.contrib.sites",
    "django.contrib.staticfiles",
    "django.contrib.syndication",
];

const INSTALL_ORDER_HINT: &str = "This is necessary to overwrite built-in django management \
                                  commands with their schema-aware implementations.";

/// Finding severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Style or ordering recommendation
    Warning,
    /// Functional inconsistency, likely incorrect routing
    Error,
    /// Unsafe or non-functional configuration; startup should stop
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Warning => write!(f, "WARNING"),
            Self::Error => write!(f, "ERROR"),
            Self::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// Hint attached to a finding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Hint {
    Text(String),
    List(Vec<String>),
}

impl From<&str> for Hint {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for Hint {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<Vec<String>> for Hint {
    fn from(items: Vec<String>) -> Self {
        Self::List(items)
    }
}

impl From<Vec<&str>> for Hint {
    fn from(items: Vec<&str>) -> Self {
        Self::List(items.into_iter().map(str::to_string).collect())
    }
}

impl fmt::Display for Hint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::List(items) => write!(f, "[{}]", items.join(", ")),
        }
    }
}

/// One diagnostic produced by the audit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub severity: Severity,

    pub message: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<Hint>,

    /// The offending object, usually a settings module
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub obj: Option<String>,
}

impl Finding {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
            hint: None,
            obj: None,
        }
    }

    pub fn critical(message: impl Into<String>) -> Self {
        Self::new(Severity::Critical, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, message)
    }

    pub fn with_hint(mut self, hint: impl Into<Hint>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn with_obj(mut self, obj: impl Into<String>) -> Self {
        self.obj = Some(obj.into());
        self
    }

    pub fn is_critical(&self) -> bool {
        self.severity == Severity::Critical
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: ", self.severity)?;
        if let Some(obj) = &self.obj {
            write!(f, "{}: ", obj)?;
        }
        f.write_str(&self.message)?;
        if let Some(hint) = &self.hint {
            write!(f, "\n\tHINT: {}", hint)?;
        }
        Ok(())
    }
}

/// Audit options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditOptions {
    /// Installed name of the tenancy package
    pub package: String,

    /// Router reference that must appear in `DATABASE_ROUTERS`
    pub sync_router: String,

    /// Object named on install-order findings
    pub settings_obj: String,

    /// Framework core apps the tenancy package must precede
    pub core_apps: Vec<String>,
}

impl Default for AuditOptions {
    fn default() -> Self {
        Self {
            package: TENANCY_PACKAGE.to_string(),
            sync_router: SYNC_ROUTER.to_string(),
            settings_obj: SETTINGS_OBJ.to_string(),
            core_apps: DEFAULT_CORE_APPS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl AuditOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the framework core app allow-list.
    pub fn with_core_apps<I, S>(mut self, apps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.core_apps = apps.into_iter().map(Into::into).collect();
        self
    }

    /// Add one app to the framework core allow-list.
    pub fn with_core_app(mut self, app: impl Into<String>) -> Self {
        self.core_apps.push(app.into());
        self
    }
}

/// Members of `items` that are not in `exclude`, in `items` order.
///
/// Repeated members are reported once.
///
/// # Examples
///
/// ```
/// use tenant_schemas::checks::ordered_difference;
///
/// let installed = ["a", "b", "c", "b"];
/// assert_eq!(ordered_difference(&installed, &["a"]), vec!["b", "c"]);
/// ```
pub fn ordered_difference<'a, A, B>(items: &'a [A], exclude: &[B]) -> Vec<&'a str>
where
    A: AsRef<str>,
    B: AsRef<str>,
{
    let exclude: HashSet<&str> = exclude.iter().map(|s| AsRef::<str>::as_ref(s)).collect();
    retain_ordered(items, |item| !exclude.contains(item))
}

/// Members of `items` that are also in `include`, in `items` order.
///
/// Repeated members are reported once.
pub fn ordered_intersection<'a, A, B>(items: &'a [A], include: &[B]) -> Vec<&'a str>
where
    A: AsRef<str>,
    B: AsRef<str>,
{
    let include: HashSet<&str> = include.iter().map(|s| AsRef::<str>::as_ref(s)).collect();
    retain_ordered(items, |item| include.contains(item))
}

fn retain_ordered<'a, A, F>(items: &'a [A], keep: F) -> Vec<&'a str>
where
    A: AsRef<str>,
    F: Fn(&str) -> bool,
{
    let mut seen = HashSet::new();
    items
        .iter()
        .map(|s| AsRef::<str>::as_ref(s))
        .filter(|item| keep(*item) && seen.insert(*item))
        .collect()
}

/// Run every best practice check with the default options.
pub async fn audit(
    registry: &AppRegistry,
    settings: &TenancySettings,
    store: &dyn TenantStore,
) -> Result<Vec<Finding>, TenantError> {
    audit_with(registry, settings, store, &AuditOptions::default()).await
}

/// Run every best practice check.
///
/// The only error is a failure to read tenant schema names from `store`.
pub async fn audit_with(
    registry: &AppRegistry,
    settings: &TenancySettings,
    store: &dyn TenantStore,
    options: &AuditOptions,
) -> Result<Vec<Finding>, TenantError> {
    debug!(
        target: TARGET,
        "Auditing {} installed apps against tenancy settings",
        registry.len()
    );

    let mut findings = check_required_settings(settings, options);
    if !findings.is_empty() {
        log_findings(&findings);
        return Ok(findings);
    }

    let installed = registry.names();
    findings.extend(check_install_order(&installed, options));

    if let (Some(tenant_apps), Some(shared_apps)) = (&settings.tenant_apps, &settings.shared_apps)
    {
        findings.extend(check_app_lists(&installed, tenant_apps, shared_apps));
    }

    findings.extend(check_extra_search_paths(settings, store).await?);

    log_findings(&findings);
    Ok(findings)
}

/// Fail if any finding is critical.
pub fn ensure_no_critical(findings: &[Finding]) -> Result<(), TenantError> {
    let critical = findings.iter().filter(|f| f.is_critical()).count();
    if critical > 0 {
        error!(
            target: TARGET,
            "Tenancy configuration has {} critical finding(s)", critical
        );
        return Err(TenantError::CriticalFindings(critical));
    }
    Ok(())
}

fn log_findings(findings: &[Finding]) {
    for finding in findings {
        match finding.severity {
            Severity::Warning => warn!(target: TARGET, "{}", finding),
            Severity::Error | Severity::Critical => error!(target: TARGET, "{}", finding),
        }
    }
    debug!(target: TARGET, "Audit produced {} finding(s)", findings.len());
}

fn check_required_settings(settings: &TenancySettings, options: &AuditOptions) -> Vec<Finding> {
    let mut findings = Vec::new();

    if settings.tenant_apps.is_none() {
        findings.push(Finding::critical("TENANT_APPS setting not set"));
    }
    if settings.tenant_model.is_none() {
        findings.push(Finding::critical("TENANT_MODEL setting not set"));
    }
    if settings.shared_apps.is_none() {
        findings.push(Finding::critical("SHARED_APPS setting not set"));
    }
    if !settings
        .database_routers
        .iter()
        .any(|router| *router == options.sync_router)
    {
        findings.push(Finding::critical(format!(
            "{} setting must contain '{}'.",
            DATABASE_ROUTERS, options.sync_router
        )));
    }

    findings
}

fn check_install_order(installed: &[&str], options: &AuditOptions) -> Option<Finding> {
    let package_index = installed.iter().position(|app| *app == options.package)?;
    let first_core_index = installed
        .iter()
        .position(|app| options.core_apps.iter().any(|core| core == app))?;

    (first_core_index < package_index).then(|| {
        Finding::warning(format!(
            "You should put '{}' before any django core applications in INSTALLED_APPS.",
            options.package
        ))
        .with_obj(options.settings_obj.as_str())
        .with_hint(INSTALL_ORDER_HINT)
    })
}

fn check_app_lists(installed: &[&str], tenant_apps: &[String], shared_apps: &[String]) -> Vec<Finding> {
    let mut findings = Vec::new();

    if tenant_apps.is_empty() {
        findings.push(Finding::error("TENANT_APPS is empty.").with_hint("Maybe you don't need this app?"));
    }
    if shared_apps.is_empty() {
        findings.push(Finding::warning("SHARED_APPS is empty."));
    }

    let covered: Vec<&str> = tenant_apps
        .iter()
        .chain(shared_apps)
        .map(String::as_str)
        .collect();
    let uncovered = ordered_difference(installed, &covered);
    if !uncovered.is_empty() {
        findings.push(
            Finding::error(
                "You have INSTALLED_APPS that are not in either of TENANT_APPS or SHARED_APPS",
            )
            .with_hint(uncovered),
        );
    }

    let missing_tenant = ordered_difference(tenant_apps, installed);
    if !missing_tenant.is_empty() {
        findings.push(
            Finding::error("You have TENANT_APPS that are not in INSTALLED_APPS")
                .with_hint(missing_tenant),
        );
    }

    let missing_shared = ordered_difference(shared_apps, installed);
    if !missing_shared.is_empty() {
        findings.push(
            Finding::error("You have SHARED_APPS that are not in INSTALLED_APPS")
                .with_hint(missing_shared),
        );
    }

    findings
}

async fn check_extra_search_paths(
    settings: &TenancySettings,
    store: &dyn TenantStore,
) -> Result<Vec<Finding>, TenantError> {
    let extra = &settings.pg_extra_search_paths;
    let public = settings.public_schema_name.as_str();
    let mut findings = Vec::new();

    if extra.is_empty() {
        return Ok(findings);
    }

    if extra.iter().any(|schema| schema == public) {
        findings.push(Finding::critical(format!(
            "{} can not be included on {}.",
            public, PG_EXTRA_SEARCH_PATHS
        )));
    }

    // The public tenant row, if any, is already reported above.
    let tenant_schemas: Vec<String> = store
        .schema_names()
        .await?
        .into_iter()
        .filter(|schema| schema != public)
        .collect();

    let leaked = ordered_intersection(extra, &tenant_schemas);
    if !leaked.is_empty() {
        findings.push(Finding::critical(format!(
            "Do not include tenant schemas ({}) on {}.",
            leaked.join(", "),
            PG_EXTRA_SEARCH_PATHS
        )));
    }

    Ok(findings)
}

/// Audits with a fixed store and options
pub struct Auditor {
    store: Arc<dyn TenantStore>,
    options: AuditOptions,
}

impl Auditor {
    pub fn new(store: Arc<dyn TenantStore>) -> Self {
        Self {
            store,
            options: AuditOptions::default(),
        }
    }

    pub fn with_options(mut self, options: AuditOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &AuditOptions {
        &self.options
    }

    pub async fn audit(
        &self,
        registry: &AppRegistry,
        settings: &TenancySettings,
    ) -> Result<Vec<Finding>, TenantError> {
        audit_with(registry, settings, self.store.as_ref(), &self.options).await
    }

    /// Audit, then fail if any finding is critical.
    ///
    /// Returns the non-critical findings for the host to report.
    pub async fn check_startup(
        &self,
        registry: &AppRegistry,
        settings: &TenancySettings,
    ) -> Result<Vec<Finding>, TenantError> {
        let findings = self.audit(registry, settings).await?;
        ensure_no_critical(&findings)?;
        Ok(findings)
    }
}
