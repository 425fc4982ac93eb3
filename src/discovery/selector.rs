//! Module selection for registration.
//!
//! Accepted forms:
//! - no selectors - every scannable module in the catalog
//! - only [`ModuleSelector::Module`] - exactly those modules
//! - only [`ModuleSelector::Prefix`] - scannable catalog modules whose name
//!   starts with one of the prefixes
//!
//! Mixing the two kinds is rejected with [`MediatorError::InvalidInput`].

use std::sync::Arc;

use super::{HandlerModule, ModuleCatalog, Registrar};
use crate::error::{MediatorError, Result};
use crate::handler::HandlerRegistry;

/// One entry of a registration selector list.
#[derive(Clone)]
pub enum ModuleSelector {
    /// A module passed by reference.
    Module(Arc<dyn HandlerModule>),
    /// A module name prefix.
    Prefix(String),
}

impl ModuleSelector {
    /// Select a module by reference.
    pub fn module<M: HandlerModule + 'static>(module: M) -> Self {
        ModuleSelector::Module(Arc::new(module))
    }

    /// Select modules by name prefix.
    pub fn prefix(prefix: impl Into<String>) -> Self {
        ModuleSelector::Prefix(prefix.into())
    }
}

impl From<&str> for ModuleSelector {
    fn from(prefix: &str) -> Self {
        ModuleSelector::Prefix(prefix.to_string())
    }
}

impl From<String> for ModuleSelector {
    fn from(prefix: String) -> Self {
        ModuleSelector::Prefix(prefix)
    }
}

impl From<Arc<dyn HandlerModule>> for ModuleSelector {
    fn from(module: Arc<dyn HandlerModule>) -> Self {
        ModuleSelector::Module(module)
    }
}

impl std::fmt::Debug for ModuleSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModuleSelector::Module(m) => f.debug_tuple("Module").field(&m.name()).finish(),
            ModuleSelector::Prefix(p) => f.debug_tuple("Prefix").field(p).finish(),
        }
    }
}

/// Pick the modules a selector list refers to.
pub fn resolve_modules(
    catalog: &ModuleCatalog,
    selectors: &[ModuleSelector],
) -> Result<Vec<Arc<dyn HandlerModule>>> {
    if selectors.is_empty() {
        return Ok(catalog.scannable().cloned().collect());
    }

    let mut modules = Vec::new();
    let mut prefixes = Vec::new();
    for selector in selectors {
        match selector {
            ModuleSelector::Module(m) => modules.push(m.clone()),
            ModuleSelector::Prefix(p) => prefixes.push(p.as_str()),
        }
    }

    if !modules.is_empty() && !prefixes.is_empty() {
        return Err(MediatorError::InvalidInput(
            "mixed module selectors; use no selectors, only modules, or only name prefixes"
                .to_string(),
        ));
    }

    if !modules.is_empty() {
        return Ok(modules);
    }

    Ok(catalog
        .scannable()
        .filter(|m| prefixes.iter().any(|p| m.name().starts_with(p)))
        .cloned()
        .collect())
}

/// Register every module's handlers into `registry`, in order.
pub fn register_modules(
    registry: &mut HandlerRegistry,
    modules: &[Arc<dyn HandlerModule>],
) -> Result<()> {
    for module in modules {
        let name = module.name();
        tracing::debug!("Registering handlers from module {}", name);
        let mut registrar = Registrar::new(registry, name);
        module.register(&mut registrar)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::FnModule;

    fn empty(name: &str) -> FnModule<impl Fn(&mut Registrar<'_>) -> Result<()> + Send + Sync> {
        FnModule::new(name, |_| Ok(()))
    }

    fn catalog() -> ModuleCatalog {
        ModuleCatalog::new()
            .with(empty("shop.orders"))
            .with(empty("shop.billing"))
            .with(empty("admin.users"))
            .with(empty("shop.generated").dynamic())
            .with(empty("  "))
    }

    fn names(modules: &[Arc<dyn HandlerModule>]) -> Vec<String> {
        modules.iter().map(|m| m.name().to_string()).collect()
    }

    #[test]
    fn test_no_selectors_scans_catalog() {
        let modules = resolve_modules(&catalog(), &[]).unwrap();
        assert_eq!(
            names(&modules),
            vec!["shop.orders", "shop.billing", "admin.users"]
        );
    }

    #[test]
    fn test_prefix_selectors() {
        let modules = resolve_modules(&catalog(), &[ModuleSelector::prefix("shop.")]).unwrap();
        assert_eq!(names(&modules), vec!["shop.orders", "shop.billing"]);
    }

    #[test]
    fn test_multiple_prefixes_keep_catalog_order() {
        let selectors = [ModuleSelector::prefix("admin"), ModuleSelector::prefix("shop.o")];
        let modules = resolve_modules(&catalog(), &selectors).unwrap();
        assert_eq!(names(&modules), vec!["shop.orders", "admin.users"]);
    }

    #[test]
    fn test_prefix_without_match() {
        let modules = resolve_modules(&catalog(), &[ModuleSelector::prefix("reports")]).unwrap();
        assert!(modules.is_empty());
    }

    #[test]
    fn test_module_selectors_used_as_given() {
        let selectors = [
            ModuleSelector::module(empty("standalone")),
            ModuleSelector::module(empty("other").dynamic()),
        ];
        let modules = resolve_modules(&catalog(), &selectors).unwrap();
        assert_eq!(names(&modules), vec!["standalone", "other"]);
    }

    #[test]
    fn test_mixed_selectors_rejected() {
        let selectors = [ModuleSelector::module(empty("standalone")), "shop".into()];
        let Err(err) = resolve_modules(&catalog(), &selectors) else {
            panic!("mixed selectors accepted");
        };

        match err {
            MediatorError::InvalidInput(msg) => {
                assert!(msg.contains("no selectors"));
                assert!(msg.contains("only modules"));
                assert!(msg.contains("only name prefixes"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_register_modules_stops_on_error() {
        let failing = FnModule::new("broken", |_| {
            Err(MediatorError::InvalidInput("broken module".to_string()))
        });
        let modules: Vec<Arc<dyn HandlerModule>> = vec![Arc::new(failing)];

        let mut registry = HandlerRegistry::new();
        assert!(register_modules(&mut registry, &modules).is_err());
    }

    #[test]
    fn test_shared_module_selected_by_reference() {
        let shared: Arc<dyn HandlerModule> = Arc::new(empty("shop.shared"));
        let mut catalog = catalog();
        catalog.add_shared(shared.clone());

        assert_eq!(catalog.iter().count(), 6);
        assert_eq!(catalog.len(), 6);

        let scanned = resolve_modules(&catalog, &[ModuleSelector::prefix("shop.s")]).unwrap();
        assert_eq!(names(&scanned), vec!["shop.shared"]);

        let selected = resolve_modules(&catalog, &[ModuleSelector::from(shared.clone())]).unwrap();
        assert_eq!(selected.len(), 1);
        assert!(Arc::ptr_eq(&selected[0], &shared));
    }

    #[test]
    fn test_registrar_reports_module_name() {
        let seen = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let modules: Vec<Arc<dyn HandlerModule>> = ["shop.orders", "admin.users"]
            .into_iter()
            .map(|name| {
                let seen = seen.clone();
                Arc::new(FnModule::new(name, move |r| {
                    seen.lock().push(r.module_name().to_string());
                    Ok(())
                })) as Arc<dyn HandlerModule>
            })
            .collect();

        let mut registry = HandlerRegistry::new();
        register_modules(&mut registry, &modules).unwrap();

        assert_eq!(*seen.lock(), vec!["shop.orders", "admin.users"]);
    }
}
