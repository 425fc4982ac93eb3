//! Handler modules and the catalog a host scans.

use std::sync::Arc;

use super::Registrar;
use crate::error::Result;

/// A named unit of handlers.
///
/// The host lists its modules explicitly in a [`ModuleCatalog`]; nothing is
/// discovered implicitly.
pub trait HandlerModule: Send + Sync {
    /// Full module name, matched against prefix selectors.
    fn name(&self) -> &str;

    /// Dynamic modules are skipped by catalog scans (empty or prefix
    /// selectors) but can still be registered by reference.
    fn is_dynamic(&self) -> bool {
        false
    }

    /// Register this module's handlers.
    fn register(&self, registrar: &mut Registrar<'_>) -> Result<()>;
}

/// Module built from a name and a registration closure.
///
/// # Example
///
/// ```ignore
/// let billing = FnModule::new("shop.billing", |r| {
///     r.request_handler::<ChargeCard, ChargeCardHandler>()?;
///     r.notification_handler::<OrderPlaced, SendInvoice>();
///     Ok(())
/// });
/// ```
pub struct FnModule<F>
where
    F: Fn(&mut Registrar<'_>) -> Result<()> + Send + Sync,
{
    name: String,
    dynamic: bool,
    register: F,
}

impl<F> FnModule<F>
where
    F: Fn(&mut Registrar<'_>) -> Result<()> + Send + Sync,
{
    /// Create a new module.
    pub fn new(name: impl Into<String>, register: F) -> Self {
        Self {
            name: name.into(),
            dynamic: false,
            register,
        }
    }

    /// Mark the module as dynamic so catalog scans skip it.
    pub fn dynamic(mut self) -> Self {
        self.dynamic = true;
        self
    }
}

impl<F> HandlerModule for FnModule<F>
where
    F: Fn(&mut Registrar<'_>) -> Result<()> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn is_dynamic(&self) -> bool {
        self.dynamic
    }

    fn register(&self, registrar: &mut Registrar<'_>) -> Result<()> {
        (self.register)(registrar)
    }
}

/// The set of modules available to a host.
#[derive(Clone, Default)]
pub struct ModuleCatalog {
    modules: Vec<Arc<dyn HandlerModule>>,
}

impl ModuleCatalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a module, builder style.
    pub fn with<M: HandlerModule + 'static>(mut self, module: M) -> Self {
        self.add(module);
        self
    }

    /// Add a module.
    pub fn add<M: HandlerModule + 'static>(&mut self, module: M) {
        self.modules.push(Arc::new(module));
    }

    /// Add an already shared module.
    pub fn add_shared(&mut self, module: Arc<dyn HandlerModule>) {
        self.modules.push(module);
    }

    /// Modules in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn HandlerModule>> {
        self.modules.iter()
    }

    /// Modules a scan considers: not dynamic and with a non-blank name.
    pub fn scannable(&self) -> impl Iterator<Item = &Arc<dyn HandlerModule>> {
        self.modules.iter().filter(|m| {
            let keep = !m.is_dynamic() && !m.name().trim().is_empty();
            if !keep {
                tracing::debug!("Skipping module {:?} during scan", m.name());
            }
            keep
        })
    }

    /// Number of modules.
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Whether the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

impl std::fmt::Debug for ModuleCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.modules.iter().map(|m| m.name()))
            .finish()
    }
}
