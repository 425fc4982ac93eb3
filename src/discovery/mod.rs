//! Discovery module - which handlers get registered.
//!
//! Handlers live in [`HandlerModule`]s. The host collects its modules in a
//! [`ModuleCatalog`] and picks from it with a [`ModuleSelector`] list at
//! registration time.
//!
//! # Example
//!
//! ```ignore
//! use mediator::discovery::{FnModule, ModuleCatalog, ModuleSelector};
//! use mediator::Mediator;
//!
//! let catalog = ModuleCatalog::new()
//!     .with(FnModule::new("shop.orders", |r| {
//!         r.request_handler::<PlaceOrder, PlaceOrderHandler>()?;
//!         Ok(())
//!     }))
//!     .with(FnModule::new("admin.users", |r| {
//!         r.request_handler::<GetUser, GetUserHandler>()?;
//!         Ok(())
//!     }));
//!
//! // Only modules whose name starts with "shop."
//! let mediator = Mediator::builder()
//!     .register(&catalog, &[ModuleSelector::prefix("shop.")])?
//!     .build();
//! ```

mod module;
mod registrar;
mod selector;

pub use module::{FnModule, HandlerModule, ModuleCatalog};
pub use registrar::Registrar;
pub use selector::{register_modules, resolve_modules, ModuleSelector};
