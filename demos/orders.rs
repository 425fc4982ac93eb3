//! Orders demo - request/response and notification fan-out.
//!
//! This example demonstrates:
//! - Grouping handlers into modules and selecting them by name prefix
//! - A singleton store and a scoped unit of work per call
//! - `send` for a query and `publish` for an event with two observers
//!
//! ```text
//! RUST_LOG=mediator=trace cargo run --example orders
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use mediator::discovery::{FnModule, ModuleCatalog, ModuleSelector};
use mediator::{
    Injectable, Mediator, Notification, NotificationHandler, Request, RequestHandler, Scope,
};
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

/// Query for an order total.
struct GetOrderTotal {
    order_id: u64,
}

impl Request for GetOrderTotal {
    type Response = Option<u64>;
}

/// Event raised once an order is stored.
struct OrderPlaced {
    order_id: u64,
    total: u64,
}

impl Notification for OrderPlaced {}

/// Shared order totals.
#[derive(Default)]
struct OrderStore {
    totals: Mutex<Vec<(u64, u64)>>,
}

/// Per-call unit of work.
struct UnitOfWork {
    store: Arc<OrderStore>,
}

impl Drop for UnitOfWork {
    fn drop(&mut self) {
        tracing::info!("Unit of work released");
    }
}

struct GetOrderTotalHandler {
    uow: Arc<UnitOfWork>,
}

impl Injectable for GetOrderTotalHandler {
    fn inject(scope: &Scope) -> mediator::Result<Self> {
        Ok(Self {
            uow: scope.resolve()?,
        })
    }
}

#[async_trait]
impl RequestHandler<GetOrderTotal> for GetOrderTotalHandler {
    async fn handle(&self, req: GetOrderTotal, _cancel: CancellationToken) -> anyhow::Result<Option<u64>> {
        let totals = self.uow.store.totals.lock();
        Ok(totals
            .iter()
            .find(|(id, _)| *id == req.order_id)
            .map(|(_, total)| *total))
    }
}

struct RecordOrder {
    uow: Arc<UnitOfWork>,
}

impl Injectable for RecordOrder {
    fn inject(scope: &Scope) -> mediator::Result<Self> {
        Ok(Self {
            uow: scope.resolve()?,
        })
    }
}

#[async_trait]
impl NotificationHandler<OrderPlaced> for RecordOrder {
    async fn handle(&self, n: &OrderPlaced, _cancel: CancellationToken) -> anyhow::Result<()> {
        self.uow.store.totals.lock().push((n.order_id, n.total));
        Ok(())
    }
}

struct PrintReceipt;

impl Injectable for PrintReceipt {
    fn inject(_scope: &Scope) -> mediator::Result<Self> {
        Ok(PrintReceipt)
    }
}

#[async_trait]
impl NotificationHandler<OrderPlaced> for PrintReceipt {
    async fn handle(&self, n: &OrderPlaced, _cancel: CancellationToken) -> anyhow::Result<()> {
        println!("Receipt: order {} total {}", n.order_id, n.total);
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let catalog = ModuleCatalog::new()
        .with(FnModule::new("shop.orders", |r| {
            r.request_handler::<GetOrderTotal, GetOrderTotalHandler>()?
                .notification_handler::<OrderPlaced, RecordOrder>();
            Ok(())
        }))
        .with(FnModule::new("shop.receipts", |r| {
            r.notification_handler::<OrderPlaced, PrintReceipt>();
            Ok(())
        }))
        .with(FnModule::new("admin.tools", |_| Ok(())));

    let mediator = Mediator::builder()
        .singleton(OrderStore::default())
        .scoped(|scope| {
            Ok(UnitOfWork {
                store: scope.resolve()?,
            })
        })
        .register(&catalog, &[ModuleSelector::prefix("shop.")])?
        .build();

    mediator
        .publish(&OrderPlaced {
            order_id: 42,
            total: 1999,
        })
        .await?;

    let total = mediator.send(GetOrderTotal { order_id: 42 }).await?;
    println!("Order 42 total: {:?}", total);

    let missing = mediator.send(GetOrderTotal { order_id: 7 }).await?;
    println!("Order 7 total: {:?}", missing);

    Ok(())
}
