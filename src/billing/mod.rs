pub mod api;
pub mod gateway;
pub mod models;
pub mod plans;
pub mod purchase;
pub mod reconciler;
pub mod store;

pub use gateway::{CardHandle, CardSource, GatewayError, PaymentGateway, StripeLikeGateway};
pub use models::{
    FreezeKind, FreezeMarker, FreezeStatus, LiftTarget, ReconcileOutcome, RetryDisposition,
    SkipReason,
};
pub use plans::{PackagePlan, PlanCatalog};
pub use purchase::{PackagePurchaseOrchestrator, PurchaseError, PurchaseReceipt, PurchaseStep};
pub use reconciler::{FreezeReconciler, ReconcileError};
pub use store::{FreezeStore, PgFreezeStore};
