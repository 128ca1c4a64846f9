//! Order lifecycle services
pub mod checkout;
pub mod confirmation;
pub mod events;
pub mod history;
pub mod ledger;

pub use checkout::{CheckoutOrchestrator, CheckoutOutcome, CheckoutRequest, CheckoutSettings};
pub use confirmation::{PaymentConfirmationHandler, WebhookOutcome};
pub use events::EventPublisher;
pub use history::OrderHistory;
pub use ledger::{OrderLedger, StockReconciler};
