//! Business services for the purchase flow.

pub mod activation;
pub mod downloads;
pub mod events;
pub mod marketing;

pub use activation::ActivationService;
pub use downloads::DownloadLinkSigner;
pub use events::{EventBus, PurchaseEvent};
pub use marketing::MarketingHub;
