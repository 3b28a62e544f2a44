pub mod commands;
pub mod logging_sink;
pub mod paper_account;
pub mod registry;
pub mod trader_actor;
pub mod trader_handle;

pub use commands::{TraderCommand, TraderState, TraderStatus};
pub use logging_sink::{execution_order, LoggingSink};
pub use paper_account::PaperAccount;
pub use registry::TraderRegistry;
pub use trader_actor::{TraderActor, TraderServices, SHARPE_LOOKBACK};
pub use trader_handle::TraderHandle;
