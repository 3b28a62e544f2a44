pub mod account;
pub mod candle;
pub mod config;
pub mod config_loader;
pub mod config_watcher;
pub mod decision;
pub mod fill;
pub mod traits;

pub use account::{AccountState, CandidateCoin, PositionInfo, PositionSide};
pub use candle::{is_well_ordered, normalize_symbol, Candle, OpenInterest, Timeframe};
pub use config::{
    AppConfig, MarketConfig, ReasoningConfig, ReasoningProvider, RiskConfig, TraderConfig,
};
pub use config_loader::ConfigLoader;
pub use config_watcher::ConfigWatcher;
pub use decision::{Action, Decision};
pub use fill::{ClosedPosition, Fill};
pub use traits::{AccountSource, CandleSource, DecisionSink, FillLedger, ReasoningClient};
