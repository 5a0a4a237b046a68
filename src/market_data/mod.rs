pub mod session;
pub mod synthetic;

pub use session::TradingSession;
pub use synthetic::SyntheticSeriesGenerator;
