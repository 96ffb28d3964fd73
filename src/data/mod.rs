pub mod loader;
pub mod symbol;
pub mod types;

pub use loader::{LoaderError, TickLoader, REQUIRED_COLUMNS};
pub use symbol::{strike_from_symbol, OccSymbol, SymbolError};
pub use types::{OptionType, Tick, TickGroups, TickStream};
