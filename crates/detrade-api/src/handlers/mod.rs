pub mod prices;
pub mod vaults;

pub use prices::*;
pub use vaults::*;
