pub mod subgraph_event;
pub mod vault;

pub use subgraph_event::SubgraphEvent;
pub use vault::Vault;
