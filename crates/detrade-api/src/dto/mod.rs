pub mod activity;
pub mod common;
pub mod price;
pub mod query;
pub mod response;
pub mod vault;

pub use activity::*;
pub use common::*;
pub use price::*;
pub use query::*;
pub use response::*;
pub use vault::*;
