pub mod money;
pub mod pagination;
pub mod signature;
pub mod time;
