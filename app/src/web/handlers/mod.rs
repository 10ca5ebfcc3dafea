// app/src/web/handlers/mod.rs

pub mod product_handlers;
pub mod storage_handlers;
