pub mod compile;
pub mod dry_run;
pub mod error;
pub mod parse;
pub mod policy;
pub mod resolve;
pub mod wasm;
