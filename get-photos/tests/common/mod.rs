// Not every utils is used in every test, so we allow dead code
#![allow(unused_imports, dead_code)]

mod localstack;
mod test_setup;
pub use localstack::*;
pub use test_setup::*;
