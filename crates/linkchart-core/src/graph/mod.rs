mod builder;
mod types;

pub use builder::build;
pub use types::*;

#[cfg(test)]
mod tests;
