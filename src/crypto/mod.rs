pub mod envelope;
pub mod keys;
pub mod random;
