pub mod fake_registry;
pub mod test_harness;
