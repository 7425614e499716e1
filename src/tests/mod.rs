pub mod test_policy;
pub mod test_trainer;
