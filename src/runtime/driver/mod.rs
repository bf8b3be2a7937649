pub mod cli;
pub mod socket;
