pub mod report;
pub mod scanners;
