// Adapters layer: concrete implementations of the domain ports on top of the AWS SDK.

#[cfg(feature = "aws")]
pub mod sdk;
#[cfg(feature = "aws")]
pub mod ec2;
#[cfg(feature = "aws")]
pub mod pricing;

#[cfg(feature = "aws")]
pub use ec2::{AwsSession, Ec2VolumeInventory};
#[cfg(feature = "aws")]
pub use pricing::AwsPricingClient;
