pub mod configuration;
pub mod landlord;
pub mod payment;
pub mod receipt;
pub mod section;
pub mod template;
pub mod tenant;
