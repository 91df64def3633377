pub mod collect;
pub mod normalize;

use std::collections::BTreeMap;

pub use collect::Collector;
pub use normalize::normalize;

/// Normalized hardware facts: lower-cased key to comparable value.
///
/// Used for both the current machine's inventory and a profile's declared
/// facts, so the two can be compared key by key.
pub type Facts = BTreeMap<String, String>;

/// Key of the synthetic fact holding the number of real displays.
pub const MONITORS_KEY: &str = "monitors";

/// Something that can describe the hardware of the current host.
pub trait InventorySource {
    /// Collect and normalize the host's facts.
    fn collect(&self) -> crate::error::Result<Facts>;
}
