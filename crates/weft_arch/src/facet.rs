//! Facets: named aspects of an architecture that passes complete.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// An aspect of the architecture that some pass completes.
///
/// Passes declare facets they require, produce and forbid; the flow checks
/// those declarations against the context's [`FacetSet`] before each pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Facet {
    /// Connection boxes and port sides resolved per tile.
    RoutingBoxes,
    /// Switch library, connection-box muxes and switch boxes.
    Switches,
    /// Port, global and tunnel bindings.
    Connections,
    /// Structural Verilog emitted.
    RtlView,
    /// Configuration chain laid out.
    ConfigCircuitry,
    /// Architecture XML emitted.
    ArchDescription,
    /// Physical instances created.
    Physical,
    /// Memory write enables tied off.
    MemoryDefaults,
    /// Remaining undriven pins tied off.
    PinDefaults,
    /// Synthesis resources emitted.
    SynthResources,
}

impl Facet {
    /// All facets in pipeline order.
    pub const ALL: [Facet; 10] = [
        Facet::RoutingBoxes,
        Facet::Switches,
        Facet::Connections,
        Facet::RtlView,
        Facet::ConfigCircuitry,
        Facet::ArchDescription,
        Facet::Physical,
        Facet::MemoryDefaults,
        Facet::PinDefaults,
        Facet::SynthResources,
    ];

    /// Returns the kebab-case name.
    pub fn name(self) -> &'static str {
        match self {
            Facet::RoutingBoxes => "routing-boxes",
            Facet::Switches => "switches",
            Facet::Connections => "connections",
            Facet::RtlView => "rtl-view",
            Facet::ConfigCircuitry => "config-circuitry",
            Facet::ArchDescription => "arch-description",
            Facet::Physical => "physical",
            Facet::MemoryDefaults => "memory-defaults",
            Facet::PinDefaults => "pin-defaults",
            Facet::SynthResources => "synth-resources",
        }
    }
}

impl fmt::Display for Facet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The set of completed facets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetSet(BTreeSet<Facet>);

impl FacetSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if `facet` is complete.
    pub fn contains(&self, facet: Facet) -> bool {
        self.0.contains(&facet)
    }

    /// Marks `facet` complete. Returns `false` if it already was.
    pub fn insert(&mut self, facet: Facet) -> bool {
        self.0.insert(facet)
    }

    /// Iterates over completed facets in pipeline order.
    pub fn iter(&self) -> impl Iterator<Item = Facet> + '_ {
        self.0.iter().copied()
    }

    /// Returns the number of completed facets.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if no facet is complete.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<Facet> for FacetSet {
    fn from_iter<T: IntoIterator<Item = Facet>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_reports_novelty() {
        let mut set = FacetSet::new();
        assert!(set.insert(Facet::Switches));
        assert!(!set.insert(Facet::Switches));
        assert!(set.contains(Facet::Switches));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn iteration_follows_pipeline_order() {
        let set: FacetSet = [Facet::Physical, Facet::RoutingBoxes].into_iter().collect();
        let order: Vec<Facet> = set.iter().collect();
        assert_eq!(order, vec![Facet::RoutingBoxes, Facet::Physical]);
    }

    #[test]
    fn names_are_unique() {
        let names: BTreeSet<&str> = Facet::ALL.iter().map(|f| f.name()).collect();
        assert_eq!(names.len(), Facet::ALL.len());
    }
}
