//! Connection-box flexibility (FC) resolution.
//!
//! Every non-global port of a tile connects each of its bits to some number
//! of tracks in the adjacent channel. The number is resolved, most specific
//! first, from a per-port override, a per-block default for the port's
//! direction, and the global default for that direction.

use std::collections::BTreeMap;
use weft_arch::PortDirection;
use weft_config::{FcValue, RoutingConfig};

/// An FC value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Fc {
    /// Fraction of the channel width.
    Fraction(f64),
    /// Absolute number of tracks.
    Tracks(u32),
}

impl Fc {
    /// Converts to a track count for a channel of `channel_width` tracks.
    ///
    /// Fractions round up; both forms are capped at the channel width.
    pub fn tracks(self, channel_width: u32) -> u32 {
        match self {
            Fc::Fraction(f) => {
                // Absorb float noise such as 0.1 * 30 = 3.0000000000000004.
                let exact = f * f64::from(channel_width) - 1e-9;
                (exact.ceil().max(0.0) as u32).min(channel_width)
            }
            Fc::Tracks(n) => n.min(channel_width),
        }
    }
}

impl From<FcValue> for Fc {
    fn from(value: FcValue) -> Self {
        match value {
            FcValue::Fraction(f) => Fc::Fraction(f),
            FcValue::Tracks(n) => Fc::Tracks(n),
        }
    }
}

/// FC overrides for one block.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BlockFc {
    /// FC for input ports.
    pub fc_in: Option<Fc>,
    /// FC for output ports.
    pub fc_out: Option<Fc>,
    /// FC for individual ports.
    pub ports: BTreeMap<String, Fc>,
}

impl BlockFc {
    /// Creates overrides for both directions.
    pub fn new(fc_in: Fc, fc_out: Fc) -> Self {
        Self {
            fc_in: Some(fc_in),
            fc_out: Some(fc_out),
            ports: BTreeMap::new(),
        }
    }

    /// Adds a per-port override.
    pub fn with_port(mut self, port: impl Into<String>, fc: Fc) -> Self {
        self.ports.insert(port.into(), fc);
        self
    }
}

/// Default FC values plus per-block overrides.
#[derive(Debug, Clone, PartialEq)]
pub struct FcTable {
    /// Default FC for input ports.
    pub fc_in: Fc,
    /// Default FC for output ports.
    pub fc_out: Fc,
    /// Overrides keyed by block name.
    pub blocks: BTreeMap<String, BlockFc>,
}

impl Default for FcTable {
    fn default() -> Self {
        Self::new(Fc::Fraction(0.25), Fc::Fraction(0.5))
    }
}

impl FcTable {
    /// Creates a table with the given defaults and no overrides.
    pub fn new(fc_in: Fc, fc_out: Fc) -> Self {
        Self {
            fc_in,
            fc_out,
            blocks: BTreeMap::new(),
        }
    }

    /// Adds overrides for a block.
    pub fn with_block(mut self, block: impl Into<String>, fc: BlockFc) -> Self {
        self.blocks.insert(block.into(), fc);
        self
    }

    /// Resolves the FC of `port` on `block`.
    pub fn resolve(&self, block: &str, port: &str, direction: PortDirection) -> Fc {
        let overrides = self.blocks.get(block);
        if let Some(&fc) = overrides.and_then(|o| o.ports.get(port)) {
            return fc;
        }
        let block_default = overrides.and_then(|o| match direction {
            PortDirection::Input => o.fc_in,
            PortDirection::Output => o.fc_out,
        });
        block_default.unwrap_or(match direction {
            PortDirection::Input => self.fc_in,
            PortDirection::Output => self.fc_out,
        })
    }
}

impl From<&RoutingConfig> for FcTable {
    fn from(config: &RoutingConfig) -> Self {
        let blocks = config
            .blocks
            .iter()
            .map(|(name, block)| {
                let fc = BlockFc {
                    fc_in: block.fc_in.map(Fc::from),
                    fc_out: block.fc_out.map(Fc::from),
                    ports: block
                        .ports
                        .iter()
                        .map(|(port, &fc)| (port.clone(), Fc::from(fc)))
                        .collect(),
                };
                (name.clone(), fc)
            })
            .collect();
        Self {
            fc_in: config.fc_in.into(),
            fc_out: config.fc_out.into(),
            blocks,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fraction_rounds_up() {
        assert_eq!(Fc::Fraction(0.25).tracks(20), 5);
        assert_eq!(Fc::Fraction(0.25).tracks(18), 5);
        assert_eq!(Fc::Fraction(0.1).tracks(30), 3);
        assert_eq!(Fc::Fraction(0.0).tracks(30), 0);
        assert_eq!(Fc::Fraction(1.0).tracks(30), 30);
    }

    #[test]
    fn tracks_capped_at_channel_width() {
        assert_eq!(Fc::Tracks(4).tracks(20), 4);
        assert_eq!(Fc::Tracks(40).tracks(20), 20);
    }

    #[test]
    fn resolution_precedence() {
        let table = FcTable::default().with_block(
            "clb",
            BlockFc {
                fc_in: None,
                fc_out: Some(Fc::Fraction(0.25)),
                ports: BTreeMap::new(),
            }
            .with_port("cin", Fc::Tracks(0)),
        );
        assert_eq!(table.resolve("clb", "cin", PortDirection::Input), Fc::Tracks(0));
        assert_eq!(
            table.resolve("clb", "oa0", PortDirection::Output),
            Fc::Fraction(0.25)
        );
        assert_eq!(
            table.resolve("clb", "ia0", PortDirection::Input),
            Fc::Fraction(0.25)
        );
        assert_eq!(
            table.resolve("iob", "inpad", PortDirection::Output),
            Fc::Fraction(0.5)
        );
    }

    #[test]
    fn from_routing_config() {
        let config = weft_config::load_config_from_str(
            r#"
[project]
name = "t"
[routing]
fc_in = 3
[routing.blocks.bram]
fc_out = 0.75
ports = { we1 = 2 }
"#,
        )
        .unwrap();
        let table = FcTable::from(&config.routing);
        assert_eq!(table.fc_in, Fc::Tracks(3));
        assert_eq!(table.fc_out, Fc::Fraction(0.5));
        assert_eq!(table.resolve("bram", "we1", PortDirection::Input), Fc::Tracks(2));
        assert_eq!(
            table.resolve("bram", "out1", PortDirection::Output),
            Fc::Fraction(0.75)
        );
    }
}
