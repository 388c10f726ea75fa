//! # Pipeline stages.
//!
//! A [`Stage`] is one named processing step of the pipeline. The set is fixed at
//! compile time and enumerated in a stable order ([`Stage::ALL`]) which the
//! quiescence barrier walks front to back.
//!
//! ## Transfer latency
//! ```text
//! soc     1s  (+1s mount per fan-out)
//! sail    5s
//! vip    10s
//! switch 15s
//! ```

use std::{fmt, str::FromStr, time::Duration};

use crate::error::ParseStageError;

/// Time needed to mount a relayed packet on the entry stage before it fans out.
pub const MOUNT_LATENCY: Duration = Duration::from_secs(1);

/// Named processing step of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Stage {
    /// Entry stage: relays packets to both SoCs and fans out mounted ones.
    Soc,
    /// Sail domain controller.
    Sail,
    /// VIP domain controller.
    Vip,
    /// Ethernet switch, the deepest and slowest stage.
    Switch,
}

impl Stage {
    /// Number of stages.
    pub const COUNT: usize = 4;

    /// Every stage in enumeration order.
    pub const ALL: [Stage; Stage::COUNT] = [Stage::Soc, Stage::Sail, Stage::Vip, Stage::Switch];

    /// Stage that receives seeded packets.
    pub const ENTRY: Stage = Stage::Soc;

    /// Returns the wire name of the stage (`"soc"`, `"sail"`, ...).
    pub const fn as_str(self) -> &'static str {
        match self {
            Stage::Soc => "soc",
            Stage::Sail => "sail",
            Stage::Vip => "vip",
            Stage::Switch => "switch",
        }
    }

    /// Position of the stage in [`Stage::ALL`].
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Fixed time it takes to forward one packet to this stage.
    pub const fn transfer_latency(self) -> Duration {
        match self {
            Stage::Soc => Duration::from_secs(1),
            Stage::Sail => Duration::from_secs(5),
            Stage::Vip => Duration::from_secs(10),
            Stage::Switch => Duration::from_secs(15),
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Stage {
    type Err = ParseStageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Stage::ALL
            .into_iter()
            .find(|stage| stage.as_str() == s)
            .ok_or_else(|| ParseStageError(s.to_string()))
    }
}
