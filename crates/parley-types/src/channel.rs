//! Transport channels and the bitmask used to combine them.
//!
//! A [`ChannelMask`] describes which channels an endpoint can use or which
//! channels a message may travel over. Medium propagation rules live here
//! too, since they are a fixed property of the physical channels.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::Medium;

/// A single physical or metaphysical transport channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum Channel {
    /// Line of sight: gestures, signals, writing.
    Vision,
    /// Sound: speech, calls, drums.
    Hearing,
    /// Electromagnetic: radio and similar.
    Em,
    /// Touch range: contact, scent, tapping.
    Proximity,
    /// Anything that ignores physics.
    Paranormal,
}

impl Channel {
    /// Every channel in bit order.
    pub const ALL: [Self; 5] = [
        Self::Vision,
        Self::Hearing,
        Self::Em,
        Self::Proximity,
        Self::Paranormal,
    ];

    /// The bit this channel occupies in a [`ChannelMask`].
    pub const fn bit(self) -> u8 {
        match self {
            Self::Vision => 1,
            Self::Hearing => 1 << 1,
            Self::Em => 1 << 2,
            Self::Proximity => 1 << 3,
            Self::Paranormal => 1 << 4,
        }
    }
}

/// A set of [`Channel`]s packed into one byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ChannelMask(pub u8);

impl ChannelMask {
    /// No channels.
    pub const NONE: Self = Self(0);
    /// Every defined channel.
    pub const ALL: Self = Self(0b1_1111);

    /// Mask containing exactly one channel.
    pub const fn only(channel: Channel) -> Self {
        Self(channel.bit())
    }

    /// Mask built from a list of channels.
    pub fn from_channels(channels: &[Channel]) -> Self {
        Self(channels.iter().fold(0, |acc, c| acc | c.bit()))
    }

    /// Whether the mask is empty.
    pub const fn is_empty(self) -> bool {
        self.0 & Self::ALL.0 == 0
    }

    /// Whether the mask includes `channel`.
    pub const fn contains(self, channel: Channel) -> bool {
        self.0 & channel.bit() != 0
    }

    /// Channels present in both masks.
    #[must_use]
    pub const fn intersect(self, other: Self) -> Self {
        Self(self.0 & other.0 & Self::ALL.0)
    }

    /// Channels present in either mask.
    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self((self.0 | other.0) & Self::ALL.0)
    }

    /// The channel with the lowest bit set, if any.
    pub fn lowest(self) -> Option<Channel> {
        Channel::ALL.into_iter().find(|c| self.contains(*c))
    }

    /// The first channel from `order` that the mask contains.
    pub fn first_in(self, order: &[Channel]) -> Option<Channel> {
        order.iter().copied().find(|c| self.contains(*c))
    }

    /// Iterate the channels in bit order.
    pub fn iter(self) -> impl Iterator<Item = Channel> {
        Channel::ALL.into_iter().filter(move |c| self.contains(*c))
    }

    /// Channels that propagate through `medium`.
    pub const fn carried_by(medium: Medium) -> Self {
        match medium {
            Medium::Gas => Self::ALL,
            Medium::Liquid => Self(
                Channel::Vision.bit()
                    | Channel::Hearing.bit()
                    | Channel::Proximity.bit()
                    | Channel::Paranormal.bit(),
            ),
            Medium::Vacuum => Self(
                Channel::Vision.bit()
                    | Channel::Em.bit()
                    | Channel::Proximity.bit()
                    | Channel::Paranormal.bit(),
            ),
        }
    }
}

impl From<Channel> for ChannelMask {
    fn from(channel: Channel) -> Self {
        Self::only(channel)
    }
}

/// Bitset of questions a clarify request asks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ClarifyMask(pub u8);

impl ClarifyMask {
    /// Nothing to ask.
    pub const NONE: Self = Self(0);
    /// The order names no target entity or position.
    pub const MISSING_TARGET: Self = Self(1);

    /// Whether no question bit is set.
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Whether every bit of `other` is set.
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0 && other.0 != 0
    }

    /// Set every bit of `other`.
    #[must_use]
    pub const fn with(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }
}
