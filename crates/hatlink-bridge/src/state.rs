//! Last-observed value per input channel.
//!
//! Each polling task owns one [`ChannelState`] for its channel group and is
//! the only writer, so no lock is involved. Channels start at zero, which
//! means a line that is already high at startup is reported on the first
//! cycle.

use hatlink_core::ChangePolicy;

/// A sampled value that can be compared against its predecessor.
pub trait Reading: Copy + Default + PartialEq + std::fmt::Debug {
    /// Whether `current` should be reported given the last reported value.
    fn is_change(previous: Self, current: Self, policy: ChangePolicy) -> bool;
}

impl Reading for u8 {
    /// Digital levels are compared exactly; the policy does not apply.
    fn is_change(previous: Self, current: Self, _policy: ChangePolicy) -> bool {
        previous != current
    }
}

impl Reading for f32 {
    fn is_change(previous: Self, current: Self, policy: ChangePolicy) -> bool {
        policy.is_change(previous, current)
    }
}

/// Per-channel memory of the last reported value.
///
/// # Examples
///
/// ```
/// use hatlink_bridge::ChannelState;
/// use hatlink_core::ChangePolicy;
///
/// let mut state = ChannelState::<f32>::new(3);
/// assert_eq!(state.observe(0, 1.5, ChangePolicy::Exact), Some(0.0));
/// assert_eq!(state.observe(0, 1.5, ChangePolicy::Exact), None);
/// assert_eq!(state.get(0), Some(1.5));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelState<T> {
    values: Vec<T>,
}

impl<T: Reading> ChannelState<T> {
    /// State for `count` channels, all unset (zero).
    pub fn new(count: usize) -> Self {
        Self {
            values: vec![T::default(); count],
        }
    }

    /// Record a sample.
    ///
    /// Returns the previous value when the sample counts as a change, in
    /// which case the stored value advances to `value`. Returns `None` and
    /// leaves the state untouched otherwise, including for unknown channels.
    pub fn observe(&mut self, index: usize, value: T, policy: ChangePolicy) -> Option<T> {
        let slot = self.values.get_mut(index)?;
        if !T::is_change(*slot, value, policy) {
            return None;
        }
        Some(std::mem::replace(slot, value))
    }

    pub fn get(&self, index: usize) -> Option<T> {
        self.values.get(index).copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
