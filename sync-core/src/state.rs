//! Channel lifecycle state machine.
//!
//! Every relay peer channel moves through `Connecting → Registered → Closed`.
//! The machine is pure: it takes events and returns the new state plus the
//! actions the caller must perform. Because `Closed` absorbs every event,
//! deregistration and close are emitted exactly once no matter how many
//! failures race to report the same dead channel.

/// Channel state machine - NO I/O, just state transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    /// Transport handshake in progress.
    Connecting,
    /// Member of the relay's peer set.
    Registered,
    /// Torn down; terminal.
    Closed,
}

impl ChannelState {
    /// Create a new state machine in the Connecting state.
    pub fn new() -> Self {
        Self::Connecting
    }

    /// Process an event and return the new state plus actions to execute.
    pub fn on_event(self, event: ChannelEvent) -> (Self, Vec<ChannelAction>) {
        match (self, event) {
            (Self::Connecting, ChannelEvent::Upgraded) => {
                (Self::Registered, vec![ChannelAction::Register])
            }
            (Self::Connecting, _) => (Self::Closed, vec![ChannelAction::Close]),

            (Self::Registered, ChannelEvent::Upgraded) => (Self::Registered, vec![]),
            (Self::Registered, _) => (
                Self::Closed,
                vec![ChannelAction::Deregister, ChannelAction::Close],
            ),

            (Self::Closed, _) => (Self::Closed, vec![]),
        }
    }

    /// Check if the channel is in the peer set.
    pub fn is_registered(&self) -> bool {
        matches!(self, Self::Registered)
    }

    /// Check if the channel has been torn down.
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Closed)
    }
}

impl Default for ChannelState {
    fn default() -> Self {
        Self::new()
    }
}

/// Events in a channel's life.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelEvent {
    /// Transport handshake completed.
    Upgraded,
    /// Reading the next frame failed or the peer closed the channel.
    ReadFailed {
        /// Error message describing the failure.
        reason: String,
    },
    /// Nothing was received before the read deadline.
    ReadTimedOut,
    /// A write to this channel failed or missed its deadline.
    SendFailed {
        /// Error message describing the failure.
        reason: String,
    },
}

/// Actions to be executed by the relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelAction {
    /// Add the channel to the peer set.
    Register,
    /// Remove the channel from the peer set.
    Deregister,
    /// Release the underlying transport.
    Close,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_failed() -> ChannelEvent {
        ChannelEvent::ReadFailed {
            reason: "connection reset".into(),
        }
    }

    #[test]
    fn starts_connecting() {
        assert_eq!(ChannelState::new(), ChannelState::Connecting);
    }

    #[test]
    fn upgrade_registers() {
        let (state, actions) = ChannelState::Connecting.on_event(ChannelEvent::Upgraded);
        assert!(state.is_registered());
        assert_eq!(actions, vec![ChannelAction::Register]);
    }

    #[test]
    fn failure_before_upgrade_only_closes() {
        let (state, actions) = ChannelState::Connecting.on_event(read_failed());
        assert!(state.is_closed());
        assert_eq!(actions, vec![ChannelAction::Close]);
    }

    #[test]
    fn read_error_deregisters_and_closes() {
        let (state, actions) = ChannelState::Registered.on_event(read_failed());
        assert!(state.is_closed());
        assert_eq!(
            actions,
            vec![ChannelAction::Deregister, ChannelAction::Close]
        );
    }

    #[test]
    fn deadline_and_send_failure_also_close() {
        let (state, _) = ChannelState::Registered.on_event(ChannelEvent::ReadTimedOut);
        assert!(state.is_closed());

        let (state, actions) = ChannelState::Registered.on_event(ChannelEvent::SendFailed {
            reason: "write deadline exceeded".into(),
        });
        assert!(state.is_closed());
        assert!(actions.contains(&ChannelAction::Deregister));
    }

    #[test]
    fn teardown_happens_exactly_once() {
        let (state, first) = ChannelState::Registered.on_event(ChannelEvent::ReadTimedOut);
        let (state, second) = state.on_event(read_failed());
        let (state, third) = state.on_event(ChannelEvent::Upgraded);

        assert_eq!(first.len(), 2);
        assert!(second.is_empty());
        assert!(third.is_empty());
        assert!(state.is_closed());
    }

    #[test]
    fn repeated_upgrade_is_ignored() {
        let (state, actions) = ChannelState::Registered.on_event(ChannelEvent::Upgraded);
        assert!(state.is_registered());
        assert!(actions.is_empty());
    }
}
