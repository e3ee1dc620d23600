/// Offer/answer progress of one session.
///
/// Broadcaster: `Idle → LocalOfferCreated → AwaitingRemoteAnswer → Connected`.
/// Viewer: `Idle → RemoteOfferReceived → LocalAnswerCreated → AwaitingConnection → Connected`.
/// `Closed` is reachable from every state and is final.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NegotiationState {
    Idle,
    LocalOfferCreated,
    AwaitingRemoteAnswer,
    RemoteOfferReceived,
    LocalAnswerCreated,
    AwaitingConnection,
    Connected,
    Closed,
}

impl NegotiationState {
    pub fn is_terminal(self) -> bool {
        self == Self::Closed
    }

    /// Whether the transport already holds the other peer's description.
    pub fn has_remote_description(self) -> bool {
        matches!(
            self,
            Self::RemoteOfferReceived
                | Self::LocalAnswerCreated
                | Self::AwaitingConnection
                | Self::Connected
        )
    }

    /// Remote candidates are accepted once a local description exists.
    pub fn accepts_candidates(self) -> bool {
        matches!(
            self,
            Self::LocalOfferCreated
                | Self::AwaitingRemoteAnswer
                | Self::LocalAnswerCreated
                | Self::AwaitingConnection
                | Self::Connected
        )
    }
}
