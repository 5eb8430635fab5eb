/// RaceError covers everything the race core can reject. I/O plumbing around the core uses
/// anyhow instead.
#[derive(Debug, thiserror::Error)]
pub enum RaceError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("participant workers were already started")]
    WorkersAlreadyStarted,
    #[error("the race was already started")]
    RaceAlreadyStarted,
    #[error("the arrivals of this race are already consumed by another controller")]
    ArrivalsAlreadyTaken,
    #[error("participant {participant_id} does not take part in this race")]
    UnknownParticipant { participant_id: String },
    #[error("participant {participant_id} already has an arrival on the podium")]
    DuplicateArrival { participant_id: String },
    #[error("arrival of {participant_id} could not be delivered, arrivals channel closed")]
    ArrivalChannelClosed { participant_id: String },
    #[error("worker pool error: {0}")]
    WorkerPool(String),
}
