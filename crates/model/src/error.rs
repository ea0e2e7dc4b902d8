/// The kind of error that occurred.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The provider could not serve the request (unreachable, rate
    /// limited, or out of quota).
    Unavailable,
    /// The provider refused the request (e.g. the content is moderated).
    Rejected,
    /// Any other errors.
    Other,
}
