use core::fmt::{self, Display, Formatter};
use futures::task::SpawnError;

pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Everything that can abort a variant picker operation.
///
/// Data-integrity variants ([`MissingOptionValueId`](`Error::MissingOptionValueId`), [`MissingPickerSource`](`Error::MissingPickerSource`), [`MissingMain`](`Error::MissingMain`))
/// point at server-rendered markup that doesn't follow the picker's contract.
/// They abort the current operation only; the picker stays usable for the next change.
#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("no option value ID found on a selected option")]
	MissingOptionValueId,

	#[error("target element not found for option value ID {0:?}")]
	TargetNotFound(String),

	#[error("no option found for select value {0:?}")]
	OptionNotFound(String),

	#[error("no new <{0}> source found in the fetched document")]
	MissingPickerSource(String),

	#[error("no new main source found")]
	MissingMain,

	#[error("invalid variant payload: {0}")]
	Payload(#[from] serde_json::Error),

	#[error("invalid URL: {0}")]
	Url(#[from] url::ParseError),

	#[error(transparent)]
	Fetch(#[from] FetchError),

	#[error("DOM operation failed: {0}")]
	Dom(String),

	#[error("could not spawn the update task: {0}")]
	Spawn(#[from] SpawnError),
}

impl Error {
	pub fn dom(message: impl Into<String>) -> Self {
		Self::Dom(message.into())
	}

	/// Whether this error means the markup broke the picker's data contract.
	#[must_use]
	pub fn is_integrity_violation(&self) -> bool {
		matches!(self, Self::MissingOptionValueId | Self::MissingPickerSource(_) | Self::MissingMain)
	}
}

/// A failed (not cancelled) network request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchError {
	message: String,
}

impl FetchError {
	pub fn new(message: impl Into<String>) -> Self {
		Self { message: message.into() }
	}

	#[must_use]
	pub fn message(&self) -> &str {
		&self.message
	}
}

impl Display for FetchError {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		write!(f, "fetch failed: {}", self.message)
	}
}

impl std::error::Error for FetchError {}
