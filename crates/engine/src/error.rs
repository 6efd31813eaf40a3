use crate::BootFailure;

/// A convenient type alias for `Result` with `E` = [`enum@Error`].
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Engine client failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
	/// The call failed in transit (worker gone, terminated, timed out...).
	#[error(transparent)]
	Transport(#[from] tally_rpc::Error),
	/// The engine replied with a value of the wrong shape.
	#[error("unexpected '{action}' response: {reason}")]
	Decode {
		/// Action whose response failed to decode.
		action: String,
		/// Decoder message.
		reason: String,
	},
	/// The engine could not be booted.
	#[error("{0}")]
	Boot(BootFailure),
}

impl Error {
	/// Returns the boot failure, if this is one.
	pub fn boot_failure(&self) -> Option<&BootFailure> {
		match self {
			Self::Boot(failure) => Some(failure),
			_ => None,
		}
	}
}
