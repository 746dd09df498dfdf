//! At most one current request per picker.
//!
//! Issuing a request replaces the cancellation slot first and only then aborts the previous handle,
//! so the new request can never be the one cancelled.
//! An aborted request's response is never applied, even if it already arrived.

use crate::error::FetchError;
use futures::future::{AbortHandle, Abortable, LocalBoxFuture};
use tracing::trace;

/// Issues HTTP GET requests and yields the response body.
///
/// Dropping the returned future should cancel the underlying request where the host can.
pub trait Fetch {
	fn get(&self, url: &str) -> LocalBoxFuture<'static, Result<String, FetchError>>;
}

/// Pending-request state: the base URL of the last issued request and its cancellation handle.
#[derive(Debug, Default)]
pub struct RequestCoordinator {
	pending_url: Option<String>,
	abort_handle: Option<AbortHandle>,
	generation: u64,
}

/// Identifies one issued request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket(u64);

impl RequestCoordinator {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// The base URL of a request that was issued but hasn't been applied yet.
	#[must_use]
	pub fn pending_url(&self) -> Option<&str> {
		self.pending_url.as_deref()
	}

	pub fn remember_pending_url(&mut self, url: String) {
		self.pending_url = Some(url);
	}

	pub fn clear_pending_url(&mut self) {
		self.pending_url = None;
	}

	/// Whether a request was issued and has neither been superseded nor finished.
	#[must_use]
	pub fn has_current_request(&self) -> bool {
		self.abort_handle.is_some()
	}

	/// Starts `url` on `fetch` and makes it the only current request.
	pub fn issue<F: Fetch + ?Sized>(&mut self, fetch: &F, url: &str) -> (Ticket, Abortable<LocalBoxFuture<'static, Result<String, FetchError>>>) {
		let (handle, registration) = AbortHandle::new_pair();
		if let Some(previous) = self.abort_handle.replace(handle) {
			trace!("Aborting the superseded request.");
			previous.abort();
		}
		self.generation += 1;
		(Ticket(self.generation), Abortable::new(fetch.get(url), registration))
	}

	/// Releases the cancellation handle of a completed request. Newer requests are left alone.
	pub fn finish(&mut self, ticket: Ticket) {
		if ticket == Ticket(self.generation) {
			self.abort_handle = None;
		}
	}
}

#[cfg(test)]
mod tests {
	use super::{Fetch, RequestCoordinator};
	use crate::error::FetchError;
	use futures::{
		executor::block_on,
		future::{self, Aborted, FutureExt, LocalBoxFuture},
	};

	struct Echo;
	impl Fetch for Echo {
		fn get(&self, url: &str) -> LocalBoxFuture<'static, Result<String, FetchError>> {
			future::ready(Ok(url.to_owned())).boxed_local()
		}
	}

	#[test]
	fn superseded_requests_are_aborted() {
		let mut coordinator = RequestCoordinator::new();
		let (first_ticket, first) = coordinator.issue(&Echo, "/a");
		let (second_ticket, second) = coordinator.issue(&Echo, "/b");

		assert_eq!(block_on(first), Err(Aborted));
		assert_eq!(block_on(second), Ok(Ok("/b".to_owned())));

		coordinator.finish(first_ticket);
		assert!(coordinator.has_current_request());
		coordinator.finish(second_ticket);
		assert!(!coordinator.has_current_request());
	}

	#[test]
	fn pending_url_is_remembered_until_cleared() {
		let mut coordinator = RequestCoordinator::new();
		assert_eq!(coordinator.pending_url(), None);
		coordinator.remember_pending_url("/products/b".to_owned());
		assert_eq!(coordinator.pending_url(), Some("/products/b"));
		coordinator.clear_pending_url();
		assert_eq!(coordinator.pending_url(), None);
	}
}
