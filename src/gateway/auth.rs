//! Session lifecycle: login, logout, and cached-profile access.

// self
use crate::{
	_prelude::*,
	error::HttpError,
	gateway::{Gateway, decode_json},
	http::{HttpTransport, TransportErrorMapper},
	obs::{self, CallKind, CallOutcome, CallSpan},
	session::{CredentialPair, SessionUser, Theme},
};

#[derive(Serialize)]
struct LoginRequest<'a> {
	username: &'a str,
	password: &'a str,
}

#[derive(Deserialize)]
struct LoginGrant {
	access: String,
	refresh: String,
	user: SessionUser,
}

impl<C, M> Gateway<C, M>
where
	C: ?Sized + HttpTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Exchanges credentials for a token pair and persists the pair plus the user.
	///
	/// The login call never carries a bearer and a `401` here is a plain failure: there is no
	/// session to refresh yet.
	pub async fn login(&self, username: &str, password: &str) -> Result<SessionUser> {
		const KIND: CallKind = CallKind::Login;

		let span = CallSpan::new(KIND, "login");

		obs::record_call_outcome(KIND, CallOutcome::Attempt);

		let result = span
			.instrument(async move {
				let request =
					self.plain_post(&self.config.login_path, &LoginRequest { username, password })?;
				let response = self.dispatch(request).await?;

				if !response.is_success() {
					return Err(HttpError::from_body(response.status, &response.body).into());
				}

				let grant: LoginGrant = decode_json(&response)?;

				self.store
					.sign_in(CredentialPair::new(grant.access, grant.refresh), grant.user.clone())
					.await?;

				Ok(grant.user)
			})
			.await;

		match &result {
			Ok(_) => obs::record_call_outcome(KIND, CallOutcome::Success),
			Err(_) => obs::record_call_outcome(KIND, CallOutcome::Failure),
		}

		result
	}

	/// Clears every stored key.
	///
	/// Logout is caller-initiated, so the session observer is not notified.
	pub async fn logout(&self) -> Result<()> {
		const KIND: CallKind = CallKind::Logout;

		let span = CallSpan::new(KIND, "logout");
		let result = span.instrument(self.store.clear()).await.map_err(Error::from);

		match &result {
			Ok(_) => obs::record_call_outcome(KIND, CallOutcome::Success),
			Err(_) => obs::record_call_outcome(KIND, CallOutcome::Failure),
		}

		result
	}

	/// Returns the cached user, if signed in.
	pub async fn current_user(&self) -> Result<Option<SessionUser>> {
		Ok(self.store.user().await?)
	}

	/// Returns `true` when an access token is stored.
	pub async fn is_authenticated(&self) -> Result<bool> {
		Ok(self.store.access_token().await?.is_some())
	}

	/// Returns the stored theme, defaulting to [`Theme::Light`].
	pub async fn theme(&self) -> Result<Theme> {
		Ok(self.store.theme().await?.unwrap_or_default())
	}

	/// Flips and persists the theme, returning the new value.
	pub async fn toggle_theme(&self) -> Result<Theme> {
		let next = self.theme().await?.toggled();

		self.store.set_theme(next).await?;

		Ok(next)
	}
}
