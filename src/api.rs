//! Per-resource wrappers used by the admin pages.
//!
//! The wrappers only forward to [`Gateway`]; they add no retry, caching, or ordering of their
//! own. [`ApiFailure`] turns any gateway error into the `{ "error": string }` shape pages show
//! in their notifications.

// self
use crate::{
	_prelude::*,
	gateway::{ApiRequest, Gateway},
	http::{HttpTransport, Method, TransportErrorMapper},
};

const SESSION_EXPIRED: &str = "Your session has expired. Please sign in again.";

/// Backend collections exposed to the admin UI.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Resource {
	/// Product catalog.
	Products,
	/// Sales entries.
	Sales,
	/// Employees and their roles.
	Users,
	/// Generated reports and exports.
	Reports,
	/// Dashboard aggregates.
	Dashboard,
	/// Stock movements.
	Inventory,
	/// Health checks and backups.
	System,
}
impl Resource {
	/// Every resource, in menu order.
	pub const ALL: [Resource; 7] = [
		Resource::Dashboard,
		Resource::Products,
		Resource::Sales,
		Resource::Inventory,
		Resource::Users,
		Resource::Reports,
		Resource::System,
	];

	/// Collection path relative to the base URL.
	pub const fn path(self) -> &'static str {
		match self {
			Resource::Products => "products/",
			Resource::Sales => "sales/",
			Resource::Users => "users/",
			Resource::Reports => "reports/",
			Resource::Dashboard => "dashboard/",
			Resource::Inventory => "inventory/",
			Resource::System => "system/",
		}
	}
}
impl Display for Resource {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.path().trim_end_matches('/'))
	}
}

/// Borrowed handle scoping gateway calls to one [`Resource`].
pub struct ResourceClient<'g, C, M>
where
	C: ?Sized + HttpTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	gateway: &'g Gateway<C, M>,
	resource: Resource,
}
impl<C, M> ResourceClient<'_, C, M>
where
	C: ?Sized + HttpTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Resource this client is scoped to.
	pub fn resource(&self) -> Resource {
		self.resource
	}

	/// Path of a member or sub-collection, e.g. `products/42/` or `system/backup/`.
	pub fn member_path(&self, member: impl Display) -> String {
		let member = member.to_string();
		let member = member.trim_matches('/');

		format!("{}{member}/", self.resource.path())
	}

	/// Lists the collection with optional filters.
	pub async fn list<K, V>(&self, filters: impl IntoIterator<Item = (K, V)>) -> Result<Value>
	where
		K: Into<String>,
		V: ToString,
	{
		self.gateway.send(ApiRequest::get(self.resource.path()).queries(filters)).await
	}

	/// Fetches one member.
	pub async fn get(&self, id: impl Display) -> Result<Value> {
		self.gateway.send(ApiRequest::get(self.member_path(id))).await
	}

	/// Creates a member.
	pub async fn create(&self, body: Value) -> Result<Value> {
		self.gateway.send(ApiRequest::post(self.resource.path()).body(body)).await
	}

	/// Replaces a member.
	pub async fn update(&self, id: impl Display, body: Value) -> Result<Value> {
		self.gateway.send(ApiRequest::put(self.member_path(id)).body(body)).await
	}

	/// Partially updates a member.
	pub async fn patch(&self, id: impl Display, body: Value) -> Result<Value> {
		self.gateway.send(ApiRequest::patch(self.member_path(id)).body(body)).await
	}

	/// Deletes a member.
	pub async fn remove(&self, id: impl Display) -> Result<Value> {
		self.gateway.send(ApiRequest::delete(self.member_path(id))).await
	}

	/// Calls a custom action below the collection (`system/backup/`, `sales/summary/`, ...).
	pub async fn action(
		&self,
		method: Method,
		action: impl Display,
		body: Option<Value>,
	) -> Result<Value> {
		let mut request = ApiRequest::new(method, self.member_path(action));

		request.body = body;

		self.gateway.send(request).await
	}

	/// Downloads a binary export below the collection (`reports/sales/export/`, ...).
	pub async fn export<K, V>(
		&self,
		action: impl Display,
		filters: impl IntoIterator<Item = (K, V)>,
	) -> Result<Vec<u8>>
	where
		K: Into<String>,
		V: ToString,
	{
		let request =
			ApiRequest::get(self.member_path(action)).queries(filters).header("accept", "*/*");

		self.gateway.download(request).await
	}
}

impl<C, M> Gateway<C, M>
where
	C: ?Sized + HttpTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Returns a client scoped to `resource`.
	pub fn resource(&self, resource: Resource) -> ResourceClient<'_, C, M> {
		ResourceClient { gateway: self, resource }
	}
}

/// Normalized failure shown to users: `{ "error": "..." }`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
#[error("{error}")]
pub struct ApiFailure {
	/// User-facing message.
	pub error: String,
}
impl ApiFailure {
	/// Wraps a message.
	pub fn new(error: impl Into<String>) -> Self {
		Self { error: error.into() }
	}
}
impl From<&Error> for ApiFailure {
	fn from(err: &Error) -> Self {
		let message = match err {
			Error::Http(e) => match e.message() {
				Some(message) => message.to_owned(),
				None if e.is_unauthorized() => SESSION_EXPIRED.to_owned(),
				None => format!("Request failed with status {}.", e.status),
			},
			_ if err.is_timeout() => "The server took too long to respond.".to_owned(),
			Error::Refresh(_) => SESSION_EXPIRED.to_owned(),
			Error::Transport(_) => "Unable to reach the server.".to_owned(),
			Error::Decode(_) => "The server returned an unexpected response.".to_owned(),
			Error::Storage(_) | Error::Config(_) | Error::Encode { .. } => err.to_string(),
		};

		Self::new(message)
	}
}
impl From<Error> for ApiFailure {
	fn from(err: Error) -> Self {
		Self::from(&err)
	}
}

/// Maps a gateway result into the page-facing shape.
pub fn normalize<T>(result: Result<T>) -> Result<T, ApiFailure> {
	result.map_err(ApiFailure::from)
}
