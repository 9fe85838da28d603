//! Dispatch payloads and their canonical JSON encoding.
//!
//! The encoded body is compact (no insignificant whitespace) and is produced once per dispatch,
//! so the bytes that are signed are the bytes that are sent.

// crates.io
use time::format_description::well_known::Rfc3339;
// self
use crate::_prelude::*;

/// `source` tag placed in the metadata envelope.
pub const METADATA_SOURCE: &str = "ops-csv-cleaner";

/// One record-like row.
pub type Row = JsonMap<String, JsonValue>;

/// Failures raised while decoding or encoding payloads.
#[derive(Debug, ThisError)]
pub enum PayloadError {
	/// Inbound JSON did not match the payload shape.
	#[error("Payload JSON is invalid at `{path}`.")]
	Decode {
		/// JSON path of the offending value.
		path: String,
		/// Structured parsing failure.
		#[source]
		source: serde_json::Error,
	},
	/// Body serialization failed.
	#[error("Payload could not be serialized.")]
	Encode(#[source] serde_json::Error),
	/// Metadata timestamp could not be rendered.
	#[error("Metadata timestamp could not be formatted.")]
	Timestamp(#[source] time::error::Format),
}

/// Rows handed to a dispatch, never persisted by this crate.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DispatchPayload {
	/// Ordered rows to deliver.
	#[serde(rename = "data")]
	pub rows: Vec<Row>,
	/// Attach the metadata envelope alongside `data`.
	#[serde(default = "default_include_metadata")]
	pub include_metadata: bool,
	/// Optional source file name reported in the envelope.
	#[serde(default)]
	pub file_name: Option<String>,
}
impl DispatchPayload {
	/// Creates a payload with metadata enabled (the request default).
	pub fn new(rows: Vec<Row>) -> Self {
		Self { rows, include_metadata: true, file_name: None }
	}

	/// Decodes the inbound request shape (`data`, `include_metadata`, `file_name`).
	pub fn from_json_slice(bytes: &[u8]) -> Result<Self, PayloadError> {
		let deserializer = &mut serde_json::Deserializer::from_slice(bytes);

		serde_path_to_error::deserialize(deserializer).map_err(|e| PayloadError::Decode {
			path: e.path().to_string(),
			source: e.into_inner(),
		})
	}

	/// Toggles the metadata envelope.
	pub fn with_metadata(mut self, include: bool) -> Self {
		self.include_metadata = include;

		self
	}

	/// Sets the file name reported in the envelope.
	pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
		self.file_name = Some(file_name.into());

		self
	}

	/// Number of rows.
	pub fn row_count(&self) -> usize {
		self.rows.len()
	}

	/// Whether there is nothing to send.
	pub fn is_empty(&self) -> bool {
		self.rows.is_empty()
	}

	/// Serializes the outbound body, stamping metadata with `now` when enabled.
	pub fn encode_body(&self, now: OffsetDateTime) -> Result<Vec<u8>, PayloadError> {
		let metadata = if self.include_metadata {
			Some(EnvelopeMetadata {
				source: METADATA_SOURCE,
				timestamp: now
					.to_offset(time::UtcOffset::UTC)
					.format(&Rfc3339)
					.map_err(PayloadError::Timestamp)?,
				file_name: self.file_name.as_deref(),
				row_count: self.rows.len(),
			})
		} else {
			None
		};
		let body = WebhookBody { data: &self.rows, count: self.rows.len(), metadata };

		serde_json::to_vec(&body).map_err(PayloadError::Encode)
	}
}

#[derive(Serialize)]
struct WebhookBody<'a> {
	data: &'a [Row],
	count: usize,
	#[serde(skip_serializing_if = "Option::is_none")]
	metadata: Option<EnvelopeMetadata<'a>>,
}

#[derive(Serialize)]
struct EnvelopeMetadata<'a> {
	source: &'static str,
	timestamp: String,
	file_name: Option<&'a str>,
	row_count: usize,
}

fn default_include_metadata() -> bool {
	true
}
