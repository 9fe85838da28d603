//! Usage-gated outbound webhook dispatch: per-identity rate limits, HMAC-signed payloads,
//! bounded-latency delivery, and one auditable result shape for every outcome.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod audit;
pub mod config;
pub mod destination;
pub mod dispatch;
pub mod entitlement;
pub mod error;
pub mod http;
pub mod identity;
pub mod limit;
pub mod obs;
pub mod payload;
pub mod service;
pub mod signing;
pub mod target;
mod _prelude {
	pub use std::{
		collections::{BTreeMap, HashMap},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
		time::Duration as StdDuration,
	};

	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use serde_json::{Map as JsonMap, Value as JsonValue};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _};
