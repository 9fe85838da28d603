//! Outbound header assembly.

// self
use crate::_prelude::*;

/// Content type header name.
pub const CONTENT_TYPE: &str = "Content-Type";
/// User agent header name.
pub const USER_AGENT: &str = "User-Agent";
/// Unix-seconds timestamp header name.
pub const TIMESTAMP_HEADER: &str = "X-Webhook-Timestamp";
/// Signature header name.
pub const SIGNATURE_HEADER: &str = "X-Webhook-Signature";
/// Body media type.
pub const JSON_CONTENT_TYPE: &str = "application/json";

const RESERVED: [&str; 3] = [CONTENT_TYPE, SIGNATURE_HEADER, TIMESTAMP_HEADER];

/// Whether a custom header named `name` would override a reserved header.
pub fn is_reserved(name: &str) -> bool {
	RESERVED.iter().any(|reserved| reserved.eq_ignore_ascii_case(name))
}

/// Builds the ordered header list for one request.
///
/// Custom entries colliding with a reserved header are dropped; other collisions (e.g.
/// `User-Agent`) replace the fixed value.
pub fn assemble(
	user_agent: &str,
	timestamp: i64,
	signature: Option<String>,
	custom: &BTreeMap<String, String>,
) -> Vec<(String, String)> {
	let mut headers = vec![
		(CONTENT_TYPE.to_owned(), JSON_CONTENT_TYPE.to_owned()),
		(USER_AGENT.to_owned(), user_agent.to_owned()),
		(TIMESTAMP_HEADER.to_owned(), timestamp.to_string()),
	];

	if let Some(signature) = signature {
		headers.push((SIGNATURE_HEADER.to_owned(), signature));
	}

	for (name, value) in custom.iter().filter(|(name, _)| !is_reserved(name)) {
		match headers.iter_mut().find(|(existing, _)| existing.eq_ignore_ascii_case(name)) {
			Some(slot) => slot.1 = value.clone(),
			None => headers.push((name.clone(), value.clone())),
		}
	}

	headers
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn custom(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
		pairs.iter().map(|(k, v)| ((*k).to_owned(), (*v).to_owned())).collect()
	}

	fn values<'a>(headers: &'a [(String, String)], name: &str) -> Vec<&'a str> {
		headers
			.iter()
			.filter(|(key, _)| key.eq_ignore_ascii_case(name))
			.map(|(_, value)| value.as_str())
			.collect()
	}

	#[test]
	fn reserved_headers_cannot_be_overridden() {
		let headers = assemble(
			"Ops-CSV-Cleaner/1.0",
			1_700_000_000,
			Some("sha256=abc".into()),
			&custom(&[
				("content-type", "text/plain"),
				("X-WEBHOOK-SIGNATURE", "forged"),
				("x-webhook-timestamp", "0"),
				("X-Team", "ops"),
			]),
		);

		assert_eq!(values(&headers, "content-type"), ["application/json"]);
		assert_eq!(values(&headers, "x-webhook-signature"), ["sha256=abc"]);
		assert_eq!(values(&headers, "x-webhook-timestamp"), ["1700000000"]);
		assert_eq!(values(&headers, "x-team"), ["ops"]);
	}

	#[test]
	fn unsigned_requests_carry_no_signature() {
		let headers = assemble("ua", 1, None, &custom(&[("X-Webhook-Signature", "forged")]));

		assert!(values(&headers, SIGNATURE_HEADER).is_empty());
	}

	#[test]
	fn non_reserved_collisions_replace_fixed_values() {
		let headers = assemble("ua", 1, None, &custom(&[("user-agent", "custom/2.0")]));

		assert_eq!(values(&headers, USER_AGENT), ["custom/2.0"]);
	}
}
