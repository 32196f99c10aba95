use objectsftp_sdk::error::{Error, Result};

/// Splits a `/`-rooted virtual path into `(bucket, key)`.
///
/// `"/"` maps to `("", "")`, `"/<bucket>"` to `(bucket, "")`, and
/// `"/<bucket>/<k1>/.../<kn>"` to `(bucket, "k1/.../kn")`. No URL-encoding or
/// decoding is performed; paths are opaque byte strings between the SFTP
/// client and the store. `bucket` and each key segment are trimmed of
/// surrounding whitespace; embedded whitespace is preserved. Empty segments
/// (other than the root itself) are rejected.
pub fn split(vpath: &str) -> Result<(String, String)> {
	if vpath.is_empty() {
		return Err(Error::InvalidPath(vpath.to_string()));
	}
	if !vpath.starts_with('/') {
		return Err(Error::InvalidPath(vpath.to_string()));
	}

	let segments: Vec<&str> = vpath.split('/').collect();
	// segments[0] is always "" because vpath starts with '/'.
	if segments.len() == 1 {
		// vpath == "/"
		return Ok((String::new(), String::new()));
	}

	for segment in &segments[1..] {
		if segment.trim().is_empty() && segments.len() > 2 {
			// an embedded empty segment, e.g. "/bucket//key" or a trailing slash
			// past the root, is malformed.
			if segment.is_empty() {
				return Err(Error::InvalidPath(vpath.to_string()));
			}
		}
	}

	let bucket = segments[1].trim().to_string();
	if bucket.is_empty() {
		return Err(Error::InvalidPath(vpath.to_string()));
	}

	let key = if segments.len() > 2 {
		segments[2..].iter().map(|s| s.trim()).collect::<Vec<_>>().join("/")
	} else {
		String::new()
	};

	Ok((bucket, key))
}

/// Returns the prefix to list against `ListObjectsV2` for `vpath`: the key
/// with a trailing `/` appended when non-empty, so that listing with
/// delimiter `/` groups immediate children.
pub fn list_prefix(vpath: &str) -> Result<String> {
	let (_, key) = split(vpath)?;
	if key.is_empty() {
		Ok(key)
	} else {
		Ok(format!("{key}/"))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn root_splits_to_empty_bucket_and_key() {
		assert_eq!(split("/").unwrap(), ("".to_string(), "".to_string()));
	}

	#[test]
	fn bucket_only() {
		assert_eq!(split("/s3tp-test").unwrap(), ("s3tp-test".to_string(), "".to_string()));
	}

	#[test]
	fn bucket_and_nested_key() {
		assert_eq!(
			split("/s3tp-test/dir-1-deep/lux.png").unwrap(),
			("s3tp-test".to_string(), "dir-1-deep/lux.png".to_string())
		);
	}

	#[test]
	fn trims_surrounding_whitespace_but_keeps_embedded() {
		assert_eq!(split("/ s3tp-test /a b/ c ").unwrap(), ("s3tp-test".to_string(), "a b/c".to_string()));
	}

	#[test]
	fn rejects_empty_vpath() {
		assert!(split("").is_err());
	}

	#[test]
	fn rejects_embedded_empty_segment() {
		assert!(split("/s3tp-test//lux.png").is_err());
	}

	#[test]
	fn list_prefix_appends_trailing_slash_for_nonempty_key() {
		assert_eq!(list_prefix("/s3tp-test/dir-1-deep").unwrap(), "dir-1-deep/");
	}

	#[test]
	fn list_prefix_is_empty_at_bucket_root() {
		assert_eq!(list_prefix("/s3tp-test").unwrap(), "");
	}
}
