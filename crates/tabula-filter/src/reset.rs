//! Reset links
//!
//! Removing filter keys from the current request URL gives the link of the
//! panel's reset button.

use crate::error::{FilterError, FilterResult};
use crate::field::FilterKind;
use crate::set::FilterSet;
use tabula_core::params::parse_key;
use url::Url;

const RELATIVE_BASE: &str = "http://localhost";

impl FilterSet {
	/// The URL without any filter, page, group-selector, scope or
	/// quick-search parameter.
	///
	/// # Examples
	///
	/// ```
	/// use tabula_filter::{FilterField, FilterSet};
	///
	/// let mut filters = FilterSet::new("id");
	/// filters.push(FilterField::between("created_at")).unwrap();
	///
	/// let url = filters
	///     .url_without_filters("/admin/posts?created_at[start]=2024-01-01&page=3&sort=x")
	///     .unwrap();
	/// assert_eq!(url, "/admin/posts?sort=x");
	/// ```
	pub fn url_without_filters(&self, url: &str) -> FilterResult<String> {
		let reserved = self.reserved_keys();
		let mut keys = Vec::new();
		for field in self.fields() {
			let column = field.column();
			keys.push(self.request_key(column));
			keys.push(self.request_key(&format!("{}{column}", reserved.isnull_prefix)));
			if let FilterKind::Group { members, .. } = field.kind() {
				keys.push(self.request_key(&field.group_key()));
				for member in members {
					keys.push(self.request_key(member.column()));
				}
			}
		}
		keys.push(reserved.page_key(self.name()));
		keys.push(reserved.scope.clone());
		keys.push(reserved.search.clone());
		url_without_keys(url, &keys)
	}

	/// The URL without the scope and quick-search parameters.
	pub fn url_without_scopes(&self, url: &str) -> FilterResult<String> {
		let reserved = self.reserved_keys();
		url_without_keys(url, &[reserved.scope.clone(), reserved.search.clone()])
	}

	/// A key as it appears in the request, prefixed for a namespaced set.
	fn request_key(&self, key: &str) -> String {
		match self.name() {
			Some(name) => format!("{name}_{key}"),
			None => key.to_string(),
		}
	}
}

/// Removes query parameters from a URL.
///
/// `keys` are dotted paths; a parameter is removed when its bracket key
/// names the path or anything below it (`created_at` removes
/// `created_at[start]`). Relative URLs are accepted and returned relative.
/// A query left empty is dropped together with its `?`.
pub fn url_without_keys(url: &str, keys: &[String]) -> FilterResult<String> {
	let (mut parsed, relative) = match Url::parse(url) {
		Ok(parsed) => (parsed, false),
		Err(url::ParseError::RelativeUrlWithoutBase) => {
			let base = Url::parse(RELATIVE_BASE).map_err(|e| FilterError::InvalidUrl(e.to_string()))?;
			let joined = base
				.join(url)
				.map_err(|e| FilterError::InvalidUrl(format!("{url}: {e}")))?;
			(joined, true)
		}
		Err(e) => return Err(FilterError::InvalidUrl(format!("{url}: {e}"))),
	};

	let kept: Vec<(String, String)> = parsed
		.query_pairs()
		.filter(|(key, _)| !matches_any(key, keys))
		.map(|(key, value)| (key.into_owned(), value.into_owned()))
		.collect();

	parsed.set_query(None);
	if !kept.is_empty() {
		parsed.query_pairs_mut().extend_pairs(kept);
	}

	if !relative {
		return Ok(parsed.to_string());
	}
	let mut out = parsed.path().to_string();
	if let Some(query) = parsed.query() {
		out.push('?');
		out.push_str(query);
	}
	if let Some(fragment) = parsed.fragment() {
		out.push('#');
		out.push_str(fragment);
	}
	Ok(out)
}

fn matches_any(key: &str, targets: &[String]) -> bool {
	let dotted = parse_key(key).join(".");
	targets.iter().any(|target| {
		dotted == *target
			|| dotted
				.strip_prefix(target.as_str())
				.is_some_and(|rest| rest.starts_with('.'))
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::field::FilterField;
	use rstest::{fixture, rstest};

	#[fixture]
	fn filters() -> FilterSet {
		let mut filters = FilterSet::new("id");
		filters.push(FilterField::like("name")).unwrap();
		filters.push(FilterField::equal("author.name")).unwrap();
		filters
			.push(FilterField::group(
				"rate",
				vec![FilterField::gt("rate"), FilterField::lt("rate")],
			))
			.unwrap();
		filters
	}

	#[rstest]
	#[case("http://example.com/posts?name=a&keep=1", "http://example.com/posts?keep=1")]
	#[case("http://example.com/posts?name=a", "http://example.com/posts")]
	#[case("/posts?author[name]=x&isnull-name=1&rate=3&rate_group=0", "/posts")]
	#[case("/posts?_scope_=hot&_search_=q&page=2&per_page=5", "/posts?per_page=5")]
	#[case("/posts?id=4#top", "/posts#top")]
	#[case("/posts", "/posts")]
	fn test_url_without_filters(filters: FilterSet, #[case] url: &str, #[case] expected: &str) {
		assert_eq!(filters.url_without_filters(url).unwrap(), expected);
	}

	#[rstest]
	fn test_namespaced_page_and_keys(mut filters: FilterSet) {
		// Arrange
		filters.set_name("users");
		let url = "/admin?users_name=a&users_page=4&page=1&name=b&users_rate_group=1";

		// Act
		let stripped = filters.url_without_filters(url).unwrap();

		// Assert
		assert_eq!(stripped, "/admin?page=1&name=b");
	}

	#[rstest]
	fn test_url_without_scopes_keeps_filters(filters: FilterSet) {
		let url = "/posts?_scope_=hot&name=a&_search_=q";

		assert_eq!(filters.url_without_scopes(url).unwrap(), "/posts?name=a");
	}

	#[rstest]
	fn test_similar_prefix_is_kept(filters: FilterSet) {
		let url = "/posts?names=a&name_x=b";

		assert_eq!(filters.url_without_filters(url).unwrap(), url);
	}
}
