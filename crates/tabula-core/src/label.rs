//! Human-readable labels derived from column names

/// Turns a column name into a display label.
///
/// `.` and `_` become spaces and the first letter is upper-cased.
///
/// # Examples
///
/// ```
/// use tabula_core::label::humanize;
///
/// assert_eq!(humanize("created_at"), "Created at");
/// assert_eq!(humanize("author.name"), "Author name");
/// assert_eq!(humanize(""), "");
/// ```
pub fn humanize(name: &str) -> String {
	let spaced = name.replace(['.', '_'], " ");
	let mut chars = spaced.chars();
	match chars.next() {
		Some(first) => first.to_uppercase().chain(chars).collect(),
		None => String::new(),
	}
}
