//! End-to-end grid scenarios: namespacing, pagination, sorting and exports

use proptest::prelude::*;
use rstest::{fixture, rstest};
use serde_json::json;
use tabula::prelude::*;

#[fixture]
fn users() -> MemoryTable {
	MemoryTable::from_values(
		(1..=30)
			.map(|id| {
				json!({
					"id": id,
					"name": format!("<user{id}>"),
					"role": if id % 3 == 0 { "admin" } else { "user" },
					"team": {"name": if id % 2 == 0 { "even" } else { "odd" }},
				})
			})
			.collect(),
	)
}

fn user_grid(name: &str) -> Grid {
	let mut grid = Grid::new(name);
	grid.filters_mut().push(FilterField::equal("role")).unwrap();
	grid.columns_mut().column("id").sortable();
	grid.columns_mut().column("name");
	grid.columns_mut().column("team.name");
	grid
}

fn ids(rows: &[Row]) -> Vec<i64> {
	rows.iter().filter_map(|row| row["id"].as_i64()).collect()
}

#[rstest]
fn test_named_grids_share_one_request(users: MemoryTable) {
	// Arrange
	let query = "admins_role=admin&admins_page=2&others_role=user&others_per_page=5";
	let params = QueryParams::from_query_str(query).unwrap();
	let url = format!("/dashboard?{query}");
	let mut admins = user_grid("admins");
	let mut others = user_grid("others");

	// Act
	let admin_page = admins.rows(&url, &params, &users).unwrap();
	let other_page = others.rows(&url, &params, &users).unwrap();

	// Assert
	assert_eq!(admin_page.total, 10);
	assert_eq!(admin_page.page, 1);
	assert_eq!(ids(&admin_page.rows)[..2], [3, 6]);
	assert_eq!(other_page.total, 20);
	assert_eq!(other_page.per_page, 5);
	assert_eq!(other_page.total_pages, 4);
	assert_eq!(
		admin_page.reset_url,
		"/dashboard?others_role=user&others_per_page=5"
	);
}

#[rstest]
fn test_rows_are_rendered_through_columns(users: MemoryTable) {
	// Arrange
	let mut grid = user_grid("");
	grid.columns_mut().call("team.name", "upper", vec![]).unwrap();
	let params = QueryParams::from_query_str("_sort[column]=id&_sort[type]=desc&per_page=2").unwrap();

	// Act
	let output = grid.rows("/users", &params, &users).unwrap();

	// Assert
	assert_eq!(ids(&output.rows), vec![30, 29]);
	assert_eq!(output.rows[0]["name"], json!("&lt;user30&gt;"));
	assert_eq!(output.rows[0]["team"]["name"], json!("EVEN"));
	assert_eq!(output.sort_links.len(), 1);
	assert_eq!(output.sort_links["id"].current, Some(Direction::Desc));
	assert!(output.sort_links["id"].url.ends_with("_sort%5Btype%5D=asc"));
}

#[rstest]
fn test_unsortable_sort_request_is_ignored(users: MemoryTable) {
	let mut grid = user_grid("");
	let params = QueryParams::from_query_str("_sort[column]=name&_sort[type]=desc").unwrap();

	let output = grid.rows("/users", &params, &users).unwrap();

	assert_eq!(ids(&output.rows)[0], 1);
	assert_eq!(output.sort_links["id"].current, None);
}

#[rstest]
#[case("_export_=all", 10)]
#[case("_export_=page:1&per_page=4", 4)]
#[case("_export_=selected:3,4,6", 2)]
fn test_export_from_request(users: MemoryTable, #[case] query: &str, #[case] expected: usize) {
	// Arrange
	let mut grid = user_grid("");
	let params = QueryParams::from_query_str(&format!("role=admin&{query}")).unwrap();
	let mut exported = Vec::new();

	// Act
	let scope = grid.export_scope(&params).unwrap().unwrap();
	let finished = grid
		.export(&scope, &params, &users, |batch| {
			exported.extend(batch);
			true
		})
		.unwrap();

	// Assert
	assert!(finished);
	assert_eq!(exported.len(), expected);
	assert!(exported.iter().all(|row| row["role"] == json!("admin")));
	assert!(exported.iter().all(|row| row["name"].as_str().unwrap().starts_with('<')));
}

#[rstest]
fn test_invalid_export_scope_is_a_bad_request() {
	let grid = user_grid("");
	let params = QueryParams::from_query_str("_export_=page:zero").unwrap();

	let error = grid.export_scope(&params).unwrap_err();

	assert!(error.is_bad_request());
	assert_eq!(error.to_string(), "Invalid export scope: page:zero");
}

proptest! {
	#[test]
	fn pages_cover_every_row_once(rows in 0usize..60, per_page in 1usize..15) {
		let table = MemoryTable::from_values((1..=rows).map(|id| json!({"id": id})).collect());
		let mut grid = Grid::new("");
		grid.columns_mut().column("id");

		let first = grid
			.rows("/", &QueryParams::from_query_str(&format!("per_page={per_page}")).unwrap(), &table)
			.unwrap();
		let mut seen = ids(&first.rows);
		for page in 2..=first.total_pages {
			let params = QueryParams::from_query_str(&format!("per_page={per_page}&page={page}")).unwrap();
			seen.extend(ids(&grid.rows("/", &params, &table).unwrap().rows));
		}

		prop_assert_eq!(first.total, rows);
		prop_assert_eq!(seen, (1..=rows as i64).collect::<Vec<_>>());
	}

	#[test]
	fn export_batches_match_filtered_total(chunk_size in 1usize..12) {
		let table = MemoryTable::from_values(
			(1..=25).map(|id| json!({"id": id, "role": if id % 2 == 0 { "a" } else { "b" }})).collect(),
		);
		let mut settings = TabulaSettings::default();
		settings.pagination.chunk_size = chunk_size;
		let mut grid = Grid::with_settings("", "id", settings);
		grid.filters_mut().push(FilterField::equal("role")).unwrap();
		let params = QueryParams::from_query_str("role=a").unwrap();

		let mut batches = Vec::new();
		grid.export(&ExportScope::All, &params, &table, |batch| {
			batches.push(batch.len());
			true
		})
		.unwrap();

		prop_assert_eq!(batches.iter().sum::<usize>(), 12);
		prop_assert!(batches.iter().all(|size| *size <= chunk_size));
	}
}
