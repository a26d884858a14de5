//! Escaping and chain properties of the column pipeline

use proptest::prelude::*;
use rstest::rstest;
use serde_json::{Value, json};
use tabula_columns::{Column, ColumnPipeline, Displayer, TransformOutcome, registry};
use tabula_core::Row;
use tabula_core::html::escape;

fn row(value: Value) -> Row {
	value.as_object().cloned().unwrap_or_default()
}

proptest! {
	#[test]
	fn escaped_cells_never_carry_markup(text in ".{0,40}") {
		let mut pipeline = ColumnPipeline::new();
		pipeline.column("cell");

		let rows = pipeline.apply(vec![row(json!({"cell": text.clone()}))]);

		let cell = rows[0]["cell"].as_str().unwrap_or_default().to_string();
		prop_assert_eq!(&cell, &escape(&text));
		prop_assert!(!cell.contains('<') && !cell.contains('>'));
	}

	#[test]
	fn unescaped_transform_output_is_kept(text in ".{0,40}", markup in "<[a-z]{1,3}>") {
		let mut pipeline = ColumnPipeline::new();
		let output = markup.clone();
		pipeline
			.column("cell")
			.escape(false)
			.display(move |_, _, _| json!(output.clone()));

		let rows = pipeline.apply(vec![row(json!({"cell": text}))]);

		prop_assert_eq!(&rows[0]["cell"], &json!(markup));
	}

	#[test]
	fn deferring_runs_only_the_last_transform(middle in 1usize..6) {
		let mut column = Column::new("cell", "");
		column.display_with(|_, _, _| TransformOutcome::DeferToLast);
		for _ in 0..middle {
			column.display(|_, _, _| json!("middle"));
		}
		column.display(|value, _, _| json!(format!("last:{}", value.as_str().unwrap_or(""))));
		let mut pipeline = ColumnPipeline::new();
		pipeline.push(column);

		let rows = pipeline.apply(vec![row(json!({"cell": "raw"}))]);

		prop_assert_eq!(&rows[0]["cell"], &json!("last:raw"));
	}
}

#[rstest]
fn test_non_string_scalars_are_not_encoded() {
	let mut pipeline = ColumnPipeline::new();
	pipeline.column("count");
	pipeline.column("tags");
	pipeline.column("missing");

	let rows = pipeline.apply(vec![row(json!({"count": 3, "tags": ["<a>", true]}))]);

	assert_eq!(rows[0]["count"], json!(3));
	assert_eq!(rows[0]["tags"], json!(["&lt;a&gt;", true]));
	assert_eq!(rows[0]["missing"], Value::Null);
}

#[rstest]
fn test_relation_column_reads_nested_value() {
	// Arrange
	let mut pipeline = ColumnPipeline::new();
	pipeline
		.relation("author", None)
		.call("email", vec![json!("Contact")])
		.unwrap()
		.call("link", vec![])
		.unwrap();

	// Act
	let rows = pipeline.apply(vec![row(json!({"author": {"email": "a@b.c"}}))]);

	// Assert
	assert_eq!(pipeline.columns()[0].label(), "Contact");
	assert_eq!(
		rows[0]["author"]["email"],
		json!("<a href='a@b.c' target='_blank'>a@b.c</a>")
	);
}

#[rstest]
fn test_global_displayer_registration() {
	// Arrange
	registry::extend("reversed", |_| {
		Ok(Displayer::text(|value, _, _| {
			json!(value.as_str().unwrap_or_default().chars().rev().collect::<String>())
		}))
	})
	.unwrap();
	let mut pipeline = ColumnPipeline::new();
	pipeline.column("word").call("reversed", vec![]).unwrap();

	// Act
	let rows = pipeline.apply(vec![row(json!({"word": "<ab"}))]);

	// Assert
	assert_eq!(rows[0]["word"], json!("ba&lt;"));
}
