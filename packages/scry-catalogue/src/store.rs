use std::{cmp::Ordering, collections::HashMap};

use ahash::AHashMap;

use crate::{CatalogueItem, Error, Result};

/// Flat inner-product index over L2-normalized vectors. Rows are normalized
/// once at build time, so the inner product of a normalized query is the
/// cosine similarity.
#[derive(Debug, Clone)]
pub struct VectorIndex {
	dimensions: usize,
	vectors: Vec<Vec<f32>>,
}
impl VectorIndex {
	pub fn build(dimensions: u32, mut rows: Vec<Vec<f32>>) -> Result<Self> {
		let dimensions = dimensions as usize;

		for row in &mut rows {
			if row.len() != dimensions {
				return Err(Error::DimensionMismatch { expected: dimensions, found: row.len() });
			}

			l2_normalize(row);
		}

		Ok(Self { dimensions, vectors: rows })
	}

	pub fn dimensions(&self) -> usize {
		self.dimensions
	}

	pub fn len(&self) -> usize {
		self.vectors.len()
	}

	pub fn is_empty(&self) -> bool {
		self.vectors.is_empty()
	}

	/// Top `k` rows by similarity, score-descending with row-ascending ties.
	pub fn query(&self, vector: &[f32], k: usize) -> Result<Vec<(usize, f32)>> {
		if self.vectors.is_empty() {
			return Err(Error::EmptyStore);
		}
		if vector.len() != self.dimensions {
			return Err(Error::DimensionMismatch {
				expected: self.dimensions,
				found: vector.len(),
			});
		}

		let mut query = vector.to_vec();

		l2_normalize(&mut query);

		let mut hits: Vec<(usize, f32)> = self
			.vectors
			.iter()
			.enumerate()
			.map(|(index, row)| (index, dot(&query, row)))
			.collect();

		hits.sort_by(|a, b| cmp_f32_desc(a.1, b.1).then_with(|| a.0.cmp(&b.0)));
		hits.truncate(k);

		Ok(hits)
	}
}

/// Catalogue items plus one vector index per embedding model. Built once at
/// startup and shared read-only afterwards.
#[derive(Debug)]
pub struct ItemStore {
	items: Vec<CatalogueItem>,
	id_to_index: AHashMap<String, usize>,
	indexes: HashMap<String, VectorIndex>,
}
impl ItemStore {
	pub fn build(
		items: Vec<CatalogueItem>,
		embeddings: HashMap<String, (u32, Vec<Vec<f32>>)>,
	) -> Result<Self> {
		let mut id_to_index = AHashMap::with_capacity(items.len());

		for (index, item) in items.iter().enumerate() {
			if id_to_index.insert(item.item_id.clone(), index).is_some() {
				return Err(Error::DuplicateItemId { item_id: item.item_id.clone() });
			}
		}

		let mut indexes = HashMap::with_capacity(embeddings.len());

		for (model_key, (dimensions, rows)) in embeddings {
			if rows.len() != items.len() {
				return Err(Error::RowCountMismatch {
					model_key,
					expected: items.len(),
					found: rows.len(),
				});
			}

			indexes.insert(model_key, VectorIndex::build(dimensions, rows)?);
		}

		Ok(Self { items, id_to_index, indexes })
	}

	pub fn query(&self, model_key: &str, vector: &[f32], k: usize) -> Result<Vec<(usize, f32)>> {
		let index = self
			.indexes
			.get(model_key)
			.ok_or_else(|| Error::UnknownEmbeddingModel { model_key: model_key.to_string() })?;

		index.query(vector, k)
	}

	pub fn index(&self, model_key: &str) -> Option<&VectorIndex> {
		self.indexes.get(model_key)
	}

	pub fn item(&self, index: usize) -> Option<&CatalogueItem> {
		self.items.get(index)
	}

	pub fn get(&self, item_id: &str) -> Option<&CatalogueItem> {
		self.id_to_index.get(item_id).and_then(|index| self.items.get(*index))
	}

	pub fn items(&self) -> &[CatalogueItem] {
		&self.items
	}

	pub fn len(&self) -> usize {
		self.items.len()
	}

	pub fn is_empty(&self) -> bool {
		self.items.is_empty()
	}

	pub fn model_keys(&self) -> Vec<&str> {
		let mut keys = self.indexes.keys().map(String::as_str).collect::<Vec<_>>();

		keys.sort_unstable();

		keys
	}
}

pub fn cmp_f32_desc(a: f32, b: f32) -> Ordering {
	match (a.is_nan(), b.is_nan()) {
		(true, true) => Ordering::Equal,
		(true, false) => Ordering::Greater,
		(false, true) => Ordering::Less,
		(false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
	}
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
	a.iter().zip(b).map(|(x, y)| x * y).sum()
}

fn l2_normalize(vector: &mut [f32]) {
	let norm = vector.iter().map(|value| value * value).sum::<f32>().sqrt();

	if norm > 0.0 {
		for value in vector.iter_mut() {
			*value /= norm;
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn items(ids: &[&str]) -> Vec<CatalogueItem> {
		ids.iter()
			.map(|id| CatalogueItem {
				item_id: id.to_string(),
				title: format!("title {id}"),
				text: format!("text {id}"),
			})
			.collect()
	}

	#[test]
	fn query_returns_nearest_rows_first() {
		let index = VectorIndex::build(
			2,
			vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![1.0, 1.0]],
		)
		.expect("build failed");
		let hits = index.query(&[1.0, 0.0], 2).expect("query failed");

		assert_eq!(hits.len(), 2);
		assert_eq!(hits[0].0, 0);
		assert!((hits[0].1 - 1.0).abs() < 1e-6);
		assert_eq!(hits[1].0, 2);
	}

	#[test]
	fn query_breaks_score_ties_by_row_order() {
		let index = VectorIndex::build(2, vec![vec![0.0, 1.0], vec![0.0, 2.0]])
			.expect("build failed");
		let hits = index.query(&[0.0, 3.0], 2).expect("query failed");

		assert_eq!(hits[0].0, 0);
		assert_eq!(hits[1].0, 1);
	}

	#[test]
	fn zero_vectors_score_zero_instead_of_nan() {
		let index =
			VectorIndex::build(2, vec![vec![0.0, 0.0], vec![1.0, 0.0]]).expect("build failed");
		let hits = index.query(&[1.0, 0.0], 2).expect("query failed");

		assert_eq!(hits[0].0, 1);
		assert_eq!(hits[1].1, 0.0);

		let hits = index.query(&[0.0, 0.0], 1).expect("query failed");

		assert_eq!(hits[0].1, 0.0);
	}

	#[test]
	fn query_rejects_mismatched_dimensions() {
		let index = VectorIndex::build(2, vec![vec![1.0, 0.0]]).expect("build failed");
		let err = index.query(&[1.0, 0.0, 0.0], 1).expect_err("expected dimension error");

		assert!(matches!(err, Error::DimensionMismatch { expected: 2, found: 3 }));
	}

	#[test]
	fn empty_index_query_fails() {
		let index = VectorIndex::build(2, vec![]).expect("build failed");

		assert!(matches!(index.query(&[1.0, 0.0], 1), Err(Error::EmptyStore)));
	}

	#[test]
	fn build_rejects_duplicate_item_ids() {
		let err = ItemStore::build(items(&["a", "a"]), HashMap::new())
			.expect_err("expected duplicate id error");

		assert!(matches!(err, Error::DuplicateItemId { item_id } if item_id == "a"));
	}

	#[test]
	fn build_rejects_row_count_mismatch() {
		let mut embeddings = HashMap::new();

		embeddings.insert("small".to_string(), (2, vec![vec![1.0, 0.0]]));

		let err = ItemStore::build(items(&["a", "b"]), embeddings)
			.expect_err("expected row count error");

		assert!(matches!(err, Error::RowCountMismatch { expected: 2, found: 1, .. }));
	}

	#[test]
	fn store_resolves_items_by_index_and_id() {
		let mut embeddings = HashMap::new();

		embeddings.insert("small".to_string(), (2, vec![vec![1.0, 0.0], vec![0.0, 1.0]]));

		let store = ItemStore::build(items(&["a", "b"]), embeddings).expect("build failed");

		assert_eq!(store.len(), 2);
		assert_eq!(store.item(1).map(|item| item.item_id.as_str()), Some("b"));
		assert_eq!(store.get("a").map(|item| item.title.as_str()), Some("title a"));
		assert!(store.get("missing").is_none());
		assert_eq!(store.model_keys(), vec!["small"]);
	}

	#[test]
	fn store_query_rejects_unknown_model() {
		let store = ItemStore::build(items(&["a"]), HashMap::new()).expect("build failed");
		let err = store.query("missing", &[1.0], 1).expect_err("expected unknown model error");

		assert!(matches!(err, Error::UnknownEmbeddingModel { .. }));
	}
}
