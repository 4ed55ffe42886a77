use ahash::AHashMap;

use scry_catalogue::{ItemStore, cmp_f32_desc};

/// One entry of the fused candidate pool. `index` points back into the item
/// store; `score` is the sum of similarities across all probes that hit it.
#[derive(Debug, Clone, Copy)]
pub struct FusedHit<'a> {
	pub index: usize,
	pub item_id: &'a str,
	pub score: f32,
}

/// Probes the store once per candidate vector and fuses the result sets by
/// summing similarity per item. Items no probe retrieved stay absent rather
/// than scoring zero, so consensus across candidates outranks single hits.
/// Ordering is aggregate score descending, `item_id` ascending on exact ties.
pub fn fuse<'a>(
	store: &'a ItemStore,
	model_key: &str,
	vectors: &[Vec<f32>],
	probe_depth: usize,
	limit: usize,
) -> scry_catalogue::Result<Vec<FusedHit<'a>>> {
	if store.is_empty() {
		return Ok(Vec::new());
	}

	let mut fused = AHashMap::new();

	for vector in vectors {
		for (index, score) in store.query(model_key, vector, probe_depth)? {
			*fused.entry(index).or_insert(0.0) += score;
		}
	}

	let mut hits: Vec<FusedHit> = fused
		.into_iter()
		.filter_map(|(index, score)| {
			store.item(index).map(|item| FusedHit { index, item_id: &item.item_id, score })
		})
		.collect();

	hits.sort_by(|a, b| cmp_f32_desc(a.score, b.score).then_with(|| a.item_id.cmp(b.item_id)));
	hits.truncate(limit);

	Ok(hits)
}
