use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogueItem {
	#[serde(deserialize_with = "item_id_string")]
	pub item_id: String,
	pub title: String,
	pub text: String,
}

// Catalogue files sometimes carry numeric ids; keep them as decimal strings.
fn item_id_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
	D: Deserializer<'de>,
{
	#[derive(Deserialize)]
	#[serde(untagged)]
	enum Raw {
		Text(String),
		Number(i64),
	}

	match Raw::deserialize(deserializer)? {
		Raw::Text(id) => Ok(id),
		Raw::Number(id) => Ok(id.to_string()),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn accepts_string_item_ids() {
		let item: CatalogueItem =
			serde_json::from_str(r#"{"item_id": "a1", "title": "t", "text": "x"}"#)
				.expect("parse failed");
		assert_eq!(item.item_id, "a1");
	}

	#[test]
	fn coerces_integer_item_ids() {
		let item: CatalogueItem =
			serde_json::from_str(r#"{"item_id": 42, "title": "t", "text": "x"}"#)
				.expect("parse failed");
		assert_eq!(item.item_id, "42");
	}
}
