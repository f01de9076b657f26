//! # Persistence Format
//!
//! JSON encoding of the ingredient and recipe collections.
//!
//! Each collection is stored as one JSON array under its own key
//! (`ingredients`, `recipes`). A missing key reads as an empty collection.
//!
//! ## Limits
//!
//! Payloads larger than `MAX_COLLECTION_PAYLOAD_SIZE` are rejected before
//! parsing, so a corrupted store cannot trigger an unbounded allocation.

use crate::primitives::{INGREDIENTS_KEY, MAX_COLLECTION_PAYLOAD_SIZE, RECIPES_KEY};
use crate::storage::KeyValueStore;
use crate::{Ingredient, LarderError, Recipe};
use serde::Serialize;
use serde::de::DeserializeOwned;

// =============================================================================
// ENCODING
// =============================================================================

/// Encode the ingredient collection as a JSON array.
pub fn encode_ingredients(ingredients: &[Ingredient]) -> Result<String, LarderError> {
    encode(ingredients)
}

/// Decode the ingredient collection from a JSON array.
pub fn decode_ingredients(json: &str) -> Result<Vec<Ingredient>, LarderError> {
    decode(json, INGREDIENTS_KEY)
}

/// Encode the recipe collection as a JSON array.
pub fn encode_recipes(recipes: &[Recipe]) -> Result<String, LarderError> {
    encode(recipes)
}

/// Decode the recipe collection from a JSON array.
pub fn decode_recipes(json: &str) -> Result<Vec<Recipe>, LarderError> {
    decode(json, RECIPES_KEY)
}

fn encode<T: Serialize>(records: &[T]) -> Result<String, LarderError> {
    serde_json::to_string(records).map_err(|e| LarderError::SerializationError(e.to_string()))
}

fn decode<T: DeserializeOwned>(json: &str, key: &str) -> Result<Vec<T>, LarderError> {
    if json.len() > MAX_COLLECTION_PAYLOAD_SIZE {
        return Err(LarderError::DeserializationError(format!(
            "Collection '{}' is {} bytes, maximum allowed is {} bytes",
            key,
            json.len(),
            MAX_COLLECTION_PAYLOAD_SIZE
        )));
    }

    serde_json::from_str(json)
        .map_err(|e| LarderError::DeserializationError(format!("Collection '{}': {}", key, e)))
}

// =============================================================================
// STORE ACCESS
// =============================================================================

/// Read the ingredient collection from `store`.
pub fn load_ingredients<S: KeyValueStore + ?Sized>(
    store: &S,
) -> Result<Vec<Ingredient>, LarderError> {
    match store.get(INGREDIENTS_KEY)? {
        Some(json) => decode_ingredients(&json),
        None => Ok(Vec::new()),
    }
}

/// Write the whole ingredient collection to `store`.
pub fn store_ingredients<S: KeyValueStore + ?Sized>(
    store: &mut S,
    ingredients: &[Ingredient],
) -> Result<(), LarderError> {
    let json = encode_ingredients(ingredients)?;
    store.put(INGREDIENTS_KEY, &json)
}

/// Read the recipe collection from `store`.
pub fn load_recipes<S: KeyValueStore + ?Sized>(store: &S) -> Result<Vec<Recipe>, LarderError> {
    match store.get(RECIPES_KEY)? {
        Some(json) => decode_recipes(&json),
        None => Ok(Vec::new()),
    }
}

/// Write the whole recipe collection to `store`.
pub fn store_recipes<S: KeyValueStore + ?Sized>(
    store: &mut S,
    recipes: &[Recipe],
) -> Result<(), LarderError> {
    let json = encode_recipes(recipes)?;
    store.put(RECIPES_KEY, &json)
}

/// Write both collections in one store operation.
///
/// Both are encoded before anything is written, so an encoding error or a
/// failed write leaves the store as it was.
pub fn store_catalog<S: KeyValueStore + ?Sized>(
    store: &mut S,
    ingredients: &[Ingredient],
    recipes: &[Recipe],
) -> Result<(), LarderError> {
    let ingredients = encode_ingredients(ingredients)?;
    let recipes = encode_recipes(recipes)?;
    store.put_many(&[
        (INGREDIENTS_KEY, ingredients.as_str()),
        (RECIPES_KEY, recipes.as_str()),
    ])
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use crate::{IngredientDraft, IngredientId};

    fn salt() -> Ingredient {
        Ingredient::from_draft(IngredientId(3), IngredientDraft::new("Salt", 500.0, 250.0, "g"))
    }

    #[test]
    fn missing_keys_read_as_empty() {
        let store = MemoryStore::new();
        assert!(load_ingredients(&store).expect("load").is_empty());
        assert!(load_recipes(&store).expect("load").is_empty());
    }

    #[test]
    fn ingredients_round_trip_through_store() {
        let mut store = MemoryStore::new();
        store_ingredients(&mut store, &[salt()]).expect("store");

        let loaded = load_ingredients(&store).expect("load");
        assert_eq!(loaded, vec![salt()]);
    }

    #[test]
    fn catalog_writes_both_keys() {
        let mut store = MemoryStore::new();
        store_catalog(&mut store, &[salt()], &[]).expect("store");

        assert_eq!(load_ingredients(&store).expect("load"), vec![salt()]);
        assert_eq!(store.get(RECIPES_KEY).expect("get").as_deref(), Some("[]"));
    }

    #[test]
    fn encoded_ingredient_uses_wire_names() {
        let json = encode_ingredients(&[salt()]).expect("encode");
        assert_eq!(
            json,
            r#"[{"id":3,"name":"Salt","price":500.0,"quantity":250.0,"unit":"g","unavailable":false}]"#
        );
    }

    #[test]
    fn malformed_json_is_a_deserialization_error() {
        let mut store = MemoryStore::new();
        store.put(RECIPES_KEY, "[{").expect("put");

        let result = load_recipes(&store);
        assert!(matches!(result, Err(LarderError::DeserializationError(_))));
    }

    #[test]
    fn recipe_optional_fields_default() {
        let json = r#"[{
            "id": 1,
            "name": "Toast",
            "servings": 1,
            "ingredients": [{
                "id": 3, "name": "Salt", "price": 500, "unit": "g",
                "availableQuantity": 250, "usedQuantity": 5
            }],
            "totalCost": 10,
            "costPerServing": 10,
            "createdDate": "2024-03-01T08:30:00.000Z"
        }]"#;

        let recipes = decode_recipes(json).expect("decode");
        assert_eq!(recipes[0].cooking_instructions, "");
        assert!(!recipes[0].ingredients[0].unavailable);
        assert_eq!(recipes[0].ingredients[0].used_quantity, 5.0);
    }
}
