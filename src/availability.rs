//! Bar-shelf availability filtering for recipe listings.
//!
//! With `bar_shelf_mode=Y`, the recipe listing keeps only recipes whose
//! every ingredient line resolves to a catalog ingredient currently marked
//! on the shelf. Resolution is one batched query over the distinct names
//! referenced by the candidate set, never one query per recipe.

use std::collections::{HashMap, HashSet};

use diesel::prelude::*;

use crate::models::RecipeIngredient;
use crate::schema::ingredients;

/// Does this query-string flag turn the filter on? Case-insensitive; only
/// `Y` enables it, anything else (including absent) disables it.
pub fn shelf_mode_enabled(flag: Option<&str>) -> bool {
    flag.is_some_and(|f| f.to_ascii_uppercase() == "Y")
}

/// Distinct ingredient names referenced across the candidate recipes.
pub fn referenced_names<'a, I>(lists: I) -> HashSet<String>
where
    I: IntoIterator<Item = &'a [RecipeIngredient]>,
{
    lists
        .into_iter()
        .flatten()
        .filter(|entry| !entry.name.is_empty())
        .map(|entry| entry.name.clone())
        .collect()
}

/// Resolve each name to whether its catalog ingredient is on the shelf,
/// in a single round trip. Names with no catalog match are absent from the
/// result and therefore unavailable.
pub fn lookup(
    conn: &mut PgConnection,
    names: &HashSet<String>,
) -> QueryResult<HashMap<String, bool>> {
    if names.is_empty() {
        return Ok(HashMap::new());
    }

    let rows: Vec<(String, String)> = ingredients::table
        .filter(ingredients::name.eq_any(names))
        .select((ingredients::name, ingredients::bar_shelf_availability))
        .load(conn)?;

    Ok(rows
        .into_iter()
        .map(|(name, flag)| (name, flag == "Y"))
        .collect())
}

/// Can this recipe be made entirely from shelf ingredients?
///
/// A recipe with no ingredient lines cannot be confirmed makeable and is
/// excluded, as is one with an empty-named line (bad data). Matching is
/// exact string equality against the catalog, so an unknown name excludes
/// the recipe too.
pub fn is_makeable(entries: &[RecipeIngredient], shelf: &HashMap<String, bool>) -> bool {
    if entries.is_empty() {
        return false;
    }
    entries.iter().all(|entry| {
        !entry.name.is_empty() && shelf.get(&entry.name).copied().unwrap_or(false)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(name: &str) -> RecipeIngredient {
        RecipeIngredient {
            name: name.to_string(),
            amount: None,
            units: None,
            optional: false,
            note: None,
        }
    }

    fn shelf(entries: &[(&str, bool)]) -> HashMap<String, bool> {
        entries
            .iter()
            .map(|(name, avail)| (name.to_string(), *avail))
            .collect()
    }

    #[test]
    fn test_all_available_is_makeable() {
        let shelf = shelf(&[("A", true), ("C", true)]);
        assert!(is_makeable(&[line("A"), line("C")], &shelf));
    }

    #[test]
    fn test_one_unavailable_excludes() {
        let shelf = shelf(&[("A", true), ("B", false)]);
        assert!(!is_makeable(&[line("A"), line("B")], &shelf));
    }

    #[test]
    fn test_empty_ingredients_excludes() {
        // "No missing ingredient" is not vacuously makeable.
        assert!(!is_makeable(&[], &shelf(&[("A", true)])));
    }

    #[test]
    fn test_unknown_ingredient_excludes() {
        let shelf = shelf(&[("A", true)]);
        assert!(!is_makeable(&[line("A"), line("Unicorn Tears")], &shelf));
    }

    #[test]
    fn test_empty_name_excludes() {
        let shelf = shelf(&[("A", true)]);
        assert!(!is_makeable(&[line("A"), line("")], &shelf));
    }

    #[test]
    fn test_name_matching_is_case_sensitive() {
        let shelf = shelf(&[("Gin", true)]);
        assert!(!is_makeable(&[line("gin")], &shelf));
    }

    #[test]
    fn test_retain_preserves_order() {
        let shelf = shelf(&[("A", true), ("B", false)]);
        let mut recipes = vec![
            (1, vec![line("A")]),
            (2, vec![line("B")]),
            (3, vec![line("A"), line("A")]),
        ];
        recipes.retain(|(_, entries)| is_makeable(entries, &shelf));
        let ids: Vec<i32> = recipes.into_iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn test_referenced_names_skips_empty() {
        let lists = [vec![line("A"), line("")], vec![line("B"), line("A")]];
        let names = referenced_names(lists.iter().map(|l| l.as_slice()));
        assert_eq!(names.len(), 2);
        assert!(names.contains("A"));
        assert!(names.contains("B"));
    }

    #[test]
    fn test_shelf_mode_flag_parsing() {
        assert!(shelf_mode_enabled(Some("Y")));
        assert!(shelf_mode_enabled(Some("y")));
        assert!(!shelf_mode_enabled(Some("N")));
        assert!(!shelf_mode_enabled(Some("n")));
        assert!(!shelf_mode_enabled(Some("")));
        assert!(!shelf_mode_enabled(Some("yes")));
        assert!(!shelf_mode_enabled(None));
    }
}
