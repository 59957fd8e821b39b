use rand::seq::SliceRandom;
use rand::Rng;

use crate::models::{Category, Section, TrendingAggregate};

/// Categories shown per page render
pub const SECTION_COUNT: usize = 2;

/// Items shown per section
pub const ITEMS_PER_SECTION: usize = 4;

/// Picks the sections for one home-page render
///
/// Deliberately non-deterministic: every call draws a new pair of categories
/// and a new sample of items, so repeat visits see different content.
pub fn select_sections(aggregate: &TrendingAggregate) -> Vec<Section> {
    select_sections_with(aggregate, &mut rand::rng())
}

/// Same as [`select_sections`] with a caller-supplied random source
///
/// Draws `SECTION_COUNT` distinct categories; a drawn category with no items
/// is skipped rather than rendered empty, so fewer sections may come back.
pub fn select_sections_with<R: Rng + ?Sized>(
    aggregate: &TrendingAggregate,
    rng: &mut R,
) -> Vec<Section> {
    let mut categories = Category::ALL;
    categories.shuffle(rng);

    let mut sections = Vec::with_capacity(SECTION_COUNT);
    for category in categories.into_iter().take(SECTION_COUNT) {
        let available = aggregate.items(category);
        if available.is_empty() {
            continue;
        }

        let mut items = available.to_vec();
        items.shuffle(rng);
        items.truncate(ITEMS_PER_SECTION);

        sections.push(Section {
            category,
            title: category.label(),
            items,
        });
    }

    sections
}
