use super::{EntityServices, ListOptions, Page};
use crate::collection::Document;
use crate::common::util::now_iso;
use crate::errors::StorefrontResult;
use crate::filter::{ComparisonOp, Query};
use indexmap::IndexMap;

const START_DATE: &str = "start_date";
const END_DATE: &str = "end_date";
const CATEGORY: &str = "category";
const NAME: &str = "name";

impl EntityServices {
    /// Promotions running now.
    pub fn active_promotions(&self) -> StorefrontResult<Vec<Document>> {
        self.active_promotions_at(&now_iso())
    }

    /// Promotions with `start_date <= instant <= end_date`, both bounds
    /// inclusive. A promotion missing either date is never active.
    pub fn active_promotions_at(&self, instant: &str) -> StorefrontResult<Vec<Document>> {
        let query = Query::new()
            .with(START_DATE, ComparisonOp::Lte, instant)
            .with(END_DATE, ComparisonOp::Gte, instant);
        self.promotions.find_matching(&query)
    }

    /// Product count per category id, in category order.
    ///
    /// Products reference their category by name, so a category without a
    /// `name` is skipped.
    pub fn product_counts_by_category(&self) -> StorefrontResult<IndexMap<String, usize>> {
        let categories = self.categories.find_matching(&Query::all())?;
        let mut counts = IndexMap::with_capacity(categories.len());
        for category in &categories {
            let (id, name) = match (category.id(), category.get_str(NAME)) {
                (Some(id), Some(name)) => (id, name),
                _ => {
                    log::warn!("Skipping category without id or name: {}", category);
                    continue;
                }
            };
            let products = self.products.find_by(CATEGORY, name)?;
            counts.insert(id.to_string(), products.len());
        }
        Ok(counts)
    }

    /// One page of the products in the category with id `category_id`.
    /// An unknown category gives an empty page.
    pub fn products_for_category(
        &self,
        category_id: &str,
        options: &ListOptions,
    ) -> StorefrontResult<Page<Document>> {
        let category = self.categories.get_by_id(category_id)?;
        let name = match category.as_ref().and_then(|c| c.get_str(NAME)) {
            Some(name) => name.to_string(),
            None => {
                log::debug!("No category {} to list products for", category_id);
                return Ok(Page {
                    items: Vec::new(),
                    total: 0,
                    page: options.page_number(),
                    limit: options.page_size(),
                });
            }
        };
        self.products.get_all(&options.clone().filter(CATEGORY, name))
    }
}
